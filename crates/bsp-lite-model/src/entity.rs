// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entities of a decompiled map

use crate::{MapBrush, Vector3D};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Classname of the world entity
pub const WORLDSPAWN: &str = "worldspawn";

/// One entity I/O connection (`output -> target.input(parameter)`)
#[derive(Clone, PartialEq, Debug)]
pub struct EntityConnection {
    pub output: String,
    pub target: String,
    pub input: String,
    pub parameter: String,
    pub delay: f64,
    /// Number of times the connection fires, `-1` for unlimited
    pub times: i32,
}

impl fmt::Display for EntityConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.target, self.input, self.parameter, self.delay, self.times
        )
    }
}

/// A map entity: ordered attributes, connections and owned brushes
///
/// Attribute keys compare case-insensitively but keep their original
/// spelling and insertion order.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Entity {
    attributes: Vec<(String, String)>,
    pub connections: Vec<EntityConnection>,
    pub brushes: Vec<MapBrush>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entity with only a classname
    pub fn with_classname(classname: &str) -> Self {
        let mut entity = Self::new();
        entity.set("classname", classname);
        entity
    }

    /// Get an attribute value
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing key in place
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self
            .attributes
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
        {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Remove an attribute, returning its value
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self
            .attributes
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(key))?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Attributes in insertion order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn classname(&self) -> &str {
        self.get("classname").unwrap_or("")
    }

    pub fn is_world(&self) -> bool {
        self.classname().eq_ignore_ascii_case(WORLDSPAWN)
    }

    /// Brush model index from a `model` attribute of the form `*N`
    pub fn model_index(&self) -> Option<usize> {
        self.get("model")?.strip_prefix('*')?.trim().parse().ok()
    }

    /// Whether brushes belong to this entity
    pub fn is_brush_based(&self) -> bool {
        self.is_world() || self.model_index().is_some()
    }

    /// Parse the `origin` attribute (`"x y z"`)
    pub fn origin(&self) -> Option<Vector3D> {
        parse_vector(self.get("origin")?)
    }

    pub fn set_origin(&mut self, origin: &Vector3D) {
        self.set("origin", origin.to_string());
    }
}

/// Parse a whitespace separated triple
pub fn parse_vector(value: &str) -> Option<Vector3D> {
    let mut parts = value.split_whitespace().map(|p| p.parse::<f64>());
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    Some(Vector3D::new(x, y, z))
}

/// All entities of a map; index 0 is the world
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Entities(Vec<Entity>);

impl Entities {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, entity: Entity) {
        self.0.push(entity);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Entity> {
        self.0.iter_mut()
    }

    pub fn get(&self, index: usize) -> Option<&Entity> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Entity> {
        self.0.get_mut(index)
    }

    /// The world entity, inserting one at index 0 if absent
    pub fn world_mut(&mut self) -> &mut Entity {
        if !self.0.first().is_some_and(Entity::is_world) {
            self.0.insert(0, Entity::with_classname(WORLDSPAWN));
        }
        &mut self.0[0]
    }

    pub fn world(&self) -> Option<&Entity> {
        self.0.first().filter(|e| e.is_world())
    }

    /// Total brushes over all entities
    pub fn brush_count(&self) -> usize {
        self.0.iter().map(|e| e.brushes.len()).sum()
    }

    /// Entities with the given classname, in order
    pub fn find_by_classname<'a>(&'a self, classname: &'a str) -> impl Iterator<Item = (usize, &'a Entity)> {
        self.0
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.classname().eq_ignore_ascii_case(classname))
    }

    pub fn into_vec(self) -> Vec<Entity> {
        self.0
    }
}

impl From<Vec<Entity>> for Entities {
    fn from(entities: Vec<Entity>) -> Self {
        Self(entities)
    }
}

impl Index<usize> for Entities {
    type Output = Entity;
    fn index(&self, index: usize) -> &Entity {
        &self.0[index]
    }
}

impl IndexMut<usize> for Entities {
    fn index_mut(&mut self, index: usize) -> &mut Entity {
        &mut self.0[index]
    }
}

impl<'a> IntoIterator for &'a Entities {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_keys() {
        let mut e = Entity::new();
        e.set("ClassName", "light");
        assert_eq!(e.get("classname"), Some("light"));
        e.set("CLASSNAME", "info_null");
        assert_eq!(e.attributes().count(), 1);
        assert_eq!(e.attributes().next(), Some(("ClassName", "info_null")));
    }

    #[test]
    fn test_model_index() {
        let mut e = Entity::with_classname("func_door");
        e.set("model", "*12");
        assert_eq!(e.model_index(), Some(12));
        e.set("model", "models/props/chair.mdl");
        assert_eq!(e.model_index(), None);
        assert!(!e.is_brush_based());
        assert!(Entity::with_classname("worldspawn").is_brush_based());
    }

    #[test]
    fn test_origin_parse() {
        let mut e = Entity::new();
        e.set("origin", "1 -2.5 64");
        assert_eq!(e.origin(), Some(Vector3D::new(1.0, -2.5, 64.0)));
        e.set("origin", "1 2");
        assert_eq!(e.origin(), None);
    }

    #[test]
    fn test_connection_display() {
        let c = EntityConnection {
            output: "OnTrigger".to_string(),
            target: "door1".to_string(),
            input: "Open".to_string(),
            parameter: String::new(),
            delay: 0.5,
            times: -1,
        };
        assert_eq!(c.to_string(), "door1,Open,,0.5,-1");
    }

    #[test]
    fn test_world_mut_inserts_world() {
        let mut entities = Entities::from(vec![Entity::with_classname("light")]);
        entities.world_mut().set("message", "hello");
        assert_eq!(entities.len(), 2);
        assert!(entities[0].is_world());
        assert_eq!(entities.find_by_classname("light").count(), 1);
    }
}
