// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Doom and Hexen maps
//!
//! A WAD map becomes a worldspawn plus one entity per thing. Sector brushes
//! come from a [`SectorBrushBuilder`] when one is supplied.

use crate::job::JobOutput;
use crate::progress::{MessageSink, Progress};
use bsp_lite_model::{
    DecompileStats, DecompilerSettings, Entities, Entity, FormatVersion, MapBrush, Vector3D,
    WORLDSPAWN,
};
use bsp_lite_parser::{DoomMap, Thing};

/// Classname given to every placed thing
pub const THING_CLASSNAME: &str = "doom_thing";

/// Synthesizes brushes for the sectors of a Doom map
pub trait SectorBrushBuilder: Send + Sync {
    /// Brushes for sector `index`; may be empty
    fn build(&self, map: &DoomMap, index: usize, settings: &DecompilerSettings) -> Vec<MapBrush>;
}

/// Entity for one thing
pub fn thing_entity(thing: &Thing, hexen: bool) -> Entity {
    let mut entity = Entity::with_classname(THING_CLASSNAME);
    let origin = Vector3D::new(thing.x as f64, thing.y as f64, thing.z as f64);
    entity.set_origin(&origin);
    entity.set("angle", thing.angle.to_string());
    entity.set("doom_type", thing.kind.to_string());
    entity.set("spawnflags", thing.flags.to_string());
    if hexen {
        entity.set("tid", thing.tid.to_string());
        entity.set("special", thing.special.to_string());
        for (i, arg) in thing.args.iter().enumerate() {
            entity.set(&format!("arg{}", i), arg.to_string());
        }
    }
    entity
}

/// Decompile one WAD map
pub fn decompile_doom(
    map: &DoomMap,
    settings: &DecompilerSettings,
    builder: Option<&dyn SectorBrushBuilder>,
    progress: Option<&(dyn Fn(f64) + Send)>,
    messages: Option<&(dyn Fn(&str) + Send)>,
) -> JobOutput {
    let hexen = map.format == FormatVersion::Hexen;
    let mut progress = Progress::new(progress, map.things.len() + map.sectors.len());
    let mut sink = MessageSink::new(messages);
    for lump in &map.skipped_lumps {
        sink.warn(format_args!("{}: lump {} could not be decoded and was skipped", map.name, lump));
    }

    let mut entities = Entities::new();
    let mut world = Entity::with_classname(WORLDSPAWN);
    world.set("message", map.name.as_str());
    entities.push(world);

    match builder {
        Some(builder) => {
            let mut brushes = Vec::new();
            for index in 0..map.sectors.len() {
                let built = builder.build(map, index, settings);
                if built.is_empty() {
                    sink.warn(format_args!("{}: sector {} produced no brushes", map.name, index));
                }
                brushes.extend(built);
                progress.advance(1);
            }
            entities.world_mut().brushes = brushes;
        }
        None => {
            log::debug!("{}: no sector builder, {} sectors skipped", map.name, map.sectors.len());
            progress.advance(map.sectors.len());
        }
    }

    for thing in &map.things {
        entities.push(thing_entity(thing, hexen));
        progress.advance(1);
    }
    progress.finish();

    let stats = DecompileStats {
        entities: entities.len(),
        brushes: entities.brush_count(),
        sides: entities
            .iter()
            .flat_map(|e| &e.brushes)
            .map(MapBrush::num_sides)
            .sum(),
        skipped_lumps: map.skipped_lumps.len(),
        warnings: sink.count(),
        ..DecompileStats::default()
    };
    log::info!(
        "{} ({}): {} things, {} sectors",
        map.name,
        map.format,
        map.things.len(),
        map.sectors.len()
    );
    JobOutput { entities, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsp_lite_model::{MapBrushSide, Plane, DEFAULT_PRECISION};
    use bsp_lite_parser::Sector;

    fn map(format: FormatVersion) -> DoomMap {
        DoomMap {
            name: "MAP01".to_string(),
            format,
            things: vec![
                Thing {
                    x: 64,
                    y: -32,
                    angle: 90,
                    kind: 1,
                    flags: 7,
                    ..Thing::default()
                },
                Thing {
                    tid: 5,
                    z: 16,
                    kind: 3004,
                    special: 80,
                    args: [1, 2, 0, 0, 0],
                    ..Thing::default()
                },
            ],
            linedefs: Vec::new(),
            sidedefs: Vec::new(),
            vertices: Vec::new(),
            segs: Vec::new(),
            subsectors: Vec::new(),
            nodes: Vec::new(),
            sectors: vec![Sector::default(); 2],
            skipped_lumps: Vec::new(),
        }
    }

    struct OneSlab;

    impl SectorBrushBuilder for OneSlab {
        fn build(&self, _map: &DoomMap, index: usize, _settings: &DecompilerSettings) -> Vec<MapBrush> {
            let mut brush = MapBrush::new(index, 0);
            let plane = Plane::new(Vector3D::new(0.0, 0.0, 1.0), 0.0);
            let tri = [
                Vector3D::new(0.0, 0.0, 0.0),
                Vector3D::new(0.0, 1.0, 0.0),
                Vector3D::new(1.0, 0.0, 0.0),
            ];
            brush.add_side(MapBrushSide::new(plane, tri), DEFAULT_PRECISION);
            vec![brush]
        }
    }

    #[test]
    fn test_things_become_entities() {
        let out = decompile_doom(&map(FormatVersion::Doom), &DecompilerSettings::default(), None, None, None);
        assert_eq!(out.entities.len(), 3);
        assert!(out.entities.world().is_some());
        assert_eq!(out.stats.brushes, 0);

        let player = out.entities.get(1).unwrap();
        assert_eq!(player.classname(), THING_CLASSNAME);
        assert_eq!(player.origin(), Some(Vector3D::new(64.0, -32.0, 0.0)));
        assert_eq!(player.get("angle"), Some("90"));
        assert_eq!(player.get("doom_type"), Some("1"));
        assert!(!player.contains("tid"));
    }

    #[test]
    fn test_hexen_thing_arguments() {
        let entity = thing_entity(&map(FormatVersion::Hexen).things[1], true);
        assert_eq!(entity.get("tid"), Some("5"));
        assert_eq!(entity.get("special"), Some("80"));
        assert_eq!(entity.get("arg1"), Some("2"));
        assert_eq!(entity.origin(), Some(Vector3D::new(0.0, 0.0, 16.0)));
    }

    #[test]
    fn test_sector_builder_feeds_world() {
        let seen = std::sync::Mutex::new(Vec::new());
        let callback = |f: f64| seen.lock().unwrap().push(f);
        let out = decompile_doom(
            &map(FormatVersion::Doom),
            &DecompilerSettings::default(),
            Some(&OneSlab),
            Some(&callback),
            None,
        );
        assert_eq!(out.entities.world().unwrap().brushes.len(), 2);
        assert_eq!(out.stats.brushes, 2);
        assert_eq!(out.stats.warnings, 0);
        assert_eq!(seen.into_inner().unwrap().last(), Some(&1.0));
    }

    #[test]
    fn test_skipped_lumps_are_reported() {
        let mut map = map(FormatVersion::Doom);
        map.things.clear();
        map.skipped_lumps = vec!["THINGS".to_string()];
        let seen = std::sync::Mutex::new(Vec::new());
        let callback = |m: &str| seen.lock().unwrap().push(m.to_string());

        let out = decompile_doom(&map, &DecompilerSettings::default(), None, None, Some(&callback));
        assert_eq!(out.entities.len(), 1);
        assert_eq!(out.stats.skipped_lumps, 1);
        assert_eq!(out.stats.warnings, 1);
        assert!(seen.into_inner().unwrap()[0].contains("THINGS"));
    }
}
