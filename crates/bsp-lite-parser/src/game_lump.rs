// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Source game lump directory and static props

use crate::reader::RecordReader;
use bsp_lite_model::{ByteOrder, DecompileError, Entity, FormatVersion, Result, Vector3D};

/// Tag of the static prop sub-lump
pub const STATIC_PROPS: [u8; 4] = *b"sprp";

/// Width of a prop dictionary name
const MODEL_NAME_LEN: usize = 128;

/// Fields shared by every supported static prop version
const PROP_COMMON_LEN: usize = 44;

/// One game lump directory entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameLumpEntry {
    pub tag: [u8; 4],
    pub flags: u32,
    pub version: u32,
    /// Absolute file offset
    pub offset: usize,
    pub length: usize,
}

/// The game lump directory
#[derive(Clone, Debug, Default)]
pub struct GameLump {
    entries: Vec<GameLumpEntry>,
}

impl GameLump {
    /// Read the game lump directory
    ///
    /// Vindictus stores flags and version as 32-bit values, widening each
    /// entry to 20 bytes.
    pub fn read(lump: &[u8], version: FormatVersion, order: ByteOrder) -> Result<Self> {
        if lump.is_empty() {
            return Ok(Self::default());
        }
        let r = RecordReader::new(lump, order);
        let count = r.i32(0)?;
        let count = usize::try_from(count)
            .map_err(|_| DecompileError::malformed("game lump", format!("negative count {}", count)))?;
        let wide = version == FormatVersion::Vindictus;
        let size = if wide { 20 } else { 16 };
        if 4 + count.saturating_mul(size) > lump.len() {
            return Err(DecompileError::malformed(
                "game lump",
                format!("{} entries do not fit in {} bytes", count, lump.len()),
            ));
        }

        let entries = (0..count)
            .map(|i| {
                let at = 4 + i * size;
                let tag = r.u32(at)?.to_be_bytes();
                let (flags, version, rest) = if wide {
                    (r.u32(at + 4)?, r.u32(at + 8)?, at + 12)
                } else {
                    (r.u16(at + 4)? as u32, r.u16(at + 6)? as u32, at + 8)
                };
                Ok(GameLumpEntry {
                    tag,
                    flags,
                    version,
                    offset: r.i32(rest)?.max(0) as usize,
                    length: r.i32(rest + 4)?.max(0) as usize,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[GameLumpEntry] {
        &self.entries
    }

    /// Entry with the given tag
    pub fn find(&self, tag: &[u8; 4]) -> Option<&GameLumpEntry> {
        self.entries.iter().find(|e| &e.tag == tag)
    }
}

// ============================================================================
// Static props
// ============================================================================

/// One placed static prop
#[derive(Clone, Debug, PartialEq)]
pub struct StaticProp {
    pub origin: Vector3D,
    pub angles: Vector3D,
    pub model: u16,
    pub first_leaf: u16,
    pub leaf_count: u16,
    pub solid: u8,
    pub flags: u8,
    pub skin: i32,
    pub fade_min: f32,
    pub fade_max: f32,
}

/// Decoded `sprp` sub-lump
#[derive(Clone, Debug, Default)]
pub struct StaticProps {
    pub models: Vec<String>,
    pub leaves: Vec<u16>,
    pub props: Vec<StaticProp>,
}

impl StaticProps {
    /// Decode a `sprp` payload of the given sub-lump version
    ///
    /// Versions 4 through 11 share a common prefix; the per-prop stride is
    /// taken from the remaining payload so version-specific tails are skipped.
    pub fn parse(data: &[u8], version: u32, order: ByteOrder) -> Result<Self> {
        if !(4..=11).contains(&version) {
            return Err(DecompileError::unsupported_record(
                "static prop",
                format!("sprp v{}", version),
            ));
        }
        let r = RecordReader::new(data, order);
        let mut at = 0;

        let model_count = count_at(&r, at, "static prop dictionary")?;
        at += 4;
        let mut models = Vec::with_capacity(model_count.min(data.len() / MODEL_NAME_LEN));
        for _ in 0..model_count {
            models.push(r.name(at, MODEL_NAME_LEN)?);
            at += MODEL_NAME_LEN;
        }

        let leaf_count = count_at(&r, at, "static prop leaves")?;
        at += 4;
        let mut leaves = Vec::with_capacity(leaf_count.min(data.len() / 2));
        for _ in 0..leaf_count {
            leaves.push(r.u16(at)?);
            at += 2;
        }

        let prop_count = count_at(&r, at, "static props")?;
        at += 4;
        if prop_count == 0 {
            return Ok(Self { models, leaves, props: Vec::new() });
        }
        let remaining = data.len().saturating_sub(at);
        let stride = remaining / prop_count;
        if stride < PROP_COMMON_LEN {
            return Err(DecompileError::malformed(
                "static props",
                format!("{} props in {} bytes", prop_count, remaining),
            ));
        }

        let props = (0..prop_count)
            .map(|i| {
                let p = RecordReader::new(&data[at + i * stride..at + (i + 1) * stride], order);
                Ok(StaticProp {
                    origin: p.vec3(0)?,
                    angles: p.vec3(12)?,
                    model: p.u16(24)?,
                    first_leaf: p.u16(26)?,
                    leaf_count: p.u16(28)?,
                    solid: p.u8(30)?,
                    flags: p.u8(31)?,
                    skin: p.i32(32)?,
                    fade_min: p.f32(36)?,
                    fade_max: p.f32(40)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { models, leaves, props })
    }

    /// Read the static props of a file, if its game lump has them
    pub fn from_game_lump(file: &[u8], game_lump: &GameLump, order: ByteOrder) -> Result<Option<Self>> {
        let Some(entry) = game_lump.find(&STATIC_PROPS) else {
            return Ok(None);
        };
        let payload = entry
            .offset
            .checked_add(entry.length)
            .and_then(|end| file.get(entry.offset..end))
            .ok_or_else(|| {
                DecompileError::malformed(
                    "static props",
                    format!("payload {}+{} outside file", entry.offset, entry.length),
                )
            })?;
        Self::parse(payload, entry.version, order).map(Some)
    }

    /// `prop_static` entities in prop order
    pub fn to_entities(&self) -> Vec<Entity> {
        self.props
            .iter()
            .map(|prop| {
                let mut entity = Entity::with_classname("prop_static");
                entity.set("origin", prop.origin.to_string());
                entity.set("angles", prop.angles.to_string());
                if let Some(model) = self.models.get(prop.model as usize) {
                    entity.set("model", model.as_str());
                }
                entity.set("skin", prop.skin.to_string());
                entity.set("solid", prop.solid.to_string());
                entity.set("fademindist", prop.fade_min.to_string());
                entity.set("fademaxdist", prop.fade_max.to_string());
                entity
            })
            .collect()
    }
}

fn count_at(r: &RecordReader<'_>, at: usize, what: &str) -> Result<usize> {
    let count = r.i32(at)?;
    usize::try_from(count).map_err(|_| DecompileError::malformed(what, format!("negative count {}", count)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprp_payload(prop_tail: usize) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&1i32.to_le_bytes());
        let mut name = b"models/props/crate01.mdl".to_vec();
        name.resize(MODEL_NAME_LEN, 0);
        data.extend_from_slice(&name);
        data.extend_from_slice(&2i32.to_le_bytes());
        data.extend_from_slice(&7u16.to_le_bytes());
        data.extend_from_slice(&9u16.to_le_bytes());
        data.extend_from_slice(&2i32.to_le_bytes());
        for i in 0..2 {
            for f in [64.0f32 * i as f32, 0.0, 16.0, 0.0, 90.0, 0.0] {
                data.extend_from_slice(&f.to_le_bytes());
            }
            data.extend_from_slice(&0u16.to_le_bytes());
            data.extend_from_slice(&0u16.to_le_bytes());
            data.extend_from_slice(&2u16.to_le_bytes());
            data.push(6);
            data.push(0);
            data.extend_from_slice(&(i as i32).to_le_bytes());
            data.extend_from_slice(&512.0f32.to_le_bytes());
            data.extend_from_slice(&1024.0f32.to_le_bytes());
            data.extend(std::iter::repeat(0u8).take(prop_tail));
        }
        data
    }

    #[test]
    fn test_static_props_stride_from_payload() {
        // v6 carries 20 bytes after the common fields
        let props = StaticProps::parse(&sprp_payload(20), 6, ByteOrder::LittleEndian).unwrap();
        assert_eq!(props.models, vec!["models/props/crate01.mdl"]);
        assert_eq!(props.leaves, vec![7, 9]);
        assert_eq!(props.props.len(), 2);
        assert_eq!(props.props[1].origin, Vector3D::new(64.0, 0.0, 16.0));
        assert_eq!(props.props[1].skin, 1);
        assert_eq!(props.props[0].solid, 6);

        let entities = props.to_entities();
        assert_eq!(entities[1].classname(), "prop_static");
        assert_eq!(entities[1].get("model"), Some("models/props/crate01.mdl"));
        assert_eq!(entities[1].get("angles"), Some("0 90 0"));
        assert_eq!(entities[1].get("fademaxdist"), Some("1024"));
    }

    #[test]
    fn test_unsupported_sprp_version() {
        let err = StaticProps::parse(&sprp_payload(12), 3, ByteOrder::LittleEndian).unwrap_err();
        assert!(matches!(err, DecompileError::UnsupportedRecord { .. }));
    }

    #[test]
    fn test_game_lump_directory() {
        let mut lump = Vec::new();
        lump.extend_from_slice(&1i32.to_le_bytes());
        lump.extend_from_slice(&u32::from_be_bytes(STATIC_PROPS).to_le_bytes());
        lump.extend_from_slice(&0u16.to_le_bytes());
        lump.extend_from_slice(&10u16.to_le_bytes());
        lump.extend_from_slice(&2000i32.to_le_bytes());
        lump.extend_from_slice(&64i32.to_le_bytes());

        let gl = GameLump::read(&lump, FormatVersion::Source20, ByteOrder::LittleEndian).unwrap();
        let entry = gl.find(&STATIC_PROPS).unwrap();
        assert_eq!(entry.version, 10);
        assert_eq!(entry.offset, 2000);
        assert_eq!(entry.length, 64);
        assert!(GameLump::read(&lump, FormatVersion::Vindictus, ByteOrder::LittleEndian).is_err());
        assert!(GameLump::read(&[], FormatVersion::Source20, ByteOrder::LittleEndian)
            .unwrap()
            .entries()
            .is_empty());
    }
}
