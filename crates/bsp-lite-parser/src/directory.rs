// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lump directories
//!
//! Three directory styles are in use:
//!
//! - a fixed number of `(offset, length)` slots at a header offset, with the
//!   field order varying by version
//! - the count-prefixed, named WAD directory
//! - Call of Duty 4's `(id, length)` table, whose lumps follow each other
//!   padded to four bytes

use crate::reader::RecordReader;
use bsp_lite_model::{ByteOrder, DecompileError, FormatVersion, Result};
use rustc_hash::FxHashMap;

use FormatVersion as V;

/// Field order of one fixed directory slot
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryOrder {
    OffsetLength,
    LengthOffset,
    /// `offset, length, version, fourCC`
    Source,
    /// `version, offset, length, fourCC`
    Left4Dead2,
}

impl EntryOrder {
    pub const fn entry_size(self) -> usize {
        match self {
            EntryOrder::OffsetLength | EntryOrder::LengthOffset => 8,
            EntryOrder::Source | EntryOrder::Left4Dead2 => 16,
        }
    }
}

/// How a format lays out its lump directory
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectoryStyle {
    Fixed {
        header_offset: usize,
        count: usize,
        order: EntryOrder,
    },
    Streaming {
        count_offset: usize,
    },
    Wad,
}

impl DirectoryStyle {
    pub fn for_version(v: FormatVersion) -> Self {
        let fixed = |header_offset, count, order| DirectoryStyle::Fixed {
            header_offset,
            count,
            order,
        };
        match v {
            V::Quake | V::HalfLife => fixed(4, 15, EntryOrder::OffsetLength),
            V::Nightfire => fixed(4, 18, EntryOrder::OffsetLength),
            V::Quake2 => fixed(8, 19, EntryOrder::OffsetLength),
            V::Daikatana => fixed(8, 21, EntryOrder::OffsetLength),
            V::SoldierOfFortune => fixed(8, 22, EntryOrder::OffsetLength),
            V::Sin => fixed(8, 20, EntryOrder::OffsetLength),
            V::Quake3 | V::Wolfenstein => fixed(8, 17, EntryOrder::OffsetLength),
            V::Raven => fixed(8, 18, EntryOrder::OffsetLength),
            V::Fakk => fixed(12, 20, EntryOrder::OffsetLength),
            V::Stef2Demo | V::Stef2 => fixed(12, 30, EntryOrder::OffsetLength),
            V::Mohaa => fixed(12, 28, EntryOrder::OffsetLength),
            V::CallOfDuty => fixed(8, 33, EntryOrder::LengthOffset),
            V::CallOfDuty2 => fixed(8, 39, EntryOrder::LengthOffset),
            V::CallOfDuty4 => DirectoryStyle::Streaming { count_offset: 8 },
            V::Left4Dead2 => fixed(8, 64, EntryOrder::Left4Dead2),
            _ if v.is_source() => fixed(8, 64, EntryOrder::Source),
            V::Doom | V::Hexen => DirectoryStyle::Wad,
            _ => fixed(8, 0, EntryOrder::OffsetLength),
        }
    }

    /// Size of the header up to the end of a fixed directory
    pub fn header_size(&self) -> Option<usize> {
        match *self {
            DirectoryStyle::Fixed {
                header_offset,
                count,
                order,
            } => Some(header_offset + count * order.entry_size()),
            _ => None,
        }
    }
}

/// Size of the fixed header of `version`
pub fn header_size(version: FormatVersion) -> Option<usize> {
    let size = DirectoryStyle::for_version(version).header_size()?;
    // Source stores a map revision after the directory
    Some(if version.is_source() { size + 4 } else { size })
}

/// One directory entry
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct LumpEntry {
    /// Slot index, or the stored id for streaming directories
    pub id: u32,
    pub offset: usize,
    pub length: usize,
    /// Per-lump version (Source only)
    pub version: u32,
    /// Lump name (WAD only)
    pub name: String,
}

/// A decoded lump directory
#[derive(Clone, Debug, Default)]
pub struct LumpDirectory {
    entries: Vec<LumpEntry>,
    /// Id to first entry with that id
    index: FxHashMap<u32, usize>,
}

impl LumpDirectory {
    /// Read the directory of a file already identified as `version`
    pub fn read(data: &[u8], version: FormatVersion, order: ByteOrder) -> Result<Self> {
        let r = RecordReader::new(data, order);
        let entries = match DirectoryStyle::for_version(version) {
            DirectoryStyle::Fixed {
                header_offset,
                count,
                order: entry_order,
            } => read_fixed(&r, header_offset, count, entry_order)?,
            DirectoryStyle::Streaming { count_offset } => read_streaming(&r, count_offset)?,
            DirectoryStyle::Wad => read_wad(&r)?,
        };
        let mut index = FxHashMap::default();
        for (i, entry) in entries.iter().enumerate() {
            index.entry(entry.id).or_insert(i);
        }
        Ok(Self { entries, index })
    }

    pub fn entries(&self) -> &[LumpEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry with the given id
    pub fn get(&self, id: u32) -> Option<&LumpEntry> {
        self.index.get(&id).map(|&i| &self.entries[i])
    }

    /// Bytes of the lump with the given id; empty if the lump is absent
    pub fn slice<'a>(&self, data: &'a [u8], id: u32) -> Result<&'a [u8]> {
        match self.get(id) {
            Some(entry) => entry_bytes(data, entry),
            None => Ok(&[]),
        }
    }
}

/// Bytes of one entry, checked against the file length
pub fn entry_bytes<'a>(data: &'a [u8], entry: &LumpEntry) -> Result<&'a [u8]> {
    entry
        .offset
        .checked_add(entry.length)
        .and_then(|end| data.get(entry.offset..end))
        .ok_or_else(|| {
            DecompileError::malformed(
                format!("lump {}", entry.id),
                format!(
                    "offset {} + length {} exceeds file size {}",
                    entry.offset,
                    entry.length,
                    data.len()
                ),
            )
        })
}

fn as_len(value: i32, what: &str) -> Result<usize> {
    usize::try_from(value)
        .map_err(|_| DecompileError::malformed("directory", format!("negative {}: {}", what, value)))
}

fn read_fixed(
    r: &RecordReader<'_>,
    header_offset: usize,
    count: usize,
    order: EntryOrder,
) -> Result<Vec<LumpEntry>> {
    let size = order.entry_size();
    (0..count)
        .map(|i| {
            let base = header_offset + i * size;
            let (offset, length, version) = match order {
                EntryOrder::OffsetLength => (r.i32(base)?, r.i32(base + 4)?, 0),
                EntryOrder::LengthOffset => (r.i32(base + 4)?, r.i32(base)?, 0),
                EntryOrder::Source => (r.i32(base)?, r.i32(base + 4)?, r.u32(base + 8)?),
                EntryOrder::Left4Dead2 => (r.i32(base + 4)?, r.i32(base + 8)?, r.u32(base)?),
            };
            Ok(LumpEntry {
                id: i as u32,
                offset: as_len(offset, "offset")?,
                length: as_len(length, "length")?,
                version,
                name: String::new(),
            })
        })
        .collect()
}

fn read_streaming(r: &RecordReader<'_>, count_offset: usize) -> Result<Vec<LumpEntry>> {
    let count = r.u32(count_offset)? as usize;
    let table = count_offset + 4;
    let mut offset = table + count * 8;
    let mut entries = Vec::with_capacity(count.min(256));
    for i in 0..count {
        let id = r.u32(table + i * 8)?;
        let length = r.u32(table + i * 8 + 4)? as usize;
        entries.push(LumpEntry {
            id,
            offset,
            length,
            version: 0,
            name: String::new(),
        });
        offset += (length + 3) & !3;
    }
    Ok(entries)
}

fn read_wad(r: &RecordReader<'_>) -> Result<Vec<LumpEntry>> {
    let count = as_len(r.i32(4)?, "lump count")?;
    let table = as_len(r.i32(8)?, "directory offset")?;
    if table.saturating_add(count.saturating_mul(16)) > r.len() {
        return Err(DecompileError::malformed(
            "directory",
            format!("{} entries at {} exceed file size {}", count, table, r.len()),
        ));
    }
    (0..count)
        .map(|i| {
            let base = table + i * 16;
            Ok(LumpEntry {
                id: i as u32,
                offset: as_len(r.i32(base)?, "offset")?,
                length: as_len(r.i32(base + 4)?, "length")?,
                version: 0,
                name: r.name(base + 8, 8)?.to_ascii_uppercase(),
            })
        })
        .collect()
}

// ============================================================================
// Lump ids
// ============================================================================

/// Logical lumps the decompiler reads
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LumpKind {
    Entities,
    Planes,
    Textures,
    Materials,
    Vertices,
    Nodes,
    TexInfo,
    Faces,
    Leaves,
    MarkFaces,
    MarkBrushes,
    Edges,
    SurfEdges,
    Models,
    Brushes,
    BrushSides,
    TexData,
    TexDataStringData,
    TexDataStringTable,
    DispInfo,
    DispVerts,
    GameLump,
}

/// Directory id of a logical lump in `version`
pub fn lump_id(kind: LumpKind, v: FormatVersion) -> Option<u32> {
    use LumpKind::*;
    let id = match v {
        V::Quake | V::HalfLife => match kind {
            Entities => 0,
            Planes => 1,
            Textures => 2,
            Vertices => 3,
            Nodes => 5,
            TexInfo => 6,
            Faces => 7,
            Leaves => 10,
            MarkFaces => 11,
            Edges => 12,
            SurfEdges => 13,
            Models => 14,
            _ => return None,
        },
        V::Nightfire => match kind {
            Entities => 0,
            Planes => 1,
            Textures => 2,
            Materials => 3,
            Vertices => 4,
            Nodes => 8,
            Faces => 9,
            Leaves => 11,
            MarkFaces => 12,
            MarkBrushes => 13,
            Models => 14,
            Brushes => 15,
            BrushSides => 16,
            TexInfo => 17,
            _ => return None,
        },
        V::Quake2 | V::Daikatana | V::SoldierOfFortune | V::Sin => match kind {
            Entities => 0,
            Planes => 1,
            Vertices => 2,
            Nodes => 4,
            TexInfo => 5,
            Faces => 6,
            Leaves => 8,
            MarkFaces => 9,
            MarkBrushes => 10,
            Edges => 11,
            SurfEdges => 12,
            Models => 13,
            Brushes => 14,
            BrushSides => 15,
            _ => return None,
        },
        V::Quake3 | V::Wolfenstein | V::Raven => match kind {
            Entities => 0,
            Textures => 1,
            Planes => 2,
            Nodes => 3,
            Leaves => 4,
            MarkFaces => 5,
            MarkBrushes => 6,
            Models => 7,
            Brushes => 8,
            BrushSides => 9,
            Vertices => 10,
            Faces => 13,
            _ => return None,
        },
        V::Fakk | V::Stef2Demo | V::Stef2 | V::Mohaa => {
            // MOHAA inserts a side equation lump before the brush sides
            let shift = u32::from(v == V::Mohaa);
            match kind {
                Textures => 0,
                Planes => 1,
                Faces => 3,
                Vertices => 4,
                MarkBrushes => 6,
                MarkFaces => 7,
                Leaves => 8,
                Nodes => 9,
                BrushSides => 10 + shift,
                Brushes => 11 + shift,
                Models => 13,
                Entities => 14,
                _ => return None,
            }
        }
        V::CallOfDuty => match kind {
            Textures => 0,
            Planes => 2,
            BrushSides => 3,
            Brushes => 4,
            Models => 29,
            Entities => 31,
            _ => return None,
        },
        V::CallOfDuty2 => match kind {
            Textures => 0,
            Planes => 4,
            BrushSides => 5,
            Brushes => 6,
            Models => 35,
            Entities => 37,
            _ => return None,
        },
        V::CallOfDuty4 => match kind {
            Textures => 0,
            Planes => 4,
            BrushSides => 5,
            Brushes => 8,
            Models => 37,
            Entities => 39,
            _ => return None,
        },
        _ if v.is_source() => match kind {
            Entities => 0,
            Planes => 1,
            TexData => 2,
            Vertices => 3,
            Nodes => 5,
            TexInfo => 6,
            Faces => 7,
            Leaves => 10,
            Edges => 12,
            SurfEdges => 13,
            Models => 14,
            MarkFaces => 16,
            MarkBrushes => 17,
            Brushes => 18,
            BrushSides => 19,
            DispInfo => 26,
            DispVerts => 33,
            GameLump => 35,
            TexDataStringData => 43,
            TexDataStringTable => 44,
            _ => return None,
        },
        _ => return None,
    };
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(ident: &[u8; 4], version: i32, entries: &[(i32, i32)]) -> Vec<u8> {
        let mut data = ident.to_vec();
        data.extend_from_slice(&version.to_le_bytes());
        for (a, b) in entries {
            data.extend_from_slice(&a.to_le_bytes());
            data.extend_from_slice(&b.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_header_sizes() {
        assert_eq!(header_size(V::Quake2), Some(160));
        assert_eq!(header_size(V::Quake3), Some(144));
        assert_eq!(header_size(V::SoldierOfFortune), Some(184));
        assert_eq!(header_size(V::Raven), Some(152));
        assert_eq!(header_size(V::Sin), Some(168));
        assert_eq!(header_size(V::Source20), Some(1036));
        assert_eq!(header_size(V::Nightfire), Some(148));
        assert_eq!(header_size(V::CallOfDuty4), None);
    }

    #[test]
    fn test_fixed_directory() {
        let mut entries = vec![(0, 0); 19];
        entries[1] = (160, 20);
        let mut data = header(b"IBSP", 38, &entries);
        data.resize(180, 0);
        let dir = LumpDirectory::read(&data, V::Quake2, ByteOrder::LittleEndian).unwrap();
        assert_eq!(dir.len(), 19);
        assert_eq!(dir.slice(&data, 1).unwrap().len(), 20);
        assert!(dir.slice(&data, 40).unwrap().is_empty());
    }

    #[test]
    fn test_length_offset_order() {
        let mut entries = vec![(0, 0); 33];
        entries[2] = (16, 272);
        let mut data = header(b"IBSP", 59, &entries);
        data.resize(288, 0);
        let dir = LumpDirectory::read(&data, V::CallOfDuty, ByteOrder::LittleEndian).unwrap();
        let planes = dir.get(2).unwrap();
        assert_eq!((planes.offset, planes.length), (272, 16));
    }

    #[test]
    fn test_out_of_range_lump() {
        let mut entries = vec![(0, 0); 19];
        entries[1] = (160, 4000);
        let data = header(b"IBSP", 38, &entries);
        let dir = LumpDirectory::read(&data, V::Quake2, ByteOrder::LittleEndian).unwrap();
        assert!(matches!(
            dir.slice(&data, 1),
            Err(DecompileError::MalformedLump { .. })
        ));
    }

    #[test]
    fn test_streaming_directory_alignment() {
        let mut data = b"IBSP".to_vec();
        data.extend_from_slice(&22i32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        for (id, len) in [(4u32, 6u32), (39, 3)] {
            data.extend_from_slice(&id.to_le_bytes());
            data.extend_from_slice(&len.to_le_bytes());
        }
        let dir = LumpDirectory::read(&data, V::CallOfDuty4, ByteOrder::LittleEndian).unwrap();
        assert_eq!(dir.get(4).unwrap().offset, 28);
        // 6 bytes padded to 8
        assert_eq!(dir.get(39).unwrap().offset, 36);
    }

    #[test]
    fn test_left4dead2_order() {
        let mut data = b"VBSP".to_vec();
        data.extend_from_slice(&21i32.to_le_bytes());
        for i in 0..64 {
            let (version, offset, length) = if i == 1 { (0, 1036, 40) } else { (0, 0, 0) };
            for v in [version, offset, length, 0i32] {
                data.extend_from_slice(&v.to_le_bytes());
            }
        }
        data.resize(1036 + 40, 0);
        let dir = LumpDirectory::read(&data, V::Left4Dead2, ByteOrder::LittleEndian).unwrap();
        let planes = dir.get(lump_id(LumpKind::Planes, V::Left4Dead2).unwrap()).unwrap();
        assert_eq!((planes.offset, planes.length), (1036, 40));
    }

    #[test]
    fn test_lump_ids() {
        assert_eq!(lump_id(LumpKind::BrushSides, V::Quake2), Some(15));
        assert_eq!(lump_id(LumpKind::BrushSides, V::Mohaa), Some(11));
        assert_eq!(lump_id(LumpKind::BrushSides, V::Fakk), Some(10));
        assert_eq!(lump_id(LumpKind::GameLump, V::Vindictus), Some(35));
        assert_eq!(lump_id(LumpKind::Brushes, V::Quake), None);
    }
}
