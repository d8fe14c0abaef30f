// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Doom and Hexen maps inside IWAD/PWAD containers
//!
//! A map is a marker lump (`ExMy` or `MAPxx`) followed by its data lumps in a
//! fixed order. A `BEHAVIOR` lump after them marks the Hexen format.

use crate::directory::{entry_bytes, LumpDirectory};
use crate::reader::RecordReader;
use bsp_lite_model::{ByteOrder, DecompileError, FormatVersion, Result};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::digit1,
    combinator::eof,
    IResult, Parser,
};

/// Data lumps following a map marker, in file order
pub const MAP_LUMP_ORDER: [&str; 10] = [
    "THINGS", "LINEDEFS", "SIDEDEFS", "VERTEXES", "SEGS", "SSECTORS", "NODES", "SECTORS", "REJECT",
    "BLOCKMAP",
];

const BEHAVIOR: &str = "BEHAVIOR";

// ============================================================================
// Map discovery
// ============================================================================

fn exmy(input: &str) -> IResult<&str, &str> {
    let (rest, _) = (tag("E"), digit1, tag("M"), digit1, eof).parse(input)?;
    Ok((rest, input))
}

fn mapxx(input: &str) -> IResult<&str, &str> {
    let (rest, _) = (tag("MAP"), digit1, eof).parse(input)?;
    Ok((rest, input))
}

/// Whether a lump name is a map marker
pub fn is_map_marker(name: &str) -> bool {
    alt((exmy, mapxx)).parse(name).is_ok()
}

/// One map found in a WAD directory
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WadMap {
    pub name: String,
    /// Doom or Hexen
    pub format: FormatVersion,
    /// Directory index of each lump in `MAP_LUMP_ORDER`, if present
    lumps: [Option<usize>; 10],
}

impl WadMap {
    /// Directory index of a named map lump
    pub fn lump_index(&self, name: &str) -> Option<usize> {
        let slot = MAP_LUMP_ORDER.iter().position(|n| *n == name)?;
        self.lumps[slot]
    }

    pub fn is_hexen(&self) -> bool {
        self.format == FormatVersion::Hexen
    }
}

/// Every map of a WAD, in directory order
pub fn find_maps(directory: &LumpDirectory) -> Vec<WadMap> {
    let entries = directory.entries();
    entries
        .iter()
        .enumerate()
        .filter(|(_, e)| is_map_marker(&e.name))
        .map(|(marker, e)| {
            let mut lumps = [None; 10];
            for (slot, expected) in MAP_LUMP_ORDER.iter().enumerate() {
                let index = marker + 1 + slot;
                if entries.get(index).is_some_and(|l| l.name == *expected) {
                    lumps[slot] = Some(index);
                }
            }
            let hexen = entries
                .get(marker + 1 + MAP_LUMP_ORDER.len())
                .is_some_and(|l| l.name == BEHAVIOR);
            WadMap {
                name: e.name.clone(),
                format: if hexen { FormatVersion::Hexen } else { FormatVersion::Doom },
                lumps,
            }
        })
        .collect()
}

// ============================================================================
// Records
// ============================================================================

/// A placed thing (Doom: 10 bytes, Hexen: 20 bytes)
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Thing {
    pub tid: i16,
    pub x: i16,
    pub y: i16,
    /// Height above the floor (Hexen only)
    pub z: i16,
    pub angle: i16,
    pub kind: i16,
    pub flags: i16,
    pub special: u8,
    pub args: [u8; 5],
}

/// A line between two vertices (Doom: 14 bytes, Hexen: 16 bytes)
#[derive(Clone, Debug, PartialEq, Default)]
pub struct LineDef {
    pub v1: u16,
    pub v2: u16,
    pub flags: i16,
    pub special: i16,
    /// Sector tag (Doom only)
    pub tag: i16,
    pub args: [u8; 5],
    pub right: i16,
    pub left: i16,
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct SideDef {
    pub x_offset: i16,
    pub y_offset: i16,
    pub upper: String,
    pub lower: String,
    pub middle: String,
    pub sector: i16,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MapVertex {
    pub x: i16,
    pub y: i16,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Seg {
    pub v1: u16,
    pub v2: u16,
    pub angle: i16,
    pub linedef: u16,
    pub direction: i16,
    pub offset: i16,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SubSector {
    pub seg_count: u16,
    pub first_seg: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct MapNode {
    pub x: i16,
    pub y: i16,
    pub dx: i16,
    pub dy: i16,
    /// Right then left bounding box, each top, bottom, left, right
    pub bounds: [[i16; 4]; 2],
    /// Right then left child; bit 15 marks a subsector
    pub children: [u16; 2],
}

#[derive(Clone, Debug, PartialEq, Default)]
pub struct Sector {
    pub floor: i16,
    pub ceiling: i16,
    pub floor_texture: String,
    pub ceiling_texture: String,
    pub light: i16,
    pub special: i16,
    pub tag: i16,
}

/// All records of one map
#[derive(Clone, Debug)]
pub struct DoomMap {
    pub name: String,
    pub format: FormatVersion,
    pub things: Vec<Thing>,
    pub linedefs: Vec<LineDef>,
    pub sidedefs: Vec<SideDef>,
    pub vertices: Vec<MapVertex>,
    pub segs: Vec<Seg>,
    pub subsectors: Vec<SubSector>,
    pub nodes: Vec<MapNode>,
    pub sectors: Vec<Sector>,
    /// Names of lumps that failed to decode and were left empty
    pub skipped_lumps: Vec<String>,
}

impl DoomMap {
    /// Decode the lumps of `map`
    ///
    /// Missing lumps decode as empty lists. A lump that fails to decode is
    /// logged, listed in `skipped_lumps` and left empty.
    pub fn read(data: &[u8], directory: &LumpDirectory, map: &WadMap, order: ByteOrder) -> Result<Self> {
        let hexen = map.is_hexen();
        let mut lumps = MapLumps {
            data,
            directory,
            map,
            order,
            skipped: Vec::new(),
        };

        let things = lumps.decode("THINGS", if hexen { 20 } else { 10 }, |r| read_thing(r, hexen))?;
        let linedefs = lumps.decode("LINEDEFS", if hexen { 16 } else { 14 }, |r| {
            read_linedef(r, hexen)
        })?;
        let sidedefs = lumps.decode("SIDEDEFS", 30, |r| {
            Ok(SideDef {
                x_offset: r.i16(0)?,
                y_offset: r.i16(2)?,
                upper: r.name(4, 8)?,
                lower: r.name(12, 8)?,
                middle: r.name(20, 8)?,
                sector: r.i16(28)?,
            })
        })?;
        let vertices = lumps.decode("VERTEXES", 4, |r| {
            Ok(MapVertex { x: r.i16(0)?, y: r.i16(2)? })
        })?;
        let segs = lumps.decode("SEGS", 12, |r| {
            Ok(Seg {
                v1: r.u16(0)?,
                v2: r.u16(2)?,
                angle: r.i16(4)?,
                linedef: r.u16(6)?,
                direction: r.i16(8)?,
                offset: r.i16(10)?,
            })
        })?;
        let subsectors = lumps.decode("SSECTORS", 4, |r| {
            Ok(SubSector { seg_count: r.u16(0)?, first_seg: r.u16(2)? })
        })?;
        let nodes = lumps.decode("NODES", 28, |r| {
            let mut bounds = [[0i16; 4]; 2];
            for (b, side) in bounds.iter_mut().enumerate() {
                for (i, v) in side.iter_mut().enumerate() {
                    *v = r.i16(8 + b * 8 + i * 2)?;
                }
            }
            Ok(MapNode {
                x: r.i16(0)?,
                y: r.i16(2)?,
                dx: r.i16(4)?,
                dy: r.i16(6)?,
                bounds,
                children: [r.u16(24)?, r.u16(26)?],
            })
        })?;
        let sectors = lumps.decode("SECTORS", 26, |r| {
            Ok(Sector {
                floor: r.i16(0)?,
                ceiling: r.i16(2)?,
                floor_texture: r.name(4, 8)?,
                ceiling_texture: r.name(12, 8)?,
                light: r.i16(20)?,
                special: r.i16(22)?,
                tag: r.i16(24)?,
            })
        })?;

        Ok(Self {
            name: map.name.clone(),
            format: map.format,
            things,
            linedefs,
            sidedefs,
            vertices,
            segs,
            subsectors,
            nodes,
            sectors,
            skipped_lumps: lumps.skipped,
        })
    }
}

struct MapLumps<'a> {
    data: &'a [u8],
    directory: &'a LumpDirectory,
    map: &'a WadMap,
    order: ByteOrder,
    skipped: Vec<String>,
}

impl MapLumps<'_> {
    /// Decode one named lump, emptying it on recoverable failure
    fn decode<T>(
        &mut self,
        name: &str,
        stride: usize,
        read: impl Fn(&RecordReader<'_>) -> Result<T>,
    ) -> Result<Vec<T>> {
        let decoded = map_lump(self.data, self.directory, self.map, name)
            .and_then(|bytes| records(bytes, stride, self.order, name, read));
        match decoded {
            Ok(records) => Ok(records),
            Err(e) if !e.is_recoverable() => Err(e),
            Err(e) => {
                log::warn!("{} lump of {} skipped: {}", name, self.map.name, e);
                self.skipped.push(name.to_string());
                Ok(Vec::new())
            }
        }
    }
}

fn map_lump<'a>(data: &'a [u8], directory: &LumpDirectory, map: &WadMap, name: &str) -> Result<&'a [u8]> {
    match map.lump_index(name).and_then(|i| directory.entries().get(i)) {
        Some(entry) => entry_bytes(data, entry),
        None => Ok(&[]),
    }
}

fn records<T>(
    data: &[u8],
    stride: usize,
    order: ByteOrder,
    lump: &str,
    read: impl Fn(&RecordReader<'_>) -> Result<T>,
) -> Result<Vec<T>> {
    if data.len() % stride != 0 {
        return Err(DecompileError::malformed(
            lump,
            format!("length {} is not a multiple of {}", data.len(), stride),
        ));
    }
    data.chunks_exact(stride)
        .map(|chunk| read(&RecordReader::new(chunk, order)))
        .collect()
}

fn read_args(r: &RecordReader<'_>, offset: usize) -> Result<[u8; 5]> {
    let mut args = [0u8; 5];
    for (i, a) in args.iter_mut().enumerate() {
        *a = r.u8(offset + i)?;
    }
    Ok(args)
}

fn read_thing(r: &RecordReader<'_>, hexen: bool) -> Result<Thing> {
    if hexen {
        Ok(Thing {
            tid: r.i16(0)?,
            x: r.i16(2)?,
            y: r.i16(4)?,
            z: r.i16(6)?,
            angle: r.i16(8)?,
            kind: r.i16(10)?,
            flags: r.i16(12)?,
            special: r.u8(14)?,
            args: read_args(r, 15)?,
        })
    } else {
        Ok(Thing {
            x: r.i16(0)?,
            y: r.i16(2)?,
            angle: r.i16(4)?,
            kind: r.i16(6)?,
            flags: r.i16(8)?,
            ..Thing::default()
        })
    }
}

fn read_linedef(r: &RecordReader<'_>, hexen: bool) -> Result<LineDef> {
    if hexen {
        Ok(LineDef {
            v1: r.u16(0)?,
            v2: r.u16(2)?,
            flags: r.i16(4)?,
            special: r.u8(6)? as i16,
            tag: 0,
            args: read_args(r, 7)?,
            right: r.i16(12)?,
            left: r.i16(14)?,
        })
    } else {
        Ok(LineDef {
            v1: r.u16(0)?,
            v2: r.u16(2)?,
            flags: r.i16(4)?,
            special: r.i16(6)?,
            tag: r.i16(8)?,
            args: [0; 5],
            right: r.i16(10)?,
            left: r.i16(12)?,
        })
    }
}
