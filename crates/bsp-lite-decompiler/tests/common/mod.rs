// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory map fixtures
//!
//! Files are assembled byte by byte in the layouts the parser expects, so
//! the tests exercise detection, directory reading and lump decoding as
//! well as reconstruction.

#![allow(dead_code)]

// ── Byte writer ──────────────────────────────────────────────────────────

/// Little-endian record writer
#[derive(Default)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        self.0.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn vec3(&mut self, v: [f32; 3]) -> &mut Self {
        for c in v {
            self.f32(c);
        }
        self
    }

    /// NUL-padded fixed-width name
    pub fn name(&mut self, name: &str, width: usize) -> &mut Self {
        let mut field = name.as_bytes().to_vec();
        field.resize(width, 0);
        self.0.extend_from_slice(&field);
        self
    }

    pub fn zeros(&mut self, n: usize) -> &mut Self {
        self.0.resize(self.0.len() + n, 0);
        self
    }

    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }
}

// ── Containers ───────────────────────────────────────────────────────────

/// Field order of a fixed directory
#[derive(Clone, Copy)]
pub enum Directory {
    OffsetLength { count: usize },
    LengthOffset { count: usize },
    /// 64 slots of `offset, length, version, fourCC` plus a revision
    Source,
    /// No magic: the version is followed by `offset, length` slots
    VersionOnly { count: usize },
}

/// A BSP file with a fixed lump directory after its header
pub struct MapFile {
    magic: [u8; 4],
    version: i32,
    directory: Directory,
    lumps: Vec<(usize, Vec<u8>)>,
}

impl MapFile {
    pub fn new(magic: &[u8; 4], version: i32, directory: Directory) -> Self {
        Self {
            magic: *magic,
            version,
            directory,
            lumps: Vec::new(),
        }
    }

    pub fn lump(mut self, slot: usize, payload: Vec<u8>) -> Self {
        self.lumps.push((slot, payload));
        self
    }

    /// Lumps are written after the header in the order they were added
    pub fn build(self) -> Vec<u8> {
        let (slot_size, count) = match self.directory {
            Directory::OffsetLength { count }
            | Directory::LengthOffset { count }
            | Directory::VersionOnly { count } => (8, count),
            Directory::Source => (16, 64),
        };
        let mut data = Vec::new();
        if !matches!(self.directory, Directory::VersionOnly { .. }) {
            data.extend_from_slice(&self.magic);
        }
        data.extend_from_slice(&self.version.to_le_bytes());
        let start = data.len();
        let mut header_size = start + slot_size * count;
        if matches!(self.directory, Directory::Source) {
            header_size += 4;
        }

        data.resize(header_size, 0);
        for (slot, payload) in &self.lumps {
            let offset = (data.len() as i32).to_le_bytes();
            let length = (payload.len() as i32).to_le_bytes();
            let base = start + slot * slot_size;
            let (first, second) = match self.directory {
                Directory::LengthOffset { .. } => (length, offset),
                _ => (offset, length),
            };
            data[base..base + 4].copy_from_slice(&first);
            data[base + 4..base + 8].copy_from_slice(&second);
            data.extend_from_slice(payload);
        }
        data
    }
}

/// A PWAD from named lumps in directory order
pub fn wad(lumps: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut data = b"PWAD".to_vec();
    data.extend_from_slice(&(lumps.len() as i32).to_le_bytes());
    data.extend_from_slice(&0i32.to_le_bytes());
    let mut entries = Bytes::new();
    for (name, payload) in lumps {
        entries.i32(data.len() as i32).i32(payload.len() as i32).name(name, 8);
        data.extend_from_slice(payload);
    }
    let table = (data.len() as i32).to_le_bytes();
    data[8..12].copy_from_slice(&table);
    data.extend_from_slice(&entries.0);
    data
}

// ── Lump payloads ────────────────────────────────────────────────────────

/// Entity lump text, NUL terminated
pub fn entity_lump(entities: &[&[(&str, &str)]]) -> Vec<u8> {
    let mut text = String::new();
    for pairs in entities {
        text.push_str("{\n");
        for (k, v) in pairs.iter() {
            text.push_str(&format!("\"{}\" \"{}\"\n", k, v));
        }
        text.push_str("}\n");
    }
    let mut bytes = text.into_bytes();
    bytes.push(0);
    bytes
}

/// Six axial planes of a box: +X, -X, +Y, -Y, +Z, -Z
pub fn box_planes(min: [f32; 3], max: [f32; 3]) -> Vec<([f32; 3], f32)> {
    let mut planes = Vec::new();
    for axis in 0..3 {
        let mut n = [0.0; 3];
        n[axis] = 1.0;
        planes.push((n, max[axis]));
        n[axis] = -1.0;
        planes.push((n, -min[axis]));
    }
    planes
}

/// Plane records with a trailing type field (20 bytes)
pub fn planes20(planes: &[([f32; 3], f32)]) -> Vec<u8> {
    let mut b = Bytes::new();
    for (i, (n, d)) in planes.iter().enumerate() {
        b.vec3(*n).f32(*d).i32((i / 2) as i32);
    }
    b.take()
}

/// Plane records without a type field (16 bytes)
pub fn planes16(planes: &[([f32; 3], f32)]) -> Vec<u8> {
    let mut b = Bytes::new();
    for (n, d) in planes {
        b.vec3(*n).f32(*d);
    }
    b.take()
}

/// A single tree node whose children are both leaf 0
pub fn one_node(stride: usize) -> Vec<u8> {
    let mut b = Bytes::new();
    b.i32(0).i32(-1).i32(-1);
    b.zeros(stride - 12);
    b.take()
}

/// Quake 2 style leaf referencing mark brushes `first..first + count`
pub fn quake2_leaf(stride: usize, contents: i32, first: u16, count: u16) -> Vec<u8> {
    let mut b = Bytes::new();
    b.i32(contents).zeros(4);
    b.i16(0).i16(0).i16(0).i16(64).i16(64).i16(64);
    b.u16(0).u16(0).u16(first).u16(count);
    b.zeros(stride - 28);
    b.take()
}

/// Tree model (48 bytes) rooted at `head_node`
pub fn tree_model(min: [f32; 3], max: [f32; 3], head_node: i32) -> Vec<u8> {
    let mut b = Bytes::new();
    b.vec3(min).vec3(max).vec3([0.0; 3]).i32(head_node).i32(0).i32(0);
    b.take()
}
