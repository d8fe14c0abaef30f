// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoded BSP container
//!
//! [`BspReader`] detects the format, decrypts if needed, reads the lump
//! directory and decodes every lump the decompiler uses into a [`BspFile`].
//! A lump that fails to decode is logged, optionally dumped to disk and
//! replaced by an empty list.

use crate::cipher;
use crate::codec;
use crate::detect::{detect, Detection};
use crate::directory::{lump_id, LumpDirectory, LumpKind};
use crate::entity_lump::parse_entities;
use crate::game_lump::{GameLump, StaticProps};
use crate::records::*;
use bsp_lite_model::{ByteOrder, DecompileError, Entity, FormatVersion, Plane, Result, Vector3D};
use memchr::memchr;
use serde::Serialize;
use std::borrow::Cow;
use std::path::PathBuf;

/// Every lump of a map the decompiler reads
#[derive(Clone, Debug)]
pub struct BspFile {
    pub version: FormatVersion,
    pub byte_order: ByteOrder,
    pub entities: Vec<Entity>,
    pub planes: Vec<Plane>,
    pub vertices: Vec<Vector3D>,
    pub edges: Vec<Edge>,
    pub surf_edges: Vec<SurfEdge>,
    pub faces: Vec<Face>,
    pub leaves: Vec<Leaf>,
    pub nodes: Vec<Node>,
    pub models: Vec<Model>,
    pub brushes: Vec<Brush>,
    pub brush_sides: Vec<BrushSide>,
    pub mark_brushes: Vec<MarkBrush>,
    pub mark_faces: Vec<MarkFace>,
    pub tex_infos: Vec<TexInfo>,
    /// Shaders (Quake 3 family, Call of Duty) or texture names (Nightfire)
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub tex_datas: Vec<TexData>,
    /// Texdata names resolved through the string table
    pub tex_data_names: Vec<String>,
    pub disp_infos: Vec<DispInfo>,
    pub disp_verts: Vec<DispVert>,
    pub static_props: Option<StaticProps>,
    /// Lumps that could not be decoded
    pub skipped_lumps: Vec<String>,
}

impl BspFile {
    /// File with every lump empty
    pub fn new(version: FormatVersion, byte_order: ByteOrder) -> Self {
        Self {
            version,
            byte_order,
            entities: Vec::new(),
            planes: Vec::new(),
            vertices: Vec::new(),
            edges: Vec::new(),
            surf_edges: Vec::new(),
            faces: Vec::new(),
            leaves: Vec::new(),
            nodes: Vec::new(),
            models: Vec::new(),
            brushes: Vec::new(),
            brush_sides: Vec::new(),
            mark_brushes: Vec::new(),
            mark_faces: Vec::new(),
            tex_infos: Vec::new(),
            textures: Vec::new(),
            materials: Vec::new(),
            tex_datas: Vec::new(),
            tex_data_names: Vec::new(),
            disp_infos: Vec::new(),
            disp_verts: Vec::new(),
            static_props: None,
            skipped_lumps: Vec::new(),
        }
    }

    /// Texture name of a Source texinfo (texinfo → texdata → string table)
    pub fn texdata_name(&self, texinfo: usize) -> Option<&str> {
        let texdata = self.tex_infos.get(texinfo)?.texdata?;
        let name_id = self.tex_datas.get(usize::try_from(texdata).ok()?)?.name_id;
        self.tex_data_names
            .get(usize::try_from(name_id).ok()?)
            .map(String::as_str)
    }

    /// Round decoded coordinates lying within `precision` of an integer
    ///
    /// Covers planes, vertices, and leaf and model bounds.
    pub fn snap(&mut self, precision: f64) {
        for plane in &mut self.planes {
            *plane = plane.snapped(precision);
        }
        for vertex in &mut self.vertices {
            *vertex = vertex.snapped(precision);
        }
        for (mins, maxs) in self.leaves.iter_mut().filter_map(|l| l.bounds.as_mut()) {
            *mins = mins.snapped(precision);
            *maxs = maxs.snapped(precision);
        }
        for model in &mut self.models {
            model.mins = model.mins.snapped(precision);
            model.maxs = model.maxs.snapped(precision);
            model.origin = model.origin.map(|o| o.snapped(precision));
        }
    }

    /// Record counts per lump
    pub fn summary(&self) -> LumpSummary {
        LumpSummary {
            version: self.version,
            byte_order: self.byte_order,
            counts: vec![
                ("entities", self.entities.len()),
                ("planes", self.planes.len()),
                ("vertices", self.vertices.len()),
                ("faces", self.faces.len()),
                ("leaves", self.leaves.len()),
                ("nodes", self.nodes.len()),
                ("models", self.models.len()),
                ("brushes", self.brushes.len()),
                ("brush_sides", self.brush_sides.len()),
                ("tex_infos", self.tex_infos.len()),
                ("textures", self.textures.len()),
                ("disp_infos", self.disp_infos.len()),
                ("static_props", self.static_props.as_ref().map_or(0, |p| p.props.len())),
            ],
            skipped: self.skipped_lumps.clone(),
        }
    }

    /// Vertices of a face, following its edge loop or direct vertex range
    pub fn face_vertices(&self, face: &Face) -> Vec<Vector3D> {
        if let (Some(first), Some(count)) = (face.first_edge, face.num_edges) {
            let (Ok(first), Ok(count)) = (usize::try_from(first), usize::try_from(count)) else {
                return Vec::new();
            };
            return self
                .surf_edges
                .iter()
                .skip(first)
                .take(count)
                .filter_map(|&SurfEdge(e)| {
                    let edge = self.edges.get(e.unsigned_abs() as usize)?;
                    let v = if e >= 0 { edge.v0 } else { edge.v1 };
                    self.vertices.get(v as usize).copied()
                })
                .collect();
        }
        if let (Some(first), Some(count)) = (face.first_vertex, face.num_vertices) {
            let (Ok(first), Ok(count)) = (usize::try_from(first), usize::try_from(count)) else {
                return Vec::new();
            };
            return self.vertices.iter().skip(first).take(count).copied().collect();
        }
        Vec::new()
    }
}

/// Record counts of a decoded file, for diagnostics
#[derive(Clone, Debug, Serialize)]
pub struct LumpSummary {
    pub version: FormatVersion,
    pub byte_order: ByteOrder,
    pub counts: Vec<(&'static str, usize)>,
    pub skipped: Vec<String>,
}

impl LumpSummary {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ============================================================================
// Reader
// ============================================================================

/// Reads BSP files into [`BspFile`]
#[derive(Clone, Debug, Default)]
pub struct BspReader {
    dump_dir: Option<PathBuf>,
    name: String,
}

impl BspReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dump lumps that fail to decode into `dir`
    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_dir = dir;
        self
    }

    /// File stem used to name dumped lumps
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Detect and read a BSP file
    pub fn read(&self, data: &[u8]) -> Result<BspFile> {
        let detection = detect(data)?;
        self.read_detected(data, &detection)
    }

    /// Read a file whose format is already known
    pub fn read_detected(&self, data: &[u8], detection: &Detection) -> Result<BspFile> {
        let version = detection.version;
        let order = detection.byte_order;
        if matches!(version, FormatVersion::Doom | FormatVersion::Hexen) {
            return Err(DecompileError::unknown_format(
                "WAD containers hold maps, not BSP lumps",
            ));
        }
        let data: Cow<'_, [u8]> = match &detection.key {
            Some(key) => Cow::Owned(cipher::decrypt(data, key)),
            None => Cow::Borrowed(data),
        };
        let data = data.as_ref();
        let directory = LumpDirectory::read(data, version, order)?;
        log::debug!("{}: {} lumps in directory", version, directory.len());

        let mut lumps = LumpSource {
            data,
            directory: &directory,
            version,
            order,
            dump_dir: self.dump_dir.as_ref(),
            name: &self.name,
            skipped: Vec::new(),
        };

        let mut file = BspFile::new(version, order);
        file.entities = parse_entities(lumps.bytes(LumpKind::Entities));
        file.planes = lumps.decode(LumpKind::Planes)?;
        file.vertices = lumps.decode(LumpKind::Vertices)?;
        file.edges = lumps.decode(LumpKind::Edges)?;
        file.surf_edges = lumps.decode(LumpKind::SurfEdges)?;
        file.faces = lumps.decode(LumpKind::Faces)?;
        file.leaves = lumps.decode(LumpKind::Leaves)?;
        file.nodes = lumps.decode(LumpKind::Nodes)?;
        file.models = lumps.decode(LumpKind::Models)?;
        file.brushes = lumps.decode(LumpKind::Brushes)?;
        file.brush_sides = lumps.decode(LumpKind::BrushSides)?;
        file.mark_brushes = lumps.decode(LumpKind::MarkBrushes)?;
        file.mark_faces = lumps.decode(LumpKind::MarkFaces)?;
        file.tex_infos = lumps.decode(LumpKind::TexInfo)?;
        file.textures = lumps.decode(LumpKind::Textures)?;
        file.materials = lumps.decode(LumpKind::Materials)?;

        if version.is_source() {
            file.tex_datas = lumps.decode(LumpKind::TexData)?;
            let table: Vec<StringTableEntry> = lumps.decode(LumpKind::TexDataStringTable)?;
            let blob = lumps.bytes(LumpKind::TexDataStringData);
            file.tex_data_names = table
                .iter()
                .map(|&StringTableEntry(offset)| string_at(blob, offset))
                .collect();
            file.disp_infos = lumps.decode(LumpKind::DispInfo)?;
            file.disp_verts = lumps.decode(LumpKind::DispVerts)?;
            file.static_props = lumps.static_props();
        }

        file.skipped_lumps = lumps.skipped;
        Ok(file)
    }
}

/// NUL-terminated string starting at `offset`
fn string_at(blob: &[u8], offset: i64) -> String {
    let Some(tail) = usize::try_from(offset).ok().and_then(|o| blob.get(o..)) else {
        return String::new();
    };
    let end = memchr(0, tail).unwrap_or(tail.len());
    String::from_utf8_lossy(&tail[..end]).into_owned()
}

struct LumpSource<'a> {
    data: &'a [u8],
    directory: &'a LumpDirectory,
    version: FormatVersion,
    order: ByteOrder,
    dump_dir: Option<&'a PathBuf>,
    name: &'a str,
    skipped: Vec<String>,
}

impl<'a> LumpSource<'a> {
    /// Raw bytes of a lump; empty when absent or out of bounds
    fn bytes(&mut self, kind: LumpKind) -> &'a [u8] {
        let Some(id) = lump_id(kind, self.version) else {
            return &[];
        };
        match self.directory.slice(self.data, id) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("{:?} lump: {}", kind, e);
                self.skipped.push(format!("{:?}", kind));
                &[]
            }
        }
    }

    /// Decode a lump, emptying it on recoverable failure
    fn decode<T: LumpRecord>(&mut self, kind: LumpKind) -> Result<Vec<T>> {
        if T::layout(self.version).is_none() {
            return Ok(Vec::new());
        }
        let bytes = self.bytes(kind);
        if bytes.is_empty() {
            return Ok(Vec::new());
        }
        match codec::decode::<T>(bytes, self.version, self.order) {
            Ok(records) => Ok(records),
            Err(e) if !e.is_recoverable() => Err(e),
            Err(e) => {
                log::warn!("{:?} lump of {} skipped: {}", kind, self.version, e);
                self.dump(kind, bytes);
                self.skipped.push(format!("{:?}", kind));
                Ok(Vec::new())
            }
        }
    }

    fn static_props(&mut self) -> Option<StaticProps> {
        let lump = self.bytes(LumpKind::GameLump);
        if lump.is_empty() {
            return None;
        }
        let result = GameLump::read(lump, self.version, self.order)
            .and_then(|gl| StaticProps::from_game_lump(self.data, &gl, self.order));
        match result {
            Ok(props) => props,
            Err(e) => {
                log::warn!("static props skipped: {}", e);
                self.dump(LumpKind::GameLump, lump);
                self.skipped.push(format!("{:?}", LumpKind::GameLump));
                None
            }
        }
    }

    fn dump(&self, kind: LumpKind, bytes: &[u8]) {
        let Some(dir) = self.dump_dir else {
            return;
        };
        let stem = if self.name.is_empty() { "map" } else { self.name };
        let path = dir.join(format!("{}_{:?}.lmp", stem, kind));
        match std::fs::write(&path, bytes) {
            Ok(()) => log::info!("dumped {} bytes to {}", bytes.len(), path.display()),
            Err(e) => log::warn!("could not dump {}: {}", path.display(), e),
        }
    }
}
