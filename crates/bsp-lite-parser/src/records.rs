// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed lump records
//!
//! Each record keeps the raw integer values of the fields its layout names,
//! so the records without derived fields can be written back unchanged.

use crate::layout::*;
use crate::reader::{Field, RecordReader, RecordWriter};
use bsp_lite_model::{FormatVersion, Plane, Result, Vector3D};

/// A record that can be decoded from a lump
pub trait LumpRecord: Sized {
    const KIND: RecordKind;
    type Layout: RecordLayout + Copy;

    /// Layout of this record in `version`, if the format has it
    fn layout(version: FormatVersion) -> Option<Self::Layout>;

    /// Decode one record from a stride-sized slice
    fn read(r: &RecordReader<'_>, layout: &Self::Layout) -> Result<Self>;
}

/// A record whose every stored byte is captured by its fields
pub trait EncodeRecord: LumpRecord {
    fn write(&self, w: &mut RecordWriter<'_>, layout: &Self::Layout) -> Result<()>;
}

fn to_u32(value: i64) -> u32 {
    value.max(0) as u32
}

// ============================================================================
// Geometry
// ============================================================================

impl LumpRecord for Plane {
    const KIND: RecordKind = RecordKind::Plane;
    type Layout = PlaneLayout;

    fn layout(version: FormatVersion) -> Option<PlaneLayout> {
        PlaneLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &PlaneLayout) -> Result<Self> {
        Ok(Plane::new(r.vec3(l.normal)?, r.f32(l.dist)? as f64))
    }
}

impl LumpRecord for Vector3D {
    const KIND: RecordKind = RecordKind::Vertex;
    type Layout = VertexLayout;

    fn layout(version: FormatVersion) -> Option<VertexLayout> {
        VertexLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &VertexLayout) -> Result<Self> {
        r.vec3(l.position)
    }
}

impl EncodeRecord for Vector3D {
    fn write(&self, w: &mut RecordWriter<'_>, l: &VertexLayout) -> Result<()> {
        w.vec3(l.position, self)
    }
}

/// Edge between two vertices
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub v0: u32,
    pub v1: u32,
}

impl LumpRecord for Edge {
    const KIND: RecordKind = RecordKind::Edge;
    type Layout = EdgeLayout;

    fn layout(version: FormatVersion) -> Option<EdgeLayout> {
        EdgeLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &EdgeLayout) -> Result<Self> {
        Ok(Self {
            v0: to_u32(r.int(l.v0)?),
            v1: to_u32(r.int(l.v1)?),
        })
    }
}

impl EncodeRecord for Edge {
    fn write(&self, w: &mut RecordWriter<'_>, l: &EdgeLayout) -> Result<()> {
        w.int(l.v0, self.v0 as i64)?;
        w.int(l.v1, self.v1 as i64)
    }
}

macro_rules! index_record {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq)]
        pub struct $name(pub i64);

        impl LumpRecord for $name {
            const KIND: RecordKind = $kind;
            type Layout = IndexLayout;

            fn layout(version: FormatVersion) -> Option<IndexLayout> {
                IndexLayout::for_kind($kind, version)
            }

            fn read(r: &RecordReader<'_>, l: &IndexLayout) -> Result<Self> {
                Ok($name(r.int(l.value)?))
            }
        }

        impl EncodeRecord for $name {
            fn write(&self, w: &mut RecordWriter<'_>, l: &IndexLayout) -> Result<()> {
                w.int(l.value, self.0)
            }
        }
    };
}

index_record!(
    /// Signed edge reference; negative walks the edge backwards
    SurfEdge,
    RecordKind::SurfEdge
);
index_record!(
    /// Leaf to brush indirection
    MarkBrush,
    RecordKind::MarkBrush
);
index_record!(
    /// Leaf to face indirection
    MarkFace,
    RecordKind::MarkFace
);
index_record!(
    /// Offset into the texdata string blob
    StringTableEntry,
    RecordKind::TexDataStringTable
);

// ============================================================================
// Brushes
// ============================================================================

/// Compiled brush
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Brush {
    /// `None` where sides are consumed in brush order
    pub first_side: Option<i64>,
    pub num_sides: i64,
    pub contents: Option<i64>,
    pub texture: Option<i64>,
}

impl Brush {
    pub fn num_sides(&self) -> usize {
        self.num_sides.max(0) as usize
    }
}

impl LumpRecord for Brush {
    const KIND: RecordKind = RecordKind::Brush;
    type Layout = BrushLayout;

    fn layout(version: FormatVersion) -> Option<BrushLayout> {
        BrushLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &BrushLayout) -> Result<Self> {
        Ok(Self {
            first_side: r.opt_int(l.first_side)?,
            num_sides: r.int(l.num_sides)?,
            contents: r.opt_int(l.contents)?,
            texture: r.opt_int(l.texture)?,
        })
    }
}

impl EncodeRecord for Brush {
    fn write(&self, w: &mut RecordWriter<'_>, l: &BrushLayout) -> Result<()> {
        w.opt_int(l.first_side, self.first_side)?;
        w.int(l.num_sides, self.num_sides)?;
        w.opt_int(l.contents, self.contents)?;
        w.opt_int(l.texture, self.texture)
    }
}

/// Compiled brush side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrushSide {
    /// Plane index, or the raw bits of an axial distance (Call of Duty)
    pub plane: i64,
    pub texture: Option<i64>,
    pub face: Option<i64>,
    pub displacement: Option<i64>,
    pub bevel: Option<i64>,
    pub extra: Option<i64>,
}

impl BrushSide {
    pub fn is_bevel(&self) -> bool {
        self.bevel.is_some_and(|b| b != 0)
    }

    /// Plane field reinterpreted as a float distance
    pub fn axial_distance(&self) -> f32 {
        f32::from_bits(self.plane as u32)
    }

    /// Referenced displacement, if any
    pub fn displacement_index(&self) -> Option<usize> {
        self.displacement.filter(|&d| d >= 0).map(|d| d as usize)
    }
}

impl LumpRecord for BrushSide {
    const KIND: RecordKind = RecordKind::BrushSide;
    type Layout = BrushSideLayout;

    fn layout(version: FormatVersion) -> Option<BrushSideLayout> {
        BrushSideLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &BrushSideLayout) -> Result<Self> {
        Ok(Self {
            plane: r.int(l.plane)?,
            texture: r.opt_int(l.texture)?,
            face: r.opt_int(l.face)?,
            displacement: r.opt_int(l.displacement)?,
            bevel: r.opt_int(l.bevel)?,
            extra: r.opt_int(l.extra)?,
        })
    }
}

impl EncodeRecord for BrushSide {
    fn write(&self, w: &mut RecordWriter<'_>, l: &BrushSideLayout) -> Result<()> {
        w.int(l.plane, self.plane)?;
        w.opt_int(l.texture, self.texture)?;
        w.opt_int(l.face, self.face)?;
        w.opt_int(l.displacement, self.displacement)?;
        w.opt_int(l.bevel, self.bevel)?;
        w.opt_int(l.extra, self.extra)
    }
}

// ============================================================================
// Tree
// ============================================================================

/// BSP leaf
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Leaf {
    pub contents: Option<i64>,
    pub bounds: Option<(Vector3D, Vector3D)>,
    pub first_mark_face: u32,
    pub num_mark_faces: u32,
    pub first_mark_brush: u32,
    pub num_mark_brushes: u32,
}

impl LumpRecord for Leaf {
    const KIND: RecordKind = RecordKind::Leaf;
    type Layout = LeafLayout;

    fn layout(version: FormatVersion) -> Option<LeafLayout> {
        LeafLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &LeafLayout) -> Result<Self> {
        let bounds = match l.bounds {
            Some((mins, maxs, BoundsEncoding::I16)) => Some((r.vec3_i16(mins)?, r.vec3_i16(maxs)?)),
            Some((mins, maxs, BoundsEncoding::I32)) => Some((r.vec3_i32(mins)?, r.vec3_i32(maxs)?)),
            Some((mins, maxs, BoundsEncoding::F32)) => Some((r.vec3(mins)?, r.vec3(maxs)?)),
            None => None,
        };
        let range = |f: Option<Field>| -> Result<u32> { Ok(r.opt_int(f)?.map_or(0, to_u32)) };
        Ok(Self {
            contents: r.opt_int(l.contents)?,
            bounds,
            first_mark_face: range(l.first_mark_face)?,
            num_mark_faces: range(l.num_mark_faces)?,
            first_mark_brush: range(l.first_mark_brush)?,
            num_mark_brushes: range(l.num_mark_brushes)?,
        })
    }
}

/// BSP node
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Node {
    pub plane: i64,
    /// Non-negative: node index; negative: `-(leaf + 1)`
    pub children: [i64; 2],
}

impl LumpRecord for Node {
    const KIND: RecordKind = RecordKind::Node;
    type Layout = NodeLayout;

    fn layout(version: FormatVersion) -> Option<NodeLayout> {
        NodeLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &NodeLayout) -> Result<Self> {
        Ok(Self {
            plane: r.int(l.plane)?,
            children: [r.int(l.children[0])?, r.int(l.children[1])?],
        })
    }
}

/// Brush model (index 0 is the world)
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Model {
    pub mins: Vector3D,
    pub maxs: Vector3D,
    pub origin: Option<Vector3D>,
    pub head_node: Option<i64>,
    pub first_leaf: Option<u32>,
    pub num_leaves: Option<u32>,
    pub first_brush: Option<u32>,
    pub num_brushes: Option<u32>,
    pub first_face: Option<u32>,
    pub num_faces: Option<u32>,
}

impl LumpRecord for Model {
    const KIND: RecordKind = RecordKind::Model;
    type Layout = ModelLayout;

    fn layout(version: FormatVersion) -> Option<ModelLayout> {
        ModelLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &ModelLayout) -> Result<Self> {
        let range = |f: Option<Field>| -> Result<Option<u32>> { Ok(r.opt_int(f)?.map(to_u32)) };
        Ok(Self {
            mins: r.vec3(l.mins)?,
            maxs: r.vec3(l.maxs)?,
            origin: l.origin.map(|o| r.vec3(o)).transpose()?,
            head_node: r.opt_int(l.head_node)?,
            first_leaf: range(l.first_leaf)?,
            num_leaves: range(l.num_leaves)?,
            first_brush: range(l.first_brush)?,
            num_brushes: range(l.num_brushes)?,
            first_face: range(l.first_face)?,
            num_faces: range(l.num_faces)?,
        })
    }
}

// ============================================================================
// Surfaces and texturing
// ============================================================================

/// Compiled face or draw surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Face {
    pub plane: Option<i64>,
    pub side: Option<i64>,
    pub first_edge: Option<i64>,
    pub num_edges: Option<i64>,
    pub first_vertex: Option<i64>,
    pub num_vertices: Option<i64>,
    pub texinfo: Option<i64>,
    pub texture: Option<i64>,
    pub material: Option<i64>,
    pub displacement: Option<i64>,
}

impl LumpRecord for Face {
    const KIND: RecordKind = RecordKind::Face;
    type Layout = FaceLayout;

    fn layout(version: FormatVersion) -> Option<FaceLayout> {
        FaceLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &FaceLayout) -> Result<Self> {
        Ok(Self {
            plane: r.opt_int(l.plane)?,
            side: r.opt_int(l.side)?,
            first_edge: r.opt_int(l.first_edge)?,
            num_edges: r.opt_int(l.num_edges)?,
            first_vertex: r.opt_int(l.first_vertex)?,
            num_vertices: r.opt_int(l.num_vertices)?,
            texinfo: r.opt_int(l.texinfo)?,
            texture: r.opt_int(l.texture)?,
            material: r.opt_int(l.material)?,
            displacement: r.opt_int(l.displacement)?,
        })
    }
}

/// Texture projection
#[derive(Clone, Debug, PartialEq)]
pub struct TexInfo {
    /// Scaled S axis and its shift
    pub s: (Vector3D, f64),
    /// Scaled T axis and its shift
    pub t: (Vector3D, f64),
    pub flags: i64,
    pub name: Option<String>,
    pub texdata: Option<i64>,
}

impl LumpRecord for TexInfo {
    const KIND: RecordKind = RecordKind::TexInfo;
    type Layout = TexInfoLayout;

    fn layout(version: FormatVersion) -> Option<TexInfoLayout> {
        TexInfoLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &TexInfoLayout) -> Result<Self> {
        Ok(Self {
            s: (r.vec3(l.s)?, r.f32(l.s + 12)? as f64),
            t: (r.vec3(l.t)?, r.f32(l.t + 12)? as f64),
            flags: r.opt_int(l.flags)?.unwrap_or(0),
            name: l.name.map(|(o, w)| r.name(o, w)).transpose()?,
            texdata: r.opt_int(l.texdata)?,
        })
    }
}

/// Shader / material / texture name record
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Texture {
    pub name: String,
    pub flags: i64,
    pub contents: i64,
}

impl LumpRecord for Texture {
    const KIND: RecordKind = RecordKind::Texture;
    type Layout = TextureLayout;

    fn layout(version: FormatVersion) -> Option<TextureLayout> {
        TextureLayout::for_kind(RecordKind::Texture, version)
    }

    fn read(r: &RecordReader<'_>, l: &TextureLayout) -> Result<Self> {
        Ok(Self {
            name: r.name(l.name.0, l.name.1)?,
            flags: r.opt_int(l.flags)?.unwrap_or(0),
            contents: r.opt_int(l.contents)?.unwrap_or(0),
        })
    }
}

/// Nightfire material name
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Material(pub String);

impl LumpRecord for Material {
    const KIND: RecordKind = RecordKind::Material;
    type Layout = TextureLayout;

    fn layout(version: FormatVersion) -> Option<TextureLayout> {
        TextureLayout::for_kind(RecordKind::Material, version)
    }

    fn read(r: &RecordReader<'_>, l: &TextureLayout) -> Result<Self> {
        Ok(Material(r.name(l.name.0, l.name.1)?))
    }
}

/// Source texdata
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexData {
    pub name_id: i64,
}

impl LumpRecord for TexData {
    const KIND: RecordKind = RecordKind::TexData;
    type Layout = TexDataLayout;

    fn layout(version: FormatVersion) -> Option<TexDataLayout> {
        TexDataLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &TexDataLayout) -> Result<Self> {
        Ok(Self {
            name_id: r.int(l.name_id)?,
        })
    }
}

// ============================================================================
// Displacements
// ============================================================================

/// Source displacement info
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DispInfo {
    pub start_position: Vector3D,
    pub vert_start: i64,
    pub power: i64,
    pub flags: i64,
    pub map_face: i64,
}

impl DispInfo {
    /// Vertices per displacement at this power
    pub fn vertex_count(&self) -> usize {
        let row = (1usize << self.power.clamp(0, 8)) + 1;
        row * row
    }
}

impl LumpRecord for DispInfo {
    const KIND: RecordKind = RecordKind::DispInfo;
    type Layout = DispInfoLayout;

    fn layout(version: FormatVersion) -> Option<DispInfoLayout> {
        DispInfoLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &DispInfoLayout) -> Result<Self> {
        Ok(Self {
            start_position: r.vec3(l.start_position)?,
            vert_start: r.int(l.vert_start)?,
            power: r.int(l.power)?,
            flags: r.int(l.flags)?,
            map_face: r.int(l.map_face)?,
        })
    }
}

/// Source displacement vertex
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DispVert {
    pub vector: Vector3D,
    pub dist: f64,
    pub alpha: f64,
}

impl LumpRecord for DispVert {
    const KIND: RecordKind = RecordKind::DispVert;
    type Layout = DispVertLayout;

    fn layout(version: FormatVersion) -> Option<DispVertLayout> {
        DispVertLayout::for_version(version)
    }

    fn read(r: &RecordReader<'_>, l: &DispVertLayout) -> Result<Self> {
        Ok(Self {
            vector: r.vec3(l.vector)?,
            dist: r.f32(l.dist)? as f64,
            alpha: r.f32(l.alpha)? as f64,
        })
    }
}
