// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Record layout table
//!
//! Pure data: for each `(RecordKind, FormatVersion)` pair the stride of one
//! record and the offset and width of every field the decompiler reads.
//! `None` means the format has no such record.

use crate::reader::Field;
use bsp_lite_model::FormatVersion;
use std::fmt;

use FormatVersion as V;

/// Kinds of fixed-size records found in lumps
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RecordKind {
    Plane,
    Vertex,
    Edge,
    SurfEdge,
    MarkBrush,
    MarkFace,
    Brush,
    BrushSide,
    Leaf,
    Node,
    Model,
    Face,
    TexInfo,
    Texture,
    Material,
    TexData,
    TexDataStringTable,
    DispInfo,
    DispVert,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Common access to the stride of any layout
pub trait RecordLayout {
    fn stride(&self) -> usize;
}

macro_rules! impl_layout {
    ($($ty:ty),* $(,)?) => {
        $(impl RecordLayout for $ty {
            fn stride(&self) -> usize {
                self.stride
            }
        })*
    };
}

impl_layout!(
    PlaneLayout,
    VertexLayout,
    EdgeLayout,
    IndexLayout,
    BrushLayout,
    BrushSideLayout,
    LeafLayout,
    NodeLayout,
    ModelLayout,
    FaceLayout,
    TexInfoLayout,
    TextureLayout,
    TexDataLayout,
    DispInfoLayout,
    DispVertLayout,
);

// ============================================================================
// Family predicates
// ============================================================================

fn quake2_like(v: FormatVersion) -> bool {
    matches!(v, V::Quake2 | V::SoldierOfFortune | V::Sin | V::Daikatana)
}

fn quake3_like(v: FormatVersion) -> bool {
    matches!(
        v,
        V::Quake3 | V::Wolfenstein | V::Raven | V::Fakk | V::Stef2Demo | V::Stef2 | V::Mohaa
    )
}

fn call_of_duty(v: FormatVersion) -> bool {
    matches!(v, V::CallOfDuty | V::CallOfDuty2 | V::CallOfDuty4)
}

fn source(v: FormatVersion) -> bool {
    v.is_source() && v != V::Vindictus
}

// ============================================================================
// Geometry records
// ============================================================================

/// Plane: three float normal plus float distance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaneLayout {
    pub stride: usize,
    pub normal: usize,
    pub dist: usize,
    /// Axial type tag, preserved for re-encoding
    pub kind: Option<Field>,
}

impl PlaneLayout {
    pub fn for_version(v: FormatVersion) -> Option<Self> {
        let with_type = Self {
            stride: 20,
            normal: 0,
            dist: 12,
            kind: Some(Field::i32(16)),
        };
        match v {
            V::Doom | V::Hexen => None,
            _ if quake3_like(v) || call_of_duty(v) => Some(Self {
                stride: 16,
                kind: None,
                ..with_type
            }),
            _ => Some(with_type),
        }
    }
}

/// Vertex position at the start of a (possibly larger) vertex record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexLayout {
    pub stride: usize,
    pub position: usize,
}

impl VertexLayout {
    pub fn for_version(v: FormatVersion) -> Option<Self> {
        let stride = match v {
            V::Doom | V::Hexen => return None,
            V::Raven => 80,
            V::Stef2 | V::Stef2Demo => 48,
            V::CallOfDuty2 | V::CallOfDuty4 => 68,
            V::Quake3 | V::Wolfenstein | V::Fakk | V::Mohaa | V::CallOfDuty => 44,
            _ => 12,
        };
        Some(Self {
            stride,
            position: 0,
        })
    }
}

/// Edge between two vertex indices
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeLayout {
    pub stride: usize,
    pub v0: Field,
    pub v1: Field,
}

impl EdgeLayout {
    pub fn for_version(v: FormatVersion) -> Option<Self> {
        match v {
            V::Vindictus => Some(Self {
                stride: 8,
                v0: Field::u32(0),
                v1: Field::u32(4),
            }),
            _ if quake2_like(v) || v.is_source() || matches!(v, V::Quake | V::HalfLife) => {
                Some(Self {
                    stride: 4,
                    v0: Field::u16(0),
                    v1: Field::u16(2),
                })
            }
            _ => None,
        }
    }
}

/// Flat list of integers (surfedges, mark lists, string table)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexLayout {
    pub stride: usize,
    pub value: Field,
}

impl IndexLayout {
    const fn of(field: Field) -> Self {
        Self {
            stride: field.ty.size(),
            value: field,
        }
    }

    pub fn for_kind(kind: RecordKind, v: FormatVersion) -> Option<Self> {
        match kind {
            RecordKind::SurfEdge => match v {
                _ if quake2_like(v) || v.is_source() || matches!(v, V::Quake | V::HalfLife) => {
                    Some(Self::of(Field::i32(0)))
                }
                _ => None,
            },
            RecordKind::MarkBrush | RecordKind::MarkFace => match v {
                V::Vindictus | V::Nightfire => Some(Self::of(Field::u32(0))),
                _ if quake2_like(v) || source(v) => Some(Self::of(Field::u16(0))),
                V::Quake | V::HalfLife if kind == RecordKind::MarkFace => {
                    Some(Self::of(Field::u16(0)))
                }
                _ if quake3_like(v) || call_of_duty(v) => Some(Self::of(Field::i32(0))),
                _ => None,
            },
            RecordKind::TexDataStringTable if v.is_source() => Some(Self::of(Field::i32(0))),
            _ => None,
        }
    }
}

// ============================================================================
// Brush records
// ============================================================================

/// Brush: side range, contents and (Quake 3 family) a texture
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrushLayout {
    pub stride: usize,
    /// Absent where sides are consumed sequentially (Call of Duty)
    pub first_side: Option<Field>,
    pub num_sides: Field,
    pub contents: Option<Field>,
    pub texture: Option<Field>,
}

impl BrushLayout {
    pub fn for_version(v: FormatVersion) -> Option<Self> {
        if quake2_like(v) || v.is_source() {
            return Some(Self {
                stride: 12,
                first_side: Some(Field::i32(0)),
                num_sides: Field::i32(4),
                contents: Some(Field::i32(8)),
                texture: None,
            });
        }
        if quake3_like(v) {
            return Some(Self {
                stride: 12,
                first_side: Some(Field::i32(0)),
                num_sides: Field::i32(4),
                contents: None,
                texture: Some(Field::i32(8)),
            });
        }
        if call_of_duty(v) {
            return Some(Self {
                stride: 4,
                first_side: None,
                num_sides: Field::u16(0),
                contents: None,
                texture: Some(Field::u16(2)),
            });
        }
        match v {
            V::Nightfire => Some(Self {
                stride: 12,
                first_side: Some(Field::i32(4)),
                num_sides: Field::i32(8),
                contents: Some(Field::i32(0)),
                texture: None,
            }),
            _ => None,
        }
    }
}

/// Brush side
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrushSideLayout {
    pub stride: usize,
    pub plane: Field,
    pub texture: Option<Field>,
    pub face: Option<Field>,
    pub displacement: Option<Field>,
    pub bevel: Option<Field>,
    /// Opaque trailing field (lighting info, thin flag, equivalence index)
    pub extra: Option<Field>,
    /// The plane field doubles as a float distance for the six axial sides
    pub axial_union: bool,
}

impl BrushSideLayout {
    const BASE: Self = Self {
        stride: 4,
        plane: Field::u16(0),
        texture: Some(Field::i16(2)),
        face: None,
        displacement: None,
        bevel: None,
        extra: None,
        axial_union: false,
    };

    pub fn for_version(v: FormatVersion) -> Option<Self> {
        Some(match v {
            V::Quake2 | V::SoldierOfFortune | V::Daikatana => Self::BASE,
            V::Sin => Self {
                stride: 8,
                extra: Some(Field::i32(4)),
                ..Self::BASE
            },
            V::Nightfire => Self {
                stride: 8,
                plane: Field::i32(4),
                texture: None,
                face: Some(Field::i32(0)),
                ..Self::BASE
            },
            V::Quake3 | V::Wolfenstein => Self {
                stride: 8,
                plane: Field::i32(0),
                texture: Some(Field::i32(4)),
                ..Self::BASE
            },
            V::Raven => Self {
                stride: 12,
                plane: Field::i32(0),
                texture: Some(Field::i32(4)),
                face: Some(Field::i32(8)),
                ..Self::BASE
            },
            V::Fakk | V::Stef2Demo | V::Stef2 | V::Mohaa => Self {
                stride: 12,
                plane: Field::i32(0),
                texture: Some(Field::i32(4)),
                extra: Some(Field::i32(8)),
                ..Self::BASE
            },
            V::CallOfDuty | V::CallOfDuty2 | V::CallOfDuty4 => Self {
                stride: 8,
                plane: Field::u32(0),
                texture: Some(Field::i32(4)),
                axial_union: true,
                ..Self::BASE
            },
            V::Vindictus => Self {
                stride: 16,
                plane: Field::u32(0),
                texture: Some(Field::i32(4)),
                displacement: Some(Field::i32(8)),
                bevel: Some(Field::i32(12)),
                ..Self::BASE
            },
            V::Source17 | V::Source18 | V::Source19 | V::Source20 => Self {
                stride: 8,
                displacement: Some(Field::i16(4)),
                bevel: Some(Field::i16(6)),
                ..Self::BASE
            },
            _ if v.is_source() => Self {
                stride: 8,
                displacement: Some(Field::i16(4)),
                bevel: Some(Field::u8(6)),
                extra: Some(Field::u8(7)),
                ..Self::BASE
            },
            _ => return None,
        })
    }
}

// ============================================================================
// Tree records
// ============================================================================

/// Encoding of a bounding box
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoundsEncoding {
    I16,
    I32,
    F32,
}

/// Leaf: bounds and ranges into the mark lists
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafLayout {
    pub stride: usize,
    pub contents: Option<Field>,
    pub bounds: Option<(usize, usize, BoundsEncoding)>,
    pub first_mark_face: Option<Field>,
    pub num_mark_faces: Option<Field>,
    pub first_mark_brush: Option<Field>,
    pub num_mark_brushes: Option<Field>,
}

impl LeafLayout {
    fn quake2(stride: usize) -> Self {
        Self {
            stride,
            contents: Some(Field::i32(0)),
            bounds: Some((8, 14, BoundsEncoding::I16)),
            first_mark_face: Some(Field::u16(20)),
            num_mark_faces: Some(Field::u16(22)),
            first_mark_brush: Some(Field::u16(24)),
            num_mark_brushes: Some(Field::u16(26)),
        }
    }

    fn ranged_i32(stride: usize, contents: Option<Field>, bounds: (usize, usize, BoundsEncoding)) -> Self {
        Self {
            stride,
            contents,
            bounds: Some(bounds),
            first_mark_face: Some(Field::i32(32)),
            num_mark_faces: Some(Field::i32(36)),
            first_mark_brush: Some(Field::i32(40)),
            num_mark_brushes: Some(Field::i32(44)),
        }
    }

    pub fn for_version(v: FormatVersion) -> Option<Self> {
        Some(match v {
            V::Quake2 | V::SoldierOfFortune | V::Sin => Self::quake2(28),
            V::Daikatana => Self {
                bounds: Some((12, 18, BoundsEncoding::I16)),
                first_mark_face: Some(Field::u16(24)),
                num_mark_faces: Some(Field::u16(26)),
                first_mark_brush: Some(Field::u16(28)),
                num_mark_brushes: Some(Field::u16(30)),
                ..Self::quake2(32)
            },
            V::Source17 | V::Source18 | V::Source19 => Self::quake2(56),
            V::Vindictus => Self {
                stride: 56,
                contents: Some(Field::i32(0)),
                bounds: Some((12, 24, BoundsEncoding::I32)),
                first_mark_face: Some(Field::u32(36)),
                num_mark_faces: Some(Field::u32(40)),
                first_mark_brush: Some(Field::u32(44)),
                num_mark_brushes: Some(Field::u32(48)),
            },
            _ if v.is_source() => Self::quake2(32),
            V::Nightfire => Self::ranged_i32(48, Some(Field::i32(0)), (8, 20, BoundsEncoding::F32)),
            V::Quake3 | V::Wolfenstein | V::Raven => {
                Self::ranged_i32(48, None, (8, 20, BoundsEncoding::I32))
            }
            V::Fakk | V::Stef2Demo | V::Stef2 | V::Mohaa => {
                Self::ranged_i32(64, None, (8, 20, BoundsEncoding::I32))
            }
            _ => return None,
        })
    }
}

/// Node: split plane and two children (negative child = `-(leaf + 1)`)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeLayout {
    pub stride: usize,
    pub plane: Field,
    pub children: [Field; 2],
}

impl NodeLayout {
    pub fn for_version(v: FormatVersion) -> Option<Self> {
        let stride = match v {
            _ if quake2_like(v) => 28,
            V::Vindictus => 48,
            _ if v.is_source() => 32,
            V::Nightfire => 36,
            _ if quake3_like(v) => 36,
            V::Quake | V::HalfLife => 24,
            _ => return None,
        };
        let children = if matches!(v, V::Quake | V::HalfLife) {
            [Field::i16(4), Field::i16(6)]
        } else {
            [Field::i32(4), Field::i32(8)]
        };
        Some(Self {
            stride,
            plane: Field::i32(0),
            children,
        })
    }
}

/// Model: bounds, origin and whichever reference ranges the format stores
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelLayout {
    pub stride: usize,
    pub mins: usize,
    pub maxs: usize,
    pub origin: Option<usize>,
    pub head_node: Option<Field>,
    pub first_leaf: Option<Field>,
    pub num_leaves: Option<Field>,
    pub first_brush: Option<Field>,
    pub num_brushes: Option<Field>,
    pub first_face: Option<Field>,
    pub num_faces: Option<Field>,
}

impl ModelLayout {
    const EMPTY: Self = Self {
        stride: 0,
        mins: 0,
        maxs: 12,
        origin: None,
        head_node: None,
        first_leaf: None,
        num_leaves: None,
        first_brush: None,
        num_brushes: None,
        first_face: None,
        num_faces: None,
    };

    const TREE: Self = Self {
        stride: 48,
        origin: Some(24),
        head_node: Some(Field::i32(36)),
        first_face: Some(Field::i32(40)),
        num_faces: Some(Field::i32(44)),
        ..Self::EMPTY
    };

    fn brush_range(stride: usize, first_brush: usize) -> Self {
        Self {
            stride,
            first_brush: Some(Field::i32(first_brush)),
            num_brushes: Some(Field::i32(first_brush + 4)),
            ..Self::EMPTY
        }
    }

    pub fn for_version(v: FormatVersion) -> Option<Self> {
        Some(match v {
            _ if quake2_like(v) || v.is_source() => Self::TREE,
            V::Quake | V::HalfLife => Self {
                stride: 64,
                first_face: Some(Field::i32(56)),
                num_faces: Some(Field::i32(60)),
                ..Self::TREE
            },
            V::Nightfire => Self {
                stride: 56,
                head_node: Some(Field::i32(24)),
                first_leaf: Some(Field::i32(40)),
                num_leaves: Some(Field::i32(44)),
                first_face: Some(Field::i32(48)),
                num_faces: Some(Field::i32(52)),
                ..Self::EMPTY
            },
            _ if quake3_like(v) => Self {
                first_face: Some(Field::i32(24)),
                num_faces: Some(Field::i32(28)),
                ..Self::brush_range(40, 32)
            },
            V::CallOfDuty => Self::brush_range(52, 44),
            V::CallOfDuty2 | V::CallOfDuty4 => Self::brush_range(48, 40),
            _ => return None,
        })
    }
}

// ============================================================================
// Surface records
// ============================================================================

/// Face: plane, vertex source (edge loop or direct range) and texturing
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaceLayout {
    pub stride: usize,
    pub plane: Option<Field>,
    pub side: Option<Field>,
    pub first_edge: Option<Field>,
    pub num_edges: Option<Field>,
    pub first_vertex: Option<Field>,
    pub num_vertices: Option<Field>,
    pub texinfo: Option<Field>,
    pub texture: Option<Field>,
    pub material: Option<Field>,
    pub displacement: Option<Field>,
}

impl FaceLayout {
    const EMPTY: Self = Self {
        stride: 0,
        plane: None,
        side: None,
        first_edge: None,
        num_edges: None,
        first_vertex: None,
        num_vertices: None,
        texinfo: None,
        texture: None,
        material: None,
        displacement: None,
    };

    const EDGE_LOOP: Self = Self {
        stride: 20,
        plane: Some(Field::u16(0)),
        side: Some(Field::u16(2)),
        first_edge: Some(Field::i32(4)),
        num_edges: Some(Field::u16(8)),
        texinfo: Some(Field::i16(10)),
        ..Self::EMPTY
    };

    fn surface(stride: usize) -> Self {
        Self {
            stride,
            texture: Some(Field::i32(0)),
            first_vertex: Some(Field::i32(12)),
            num_vertices: Some(Field::i32(16)),
            ..Self::EMPTY
        }
    }

    pub fn for_version(v: FormatVersion) -> Option<Self> {
        Some(match v {
            V::Quake | V::HalfLife | V::Quake2 | V::SoldierOfFortune | V::Daikatana => {
                Self::EDGE_LOOP
            }
            V::Sin => Self {
                stride: 36,
                ..Self::EDGE_LOOP
            },
            V::Nightfire => Self {
                stride: 48,
                plane: Some(Field::i32(0)),
                first_vertex: Some(Field::i32(4)),
                num_vertices: Some(Field::i32(8)),
                texture: Some(Field::i32(24)),
                material: Some(Field::i32(28)),
                texinfo: Some(Field::i32(32)),
                ..Self::EMPTY
            },
            V::Vindictus => Self {
                stride: 72,
                plane: Some(Field::u32(0)),
                side: Some(Field::u8(4)),
                first_edge: Some(Field::i32(8)),
                num_edges: Some(Field::i32(12)),
                texinfo: Some(Field::i32(16)),
                displacement: Some(Field::i32(20)),
                ..Self::EMPTY
            },
            _ if v.is_source() => Self {
                stride: 56,
                side: Some(Field::u8(2)),
                num_edges: Some(Field::i16(8)),
                displacement: Some(Field::i16(12)),
                ..Self::EDGE_LOOP
            },
            V::Quake3 | V::Wolfenstein => Self::surface(104),
            V::Raven => Self::surface(148),
            V::Fakk | V::Stef2Demo | V::Mohaa => Self::surface(108),
            V::Stef2 => Self::surface(132),
            _ => return None,
        })
    }
}

/// Texture projection: two `xyz + shift` rows, flags and a texture source
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexInfoLayout {
    pub stride: usize,
    pub s: usize,
    pub t: usize,
    pub flags: Option<Field>,
    /// Inline texture name `(offset, width)`
    pub name: Option<(usize, usize)>,
    /// Index into texdata (Source) or miptex (Quake)
    pub texdata: Option<Field>,
}

impl TexInfoLayout {
    pub fn for_version(v: FormatVersion) -> Option<Self> {
        let base = Self {
            stride: 0,
            s: 0,
            t: 16,
            flags: None,
            name: None,
            texdata: None,
        };
        Some(match v {
            V::Quake2 | V::SoldierOfFortune | V::Daikatana => Self {
                stride: 76,
                flags: Some(Field::i32(32)),
                name: Some((40, 32)),
                ..base
            },
            V::Sin => Self {
                stride: 180,
                flags: Some(Field::i32(32)),
                name: Some((36, 64)),
                ..base
            },
            V::Nightfire => Self { stride: 32, ..base },
            V::Quake | V::HalfLife => Self {
                stride: 40,
                texdata: Some(Field::i32(32)),
                flags: Some(Field::i32(36)),
                ..base
            },
            _ if v.is_source() => Self {
                stride: 72,
                flags: Some(Field::i32(64)),
                texdata: Some(Field::i32(68)),
                ..base
            },
            _ => return None,
        })
    }
}

/// Named texture/shader/material record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureLayout {
    pub stride: usize,
    pub name: (usize, usize),
    pub flags: Option<Field>,
    pub contents: Option<Field>,
}

impl TextureLayout {
    pub fn for_kind(kind: RecordKind, v: FormatVersion) -> Option<Self> {
        let shader = |stride| Self {
            stride,
            name: (0, 64),
            flags: Some(Field::i32(64)),
            contents: Some(Field::i32(68)),
        };
        let plain = Self {
            stride: 64,
            name: (0, 64),
            flags: None,
            contents: None,
        };
        match (kind, v) {
            (RecordKind::Texture, V::Nightfire) | (RecordKind::Material, V::Nightfire) => {
                Some(plain)
            }
            (RecordKind::Texture, V::Quake3 | V::Wolfenstein | V::Raven) => Some(shader(72)),
            (RecordKind::Texture, V::CallOfDuty | V::CallOfDuty2 | V::CallOfDuty4) => {
                Some(shader(72))
            }
            (RecordKind::Texture, V::Fakk | V::Stef2Demo | V::Mohaa) => Some(shader(76)),
            (RecordKind::Texture, V::Stef2) => Some(shader(140)),
            _ => None,
        }
    }
}

/// Source texdata: reflectivity, name string id and dimensions
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TexDataLayout {
    pub stride: usize,
    pub name_id: Field,
}

impl TexDataLayout {
    pub fn for_version(v: FormatVersion) -> Option<Self> {
        v.is_source().then_some(Self {
            stride: 32,
            name_id: Field::i32(12),
        })
    }
}

/// Source displacement info
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispInfoLayout {
    pub stride: usize,
    pub start_position: usize,
    pub vert_start: Field,
    pub power: Field,
    pub flags: Field,
    pub map_face: Field,
}

impl DispInfoLayout {
    pub fn for_version(v: FormatVersion) -> Option<Self> {
        let stride = match v {
            V::Vindictus => 232,
            _ if v.is_source() => 176,
            _ => return None,
        };
        Some(Self {
            stride,
            start_position: 0,
            vert_start: Field::i32(12),
            power: Field::i32(20),
            flags: Field::i32(32),
            map_face: Field::u16(36),
        })
    }
}

/// Source displacement vertex: offset direction, distance and alpha
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispVertLayout {
    pub stride: usize,
    pub vector: usize,
    pub dist: usize,
    pub alpha: usize,
}

impl DispVertLayout {
    pub fn for_version(v: FormatVersion) -> Option<Self> {
        v.is_source().then_some(Self {
            stride: 20,
            vector: 0,
            dist: 12,
            alpha: 16,
        })
    }
}

/// Stride of a record kind, if the format has it
pub fn stride_of(kind: RecordKind, v: FormatVersion) -> Option<usize> {
    match kind {
        RecordKind::Plane => PlaneLayout::for_version(v).map(|l| l.stride),
        RecordKind::Vertex => VertexLayout::for_version(v).map(|l| l.stride),
        RecordKind::Edge => EdgeLayout::for_version(v).map(|l| l.stride),
        RecordKind::SurfEdge
        | RecordKind::MarkBrush
        | RecordKind::MarkFace
        | RecordKind::TexDataStringTable => IndexLayout::for_kind(kind, v).map(|l| l.stride),
        RecordKind::Brush => BrushLayout::for_version(v).map(|l| l.stride),
        RecordKind::BrushSide => BrushSideLayout::for_version(v).map(|l| l.stride),
        RecordKind::Leaf => LeafLayout::for_version(v).map(|l| l.stride),
        RecordKind::Node => NodeLayout::for_version(v).map(|l| l.stride),
        RecordKind::Model => ModelLayout::for_version(v).map(|l| l.stride),
        RecordKind::Face => FaceLayout::for_version(v).map(|l| l.stride),
        RecordKind::TexInfo => TexInfoLayout::for_version(v).map(|l| l.stride),
        RecordKind::Texture | RecordKind::Material => {
            TextureLayout::for_kind(kind, v).map(|l| l.stride)
        }
        RecordKind::TexData => TexDataLayout::for_version(v).map(|l| l.stride),
        RecordKind::DispInfo => DispInfoLayout::for_version(v).map(|l| l.stride),
        RecordKind::DispVert => DispVertLayout::for_version(v).map(|l| l.stride),
    }
    .filter(|&s| s > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[FormatVersion] = &[
        V::Quake,
        V::HalfLife,
        V::Nightfire,
        V::Quake2,
        V::Daikatana,
        V::SoldierOfFortune,
        V::Sin,
        V::Quake3,
        V::Wolfenstein,
        V::Raven,
        V::Fakk,
        V::Stef2Demo,
        V::Stef2,
        V::Mohaa,
        V::CallOfDuty,
        V::CallOfDuty2,
        V::CallOfDuty4,
        V::Source17,
        V::Source18,
        V::Source19,
        V::Source20,
        V::Source21,
        V::Source22,
        V::Source23,
        V::Left4Dead2,
        V::Vindictus,
        V::TacticalIntervention,
        V::DarkMessiah,
    ];

    #[test]
    fn test_brush_formats_have_core_layouts() {
        for &v in ALL.iter().filter(|v| v.has_brushes()) {
            for kind in [RecordKind::Plane, RecordKind::Brush, RecordKind::BrushSide, RecordKind::Model] {
                assert!(stride_of(kind, v).is_some(), "{kind} missing for {v}");
            }
        }
    }

    #[test]
    fn test_fields_fit_in_stride() {
        for &v in ALL {
            if let Some(l) = BrushSideLayout::for_version(v) {
                for f in [Some(l.plane), l.texture, l.face, l.displacement, l.bevel, l.extra]
                    .into_iter()
                    .flatten()
                {
                    assert!(f.end() <= l.stride, "brush side field overflows for {v}");
                }
            }
            if let Some(l) = LeafLayout::for_version(v) {
                for f in [l.first_mark_brush, l.num_mark_brushes].into_iter().flatten() {
                    assert!(f.end() <= l.stride, "leaf field overflows for {v}");
                }
            }
            if let Some(l) = ModelLayout::for_version(v) {
                for f in [l.head_node, l.first_brush, l.num_brushes, l.num_faces, l.num_leaves]
                    .into_iter()
                    .flatten()
                {
                    assert!(f.end() <= l.stride, "model field overflows for {v}");
                }
            }
        }
    }

    #[test]
    fn test_known_strides() {
        assert_eq!(stride_of(RecordKind::Plane, V::Quake2), Some(20));
        assert_eq!(stride_of(RecordKind::Plane, V::Quake3), Some(16));
        assert_eq!(stride_of(RecordKind::BrushSide, V::Quake2), Some(4));
        assert_eq!(stride_of(RecordKind::BrushSide, V::Raven), Some(12));
        assert_eq!(stride_of(RecordKind::Leaf, V::Source19), Some(56));
        assert_eq!(stride_of(RecordKind::Leaf, V::Source20), Some(32));
        assert_eq!(stride_of(RecordKind::Brush, V::CallOfDuty), Some(4));
        assert_eq!(stride_of(RecordKind::Brush, V::Quake), None);
        assert_eq!(stride_of(RecordKind::Plane, V::Doom), None);
    }
}
