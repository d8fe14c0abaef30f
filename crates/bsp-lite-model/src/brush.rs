// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reconstructed brushes and brush sides
//!
//! These are the editor-facing results of decompilation. A [`MapBrushSide`]
//! always carries both a plane and a three point triangle; the provenance
//! flags record which of the two came from compiled evidence.

use crate::{Plane, Vector3D};

/// Texture name used when a side has no usable texture reference
pub const DEFAULT_TEXTURE: &str = "special/nodraw";

/// Material name used when a side has no usable material reference
pub const DEFAULT_MATERIAL: &str = "wld_lightmap";

/// Default lightmap scale written for sides without lighting data
pub const DEFAULT_LIGHTMAP_SCALE: f64 = 16.0;

/// One texture projection axis
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct TextureAxis {
    /// Unit projection direction
    pub axis: Vector3D,
    /// Offset in texels
    pub shift: f64,
    /// World units per texel
    pub scale: f64,
}

impl TextureAxis {
    pub fn new(axis: Vector3D, shift: f64, scale: f64) -> Self {
        Self { axis, shift, scale }
    }

    /// Build from a compiled axis whose length encodes `1 / scale`
    ///
    /// # Returns
    /// `None` for a zero-length axis
    pub fn from_scaled(axis: Vector3D, shift: f64) -> Option<Self> {
        let len = axis.length();
        let unit = axis.normalized()?;
        Some(Self::new(unit, shift, 1.0 / len))
    }
}

/// Vertex of a Source displacement surface
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct DisplacementVertex {
    pub normal: Vector3D,
    pub distance: f64,
    pub alpha: f64,
}

/// Displacement attached to a brush side
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Displacement {
    /// Subdivision power (2, 3 or 4)
    pub power: u32,
    pub start_position: Vector3D,
    pub elevation: f64,
    pub flags: u32,
    /// `(2^power + 1)^2` vertices in row order
    pub vertices: Vec<DisplacementVertex>,
}

impl Displacement {
    /// Number of vertices along one edge
    pub fn row_len(&self) -> usize {
        (1usize << self.power) + 1
    }
}

/// A reconstructed brush side
#[derive(Clone, PartialEq, Debug)]
pub struct MapBrushSide {
    pub plane: Plane,
    /// Clockwise from the front, consistent with `plane`
    pub triangle: [Vector3D; 3],
    pub texture: String,
    pub u_axis: TextureAxis,
    pub v_axis: TextureAxis,
    pub rotation: f64,
    pub flags: i32,
    pub material: String,
    pub lightmap_scale: f64,
    pub lightmap_rotation: f64,
    pub displacement: Option<Displacement>,
    /// Triangle comes from real face vertices
    pub defined_by_triangle: bool,
    /// Plane comes from the compiled plane table
    pub defined_by_plane: bool,
}

impl MapBrushSide {
    /// Side with default texturing
    pub fn new(plane: Plane, triangle: [Vector3D; 3]) -> Self {
        let (u, v) = (
            TextureAxis::new(Vector3D::new(1.0, 0.0, 0.0), 0.0, 1.0),
            TextureAxis::new(Vector3D::new(0.0, -1.0, 0.0), 0.0, 1.0),
        );
        Self {
            plane,
            triangle,
            texture: DEFAULT_TEXTURE.to_string(),
            u_axis: u,
            v_axis: v,
            rotation: 0.0,
            flags: 0,
            material: DEFAULT_MATERIAL.to_string(),
            lightmap_scale: DEFAULT_LIGHTMAP_SCALE,
            lightmap_rotation: 0.0,
            displacement: None,
            defined_by_triangle: false,
            defined_by_plane: true,
        }
    }

    /// Whether this side carries a "nodraw" texture
    pub fn is_nodraw(&self) -> bool {
        self.texture.to_ascii_lowercase().contains("nodraw")
    }

    /// Reverse the side: negate the plane and swap the winding
    pub fn flip(&mut self) {
        self.plane.flip();
        self.triangle.swap(1, 2);
    }

    /// Replace the triangle, keeping the plane
    pub fn set_triangle(&mut self, triangle: [Vector3D; 3]) {
        self.triangle = triangle;
    }

    /// Plane implied by the winding of the triangle
    pub fn triangle_plane(&self) -> Option<Plane> {
        Plane::from_triangle(&self.triangle)
    }

    /// Move the side by `offset`, compensating texture shifts
    ///
    /// Texture coordinates are `dot(p, axis) / scale + shift`, so shifting the
    /// geometry changes each shift by `dot(offset, axis) / scale`.
    pub fn translate(&mut self, offset: &Vector3D) {
        self.plane = self.plane.translated(offset);
        for point in &mut self.triangle {
            *point += *offset;
        }
        for axis in [&mut self.u_axis, &mut self.v_axis] {
            if axis.scale.abs() > f64::EPSILON {
                axis.shift -= offset.dot(&axis.axis) / axis.scale;
            }
        }
    }
}

/// A reconstructed convex brush
#[derive(Clone, PartialEq, Debug, Default)]
pub struct MapBrush {
    sides: Vec<MapBrushSide>,
    pub detail: bool,
    pub water: bool,
    /// Index of the brush in the compiled brush lump
    pub brush_index: usize,
    /// Index of the owning entity
    pub entity_index: usize,
}

impl MapBrush {
    pub fn new(brush_index: usize, entity_index: usize) -> Self {
        Self {
            brush_index,
            entity_index,
            ..Default::default()
        }
    }

    /// Add a side unless an equal plane is already present
    ///
    /// On a duplicate the existing side is kept, except that a "nodraw"
    /// texture is replaced with the incoming one when that one is drawable.
    ///
    /// # Returns
    /// `true` if the side was appended
    pub fn add_side(&mut self, side: MapBrushSide, precision: f64) -> bool {
        if let Some(existing) = self
            .sides
            .iter_mut()
            .find(|s| s.plane.approx_eq(&side.plane, precision))
        {
            if existing.is_nodraw() && !side.is_nodraw() {
                *existing = side;
            }
            return false;
        }
        self.sides.push(side);
        true
    }

    /// Whether a side with this plane exists
    pub fn has_plane(&self, plane: &Plane, precision: f64) -> bool {
        self.sides.iter().any(|s| s.plane.approx_eq(plane, precision))
    }

    pub fn sides(&self) -> &[MapBrushSide] {
        &self.sides
    }

    pub fn sides_mut(&mut self) -> &mut [MapBrushSide] {
        &mut self.sides
    }

    pub fn num_sides(&self) -> usize {
        self.sides.len()
    }

    /// Remove and return side `index`
    pub fn remove_side(&mut self, index: usize) -> Option<MapBrushSide> {
        (index < self.sides.len()).then(|| self.sides.remove(index))
    }

    /// Planes of all sides in order
    pub fn planes(&self) -> Vec<Plane> {
        self.sides.iter().map(|s| s.plane).collect()
    }

    /// Move every side by `offset`
    pub fn translate(&mut self, offset: &Vector3D) {
        for side in &mut self.sides {
            side.translate(offset);
        }
    }
}
