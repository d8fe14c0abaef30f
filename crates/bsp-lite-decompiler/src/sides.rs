// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brush side reconstruction
//!
//! Turns the compiled sides of one brush into [`MapBrushSide`]s: a plane, a
//! three point triangle (from face vertices when the format links sides to
//! faces, synthesized otherwise) and texturing.

use crate::progress::MessageSink;
use bsp_lite_geometry::{generate_plane_points, texture_axis_from_plane, triangle_from_face};
use bsp_lite_model::{
    Contents, DecompilerSettings, Displacement, DisplacementVertex, EngineFamily, MapBrush,
    MapBrushSide, Plane, TextureAxis, Vector3D, DEFAULT_MATERIAL, DEFAULT_TEXTURE,
};
use bsp_lite_parser::{BrushSide, BspFile, Face};
use rustc_hash::FxHashMap;
use std::ops::Range;

/// Call of Duty brushes start with six axial sides: -X, +X, -Y, +Y, -Z, +Z
const AXIAL_SIDES: usize = 6;

/// Identifies a brush in diagnostics
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrushRef {
    pub entity: usize,
    pub brush: usize,
}

/// Builds [`MapBrush`]es from compiled brushes of one file
pub struct SideBuilder<'a> {
    file: &'a BspFile,
    settings: &'a DecompilerSettings,
    family: EngineFamily,
    /// Texinfo index to resolved texture name
    texture_names: FxHashMap<usize, String>,
}

/// Plane of a side and where it came from
struct ResolvedPlane {
    plane: Plane,
    from_table: bool,
}

impl<'a> SideBuilder<'a> {
    pub fn new(file: &'a BspFile, settings: &'a DecompilerSettings) -> Self {
        Self {
            file,
            settings,
            family: file.version.family(),
            texture_names: FxHashMap::default(),
        }
    }

    /// Content flags of a compiled brush
    ///
    /// Shader based formats keep them on the brush's texture.
    pub fn contents(&self, brush: usize) -> Contents {
        let Some(b) = self.file.brushes.get(brush) else {
            return Contents::empty();
        };
        let raw = b.contents.or_else(|| {
            let texture = usize::try_from(b.texture?).ok()?;
            Some(self.file.textures.get(texture)?.contents)
        });
        Contents::from_raw(raw.unwrap_or(0) as u32, self.family)
    }

    /// Build the editor brush for compiled brush `at.brush`
    ///
    /// Returns `None` when no side survives.
    pub fn build(
        &mut self,
        at: BrushRef,
        sides: Range<usize>,
        origin: Option<&Vector3D>,
        sink: &mut MessageSink<'_>,
    ) -> Option<MapBrush> {
        let contents = self.contents(at.brush);
        let mut brush = MapBrush::new(at.brush, at.entity);
        brush.detail = contents.is_detail() && !self.settings.no_detail;
        brush.water = contents.is_liquid() && !self.settings.no_water;

        let precision = self.settings.precision;
        for (n, index) in sides.enumerate() {
            let Some(compiled) = self.file.brush_sides.get(index) else {
                break;
            };
            if compiled.is_bevel() {
                continue;
            }
            let side = self.build_side(at, n, compiled, sink);
            if brush.has_plane(&side.plane, precision) {
                sink.warn(format_args!(
                    "entity {} brush {} side {}: duplicate plane {}",
                    at.entity, at.brush, n, side.plane
                ));
            }
            brush.add_side(side, precision);
        }

        if brush.num_sides() == 0 {
            sink.warn(format_args!(
                "entity {} brush {}: no usable sides",
                at.entity, at.brush
            ));
            return None;
        }
        if let Some(origin) = origin {
            brush.translate(origin);
        }
        Some(brush)
    }

    fn build_side(
        &mut self,
        at: BrushRef,
        n: usize,
        compiled: &BrushSide,
        sink: &mut MessageSink<'_>,
    ) -> MapBrushSide {
        let face = compiled
            .face
            .and_then(|f| usize::try_from(f).ok())
            .and_then(|f| self.file.faces.get(f));

        let ResolvedPlane { mut plane, mut from_table } = self.resolve_plane(at, n, compiled, face, sink);

        let precision = self.settings.precision;
        let face_triangle = face
            .map(|f| self.file.face_vertices(f))
            .and_then(|verts| triangle_from_face(&verts, precision));
        let (triangle, defined_by_triangle) = match face_triangle {
            Some(t) => (t, true),
            None => match generate_plane_points(&plane, self.settings.plane_point_coef) {
                Some(t) => (t, false),
                None => {
                    sink.warn(format_args!(
                        "entity {} brush {} side {}: zero normal plane replaced",
                        at.entity, at.brush, n
                    ));
                    plane = Plane::degenerate();
                    from_table = false;
                    let points = generate_plane_points(&plane, self.settings.plane_point_coef)
                        .unwrap_or([Vector3D::ZERO; 3]);
                    (points, false)
                }
            },
        };

        let mut side = MapBrushSide::new(plane, triangle);
        side.defined_by_triangle = defined_by_triangle;
        side.defined_by_plane = from_table;
        self.apply_texture(at, n, compiled, face, &mut side, sink);
        if self.settings.no_face_flags {
            side.flags = 0;
        }
        if let Some(d) = compiled.displacement_index() {
            side.displacement = self.displacement(at, n, d, sink);
        }
        side
    }

    fn resolve_plane(
        &self,
        at: BrushRef,
        n: usize,
        compiled: &BrushSide,
        face: Option<&Face>,
        sink: &mut MessageSink<'_>,
    ) -> ResolvedPlane {
        if self.family == EngineFamily::CallOfDuty && n < AXIAL_SIDES {
            let d = compiled.axial_distance() as f64;
            let mut normal = [0.0; 3];
            let sign = if n % 2 == 0 { -1.0 } else { 1.0 };
            normal[n / 2] = sign;
            let plane = Plane::new(Vector3D::from(normal), sign * d);
            return ResolvedPlane {
                plane: plane.snapped(self.settings.precision),
                from_table: true,
            };
        }

        if let Some(plane) = usize::try_from(compiled.plane)
            .ok()
            .and_then(|p| self.file.planes.get(p))
        {
            return ResolvedPlane {
                plane: *plane,
                from_table: true,
            };
        }

        let face_plane = face.and_then(|f| {
            let plane = self.file.planes.get(usize::try_from(f.plane?).ok()?)?;
            Some(if f.side.is_some_and(|s| s != 0) {
                plane.flipped()
            } else {
                *plane
            })
        });
        if let Some(plane) = face_plane {
            return ResolvedPlane {
                plane,
                from_table: true,
            };
        }

        sink.warn(format_args!(
            "entity {} brush {} side {}: plane {} out of range, using default",
            at.entity, at.brush, n, compiled.plane
        ));
        ResolvedPlane {
            plane: Plane::degenerate(),
            from_table: false,
        }
    }

    fn apply_texture(
        &mut self,
        at: BrushRef,
        n: usize,
        compiled: &BrushSide,
        face: Option<&Face>,
        side: &mut MapBrushSide,
        sink: &mut MessageSink<'_>,
    ) {
        let (u, v) = texture_axis_from_plane(&side.plane);
        side.u_axis = TextureAxis::new(u, 0.0, 1.0);
        side.v_axis = TextureAxis::new(v, 0.0, 1.0);

        let missing = |what: &str, index: i64, sink: &mut MessageSink<'_>| {
            sink.warn(format_args!(
                "entity {} brush {} side {}: {} {} out of range, using default",
                at.entity, at.brush, n, what, index
            ));
        };

        let texinfo = match self.family {
            EngineFamily::Nightfire => face.and_then(|f| f.texinfo),
            EngineFamily::Quake2 | EngineFamily::Source => compiled.texture,
            _ => None,
        };
        if let Some(index) = texinfo.filter(|&i| i >= 0) {
            match self.file.tex_infos.get(index as usize) {
                Some(info) => {
                    if let Some(axis) = TextureAxis::from_scaled(info.s.0, info.s.1) {
                        side.u_axis = axis;
                    }
                    if let Some(axis) = TextureAxis::from_scaled(info.t.0, info.t.1) {
                        side.v_axis = axis;
                    }
                    side.flags = info.flags as i32;
                }
                None => missing("texinfo", index, sink),
            }
        }

        match self.family {
            EngineFamily::Quake2 | EngineFamily::Source => {
                if let Some(index) = texinfo.filter(|&i| i >= 0) {
                    if let Some(name) = self.texinfo_name(index as usize) {
                        side.texture = name;
                    }
                }
            }
            EngineFamily::Nightfire => {
                let Some(face) = face else {
                    return;
                };
                if let Some(index) = face.texture.filter(|&i| i >= 0) {
                    match self.file.textures.get(index as usize) {
                        Some(t) => side.texture = t.name.clone(),
                        None => missing("texture", index, sink),
                    }
                }
                if let Some(index) = face.material.filter(|&i| i >= 0) {
                    match self.file.materials.get(index as usize) {
                        Some(m) => side.material = m.0.clone(),
                        None => {
                            missing("material", index, sink);
                            side.material = DEFAULT_MATERIAL.to_string();
                        }
                    }
                }
            }
            _ => {
                if let Some(index) = compiled.texture.filter(|&i| i >= 0) {
                    match self.file.textures.get(index as usize) {
                        Some(t) => {
                            side.texture = t.name.clone();
                            side.flags = t.flags as i32;
                        }
                        None => missing("texture", index, sink),
                    }
                }
            }
        }
        if side.texture.is_empty() {
            side.texture = DEFAULT_TEXTURE.to_string();
        }
    }

    /// Texture name behind a texinfo, cached
    fn texinfo_name(&mut self, index: usize) -> Option<String> {
        if let Some(name) = self.texture_names.get(&index) {
            return Some(name.clone());
        }
        let name = if self.family == EngineFamily::Source {
            self.file.texdata_name(index).map(str::to_string)
        } else {
            self.file.tex_infos.get(index)?.name.clone()
        }?;
        self.texture_names.insert(index, name.clone());
        Some(name)
    }

    fn displacement(
        &self,
        at: BrushRef,
        n: usize,
        index: usize,
        sink: &mut MessageSink<'_>,
    ) -> Option<Displacement> {
        let Some(info) = self.file.disp_infos.get(index) else {
            sink.warn(format_args!(
                "entity {} brush {} side {}: displacement {} out of range",
                at.entity, at.brush, n, index
            ));
            return None;
        };
        let start = usize::try_from(info.vert_start).unwrap_or(usize::MAX);
        let vertices = start
            .checked_add(info.vertex_count())
            .and_then(|end| self.file.disp_verts.get(start..end));
        let Some(vertices) = vertices else {
            sink.warn(format_args!(
                "entity {} brush {} side {}: displacement {} vertices out of range",
                at.entity, at.brush, n, index
            ));
            return None;
        };
        Some(Displacement {
            power: info.power.clamp(0, 8) as u32,
            start_position: info.start_position,
            elevation: 0.0,
            flags: info.flags as u32,
            vertices: vertices
                .iter()
                .map(|v| DisplacementVertex {
                    normal: v.vector,
                    distance: v.dist,
                    alpha: v.alpha,
                })
                .collect(),
        })
    }
}
