// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Side orientation correction
//!
//! Compiled brush sides do not record which way their plane faces relative
//! to the solid. Sides backed by real face vertices fix an interior point;
//! brushes with no such side are rebuilt from their planes alone.

use crate::error::{GeometryError, Result};
use crate::hull::find_hull;
use crate::triangle::{spread_triangle, wind_away_from};
use bsp_lite_model::{MapBrush, Plane, Vector3D};

/// How much face evidence a brush carries
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SideEvidence {
    /// Every side has a triangle taken from face vertices
    AllTriangles,
    /// Some sides do
    Mixed,
    /// No side does
    PlanesOnly,
}

impl SideEvidence {
    pub fn of(brush: &MapBrush) -> Self {
        let good = brush
            .sides()
            .iter()
            .filter(|s| s.defined_by_triangle)
            .count();
        match good {
            0 => SideEvidence::PlanesOnly,
            n if n == brush.num_sides() => SideEvidence::AllTriangles,
            _ => SideEvidence::Mixed,
        }
    }
}

/// What a correction pass did to a brush
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Correction {
    /// Left as it was
    Unchanged,
    /// Oriented against face-backed sides
    Simple { flipped: usize },
    /// Rebuilt from planes
    Advanced { flipped: usize },
}

/// Orient the sides of a brush with at least one face-backed side
///
/// Face-backed triangles are first made to agree with their own plane. The
/// centroid of the first face-backed triangle lies on the brush surface, and
/// every side whose plane has that point in front is flipped.
///
/// # Returns
/// Number of sides flipped, including face-backed winding fixes
pub fn simple_correct(brush: &mut MapBrush, precision: f64) -> usize {
    let mut flipped = 0;
    let mut reference = None;
    for side in brush.sides_mut().iter_mut().filter(|s| s.defined_by_triangle) {
        if let Some(tri_plane) = side.triangle_plane() {
            if !tri_plane.same_facing(&side.plane) {
                side.triangle.swap(1, 2);
                flipped += 1;
            }
        }
        if reference.is_none() {
            reference = Vector3D::centroid(&side.triangle);
        }
    }

    let Some(reference) = reference else {
        return flipped;
    };
    for side in brush.sides_mut() {
        if side.plane.distance(&reference) > precision {
            side.flip();
            flipped += 1;
        }
    }
    flipped
}

/// Rebuild the sides of a brush from its planes alone
///
/// Every side gets a triangle from three hull corners on its plane, wound so
/// that the hull centroid lies behind it. The brush is left untouched on
/// error.
///
/// # Returns
/// Number of sides whose plane was reversed
pub fn advanced_correct(brush: &mut MapBrush, precision: f64) -> Result<usize> {
    let planes = brush.planes();
    let hull = find_hull(&planes, precision)?;

    let mut rebuilt: Vec<([Vector3D; 3], Plane)> = Vec::with_capacity(planes.len());
    for (i, plane) in planes.iter().enumerate() {
        let corners: Vec<Vector3D> = hull.corners_on(i).collect();
        let triangle = spread_triangle(&corners, precision)
            .and_then(|t| wind_away_from(t, &hull.centroid))
            .ok_or_else(|| {
                GeometryError::degenerate_cross(format!("plane {} ({})", i, plane))
            })?;
        let tri_plane = Plane::from_triangle(&triangle)
            .ok_or_else(|| GeometryError::degenerate_cross(format!("plane {}", i)))?;
        rebuilt.push((triangle, tri_plane));
    }

    let mut flipped = 0;
    for (i, (side, (triangle, tri_plane))) in
        brush.sides_mut().iter_mut().zip(rebuilt).enumerate()
    {
        if hull.is_flipped(i) {
            side.plane.flip();
            flipped += 1;
        }
        if !side.plane.approx_eq(&tri_plane, precision) {
            log::debug!(
                "Side {} plane {} replaced by hull plane {}",
                i,
                side.plane,
                tri_plane
            );
            side.plane = tri_plane;
        }
        side.set_triangle(triangle);
        side.defined_by_triangle = true;
    }
    Ok(flipped)
}

/// Pick and run the correction pass a brush needs
///
/// Does nothing when `skip` is set or every side is face-backed.
pub fn correct_brush(brush: &mut MapBrush, precision: f64, skip: bool) -> Result<Correction> {
    if skip {
        return Ok(Correction::Unchanged);
    }
    match SideEvidence::of(brush) {
        SideEvidence::AllTriangles => Ok(Correction::Unchanged),
        SideEvidence::Mixed => Ok(Correction::Simple {
            flipped: simple_correct(brush, precision),
        }),
        SideEvidence::PlanesOnly => Ok(Correction::Advanced {
            flipped: advanced_correct(brush, precision)?,
        }),
    }
}
