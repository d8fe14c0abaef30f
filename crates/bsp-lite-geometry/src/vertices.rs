// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brush corner recomputation and unused plane culling

use crate::error::{GeometryError, Result};
use crate::hull::candidate_corners;
use crate::triangle::spread_triangle;
use bsp_lite_model::{MapBrush, Plane, Vector3D};

/// Candidate corners that no plane places outside
pub fn true_corners(planes: &[Plane], precision: f64) -> Vec<Vector3D> {
    candidate_corners(planes, precision)
        .into_iter()
        .filter(|p| planes.iter().all(|plane| plane.distance(p) <= precision))
        .collect()
}

/// Replace every side triangle with three true corners of the brush
///
/// Triangles are wound to agree with the side's current plane. Nothing is
/// changed unless every side gets a triangle.
pub fn calc_brush_vertices(brush: &mut MapBrush, precision: f64) -> Result<()> {
    let planes = brush.planes();
    let corners = true_corners(&planes, precision);

    let mut triangles = Vec::with_capacity(planes.len());
    for (i, plane) in planes.iter().enumerate() {
        let on_plane: Vec<Vector3D> = corners
            .iter()
            .filter(|p| plane.distance(p).abs() <= precision)
            .copied()
            .collect();
        if on_plane.len() < 3 {
            return Err(GeometryError::no_valid_hull(format!(
                "plane {} has {} corners",
                i,
                on_plane.len()
            )));
        }
        let mut triangle = spread_triangle(&on_plane, precision)
            .ok_or_else(|| GeometryError::degenerate_cross(format!("plane {}", i)))?;
        let wound = Plane::from_triangle(&triangle)
            .ok_or_else(|| GeometryError::degenerate_cross(format!("plane {}", i)))?;
        if !wound.same_facing(plane) {
            triangle.swap(1, 2);
        }
        triangles.push(triangle);
    }

    for (side, triangle) in brush.sides_mut().iter_mut().zip(triangles) {
        side.set_triangle(triangle);
    }
    Ok(())
}

/// Indices of planes that do not bound the solid, ascending
///
/// A plane is unused when fewer than three true corners lie on it.
pub fn find_unused_planes(planes: &[Plane], precision: f64) -> Vec<usize> {
    let corners = true_corners(planes, precision);
    planes
        .iter()
        .enumerate()
        .filter(|(_, plane)| {
            corners
                .iter()
                .filter(|p| plane.distance(p).abs() <= precision)
                .count()
                < 3
        })
        .map(|(i, _)| i)
        .collect()
}

/// Remove unused planes from a brush
///
/// Refuses, leaving the brush as it is, when fewer than four sides would
/// remain.
///
/// # Returns
/// Number of sides removed
pub fn cull_unused_planes(brush: &mut MapBrush, precision: f64) -> Result<usize> {
    let unused = find_unused_planes(&brush.planes(), precision);
    let remaining = brush.num_sides() - unused.len();
    if remaining < 4 {
        return Err(GeometryError::NotEnoughSides(remaining));
    }
    for &i in unused.iter().rev() {
        brush.remove_side(i);
    }
    Ok(unused.len())
}
