// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangle selection from polygon vertices

use bsp_lite_model::{Plane, Vector3D};

/// Triangle from the vertices of a compiled face, keeping face winding
///
/// Vertex 0, then the first later vertex distinct from it, then the first
/// vertex after that whose cross product with the first two exceeds
/// `precision`.
pub fn triangle_from_face(vertices: &[Vector3D], precision: f64) -> Option<[Vector3D; 3]> {
    let a = *vertices.first()?;
    let (j, b) = vertices
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, v)| !v.approx_eq(&a, precision))?;
    let c = vertices[j + 1..].iter().find(|v| {
        !v.approx_eq(&a, precision)
            && !v.approx_eq(b, precision)
            && (*b - a).cross(&(**v - a)).length() > precision
    })?;
    Some([a, *b, *c])
}

/// Best-spread triangle from points on one plane
///
/// Takes the first point, the point farthest from it, and the point giving
/// the largest cross product with those two.
pub fn spread_triangle(points: &[Vector3D], precision: f64) -> Option<[Vector3D; 3]> {
    let a = *points.first()?;
    let b = *points
        .iter()
        .max_by(|p, q| (**p - a).length().total_cmp(&(**q - a).length()))?;
    if b.approx_eq(&a, precision) {
        return None;
    }
    let area = |p: &Vector3D| (b - a).cross(&(*p - a)).length();
    let c = *points.iter().max_by(|p, q| area(p).total_cmp(&area(q)))?;
    if area(&c) <= precision {
        return None;
    }
    Some([a, b, c])
}

/// Order a triangle so that `interior` lies behind its plane
pub fn wind_away_from(mut triangle: [Vector3D; 3], interior: &Vector3D) -> Option<[Vector3D; 3]> {
    let plane = Plane::from_triangle(&triangle)?;
    if plane.distance(interior) > 0.0 {
        triangle.swap(1, 2);
    }
    Some(triangle)
}
