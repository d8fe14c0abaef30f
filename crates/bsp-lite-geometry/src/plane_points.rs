// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synthetic points and texture axes for bare planes

use bsp_lite_model::{Plane, Vector3D};
use nalgebra::Vector3;

/// Three points on `plane`, wound so their normal matches the plane's
///
/// The coordinate with the largest normal coefficient is solved for; the
/// other two are set to `0` or `coef`. Returns `None` for a zero normal.
pub fn generate_plane_points(plane: &Plane, coef: f64) -> Option<[Vector3D; 3]> {
    let n: Vector3<f64> = plane.normal.0;
    // dependent axis
    let k = n.iamax();
    if n[k].abs() < bsp_lite_model::DEGENERATE_EPSILON {
        return None;
    }
    let i = (k + 1) % 3;
    let j = (k + 2) % 3;
    let d = plane.dist;

    let point = |ui: f64, uj: f64| {
        let mut p = [0.0; 3];
        p[i] = ui;
        p[j] = uj;
        p[k] = (d - n[i] * ui - n[j] * uj) / n[k];
        Vector3D::new(p[0], p[1], p[2])
    };
    let mut points = [point(0.0, 0.0), point(coef, 0.0), point(0.0, coef)];

    let generated = Plane::from_points(&points[0], &points[1], &points[2])?;
    if !generated.same_facing(plane) {
        points.swap(1, 2);
    }
    Some(points)
}

/// Quake base axes: face normal, then the U and V texture axes
const BASE_AXIS: [[[f64; 3]; 3]; 6] = [
    [[0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]],  // floor
    [[0.0, 0.0, -1.0], [1.0, 0.0, 0.0], [0.0, -1.0, 0.0]], // ceiling
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]],  // west wall
    [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]], // east wall
    [[0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]],  // south wall
    [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, -1.0]], // north wall
];

/// Default texture axes for a plane
///
/// Picks the base axis closest to the plane normal; ties go to the earlier
/// entry.
pub fn texture_axis_from_plane(plane: &Plane) -> (Vector3D, Vector3D) {
    let to_vec = |a: [f64; 3]| Vector3D::new(a[0], a[1], a[2]);
    let mut best = 0;
    let mut best_dot = f64::NEG_INFINITY;
    for (i, axes) in BASE_AXIS.iter().enumerate() {
        let dot = plane.normal.dot(&to_vec(axes[0]));
        if dot > best_dot {
            best_dot = dot;
            best = i;
        }
    }
    (to_vec(BASE_AXIS[best][1]), to_vec(BASE_AXIS[best][2]))
}
