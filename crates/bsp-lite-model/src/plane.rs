// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Half-space boundary plane: `normal · X = dist`

use crate::{snap_scalar, Vector3D};
use std::fmt;

/// Below this the cross product of two triangle edges is considered zero
pub const DEGENERATE_EPSILON: f64 = 1e-9;

/// Below this three normals are considered linearly dependent
pub const DETERMINANT_EPSILON: f64 = 1e-6;

/// Plane with a (near) unit normal and signed distance from the origin
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Plane {
    pub normal: Vector3D,
    pub dist: f64,
}

impl Plane {
    pub const fn new(normal: Vector3D, dist: f64) -> Self {
        Self { normal, dist }
    }

    /// Placeholder used when a side's plane reference cannot be resolved
    pub fn degenerate() -> Self {
        Self::new(Vector3D::new(0.0, 0.0, 1.0), 0.0)
    }

    /// Plane through three points
    ///
    /// The normal is `normalize((a - c) × (a - b))`, so the triangle
    /// `a, b, c` appears clockwise when seen from the front.
    ///
    /// # Returns
    /// `None` if the points are collinear or coincident
    pub fn from_points(a: &Vector3D, b: &Vector3D, c: &Vector3D) -> Option<Self> {
        let cross = (*a - *c).cross(&(*a - *b));
        if cross.length() <= DEGENERATE_EPSILON {
            return None;
        }
        let normal = cross.normalized()?;
        Some(Self::new(normal, a.dot(&normal)))
    }

    /// Plane through a triangle given as an array
    pub fn from_triangle(triangle: &[Vector3D; 3]) -> Option<Self> {
        Self::from_points(&triangle[0], &triangle[1], &triangle[2])
    }

    /// Plane with near-integer normal components and distance rounded
    pub fn snapped(&self, precision: f64) -> Self {
        Self::new(self.normal.snapped(precision), snap_scalar(self.dist, precision))
    }

    /// Signed perpendicular distance of `point`, positive in front
    pub fn distance(&self, point: &Vector3D) -> f64 {
        let len = self.normal.length();
        if len <= f64::EPSILON {
            return 0.0;
        }
        (self.normal.dot(point) - self.dist) / len
    }

    /// Intersection point of three planes (Cramer's rule)
    ///
    /// # Returns
    /// `None` when the normals are linearly dependent
    pub fn trisect(&self, p2: &Plane, p3: &Plane) -> Option<Vector3D> {
        let n2x3 = p2.normal.cross(&p3.normal);
        let det = self.normal.dot(&n2x3);
        if det.abs() <= DETERMINANT_EPSILON {
            return None;
        }
        let n3x1 = p3.normal.cross(&self.normal);
        let n1x2 = self.normal.cross(&p2.normal);
        Some((n2x3 * self.dist + n3x1 * p2.dist + n1x2 * p3.dist) / det)
    }

    /// Same plane facing the other way
    pub fn flipped(&self) -> Plane {
        Plane::new(-self.normal, -self.dist)
    }

    /// Flip in place
    pub fn flip(&mut self) {
        *self = self.flipped();
    }

    /// Translate the plane by `offset`
    pub fn translated(&self, offset: &Vector3D) -> Plane {
        Plane::new(self.normal, self.dist + self.normal.dot(offset))
    }

    /// Parallel, same-facing and at the same distance, within `precision`
    pub fn approx_eq(&self, other: &Plane, precision: f64) -> bool {
        let (Some(a), Some(b)) = (self.normal.normalized(), other.normal.normalized()) else {
            return false;
        };
        let scale_a = self.normal.length();
        let scale_b = other.normal.length();
        a.approx_eq(&b, precision) && (self.dist / scale_a - other.dist / scale_b).abs() <= precision
    }

    /// Whether the plane faces roughly the same way as `other`
    pub fn same_facing(&self, other: &Plane) -> bool {
        self.normal.dot(&other.normal) > 0.0
    }

    /// Plane coefficients `(a, b, c, d)` of `ax + by + cz = d`
    pub fn coefficients(&self) -> (f64, f64, f64, f64) {
        (self.normal.x(), self.normal.y(), self.normal.z(), self.dist)
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::degenerate()
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", self.normal, self.dist)
    }
}
