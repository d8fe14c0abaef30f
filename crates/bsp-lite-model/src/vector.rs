// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Three-component double precision vector
//!
//! `Vector3D` wraps `nalgebra::Vector3<f64>` and adds the tolerance-aware
//! helpers the reconstruction code relies on. Exact `PartialEq` is kept for
//! tests and hashing-free lookups; geometric comparisons go through
//! [`Vector3D::approx_eq`] with an explicit precision.

use approx::AbsDiffEq;
use nalgebra::Vector3;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Index, Mul, Neg, Sub, SubAssign};

/// Default geometric tolerance used when no settings are at hand
pub const DEFAULT_PRECISION: f64 = 0.05;

/// A point or direction in map space
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub struct Vector3D(pub Vector3<f64>);

impl Vector3D {
    /// Origin
    pub const ZERO: Vector3D = Vector3D(Vector3::new(0.0, 0.0, 0.0));

    /// Create a vector from components
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vector3D(Vector3::new(x, y, z))
    }

    /// Build from single precision components
    #[inline]
    pub fn from_f32(v: [f32; 3]) -> Self {
        Self::new(v[0] as f64, v[1] as f64, v[2] as f64)
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.0.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.0.z
    }

    /// Components as an array
    #[inline]
    pub fn to_array(&self) -> [f64; 3] {
        [self.0.x, self.0.y, self.0.z]
    }

    #[inline]
    pub fn dot(&self, other: &Vector3D) -> f64 {
        self.0.dot(&other.0)
    }

    #[inline]
    pub fn cross(&self, other: &Vector3D) -> Vector3D {
        Vector3D(self.0.cross(&other.0))
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.0.norm()
    }

    /// Unit vector in the same direction, or `None` for a zero vector
    pub fn normalized(&self) -> Option<Vector3D> {
        let len = self.length();
        if len <= f64::EPSILON {
            None
        } else {
            Some(Vector3D(self.0 / len))
        }
    }

    /// Round every component that lies within `precision` of an integer
    ///
    /// Compiled maps store single precision floats, so a coordinate written
    /// as `64` frequently comes back as `63.99998`.
    pub fn snapped(&self, precision: f64) -> Vector3D {
        Vector3D(self.0.map(|c| snap_scalar(c, precision)))
    }

    /// Per-axis tolerant equality
    pub fn approx_eq(&self, other: &Vector3D, precision: f64) -> bool {
        (self.0.x - other.0.x).abs() <= precision
            && (self.0.y - other.0.y).abs() <= precision
            && (self.0.z - other.0.z).abs() <= precision
    }

    /// Whether all components are within `precision` of zero
    pub fn is_zero(&self, precision: f64) -> bool {
        self.approx_eq(&Vector3D::ZERO, precision)
    }

    /// Average of a set of points
    pub fn centroid(points: &[Vector3D]) -> Option<Vector3D> {
        if points.is_empty() {
            return None;
        }
        let sum = points.iter().fold(Vector3::zeros(), |acc, p| acc + p.0);
        Some(Vector3D(sum / points.len() as f64))
    }
}

/// Round `value` when it lies within `precision` of an integer
#[inline]
pub fn snap_scalar(value: f64, precision: f64) -> f64 {
    let rounded = value.round();
    if (value - rounded).abs() < precision {
        rounded
    } else {
        value
    }
}

impl From<Vector3<f64>> for Vector3D {
    fn from(v: Vector3<f64>) -> Self {
        Vector3D(v)
    }
}

impl From<[f64; 3]> for Vector3D {
    fn from(v: [f64; 3]) -> Self {
        Vector3D::new(v[0], v[1], v[2])
    }
}

impl Add for Vector3D {
    type Output = Vector3D;
    fn add(self, rhs: Vector3D) -> Vector3D {
        Vector3D(self.0 + rhs.0)
    }
}

impl AddAssign for Vector3D {
    fn add_assign(&mut self, rhs: Vector3D) {
        self.0 += rhs.0;
    }
}

impl Sub for Vector3D {
    type Output = Vector3D;
    fn sub(self, rhs: Vector3D) -> Vector3D {
        Vector3D(self.0 - rhs.0)
    }
}

impl SubAssign for Vector3D {
    fn sub_assign(&mut self, rhs: Vector3D) {
        self.0 -= rhs.0;
    }
}

impl Neg for Vector3D {
    type Output = Vector3D;
    fn neg(self) -> Vector3D {
        Vector3D(-self.0)
    }
}

impl Mul<f64> for Vector3D {
    type Output = Vector3D;
    fn mul(self, rhs: f64) -> Vector3D {
        Vector3D(self.0 * rhs)
    }
}

impl Div<f64> for Vector3D {
    type Output = Vector3D;
    fn div(self, rhs: f64) -> Vector3D {
        Vector3D(self.0 / rhs)
    }
}

impl Index<usize> for Vector3D {
    type Output = f64;
    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl AbsDiffEq for Vector3D {
    type Epsilon = f64;

    fn default_epsilon() -> f64 {
        DEFAULT_PRECISION
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.approx_eq(other, epsilon)
    }
}

/// Formats like a map file coordinate triple: `x y z`
impl fmt::Display for Vector3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.0.x, self.0.y, self.0.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_snapping_rounds_near_integers() {
        let v = Vector3D::new(63.99998, -0.00001, 12.5).snapped(0.001);
        assert_eq!(v, Vector3D::new(64.0, 0.0, 12.5));
    }

    #[test]
    fn test_tolerant_equality() {
        let a = Vector3D::new(1.0, 2.0, 3.0);
        let b = Vector3D::new(1.01, 1.99, 3.0);
        assert!(a.approx_eq(&b, 0.05));
        assert!(!a.approx_eq(&b, 0.001));
        assert_abs_diff_eq!(a, b, epsilon = 0.05);
    }

    #[test]
    fn test_cross_and_dot() {
        let x = Vector3D::new(1.0, 0.0, 0.0);
        let y = Vector3D::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(&y), Vector3D::new(0.0, 0.0, 1.0));
        assert_eq!(x.dot(&y), 0.0);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert!(Vector3D::ZERO.normalized().is_none());
        let n = Vector3D::new(0.0, 3.0, 4.0).normalized().unwrap();
        assert_abs_diff_eq!(n.length(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_centroid() {
        let c = Vector3D::centroid(&[
            Vector3D::new(0.0, 0.0, 0.0),
            Vector3D::new(2.0, 0.0, 0.0),
            Vector3D::new(0.0, 2.0, 2.0),
            Vector3D::new(2.0, 2.0, 2.0),
        ])
        .unwrap();
        assert_eq!(c, Vector3D::new(1.0, 1.0, 1.0));
        assert!(Vector3D::centroid(&[]).is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(Vector3D::new(1.0, -2.5, 0.0).to_string(), "1 -2.5 0");
    }
}
