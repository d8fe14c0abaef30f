// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hull reconstruction from bare planes
//!
//! A brush whose sides carry no face evidence is only a list of planes of
//! unknown facing. Every triple of planes is intersected; each candidate
//! corner is classified against every plane as on, in front or behind. A
//! "cavity" is a set of planes to flip (one bit per plane): a corner belongs
//! to the cavity if, after flipping, it is behind or on every plane. The
//! accepted cavity is the first one, in ascending mask order, where every
//! plane touches at least three member corners and there are at least as
//! many corners as planes.

use crate::error::{GeometryError, Result, MAX_HULL_PLANES};
use bsp_lite_model::{Plane, Vector3D};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Seeds touching more planes than this only contribute their two extreme
/// masks instead of every on-plane subset
const MAX_ON_PLANE_SUBSET_BITS: u32 = 16;

/// Candidate corner classified against a plane set
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HullVertex {
    pub point: Vector3D,
    /// Planes the point lies on
    pub on: u64,
    /// Planes the point lies in front of
    pub pos: u64,
    /// Planes the point lies behind
    pub neg: u64,
}

impl HullVertex {
    /// Classify `point` against up to 64 planes
    pub fn classify(point: Vector3D, planes: &[Plane], precision: f64) -> Self {
        let mut v = Self {
            point,
            on: 0,
            pos: 0,
            neg: 0,
        };
        for (i, plane) in planes.iter().enumerate().take(64) {
            let d = plane.distance(&point);
            let bit = 1u64 << i;
            if d.abs() <= precision {
                v.on |= bit;
            } else if d > 0.0 {
                v.pos |= bit;
            } else {
                v.neg |= bit;
            }
        }
        v
    }

    /// Inside or on every plane once the planes in `flip` are reversed
    #[inline]
    pub fn consistent(&self, flip: u64) -> bool {
        self.pos & !flip == 0 && self.neg & flip == 0
    }

    #[inline]
    pub fn is_on(&self, plane: usize) -> bool {
        self.on & (1u64 << plane) != 0
    }
}

/// Accepted hull
#[derive(Clone, Debug)]
pub struct Hull {
    /// Planes that must be flipped to face outwards
    pub flip: u64,
    /// Member corners
    pub vertices: Vec<HullVertex>,
    /// Average of the member corners
    pub centroid: Vector3D,
}

impl Hull {
    /// Whether plane `i` has to be reversed
    pub fn is_flipped(&self, plane: usize) -> bool {
        self.flip & (1u64 << plane) != 0
    }

    /// Member corners lying on plane `i`
    pub fn corners_on(&self, plane: usize) -> impl Iterator<Item = Vector3D> + '_ {
        self.vertices
            .iter()
            .filter(move |v| v.is_on(plane))
            .map(|v| v.point)
    }
}

// ============================================================================
// Candidate Corners
// ============================================================================

type CellKey = [i64; 3];

/// Spatial dedupe of nearly equal points
struct PointSet {
    cell: f64,
    precision: f64,
    grid: FxHashMap<CellKey, SmallVec<[usize; 2]>>,
    points: Vec<Vector3D>,
}

impl PointSet {
    fn new(precision: f64) -> Self {
        Self {
            cell: precision.max(f64::EPSILON) * 2.0,
            precision,
            grid: FxHashMap::default(),
            points: Vec::new(),
        }
    }

    fn key(&self, p: &Vector3D) -> CellKey {
        [
            (p.x() / self.cell).floor() as i64,
            (p.y() / self.cell).floor() as i64,
            (p.z() / self.cell).floor() as i64,
        ]
    }

    /// Insert unless an equal point is already present
    fn insert(&mut self, p: Vector3D) -> bool {
        let [kx, ky, kz] = self.key(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(bucket) = self.grid.get(&[kx + dx, ky + dy, kz + dz]) {
                        if bucket
                            .iter()
                            .any(|&i| self.points[i].approx_eq(&p, self.precision))
                        {
                            return false;
                        }
                    }
                }
            }
        }
        self.grid.entry([kx, ky, kz]).or_default().push(self.points.len());
        self.points.push(p);
        true
    }
}

/// Distinct intersection points of every triple of planes
///
/// Parallel triples are skipped.
pub fn candidate_corners(planes: &[Plane], precision: f64) -> Vec<Vector3D> {
    let mut set = PointSet::new(precision);
    let n = planes.len();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                if let Some(p) = planes[i].trisect(&planes[j], &planes[k]) {
                    set.insert(p);
                }
            }
        }
    }
    set.points
}

// ============================================================================
// Cavity Search
// ============================================================================

/// Find the hull bounded by `planes`, whatever their stored facing
pub fn find_hull(planes: &[Plane], precision: f64) -> Result<Hull> {
    let n = planes.len();
    if n > MAX_HULL_PLANES {
        return Err(GeometryError::TooManyPlanes(n));
    }
    if n < 4 {
        return Err(GeometryError::NotEnoughSides(n));
    }

    let vertices: Vec<HullVertex> = candidate_corners(planes, precision)
        .into_iter()
        .map(|p| HullVertex::classify(p, planes, precision))
        .collect();

    // A member corner has pos ⊆ flip ⊆ pos | on, so every cavity that can
    // be accepted is induced by one of its own corners.
    let mut masks: Vec<u64> = Vec::new();
    for v in &vertices {
        if v.on.count_ones() > MAX_ON_PLANE_SUBSET_BITS {
            masks.push(v.pos);
            masks.push(v.pos | v.on);
            continue;
        }
        let mut subset = 0u64;
        loop {
            masks.push(v.pos | subset);
            subset = subset.wrapping_sub(v.on) & v.on;
            if subset == 0 {
                break;
            }
        }
    }
    masks.sort_unstable();
    masks.dedup();
    log::trace!(
        "Hull search: {} planes, {} corners, {} cavities",
        n,
        vertices.len(),
        masks.len()
    );

    let mut on_counts = vec![0usize; n];
    for &flip in &masks {
        let members: Vec<&HullVertex> = vertices.iter().filter(|v| v.consistent(flip)).collect();
        if members.len() < n {
            continue;
        }
        on_counts.iter_mut().for_each(|c| *c = 0);
        for v in &members {
            for (i, count) in on_counts.iter_mut().enumerate() {
                if v.is_on(i) {
                    *count += 1;
                }
            }
        }
        if on_counts.iter().all(|&c| c >= 3) {
            let vertices: Vec<HullVertex> = members.into_iter().copied().collect();
            let points: Vec<Vector3D> = vertices.iter().map(|v| v.point).collect();
            let centroid = Vector3D::centroid(&points)
                .ok_or_else(|| GeometryError::no_valid_hull("empty cavity"))?;
            return Ok(Hull {
                flip,
                vertices,
                centroid,
            });
        }
    }

    Err(GeometryError::no_valid_hull(format!(
        "{} planes, {} candidate corners, {} cavities tried",
        n,
        vertices.len(),
        masks.len()
    )))
}
