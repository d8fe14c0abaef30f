// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # BSP-Lite Geometry
//!
//! Brush reconstruction for decompiled maps. Compiled brushes are lists of
//! planes whose facing is not always trustworthy; this crate turns them into
//! consistently oriented editor brushes.
//!
//! ## Overview
//!
//! - **Plane Points**: three points and default texture axes for a bare plane
//! - **Correction**: orient sides against face-backed sides, or rebuild a
//!   brush from planes alone through a hull search
//! - **Vertices**: recompute side triangles from true brush corners and cull
//!   planes that do not bound the solid
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bsp_lite_geometry::{calc_brush_vertices, correct_brush};
//!
//! let outcome = correct_brush(&mut brush, settings.precision, settings.skip_plane_flip)?;
//! calc_brush_vertices(&mut brush, settings.precision)?;
//! ```

pub mod correction;
pub mod error;
pub mod hull;
pub mod plane_points;
pub mod triangle;
pub mod vertices;

pub use correction::{advanced_correct, correct_brush, simple_correct, Correction, SideEvidence};
pub use error::{GeometryError, Result, MAX_HULL_PLANES};
pub use hull::{candidate_corners, find_hull, Hull, HullVertex};
pub use plane_points::{generate_plane_points, texture_axis_from_plane};
pub use triangle::{spread_triangle, triangle_from_face, wind_away_from};
pub use vertices::{calc_brush_vertices, cull_unused_planes, find_unused_planes, true_corners};
