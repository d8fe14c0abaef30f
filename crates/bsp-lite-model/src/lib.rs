// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BSP-Lite Model - Shared types for BSP decompilation
//!
//! This crate provides the types every other BSP-Lite crate speaks: the
//! tolerant geometry primitives, the reconstructed brush and entity model,
//! the catalogue of supported format versions and the immutable job
//! settings.
//!
//! # Architecture
//!
//! - [`Vector3D`] / [`Plane`] - tolerance-aware geometry primitives
//! - [`MapBrushSide`] / [`MapBrush`] - reconstructed convex solids
//! - [`Entity`] / [`Entities`] - decompiled map contents, world first
//! - [`FormatVersion`] / [`EngineFamily`] - detected file dialect
//! - [`DecompilerSettings`] - explicit per-job configuration
//! - [`MapWriter`] - interface for editor format writers
//!
//! # Example
//!
//! ```ignore
//! use bsp_lite_model::{Plane, Vector3D};
//!
//! let floor = Plane::new(Vector3D::new(0.0, 0.0, 1.0), 0.0);
//! let wall = Plane::new(Vector3D::new(1.0, 0.0, 0.0), 64.0);
//! let side = Plane::new(Vector3D::new(0.0, 1.0, 0.0), 32.0);
//! let corner = floor.trisect(&wall, &side);
//! ```

pub mod brush;
pub mod contents;
pub mod entity;
pub mod error;
pub mod format;
pub mod plane;
pub mod settings;
pub mod stats;
pub mod traits;
pub mod vector;

// Re-export all public types
pub use brush::*;
pub use contents::*;
pub use entity::*;
pub use error::*;
pub use format::*;
pub use plane::*;
pub use settings::*;
pub use stats::*;
pub use traits::*;
pub use vector::*;
