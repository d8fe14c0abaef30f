// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decompiler settings
//!
//! One immutable value per job. Every stage receives it by reference; nothing
//! reads configuration from global state.

use crate::{DecompileError, Result, DEFAULT_PRECISION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default scale for synthesized plane points
pub const DEFAULT_PLANE_POINT_COEF: f64 = 100.0;

/// Default largest input accepted, in bytes
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1 << 31;

/// Settings for one decompile job
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecompilerSettings {
    /// Geometric tolerance for equality and on-plane tests
    pub precision: f64,
    /// Scale applied to points synthesized from plane equations
    pub plane_point_coef: f64,
    /// Leave side orientation as compiled
    pub skip_plane_flip: bool,
    /// Recompute side triangles from true brush corners after correction
    pub calc_vertices: bool,
    /// Do not mark brushes as detail
    pub no_detail: bool,
    /// Do not mark brushes as water
    pub no_water: bool,
    /// Write zero surface flags on every side
    pub no_face_flags: bool,
    /// Put every brush into the world entity
    pub world_brushes_only: bool,
    /// Drop planes that do not contribute a face
    pub cull_unused_planes: bool,
    /// Directory for raw dumps of lumps that failed to decode
    pub dump_bad_lumps: Option<PathBuf>,
    /// Inputs larger than this are rejected before reading
    pub max_file_size: u64,
}

impl Default for DecompilerSettings {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            plane_point_coef: DEFAULT_PLANE_POINT_COEF,
            skip_plane_flip: false,
            calc_vertices: true,
            no_detail: false,
            no_water: false,
            no_face_flags: false,
            world_brushes_only: false,
            cull_unused_planes: false,
            dump_bad_lumps: None,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DecompilerSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse settings from JSON; missing fields keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values no stage can work with
    pub fn validate(&self) -> Result<()> {
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(DecompileError::Settings(format!(
                "precision must be positive, got {}",
                self.precision
            )));
        }
        if !(self.plane_point_coef.is_finite() && self.plane_point_coef > 0.0) {
            return Err(DecompileError::Settings(format!(
                "plane_point_coef must be positive, got {}",
                self.plane_point_coef
            )));
        }
        Ok(())
    }

    /// Set the geometric tolerance
    pub fn with_precision(mut self, precision: f64) -> Self {
        self.precision = precision;
        self
    }

    /// Set the plane point coefficient
    pub fn with_plane_point_coef(mut self, coef: f64) -> Self {
        self.plane_point_coef = coef;
        self
    }

    /// Set whether orientation correction is skipped
    pub fn with_skip_plane_flip(mut self, enabled: bool) -> Self {
        self.skip_plane_flip = enabled;
        self
    }

    /// Set whether triangles are recomputed from brush corners
    pub fn with_calc_vertices(mut self, enabled: bool) -> Self {
        self.calc_vertices = enabled;
        self
    }

    /// Set whether unused planes are culled
    pub fn with_cull_unused_planes(mut self, enabled: bool) -> Self {
        self.cull_unused_planes = enabled;
        self
    }

    /// Set whether all brushes go to the world
    pub fn with_world_brushes_only(mut self, enabled: bool) -> Self {
        self.world_brushes_only = enabled;
        self
    }

    /// Set the dump directory for malformed lumps
    pub fn with_dump_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dump_bad_lumps = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings =
            DecompilerSettings::from_json_str(r#"{"precision": 0.01, "no_water": true}"#).unwrap();
        assert_eq!(settings.precision, 0.01);
        assert!(settings.no_water);
        assert_eq!(settings.plane_point_coef, DEFAULT_PLANE_POINT_COEF);
        assert!(settings.calc_vertices);
    }

    #[test]
    fn test_rejects_bad_precision() {
        assert!(matches!(
            DecompilerSettings::from_json_str(r#"{"precision": 0.0}"#),
            Err(DecompileError::Settings(_))
        ));
        assert!(DecompilerSettings::new().with_precision(-1.0).validate().is_err());
    }

    #[test]
    fn test_builder() {
        let settings = DecompilerSettings::new()
            .with_skip_plane_flip(true)
            .with_cull_unused_planes(true)
            .with_dump_dir("/tmp/lumps");
        assert!(settings.skip_plane_flip);
        assert!(settings.cull_unused_planes);
        assert_eq!(settings.dump_bad_lumps, Some(PathBuf::from("/tmp/lumps")));
    }
}
