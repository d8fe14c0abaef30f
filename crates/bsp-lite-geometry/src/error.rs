// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for brush reconstruction

use bsp_lite_model::DecompileError;
use thiserror::Error;

/// Geometry result type
pub type Result<T> = std::result::Result<T, GeometryError>;

/// Brush reconstruction errors
///
/// All of these are recoverable per brush: the brush is emitted uncorrected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The cavity search encodes one bit per plane in a `u64`
    #[error("Too many planes for hull search: {0} (limit {limit})", limit = MAX_HULL_PLANES)]
    TooManyPlanes(usize),

    /// No sign assignment yields a closed polyhedron
    #[error("No valid hull: {0}")]
    NoValidHull(String),

    /// Three points or planes do not span a triangle
    #[error("Degenerate cross product: {0}")]
    DegenerateCross(String),

    /// A solid needs at least four sides
    #[error("Not enough sides: {0}")]
    NotEnoughSides(usize),
}

/// Largest plane count accepted by the hull search
pub const MAX_HULL_PLANES: usize = 62;

impl GeometryError {
    /// Create a no valid hull error
    pub fn no_valid_hull(msg: impl Into<String>) -> Self {
        GeometryError::NoValidHull(msg.into())
    }

    /// Create a degenerate cross product error
    pub fn degenerate_cross(msg: impl Into<String>) -> Self {
        GeometryError::DegenerateCross(msg.into())
    }

    /// Attach the owning entity and brush
    pub fn into_decompile_error(self, entity: usize, brush: usize) -> DecompileError {
        DecompileError::geometry(entity, brush, self.to_string())
    }
}

impl From<GeometryError> for DecompileError {
    fn from(e: GeometryError) -> Self {
        DecompileError::other(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            GeometryError::TooManyPlanes(70).to_string(),
            "Too many planes for hull search: 70 (limit 62)"
        );
        let e = GeometryError::no_valid_hull("6 planes").into_decompile_error(2, 9);
        assert!(matches!(e, DecompileError::Geometry { entity: 2, brush: 9, .. }));
        assert!(e.is_recoverable());
    }
}
