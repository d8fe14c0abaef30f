// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-job decompile statistics

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Counters collected while decompiling one map
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompileStats {
    pub entities: usize,
    pub brushes: usize,
    pub sides: usize,
    /// Brushes oriented from a face-backed reference point
    pub simple_corrections: usize,
    /// Brushes oriented by hull reconstruction
    pub advanced_corrections: usize,
    /// Brushes left as compiled after correction failed
    pub failed_corrections: usize,
    /// Brushes whose corner recomputation failed
    pub vertex_failures: usize,
    pub culled_planes: usize,
    /// Lumps replaced by an empty list after a decode error
    pub skipped_lumps: usize,
    pub warnings: usize,
}

impl DecompileStats {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AddAssign<&DecompileStats> for DecompileStats {
    fn add_assign(&mut self, rhs: &DecompileStats) {
        self.entities += rhs.entities;
        self.brushes += rhs.brushes;
        self.sides += rhs.sides;
        self.simple_corrections += rhs.simple_corrections;
        self.advanced_corrections += rhs.advanced_corrections;
        self.failed_corrections += rhs.failed_corrections;
        self.vertex_failures += rhs.vertex_failures;
        self.culled_planes += rhs.culled_planes;
        self.skipped_lumps += rhs.skipped_lumps;
        self.warnings += rhs.warnings;
    }
}
