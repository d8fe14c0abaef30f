// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback types and collaborator traits

use crate::{Entities, Result};

/// Progress callback receiving the completed fraction in `[0.0, 1.0]`
pub type ProgressCallback = Box<dyn Fn(f64) + Send>;

/// Callback receiving every recoverable diagnostic of a job
pub type MessageCallback = Box<dyn Fn(&str) + Send>;

/// Output writer for one editor format
///
/// Writers take ownership of their copy of the entities; they are free to
/// rename classnames or rewrite attributes for their target engine.
///
/// # Example
///
/// ```ignore
/// struct VmfWriter { out: std::fs::File }
///
/// impl MapWriter for VmfWriter {
///     fn name(&self) -> &str { "vmf" }
///     fn write(&mut self, entities: Entities) -> Result<()> {
///         // serialize...
///         Ok(())
///     }
/// }
/// ```
pub trait MapWriter: Send {
    /// Short format identifier used in log messages
    fn name(&self) -> &str;

    /// Write the decompiled map
    fn write(&mut self, entities: Entities) -> Result<()>;
}
