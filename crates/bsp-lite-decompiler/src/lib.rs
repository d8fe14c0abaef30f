// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! BSP-Lite Decompiler - From compiled maps back to editable brushes
//!
//! Ties the parser and the geometry crate together: detects the format,
//! decodes the lumps, resolves which brushes each entity owns, rebuilds every
//! brush side and orients the result.
//!
//! # Features
//!
//! - **Every supported BSP dialect** through one entry point
//! - **WAD maps** (Doom, Hexen) with an optional sector brush collaborator
//! - **Progress and message callbacks** per job
//! - **Batch jobs** on a bounded thread pool
//!
//! # Example
//!
//! ```ignore
//! use bsp_lite_decompiler::Decompiler;
//! use bsp_lite_model::DecompilerSettings;
//!
//! let decompiled = Decompiler::new(DecompilerSettings::default())
//!     .with_progress_callback(|f| println!("{:.0}%", f * 100.0))
//!     .decompile_file("maps/base1.bsp")?;
//! println!("{} brushes", decompiled.stats.brushes);
//! ```

pub mod batch;
pub mod doom;
pub mod job;
pub mod progress;
pub mod resolver;
pub mod sides;
pub mod writer;

pub use batch::BatchDecompiler;
pub use doom::{decompile_doom, thing_entity, SectorBrushBuilder, THING_CLASSNAME};
pub use job::{DecompileJob, JobOutput, AREAPORTAL_CLASSNAME};
pub use progress::{MessageSink, Progress, PROGRESS_STEP};
pub use resolver::{BitSet, BrushResolver, ResolveStrategy};
pub use sides::{BrushRef, SideBuilder};
pub use writer::write_with_all;

use bsp_lite_model::{
    DecompileError, DecompileStats, DecompilerSettings, Entities, FormatVersion, MessageCallback,
    ProgressCallback, Result,
};
use bsp_lite_parser::{detect, find_maps, BspReader, Detection, DoomMap, LumpDirectory};
use serde::Serialize;
use std::path::Path;

/// Result of decompiling one map
#[derive(Clone, Debug)]
pub struct Decompiled {
    pub entities: Entities,
    pub stats: DecompileStats,
    pub version: FormatVersion,
    /// Map name inside a WAD
    pub map_name: Option<String>,
}

#[derive(Serialize)]
struct Report<'a> {
    version: &'a str,
    map: Option<&'a str>,
    stats: &'a DecompileStats,
}

impl Decompiled {
    /// Version and statistics as JSON
    pub fn report_json(&self) -> Result<String> {
        let report = Report {
            version: self.version.name(),
            map: self.map_name.as_deref(),
            stats: &self.stats,
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

/// Decompiles map files with fixed settings
pub struct Decompiler {
    settings: DecompilerSettings,
    progress: Option<ProgressCallback>,
    messages: Option<MessageCallback>,
    sector_builder: Option<Box<dyn SectorBrushBuilder>>,
}

impl Decompiler {
    pub fn new(settings: DecompilerSettings) -> Self {
        Self {
            settings,
            progress: None,
            messages: None,
            sector_builder: None,
        }
    }

    /// Report the completed fraction of each job
    pub fn with_progress_callback(mut self, callback: impl Fn(f64) + Send + 'static) -> Self {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Receive every recoverable diagnostic
    pub fn with_message_callback(mut self, callback: impl Fn(&str) + Send + 'static) -> Self {
        self.messages = Some(Box::new(callback));
        self
    }

    /// Build sector brushes for WAD maps
    pub fn with_sector_builder(mut self, builder: impl SectorBrushBuilder + 'static) -> Self {
        self.sector_builder = Some(Box::new(builder));
        self
    }

    pub fn settings(&self) -> &DecompilerSettings {
        &self.settings
    }

    /// Decompile a map held in memory
    ///
    /// For a WAD container the first map is returned.
    pub fn decompile(&self, data: &[u8]) -> Result<Decompiled> {
        self.decompile_named(data, "")
    }

    /// Decompile a map file
    pub fn decompile_file(&self, path: impl AsRef<Path>) -> Result<Decompiled> {
        let path = path.as_ref();
        let size = std::fs::metadata(path)?.len();
        self.check_size(size)?;
        let data = std::fs::read(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::info!("Decompiling {} ({} bytes)", path.display(), size);
        self.decompile_named(&data, &name)
    }

    /// Decompile every map of a file: one for a BSP, one per map for a WAD
    pub fn decompile_maps(&self, data: &[u8]) -> Result<Vec<Decompiled>> {
        self.settings.validate()?;
        self.check_size(data.len() as u64)?;
        let detection = detect(data)?;
        if is_wad(&detection) {
            self.decompile_wad(data, &detection, usize::MAX)
        } else {
            Ok(vec![self.decompile_bsp(data, &detection, "")?])
        }
    }

    fn decompile_named(&self, data: &[u8], name: &str) -> Result<Decompiled> {
        self.settings.validate()?;
        self.check_size(data.len() as u64)?;
        let detection = detect(data)?;
        if is_wad(&detection) {
            return self
                .decompile_wad(data, &detection, 1)?
                .into_iter()
                .next()
                .ok_or_else(|| DecompileError::unknown_format("WAD container holds no maps"));
        }
        self.decompile_bsp(data, &detection, name)
    }

    fn decompile_bsp(&self, data: &[u8], detection: &Detection, name: &str) -> Result<Decompiled> {
        let mut file = BspReader::new()
            .with_dump_dir(self.settings.dump_bad_lumps.clone())
            .with_name(name)
            .read_detected(data, detection)?;
        file.snap(self.settings.precision);
        log::debug!("{:?}", file.summary().counts);

        let out = DecompileJob::new(
            &file,
            &self.settings,
            self.progress.as_deref(),
            self.messages.as_deref(),
        )
        .run()?;
        Ok(Decompiled {
            entities: out.entities,
            stats: out.stats,
            version: file.version,
            map_name: None,
        })
    }

    fn decompile_wad(&self, data: &[u8], detection: &Detection, limit: usize) -> Result<Vec<Decompiled>> {
        let directory = LumpDirectory::read(data, detection.version, detection.byte_order)?;
        let maps = find_maps(&directory);
        log::info!("WAD directory: {} lumps, {} maps", directory.len(), maps.len());

        maps.iter()
            .take(limit)
            .map(|map| {
                let doom = DoomMap::read(data, &directory, map, detection.byte_order)?;
                let out = decompile_doom(
                    &doom,
                    &self.settings,
                    self.sector_builder.as_deref(),
                    self.progress.as_deref(),
                    self.messages.as_deref(),
                );
                Ok(Decompiled {
                    entities: out.entities,
                    stats: out.stats,
                    version: map.format,
                    map_name: Some(map.name.clone()),
                })
            })
            .collect()
    }

    fn check_size(&self, size: u64) -> Result<()> {
        if size > self.settings.max_file_size {
            return Err(DecompileError::resource_exhausted(format!(
                "{} bytes exceeds the {} byte limit",
                size, self.settings.max_file_size
            )));
        }
        Ok(())
    }
}

fn is_wad(detection: &Detection) -> bool {
    matches!(detection.version, FormatVersion::Doom | FormatVersion::Hexen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_limit() {
        let settings = DecompilerSettings {
            max_file_size: 16,
            ..DecompilerSettings::default()
        };
        let err = Decompiler::new(settings).decompile(&[0u8; 64]).unwrap_err();
        assert!(matches!(err, DecompileError::ResourceExhausted(_)));
    }

    #[test]
    fn test_unknown_format() {
        let err = Decompiler::new(DecompilerSettings::default())
            .decompile(b"NOTABSPFILE.....")
            .unwrap_err();
        assert!(matches!(err, DecompileError::UnknownFormat(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Decompiler::new(DecompilerSettings::default())
            .decompile_file("/nonexistent/dir/map.bsp")
            .unwrap_err();
        assert!(matches!(err, DecompileError::Io(_)));
    }

    #[test]
    fn test_report_json() {
        let decompiled = Decompiled {
            entities: Entities::new(),
            stats: DecompileStats {
                brushes: 4,
                ..DecompileStats::default()
            },
            version: FormatVersion::Quake2,
            map_name: None,
        };
        let json = decompiled.report_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["stats"]["brushes"], 4);
        assert!(value["map"].is_null());
    }
}
