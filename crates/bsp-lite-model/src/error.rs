// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for BSP decoding and decompilation

use thiserror::Error;

/// Result type alias for decompiler operations
pub type Result<T> = std::result::Result<T, DecompileError>;

/// Errors that can occur while reading or decompiling a map
///
/// Variants map onto the recovery policy of a job: `Io`, `UnknownFormat` and
/// `ResourceExhausted` abort the job, everything else is caught at the lump,
/// side or brush level and turned into a logged message.
#[derive(Error, Debug)]
pub enum DecompileError {
    /// Magic/version combination not recognised
    #[error("Unrecognized map format: {0}")]
    UnknownFormat(String),

    /// Lump bytes that cannot be decoded with the selected layout
    #[error("Malformed lump {lump}: {message}")]
    MalformedLump { lump: String, message: String },

    /// No layout is known for a record kind in this format version
    #[error("No {kind} record layout for {version}")]
    UnsupportedRecord { kind: String, version: String },

    /// Index pointing outside of the referenced lump
    #[error("Missing reference: {0}")]
    MissingReference(String),

    /// Brush geometry could not be reconstructed
    #[error("Geometry error in entity {entity} brush {brush}: {message}")]
    Geometry {
        entity: usize,
        brush: usize,
        message: String,
    },

    /// Input too large to be held in memory
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Invalid decompiler settings
    #[error("Invalid settings: {0}")]
    Settings(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings file could not be deserialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl DecompileError {
    /// Create an unknown format error
    pub fn unknown_format(msg: impl Into<String>) -> Self {
        DecompileError::UnknownFormat(msg.into())
    }

    /// Create a malformed lump error
    pub fn malformed(lump: impl Into<String>, msg: impl Into<String>) -> Self {
        DecompileError::MalformedLump {
            lump: lump.into(),
            message: msg.into(),
        }
    }

    /// Create an unsupported record error
    pub fn unsupported_record(kind: impl Into<String>, version: impl Into<String>) -> Self {
        DecompileError::UnsupportedRecord {
            kind: kind.into(),
            version: version.into(),
        }
    }

    /// Create a missing reference error
    pub fn missing_reference(msg: impl Into<String>) -> Self {
        DecompileError::MissingReference(msg.into())
    }

    /// Create a geometry error naming the offending brush
    pub fn geometry(entity: usize, brush: usize, msg: impl Into<String>) -> Self {
        DecompileError::Geometry {
            entity,
            brush,
            message: msg.into(),
        }
    }

    /// Create a resource exhaustion error
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        DecompileError::ResourceExhausted(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        DecompileError::Other(msg.into())
    }

    /// Whether the job can continue after this error
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            DecompileError::Io(_)
                | DecompileError::UnknownFormat(_)
                | DecompileError::ResourceExhausted(_)
                | DecompileError::Settings(_)
                | DecompileError::Json(_)
        )
    }
}
