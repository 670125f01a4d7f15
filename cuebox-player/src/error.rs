//! Error types for cuebox-player
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Construction-time errors (`Config`, `TimeFormat`) fail
//! fast; session-time errors (`NoDirectory`, `FileNotFound`,
//! `EngineStart`, `Cancelled`) are caught inside the session task and
//! funnel into its single cleanup path.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cuebox-player
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed "H:M:S" time string in a track configuration
    #[error("Time format error: {0}")]
    TimeFormat(#[from] cuebox_common::time::TimeFormatError),

    /// Out-of-range group or track-list index passed to a play request
    #[error("Index out of range: {kind} index {index} (have {len})")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// No directory configured at any level for a track list
    #[error("No directory configured for track list '{track_list}' in group '{group}' at any level")]
    NoDirectory { group: String, track_list: String },

    /// Resolved track path does not exist on disk
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Media engine refused to create a player or begin playback
    #[error("Engine start error: {0}")]
    EngineStart(String),

    /// Cooperative stop request observed at a suspension point
    #[error("Playback cancelled")]
    Cancelled,

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using cuebox-player Error
pub type Result<T> = std::result::Result<T, Error>;
