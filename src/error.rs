//! Error types for the instrument core.
//!
//! Every variant is recoverable at the user-interaction level: the front end
//! turns it into a status message and keeps running.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by synthesis, playback, recording and export.
#[derive(Debug, Error)]
pub enum InstrumentError {
    /// A trigger carried a frequency that is not strictly positive.
    #[error("invalid frequency: {frequency} Hz")]
    InvalidFrequency { frequency: f64 },

    /// A trigger named a symbol that is not in the note table.
    #[error("element {0} not found in frequencies")]
    UnknownSymbol(String),

    /// The same symbol appeared twice while building a note table.
    #[error("duplicate element symbol: {0}")]
    DuplicateSymbol(String),

    /// Configuration or synthesis parameters are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The output device could not be opened or refused a voice.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Export or replay was requested with nothing recorded.
    #[error("nothing recorded")]
    EmptyTimeline,

    /// Writing the exported file failed. No file is left at `path`.
    #[error("failed to write {}: {reason}", path.display())]
    EncodingFailure { path: PathBuf, reason: String },

    /// Replay could not be started on the output device.
    #[error("playback failed: {0}")]
    PlaybackFailure(String),
}

pub type Result<T> = std::result::Result<T, InstrumentError>;
