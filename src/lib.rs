//! elemental - A terminal instrument that plays the periodic table.
//!
//! Each chemical element is a key mapped to a sine tone. Performances can be
//! recorded, replayed and exported to FLAC or WAV.

pub mod app;
pub mod audio;
pub mod config;
pub mod elements;
pub mod error;
pub mod instrument;
pub mod recording;
pub mod ui;

// Re-export commonly used types
pub use app::App;
pub use audio::{
    export_recording, export_to_flac, export_to_wav, PlaybackEngine, ToneBuffer, ToneGenerator,
};
pub use config::{AudioConfig, ExportFormat, InstrumentConfig};
pub use elements::{NoteDefinition, NoteTable};
pub use error::InstrumentError;
pub use instrument::{InstrumentController, NoteTriggered, TaskEvent};
pub use recording::{RecordingSession, Timeline};
