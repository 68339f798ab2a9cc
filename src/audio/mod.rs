//! Audio synthesis, playback and export.
//!
//! This module provides the sound side of the instrument:
//! - Sine tone synthesis at the configured sample rate
//! - Overlapping fire-and-forget voices via rodio
//! - FLAC or WAV export of a recorded timeline
//! - Background replay of a recorded timeline

pub mod engine;
pub mod export;
pub mod replay;
pub mod tone;

pub use engine::{AudioOutput, PlaybackEngine, ReplaySink, RodioOutput};
pub use export::{export_recording, export_to_flac, export_to_wav};
pub use replay::start_replay;
pub use tone::{ToneBuffer, ToneGenerator};
