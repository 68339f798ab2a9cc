//! Instrument configuration.
//!
//! Settings are fixed at startup. They can be loaded from a JSON file where
//! any missing field falls back to its default.

use crate::error::{InstrumentError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default output sample rate (44.1 kHz).
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Default length of every note in seconds.
pub const DEFAULT_NOTE_DURATION: f64 = 0.5;

/// Longest accepted note length in seconds.
pub const MAX_NOTE_DURATION: f64 = 60.0;

/// Default peak amplitude of a tone. Max for 16-bit is 32767; the headroom
/// leaves space for several overlapping voices.
pub const DEFAULT_AMPLITUDE: i16 = 8000;

/// File format of exported recordings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Lossless compressed FLAC.
    #[default]
    Flac,
    /// Uncompressed 16-bit PCM WAV.
    Wav,
}

impl ExportFormat {
    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Flac => "flac",
            ExportFormat::Wav => "wav",
        }
    }
}

/// Output device settings shared by synthesis, playback and export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Samples per second per channel.
    pub sample_rate: u32,
    /// Bits per sample. Only 16-bit PCM is produced.
    pub bit_depth: u16,
    /// Interleaved channel count (1 or 2).
    pub channels: u16,
    /// Device buffer size hint in frames.
    pub buffer_size: u32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            bit_depth: 16,
            channels: 2,
            buffer_size: 512,
        }
    }
}

impl AudioConfig {
    /// Checks that the device settings describe something we can synthesize.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(InstrumentError::InvalidConfig(
                "sample_rate must be positive".into(),
            ));
        }
        if self.bit_depth != 16 {
            return Err(InstrumentError::InvalidConfig(format!(
                "unsupported bit depth {} (only 16-bit is supported)",
                self.bit_depth
            )));
        }
        if !matches!(self.channels, 1 | 2) {
            return Err(InstrumentError::InvalidConfig(format!(
                "unsupported channel count {} (expected 1 or 2)",
                self.channels
            )));
        }
        if self.buffer_size == 0 {
            return Err(InstrumentError::InvalidConfig(
                "buffer_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Complete instrument settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstrumentConfig {
    /// Output device settings.
    pub audio: AudioConfig,
    /// Length of every note in seconds. Fixed for the whole session.
    pub note_duration_secs: f64,
    /// Peak sample value of a tone.
    pub amplitude: i16,
    /// Length of the linear fade applied at both ends of a tone, in milliseconds.
    /// Zero disables the fade.
    pub fade_ms: f64,
    /// Directory where exported recordings are written.
    pub output_dir: PathBuf,
    /// Format of exported recordings.
    pub export_format: ExportFormat,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            note_duration_secs: DEFAULT_NOTE_DURATION,
            amplitude: DEFAULT_AMPLITUDE,
            fade_ms: 5.0,
            output_dir: PathBuf::from("."),
            export_format: ExportFormat::default(),
        }
    }
}

impl InstrumentConfig {
    /// Loads and validates a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON, or
    /// contains out-of-range values.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        self.audio.validate()?;
        if !(self.note_duration_secs.is_finite()
            && self.note_duration_secs > 0.0
            && self.note_duration_secs <= MAX_NOTE_DURATION)
        {
            return Err(InstrumentError::InvalidConfig(format!(
                "note_duration_secs must be in (0, {}], got {}",
                MAX_NOTE_DURATION, self.note_duration_secs
            )));
        }
        if (self.note_duration_secs * self.audio.sample_rate as f64).round() < 1.0 {
            return Err(InstrumentError::InvalidConfig(format!(
                "note_duration_secs {} is shorter than one frame at {} Hz",
                self.note_duration_secs, self.audio.sample_rate
            )));
        }
        if self.amplitude <= 0 {
            return Err(InstrumentError::InvalidConfig(format!(
                "amplitude must be positive, got {}",
                self.amplitude
            )));
        }
        if !(self.fade_ms.is_finite() && self.fade_ms >= 0.0) {
            return Err(InstrumentError::InvalidConfig(format!(
                "fade_ms must not be negative, got {}",
                self.fade_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = InstrumentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.audio.channels, 2);
        assert_eq!(config.note_duration_secs, 0.5);
    }

    #[test]
    fn test_load_partial_config() {
        let json = r#"{ "audio": { "channels": 1 }, "note_duration_secs": 0.25 }"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = InstrumentConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.audio.channels, 1);
        assert_eq!(config.audio.sample_rate, 44100);
        assert_eq!(config.note_duration_secs, 0.25);
        assert_eq!(config.amplitude, DEFAULT_AMPLITUDE);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let json = r#"{ "audio": { "bit_depth": 24 } }"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        assert!(InstrumentConfig::load_from_file(file.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let mut config = InstrumentConfig::default();
        config.audio.channels = 3;
        assert!(matches!(
            config.validate(),
            Err(InstrumentError::InvalidConfig(_))
        ));

        let mut config = InstrumentConfig::default();
        config.note_duration_secs = 0.0;
        assert!(config.validate().is_err());

        let mut config = InstrumentConfig::default();
        config.amplitude = 0;
        assert!(config.validate().is_err());

        let mut config = InstrumentConfig::default();
        config.fade_ms = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_note_duration_bounds() {
        let mut config = InstrumentConfig::default();
        // round(44100 * 0.00001) == 0 frames
        config.note_duration_secs = 0.00001;
        assert!(matches!(
            config.validate(),
            Err(InstrumentError::InvalidConfig(_))
        ));

        config.note_duration_secs = 1e20;
        assert!(config.validate().is_err());

        config.note_duration_secs = MAX_NOTE_DURATION;
        assert!(config.validate().is_ok());

        // One frame is the shortest usable note.
        config.note_duration_secs = 1.0 / 44100.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_export_format_from_json() {
        let config: InstrumentConfig = serde_json::from_str(r#"{ "export_format": "wav" }"#).unwrap();
        assert_eq!(config.export_format, ExportFormat::Wav);
        assert_eq!(config.export_format.extension(), "wav");
        assert_eq!(InstrumentConfig::default().export_format, ExportFormat::Flac);
    }
}
