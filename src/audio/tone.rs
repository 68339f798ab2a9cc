//! Sine tone synthesis.
//!
//! Produces fixed-length 16-bit PCM buffers for a single frequency. The same
//! generator feeds both live playback and the recording timeline, so what is
//! heard and what is exported are sample-identical.

use crate::config::{InstrumentConfig, DEFAULT_AMPLITUDE, MAX_NOTE_DURATION};
use crate::error::{InstrumentError, Result};
use std::f64::consts::PI;
use std::time::Duration;

/// Interleaved 16-bit PCM audio. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToneBuffer {
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
}

impl ToneBuffer {
    /// Wraps interleaved samples. `samples.len()` must be a multiple of `channels`.
    pub(crate) fn from_samples(samples: Vec<i16>, channels: u16, sample_rate: u32) -> Self {
        debug_assert!(channels > 0 && samples.len() % channels as usize == 0);
        Self {
            samples,
            channels,
            sample_rate,
        }
    }

    /// Interleaved samples (L, R, L, R, ... for stereo).
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Consumes the buffer and returns its samples.
    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    /// Number of frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Nominal playing time of the buffer.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Samples of one channel, de-interleaved.
    pub fn channel(&self, index: u16) -> impl Iterator<Item = i16> + '_ {
        self.samples
            .iter()
            .skip(index as usize)
            .step_by(self.channels as usize)
            .copied()
    }
}

/// Synthesizes pure sine tones with fixed output settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneGenerator {
    sample_rate: u32,
    channels: u16,
    amplitude: i16,
    fade: Duration,
}

impl ToneGenerator {
    /// Creates a generator with the default amplitude and no fade.
    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            amplitude: DEFAULT_AMPLITUDE,
            fade: Duration::ZERO,
        }
    }

    /// Creates a generator matching an instrument configuration.
    pub fn from_config(config: &InstrumentConfig) -> Self {
        Self::new(config.audio.sample_rate, config.audio.channels)
            .with_amplitude(config.amplitude)
            .with_fade(Duration::from_secs_f64(config.fade_ms / 1000.0))
    }

    /// Sets the peak sample value.
    pub fn with_amplitude(mut self, amplitude: i16) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Sets the length of the linear fade-in and fade-out.
    pub fn with_fade(mut self, fade: Duration) -> Self {
        self.fade = fade;
        self
    }

    pub fn amplitude(&self) -> i16 {
        self.amplitude
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Number of frames a tone of `duration` seconds occupies.
    pub fn frame_count(&self, duration: f64) -> usize {
        (self.sample_rate as f64 * duration).round() as usize
    }

    /// Generates `duration` seconds of a sine at `frequency` Hz.
    ///
    /// Stereo output carries the same value on both channels.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFrequency` if `frequency <= 0` (or not finite), and
    /// `InvalidConfig` for a duration outside `(0, MAX_NOTE_DURATION]`, a zero
    /// sample rate or a channel count other than 1 or 2. No buffer is
    /// produced on error.
    pub fn generate(&self, frequency: f64, duration: f64) -> Result<ToneBuffer> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(InstrumentError::InvalidFrequency { frequency });
        }
        if !(duration.is_finite() && duration > 0.0 && duration <= MAX_NOTE_DURATION) {
            return Err(InstrumentError::InvalidConfig(format!(
                "tone duration must be in (0, {MAX_NOTE_DURATION}], got {duration}"
            )));
        }
        if self.sample_rate == 0 || !matches!(self.channels, 1 | 2) {
            return Err(InstrumentError::InvalidConfig(format!(
                "cannot synthesize {} channel(s) at {} Hz",
                self.channels, self.sample_rate
            )));
        }

        let frames = self.frame_count(duration);
        let fade_frames = (self.fade.as_secs_f64() * self.sample_rate as f64).round() as usize;
        let fade_frames = fade_frames.min(frames / 2);
        let step = 2.0 * PI * frequency / self.sample_rate as f64;
        let amplitude = self.amplitude as f64;

        let mut samples = Vec::with_capacity(frames * self.channels as usize);
        for i in 0..frames {
            let gain = if fade_frames == 0 {
                1.0
            } else {
                let from_edge = i.min(frames - 1 - i);
                (from_edge as f64 / fade_frames as f64).min(1.0)
            };
            let value = (amplitude * gain * (step * i as f64).sin()) as i16;
            for _ in 0..self.channels {
                samples.push(value);
            }
        }

        Ok(ToneBuffer::from_samples(samples, self.channels, self.sample_rate))
    }
}

/// Generates a tone with the default amplitude and no fade.
pub fn generate(
    frequency: f64,
    duration: f64,
    sample_rate: u32,
    channels: u16,
) -> Result<ToneBuffer> {
    ToneGenerator::new(sample_rate, channels).generate(frequency, duration)
}
