//! Audio engine for live note playback.
//!
//! Every trigger becomes an independent voice on the output device's mixer,
//! so notes overlap freely. Voices are capped at their nominal duration and
//! are dropped by the mixer once they finish.

use crate::audio::tone::ToneBuffer;
use crate::config::AudioConfig;
use crate::error::{InstrumentError, Result};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use std::time::Duration;

/// An output device that can start fire-and-forget voices.
pub trait AudioOutput {
    /// Handle used by a background thread to play a long buffer to the end.
    type Replay: ReplaySink + Send + 'static;

    /// Starts playing `buffer` and returns immediately. The voice stops after
    /// `cap` even if the buffer is longer.
    fn start_voice(&self, buffer: ToneBuffer, cap: Duration) -> Result<()>;

    /// Closes and reopens the device with `config`.
    fn reopen(&mut self, config: &AudioConfig) -> Result<()>;

    /// Returns a replay handle, or `None` if the device is not open.
    fn replay_sink(&self) -> Option<Self::Replay>;
}

/// Blocking playback of a whole buffer, used off the control thread.
pub trait ReplaySink {
    /// Plays `buffer` and returns once it has finished.
    fn play_to_end(&self, buffer: ToneBuffer) -> Result<()>;
}

/// Output device backed by rodio's default stream.
pub struct RodioOutput {
    /// Audio output stream and its handle (the stream must be kept alive).
    stream: Option<(OutputStream, OutputStreamHandle)>,
}

impl RodioOutput {
    /// Opens the default output device.
    ///
    /// A missing device is not fatal: the output starts closed and every
    /// voice attempt retries the open.
    pub fn open(config: &AudioConfig) -> Self {
        let mut output = Self { stream: None };
        if let Err(e) = output.reopen(config) {
            tracing::warn!("Audio output unavailable at startup: {}", e);
        }
        output
    }

    fn handle(&self) -> Result<&OutputStreamHandle> {
        self.stream
            .as_ref()
            .map(|(_, handle)| handle)
            .ok_or_else(|| InstrumentError::DeviceUnavailable("output device is not open".into()))
    }
}

impl AudioOutput for RodioOutput {
    type Replay = RodioReplay;

    fn start_voice(&self, buffer: ToneBuffer, cap: Duration) -> Result<()> {
        let channels = buffer.channels();
        let sample_rate = buffer.sample_rate();
        let source = SamplesBuffer::new(channels, sample_rate, buffer.into_samples())
            .take_duration(cap)
            .convert_samples::<f32>();
        self.handle()?
            .play_raw(source)
            .map_err(|e| InstrumentError::DeviceUnavailable(e.to_string()))
    }

    fn reopen(&mut self, config: &AudioConfig) -> Result<()> {
        // Drop the old stream before asking the host for a new one.
        self.stream = None;
        let (stream, handle) = OutputStream::try_default()
            .map_err(|e| InstrumentError::DeviceUnavailable(e.to_string()))?;
        tracing::info!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            bit_depth = config.bit_depth,
            buffer_size = config.buffer_size,
            "Audio output opened"
        );
        self.stream = Some((stream, handle));
        Ok(())
    }

    fn replay_sink(&self) -> Option<RodioReplay> {
        self.handle().ok().cloned().map(RodioReplay)
    }
}

/// Replay handle holding a clone of the rodio stream handle.
pub struct RodioReplay(OutputStreamHandle);

impl ReplaySink for RodioReplay {
    fn play_to_end(&self, buffer: ToneBuffer) -> Result<()> {
        let sink =
            Sink::try_new(&self.0).map_err(|e| InstrumentError::PlaybackFailure(e.to_string()))?;
        let channels = buffer.channels();
        let sample_rate = buffer.sample_rate();
        sink.append(SamplesBuffer::new(
            channels,
            sample_rate,
            buffer.into_samples(),
        ));
        sink.sleep_until_end();
        Ok(())
    }
}

/// Owns the output device and plays tone buffers on it.
pub struct PlaybackEngine<O: AudioOutput = RodioOutput> {
    /// Last-known device configuration, reused on re-initialization.
    config: AudioConfig,
    output: O,
    /// Number of voices successfully started.
    voices_started: u64,
}

impl PlaybackEngine<RodioOutput> {
    /// Creates an engine on the default rodio output device.
    pub fn new(config: AudioConfig) -> Self {
        let output = RodioOutput::open(&config);
        Self::with_output(config, output)
    }
}

impl<O: AudioOutput> PlaybackEngine<O> {
    /// Creates an engine on an already opened output.
    pub fn with_output(config: AudioConfig, output: O) -> Self {
        Self {
            config,
            output,
            voices_started: 0,
        }
    }

    /// Plays a buffer as a new voice without waiting for it.
    ///
    /// # Errors
    ///
    /// If the device refuses the voice, the device is re-initialized once
    /// with the last-known configuration and the original error is returned
    /// whether or not that succeeded.
    pub fn play(&mut self, buffer: ToneBuffer) -> Result<()> {
        let cap = buffer.duration();
        match self.output.start_voice(buffer, cap) {
            Ok(()) => {
                self.voices_started += 1;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Voice failed: {}. Reinitializing audio output.", e);
                if let Err(reinit) = self.output.reopen(&self.config) {
                    tracing::error!("Audio output reinitialization failed: {}", reinit);
                }
                Err(e)
            }
        }
    }

    /// Returns a handle for blocking replay on a background thread.
    pub fn replay_sink(&self) -> Option<O::Replay> {
        self.output.replay_sink()
    }

    /// Returns the device configuration.
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Returns the number of voices started so far.
    pub fn voices_started(&self) -> u64 {
        self.voices_started
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockOutput;
    use super::*;
    use crate::audio::tone::generate;

    #[test]
    fn test_overlapping_voices() {
        let output = MockOutput::default();
        let mut engine = PlaybackEngine::with_output(AudioConfig::default(), output.clone());

        engine.play(generate(40.5, 0.5, 44100, 2).unwrap()).unwrap();
        engine.play(generate(81.0, 0.5, 44100, 2).unwrap()).unwrap();

        let state = output.state.lock().unwrap();
        assert_eq!(state.voices.len(), 2);
        assert_eq!(state.voices[0], (22050, Duration::from_millis(500)));
        assert_eq!(engine.voices_started(), 2);
    }

    #[test]
    fn test_failure_reinitializes_once_and_reports() {
        let output = MockOutput::default();
        output.fail_next(1);
        let mut engine = PlaybackEngine::with_output(AudioConfig::default(), output.clone());

        let result = engine.play(generate(40.5, 0.5, 44100, 2).unwrap());
        assert!(matches!(result, Err(InstrumentError::DeviceUnavailable(_))));
        assert_eq!(output.state.lock().unwrap().reopen_count, 1);
        assert_eq!(engine.voices_started(), 0);

        // The engine keeps working after the failure.
        engine.play(generate(40.5, 0.5, 44100, 2).unwrap()).unwrap();
        let state = output.state.lock().unwrap();
        assert_eq!(state.reopen_count, 1);
        assert_eq!(state.voices.len(), 1);
    }

    #[test]
    fn test_replay_sink_requires_open_device() {
        let output = MockOutput::default();
        let engine = PlaybackEngine::with_output(AudioConfig::default(), output.clone());
        assert!(engine.replay_sink().is_some());

        output.state.lock().unwrap().closed = true;
        assert!(engine.replay_sink().is_none());
    }
}
