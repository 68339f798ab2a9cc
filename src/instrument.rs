//! Instrument controller.
//!
//! Routes note triggers to the tone generator, the playback engine and, when
//! armed, the recording session. Also owns the record/save/play commands.
//! Everything here runs on the control thread; export and replay are handed
//! to background tasks that report back through [`TaskEvent`]s.

use crate::audio::engine::{AudioOutput, PlaybackEngine, RodioOutput};
use crate::audio::export::{export_recording, timestamped_path};
use crate::audio::replay::start_replay;
use crate::audio::tone::ToneGenerator;
use crate::config::InstrumentConfig;
use crate::elements::NoteTable;
use crate::error::{InstrumentError, Result};
use crate::recording::{RecordingSession, Timeline};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Emitted for every note that started playing. The front end uses it to
/// drive the key highlight.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTriggered {
    pub symbol: String,
    pub frequency: f64,
    pub at: Instant,
    /// Whether the note was captured by the recording session.
    pub recorded: bool,
}

/// Completion reports from background tasks.
#[derive(Debug)]
pub enum TaskEvent {
    /// An export finished, with the written path on success.
    ExportFinished(Result<PathBuf>),
    /// A replay finished playing.
    ReplayFinished(Result<()>),
}

/// Recording state after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Armed,
}

/// Coordinates synthesis, playback and recording.
pub struct InstrumentController<O: AudioOutput = RodioOutput> {
    notes: NoteTable,
    config: InstrumentConfig,
    generator: ToneGenerator,
    playback: PlaybackEngine<O>,
    session: RecordingSession,
    events_tx: Sender<TaskEvent>,
    events_rx: Receiver<TaskEvent>,
}

impl InstrumentController<RodioOutput> {
    /// Creates a controller on the default audio output.
    pub fn new(notes: NoteTable, config: InstrumentConfig) -> Self {
        let playback = PlaybackEngine::new(config.audio);
        Self::with_playback(notes, config, playback)
    }
}

impl<O: AudioOutput> InstrumentController<O> {
    /// Creates a controller on an existing playback engine.
    pub fn with_playback(
        notes: NoteTable,
        config: InstrumentConfig,
        playback: PlaybackEngine<O>,
    ) -> Self {
        let generator = ToneGenerator::from_config(&config);
        let (events_tx, events_rx) = unbounded();
        Self {
            notes,
            config,
            generator,
            playback,
            session: RecordingSession::new(generator),
            events_tx,
            events_rx,
        }
    }

    /// The note table this instrument plays.
    pub fn notes(&self) -> &NoteTable {
        &self.notes
    }

    pub fn config(&self) -> &InstrumentConfig {
        &self.config
    }

    /// Plays the note for a symbol from the note table.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSymbol` if the symbol is not in the table, otherwise
    /// the errors of [`trigger_note`](Self::trigger_note).
    pub fn trigger_symbol(&mut self, symbol: &str) -> Result<NoteTriggered> {
        let frequency = self
            .notes
            .frequency(symbol)
            .ok_or_else(|| InstrumentError::UnknownSymbol(symbol.to_string()))?;
        self.trigger_note(symbol, frequency)
    }

    /// Synthesizes and plays one note, recording it if armed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidFrequency` before any synthesis if `frequency <= 0`,
    /// and `DeviceUnavailable` if the voice could not be started. A note
    /// that fails to play is not recorded.
    pub fn trigger_note(&mut self, symbol: &str, frequency: f64) -> Result<NoteTriggered> {
        let duration = self.config.note_duration_secs;
        let buffer = self.generator.generate(frequency, duration).map_err(|e| {
            tracing::warn!("Rejected {} ({} Hz): {}", symbol, frequency, e);
            e
        })?;

        self.playback.play(buffer)?;
        let at = Instant::now();
        let recorded = self.session.append(symbol, frequency, duration)?;
        tracing::debug!(symbol, frequency, recorded, "Note triggered");

        Ok(NoteTriggered {
            symbol: symbol.to_string(),
            frequency,
            at,
            recorded,
        })
    }

    /// Starts a fresh recording, discarding any previous one.
    pub fn arm(&mut self) {
        self.session.arm();
        tracing::info!("Recording started");
    }

    /// Stops recording and keeps the timeline.
    pub fn disarm(&mut self) {
        self.session.disarm();
        tracing::info!(
            "Recording stopped ({} segments, {:?})",
            self.session.timeline().len(),
            self.session.timeline().duration()
        );
    }

    /// Arms if idle, disarms if armed.
    pub fn toggle_recording(&mut self) -> RecordingState {
        if self.session.is_recording() {
            self.disarm();
            RecordingState::Idle
        } else {
            self.arm();
            RecordingState::Armed
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_recording()
    }

    /// The live recording timeline.
    pub fn timeline(&self) -> &Timeline {
        self.session.timeline()
    }

    /// Stops recording if needed and exports the timeline in the background.
    ///
    /// The file is written to a timestamped path in the configured output
    /// directory, in the configured export format. Encoding runs on the
    /// rayon pool. Completion arrives as [`TaskEvent::ExportFinished`].
    ///
    /// # Returns
    ///
    /// The path the recording will be written to.
    ///
    /// # Errors
    ///
    /// Returns `EmptyTimeline` immediately if the recording holds no audio.
    pub fn save_recording(&mut self) -> Result<PathBuf> {
        if self.session.is_recording() {
            self.disarm();
        }
        let snapshot = self.session.snapshot();
        if snapshot.total_frames() == 0 {
            return Err(InstrumentError::EmptyTimeline);
        }

        let format = self.config.export_format;
        let path = timestamped_path(&self.config.output_dir, format);
        let target = path.clone();
        let events = self.events_tx.clone();
        tracing::info!("Exporting recording to {}", path.display());
        rayon::spawn(move || {
            let result = export_recording(&snapshot, &target, format).map(|_| target);
            if let Err(e) = &result {
                tracing::error!("Export failed: {}", e);
            }
            let _ = events.send(TaskEvent::ExportFinished(result));
        });
        Ok(path)
    }

    /// Replays the recorded timeline in the background.
    ///
    /// Completion arrives as [`TaskEvent::ReplayFinished`].
    ///
    /// # Errors
    ///
    /// Returns `EmptyTimeline` if nothing was recorded and `PlaybackFailure`
    /// if the output device is not open.
    pub fn play_recording(&mut self) -> Result<Duration> {
        let snapshot = self.session.snapshot();
        let events = self.events_tx.clone();
        start_replay(&snapshot, self.playback.replay_sink(), move |result| {
            if let Err(e) = &result {
                tracing::error!("Replay failed: {}", e);
            }
            let _ = events.send(TaskEvent::ReplayFinished(result));
        })
    }

    /// Drains finished background tasks without blocking.
    pub fn poll_events(&self) -> Vec<TaskEvent> {
        self.events_rx.try_iter().collect()
    }

    /// Waits for the next background task to finish.
    pub fn wait_event(&self, timeout: Duration) -> Option<TaskEvent> {
        self.events_rx.recv_timeout(timeout).ok()
    }
}
