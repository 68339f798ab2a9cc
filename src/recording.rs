//! Session recording.
//!
//! While armed, every triggered note is synthesized into a segment and
//! appended to the timeline. Background export and replay never see the live
//! timeline: they work on a snapshot taken when the command is issued.

use crate::audio::tone::{ToneBuffer, ToneGenerator};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// One recorded note.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSegment {
    /// Element symbol that was triggered.
    pub symbol: String,
    /// Frequency of the note in Hz.
    pub frequency: f64,
    /// Synthesized audio for the note.
    pub buffer: ToneBuffer,
}

/// Ordered recorded segments, in trigger order.
///
/// Segments are shared through `Arc`, so cloning a timeline is cheap and the
/// clone is unaffected by later appends to the original.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    segments: Vec<Arc<RecordedSegment>>,
    total_frames: usize,
}

impl Timeline {
    /// Creates an empty timeline.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, segment: RecordedSegment) {
        self.total_frames += segment.buffer.frames();
        self.segments.push(Arc::new(segment));
    }

    /// Number of recorded segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterates segments in trigger order.
    pub fn segments(&self) -> impl Iterator<Item = &RecordedSegment> {
        self.segments.iter().map(|s| s.as_ref())
    }

    /// Total frames across all segments.
    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Cumulative duration of all segments.
    pub fn duration(&self) -> Duration {
        self.segments.iter().map(|s| s.buffer.duration()).sum()
    }

    /// Joins all segments into one continuous buffer.
    ///
    /// Returns `None` if the timeline holds no audio frames.
    pub fn concatenate(&self) -> Option<ToneBuffer> {
        if self.total_frames == 0 {
            return None;
        }
        let first = self.segments.first()?;
        let channels = first.buffer.channels();
        let sample_rate = first.buffer.sample_rate();

        let mut samples = Vec::with_capacity(self.total_frames * channels as usize);
        for segment in &self.segments {
            samples.extend_from_slice(segment.buffer.samples());
        }
        Some(ToneBuffer::from_samples(samples, channels, sample_rate))
    }
}

/// Recording state: the armed flag and the timeline it feeds.
#[derive(Debug, Clone)]
pub struct RecordingSession {
    generator: ToneGenerator,
    recording: bool,
    timeline: Timeline,
}

impl RecordingSession {
    /// Creates a disarmed session that synthesizes with `generator`.
    pub fn new(generator: ToneGenerator) -> Self {
        Self {
            generator,
            recording: false,
            timeline: Timeline::new(),
        }
    }

    /// Starts recording from an empty timeline.
    ///
    /// Arming while already armed discards the in-progress recording.
    pub fn arm(&mut self) {
        self.recording = true;
        self.timeline = Timeline::new();
    }

    /// Stops recording. The timeline is kept for export and replay.
    pub fn disarm(&mut self) {
        self.recording = false;
    }

    /// Returns whether new notes are being captured.
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Records a note if the session is armed.
    ///
    /// Returns `Ok(true)` if a segment was appended, `Ok(false)` when
    /// disarmed.
    ///
    /// # Errors
    ///
    /// Returns the synthesis error for an invalid frequency or duration;
    /// the timeline is left unchanged.
    pub fn append(&mut self, symbol: &str, frequency: f64, duration: f64) -> Result<bool> {
        if !self.recording {
            return Ok(false);
        }
        let buffer = self.generator.generate(frequency, duration)?;
        self.timeline.push(RecordedSegment {
            symbol: symbol.to_string(),
            frequency,
            buffer,
        });
        Ok(true)
    }

    /// Read-only view of the live timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Immutable copy of the current timeline for background work.
    pub fn snapshot(&self) -> Timeline {
        self.timeline.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> RecordingSession {
        RecordingSession::new(ToneGenerator::new(44100, 1))
    }

    #[test]
    fn test_disarmed_session_ignores_notes() {
        let mut session = session();
        assert!(!session.append("H", 40.5, 0.5).unwrap());
        assert!(!session.append("H", 40.5, 0.5).unwrap());
        assert!(session.timeline().is_empty());
    }

    #[test]
    fn test_armed_session_records_in_order() {
        let mut session = session();
        session.arm();
        for (symbol, frequency) in [("H", 40.5), ("He", 81.0), ("Li", 121.5), ("H", 40.5)] {
            assert!(session.append(symbol, frequency, 0.5).unwrap());
        }

        let symbols: Vec<&str> = session
            .timeline()
            .segments()
            .map(|s| s.symbol.as_str())
            .collect();
        assert_eq!(symbols, vec!["H", "He", "Li", "H"]);
        assert_eq!(session.timeline().total_frames(), 4 * 22050);
        assert_eq!(session.timeline().duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_rearm_resets_timeline() {
        let mut session = session();
        session.arm();
        session.append("H", 40.5, 0.5).unwrap();
        session.disarm();
        assert_eq!(session.timeline().len(), 1);

        session.arm();
        assert!(session.is_recording());
        assert_eq!(session.timeline().len(), 0);
    }

    #[test]
    fn test_arm_while_armed_truncates() {
        let mut session = session();
        session.arm();
        session.append("H", 40.5, 0.5).unwrap();
        session.arm();
        assert!(session.timeline().is_empty());
    }

    #[test]
    fn test_snapshot_is_isolated_from_appends() {
        let mut session = session();
        session.arm();
        session.append("H", 40.5, 0.5).unwrap();
        let snapshot = session.snapshot();

        session.append("He", 81.0, 0.5).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(session.timeline().len(), 2);

        session.arm();
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_invalid_frequency_leaves_timeline_unchanged() {
        let mut session = session();
        session.arm();
        assert!(session.append("X", 0.0, 0.5).is_err());
        assert!(session.timeline().is_empty());
    }

    #[test]
    fn test_concatenate() {
        let mut session = session();
        assert!(session.timeline().concatenate().is_none());

        session.arm();
        session.append("H", 40.5, 0.5).unwrap();
        session.append("He", 81.0, 0.5).unwrap();
        let joined = session.timeline().concatenate().unwrap();
        assert_eq!(joined.frames(), 44100);

        let first = &session.timeline().segments().next().unwrap().buffer;
        assert_eq!(&joined.samples()[..first.samples().len()], first.samples());
    }
}
