//! Background replay of a recorded timeline.

use crate::audio::engine::ReplaySink;
use crate::error::{InstrumentError, Result};
use crate::recording::Timeline;
use std::thread;
use std::time::Duration;

/// Name of the thread that plays a replay.
pub const REPLAY_THREAD_NAME: &str = "replay";

/// Starts playing a timeline on a background thread and returns at once.
///
/// The timeline is joined into one stream before the thread starts.
/// Playback blocks for the length of the recording, so it gets a dedicated
/// thread rather than a slot in the compute pool used by export.
/// `on_finish` runs on that thread with the playback result.
///
/// # Returns
///
/// The length of the replay.
///
/// # Errors
///
/// Returns `EmptyTimeline` if nothing was recorded and `PlaybackFailure` if
/// no output is available or the thread cannot be spawned. In all cases no
/// playback is started.
pub fn start_replay<S, F>(timeline: &Timeline, sink: Option<S>, on_finish: F) -> Result<Duration>
where
    S: ReplaySink + Send + 'static,
    F: FnOnce(Result<()>) + Send + 'static,
{
    let Some(stream) = timeline.concatenate() else {
        return Err(InstrumentError::EmptyTimeline);
    };
    let Some(sink) = sink else {
        return Err(InstrumentError::PlaybackFailure(
            "output device is not open".into(),
        ));
    };

    let duration = stream.duration();
    tracing::info!("Replaying {} segments ({:?})", timeline.len(), duration);
    thread::Builder::new()
        .name(REPLAY_THREAD_NAME.into())
        .spawn(move || on_finish(sink.play_to_end(stream)))
        .map_err(|e| InstrumentError::PlaybackFailure(e.to_string()))?;
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::testing::{MockOutput, MockReplay};
    use crate::audio::engine::AudioOutput;
    use crate::audio::tone::ToneGenerator;
    use crate::recording::RecordingSession;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Instant;

    fn recorded(count: usize) -> Timeline {
        let mut session = RecordingSession::new(ToneGenerator::new(44100, 2));
        session.arm();
        for _ in 0..count {
            session.append("H", 40.5, 0.5).unwrap();
        }
        session.snapshot()
    }

    #[test]
    fn test_empty_timeline_starts_nothing() {
        let output = MockOutput::default();
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);

        let result = start_replay(&Timeline::new(), output.replay_sink(), move |_| {
            flag.store(true, Ordering::SeqCst)
        });
        assert!(matches!(result, Err(InstrumentError::EmptyTimeline)));

        std::thread::sleep(Duration::from_millis(50));
        assert!(!called.load(Ordering::SeqCst));
        assert!(output.state.lock().unwrap().replayed.is_empty());
    }

    #[test]
    fn test_missing_output_reports_playback_failure() {
        let result = start_replay(&recorded(1), None::<MockReplay>, |_| {});
        assert!(matches!(result, Err(InstrumentError::PlaybackFailure(_))));
    }

    #[test]
    fn test_replay_returns_before_playback_finishes() {
        let output = MockOutput::with_replay_delay(Duration::from_millis(400));
        let (tx, rx) = crossbeam_channel::unbounded();

        let started = Instant::now();
        let duration = start_replay(&recorded(2), output.replay_sink(), move |result| {
            let _ = tx.send(result);
        })
        .unwrap();
        assert!(started.elapsed() < Duration::from_millis(200));
        assert_eq!(duration, Duration::from_secs(1));

        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(result.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(400));
        assert_eq!(output.state.lock().unwrap().replayed, vec![44100]);
    }

    #[test]
    fn test_replay_runs_on_its_own_thread() {
        let output = MockOutput::default();
        let (tx, rx) = crossbeam_channel::unbounded();

        start_replay(&recorded(1), output.replay_sink(), move |_| {
            let name = std::thread::current().name().map(str::to_string);
            let in_pool = rayon::current_thread_index().is_some();
            let _ = tx.send((name, in_pool));
        })
        .unwrap();

        let (name, in_pool) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some(REPLAY_THREAD_NAME));
        assert!(!in_pool);
    }
}
