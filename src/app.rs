//! Application state and event handling.
//!
//! This module sits between terminal input and the instrument controller:
//! it maps keys to elements and commands, tracks which keys are lit, and
//! keeps the transient status line.

use crate::audio::engine::{AudioOutput, RodioOutput};
use crate::error::InstrumentError;
use crate::instrument::{InstrumentController, RecordingState, TaskEvent};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a status message stays on screen.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Highlight pulses per second while a key is lit.
pub const PULSE_SPEED: f64 = 2.0;

/// Keyboard to element mapping.
///
/// Letters, punctuation and digits follow the physical rows; the shifted
/// digit row stands in for a numeric keypad. Elements without a key can
/// still be played through the controller.
pub const KEY_BINDINGS: &[(KeyCode, &str)] = &[
    (KeyCode::Char('q'), "H"),
    (KeyCode::Char('w'), "He"),
    (KeyCode::Char('e'), "Li"),
    (KeyCode::Char('r'), "Be"),
    (KeyCode::Char('t'), "B"),
    (KeyCode::Char('y'), "C"),
    (KeyCode::Char('u'), "N"),
    (KeyCode::Char('i'), "O"),
    (KeyCode::Char('o'), "F"),
    (KeyCode::Char('p'), "Ne"),
    (KeyCode::Char('['), "Na"),
    (KeyCode::Char(']'), "Mg"),
    (KeyCode::Char('a'), "Al"),
    (KeyCode::Char('s'), "Si"),
    (KeyCode::Char('d'), "P"),
    (KeyCode::Char('f'), "S"),
    (KeyCode::Char('g'), "Cl"),
    (KeyCode::Char('h'), "Ar"),
    (KeyCode::Char('j'), "K"),
    (KeyCode::Char('k'), "Ca"),
    (KeyCode::Char('l'), "Sc"),
    (KeyCode::Char(';'), "Ti"),
    (KeyCode::Char('\''), "V"),
    (KeyCode::Char('\\'), "Cr"),
    (KeyCode::Char('z'), "Mn"),
    (KeyCode::Char('x'), "Fe"),
    (KeyCode::Char('c'), "Co"),
    (KeyCode::Char('v'), "Ni"),
    (KeyCode::Char('b'), "Cu"),
    (KeyCode::Char('n'), "Zn"),
    (KeyCode::Char('m'), "Ga"),
    (KeyCode::Char(','), "Ge"),
    (KeyCode::Char('.'), "As"),
    (KeyCode::Char('/'), "Se"),
    (KeyCode::Char('1'), "Br"),
    (KeyCode::Char('2'), "Kr"),
    (KeyCode::Char('3'), "Rb"),
    (KeyCode::Char('4'), "Sr"),
    (KeyCode::Char('5'), "Y"),
    (KeyCode::Char('6'), "Zr"),
    (KeyCode::Char('7'), "Nb"),
    (KeyCode::Char('8'), "Mo"),
    (KeyCode::Char('9'), "Tc"),
    (KeyCode::Char('0'), "Ru"),
    (KeyCode::Char('-'), "Rh"),
    (KeyCode::Char('='), "Pd"),
    (KeyCode::F(1), "Ag"),
    (KeyCode::F(2), "Cd"),
    (KeyCode::F(3), "In"),
    (KeyCode::F(4), "Sn"),
    (KeyCode::F(5), "Sb"),
    (KeyCode::F(6), "Te"),
    (KeyCode::F(7), "I"),
    (KeyCode::F(8), "Xe"),
    (KeyCode::F(9), "Cs"),
    (KeyCode::F(10), "Ba"),
    (KeyCode::F(11), "La"),
    (KeyCode::F(12), "Ce"),
    (KeyCode::Char('!'), "Pr"),
    (KeyCode::Char('@'), "Nd"),
    (KeyCode::Char('#'), "Pm"),
    (KeyCode::Char('$'), "Sm"),
    (KeyCode::Char('%'), "Eu"),
    (KeyCode::Char('^'), "Gd"),
    (KeyCode::Char('&'), "Tb"),
    (KeyCode::Char('*'), "Dy"),
    (KeyCode::Char('('), "Ho"),
    (KeyCode::Char(')'), "Er"),
    (KeyCode::Char('_'), "Tm"),
    (KeyCode::Char('+'), "Yb"),
    (KeyCode::Char('>'), "Lu"),
    (KeyCode::Char('<'), "Hf"),
    (KeyCode::Insert, "Ta"),
    (KeyCode::Home, "W"),
    (KeyCode::PageUp, "Re"),
    (KeyCode::Delete, "Os"),
    (KeyCode::End, "Ir"),
    (KeyCode::PageDown, "Pt"),
    (KeyCode::Up, "Au"),
    (KeyCode::Down, "Hg"),
    (KeyCode::Left, "Tl"),
    (KeyCode::Right, "Pb"),
    (KeyCode::Backspace, "Np"),
    (KeyCode::BackTab, "Am"),
    (KeyCode::Enter, "Cf"),
    (KeyCode::Tab, "Es"),
    (KeyCode::Char(' '), "Fm"),
];

/// Returns the element bound to a key, if any.
pub fn symbol_for_key(code: KeyCode) -> Option<&'static str> {
    KEY_BINDINGS
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, symbol)| *symbol)
}

/// Returns a short label for the key bound to an element.
pub fn key_label(symbol: &str) -> Option<String> {
    let (code, _) = KEY_BINDINGS.iter().find(|(_, s)| *s == symbol)?;
    let label = match code {
        KeyCode::Char(' ') => "SPC".to_string(),
        KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
        KeyCode::F(n) => format!("F{}", n),
        KeyCode::Insert => "INS".to_string(),
        KeyCode::Home => "HOME".to_string(),
        KeyCode::PageUp => "PGUP".to_string(),
        KeyCode::Delete => "DEL".to_string(),
        KeyCode::End => "END".to_string(),
        KeyCode::PageDown => "PGDN".to_string(),
        KeyCode::Up => "UP".to_string(),
        KeyCode::Down => "DOWN".to_string(),
        KeyCode::Left => "LEFT".to_string(),
        KeyCode::Right => "RIGHT".to_string(),
        KeyCode::Backspace => "BKSP".to_string(),
        KeyCode::BackTab => "S-TAB".to_string(),
        KeyCode::Enter => "ENTER".to_string(),
        KeyCode::Tab => "TAB".to_string(),
        _ => return None,
    };
    Some(label)
}

/// Commands that are not notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleRecording,
    SaveRecording,
    PlayRecording,
    Quit,
}

impl Command {
    /// Maps a key event to a command. Commands use Ctrl so that every plain
    /// key stays free for notes.
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        if key.code == KeyCode::Esc {
            return Some(Command::Quit);
        }
        if !key.modifiers.contains(KeyModifiers::CONTROL) {
            return None;
        }
        match key.code {
            KeyCode::Char('r') => Some(Command::ToggleRecording),
            KeyCode::Char('s') => Some(Command::SaveRecording),
            KeyCode::Char('p') => Some(Command::PlayRecording),
            KeyCode::Char('c') => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Main application state.
pub struct App<O: AudioOutput = RodioOutput> {
    /// The instrument being played.
    pub instrument: InstrumentController<O>,
    /// Keys currently lit, with the time they were pressed.
    active_keys: HashMap<String, Instant>,
    /// How long a key stays lit.
    highlight_duration: Duration,
    /// Status message to display.
    pub status_message: Option<(String, Instant)>,
}

impl<O: AudioOutput> App<O> {
    /// Creates the application around an instrument.
    pub fn new(instrument: InstrumentController<O>) -> Self {
        let highlight_duration =
            Duration::from_secs_f64(instrument.config().note_duration_secs);
        Self {
            instrument,
            active_keys: HashMap::new(),
            highlight_duration,
            status_message: None,
        }
    }

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears expired status messages.
    pub fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }

    /// Removes highlights whose animation has finished.
    pub fn clear_expired_highlights(&mut self) {
        let limit = self.highlight_duration;
        self.active_keys.retain(|_, pressed| pressed.elapsed() < limit);
    }

    /// Per-frame housekeeping: expire highlights and status, collect
    /// finished background tasks.
    pub fn update(&mut self) {
        self.clear_expired_highlights();
        self.clear_expired_status();
        for event in self.instrument.poll_events() {
            self.handle_task_event(event);
        }
    }

    fn handle_task_event(&mut self, event: TaskEvent) {
        match event {
            TaskEvent::ExportFinished(Ok(path)) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.set_status(format!("Saved: {}", name));
            }
            TaskEvent::ExportFinished(Err(e)) => {
                self.set_status(format!("Error saving recording: {}", e));
            }
            TaskEvent::ReplayFinished(Ok(())) => self.set_status("Playback finished"),
            TaskEvent::ReplayFinished(Err(e)) => {
                self.set_status(format!("Playback failed: {}", e));
            }
        }
    }

    /// Handles a key press.
    ///
    /// # Returns
    ///
    /// true if the application should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if let Some(command) = Command::from_key(&key) {
            return self.run_command(command);
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return false;
        }
        if let Some(symbol) = symbol_for_key(key.code) {
            self.play(symbol);
        }
        false
    }

    /// Plays an element and lights its key.
    pub fn play(&mut self, symbol: &str) {
        match self.instrument.trigger_symbol(symbol) {
            Ok(event) => {
                self.active_keys.insert(event.symbol, event.at);
            }
            Err(e @ InstrumentError::UnknownSymbol(_)) => self.set_status(e.to_string()),
            Err(e) => {
                tracing::error!("Error playing sound for {}: {}", symbol, e);
                self.set_status(format!("Error playing {}: {}", symbol, e));
            }
        }
    }

    /// Runs a non-note command. Returns true to quit.
    pub fn run_command(&mut self, command: Command) -> bool {
        match command {
            Command::ToggleRecording => match self.instrument.toggle_recording() {
                RecordingState::Armed => self.set_status("Recording Started..."),
                RecordingState::Idle => self.set_status("Recording Stopped."),
            },
            Command::SaveRecording => match self.instrument.save_recording() {
                Ok(path) => self.set_status(format!("Saving {}...", path.display())),
                Err(InstrumentError::EmptyTimeline) => {
                    self.set_status("No audio recorded to save.")
                }
                Err(e) => self.set_status(format!("Error saving recording: {}", e)),
            },
            Command::PlayRecording => match self.instrument.play_recording() {
                Ok(_) => self.set_status("Playing recording..."),
                Err(InstrumentError::EmptyTimeline) => self.set_status("No recording to play."),
                Err(e) => self.set_status(format!("Playback failed: {}", e)),
            },
            Command::Quit => return true,
        }
        false
    }

    /// Returns how far into its animation a lit key is, or `None` if idle.
    pub fn highlight_elapsed(&self, symbol: &str) -> Option<Duration> {
        let elapsed = self.active_keys.get(symbol)?.elapsed();
        (elapsed < self.highlight_duration).then_some(elapsed)
    }

    /// Returns the current status text, if any.
    pub fn status_text(&self) -> Option<&str> {
        self.status_message.as_ref().map(|(text, _)| text.as_str())
    }
}

/// Blend factor (0.0 idle, 1.0 full highlight) for a key lit `elapsed` ago.
pub fn pulse(elapsed: Duration) -> f64 {
    (1.0 + (elapsed.as_secs_f64() * PULSE_SPEED * std::f64::consts::TAU).sin()) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::engine::testing::MockOutput;
    use crate::audio::engine::PlaybackEngine;
    use crate::config::InstrumentConfig;
    use crate::elements::NoteTable;
    use std::collections::HashSet;

    fn app(output: MockOutput) -> App<MockOutput> {
        let config = InstrumentConfig::default();
        let playback = PlaybackEngine::with_output(config.audio, output);
        App::new(InstrumentController::with_playback(
            NoteTable::periodic(),
            config,
            playback,
        ))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_key_bindings_are_one_to_one() {
        let table = NoteTable::periodic();
        let mut keys = HashSet::new();
        let mut symbols = HashSet::new();
        for (code, symbol) in KEY_BINDINGS {
            assert!(keys.insert(*code), "key bound twice: {:?}", code);
            assert!(symbols.insert(*symbol), "element bound twice: {}", symbol);
            assert!(table.get(symbol).is_some(), "unknown element: {}", symbol);
        }
    }

    #[test]
    fn test_key_lookup_and_labels() {
        assert_eq!(symbol_for_key(KeyCode::Char('q')), Some("H"));
        assert_eq!(symbol_for_key(KeyCode::F(1)), Some("Ag"));
        assert_eq!(symbol_for_key(KeyCode::Esc), None);
        assert_eq!(key_label("H").as_deref(), Some("Q"));
        assert_eq!(key_label("Fm").as_deref(), Some("SPC"));
        assert_eq!(key_label("Og"), None);
    }

    #[test]
    fn test_note_key_plays_and_lights() {
        let output = MockOutput::default();
        let mut app = app(output.clone());

        assert!(!app.handle_key(press(KeyCode::Char('q'))));
        assert!(app.highlight_elapsed("H").is_some());
        assert!(app.highlight_elapsed("He").is_none());
        assert_eq!(output.state.lock().unwrap().voices.len(), 1);
    }

    #[test]
    fn test_commands_use_control() {
        let mut app = app(MockOutput::default());

        // Plain 'r' is beryllium, Ctrl+R toggles recording.
        app.handle_key(press(KeyCode::Char('r')));
        assert!(!app.instrument.is_recording());
        app.handle_key(ctrl('r'));
        assert!(app.instrument.is_recording());
        assert_eq!(app.status_text(), Some("Recording Started..."));

        app.handle_key(press(KeyCode::Char('q')));
        assert_eq!(app.instrument.timeline().len(), 1);

        assert!(app.handle_key(press(KeyCode::Esc)));
    }

    #[test]
    fn test_empty_save_and_play_messages() {
        let mut app = app(MockOutput::default());
        app.handle_key(ctrl('s'));
        assert_eq!(app.status_text(), Some("No audio recorded to save."));
        app.handle_key(ctrl('p'));
        assert_eq!(app.status_text(), Some("No recording to play."));
    }

    #[test]
    fn test_failed_note_reports_and_stays_dark() {
        let output = MockOutput::default();
        output.fail_next(1);
        let mut app = app(output);

        app.play("H");
        assert!(app.highlight_elapsed("H").is_none());
        assert!(app.status_text().unwrap().starts_with("Error playing H"));
    }

    #[test]
    fn test_pulse_range() {
        assert!((pulse(Duration::ZERO) - 0.5).abs() < 1e-9);
        assert!((pulse(Duration::from_millis(125)) - 1.0).abs() < 1e-9);
        for ms in (0..500).step_by(7) {
            let value = pulse(Duration::from_millis(ms));
            assert!((0.0..=1.0).contains(&value));
        }
    }
}
