//! elemental - A terminal instrument that plays the periodic table.
//!
//! Every key on the computer keyboard is bound to a chemical element whose
//! pitch is its atomic number times 40.5 Hz.
//!
//! # Features
//!
//! - 118 playable elements with overlapping voices
//! - Animated key highlights while a note sounds
//! - Recording with replay and FLAC/WAV export
//!
//! # Usage
//!
//! ```bash
//! cargo run                                # Default settings
//! cargo run -- --config elemental.json     # Load settings from JSON
//! cargo run -- --output-dir recordings     # Save recordings elsewhere
//! ```
//!
//! Ctrl+R records, Ctrl+S saves, Ctrl+P plays the recording, Esc quits.

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use elemental::{ui, App, ExportFormat, InstrumentConfig, InstrumentController, NoteTable};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

/// Target frame interval (about 60 FPS).
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Command-line options for the application.
struct CliOptions {
    /// Path to a JSON configuration file.
    config: Option<PathBuf>,
    /// Directory for exported recordings.
    output_dir: Option<PathBuf>,
    /// Note length in seconds.
    duration: Option<f64>,
    /// Format of saved recordings.
    format: Option<ExportFormat>,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--config <path>` or `-c <path>`: Load settings from a JSON file
    /// - `--output-dir <path>` or `-o <path>`: Where recordings are saved
    /// - `--duration <secs>` or `-d <secs>`: Note length
    /// - `--format <flac|wav>` or `-f <flac|wav>`: Format of saved recordings
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut options = Self {
            config: None,
            output_dir: None,
            duration: None,
            format: None,
        };
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    options.config = Some(PathBuf::from(Self::value(&args, &mut i)?));
                }
                "--output-dir" | "-o" => {
                    options.output_dir = Some(PathBuf::from(Self::value(&args, &mut i)?));
                }
                "--duration" | "-d" => {
                    let value = Self::value(&args, &mut i)?;
                    let seconds = value
                        .parse()
                        .with_context(|| format!("Invalid duration: {}", value))?;
                    options.duration = Some(seconds);
                }
                "--format" | "-f" => {
                    options.format = Some(match Self::value(&args, &mut i)? {
                        "flac" => ExportFormat::Flac,
                        "wav" => ExportFormat::Wav,
                        other => anyhow::bail!("Unknown format: {} (expected flac or wav)", other),
                    });
                }
                "--help" | "-h" => {
                    eprintln!("elemental - Play the periodic table");
                    eprintln!();
                    eprintln!(
                        "Usage: {} [OPTIONS]",
                        args.first().map(String::as_str).unwrap_or("elemental")
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  -c, --config PATH      Load settings from a JSON file");
                    eprintln!("  -o, --output-dir PATH  Directory for saved recordings");
                    eprintln!("  -d, --duration SECS    Length of each note (default 0.5)");
                    eprintln!("  -f, --format FORMAT    flac (default) or wav");
                    eprintln!("  -h, --help             Print this help message");
                    std::process::exit(0);
                }
                other => {
                    anyhow::bail!("Unknown option: {} (use --help for usage)", other);
                }
            }
            i += 1;
        }

        Ok(options)
    }

    /// Returns the argument following the flag at `i`.
    fn value<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
        let flag = &args[*i];
        *i += 1;
        args.get(*i)
            .map(String::as_str)
            .with_context(|| format!("{} requires a value", flag))
    }

    /// Builds the instrument configuration, applying command-line overrides.
    fn into_config(self) -> Result<InstrumentConfig> {
        let mut config = match &self.config {
            Some(path) => InstrumentConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => InstrumentConfig::default(),
        };
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(duration) = self.duration {
            config.note_duration_secs = duration;
        }
        if let Some(format) = self.format {
            config.export_format = format;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Main entry point.
fn main() -> Result<()> {
    let config = CliOptions::parse()?.into_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if !config.output_dir.exists() {
        std::fs::create_dir_all(&config.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                config.output_dir.display()
            )
        })?;
    }

    let instrument = InstrumentController::new(NoteTable::periodic(), config);
    let mut app = App::new(instrument);

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    result
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop.
///
/// Input, note dispatch and drawing all happen here; audio and background
/// tasks never block it.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.update();

        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(FRAME_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) {
                        return Ok(());
                    }
                }
                Event::Resize(width, height) => {
                    app.set_status(format!("Resized to {}x{}", width, height));
                }
                _ => {}
            }
        }
    }
}
