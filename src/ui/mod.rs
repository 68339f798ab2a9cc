//! Terminal user interface components.
//!
//! This module draws the title bar with the recording indicator, the
//! element keyboard and the status/help line.

mod keyboard;

use crate::app::App;
use crate::audio::engine::AudioOutput;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub use keyboard::render_keyboard;

/// Window title.
pub const TITLE: &str = "Elemental Harmonics";

/// Renders the complete UI.
///
/// The layout is divided into:
/// - Top: Title and recording indicator
/// - Center: Element keyboard
/// - Bottom: Status message and key help
pub fn render<O: AudioOutput>(frame: &mut Frame, app: &App<O>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(4),    // Keyboard
            Constraint::Length(3), // Status + help
        ])
        .split(frame.area());

    render_title(frame, chunks[0], app);

    let keyboard_area = Rect {
        x: chunks[1].x + 1,
        y: chunks[1].y,
        width: chunks[1].width.saturating_sub(2),
        height: chunks[1].height,
    };
    render_keyboard(frame, keyboard_area, app);

    render_status(frame, chunks[2], app);
}

fn render_title<O: AudioOutput>(frame: &mut Frame, area: Rect, app: &App<O>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    frame.render_widget(
        Paragraph::new(Span::styled(
            TITLE,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        inner,
    );

    if app.instrument.is_recording() {
        let timeline = app.instrument.timeline();
        let indicator = format!(
            "● REC {} notes {:.1}s ",
            timeline.len(),
            timeline.duration().as_secs_f64()
        );
        frame.render_widget(
            Paragraph::new(Span::styled(
                indicator,
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Right),
            inner,
        );
    }
}

fn render_status<O: AudioOutput>(frame: &mut Frame, area: Rect, app: &App<O>) {
    let key_style = Style::default().fg(Color::Yellow);
    let desc_style = Style::default().fg(Color::DarkGray);

    let status = Line::from(Span::styled(
        app.status_text().unwrap_or_default().to_string(),
        Style::default().fg(Color::Rgb(255, 165, 0)),
    ))
    .alignment(Alignment::Center);

    let help = Line::from(vec![
        Span::styled("[^R]", key_style),
        Span::styled(" Record  ", desc_style),
        Span::styled("[^S]", key_style),
        Span::styled(" Save  ", desc_style),
        Span::styled("[^P]", key_style),
        Span::styled(" Play  ", desc_style),
        Span::styled("[Esc]", key_style),
        Span::styled(" Quit", desc_style),
    ])
    .alignment(Alignment::Center);

    frame.render_widget(Paragraph::new(vec![status, help]), area);
}
