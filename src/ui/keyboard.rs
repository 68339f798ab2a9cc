//! Element keyboard display.
//!
//! Lays the elements out in rows that fill the available width. Each key
//! shows its keyboard binding, the element symbol and its frequency, and
//! pulses towards gold while its note is sounding.

use crate::app::{key_label, pulse, App};
use crate::audio::engine::AudioOutput;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

/// Width of one key in columns.
const KEY_WIDTH: u16 = 8;

/// Height of one key in rows.
const KEY_HEIGHT: u16 = 3;

/// Gap between keys, horizontally and vertically.
const KEY_PADDING: u16 = 1;

const KEY_IDLE: (u8, u8, u8) = (176, 196, 222); // Light steel blue
const KEY_HIGHLIGHT: (u8, u8, u8) = (255, 215, 0); // Gold

/// Linear blend between the idle and highlight colors.
fn blend(amount: f64) -> Color {
    let mix = |from: u8, to: u8| {
        (from as f64 * (1.0 - amount) + to as f64 * amount)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Color::Rgb(
        mix(KEY_IDLE.0, KEY_HIGHLIGHT.0),
        mix(KEY_IDLE.1, KEY_HIGHLIGHT.1),
        mix(KEY_IDLE.2, KEY_HIGHLIGHT.2),
    )
}

/// Number of keys that fit on one row of `width` columns.
pub fn keys_per_row(width: u16) -> usize {
    (width.saturating_add(KEY_PADDING) / (KEY_WIDTH + KEY_PADDING)).max(1) as usize
}

/// Renders the element keys.
///
/// Rows that do not fit in `area` are skipped.
pub fn render_keyboard<O: AudioOutput>(frame: &mut Frame, area: Rect, app: &App<O>) {
    if area.width < KEY_WIDTH {
        return;
    }
    let per_row = keys_per_row(area.width);

    for (i, note) in app.instrument.notes().iter().enumerate() {
        let row = (i / per_row) as u16;
        let col = (i % per_row) as u16;
        let x = area.x + col * (KEY_WIDTH + KEY_PADDING);
        let y = area.y + row * (KEY_HEIGHT + KEY_PADDING);
        if y + KEY_HEIGHT > area.bottom() {
            break;
        }

        let background = match app.highlight_elapsed(&note.symbol) {
            Some(elapsed) => blend(pulse(elapsed)),
            None => blend(0.0),
        };
        let base = Style::default().fg(Color::Black).bg(background);

        let lines = vec![
            Line::from(Span::styled(
                key_label(&note.symbol).unwrap_or_default(),
                base.fg(Color::DarkGray),
            )),
            Line::from(Span::styled(
                note.symbol.clone(),
                base.add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(format!("{:.1}", note.frequency), base)),
        ];

        frame.render_widget(
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .style(base),
            Rect::new(x, y, KEY_WIDTH, KEY_HEIGHT),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_per_row() {
        assert_eq!(keys_per_row(0), 1);
        assert_eq!(keys_per_row(8), 1);
        assert_eq!(keys_per_row(17), 2);
        assert_eq!(keys_per_row(160), 17);
    }

    #[test]
    fn test_blend_endpoints() {
        assert_eq!(blend(0.0), Color::Rgb(176, 196, 222));
        assert_eq!(blend(1.0), Color::Rgb(255, 215, 0));
    }
}
