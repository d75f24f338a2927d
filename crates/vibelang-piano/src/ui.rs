//! TUI rendering for the piano
//!
//! Draws the key records produced by the layout engine into terminal cells.
//! A cell belongs to a key when the cell's center lies inside the key, the
//! same rule mouse clicks are hit-tested with. White keys are drawn first and
//! black keys on top of them.

use crate::config::Theme;
use crate::controller::KeyboardController;
use crate::keymap::OctaveMode;
use crate::layout::{self, Key};
use crate::note::Note;
use ratatui::prelude::*;
use ratatui::widgets::Widget;
use std::ops::Range;

/// Piano widget for rendering in ratatui
pub struct KeyboardWidget<'a> {
    controller: &'a KeyboardController,
    theme: Theme,
}

impl<'a> KeyboardWidget<'a> {
    /// Create a new piano widget
    pub fn new(controller: &'a KeyboardController) -> Self {
        Self {
            controller,
            theme: Theme::default(),
        }
    }

    /// Set the theme
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}

impl<'a> Widget for KeyboardWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Black keys go on top
        for key in self.controller.white_keys().chain(self.controller.black_keys()) {
            draw_key(buf, area, key, &self.theme);
        }
        if self.theme.show_note_names {
            for key in self.controller.keys() {
                draw_key_labels(buf, area, key, self.controller, &self.theme);
            }
        }

        if self.theme.show_help {
            let help = Line::styled(help_text(self.controller), Style::default().fg(self.theme.text()));
            help.render(Rect { height: 1, ..area }, buf);
        }

        let status = Line::from(vec![
            Span::styled("Playing: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                playing_text(&self.controller.pressed_notes()),
                Style::default().fg(self.theme.text()).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("   [{}]", self.controller.player_name()),
                Style::default().fg(Color::DarkGray),
            ),
        ]);
        status.render(
            Rect {
                y: area.bottom() - 1,
                height: 1,
                ..area
            },
            buf,
        );
    }
}

/// Render the piano over the whole frame
pub fn render_piano(frame: &mut Frame, controller: &KeyboardController, theme: &Theme) {
    let area = frame.area();
    frame.render_widget(KeyboardWidget::new(controller).theme(theme.clone()), area);
}

/// Top status line, e.g. "Shift + key: octave up | K = C5 | Esc quit"
pub fn help_text(controller: &KeyboardController) -> String {
    let mut parts = vec!["Shift + key: octave up".to_string()];
    let input_map = controller.input_map();
    for binding in input_map.bindings() {
        if let OctaveMode::Fixed(octave) = binding.octave {
            parts.push(format!("{} = {}", binding.display_char, Note::new(binding.letter, octave)));
        }
    }
    parts.push("Esc quit".to_string());
    parts.join(" | ")
}

/// Pressed notes as text, "-" when nothing is pressed
pub fn playing_text(notes: &[Note]) -> String {
    if notes.is_empty() {
        "-".to_string()
    } else {
        notes.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" ")
    }
}

/// Cells whose centers fall in `[start, end)`, clipped to `0..limit`
fn cell_span(start: f32, end: f32, limit: u16) -> Range<u16> {
    let first = (start - 0.5).ceil().max(0.0) as u16;
    let last = ((end - 0.5).ceil().max(0.0) as u16).min(limit);
    first.min(last)..last
}

fn key_cells(bounds: &layout::Rect, area: Rect) -> (Range<u16>, Range<u16>) {
    (
        cell_span(bounds.x, bounds.right(), area.width),
        cell_span(bounds.y, bounds.bottom(), area.height),
    )
}

fn draw_key(buf: &mut Buffer, area: Rect, key: &Key, theme: &Theme) {
    let (columns, rows) = key_cells(&key.bounds, area);
    let fill = Style::default().bg(theme.key_color(key.is_black, key.is_pressed));
    let edge = fill.fg(theme.border());

    for row in rows {
        for column in columns.clone() {
            if let Some(cell) = buf.cell_mut((area.x + column, area.y + row)) {
                // Left edge of each white key separates it from its neighbour
                let symbol = if !key.is_black && column == columns.start { "▏" } else { " " };
                cell.set_symbol(symbol).set_style(if symbol == " " { fill } else { edge });
            }
        }
    }
}

fn draw_key_labels(
    buf: &mut Buffer,
    area: Rect,
    key: &Key,
    controller: &KeyboardController,
    theme: &Theme,
) {
    let (columns, rows) = key_cells(&key.bounds, area);
    if rows.is_empty() || columns.is_empty() {
        return;
    }
    let bottom = rows.end - 1;
    let style = Style::default()
        .bg(theme.key_color(key.is_black, key.is_pressed))
        .fg(if key.is_black { Color::Gray } else { Color::Black });

    let mut labels = Vec::new();
    if let Some(c) = controller.input_map().label_for(key.note) {
        labels.push(c.to_string());
    }
    if !key.is_black {
        labels.push(key.note.to_string());
    }

    // Stack labels upwards from the bottom row of the key
    for (offset, label) in labels.iter().rev().enumerate() {
        let Some(row) = bottom.checked_sub(offset as u16) else {
            break;
        };
        if row < rows.start || (key.is_black && offset > 0) {
            break;
        }
        // Keep white labels clear of the edge marker
        let inner = if key.is_black { columns.clone() } else { columns.start + 1..columns.end };
        let width = inner.len();
        if width < label.len() {
            continue;
        }
        let x = inner.start + ((width - label.len()) / 2) as u16;
        buf.set_stringn(area.x + x, area.y + row, label, width, style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentPlayer;
    use crate::controller::PianoConfig;
    use crate::layout::Point;

    fn piano(width: u16, height: u16) -> KeyboardController {
        KeyboardController::new(PianoConfig::default(), Box::new(SilentPlayer), width as u32, height as u32)
            .unwrap()
    }

    fn render(controller: &KeyboardController, width: u16, height: u16) -> Buffer {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        KeyboardWidget::new(controller).render(area, &mut buf);
        buf
    }

    fn row_text(buf: &Buffer, row: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf.cell((x, row)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn test_cell_span() {
        assert_eq!(cell_span(3.5, 6.5, 80), 3..6);
        assert_eq!(cell_span(0.0, 5.0, 80), 0..5);
        assert_eq!(cell_span(75.0, 90.0, 80), 75..80);
        assert_eq!(cell_span(-4.0, -1.0, 80), 0..0);
    }

    #[test]
    fn test_black_keys_drawn_over_white() {
        let controller = piano(80, 24);
        let buf = render(&controller, 80, 24);

        // C#4 covers columns 3..6 on the top rows of the keys
        assert_eq!(buf.cell((4, 3)).unwrap().bg, Color::Black);
        // Below the black keys the C4 key shows through
        assert_eq!(buf.cell((4, 18)).unwrap().bg, Color::White);
        // Status margin stays untouched by keys
        assert_eq!(buf.cell((4, 0)).unwrap().bg, Color::Reset);
    }

    #[test]
    fn test_drawn_cells_match_hit_test() {
        let mut controller = piano(80, 24);
        let buf = render(&controller, 80, 24);

        for (column, row) in [(4u16, 3u16), (12, 10), (33, 20), (2, 5)] {
            let bg = buf.cell((column, row)).unwrap().bg;
            let note = controller.on_pointer_down(Point::cell_center(column, row)).unwrap();
            let key = controller.key_for_note(note).unwrap();
            let expected = if key.is_black { Color::Black } else { Color::White };
            assert_eq!(bg, expected, "cell ({}, {}) hit {}", column, row, note);
            controller.on_pointer_up();
        }
    }

    #[test]
    fn test_pressed_key_color_and_status() {
        let mut controller = piano(80, 24);
        controller.on_key_down('d', false);
        let buf = render(&controller, 80, 24);

        // E4 spans columns 10..15
        assert_eq!(buf.cell((12, 18)).unwrap().bg, Color::Gray);
        assert!(row_text(&buf, 23).starts_with("Playing: E4"));
        assert!(row_text(&buf, 0).starts_with("Shift + key: octave up | K = C5 | Esc quit"));
    }

    #[test]
    fn test_labels() {
        let controller = piano(140, 24);
        let buf = render(&controller, 140, 24);

        let note_row = row_text(&buf, 21);
        assert!(note_row.contains("C4"));
        assert!(note_row.contains("B5"));
        let key_row = row_text(&buf, 20);
        assert!(key_row.contains('A'));
        assert!(key_row.contains('K'));
    }

    #[test]
    fn test_narrow_terminal_hides_black_keys() {
        // 20 columns leave one cell per white key
        let mut controller = piano(20, 24);
        let buf = render(&controller, 20, 24);

        assert_eq!(controller.black_keys().count(), 10);
        for column in 0..14 {
            assert_eq!(buf.cell((column, 5)).unwrap().bg, Color::White);
        }
        let note = controller.on_pointer_down(Point::cell_center(0, 5)).unwrap();
        assert_eq!(note, "C4".parse().unwrap());
    }

    #[test]
    fn test_playing_text() {
        assert_eq!(playing_text(&[]), "-");
        let notes = ["C4".parse().unwrap(), "G#4".parse().unwrap()];
        assert_eq!(playing_text(&notes), "C4 G#4");
    }
}
