use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::shared::DisplayState;

const NAME_WIDTH: usize = 12;

// one line per track, one cell per step; the playhead column and the cursor
// are drawn on top of the pad state
pub fn draw_pad_grid(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let mut lines = vec![step_ruler(state)];
    for (track, row) in state.tracks.iter().enumerate() {
        let mut spans = vec![Span::styled(
            format!("{:<width$} ", truncate(&row.name, NAME_WIDTH), width = NAME_WIDTH),
            Style::default().fg(Color::Gray),
        )];
        for (step, &on) in row.steps.iter().enumerate() {
            let is_cursor = step == state.cursor_step && track == state.cursor_track;
            let is_playhead = state.playing_step == Some(step);
            spans.push(Span::styled(pad_glyph(on), pad_style(on, step, is_playhead, is_cursor)));
        }
        lines.push(Line::from(spans));
    }
    if state.tracks.is_empty() {
        lines.push(Line::from(Span::styled(
            "no .wav files in the kit directory",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(Block::bordered().title(" pattern ")), area);
}

fn step_ruler(state: &DisplayState) -> Line<'static> {
    let mut spans = vec![Span::raw(" ".repeat(NAME_WIDTH + 1))];
    for step in 0..state.sequence_length {
        let label = if step % 4 == 0 { format!("{:<3}", step + 1) } else { "   ".to_string() };
        let style = if state.playing_step == Some(step) {
            Style::default().fg(Color::LightMagenta).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(label, style));
    }
    Line::from(spans)
}

fn pad_glyph(on: bool) -> &'static str {
    if on { "[#]" } else { "[ ]" }
}

fn pad_style(on: bool, step: usize, is_playhead: bool, is_cursor: bool) -> Style {
    let mut style = match (on, is_playhead) {
        (true, true) => Style::default().fg(Color::White).bg(Color::Magenta),
        (true, false) => Style::default().fg(Color::LightMagenta),
        (false, true) => Style::default().fg(Color::Magenta),
        // beat boundaries a little brighter
        (false, false) if step % 4 == 0 => Style::default().fg(Color::Gray),
        (false, false) => Style::default().fg(Color::DarkGray),
    };
    if is_cursor {
        style = style.add_modifier(Modifier::REVERSED);
    }
    style
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
