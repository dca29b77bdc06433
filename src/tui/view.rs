use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::shared::DisplayState;

use super::grid::draw_pad_grid;

const HELP: &str = "space play/stop  enter toggle  +/- tempo  [ ] gain  , . cutoff  ; ' Q  f filter  c clear  s save  q quit";

pub fn render(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // transport + knobs
            Constraint::Min(4),    // pad grid
            Constraint::Length(1), // key help
        ])
        .split(area);

    draw_screen(frame, sections[0], state);
    draw_pad_grid(frame, sections[1], state);
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        sections[2],
    );
}

fn draw_screen(frame: &mut Frame, area: Rect, state: &DisplayState) {
    let transport = if state.playing {
        Span::styled("▶ PLAY", Style::default().fg(Color::Green))
    } else {
        Span::styled("■ STOP", Style::default().fg(Color::DarkGray))
    };
    let filter = if state.filter_enabled {
        format!("LPF {:>5.0} Hz  Q {:>4.1}", state.cutoff_hz, state.q)
    } else {
        format!("LPF off ({:.0} Hz)  Q {:>4.1}", state.cutoff_hz, state.q)
    };

    let mut spans = vec![
        transport,
        Span::raw(format!("   {:>5.1} BPM   GAIN {:>3.0}%   ", state.bpm, state.gain * 100.0)),
        Span::raw(filter),
        Span::raw("   "),
        Span::styled(state.display_text.clone(), Style::default().fg(Color::Yellow)),
    ];
    if state.dispatch_failures > 0 {
        spans.push(Span::styled(
            format!("   {} dropped notes", state.dispatch_failures),
            Style::default().fg(Color::Red),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::bordered().title(" drumgrid ")),
        area,
    );
}
