use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::shared::{InputEvent, KNOB_STEP};

// poll for a key press and resolve it into semantic input events
pub fn poll_input(timeout: Duration) -> anyhow::Result<Vec<InputEvent>> {
    if !event::poll(timeout)? {
        return Ok(vec![]);
    }

    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(vec![]);
        }
        return Ok(handle_key(key).into_iter().collect());
    }
    Ok(vec![])
}

fn handle_key(key: KeyEvent) -> Option<InputEvent> {
    let shifted = key.modifiers.contains(KeyModifiers::SHIFT);
    let event = match key.code {
        KeyCode::Esc | KeyCode::Char('q') => InputEvent::Quit,
        KeyCode::Char(' ') => InputEvent::PlayPress,
        KeyCode::Enter | KeyCode::Char('x') => InputEvent::TogglePad,

        // shift + up/down nudges tempo, plain arrows move the cursor
        KeyCode::Up if shifted => InputEvent::TempoUp,
        KeyCode::Down if shifted => InputEvent::TempoDown,
        KeyCode::Left | KeyCode::Char('h') => InputEvent::CursorLeft,
        KeyCode::Right | KeyCode::Char('l') => InputEvent::CursorRight,
        KeyCode::Up | KeyCode::Char('k') => InputEvent::CursorUp,
        KeyCode::Down | KeyCode::Char('j') => InputEvent::CursorDown,

        KeyCode::Char('+') | KeyCode::Char('=') => InputEvent::TempoUp,
        KeyCode::Char('-') => InputEvent::TempoDown,

        // knobs
        KeyCode::Char('[') => InputEvent::AdjustGain(-KNOB_STEP),
        KeyCode::Char(']') => InputEvent::AdjustGain(KNOB_STEP),
        KeyCode::Char(',') => InputEvent::AdjustCutoff(-KNOB_STEP),
        KeyCode::Char('.') => InputEvent::AdjustCutoff(KNOB_STEP),
        KeyCode::Char(';') => InputEvent::AdjustResonance(-KNOB_STEP),
        KeyCode::Char('\'') => InputEvent::AdjustResonance(KNOB_STEP),
        KeyCode::Char('f') => InputEvent::ToggleFilter,

        KeyCode::Char('c') => InputEvent::ClearPattern,
        KeyCode::Char('s') => InputEvent::Save,
        _ => return None,
    };
    Some(event)
}
