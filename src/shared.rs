// Keys (see tui/input.rs):
//
//   arrows / h j k l   //  move the pad cursor
//   Enter / x          //  TogglePad at the cursor
//   Space              //  PlayPress (start / stop)
//   + / -              //  TempoUp / TempoDown, one BPM at a time
//   ↑ / ↓ with Shift   //  same as + / -
//   [ / ]              //  AdjustGain
//   , / .              //  AdjustCutoff
//   ; / '              //  AdjustResonance
//   f                  //  ToggleFilter
//   c                  //  ClearPattern
//   s                  //  Save
//   Esc / q            //  Quit
//
// The middle layer owns the sequencer and knob state and hands the TUI a
// `DisplayState` each frame. The TUI only draws what it is given.

/// Upper bound on kit size; one track per sample.
pub const MAX_TRACKS: usize = 16;

/// Knob travel per key press, in normalized units.
pub const KNOB_STEP: f32 = 0.05;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    CursorLeft,
    CursorRight,
    CursorUp,
    CursorDown,
    TogglePad,

    PlayPress,
    TempoUp,
    TempoDown,

    AdjustGain(f32),
    AdjustCutoff(f32),
    AdjustResonance(f32),
    ToggleFilter,

    ClearPattern,
    Save,
    Quit,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackRow {
    pub name: String,
    pub steps: Vec<bool>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayState {
    pub tracks: Vec<TrackRow>,
    pub sequence_length: usize,
    pub cursor_step: usize,
    pub cursor_track: usize,
    pub playing_step: Option<usize>, // where the playhead marker is drawn
    pub playing: bool,
    pub bpm: f64,
    pub gain: f32,
    pub filter_enabled: bool,
    pub cutoff_hz: f32,
    pub q: f32,
    pub dispatch_failures: u64,
    pub display_text: String, // last status / error message
}
