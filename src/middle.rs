// The layer between the TUI and everything else: it owns the pattern, the
// tempo, the knobs and the transport, turns input events into state changes
// and engine commands, and produces the `DisplayState` the TUI draws.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};

use crate::audio_api::AudioCommand;
use crate::controls::Controls;
use crate::pipeline::project::PatternFile;
use crate::sequencer::{read_grid, write_grid, SharedGrid, TempoChanged, TempoControl, Transport};
use crate::shared::{DisplayState, InputEvent, TrackRow};

const REDRAW_QUEUE: usize = 64;

pub struct Middle {
    grid: SharedGrid,
    track_names: Vec<String>,
    tempo: Arc<TempoControl>,
    tempo_rx: Receiver<TempoChanged>,
    transport: Transport,
    controls: Controls,
    redraw_tx: Sender<usize>,
    redraw_rx: Receiver<usize>,
    cursor_step: usize,
    cursor_track: usize,
    playing_step: Option<usize>,
    bpm: f64,
    engine_drops: u64,
    status: String,
}

impl Middle {
    pub fn new(
        grid: SharedGrid,
        track_names: Vec<String>,
        tempo: Arc<TempoControl>,
        transport: Transport,
        controls: Controls,
    ) -> Self {
        let (redraw_tx, redraw_rx) = crossbeam_channel::bounded(REDRAW_QUEUE);
        let tempo_rx = tempo.subscribe();
        let bpm = tempo.get();
        let status = if track_names.is_empty() {
            "no samples loaded".to_string()
        } else {
            format!("{} tracks", track_names.len())
        };
        Self {
            grid,
            track_names,
            tempo,
            tempo_rx,
            transport,
            controls,
            redraw_tx,
            redraw_rx,
            cursor_step: 0,
            cursor_track: 0,
            playing_step: None,
            bpm,
            engine_drops: 0,
            status,
        }
    }

    /// Engine commands matching the current knob positions.
    pub fn control_commands(&self) -> Vec<AudioCommand> {
        self.controls.commands()
    }

    pub fn handle_input(&mut self, event: InputEvent) -> Vec<AudioCommand> {
        let (steps, tracks) = {
            let g = read_grid(&self.grid);
            (g.sequence_length(), g.track_count())
        };

        match event {
            InputEvent::CursorLeft => self.cursor_step = wrap_dec(self.cursor_step, steps),
            InputEvent::CursorRight => self.cursor_step = wrap_inc(self.cursor_step, steps),
            InputEvent::CursorUp => self.cursor_track = wrap_dec(self.cursor_track, tracks),
            InputEvent::CursorDown => self.cursor_track = wrap_inc(self.cursor_track, tracks),
            InputEvent::TogglePad => {
                write_grid(&self.grid).toggle(self.cursor_step, self.cursor_track);
            }
            InputEvent::PlayPress => self.toggle_playback(),
            InputEvent::TempoUp => {
                self.tempo.increase();
            }
            InputEvent::TempoDown => {
                self.tempo.decrease();
            }
            InputEvent::AdjustGain(d) => return vec![self.controls.adjust_gain(d)],
            InputEvent::AdjustCutoff(d) => return vec![self.controls.adjust_cutoff(d)],
            InputEvent::AdjustResonance(d) => return vec![self.controls.adjust_q(d)],
            InputEvent::ToggleFilter => return vec![self.controls.toggle_filter()],
            InputEvent::ClearPattern => {
                write_grid(&self.grid).clear();
                self.status = "pattern cleared".to_string();
            }
            // handled by the main loop
            InputEvent::Save | InputEvent::Quit => {}
        }
        vec![]
    }

    fn toggle_playback(&mut self) {
        if self.transport.is_running() {
            self.transport.stop();
            self.playing_step = None;
            self.status = "stopped".to_string();
            return;
        }

        // playhead positions left over from the previous run
        while self.redraw_rx.try_recv().is_ok() {}

        let redraw_tx = self.redraw_tx.clone();
        let result = self.transport.start(Arc::clone(&self.grid), move |step| {
            // a slow UI loses a frame of playhead, never blocks the scheduler
            let _ = redraw_tx.try_send(step);
        });
        match result {
            Ok(()) => self.status = "playing".to_string(),
            Err(e) => {
                log::warn!(target: "middle", "could not start playback: {}", e);
                self.status = e.to_string();
            }
        }
    }

    /// Pull in what happened since the last frame: playhead moves and tempo changes.
    pub fn tick(&mut self) {
        while let Ok(step) = self.redraw_rx.try_recv() {
            if self.transport.is_running() {
                self.playing_step = Some(step);
            }
        }
        while let Ok(TempoChanged { tempo }) = self.tempo_rx.try_recv() {
            self.bpm = tempo;
        }
    }

    /// Triggers the engine dropped after they were dispatched; shown together
    /// with the scheduler's own dispatch failures.
    pub fn set_engine_drops(&mut self, count: u64) {
        self.engine_drops = count;
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = text.into();
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.transport.is_running()
    }

    pub fn display_state(&self) -> DisplayState {
        let g = read_grid(&self.grid);
        let tracks = self
            .track_names
            .iter()
            .enumerate()
            .take(g.track_count())
            .map(|(track, name)| TrackRow {
                name: name.clone(),
                steps: (0..g.sequence_length()).map(|s| g.is_enabled(s, track)).collect(),
            })
            .collect();

        DisplayState {
            tracks,
            sequence_length: g.sequence_length(),
            cursor_step: self.cursor_step,
            cursor_track: self.cursor_track,
            playing_step: self.playing_step,
            playing: self.transport.is_running(),
            bpm: self.bpm,
            gain: self.controls.gain(),
            filter_enabled: self.controls.filter_enabled(),
            cutoff_hz: self.controls.cutoff_hz(),
            q: self.controls.q(),
            dispatch_failures: self.transport.stats().dispatch_failures + self.engine_drops,
            display_text: self.status.clone(),
        }
    }

    pub fn pattern_snapshot(&self) -> PatternFile {
        PatternFile::capture(
            &read_grid(&self.grid),
            &self.track_names,
            self.tempo.get(),
            self.controls.state(),
        )
    }

    /// Load a saved pattern: pads, tempo and knobs. Returns the engine
    /// commands for the restored knob positions.
    pub fn restore(&mut self, pattern: &PatternFile) -> Vec<AudioCommand> {
        let restored = pattern.apply_to(&mut write_grid(&self.grid), &self.track_names);
        self.bpm = self.tempo.set(pattern.tempo);
        self.controls.restore(&pattern.controls);
        self.status = format!("restored {} of {} tracks", restored, pattern.tracks.len());
        self.controls.commands()
    }

    pub fn stop(&mut self) {
        self.transport.stop();
        self.playing_step = None;
    }
}

fn wrap_inc(i: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (i + 1) % len }
}

fn wrap_dec(i: usize, len: usize) -> usize {
    if len == 0 { 0 } else { (i + len - 1) % len }
}
