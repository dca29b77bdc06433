// Master gain, low-pass filter and resonance, as knob positions that turn
// into engine commands.

use crate::audio::{MAX_Q, MIN_CUTOFF_HZ, MIN_Q};
use crate::audio_api::{AudioCommand, FilterParams};
use crate::pipeline::project::ControlsState;

pub const DEFAULT_GAIN: f32 = 1.0;
pub const DEFAULT_CUTOFF_HZ: f32 = 440.0;
pub const DEFAULT_Q: f32 = 1.0;

// one knob nudge moves Q this many times further than the other knobs
const Q_KNOB_SCALE: f32 = 10.0;

/// Exponential knob law: position 1.0 is `max_hz`, each step down in
/// position divides the frequency evenly across the octaves above `MIN_CUTOFF_HZ`.
pub fn cutoff_for_knob(position: f32, max_hz: f32) -> f32 {
    let octaves = (max_hz / MIN_CUTOFF_HZ).log2();
    max_hz * 2f32.powf(octaves * (position.clamp(0.0, 1.0) - 1.0))
}

pub fn knob_for_cutoff(hz: f32, max_hz: f32) -> f32 {
    let octaves = (max_hz / MIN_CUTOFF_HZ).log2();
    if octaves <= 0.0 {
        return 1.0;
    }
    (1.0 + (hz.max(MIN_CUTOFF_HZ) / max_hz).log2() / octaves).clamp(0.0, 1.0)
}

#[derive(Clone, Debug)]
pub struct Controls {
    gain: f32,
    filter_enabled: bool,
    cutoff_knob: f32,
    q: f32,
    max_cutoff: f32,
}

impl Controls {
    pub fn new(sample_rate: u32) -> Self {
        let max_cutoff = sample_rate as f32 / 2.0;
        Self {
            gain: DEFAULT_GAIN,
            filter_enabled: false,
            cutoff_knob: knob_for_cutoff(DEFAULT_CUTOFF_HZ, max_cutoff),
            q: DEFAULT_Q,
            max_cutoff,
        }
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn filter_enabled(&self) -> bool {
        self.filter_enabled
    }

    pub fn cutoff_hz(&self) -> f32 {
        cutoff_for_knob(self.cutoff_knob, self.max_cutoff)
    }

    pub fn q(&self) -> f32 {
        self.q
    }

    pub fn adjust_gain(&mut self, delta: f32) -> AudioCommand {
        self.gain = (self.gain + delta).clamp(0.0, 1.0);
        AudioCommand::SetGain(self.gain)
    }

    pub fn toggle_filter(&mut self) -> AudioCommand {
        self.filter_enabled = !self.filter_enabled;
        log::debug!(target: "controls", "filter enabled: {}", self.filter_enabled);
        AudioCommand::SetFilter(self.filter_params())
    }

    pub fn adjust_cutoff(&mut self, delta: f32) -> AudioCommand {
        self.cutoff_knob = (self.cutoff_knob + delta).clamp(0.0, 1.0);
        AudioCommand::SetFilter(self.filter_params())
    }

    pub fn adjust_q(&mut self, delta: f32) -> AudioCommand {
        self.q = (self.q + delta * Q_KNOB_SCALE).clamp(MIN_Q, MAX_Q);
        AudioCommand::SetFilter(self.filter_params())
    }

    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            enabled: self.filter_enabled,
            cutoff_hz: self.cutoff_hz(),
            q: self.q,
        }
    }

    /// Everything the engine needs to match these controls.
    pub fn commands(&self) -> Vec<AudioCommand> {
        vec![
            AudioCommand::SetGain(self.gain),
            AudioCommand::SetFilter(self.filter_params()),
        ]
    }

    pub fn state(&self) -> ControlsState {
        ControlsState {
            gain: self.gain,
            filter_enabled: self.filter_enabled,
            cutoff_hz: self.cutoff_hz(),
            q: self.q,
        }
    }

    pub fn restore(&mut self, state: &ControlsState) {
        self.gain = state.gain.clamp(0.0, 1.0);
        self.filter_enabled = state.filter_enabled;
        self.cutoff_knob = knob_for_cutoff(state.cutoff_hz, self.max_cutoff);
        self.q = state.q.clamp(MIN_Q, MAX_Q);
    }
}
