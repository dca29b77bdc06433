pub use crate::audio::{SampleBuffer, SampleId};

/// A trigger resolved to the engine's own frame counter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayParams {
    pub sample_id: SampleId,
    pub at_frame: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    pub enabled: bool,
    pub cutoff_hz: f32,
    pub q: f32,
}

#[derive(Clone, Debug)]
pub enum AudioCommand {
    // The engine can't load files (it would stall the callback), so buffers
    // are decoded up front and handed over here before they are played.
    RegisterSample { id: SampleId, buffer: SampleBuffer },

    // Start a fresh voice at `at_frame`, or right away if that is already past.
    Play(PlayParams),

    SetGain(f32),
    SetFilter(FilterParams),
}
