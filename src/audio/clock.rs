use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::sequencer::Clock;

/// The output stream's own time: frames rendered so far over the sample rate.
/// It advances in whole callback blocks and never drifts against playback.
#[derive(Clone, Debug)]
pub struct AudioClock {
    frames: Arc<AtomicU64>,
    sample_rate: f64,
}

impl AudioClock {
    pub fn new(frames: Arc<AtomicU64>, sample_rate: u32) -> Self {
        Self {
            frames,
            sample_rate: sample_rate.max(1) as f64,
        }
    }
}

impl Clock for AudioClock {
    fn now(&self) -> f64 {
        self.frames.load(Ordering::Acquire) as f64 / self.sample_rate
    }
}
