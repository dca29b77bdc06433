use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Sender, TrySendError};

use crate::audio_api::{AudioCommand, PlayParams};
use crate::sequencer::{DispatchError, SamplePlayer, SampleRef};

/// Turns start-relative trigger times into engine frames and queues them.
pub struct AudioPlayer {
    tx: Sender<AudioCommand>,
    sample_rate: f64,
    epoch_bits: AtomicU64,
}

impl AudioPlayer {
    pub fn new(tx: Sender<AudioCommand>, sample_rate: f64) -> Self {
        Self {
            tx,
            sample_rate,
            epoch_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    fn frame_for(&self, when: f64) -> u64 {
        let epoch = f64::from_bits(self.epoch_bits.load(Ordering::Relaxed));
        ((epoch + when) * self.sample_rate).round().max(0.0) as u64
    }
}

impl SamplePlayer for AudioPlayer {
    fn play(&self, sample: SampleRef, when: f64) -> Result<(), DispatchError> {
        let params = PlayParams {
            sample_id: sample,
            at_frame: self.frame_for(when),
        };
        self.tx
            .try_send(AudioCommand::Play(params))
            .map_err(|e| match e {
                TrySendError::Full(_) => DispatchError::QueueFull,
                TrySendError::Disconnected(_) => DispatchError::Disconnected,
            })
    }

    fn set_epoch(&self, start_time: f64) {
        self.epoch_bits.store(start_time.to_bits(), Ordering::Relaxed);
    }
}
