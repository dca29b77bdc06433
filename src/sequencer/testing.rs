//! Deterministic collaborators for scheduler tests.

use std::sync::Mutex;

use super::{Clock, DispatchError, SamplePlayer, SampleRef};

/// Clock that only moves when told to.
pub struct FakeClock {
    now: Mutex<f64>,
}

impl FakeClock {
    pub fn new(origin: f64) -> Self {
        Self { now: Mutex::new(origin) }
    }

    pub fn advance(&self, secs: f64) {
        *self.now.lock().unwrap() += secs;
    }
}

impl Clock for FakeClock {
    fn now(&self) -> f64 {
        *self.now.lock().unwrap()
    }
}

/// Records every accepted `play`; rejects one chosen sample.
#[derive(Default)]
pub struct RecordingPlayer {
    calls: Mutex<Vec<(SampleRef, f64)>>,
    epoch: Mutex<Option<f64>>,
    failing: Mutex<Option<SampleRef>>,
}

impl RecordingPlayer {
    pub fn fail_on(&self, sample: SampleRef) {
        *self.failing.lock().unwrap() = Some(sample);
    }

    pub fn calls(&self) -> Vec<(SampleRef, f64)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn whens(&self) -> Vec<f64> {
        self.calls().into_iter().map(|(_, when)| when).collect()
    }

    pub fn epoch(&self) -> Option<f64> {
        *self.epoch.lock().unwrap()
    }
}

impl SamplePlayer for RecordingPlayer {
    fn play(&self, sample: SampleRef, when: f64) -> Result<(), DispatchError> {
        if *self.failing.lock().unwrap() == Some(sample) {
            return Err(DispatchError::QueueFull);
        }
        self.calls.lock().unwrap().push((sample, when));
        Ok(())
    }

    fn set_epoch(&self, start_time: f64) {
        *self.epoch.lock().unwrap() = Some(start_time);
    }
}
