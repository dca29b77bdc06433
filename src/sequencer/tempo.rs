use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crossbeam_channel::{Receiver, Sender, TrySendError};

pub const DEFAULT_TEMPO: f64 = 120.0;

const NOTIFY_CAPACITY: usize = 64;

/// Inclusive BPM bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoRange {
    pub min: f64,
    pub max: f64,
}

impl Default for TempoRange {
    fn default() -> Self {
        Self { min: 0.0, max: 240.0 }
    }
}

impl TempoRange {
    pub fn clamp(&self, bpm: f64) -> f64 {
        bpm.clamp(self.min, self.max)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TempoChanged {
    pub tempo: f64,
}

/// Bounded tempo, written by the UI and polled by the scheduler.
///
/// The value lives in an atomic so a write is visible to the next read on
/// any thread without locking.
pub struct TempoControl {
    bpm_bits: AtomicU64,
    range: TempoRange,
    observers: Mutex<Vec<Sender<TempoChanged>>>,
}

impl TempoControl {
    pub fn new(initial: f64, range: TempoRange) -> Self {
        let initial = if initial.is_nan() { DEFAULT_TEMPO } else { initial };
        Self {
            bpm_bits: AtomicU64::new(range.clamp(initial).to_bits()),
            range,
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bpm_bits.load(Ordering::Relaxed))
    }

    /// Store `bpm` clamped to the range, notify subscribers, and return the stored value.
    /// NaN is ignored.
    pub fn set(&self, bpm: f64) -> f64 {
        if bpm.is_nan() {
            log::debug!(target: "tempo", "ignoring NaN tempo");
            return self.get();
        }
        let clamped = self.range.clamp(bpm);
        if clamped != bpm {
            log::debug!(target: "tempo", "tempo {} out of range, clamped to {}", bpm, clamped);
        }
        self.bpm_bits.store(clamped.to_bits(), Ordering::Relaxed);
        self.notify(TempoChanged { tempo: clamped });
        clamped
    }

    pub fn increase(&self) -> f64 {
        self.set(self.get() + 1.0)
    }

    pub fn decrease(&self) -> f64 {
        self.set(self.get() - 1.0)
    }

    /// Receive a `TempoChanged` for every subsequent `set`.
    pub fn subscribe(&self) -> Receiver<TempoChanged> {
        let (tx, rx) = crossbeam_channel::bounded(NOTIFY_CAPACITY);
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    fn notify(&self, event: TempoChanged) {
        let mut observers = self.observers.lock().unwrap_or_else(PoisonError::into_inner);
        // a full queue just drops the event; a dropped receiver unsubscribes
        observers.retain(|tx| !matches!(tx.try_send(event), Err(TrySendError::Disconnected(_))));
    }
}

impl Default for TempoControl {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPO, TempoRange::default())
    }
}
