use super::error::DispatchError;
use super::SampleRef;

/// Where the scheduler sends its note triggers.
///
/// `when` is in seconds relative to the epoch handed over in `set_epoch`,
/// which is the scheduler's own start time on the shared clock. Times in the
/// past must be accepted and played as soon as possible. Every call is a new
/// voice; a sample may overlap with itself.
pub trait SamplePlayer: Send + Sync {
    fn play(&self, sample: SampleRef, when: f64) -> Result<(), DispatchError>;

    fn set_epoch(&self, _start_time: f64) {}
}
