//! Look-ahead step sequencing: the grid, the tempo, and the scheduler that
//! turns them into sample triggers on the audio clock.

mod clock;
mod error;
mod grid;
mod player;
mod scheduler;
mod tempo;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use clock::Clock;
pub use error::{DispatchError, GridError, SchedulerError};
pub use grid::{read_grid, write_grid, SharedGrid, StepGrid};
pub use player::SamplePlayer;
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerStats};
pub use tempo::{TempoChanged, TempoControl, TempoRange, DEFAULT_TEMPO};
pub use transport::Transport;

/// Opaque handle to one playable sound, bound to a track once its buffer is registered.
pub type SampleRef = crate::audio::SampleId;
