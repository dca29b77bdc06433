use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::GridError;
use super::SampleRef;

/// One pad: a step of one track.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub enabled: bool,
    pub sample: Option<SampleRef>,
}

/// `sequence_length` rows of `track_count` cells each. The shape never
/// changes after construction, only the `enabled` flags do.
#[derive(Clone, Debug)]
pub struct StepGrid {
    rows: Vec<Vec<Cell>>,
    track_count: usize,
}

/// Written by the UI, read by the scheduler once per step.
pub type SharedGrid = Arc<RwLock<StepGrid>>;

impl StepGrid {
    pub fn new(sequence_length: usize, track_count: usize) -> Self {
        Self {
            rows: vec![vec![Cell::default(); track_count]; sequence_length],
            track_count,
        }
    }

    pub fn shared(self) -> SharedGrid {
        Arc::new(RwLock::new(self))
    }

    pub fn sequence_length(&self) -> usize {
        self.rows.len()
    }

    pub fn track_count(&self) -> usize {
        self.track_count
    }

    /// Cells of a step, one per track. Indices wrap around the sequence.
    pub fn row_at(&self, step: usize) -> &[Cell] {
        match self.rows.len() {
            0 => &[],
            len => &self.rows[step % len],
        }
    }

    /// Samples of the enabled cells of a step, in track order.
    pub fn enabled_samples(&self, step: usize) -> Vec<SampleRef> {
        self.row_at(step)
            .iter()
            .filter(|cell| cell.enabled)
            .filter_map(|cell| cell.sample)
            .collect()
    }

    /// Bind a sample to every cell of a track. Returns false for an unknown track.
    pub fn bind_track(&mut self, track: usize, sample: SampleRef) -> bool {
        if track >= self.track_count {
            return false;
        }
        for row in &mut self.rows {
            row[track].sample = Some(sample);
        }
        true
    }

    pub fn track_sample(&self, track: usize) -> Option<SampleRef> {
        self.rows.first()?.get(track)?.sample
    }

    pub fn is_enabled(&self, step: usize, track: usize) -> bool {
        self.rows
            .get(step)
            .and_then(|row| row.get(track))
            .is_some_and(|cell| cell.enabled)
    }

    /// Flip a pad, returning its new state (None when out of range).
    pub fn toggle(&mut self, step: usize, track: usize) -> Option<bool> {
        let cell = self.rows.get_mut(step)?.get_mut(track)?;
        cell.enabled = !cell.enabled;
        Some(cell.enabled)
    }

    pub fn set_enabled(&mut self, step: usize, track: usize, enabled: bool) {
        if let Some(cell) = self.rows.get_mut(step).and_then(|row| row.get_mut(track)) {
            cell.enabled = enabled;
        }
    }

    pub fn clear(&mut self) {
        for cell in self.rows.iter_mut().flatten() {
            cell.enabled = false;
        }
    }

    /// A grid is playable once it has steps, tracks, and a sample on every track.
    pub fn validate(&self) -> Result<(), GridError> {
        if self.rows.is_empty() {
            return Err(GridError::EmptySequence);
        }
        if self.track_count == 0 {
            return Err(GridError::NoTracks);
        }
        match (0..self.track_count).find(|&t| self.track_sample(t).is_none()) {
            Some(track) => Err(GridError::UnboundTrack(track)),
            None => Ok(()),
        }
    }
}

// A panic while holding the lock leaves the flags in a usable state, so
// poisoning is ignored rather than propagated into the scheduler.
pub fn read_grid(grid: &SharedGrid) -> RwLockReadGuard<'_, StepGrid> {
    grid.read().unwrap_or_else(PoisonError::into_inner)
}

pub fn write_grid(grid: &SharedGrid) -> RwLockWriteGuard<'_, StepGrid> {
    grid.write().unwrap_or_else(PoisonError::into_inner)
}
