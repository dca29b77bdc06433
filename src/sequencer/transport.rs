use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender};

use super::error::SchedulerError;
use super::grid::SharedGrid;
use super::scheduler::{Scheduler, SchedulerStats};

struct Worker {
    cancel_tx: Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives a `Scheduler` from its own thread: tick, wait `lookahead` (or a
/// cancel), tick again. The next wake-up is armed only after a tick returns,
/// so ticks never overlap.
pub struct Transport {
    scheduler: Arc<Mutex<Scheduler>>,
    worker: Option<Worker>,
}

impl Transport {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn stats(&self) -> SchedulerStats {
        lock(&self.scheduler).stats()
    }

    /// Start (or restart) playback. Grid problems are reported before any
    /// thread is spawned.
    pub fn start<F>(&mut self, grid: SharedGrid, on_redraw: F) -> Result<(), SchedulerError>
    where
        F: FnMut(usize) + Send + 'static,
    {
        self.stop();

        let lookahead = {
            let mut scheduler = lock(&self.scheduler);
            scheduler.start(grid, on_redraw)?;
            scheduler.config().lookahead
        };

        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(1);
        let scheduler = Arc::clone(&self.scheduler);
        let spawned = std::thread::Builder::new()
            .name("drumgrid-scheduler".into())
            .spawn(move || run_loop(&scheduler, lookahead, &cancel_rx));

        match spawned {
            Ok(handle) => {
                self.worker = Some(Worker { cancel_tx, handle });
                Ok(())
            }
            Err(e) => {
                lock(&self.scheduler).stop();
                Err(SchedulerError::Spawn(e))
            }
        }
    }

    /// Cancel the pending wake-up and wait for the worker to exit. Once this
    /// returns no further notes are dispatched. Safe to call when stopped.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.cancel_tx.send(());
            if worker.handle.join().is_err() {
                log::error!(target: "transport", "scheduler thread panicked");
            }
        }
        lock(&self.scheduler).stop();
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_loop(
    scheduler: &Mutex<Scheduler>,
    lookahead: Duration,
    cancel_rx: &crossbeam_channel::Receiver<()>,
) {
    log::debug!(target: "transport", "tick loop running every {:?}", lookahead);
    loop {
        lock(scheduler).tick();
        match cancel_rx.recv_timeout(lookahead) {
            Err(RecvTimeoutError::Timeout) => continue,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    log::debug!(target: "transport", "tick loop exited");
}

fn lock(scheduler: &Mutex<Scheduler>) -> MutexGuard<'_, Scheduler> {
    scheduler.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::audio::SampleId;
    use crate::sequencer::testing::{FakeClock, RecordingPlayer};
    use crate::sequencer::{SchedulerConfig, StepGrid, TempoControl};

    fn transport(player: Arc<RecordingPlayer>, clock: Arc<FakeClock>) -> Transport {
        let config = SchedulerConfig {
            lookahead: Duration::from_millis(2),
            ..SchedulerConfig::default()
        };
        Transport::new(Scheduler::new(
            clock,
            player,
            Arc::new(TempoControl::default()),
            config,
        ))
    }

    fn playable_grid() -> SharedGrid {
        let mut grid = StepGrid::new(16, 1);
        grid.bind_track(0, SampleId(3));
        for step in 0..16 {
            grid.set_enabled(step, 0, true);
        }
        grid.shared()
    }

    #[test]
    fn start_ticks_immediately_and_stop_halts_dispatch() {
        let player = Arc::new(RecordingPlayer::default());
        let clock = Arc::new(FakeClock::new(0.0));
        let mut transport = transport(player.clone(), clock.clone());

        transport.start(playable_grid(), |_| {}).unwrap();
        assert!(transport.is_running());
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(player.whens(), vec![0.0]);

        transport.stop();
        transport.stop();
        assert!(!transport.is_running());

        clock.advance(10.0);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(player.whens().len(), 1);
        assert_eq!(transport.stats().notes_dispatched, 1);
    }

    #[test]
    fn worker_keeps_ticking_as_clock_moves() {
        let player = Arc::new(RecordingPlayer::default());
        let clock = Arc::new(FakeClock::new(0.0));
        let mut transport = transport(player.clone(), clock.clone());
        let (redraw_tx, redraw_rx) = crossbeam_channel::unbounded();

        transport
            .start(playable_grid(), move |step| {
                let _ = redraw_tx.send(step);
            })
            .unwrap();
        clock.advance(0.5);

        let mut redraws = Vec::new();
        while redraws.len() < 5 {
            match redraw_rx.recv_timeout(Duration::from_secs(2)) {
                Ok(step) => redraws.push(step),
                Err(_) => break,
            }
        }
        transport.stop();
        assert_eq!(redraws, vec![7, 8, 9, 10, 11]);
    }

    #[test]
    fn invalid_grid_does_not_spawn() {
        let player = Arc::new(RecordingPlayer::default());
        let mut transport = transport(player, Arc::new(FakeClock::new(0.0)));
        let result = transport.start(StepGrid::new(16, 1).shared(), |_| {});
        assert!(matches!(result, Err(SchedulerError::InvalidGridState(_))));
        assert!(!transport.is_running());
    }
}
