// Look-ahead scheduling: a coarse timer wakes the scheduler every
// `lookahead`, and each wake-up commits every note due within the next
// `schedule_ahead` seconds to the audio clock at its exact time. As long as
// `schedule_ahead > lookahead` a late wake-up still schedules its notes
// before they become audible, and the catch-up loop replays any steps a long
// stall skipped over at their original times.

use std::sync::Arc;
use std::time::Duration;

use super::clock::Clock;
use super::error::SchedulerError;
use super::grid::{read_grid, SharedGrid};
use super::player::SamplePlayer;
use super::tempo::TempoControl;
use super::SampleRef;

pub const DEFAULT_LOOKAHEAD: Duration = Duration::from_millis(25);
pub const DEFAULT_SCHEDULE_AHEAD: f64 = 0.1;
/// Steps the playhead display runs ahead of the scheduling pointer, matching
/// the default lookahead tuning.
pub const DEFAULT_VISUAL_LEAD_STEPS: usize = 7;

/// Floor for the step length computation. A tempo at or below zero never
/// reaches `advance` (the cursor is held instead), this only guards the division.
const MIN_EFFECTIVE_BPM: f64 = 1e-3;

/// One step is a 16th note.
const BEATS_PER_STEP: f64 = 0.25;

/// Marker value no note time can take.
const NOT_DRAWN: f64 = -1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Interval between wake-ups.
    pub lookahead: Duration,
    /// Horizon, in seconds, within which due notes are dispatched.
    pub schedule_ahead: f64,
    pub visual_lead_steps: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_LOOKAHEAD,
            schedule_ahead: DEFAULT_SCHEDULE_AHEAD,
            visual_lead_steps: DEFAULT_VISUAL_LEAD_STEPS,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub notes_dispatched: u64,
    pub dispatch_failures: u64,
}

type RedrawFn = Box<dyn FnMut(usize) + Send>;

enum RunState {
    Idle,
    Running(Session),
}

struct Session {
    grid: SharedGrid,
    on_redraw: RedrawFn,
    sequence_length: usize,
    start_time: f64,
    current_step: usize,
    next_note_time: f64,
    last_draw_time: f64,
    // the note at `next_note_time` already played and tempo was 0 when it
    // came time to advance past it
    held: bool,
}

impl Session {
    fn active_samples(&self) -> Vec<SampleRef> {
        read_grid(&self.grid).enabled_samples(self.current_step)
    }

    // Tempo is read by the caller right here, per step, so a change lands on
    // the very next step boundary.
    fn advance(&mut self, bpm: f64) {
        let seconds_per_beat = 60.0 / bpm.max(MIN_EFFECTIVE_BPM);
        self.next_note_time += BEATS_PER_STEP * seconds_per_beat;
        self.current_step = (self.current_step + 1) % self.sequence_length;
    }
}

pub struct Scheduler {
    clock: Arc<dyn Clock>,
    player: Arc<dyn SamplePlayer>,
    tempo: Arc<TempoControl>,
    config: SchedulerConfig,
    state: RunState,
    stats: SchedulerStats,
}

impl Scheduler {
    pub fn new(
        clock: Arc<dyn Clock>,
        player: Arc<dyn SamplePlayer>,
        tempo: Arc<TempoControl>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            clock,
            player,
            tempo,
            config,
            state: RunState::Idle,
            stats: SchedulerStats::default(),
        }
    }

    pub fn config(&self) -> SchedulerConfig {
        self.config
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RunState::Running(_))
    }

    /// Begin playback from step 0 at the current clock time.
    ///
    /// Fails without changing state when the grid is not playable. Starting
    /// while already running restarts from the top.
    pub fn start<F>(&mut self, grid: SharedGrid, on_redraw: F) -> Result<(), SchedulerError>
    where
        F: FnMut(usize) + Send + 'static,
    {
        let sequence_length = {
            let g = read_grid(&grid);
            g.validate()?;
            g.sequence_length()
        };

        let start_time = self.clock.now();
        self.player.set_epoch(start_time);
        self.state = RunState::Running(Session {
            grid,
            on_redraw: Box::new(on_redraw),
            sequence_length,
            start_time,
            current_step: 0,
            next_note_time: 0.0,
            last_draw_time: NOT_DRAWN,
            held: false,
        });
        log::info!(target: "scheduler", "started at clock {:.3}s, {} steps", start_time, sequence_length);
        Ok(())
    }

    pub fn stop(&mut self) {
        if let RunState::Running(session) = &self.state {
            log::info!(target: "scheduler", "stopped at step {}", session.current_step);
        }
        self.state = RunState::Idle;
    }

    /// Dispatch every note due before `now + schedule_ahead` and advance the
    /// cursor past them. Returns the number of steps processed; 0 when idle.
    pub fn tick(&mut self) -> usize {
        let RunState::Running(session) = &mut self.state else {
            return 0;
        };

        let current_time = self.clock.now() - session.start_time;
        let horizon = current_time + self.config.schedule_ahead;
        let mut processed = 0;

        if session.held {
            let bpm = self.tempo.get();
            if bpm <= 0.0 {
                return 0;
            }
            // time spent at 0 BPM is not replayed: the next step follows now
            session.held = false;
            session.next_note_time = session.next_note_time.max(current_time);
            session.advance(bpm);
            log::debug!(target: "scheduler", "resumed at step {}", session.current_step);
        }

        let mut active = session.active_samples();
        while session.next_note_time < horizon {
            for &sample in &active {
                match self.player.play(sample, session.next_note_time) {
                    Ok(()) => self.stats.notes_dispatched += 1,
                    Err(e) => {
                        self.stats.dispatch_failures += 1;
                        log::warn!(
                            target: "scheduler",
                            "playback dispatch failure for sample {:?} at {:.3}s: {}",
                            sample, session.next_note_time, e
                        );
                    }
                }
            }

            if session.next_note_time != session.last_draw_time {
                session.last_draw_time = session.next_note_time;
                let display_step =
                    (session.current_step + self.config.visual_lead_steps) % session.sequence_length;
                (session.on_redraw)(display_step);
            }

            processed += 1;

            let bpm = self.tempo.get();
            if bpm <= 0.0 {
                session.held = true;
                log::debug!(target: "scheduler", "tempo is 0, holding at step {}", session.current_step);
                break;
            }
            session.advance(bpm);
            active = session.active_samples();
        }

        if processed > 1 {
            log::debug!(target: "scheduler", "caught up {} steps in one tick", processed);
        }
        processed
    }

    pub fn current_step(&self) -> Option<usize> {
        match &self.state {
            RunState::Running(session) => Some(session.current_step),
            RunState::Idle => None,
        }
    }

    /// Start-relative time at which `current_step` is due.
    pub fn next_note_time(&self) -> Option<f64> {
        match &self.state {
            RunState::Running(session) => Some(session.next_note_time),
            RunState::Idle => None,
        }
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::audio::SampleId;
    use crate::sequencer::testing::{FakeClock, RecordingPlayer};
    use crate::sequencer::{GridError, StepGrid, TempoRange};

    const EPS: f64 = 1e-9;

    struct Rig {
        clock: Arc<FakeClock>,
        player: Arc<RecordingPlayer>,
        tempo: Arc<TempoControl>,
        scheduler: Scheduler,
        redraws: Arc<Mutex<Vec<usize>>>,
        grid: SharedGrid,
    }

    // one track bound to SampleId(0) with every step enabled
    fn rig(sequence_length: usize, bpm: f64) -> Rig {
        let mut grid = StepGrid::new(sequence_length, 1);
        grid.bind_track(0, SampleId(0));
        for step in 0..sequence_length {
            grid.set_enabled(step, 0, true);
        }
        rig_with_grid(grid, bpm)
    }

    fn rig_with_grid(grid: StepGrid, bpm: f64) -> Rig {
        let clock = Arc::new(FakeClock::new(50.0));
        let player = Arc::new(RecordingPlayer::default());
        let tempo = Arc::new(TempoControl::new(bpm, TempoRange::default()));
        let scheduler = Scheduler::new(
            clock.clone(),
            player.clone(),
            tempo.clone(),
            SchedulerConfig::default(),
        );
        Rig {
            clock,
            player,
            tempo,
            scheduler,
            redraws: Arc::new(Mutex::new(Vec::new())),
            grid: grid.shared(),
        }
    }

    impl Rig {
        fn start(&mut self) {
            let redraws = self.redraws.clone();
            self.scheduler
                .start(self.grid.clone(), move |step| redraws.lock().unwrap().push(step))
                .unwrap();
        }
    }

    #[test]
    fn first_tick_at_120_bpm_schedules_only_step_zero() {
        let mut rig = rig(16, 120.0);
        rig.start();

        assert_eq!(rig.scheduler.tick(), 1);
        assert_eq!(rig.player.whens(), vec![0.0]);
        assert_eq!(rig.scheduler.current_step(), Some(1));
        assert!((rig.scheduler.next_note_time().unwrap() - 0.125).abs() < EPS);
        assert_eq!(*rig.redraws.lock().unwrap(), vec![7]);
    }

    #[test]
    fn start_hands_epoch_to_player() {
        let mut rig = rig(16, 120.0);
        rig.start();
        assert_eq!(rig.player.epoch(), Some(50.0));
    }

    #[test]
    fn inter_note_interval_is_fifteen_over_tempo() {
        for bpm in [1.0, 37.0, 60.0, 120.0, 173.5, 240.0] {
            let mut rig = rig(16, bpm);
            rig.start();
            let step = 15.0 / bpm;
            rig.clock.advance(step * 10.0);
            rig.scheduler.tick();

            let whens = rig.player.whens();
            assert!(whens.len() >= 10, "bpm {bpm}: only {} notes", whens.len());
            for pair in whens.windows(2) {
                assert!((pair[1] - pair[0] - step).abs() < 1e-6, "bpm {bpm}: {:?}", pair);
            }
        }
    }

    #[test]
    fn step_index_wraps_for_any_length() {
        for len in [1, 2, 3, 7, 16, 64] {
            let mut rig = rig(len, 240.0);
            rig.start();
            let mut total = 0;
            for _ in 0..(len * 3) {
                total += rig.scheduler.tick();
                let step = rig.scheduler.current_step().unwrap();
                assert!(step < len);
                assert_eq!(step, total % len);
                // one 16th at 240 BPM
                rig.clock.advance(0.0625);
            }
            assert!(total > len * 3);
        }
    }

    #[test]
    fn cursor_returns_to_zero_after_full_cycle() {
        let len = 8;
        let mut rig = rig(len, 120.0);
        rig.start();
        // 8 steps at 0.125s: times 0.0..0.875; horizon must exceed 0.875
        rig.clock.advance(0.8);
        assert_eq!(rig.scheduler.tick(), len);
        assert_eq!(rig.scheduler.current_step(), Some(0));
        assert!((rig.scheduler.next_note_time().unwrap() - 1.0).abs() < EPS);
    }

    #[test]
    fn stalled_timer_catches_up_every_step_once() {
        let mut rig = rig(16, 120.0);
        rig.start();
        rig.clock.advance(1.0);

        assert_eq!(rig.scheduler.tick(), 9);
        let whens = rig.player.whens();
        let expected: Vec<f64> = (0..9).map(|i| i as f64 * 0.125).collect();
        assert_eq!(whens.len(), expected.len());
        for (got, want) in whens.iter().zip(&expected) {
            assert!((got - want).abs() < EPS);
        }
        assert_eq!(rig.scheduler.current_step(), Some(9));

        // nothing new is due until the clock moves
        assert_eq!(rig.scheduler.tick(), 0);
        assert_eq!(rig.player.whens().len(), 9);
    }

    #[test]
    fn redraw_once_per_distinct_note_time() {
        let mut rig = rig(16, 120.0);
        rig.start();
        rig.clock.advance(0.5);
        rig.scheduler.tick();
        rig.scheduler.tick();

        let redraws = rig.redraws.lock().unwrap().clone();
        // notes at 0.0, 0.125, 0.25, 0.375, 0.5
        assert_eq!(redraws, vec![7, 8, 9, 10, 11]);
    }

    #[test]
    fn empty_rows_advance_and_redraw_without_dispatch() {
        let mut grid = StepGrid::new(4, 2);
        grid.bind_track(0, SampleId(1));
        grid.bind_track(1, SampleId(2));
        grid.set_enabled(2, 1, true);
        let mut rig = rig_with_grid(grid, 120.0);
        rig.start();

        rig.clock.advance(0.4);
        assert_eq!(rig.scheduler.tick(), 4);
        assert_eq!(rig.player.calls(), vec![(SampleId(2), 0.25)]);
        assert_eq!(rig.redraws.lock().unwrap().len(), 4);
        assert_eq!(rig.scheduler.current_step(), Some(0));
    }

    #[test]
    fn tempo_change_applies_from_next_increment() {
        let mut rig = rig(16, 120.0);
        rig.start();
        rig.scheduler.tick();
        // 0.125 is already committed at the old tempo
        rig.tempo.set(60.0);
        rig.clock.advance(0.1);
        rig.scheduler.tick();

        let whens = rig.player.whens();
        assert_eq!(whens.len(), 2);
        assert!((whens[1] - 0.125).abs() < EPS);
        assert!((rig.scheduler.next_note_time().unwrap() - 0.375).abs() < EPS);
    }

    #[test]
    fn zero_tempo_holds_the_cursor_and_redraws_once() {
        let mut rig = rig(16, 0.0);
        rig.start();
        assert_eq!(rig.scheduler.tick(), 1);
        for _ in 0..5 {
            rig.clock.advance(10.0);
            assert_eq!(rig.scheduler.tick(), 0);
        }

        assert_eq!(rig.player.whens(), vec![0.0]);
        assert_eq!(*rig.redraws.lock().unwrap(), vec![7]);
        assert_eq!(rig.scheduler.current_step(), Some(0));
        assert_eq!(rig.scheduler.next_note_time(), Some(0.0));
    }

    #[test]
    fn playback_resumes_within_a_step_after_passing_through_zero() {
        let mut rig = rig(16, 120.0);
        rig.start();
        rig.scheduler.tick();
        rig.tempo.set(0.0);
        rig.clock.advance(0.1);
        // 0.125 was already due, it plays and the cursor holds there
        assert_eq!(rig.scheduler.tick(), 1);
        for _ in 0..3 {
            rig.clock.advance(1.0);
            assert_eq!(rig.scheduler.tick(), 0);
        }
        assert_eq!(rig.player.whens().len(), 2);

        // now at 3.1s: the next step lands one 16th later, no backlog
        rig.tempo.set(120.0);
        assert_eq!(rig.scheduler.tick(), 0);
        assert_eq!(rig.scheduler.current_step(), Some(2));
        assert!((rig.scheduler.next_note_time().unwrap() - 3.225).abs() < 1e-9);

        rig.clock.advance(0.125);
        assert_eq!(rig.scheduler.tick(), 1);
        let whens = rig.player.whens();
        assert_eq!(whens.len(), 3);
        assert!((whens[2] - 3.225).abs() < 1e-9);
        assert_eq!(*rig.redraws.lock().unwrap(), vec![7, 8, 9]);
    }

    #[test]
    fn dispatch_failure_does_not_silence_other_tracks() {
        let mut grid = StepGrid::new(4, 3);
        for t in 0..3 {
            grid.bind_track(t, SampleId(t as u64));
            grid.set_enabled(0, t, true);
            grid.set_enabled(1, t, true);
        }
        let mut rig = rig_with_grid(grid, 120.0);
        rig.player.fail_on(SampleId(1));
        rig.start();

        rig.clock.advance(0.1);
        rig.scheduler.tick();

        let played: Vec<SampleId> = rig.player.calls().into_iter().map(|(s, _)| s).collect();
        assert_eq!(played, vec![SampleId(0), SampleId(2), SampleId(0), SampleId(2)]);
        let stats = rig.scheduler.stats();
        assert_eq!(stats.notes_dispatched, 4);
        assert_eq!(stats.dispatch_failures, 2);
        assert_eq!(rig.scheduler.current_step(), Some(2));
    }

    #[test]
    fn start_rejects_unplayable_grid() {
        let grid = StepGrid::new(16, 2);
        let mut rig = rig_with_grid(grid, 120.0);
        let err = rig.scheduler.start(rig.grid.clone(), |_| {}).unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::InvalidGridState(GridError::UnboundTrack(0))
        ));
        assert!(!rig.scheduler.is_running());
        assert_eq!(rig.scheduler.tick(), 0);
    }

    #[test]
    fn stop_is_idempotent_and_silences_ticks() {
        let mut rig = rig(16, 120.0);
        rig.start();
        rig.scheduler.tick();
        rig.scheduler.stop();
        rig.scheduler.stop();
        assert!(!rig.scheduler.is_running());

        rig.clock.advance(5.0);
        assert_eq!(rig.scheduler.tick(), 0);
        assert_eq!(rig.player.whens().len(), 1);
        assert_eq!(rig.scheduler.current_step(), None);
    }

    #[test]
    fn restart_resets_cursor_and_redraw_marker() {
        let mut rig = rig(16, 120.0);
        rig.start();
        rig.clock.advance(0.3);
        rig.scheduler.tick();
        rig.scheduler.stop();

        rig.clock.advance(10.0);
        rig.start();
        rig.scheduler.tick();
        assert!((rig.player.epoch().unwrap() - 60.3).abs() < EPS);
        assert_eq!(rig.scheduler.current_step(), Some(1));
        assert_eq!(rig.redraws.lock().unwrap().last(), Some(&7));
    }

    #[test]
    fn grid_edits_are_picked_up_on_next_step() {
        let mut grid = StepGrid::new(4, 1);
        grid.bind_track(0, SampleId(9));
        let mut rig = rig_with_grid(grid, 120.0);
        rig.start();
        rig.scheduler.tick();
        assert!(rig.player.calls().is_empty());

        crate::sequencer::write_grid(&rig.grid).set_enabled(1, 0, true);
        rig.clock.advance(0.1);
        rig.scheduler.tick();
        assert_eq!(rig.player.calls(), vec![(SampleId(9), 0.125)]);
    }
}
