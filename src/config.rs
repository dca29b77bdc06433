use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::sequencer::{SchedulerConfig, TempoRange, DEFAULT_TEMPO};

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    sequencer: SequencerSection,
    #[serde(default)]
    scheduler: SchedulerSection,
    #[serde(default)]
    kit: KitSection,
}

#[derive(Deserialize, Default)]
struct SequencerSection {
    tempo: Option<f64>,
    sequence_length: Option<usize>,
    tempo_min: Option<f64>,
    tempo_max: Option<f64>,
}

#[derive(Deserialize, Default)]
struct SchedulerSection {
    lookahead_ms: Option<u64>,
    schedule_ahead_secs: Option<f64>,
    visual_lead_steps: Option<usize>,
}

#[derive(Deserialize, Default)]
struct KitSection {
    dir: Option<PathBuf>,
}

pub struct Config {
    sequencer: SequencerSection,
    scheduler: SchedulerSection,
    kit: KitSection,
}

impl Config {
    /// Embedded defaults, overlaid with `<config dir>/drumgrid/config.toml` when present.
    pub fn load() -> Self {
        Self::load_with_user(user_config_path().as_deref())
    }

    pub fn load_with_user(user_path: Option<&Path>) -> Self {
        let mut base: ConfigFile = toml::from_str(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!(target: "config", "embedded config.toml is invalid: {}", e);
            ConfigFile::default()
        });

        if let Some(path) = user_path {
            if path.exists() {
                match std::fs::read_to_string(path) {
                    Ok(contents) => match toml::from_str::<ConfigFile>(&contents) {
                        Ok(user) => {
                            merge_sequencer(&mut base.sequencer, user.sequencer);
                            merge_scheduler(&mut base.scheduler, user.scheduler);
                            if user.kit.dir.is_some() {
                                base.kit.dir = user.kit.dir;
                            }
                            log::info!(target: "config", "loaded user config {}", path.display());
                        }
                        Err(e) => {
                            log::warn!(target: "config", "ignoring malformed config {}: {}", path.display(), e)
                        }
                    },
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }

        Config {
            sequencer: base.sequencer,
            scheduler: base.scheduler,
            kit: base.kit,
        }
    }

    pub fn tempo_range(&self) -> TempoRange {
        let fallback = TempoRange::default();
        let min = finite_or(self.sequencer.tempo_min, "tempo_min", fallback.min).max(0.0);
        let max = finite_or(self.sequencer.tempo_max, "tempo_max", fallback.max);
        if !(min <= max) {
            log::warn!(target: "config", "tempo_max {} below tempo_min {}, using defaults", max, min);
            return fallback;
        }
        TempoRange { min, max }
    }

    pub fn initial_tempo(&self) -> f64 {
        let range = self.tempo_range();
        range.clamp(finite_or(self.sequencer.tempo, "tempo", DEFAULT_TEMPO))
    }

    /// Steps per pattern (at least 1).
    pub fn sequence_length(&self) -> usize {
        self.sequencer.sequence_length.unwrap_or(16).max(1)
    }

    pub fn scheduler(&self) -> SchedulerConfig {
        let fallback = SchedulerConfig::default();
        SchedulerConfig {
            lookahead: self
                .scheduler
                .lookahead_ms
                .map(|ms| Duration::from_millis(ms.clamp(1, 1_000)))
                .unwrap_or(fallback.lookahead),
            schedule_ahead: self
                .scheduler
                .schedule_ahead_secs
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(fallback.schedule_ahead),
            visual_lead_steps: self
                .scheduler
                .visual_lead_steps
                .unwrap_or(fallback.visual_lead_steps),
        }
    }

    /// Kit directory, resolved against `project_dir` when relative.
    pub fn kit_dir(&self, project_dir: &Path) -> PathBuf {
        match &self.kit.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => project_dir.join(dir),
            None => project_dir.to_path_buf(),
        }
    }
}

// toml accepts nan and inf, neither makes sense for a tempo
fn finite_or(value: Option<f64>, key: &str, fallback: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        Some(v) => {
            log::warn!(target: "config", "ignoring {} = {}", key, v);
            fallback
        }
        None => fallback,
    }
}

pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("drumgrid"))
}

fn user_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

fn merge_sequencer(base: &mut SequencerSection, user: SequencerSection) {
    if user.tempo.is_some() {
        base.tempo = user.tempo;
    }
    if user.sequence_length.is_some() {
        base.sequence_length = user.sequence_length;
    }
    if user.tempo_min.is_some() {
        base.tempo_min = user.tempo_min;
    }
    if user.tempo_max.is_some() {
        base.tempo_max = user.tempo_max;
    }
}

fn merge_scheduler(base: &mut SchedulerSection, user: SchedulerSection) {
    if user.lookahead_ms.is_some() {
        base.lookahead_ms = user.lookahead_ms;
    }
    if user.schedule_ahead_secs.is_some() {
        base.schedule_ahead_secs = user.schedule_ahead_secs;
    }
    if user.visual_lead_steps.is_some() {
        base.visual_lead_steps = user.visual_lead_steps;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_match_scheduler_defaults() {
        let config = Config::load_with_user(None);
        assert_eq!(config.scheduler(), SchedulerConfig::default());
        assert_eq!(config.initial_tempo(), 120.0);
        assert_eq!(config.sequence_length(), 16);
        assert_eq!(config.tempo_range(), TempoRange { min: 0.0, max: 240.0 });
    }

    #[test]
    fn user_file_overrides_only_given_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[scheduler]\nlookahead_ms = 10\n\n[sequencer]\nsequence_length = 32\n",
        )
        .unwrap();

        let config = Config::load_with_user(Some(&path));
        let sched = config.scheduler();
        assert_eq!(sched.lookahead, Duration::from_millis(10));
        assert_eq!(sched.schedule_ahead, 0.1);
        assert_eq!(sched.visual_lead_steps, 7);
        assert_eq!(config.sequence_length(), 32);
        assert_eq!(config.initial_tempo(), 120.0);
    }

    #[test]
    fn malformed_user_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        let config = Config::load_with_user(Some(&path));
        assert_eq!(config.scheduler(), SchedulerConfig::default());
    }

    #[test]
    fn non_finite_tempo_values_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sequencer]\ntempo = inf\ntempo_min = 30.0\ntempo_max = nan\n").unwrap();

        let config = Config::load_with_user(Some(&path));
        assert_eq!(config.tempo_range(), TempoRange { min: 30.0, max: 240.0 });
        assert_eq!(config.initial_tempo(), 120.0);
        // the control can be built from these without panicking
        let tempo = crate::sequencer::TempoControl::new(config.initial_tempo(), config.tempo_range());
        assert_eq!(tempo.get(), 120.0);
    }

    #[test]
    fn inverted_tempo_range_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[sequencer]\ntempo_min = 200.0\ntempo_max = 100.0\n").unwrap();

        let config = Config::load_with_user(Some(&path));
        assert_eq!(config.tempo_range(), TempoRange::default());
    }

    #[test]
    fn relative_kit_dir_resolves_against_project() {
        let config = Config::load_with_user(None);
        let project = Path::new("/tmp/beats");
        assert_eq!(config.kit_dir(project), project.join("."));
    }
}
