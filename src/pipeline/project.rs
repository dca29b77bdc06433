// What gets written to disk for a project: the pads, the tempo, the knobs.

use serde::{Deserialize, Serialize};

use crate::controls::{DEFAULT_CUTOFF_HZ, DEFAULT_GAIN, DEFAULT_Q};
use crate::sequencer::StepGrid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternFile {
    pub tempo: f64,
    pub sequence_length: usize,
    pub tracks: Vec<TrackPattern>,
    #[serde(default)]
    pub controls: ControlsState,
}

/// One lane of pads, keyed by the sample's file name so a kit can be
/// reordered or extended without losing the pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackPattern {
    pub sample: String,
    pub steps: Vec<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlsState {
    pub gain: f32,
    pub filter_enabled: bool,
    pub cutoff_hz: f32,
    pub q: f32,
}

impl Default for ControlsState {
    fn default() -> Self {
        Self {
            gain: DEFAULT_GAIN,
            filter_enabled: false,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            q: DEFAULT_Q,
        }
    }
}

impl PatternFile {
    pub fn capture(grid: &StepGrid, track_names: &[String], tempo: f64, controls: ControlsState) -> Self {
        let tracks = track_names
            .iter()
            .enumerate()
            .take(grid.track_count())
            .map(|(track, name)| TrackPattern {
                sample: name.clone(),
                steps: (0..grid.sequence_length())
                    .map(|step| grid.is_enabled(step, track))
                    .collect(),
            })
            .collect();
        Self {
            tempo,
            sequence_length: grid.sequence_length(),
            tracks,
            controls,
        }
    }

    /// Copy saved pads onto the tracks whose sample names match. Steps past
    /// the grid's length are dropped; missing ones stay off. Returns how many
    /// tracks were restored.
    pub fn apply_to(&self, grid: &mut StepGrid, track_names: &[String]) -> usize {
        let mut restored = 0;
        for saved in &self.tracks {
            let Some(track) = track_names.iter().position(|n| *n == saved.sample) else {
                log::info!(target: "project", "saved track {} has no sample in this kit", saved.sample);
                continue;
            };
            for step in 0..grid.sequence_length() {
                grid.set_enabled(step, track, saved.steps.get(step).copied().unwrap_or(false));
            }
            restored += 1;
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn capture_then_apply_by_sample_name() {
        let mut grid = StepGrid::new(4, 2);
        grid.set_enabled(0, 0, true);
        grid.set_enabled(3, 1, true);
        let file = PatternFile::capture(&grid, &names(&["kick.wav", "hat.wav"]), 98.0, ControlsState::default());
        assert_eq!(file.tracks[1].steps, vec![false, false, false, true]);

        // kit order changed and grew
        let mut other = StepGrid::new(4, 3);
        let restored = file.apply_to(&mut other, &names(&["hat.wav", "snare.wav", "kick.wav"]));
        assert_eq!(restored, 2);
        assert!(other.is_enabled(3, 0));
        assert!(other.is_enabled(0, 2));
        assert!(!other.is_enabled(0, 1));
    }

    #[test]
    fn shorter_grid_drops_extra_steps() {
        let mut grid = StepGrid::new(8, 1);
        grid.set_enabled(6, 0, true);
        grid.set_enabled(1, 0, true);
        let file = PatternFile::capture(&grid, &names(&["a.wav"]), 120.0, ControlsState::default());

        let mut short = StepGrid::new(4, 1);
        file.apply_to(&mut short, &names(&["a.wav"]));
        assert!(short.is_enabled(1, 0));
        assert_eq!(short.sequence_length(), 4);
    }

    #[test]
    fn controls_default_when_missing_from_json() {
        let json = r#"{ "tempo": 100.0, "sequence_length": 16, "tracks": [] }"#;
        let file: PatternFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.controls, ControlsState::default());
    }
}
