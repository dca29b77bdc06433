use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::audio_api::{AudioCommand, FilterParams, PlayParams};

use super::effect::{Effect, Gain, LowPass};
use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;
use super::sample_id::SampleId;
use super::voice::Voice;

const MAX_VOICES: usize = 32; // hard cap so we wont malloc in audio callback
// triggers past this many waiting ones are dropped and counted in `dropped_out`
const MAX_PENDING: usize = 512;

pub struct Engine {
    frame: u64,
    frames_out: Arc<AtomicU64>,  // read by AudioClock
    dropped_out: Arc<AtomicU64>, // read by the UI
    samples: HashMap<SampleId, SampleBuffer>,
    voices: [Voice; MAX_VOICES],
    pending: Vec<PlayParams>, // triggers waiting for their frame
    gain: Gain,
    filter: LowPass,
    filter_enabled: bool,
}

impl Engine {
    pub fn new(sample_rate: f32, frames_out: Arc<AtomicU64>, dropped_out: Arc<AtomicU64>) -> Self {
        Self {
            frame: frames_out.load(Ordering::Acquire),
            frames_out,
            dropped_out,
            samples: HashMap::new(),
            voices: [Voice::IDLE; MAX_VOICES],
            pending: Vec::with_capacity(MAX_PENDING),
            gain: Gain::new(1.0),
            filter: LowPass::new(sample_rate, 440.0, 1.0),
            filter_enabled: false,
        }
    }

    pub fn handle_cmd(&mut self, cmd: AudioCommand) {
        match cmd {
            AudioCommand::RegisterSample { id, buffer } => {
                self.samples.insert(id, buffer);
            }
            AudioCommand::Play(p) => self.schedule(p),
            AudioCommand::SetGain(g) => self.gain.set(g),
            AudioCommand::SetFilter(f) => self.set_filter(f),
        }
    }

    fn set_filter(&mut self, f: FilterParams) {
        if f.enabled && !self.filter_enabled {
            self.filter.reset(); // no stale tail from the last time it was on
        }
        self.filter_enabled = f.enabled;
        self.filter.set_params(f.cutoff_hz, f.q);
    }

    fn schedule(&mut self, p: PlayParams) {
        if p.at_frame <= self.frame {
            self.start_voice(p.sample_id);
        } else if self.pending.len() < MAX_PENDING {
            self.pending.push(p);
        } else {
            self.dropped_out.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn start_voice(&mut self, id: SampleId) {
        if !self.samples.contains_key(&id) {
            return;
        }
        // free slot, otherwise steal the voice that has played the longest
        let slot = self.voices.iter().position(|v| !v.active).unwrap_or_else(|| {
            self.voices
                .iter()
                .enumerate()
                .max_by_key(|(_, v)| v.pos)
                .map(|(i, _)| i)
                .unwrap_or(0)
        });
        self.voices[slot] = Voice::new(id);
    }

    fn start_due(&mut self) {
        let now = self.frame;
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].at_frame <= now {
                let p = self.pending.swap_remove(i);
                self.start_voice(p.sample_id);
            } else {
                i += 1;
            }
        }
    }

    pub fn render_block(&mut self, out: &mut [StereoFrame]) {
        for frame in out.iter_mut() {
            if !self.pending.is_empty() {
                self.start_due();
            }
            let mut acc = StereoFrame::zero();
            for v in self.voices.iter_mut().filter(|v| v.active) {
                match self.samples.get(&v.sample_id) {
                    Some(buffer) => acc.mix(v.next_frame(buffer)),
                    None => v.active = false,
                }
            }
            *frame = acc;
            self.frame += 1;
        }

        self.gain.process(out);
        if self.filter_enabled {
            self.filter.process(out);
        }
        self.frames_out.store(self.frame, Ordering::Release);
    }

    #[cfg(test)]
    pub fn active_voices(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }
}
