use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::audio_api::AudioCommand;

mod clock;
mod effect;
mod engine;
mod frame;
mod player;
mod sample_buffer;
mod sample_id;
mod voice;

pub use clock::AudioClock;
pub use effect::{MAX_Q, MIN_CUTOFF_HZ, MIN_Q};
pub use frame::StereoFrame;
pub use player::AudioPlayer;
pub use sample_buffer::SampleBuffer;
pub use sample_id::SampleId;

use engine::Engine;

const COMMAND_QUEUE: usize = 1024;
const SCRATCH_FRAMES: usize = 4096;

pub struct AudioHandle {
    tx: Sender<AudioCommand>,
    clock: AudioClock,
    dropped: Arc<AtomicU64>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn send(&self, cmd: AudioCommand) {
        if self.tx.try_send(cmd).is_err() {
            log::warn!(target: "audio", "dropped audio command, engine queue unavailable");
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn clock(&self) -> AudioClock {
        self.clock.clone()
    }

    /// Triggers the engine had no room to queue.
    pub fn dropped_triggers(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn player(&self) -> AudioPlayer {
        AudioPlayer::new(self.tx.clone(), self.sample_rate as f64)
    }
}

pub fn start_audio() -> anyhow::Result<AudioHandle> {
    let (tx, rx) = crossbeam_channel::bounded::<AudioCommand>(COMMAND_QUEUE);

    let host = cpal::default_host();
    let device = host.default_output_device().context("no default output device")?;
    let config = device.default_output_config().context("no default output config")?;

    let sample_rate = config.sample_rate();
    let channels = config.channels() as usize;
    let frames = Arc::new(AtomicU64::new(0));
    let dropped = Arc::new(AtomicU64::new(0));

    match config.sample_format() {
        cpal::SampleFormat::F32 => {
            let output_stream =
                build_output_stream_f32(&device, &config.into(), rx, frames.clone(), dropped.clone(), sample_rate, channels)?;
            output_stream.play().context("failed to play output stream")?;
            log::info!(target: "audio", "output running at {} Hz, {} channels", sample_rate, channels);

            Ok(AudioHandle {
                tx,
                clock: AudioClock::new(frames, sample_rate),
                dropped,
                sample_rate,
                _output_stream: output_stream,
            })
        }
        other => anyhow::bail!("unsupported sample format {other:?} (only f32 supported for now)"),
    }
}

fn build_output_stream_f32(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    rx: Receiver<AudioCommand>,
    frames: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
    sample_rate: u32,
    channels: usize,
) -> anyhow::Result<cpal::Stream> {
    let mut engine = Engine::new(sample_rate as f32, frames, dropped);
    let mut scratch = vec![StereoFrame::zero(); SCRATCH_FRAMES];

    let err_fn = |err| log::error!(target: "audio", "output stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            while let Ok(cmd) = rx.try_recv() {
                engine.handle_cmd(cmd);
            }

            for chunk in data.chunks_mut(channels * SCRATCH_FRAMES) {
                let block = &mut scratch[..chunk.len() / channels];
                engine.render_block(block);
                write_interleaved(chunk, block, channels);
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

fn write_interleaved(out: &mut [f32], block: &[StereoFrame], channels: usize) {
    for (dst, f) in out.chunks_exact_mut(channels).zip(block) {
        match dst {
            [mono] => *mono = 0.5 * (f.left + f.right),
            [l, r, rest @ ..] => {
                *l = f.left;
                *r = f.right;
                rest.fill(0.0);
            }
            [] => {}
        }
    }
}
