use std::path::Path;

use anyhow::Context;

use super::frame::StereoFrame;

/// Decoded sample, stereo at the engine's rate.
#[derive(Clone, Debug, Default)]
pub struct SampleBuffer {
    pub data: Vec<StereoFrame>,
}

impl SampleBuffer {
    pub fn from_frames(data: Vec<StereoFrame>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Decode a WAV file, fold it to stereo, and resample it to `target_rate`.
    pub fn load_wav(path: &Path, target_rate: u32) -> anyhow::Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("opening {}", path.display()))?;
        let spec = reader.spec();
        let channels = spec.channels as usize;
        if channels == 0 {
            anyhow::bail!("{} declares zero channels", path.display());
        }

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            hound::SampleFormat::Int => {
                let max = int_full_scale(spec.bits_per_sample)
                    .with_context(|| format!("decoding {}", path.display()))?;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|x| x as f32 / max))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        // mono is duplicated, anything wider keeps its first two channels
        let frames: Vec<StereoFrame> = samples
            .chunks_exact(channels)
            .map(|c| StereoFrame {
                left: c[0],
                right: if channels > 1 { c[1] } else { c[0] },
            })
            .collect();

        let data = resample_linear(&frames, spec.sample_rate, target_rate);
        log::debug!(
            target: "samples",
            "decoded {} ({} Hz, {} ch) into {} frames",
            path.display(), spec.sample_rate, channels, data.len()
        );
        Ok(Self { data })
    }
}

// magnitude of the most negative sample at this bit depth
fn int_full_scale(bits_per_sample: u16) -> anyhow::Result<f32> {
    if !(1..=32).contains(&bits_per_sample) {
        anyhow::bail!("unsupported integer bit depth {}", bits_per_sample);
    }
    Ok((1i64 << (bits_per_sample - 1)) as f32)
}

fn resample_linear(frames: &[StereoFrame], source_rate: u32, target_rate: u32) -> Vec<StereoFrame> {
    if source_rate == target_rate || source_rate == 0 || frames.is_empty() {
        return frames.to_vec();
    }
    let ratio = target_rate as f64 / source_rate as f64;
    let out_len = (frames.len() as f64 * ratio).ceil() as usize;
    let last = frames.len() - 1;

    (0..out_len)
        .map(|i| {
            let src_pos = i as f64 / ratio;
            let idx = src_pos.floor() as usize;
            if idx >= last {
                return frames[last];
            }
            let frac = (src_pos - idx as f64) as f32;
            let (a, b) = (frames[idx], frames[idx + 1]);
            StereoFrame {
                left: a.left + (b.left - a.left) * frac,
                right: a.right + (b.right - a.right) * frac,
            }
        })
        .collect()
}
