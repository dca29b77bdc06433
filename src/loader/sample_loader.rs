use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::audio::{SampleBuffer, SampleId};

/// A decoded kit sample, ready to register with the engine.
pub struct LoadedSample {
    pub name: String,
    pub path: PathBuf,
    pub id: SampleId,
    pub buffer: SampleBuffer,
}

/// `.wav` files directly inside `dir`, sorted by file name.
pub fn index_wav_in_dir(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading kit directory {}", dir.display()))?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_wav(p))
        .collect();
    paths.sort();
    Ok(paths)
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}

// Load a WAV from disk, prepare for registration with the engine
pub fn load(path: &Path, target_rate: u32) -> anyhow::Result<LoadedSample> {
    let buffer = SampleBuffer::load_wav(path, target_rate)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(LoadedSample {
        name,
        path: path.to_path_buf(),
        id: SampleId::next(),
        buffer,
    })
}

/// Load every WAV of a kit directory, at most `limit` of them. Files that fail
/// to decode are logged and skipped.
pub fn load_kit(dir: &Path, target_rate: u32, limit: usize) -> anyhow::Result<Vec<LoadedSample>> {
    let mut kit = Vec::new();
    for path in index_wav_in_dir(dir)? {
        if kit.len() == limit {
            log::warn!(target: "samples", "kit limit {} reached, ignoring {}", limit, path.display());
            continue;
        }
        match load(&path, target_rate) {
            Ok(sample) => {
                log::info!(target: "samples", "loaded {} as {}", sample.path.display(), sample.id);
                kit.push(sample);
            }
            Err(e) => log::warn!(target: "samples", "skipping {}: {:#}", path.display(), e),
        }
    }
    Ok(kit)
}
