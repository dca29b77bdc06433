// Called on startup and on save/quit; keeps the pattern next to the kit so it
// comes back on the next launch.
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::pipeline::project::PatternFile;

const DRUMGRID_DIR: &str = ".drumgrid";
const PATTERN_FILE: &str = "pattern.json";

// <project_dir>/.drumgrid/pattern.json
pub fn pattern_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(DRUMGRID_DIR).join(PATTERN_FILE)
}

/// `None` when there is nothing saved yet or the file can't be used.
pub fn load_pattern(project_dir: &Path) -> Option<PatternFile> {
    let path = pattern_file_path(project_dir);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            log::warn!(target: "project", "ignoring unreadable {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_pattern(project_dir: &Path, pattern: &PatternFile) -> anyhow::Result<()> {
    let path = pattern_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(pattern)?;
    std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    log::info!(target: "project", "saved pattern to {}", path.display());
    Ok(())
}
