//! History log persistence: one JSON array, replaced atomically on every write.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::entry::HistoryEntry;

/// Default path of the history log: `~/.local/state/mdm/history.json`.
pub fn default_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdm")?;
    Ok(xdg_dirs.get_state_home().join("mdm").join("history.json"))
}

/// Read the log. Missing, unreadable or malformed data yields an empty log.
pub(crate) fn read_entries(path: &Path) -> Vec<HistoryEntry> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read history, starting empty");
            return Vec::new();
        }
    };
    match serde_json::from_slice::<Vec<HistoryEntry>>(&bytes) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed history, starting empty");
            Vec::new()
        }
    }
}

/// Replace the log with `entries`: write a temp file in the same directory, then rename.
pub(crate) fn write_entries(path: &Path, entries: &[HistoryEntry]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)
        .with_context(|| format!("create dir: {}", parent.display()))?;
    let json = serde_json::to_vec_pretty(entries).context("serialize history")?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("create temp file in {}", parent.display()))?;
    tmp.write_all(&json).context("write history")?;
    tmp.as_file().sync_all().context("sync history")?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("replace history: {}", path.display()))?;
    Ok(())
}
