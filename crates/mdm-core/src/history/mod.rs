//! History Store: bounded, persisted log of completed jobs, most recent first.
//!
//! The log is loaded once at startup and rewritten in full on every change.
//! A store created with [`HistoryStore::in_memory`] never touches the disk.

mod entry;
mod persist;

use anyhow::Result;
use std::path::{Path, PathBuf};

pub use entry::{HistoryEntry, UNKNOWN_TITLE};
pub use persist::default_path;

/// Default cap on the number of entries kept.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug)]
pub struct HistoryStore {
    path: Option<PathBuf>,
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl HistoryStore {
    /// Load the log at `path`. Never fails: missing or malformed data gives an empty log.
    /// A log longer than `limit` is truncated in memory.
    pub fn load(path: impl Into<PathBuf>, limit: usize) -> Self {
        let path = path.into();
        let mut entries = persist::read_entries(&path);
        entries.truncate(limit);
        tracing::debug!(path = %path.display(), entries = entries.len(), "history loaded");
        Self {
            path: Some(path),
            entries,
            limit,
        }
    }

    /// Store that keeps entries in memory only.
    pub fn in_memory(limit: usize) -> Self {
        Self {
            path: None,
            entries: Vec::new(),
            limit,
        }
    }

    /// Prepend `entry`, keep the `limit` most recent, and persist the result.
    /// The in-memory log is updated even if persisting fails.
    pub fn record(&mut self, entry: HistoryEntry) -> Result<()> {
        self.entries.insert(0, entry);
        self.entries.truncate(self.limit);
        self.persist()
    }

    /// Empty the log and persist the empty state.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn persist(&self) -> Result<()> {
        match &self.path {
            Some(path) => persist::write_entries(path, &self.entries),
            None => Ok(()),
        }
    }
}
