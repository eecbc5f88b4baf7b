//! Job model: identifiers, requests, lifecycle status and the tracked record.

mod patch;
mod request;
mod status;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub use patch::JobPatch;
pub use request::{GifClip, GifQuality, JobRequest, DEFAULT_FORMAT, DEFAULT_QUALITY};
pub use status::JobStatus;

/// Backend-assigned job identifier (opaque).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Result metadata reported by the backend for a completed job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    /// File name (or server-side path) of the produced artifact.
    pub filename: String,
    pub file_size_bytes: Option<u64>,
}

/// A tracked unit of backend work.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub request: JobRequest,
    pub status: JobStatus,
    /// Percent done in [0, 100]; never lowered after creation.
    pub progress_percent: u8,
    /// Advisory transfer rate, e.g. "1.2MiB/s".
    pub speed_hint: Option<String>,
    /// Last raw status string reported by the backend.
    pub status_text: Option<String>,
    /// Display name; set once when the backend resolves it.
    pub title: Option<String>,
    /// Admission time, Unix milliseconds.
    pub created_at: i64,
    /// Set when `status == Complete`.
    pub result: Option<JobResult>,
    /// Set when `status == Failed`.
    pub failure_reason: Option<String>,
}

impl Job {
    pub(crate) fn new(id: JobId, request: JobRequest) -> Self {
        Self {
            id,
            request,
            status: JobStatus::Initializing,
            progress_percent: 0,
            speed_hint: None,
            status_text: None,
            title: None,
            created_at: unix_millis(),
            result: None,
            failure_reason: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Title for display; falls back to the source URL.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.request.source_url)
    }
}

/// Current time as Unix milliseconds.
pub fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_job_starts_initializing_at_zero() {
        let job = Job::new(JobId::from("j1"), JobRequest::new("https://example.com/v", "mp4", "720p"));
        assert_eq!(job.status, JobStatus::Initializing);
        assert_eq!(job.progress_percent, 0);
        assert!(job.title.is_none());
        assert!(!job.is_terminal());
        assert_eq!(job.display_title(), "https://example.com/v");
        assert!(job.created_at > 0);
    }

    #[test]
    fn job_id_display_and_serde_are_transparent() {
        let id = JobId::new("abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc-123\"");
    }
}
