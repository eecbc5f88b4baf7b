use serde::{Deserialize, Serialize};

use crate::job::{unix_millis, Job, JobId, JobStatus};

/// Title recorded when the backend never resolved one.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Immutable record of one completed job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "id")]
    pub job_id: JobId,
    pub title: String,
    #[serde(rename = "format")]
    pub output_format: String,
    #[serde(rename = "quality")]
    pub quality_hint: String,
    /// Unix milliseconds.
    #[serde(rename = "timestamp")]
    pub completed_at: i64,
    #[serde(rename = "filesize", default, skip_serializing_if = "Option::is_none")]
    pub file_size_bytes: Option<u64>,
}

impl HistoryEntry {
    /// Entry for a job that reached `Complete`; None for any other status.
    pub fn from_job(job: &Job) -> Option<Self> {
        if job.status != JobStatus::Complete {
            return None;
        }
        Some(Self {
            job_id: job.id.clone(),
            title: job
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            output_format: job.request.output_format.clone(),
            quality_hint: job.request.quality_hint.clone(),
            completed_at: unix_millis(),
            file_size_bytes: job.result.as_ref().and_then(|r| r.file_size_bytes),
        })
    }
}
