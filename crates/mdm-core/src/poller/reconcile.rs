//! Turn one status response into a patch for the tracked job.
//!
//! Only fields present in the response are written. Progress never goes
//! down, a resolved title is kept, and a `null` speed clears the hint while
//! an absent one keeps it.

use crate::backend::{Field, StatusResponse};
use crate::job::{Job, JobPatch, JobResult, JobStatus};

/// What the response means for the job's lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Complete(JobResult),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub patch: JobPatch,
    pub outcome: Outcome,
}

/// Whether a backend status string means the job finished successfully.
pub fn is_complete_status(status: &str) -> bool {
    let s = status.trim().trim_end_matches('!');
    s.eq_ignore_ascii_case("complete") || s.eq_ignore_ascii_case("completed")
}

pub fn reconcile(job: &Job, resp: &StatusResponse) -> Reconciled {
    let mut patch = JobPatch::default();

    let status = resp
        .status
        .value()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty());
    if let Some(text) = status {
        patch.status_text = Some(text.to_string());
    }
    if let Some(title) = resp.title.value().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if job.title.is_none() {
            patch.title = Some(title.to_string());
        }
    }
    if let Field::Value(p) = resp.progress_percent() {
        if p > job.progress_percent {
            patch.progress_percent = Some(p);
        }
    }
    match resp.speed_hint() {
        Field::Value(s) => patch.speed_hint = Some(Some(s)),
        Field::Null => patch.speed_hint = Some(None),
        Field::Absent => {}
    }

    let result = resp.result_filename().map(|filename| JobResult {
        filename,
        file_size_bytes: resp.file_size_bytes(),
    });

    if let (Some(text), Some(result)) = (status, result) {
        if is_complete_status(text) {
            patch.status = Some(JobStatus::Complete);
            patch.progress_percent = Some(100);
            patch.result = Some(result.clone());
            return Reconciled {
                patch,
                outcome: Outcome::Complete(result),
            };
        }
    }

    if let Some(reason) = resp.error_message() {
        patch.status = Some(JobStatus::Failed);
        patch.failure_reason = Some(reason.to_string());
        return Reconciled {
            patch,
            outcome: Outcome::Failed(reason.to_string()),
        };
    }

    if status.is_some() && job.status == JobStatus::Initializing {
        patch.status = Some(JobStatus::Running);
    }
    Reconciled {
        patch,
        outcome: Outcome::Continue,
    }
}
