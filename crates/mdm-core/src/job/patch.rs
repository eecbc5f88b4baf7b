//! Partial job updates merged by the registry.

use super::{Job, JobResult, JobStatus};

/// Fields to merge into a tracked job. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPatch {
    pub status: Option<JobStatus>,
    pub status_text: Option<String>,
    pub title: Option<String>,
    pub progress_percent: Option<u8>,
    /// `Some(None)` clears the hint.
    pub speed_hint: Option<Option<String>>,
    pub result: Option<JobResult>,
    pub failure_reason: Option<String>,
}

impl JobPatch {
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Merge into `job`, keeping the invariants the registry guarantees:
    /// illegal status transitions are ignored, the title is write-once, and
    /// progress never goes down.
    pub(crate) fn apply_to(self, job: &mut Job) {
        if let Some(status) = self.status {
            if job.status.can_transition_to(status) {
                job.status = status;
            } else {
                tracing::debug!(
                    job_id = %job.id,
                    from = job.status.as_str(),
                    to = status.as_str(),
                    "ignoring illegal status transition"
                );
            }
        }
        if let Some(text) = self.status_text {
            job.status_text = Some(text);
        }
        if let Some(title) = self.title {
            if job.title.is_none() && !title.is_empty() {
                job.title = Some(title);
            }
        }
        if let Some(p) = self.progress_percent {
            job.progress_percent = job.progress_percent.max(p.min(100));
        }
        if let Some(speed) = self.speed_hint {
            job.speed_hint = speed;
        }
        if let Some(result) = self.result {
            job.result = Some(result);
        }
        if let Some(reason) = self.failure_reason {
            job.failure_reason = Some(reason);
        }
    }
}
