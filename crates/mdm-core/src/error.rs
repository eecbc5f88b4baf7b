//! Session error types and the failure taxonomy.

use crate::backend::BackendError;
use crate::job::JobId;

/// How a failure is treated by the session (see `SessionError::kind`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed submission; rejected before any backend call.
    InvalidRequest,
    /// Backend rejected job creation; consumes no concurrency slot.
    AdmissionFailure,
    /// Status fetch failed; retried on the next tick, never terminal by itself.
    TransientPollFailure,
    /// Backend reported an explicit error for a job; terminal.
    JobFailure,
    /// User-initiated; terminal but not a failure.
    Cancelled,
}

impl ErrorKind {
    /// Terminal kinds are surfaced exactly once and end the job's lifecycle.
    pub fn is_terminal(self) -> bool {
        !matches!(self, ErrorKind::TransientPollFailure)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::AdmissionFailure => "admission_failure",
            ErrorKind::TransientPollFailure => "transient_poll_failure",
            ErrorKind::JobFailure => "job_failure",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of one submission, as reported through its handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    /// Backend id, when the job got one before failing.
    pub job_id: Option<JobId>,
    pub reason: String,
}

impl Failure {
    /// The backend refused to create the job.
    pub fn admission(reason: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::AdmissionFailure,
            job_id: None,
            reason: reason.into(),
        }
    }

    /// A tracked job failed (backend error or timeout).
    pub fn job(id: JobId, reason: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::JobFailure,
            job_id: Some(id),
            reason: reason.into(),
        }
    }

    /// Failure for an error raised while admitting a submission.
    pub(crate) fn from_admission_error(err: &SessionError) -> Self {
        Self {
            kind: err.kind().unwrap_or(ErrorKind::AdmissionFailure),
            job_id: None,
            reason: err.to_string(),
        }
    }

    /// The matching [`SessionError`].
    pub fn to_error(&self) -> SessionError {
        match (self.kind, &self.job_id) {
            (ErrorKind::JobFailure, Some(id)) => SessionError::JobFailure {
                job_id: id.clone(),
                reason: self.reason.clone(),
            },
            (ErrorKind::InvalidRequest, _) => SessionError::InvalidRequest(self.reason.clone()),
            _ => SessionError::AdmissionFailure(self.reason.clone()),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("backend rejected job: {0}")]
    AdmissionFailure(String),
    #[error("job {job_id} failed: {reason}")]
    JobFailure { job_id: JobId, reason: String },
    #[error("job {0} is not tracked")]
    NotFound(JobId),
    #[error("job {0} has no result yet")]
    NotComplete(JobId),
    #[error("backend call failed: {0}")]
    Backend(#[from] BackendError),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Taxonomy kind of this error, if it belongs to the job lifecycle.
    ///
    /// Backend errors from searches, collection lookups and artifact saves are
    /// not part of a job's lifecycle and have no kind; failed status polls never
    /// surface as a `SessionError` at all.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            SessionError::InvalidRequest(_) => Some(ErrorKind::InvalidRequest),
            SessionError::AdmissionFailure(_) => Some(ErrorKind::AdmissionFailure),
            SessionError::JobFailure { .. } => Some(ErrorKind::JobFailure),
            SessionError::Backend(_)
            | SessionError::NotFound(_)
            | SessionError::NotComplete(_)
            | SessionError::Io(_) => None,
        }
    }
}
