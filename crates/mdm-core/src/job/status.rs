/// Lifecycle status of a job.
///
/// `Queued → Initializing → Running → {Complete | Failed}`; `Cancelled` is
/// reachable from `Initializing` or `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Queued,
    Initializing,
    Running,
    Complete,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Initializing => "initializing",
            JobStatus::Running => "running",
            JobStatus::Complete => "complete",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Complete | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Whether moving from `self` to `target` is a legal lifecycle step.
    /// Re-applying the current status is allowed for non-terminal states.
    pub fn can_transition_to(self, target: JobStatus) -> bool {
        match (self, target) {
            (from, to) if from == to => !from.is_terminal(),
            (JobStatus::Queued, JobStatus::Initializing) => true,
            (JobStatus::Queued, JobStatus::Cancelled) => true,
            (JobStatus::Initializing, JobStatus::Running) => true,
            (JobStatus::Initializing | JobStatus::Running, JobStatus::Complete) => true,
            (JobStatus::Initializing | JobStatus::Running, JobStatus::Failed) => true,
            (JobStatus::Initializing | JobStatus::Running, JobStatus::Cancelled) => true,
            _ => false,
        }
    }
}
