//! User-initiated cancellation.

use std::sync::Arc;

use super::{Session, SessionState};
use crate::job::{JobId, JobPatch, JobStatus};
use crate::notify::Notification;
use crate::scheduler::{HandleState, JobHandle, Submission, Ticket};

/// What to cancel: a submission (waiting, being created or admitted) or a backend job id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelTarget {
    Ticket(Ticket),
    Job(JobId),
}

impl From<Ticket> for CancelTarget {
    fn from(t: Ticket) -> Self {
        CancelTarget::Ticket(t)
    }
}

impl From<JobId> for CancelTarget {
    fn from(id: JobId) -> Self {
        CancelTarget::Job(id)
    }
}

impl From<&JobId> for CancelTarget {
    fn from(id: &JobId) -> Self {
        CancelTarget::Job(id.clone())
    }
}

impl From<&JobHandle> for CancelTarget {
    fn from(h: &JobHandle) -> Self {
        CancelTarget::Ticket(h.ticket())
    }
}

enum Cancelled {
    Waiting(Submission),
    Creating,
    Active(JobId),
    Nothing,
}

impl Session {
    /// Cancel a submission or job. Returns false if there was nothing to cancel.
    ///
    /// A waiting request is dropped from the wait list without contacting the
    /// backend. An active job has its poller stopped and is removed at once; the
    /// backend cancel is sent in the background and never awaited.
    pub async fn cancel(&self, target: impl Into<CancelTarget>) -> bool {
        let target = target.into();
        let cancelled = {
            let mut st = self.state();
            match &target {
                CancelTarget::Ticket(ticket) => {
                    if let Some(sub) = st.scheduler.cancel_waiting(*ticket) {
                        Cancelled::Waiting(sub)
                    } else if st.scheduler.mark_creating_cancelled(*ticket) {
                        Cancelled::Creating
                    } else {
                        match st.scheduler.job_for_ticket(*ticket) {
                            Some(id) => cancel_active(&mut st, id),
                            None => Cancelled::Nothing,
                        }
                    }
                }
                CancelTarget::Job(id) => cancel_active(&mut st, id.clone()),
            }
        };

        match cancelled {
            Cancelled::Waiting(sub) => {
                tracing::info!(ticket = %sub.ticket, url = %sub.request.source_url, "queued request cancelled");
                sub.notifier.set(HandleState::Cancelled);
                self.notify(Notification::info("Download cancelled"));
                true
            }
            // Admission finishes the cancel once the create call returns.
            Cancelled::Creating => true,
            Cancelled::Active(id) => {
                tracing::info!(job_id = %id, "job cancelled");
                self.fire_cancel(id.clone());
                self.notify(Notification::info("Download cancelled").for_job(&id));
                self.on_job_terminal(&id, HandleState::Cancelled).await;
                true
            }
            Cancelled::Nothing => {
                tracing::debug!(?target, "nothing to cancel");
                false
            }
        }
    }

    /// Send the backend cancel without waiting for it.
    pub(super) fn fire_cancel(&self, id: JobId) {
        let backend = Arc::clone(&self.inner.backend);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = backend.cancel_job(&id) {
                tracing::warn!(job_id = %id, error = %e, "backend cancel failed");
            }
        });
    }
}

fn cancel_active(st: &mut SessionState, id: JobId) -> Cancelled {
    match st.registry.get(&id) {
        Some(job) if !job.is_terminal() => {}
        _ => return Cancelled::Nothing,
    }
    if let Some(task) = st.pollers.remove(&id) {
        task.stop();
    }
    st.registry.update(&id, JobPatch::status(JobStatus::Cancelled));
    st.registry.remove(&id);
    Cancelled::Active(id)
}
