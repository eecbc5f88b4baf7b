use tokio::sync::watch;

use crate::error::{ErrorKind, Failure, SessionError};
use crate::job::JobId;

/// Client-local identifier of one submission. Valid before and after admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub(crate) u64);

impl Ticket {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a submission stands, as seen through its [`JobHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleState {
    /// Waiting for a slot, or the create call is in flight.
    Pending,
    /// Admitted and tracked under the backend id.
    Admitted(JobId),
    Completed(JobId),
    /// Admission or the job itself failed.
    Failed(Failure),
    Cancelled,
}

impl HandleState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            HandleState::Completed(_) | HandleState::Failed(_) | HandleState::Cancelled
        )
    }

    pub fn job_id(&self) -> Option<&JobId> {
        match self {
            HandleState::Admitted(id) | HandleState::Completed(id) => Some(id),
            HandleState::Failed(f) => f.job_id.as_ref(),
            _ => None,
        }
    }

    /// How the submission ended, for failed and cancelled ones.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            HandleState::Failed(f) => Some(f.kind),
            HandleState::Cancelled => Some(ErrorKind::Cancelled),
            _ => None,
        }
    }
}

/// Caller's view of one submission.
#[derive(Debug, Clone)]
pub struct JobHandle {
    ticket: Ticket,
    rx: watch::Receiver<HandleState>,
}

impl JobHandle {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn state(&self) -> HandleState {
        self.rx.borrow().clone()
    }

    /// Backend id once admitted.
    pub fn job_id(&self) -> Option<JobId> {
        self.rx.borrow().job_id().cloned()
    }

    /// The failure as a [`SessionError`], if the submission failed.
    pub fn error(&self) -> Option<SessionError> {
        match &*self.rx.borrow() {
            HandleState::Failed(f) => Some(f.to_error()),
            _ => None,
        }
    }

    /// Wait until the submission is no longer pending.
    pub async fn wait_bound(&self) -> HandleState {
        self.wait_until(|s| *s != HandleState::Pending).await
    }

    /// Wait until the submission reached a terminal state.
    pub async fn wait_terminal(&self) -> HandleState {
        self.wait_until(HandleState::is_terminal).await
    }

    async fn wait_until(&self, f: impl FnMut(&HandleState) -> bool) -> HandleState {
        let mut rx = self.rx.clone();
        if let Ok(state) = rx.wait_for(f).await {
            return state.clone();
        }
        // Session dropped; report what we last saw.
        let last = rx.borrow().clone();
        last
    }
}

/// Session side of a handle.
#[derive(Debug)]
pub(crate) struct HandleNotifier {
    tx: watch::Sender<HandleState>,
}

impl HandleNotifier {
    pub(crate) fn set(&self, state: HandleState) {
        self.tx.send_replace(state);
    }
}

pub(crate) fn handle_pair(ticket: Ticket) -> (HandleNotifier, JobHandle) {
    let (tx, rx) = watch::channel(HandleState::Pending);
    (HandleNotifier { tx }, JobHandle { ticket, rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_bound_sees_admission() {
        let (notifier, handle) = handle_pair(Ticket(1));
        assert_eq!(handle.state(), HandleState::Pending);
        let waiter = {
            let h = handle.clone();
            tokio::spawn(async move { h.wait_bound().await })
        };
        notifier.set(HandleState::Admitted(JobId::new("j1")));
        assert_eq!(
            waiter.await.unwrap(),
            HandleState::Admitted(JobId::new("j1"))
        );
        assert_eq!(handle.job_id(), Some(JobId::new("j1")));
    }

    #[tokio::test]
    async fn wait_terminal_returns_last_state_when_notifier_dropped() {
        let (notifier, handle) = handle_pair(Ticket(2));
        notifier.set(HandleState::Admitted(JobId::new("j2")));
        drop(notifier);
        assert_eq!(
            handle.wait_terminal().await,
            HandleState::Admitted(JobId::new("j2"))
        );
    }

    #[test]
    fn terminal_states() {
        assert!(HandleState::Cancelled.is_terminal());
        assert!(HandleState::Failed(Failure::admission("x")).is_terminal());
        assert!(!HandleState::Pending.is_terminal());
        assert!(!HandleState::Admitted(JobId::new("a")).is_terminal());
    }

    #[test]
    fn failed_handle_reports_kind_and_error() {
        let (notifier, handle) = handle_pair(Ticket(3));
        assert!(handle.error().is_none());
        notifier.set(HandleState::Failed(Failure::job(JobId::new("j3"), "Timeout")));
        assert_eq!(handle.state().error_kind(), Some(ErrorKind::JobFailure));
        assert_eq!(handle.job_id(), Some(JobId::new("j3")));
        assert!(matches!(
            handle.error(),
            Some(SessionError::JobFailure { reason, .. }) if reason == "Timeout"
        ));
        assert_eq!(HandleState::Cancelled.error_kind(), Some(ErrorKind::Cancelled));
    }
}
