//! Queue Scheduler: admission decisions under the concurrency cap.
//!
//! The scheduler is bookkeeping only; the session performs the backend calls.
//! A submission is either *waiting* (FIFO wait list), *creating* (a slot is
//! reserved while its create call is in flight) or *bound* to an admitted
//! job id. The cap check counts reserved slots, so submissions racing with an
//! in-flight create call cannot overshoot it.

mod handle;

use std::collections::{HashMap, VecDeque};

use crate::job::{JobId, JobRequest};

pub use handle::{HandleState, JobHandle, Ticket};
pub(crate) use handle::HandleNotifier;

/// A request that has not been admitted yet.
#[derive(Debug)]
pub struct Submission {
    pub ticket: Ticket,
    pub request: JobRequest,
    pub(crate) notifier: HandleNotifier,
}

#[derive(Debug)]
pub struct QueueScheduler {
    cap: usize,
    next_ticket: u64,
    waiting: VecDeque<Submission>,
    /// Tickets whose create call is in flight; `true` once cancelled meanwhile.
    creating: HashMap<Ticket, bool>,
    bound: HashMap<JobId, (Ticket, HandleNotifier)>,
}

impl QueueScheduler {
    /// Scheduler admitting at most `cap` jobs at a time (at least one).
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            next_ticket: 0,
            waiting: VecDeque::new(),
            creating: HashMap::new(),
            bound: HashMap::new(),
        }
    }

    /// Allocate a ticket and its handle for `request`.
    pub fn issue(&mut self, request: JobRequest) -> (Submission, JobHandle) {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        let (notifier, handle) = handle::handle_pair(ticket);
        (
            Submission {
                ticket,
                request,
                notifier,
            },
            handle,
        )
    }

    fn has_free_slot(&self, active: usize) -> bool {
        active + self.creating.len() < self.cap
    }

    /// Reserve a slot for an immediate admission. Fails when the cap is
    /// reached or earlier submissions are still waiting.
    pub fn try_reserve(&mut self, active: usize, ticket: Ticket) -> bool {
        if !self.waiting.is_empty() || !self.has_free_slot(active) {
            return false;
        }
        self.creating.insert(ticket, false);
        true
    }

    pub fn enqueue(&mut self, submission: Submission) {
        self.waiting.push_back(submission);
    }

    /// Pop the head of the wait list if a slot is free, reserving that slot.
    pub fn pop_next(&mut self, active: usize) -> Option<Submission> {
        if !self.has_free_slot(active) {
            return None;
        }
        let next = self.waiting.pop_front()?;
        self.creating.insert(next.ticket, false);
        Some(next)
    }

    /// Give back the slot reserved for `ticket`. Returns true if the
    /// submission was cancelled while its create call was in flight.
    pub fn release(&mut self, ticket: Ticket) -> bool {
        self.creating.remove(&ticket).unwrap_or(false)
    }

    /// Remove a waiting submission. None if `ticket` is not waiting.
    pub fn cancel_waiting(&mut self, ticket: Ticket) -> Option<Submission> {
        let pos = self.waiting.iter().position(|s| s.ticket == ticket)?;
        self.waiting.remove(pos)
    }

    /// Flag a submission whose create call is in flight as cancelled.
    pub fn mark_creating_cancelled(&mut self, ticket: Ticket) -> bool {
        match self.creating.get_mut(&ticket) {
            Some(cancelled) => {
                *cancelled = true;
                true
            }
            None => false,
        }
    }

    /// Bind an admitted submission to its job id and tell the handle.
    pub(crate) fn bind(&mut self, ticket: Ticket, id: JobId, notifier: HandleNotifier) {
        notifier.set(HandleState::Admitted(id.clone()));
        self.bound.insert(id, (ticket, notifier));
    }

    /// Drop the binding of a job that reached a terminal state.
    pub(crate) fn unbind(&mut self, id: &JobId) -> Option<HandleNotifier> {
        self.bound.remove(id).map(|(_, n)| n)
    }

    pub fn job_for_ticket(&self, ticket: Ticket) -> Option<JobId> {
        self.bound
            .iter()
            .find(|(_, (t, _))| *t == ticket)
            .map(|(id, _)| id.clone())
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting.len()
    }

    pub fn reserved(&self) -> usize {
        self.creating.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(n: usize) -> JobRequest {
        JobRequest::with_defaults(format!("https://v.example/{n}"))
    }

    #[test]
    fn reservations_count_against_cap() {
        let mut s = QueueScheduler::new(2);
        let (a, _) = s.issue(req(1));
        let (b, _) = s.issue(req(2));
        let (c, _) = s.issue(req(3));
        assert!(s.try_reserve(0, a.ticket));
        assert!(s.try_reserve(0, b.ticket));
        assert!(!s.try_reserve(0, c.ticket));
        assert_eq!(s.reserved(), 2);

        assert!(!s.release(a.ticket));
        // One job active, one still creating.
        assert!(!s.try_reserve(1, c.ticket));
        s.release(b.ticket);
        assert!(s.try_reserve(1, c.ticket));
    }

    #[test]
    fn wait_list_is_fifo_and_blocks_overtaking() {
        let mut s = QueueScheduler::new(1);
        let subs: Vec<Submission> = (0..4).map(|n| s.issue(req(n)).0).collect();
        let tickets: Vec<Ticket> = subs.iter().map(|s| s.ticket).collect();
        for sub in subs {
            s.enqueue(sub);
        }
        let (late, _) = s.issue(req(9));
        // Slot free, but earlier submissions are waiting.
        assert!(!s.try_reserve(0, late.ticket));

        let first = s.pop_next(0).unwrap();
        assert_eq!(first.ticket, tickets[0]);
        assert!(s.pop_next(0).is_none(), "reserved slot counts");
        s.release(first.ticket);
        assert!(s.pop_next(1).is_none(), "active job counts");
        assert_eq!(s.pop_next(0).unwrap().ticket, tickets[1]);
    }

    #[test]
    fn cancel_waiting_and_creating() {
        let mut s = QueueScheduler::new(1);
        let (a, _) = s.issue(req(1));
        let (b, handle_b) = s.issue(req(2));
        assert!(s.try_reserve(0, a.ticket));
        s.enqueue(b);

        let removed = s.cancel_waiting(handle_b.ticket()).unwrap();
        assert_eq!(removed.request.source_url, "https://v.example/2");
        assert!(s.cancel_waiting(handle_b.ticket()).is_none());
        assert_eq!(s.waiting_len(), 0);

        assert!(s.mark_creating_cancelled(a.ticket));
        assert!(s.release(a.ticket));
        assert!(!s.mark_creating_cancelled(a.ticket));
    }

    #[test]
    fn binding_notifies_handle() {
        let mut s = QueueScheduler::new(3);
        let (sub, handle) = s.issue(req(1));
        let id = JobId::new("job-1");
        s.bind(sub.ticket, id.clone(), sub.notifier);
        assert_eq!(handle.state(), HandleState::Admitted(id.clone()));
        assert_eq!(s.job_for_ticket(handle.ticket()), Some(id.clone()));

        let n = s.unbind(&id).unwrap();
        n.set(HandleState::Completed(id.clone()));
        assert_eq!(handle.state(), HandleState::Completed(id));
        assert!(s.job_for_ticket(handle.ticket()).is_none());
    }
}
