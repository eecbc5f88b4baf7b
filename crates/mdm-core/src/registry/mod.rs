//! Job registry: the authoritative in-memory set of tracked jobs.
//!
//! Besides the job records, the registry hands out the per-job poll sequence
//! numbers and remembers the newest one applied, so a poll response that
//! completes after a newer one can be recognised as stale and dropped.

use std::collections::HashMap;

use crate::error::SessionError;
use crate::job::{Job, JobId, JobPatch, JobRequest};

/// Identifies one issued status poll: which job, and its order among that job's polls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTicket {
    pub job_id: JobId,
    pub seq: u64,
}

#[derive(Debug)]
struct Tracked {
    job: Job,
    /// Admission order, used for stable listing.
    order: u64,
    /// Sequence of the most recently issued poll.
    issued_seq: u64,
    /// Sequence of the newest poll whose response was applied.
    applied_seq: u64,
}

/// In-memory registry of tracked jobs.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<JobId, Tracked>,
    next_order: u64,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a job under the backend-assigned `id`.
    /// The job starts `Initializing` with 0% progress.
    pub fn create(&mut self, id: JobId, request: JobRequest) -> Result<Job, SessionError> {
        request.validate()?;
        let job = Job::new(id.clone(), request);
        self.next_order += 1;
        self.jobs.insert(
            id,
            Tracked {
                job: job.clone(),
                order: self.next_order,
                issued_seq: 0,
                applied_seq: 0,
            },
        );
        Ok(job)
    }

    pub fn get(&self, id: &JobId) -> Option<&Job> {
        self.jobs.get(id).map(|t| &t.job)
    }

    /// Merge `patch` into the job. Returns false (and does nothing) if the job
    /// is no longer tracked; removal racing with an in-flight poll is expected.
    pub fn update(&mut self, id: &JobId, patch: JobPatch) -> bool {
        match self.jobs.get_mut(id) {
            Some(t) => {
                patch.apply_to(&mut t.job);
                true
            }
            None => false,
        }
    }

    /// Stop tracking the job. Idempotent.
    pub fn remove(&mut self, id: &JobId) -> Option<Job> {
        self.jobs.remove(id).map(|t| t.job)
    }

    /// Number of tracked jobs that are not in a terminal state.
    pub fn count(&self) -> usize {
        self.jobs.values().filter(|t| !t.job.is_terminal()).count()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Snapshots of all tracked jobs in admission order.
    pub fn list(&self) -> Vec<Job> {
        let mut tracked: Vec<&Tracked> = self.jobs.values().collect();
        tracked.sort_by_key(|t| t.order);
        tracked.into_iter().map(|t| t.job.clone()).collect()
    }

    /// Issue the next poll ticket for a job, or None if the job is gone.
    pub fn issue_poll(&mut self, id: &JobId) -> Option<PollTicket> {
        let t = self.jobs.get_mut(id)?;
        t.issued_seq += 1;
        Some(PollTicket {
            job_id: id.clone(),
            seq: t.issued_seq,
        })
    }

    /// Record that the response for `ticket` is being applied.
    /// Returns false if the job is gone or a newer response was already applied.
    pub fn accept_response(&mut self, ticket: &PollTicket) -> bool {
        match self.jobs.get_mut(&ticket.job_id) {
            Some(t) if ticket.seq > t.applied_seq => {
                t.applied_seq = ticket.seq;
                true
            }
            _ => false,
        }
    }

    /// Number of polls issued for a job so far.
    pub fn polls_issued(&self, id: &JobId) -> u64 {
        self.jobs.get(id).map(|t| t.issued_seq).unwrap_or(0)
    }
}
