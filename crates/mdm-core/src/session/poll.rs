//! Per-job Status Poller loop and application of its responses.
//!
//! Every tick issues a new poll ticket and spawns the fetch without waiting
//! for earlier ones; responses are applied in completion order and the
//! registry drops any that were overtaken by a newer one.

use std::sync::Arc;

use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{blocking, Session};
use crate::backend::StatusResponse;
use crate::error::{ErrorKind, Failure};
use crate::history::HistoryEntry;
use crate::job::{JobId, JobPatch, JobResult, JobStatus};
use crate::notify::{ArtifactRef, Notification};
use crate::poller::{
    reconcile, FetchGuard, Outcome, PollTask, MAX_POLLS_IN_FLIGHT, TIMEOUT_REASON,
};
use crate::registry::PollTicket;
use crate::scheduler::HandleState;

enum Tick {
    Poll(PollTicket),
    Busy,
    TimedOut,
    Stop,
}

enum Terminal {
    Complete {
        title: String,
        result: JobResult,
        entry: Option<HistoryEntry>,
    },
    Failed(String),
}

impl Session {
    pub(super) fn start_poller(&self, id: JobId, task: PollTask) {
        let session = self.clone();
        tokio::spawn(async move { session.poll_loop(id, task).await });
    }

    async fn poll_loop(self, id: JobId, task: PollTask) {
        let period = self.inner.opts.poll_interval;
        let max_attempts = self.inner.opts.max_poll_attempts;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if task.is_stopped() {
                break;
            }
            let tick = {
                let mut st = self.state();
                match st.registry.get(&id) {
                    None => Tick::Stop,
                    Some(job) if job.is_terminal() => Tick::Stop,
                    Some(_) => match max_attempts {
                        Some(max) if st.registry.polls_issued(&id) >= u64::from(max) => {
                            Tick::TimedOut
                        }
                        _ if task.in_flight() >= MAX_POLLS_IN_FLIGHT => Tick::Busy,
                        _ => st.registry.issue_poll(&id).map_or(Tick::Stop, Tick::Poll),
                    },
                }
            };
            match tick {
                Tick::Poll(ticket) => {
                    tracing::debug!(job_id = %id, seq = ticket.seq, "poll tick");
                    self.spawn_fetch(ticket, task.clone());
                }
                Tick::Busy => {
                    tracing::debug!(job_id = %id, in_flight = task.in_flight(), "earlier polls unanswered, skipping tick");
                }
                Tick::TimedOut => {
                    tracing::warn!(job_id = %id, "no terminal status after max poll attempts");
                    self.fail_job(&id, TIMEOUT_REASON).await;
                    break;
                }
                Tick::Stop => {
                    // Removed by a cancel, or already finished.
                    task.stop();
                    tracing::debug!(job_id = %id, "poller stopped");
                    break;
                }
            }
        }
    }

    fn spawn_fetch(&self, ticket: PollTicket, task: PollTask) {
        let session = self.clone();
        let guard = task.begin_fetch();
        tokio::spawn(async move { session.poll_once(ticket, task, guard).await });
    }

    async fn poll_once(self, ticket: PollTicket, task: PollTask, guard: FetchGuard) {
        let backend = Arc::clone(&self.inner.backend);
        let id = ticket.job_id.clone();
        let fetched = blocking(move || backend.poll_status(&id)).await;
        drop(guard);
        match fetched {
            Ok(resp) => self.apply_status(ticket, &task, resp).await,
            Err(e) => {
                tracing::warn!(
                    job_id = %ticket.job_id,
                    seq = ticket.seq,
                    kind = %ErrorKind::TransientPollFailure,
                    transient = e.is_transient(),
                    error = %e,
                    "status poll failed, retrying next tick"
                );
            }
        }
    }

    /// Reconcile one status response into the registry and handle a terminal outcome.
    async fn apply_status(&self, ticket: PollTicket, task: &PollTask, resp: StatusResponse) {
        let id = ticket.job_id.clone();
        let terminal = {
            let mut st = self.state();
            if task.is_stopped() || !st.registry.accept_response(&ticket) {
                tracing::debug!(job_id = %id, seq = ticket.seq, "dropping stale or orphaned poll response");
                return;
            }
            let Some(job) = st.registry.get(&id) else {
                return;
            };
            if job.is_terminal() {
                return;
            }
            let reconciled = reconcile(job, &resp);
            st.registry.update(&id, reconciled.patch);
            match reconciled.outcome {
                Outcome::Continue => return,
                Outcome::Complete(result) => {
                    task.stop();
                    st.pollers.remove(&id);
                    let (title, entry) = match st.registry.get(&id) {
                        Some(job) => (job.display_title().to_string(), HistoryEntry::from_job(job)),
                        None => (id.to_string(), None),
                    };
                    Terminal::Complete {
                        title,
                        result,
                        entry,
                    }
                }
                Outcome::Failed(reason) => {
                    task.stop();
                    st.pollers.remove(&id);
                    st.registry.remove(&id);
                    Terminal::Failed(reason)
                }
            }
        };

        match terminal {
            Terminal::Complete {
                title,
                result,
                entry,
            } => {
                tracing::info!(job_id = %id, %title, file = %result.filename, "job complete");
                if let Some(entry) = entry {
                    // Recorded before the slot is handed to the next request.
                    self.record_history(entry).await;
                }
                self.on_job_terminal(&id, HandleState::Completed(id.clone()))
                    .await;
                let artifact = ArtifactRef {
                    url: self.inner.backend.result_url(&id),
                    filename: result.filename,
                };
                self.notify(
                    Notification::success(format!("{title} ready"))
                        .for_job(&id)
                        .with_artifact(artifact),
                );
                self.schedule_removal(id);
            }
            Terminal::Failed(reason) => self.finish_failed(&id, reason).await,
        }
    }

    /// Mark a tracked job Failed, stop its poller and remove it.
    pub(super) async fn fail_job(&self, id: &JobId, reason: &str) {
        let failed = {
            let mut st = self.state();
            match st.registry.get(id) {
                Some(job) if !job.is_terminal() => {
                    if let Some(task) = st.pollers.remove(id) {
                        task.stop();
                    }
                    st.registry.update(
                        id,
                        JobPatch {
                            status: Some(JobStatus::Failed),
                            failure_reason: Some(reason.to_string()),
                            ..JobPatch::default()
                        },
                    );
                    st.registry.remove(id);
                    true
                }
                _ => false,
            }
        };
        if failed {
            self.finish_failed(id, reason.to_string()).await;
        }
    }

    async fn finish_failed(&self, id: &JobId, reason: String) {
        tracing::warn!(job_id = %id, %reason, "job failed");
        self.notify(Notification::error(format!("Download failed: {reason}")).for_job(id));
        self.on_job_terminal(id, HandleState::Failed(Failure::job(id.clone(), reason)))
            .await;
    }

    /// Append to the history log on the blocking pool; the session state stays unlocked.
    async fn record_history(&self, entry: HistoryEntry) {
        let session = self.clone();
        let id = entry.job_id.clone();
        let write = tokio::task::spawn_blocking(move || {
            let recorded = session.history_store().record(entry);
            recorded
        });
        match write.await {
            Ok(Ok(())) => tracing::debug!(job_id = %id, "history recorded"),
            Ok(Err(e)) => tracing::warn!(job_id = %id, error = %format!("{e:#}"), "failed to persist history"),
            Err(e) => tracing::warn!(job_id = %id, error = %e, "history write task failed"),
        }
    }

    /// Remove a Complete job once the linger period has passed.
    fn schedule_removal(&self, id: JobId) {
        let session = self.clone();
        let linger = self.inner.opts.completed_linger;
        tokio::spawn(async move {
            tokio::time::sleep(linger).await;
            let mut st = session.state();
            if st
                .registry
                .get(&id)
                .is_some_and(|job| job.status == JobStatus::Complete)
            {
                st.registry.remove(&id);
                tracing::debug!(job_id = %id, "completed job removed");
            }
        });
    }
}
