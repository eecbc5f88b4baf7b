//! Admission and promotion of submissions.

use std::sync::Arc;

use super::{blocking, Session};
use crate::error::Failure;
use crate::job::JobId;
use crate::notify::Notification;
use crate::poller::PollTask;
use crate::scheduler::{HandleState, Submission};

/// Why a reserved submission did not become a tracked job.
enum NotAdmitted {
    /// Cancelled while the create call was in flight; the id is set if the backend created it anyway.
    Cancelled(Option<JobId>),
    Failed(Failure),
}

impl Session {
    /// Run the create call for a submission holding a reserved slot and start
    /// tracking the job. Returns true if a job now occupies the slot.
    pub(super) async fn admit(&self, submission: Submission) -> bool {
        let Submission {
            ticket,
            request,
            notifier,
        } = submission;
        let url = request.source_url.clone();
        let backend = Arc::clone(&self.inner.backend);
        let req = request.clone();
        let created = blocking(move || backend.create_job(&req)).await;

        let admitted = {
            let mut st = self.state();
            let cancelled = st.scheduler.release(ticket);
            match created {
                Ok(id) if cancelled => Err((notifier, NotAdmitted::Cancelled(Some(id)))),
                Err(_) if cancelled => Err((notifier, NotAdmitted::Cancelled(None))),
                Err(e) => Err((notifier, NotAdmitted::Failed(Failure::admission(e.to_string())))),
                Ok(id) => match st.registry.create(id.clone(), request) {
                    Ok(_) => {
                        let task = PollTask::new();
                        if let Some(previous) = st.pollers.insert(id.clone(), task.clone()) {
                            previous.stop();
                        }
                        st.scheduler.bind(ticket, id.clone(), notifier);
                        self.start_poller(id.clone(), task);
                        tracing::info!(
                            %ticket,
                            job_id = %id,
                            %url,
                            active = st.registry.count(),
                            "job admitted"
                        );
                        Ok(id)
                    }
                    Err(e) => Err((notifier, NotAdmitted::Failed(Failure::from_admission_error(&e)))),
                },
            }
        };

        match admitted {
            Ok(id) => {
                self.notify(Notification::info("Download started").for_job(&id));
                true
            }
            Err((notifier, NotAdmitted::Cancelled(id))) => {
                tracing::info!(%ticket, %url, "submission cancelled during job creation");
                notifier.set(HandleState::Cancelled);
                if let Some(id) = id {
                    self.fire_cancel(id);
                }
                self.notify(Notification::info("Download cancelled"));
                false
            }
            Err((notifier, NotAdmitted::Failed(failure))) => {
                tracing::warn!(%ticket, %url, kind = %failure.kind, reason = %failure.reason, "admission failed");
                self.notify(Notification::error(format!("Download failed: {}", failure.reason)));
                notifier.set(HandleState::Failed(failure));
                false
            }
        }
    }

    /// Admit wait-listed submissions, head first, while slots are free.
    /// The cap is re-checked before each promotion.
    pub(super) async fn promote(&self) {
        loop {
            let _admission = self.inner.admission.lock().await;
            let next = {
                let mut st = self.state();
                let active = st.registry.count();
                st.scheduler.pop_next(active)
            };
            match next {
                Some(submission) => {
                    tracing::debug!(ticket = %submission.ticket, "promoting queued request");
                    self.admit(submission).await;
                }
                None => break,
            }
        }
    }

    /// A job reached a terminal state: settle its handle and refill the freed slot.
    pub(super) async fn on_job_terminal(&self, id: &JobId, state: HandleState) {
        let notifier = self.state().scheduler.unbind(id);
        if let Some(notifier) = notifier {
            notifier.set(state);
        }
        self.promote().await;
    }
}
