//! The Download Session: one explicit context owning the registry, the
//! scheduler, the running pollers and the history store.
//!
//! All registry and wait-list mutations happen under a single mutex that is
//! never held across an `.await`, which serializes them the same way a single
//! event loop would. Backend calls are blocking and run on tokio's blocking
//! pool, so ticks of other pollers and user actions interleave with them.
//!
//! A `Session` must be used from within a tokio runtime.

mod admit;
mod cancel;
mod poll;
mod result;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::backend::{Backend, BackendError};
use crate::collection::{requests_from_candidates, Candidate};
use crate::config::MdmConfig;
use crate::error::SessionError;
use crate::history::{HistoryEntry, HistoryStore};
use crate::job::{Job, JobId, JobRequest};
use crate::notify::{Notification, NotificationSink};
use crate::poller::PollTask;
use crate::registry::JobRegistry;
use crate::scheduler::{JobHandle, QueueScheduler};

pub use cancel::CancelTarget;

/// Tunables of a session.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub max_concurrent_jobs: usize,
    pub poll_interval: Duration,
    /// How long a Complete job stays in the registry before removal.
    pub completed_linger: Duration,
    /// Fail a job with reason `Timeout` after this many polls.
    pub max_poll_attempts: Option<u32>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&MdmConfig::default())
    }
}

impl From<&MdmConfig> for SessionOptions {
    fn from(cfg: &MdmConfig) -> Self {
        Self {
            max_concurrent_jobs: cfg.max_concurrent_jobs,
            poll_interval: cfg.poll_interval(),
            completed_linger: cfg.completed_linger(),
            max_poll_attempts: cfg.max_poll_attempts,
        }
    }
}

struct SessionState {
    registry: JobRegistry,
    scheduler: QueueScheduler,
    pollers: HashMap<JobId, PollTask>,
}

struct Inner {
    opts: SessionOptions,
    backend: Arc<dyn Backend>,
    sink: Arc<dyn NotificationSink>,
    state: Mutex<SessionState>,
    history: Mutex<HistoryStore>,
    /// Held from slot reservation until the create call returns, so backend
    /// jobs are created in submission order.
    admission: tokio::sync::Mutex<()>,
}

/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("opts", &self.inner.opts)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(
        opts: SessionOptions,
        backend: Arc<dyn Backend>,
        sink: Arc<dyn NotificationSink>,
        history: HistoryStore,
    ) -> Self {
        let scheduler = QueueScheduler::new(opts.max_concurrent_jobs);
        Self {
            inner: Arc::new(Inner {
                opts,
                backend,
                sink,
                state: Mutex::new(SessionState {
                    registry: JobRegistry::new(),
                    scheduler,
                    pollers: HashMap::new(),
                }),
                history: Mutex::new(history),
                admission: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.inner.opts
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn history_store(&self) -> MutexGuard<'_, HistoryStore> {
        self.inner.history.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn notify(&self, notification: Notification) {
        self.inner.sink.notify(notification);
    }

    /// Submit one request. Invalid requests are rejected here, before any
    /// backend call. Otherwise the request is admitted now if a slot is free,
    /// or appended to the wait list; the handle reports what happens next.
    pub async fn submit(&self, request: JobRequest) -> Result<JobHandle, SessionError> {
        request.validate()?;
        let admission = self.inner.admission.lock().await;
        let (handle, admit_now) = {
            let mut st = self.state();
            let active = st.registry.count();
            let (submission, handle) = st.scheduler.issue(request);
            if st.scheduler.try_reserve(active, submission.ticket) {
                (handle, Some(submission))
            } else {
                tracing::info!(
                    ticket = %submission.ticket,
                    url = %submission.request.source_url,
                    waiting = st.scheduler.waiting_len() + 1,
                    "concurrency cap reached, request queued"
                );
                st.scheduler.enqueue(submission);
                (handle, None)
            }
        };
        if let Some(submission) = admit_now {
            let admitted = self.admit(submission).await;
            drop(admission);
            if !admitted {
                self.promote().await;
            }
        }
        Ok(handle)
    }

    /// Submit several requests in order. Nothing is submitted if any request is invalid.
    pub async fn submit_batch(
        &self,
        requests: Vec<JobRequest>,
    ) -> Result<Vec<JobHandle>, SessionError> {
        for r in &requests {
            r.validate()?;
        }
        let mut handles = Vec::with_capacity(requests.len());
        for r in requests {
            handles.push(self.submit(r).await?);
        }
        Ok(handles)
    }

    /// Search the backend for candidate sources.
    pub async fn search(&self, query: &str) -> Result<Vec<Candidate>, SessionError> {
        let backend = Arc::clone(&self.inner.backend);
        let query = query.to_string();
        Ok(blocking(move || backend.search(&query)).await?)
    }

    /// Expand a collection URL into its items.
    pub async fn resolve_collection(&self, url: &str) -> Result<Vec<Candidate>, SessionError> {
        let backend = Arc::clone(&self.inner.backend);
        let url = url.trim().to_string();
        if url.is_empty() {
            return Err(SessionError::InvalidRequest("collection URL is empty".into()));
        }
        Ok(blocking(move || backend.resolve_collection(&url)).await?)
    }

    /// Resolve a collection and submit one request per item, in order.
    pub async fn submit_collection(
        &self,
        url: &str,
        format: &str,
        quality: &str,
    ) -> Result<Vec<JobHandle>, SessionError> {
        let items = self.resolve_collection(url).await?;
        tracing::info!(url, items = items.len(), "collection resolved");
        self.submit_batch(requests_from_candidates(&items, format, quality))
            .await
    }

    pub fn job(&self, id: &JobId) -> Option<Job> {
        self.state().registry.get(id).cloned()
    }

    /// Snapshots of all tracked jobs in admission order.
    pub fn jobs(&self) -> Vec<Job> {
        self.state().registry.list()
    }

    /// Number of admitted, non-terminal jobs.
    pub fn active_count(&self) -> usize {
        self.state().registry.count()
    }

    pub fn waiting_count(&self) -> usize {
        self.state().scheduler.waiting_len()
    }

    /// Current history log, most recent first.
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history_store().entries().to_vec()
    }

    /// Empty the history log. Confirmation is the caller's concern.
    pub fn clear_history(&self) -> anyhow::Result<()> {
        self.history_store().clear()?;
        self.notify(Notification::info("History cleared"));
        Ok(())
    }

    /// Stop every poller. Tracked jobs stay in the registry; the backend is not contacted.
    pub fn shutdown(&self) {
        let mut st = self.state();
        for (_, task) in st.pollers.drain() {
            task.stop();
        }
    }
}

/// Run a blocking backend call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, BackendError>
where
    F: FnOnce() -> Result<T, BackendError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BackendError::Task(e.to_string()))?
}
