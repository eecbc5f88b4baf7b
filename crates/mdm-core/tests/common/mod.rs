#![allow(dead_code)]

pub mod fake_backend;
pub mod http_server;

use std::sync::Arc;
use std::time::Duration;

use mdm_core::history::HistoryStore;
use mdm_core::notify::{ChannelSink, Notification};
use mdm_core::session::{Session, SessionOptions};
use tokio::sync::mpsc::UnboundedReceiver;

pub use fake_backend::FakeBackend;

pub const POLL: Duration = Duration::from_millis(10);

pub fn options(cap: usize) -> SessionOptions {
    SessionOptions {
        max_concurrent_jobs: cap,
        poll_interval: POLL,
        completed_linger: Duration::from_millis(200),
        max_poll_attempts: None,
    }
}

pub fn session_with(
    opts: SessionOptions,
    backend: Arc<FakeBackend>,
) -> (Session, UnboundedReceiver<Notification>) {
    session_with_history(
        opts,
        backend,
        HistoryStore::in_memory(mdm_core::history::DEFAULT_HISTORY_LIMIT),
    )
}

pub fn session_with_history(
    opts: SessionOptions,
    backend: Arc<FakeBackend>,
    history: HistoryStore,
) -> (Session, UnboundedReceiver<Notification>) {
    let (sink, rx) = ChannelSink::new();
    let session = Session::new(opts, backend, Arc::new(sink), history);
    (session, rx)
}

pub fn session(cap: usize) -> (Session, Arc<FakeBackend>, UnboundedReceiver<Notification>) {
    let backend = Arc::new(FakeBackend::new());
    let (session, rx) = session_with(options(cap), Arc::clone(&backend));
    (session, backend, rx)
}

pub fn url(n: usize) -> String {
    format!("https://media.example/watch/{n}")
}

/// Wait until `cond` holds, failing the test after a few seconds.
pub async fn eventually(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for: {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Notifications received so far.
pub fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}
