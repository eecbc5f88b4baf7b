//! Saving artifacts and job requests produced from collections and searches.

mod common;

use std::time::Duration;

use common::{eventually, url};
use mdm_core::collection::Candidate;
use mdm_core::error::SessionError;
use mdm_core::job::{JobId, JobRequest};
use mdm_core::scheduler::HandleState;

fn candidate(n: usize) -> Candidate {
    Candidate {
        url: url(n),
        title: format!("Item {n}"),
        thumbnail: None,
        duration: Some(60.0),
        view_count: None,
        uploader: None,
    }
}

#[tokio::test]
async fn save_result_writes_artifact_atomically() {
    let (session, backend, _rx) = common::session(1);
    backend.set_artifact(b"fake video bytes");
    let h = session.submit(JobRequest::with_defaults(url(1))).await.unwrap();
    let id = h.job_id().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = session.save_result(&id, dir.path()).await.unwrap_err();
    assert!(matches!(err, SessionError::NotComplete(_)));
    let err = session
        .save_result(&JobId::new("nope"), dir.path())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::NotFound(_)));

    backend.complete("job-1");
    let state = tokio::time::timeout(Duration::from_secs(5), h.wait_terminal())
        .await
        .unwrap();
    assert!(matches!(state, HandleState::Completed(_)));

    let path = session.save_result(&id, dir.path()).await.unwrap();
    assert_eq!(path, dir.path().join("job-1.mp4"));
    assert_eq!(std::fs::read(&path).unwrap(), b"fake video bytes");
    assert!(!dir.path().join("job-1.mp4.part").exists());
}

#[tokio::test]
async fn collection_items_are_submitted_in_order() {
    let (session, backend, _rx) = common::session(2);
    backend.set_candidates((1..=4).map(candidate).collect());

    let handles = session
        .submit_collection("https://media.example/playlist?list=abc", "mp3", "best")
        .await
        .unwrap();
    assert_eq!(handles.len(), 4);
    assert_eq!(backend.create_calls(), vec![url(1), url(2)]);
    assert_eq!(session.waiting_count(), 2);
    assert!(backend
        .create_requests()
        .iter()
        .all(|r| r.output_format == "mp3" && r.quality_hint == "best"));

    backend.complete("job-1");
    backend.complete("job-2");
    eventually("all items admitted", || backend.create_calls().len() == 4).await;
    assert_eq!(backend.create_calls(), (1..=4).map(url).collect::<Vec<_>>());
    session.shutdown();
}

#[tokio::test]
async fn empty_collection_url_is_invalid() {
    let (session, backend, _rx) = common::session(2);
    let err = session.submit_collection("  ", "mp4", "720p").await.unwrap_err();
    assert!(matches!(err, SessionError::InvalidRequest(_)));
    assert!(backend.create_calls().is_empty());
}

#[tokio::test]
async fn search_returns_backend_candidates() {
    let (session, backend, _rx) = common::session(2);
    backend.set_candidates(vec![candidate(7), candidate(8)]);
    let results = session.search("cats").await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].title, "Item 7");
    assert!(backend.create_calls().is_empty());
}

#[tokio::test]
async fn history_clear_is_persisted_and_notified() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    let backend = std::sync::Arc::new(common::FakeBackend::new());
    let (sink, mut rx) = mdm_core::notify::ChannelSink::new();
    let session = mdm_core::session::Session::new(
        common::options(1),
        backend.clone(),
        std::sync::Arc::new(sink),
        mdm_core::history::HistoryStore::load(&path, 50),
    );

    let h = session.submit(JobRequest::with_defaults(url(1))).await.unwrap();
    backend.complete("job-1");
    tokio::time::timeout(Duration::from_secs(5), h.wait_terminal())
        .await
        .unwrap();
    let reloaded = mdm_core::history::HistoryStore::load(&path, 50);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.entries()[0].job_id, JobId::new("job-1"));

    session.clear_history().unwrap();
    assert!(session.history().is_empty());
    assert!(mdm_core::history::HistoryStore::load(&path, 50).is_empty());
    assert!(common::drain(&mut rx)
        .iter()
        .any(|n| n.message == "History cleared"));
}
