//! Scriptable in-process backend with call counters.
//!
//! Job ids are assigned as `job-1`, `job-2`, ... in order of successful
//! create calls. Polls return the next scripted response for the job if any,
//! otherwise a status derived from `complete`/`fail`, otherwise a plain
//! "Downloading..." status.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

use mdm_core::backend::{Backend, BackendError, StatusResponse};
use mdm_core::collection::Candidate;
use mdm_core::job::{JobId, JobRequest};

pub const RUNNING: &str = r#"{"status": "Downloading..."}"#;

#[derive(Default)]
struct State {
    next_id: u64,
    create_calls: Vec<String>,
    create_requests: Vec<JobRequest>,
    create_failures: HashMap<String, String>,
    create_delay: Duration,
    scripts: HashMap<String, VecDeque<(String, Duration)>>,
    completed: HashSet<String>,
    failed: HashMap<String, String>,
    poll_counts: HashMap<String, u64>,
    cancel_calls: Vec<String>,
    artifact: Vec<u8>,
    candidates: Vec<Candidate>,
}

#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn st(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Create calls for `url` are answered with `{error: reason}`.
    pub fn fail_create(&self, url: &str, reason: &str) {
        self.st()
            .create_failures
            .insert(url.to_string(), reason.to_string());
    }

    /// Every create call blocks for `delay` before answering.
    pub fn set_create_delay(&self, delay: Duration) {
        self.st().create_delay = delay;
    }

    /// Queue a response for the next poll of `id`, delivered after `delay`.
    pub fn script(&self, id: &str, json: &str, delay: Duration) {
        self.st()
            .scripts
            .entry(id.to_string())
            .or_default()
            .push_back((json.to_string(), delay));
    }

    /// From now on `id` reports completion (after any scripted responses).
    pub fn complete(&self, id: &str) {
        self.st().completed.insert(id.to_string());
    }

    /// From now on `id` reports an error.
    pub fn fail(&self, id: &str, reason: &str) {
        self.st().failed.insert(id.to_string(), reason.to_string());
    }

    pub fn set_artifact(&self, bytes: &[u8]) {
        self.st().artifact = bytes.to_vec();
    }

    pub fn set_candidates(&self, candidates: Vec<Candidate>) {
        self.st().candidates = candidates;
    }

    /// Source URLs of all create calls, in call order.
    pub fn create_calls(&self) -> Vec<String> {
        self.st().create_calls.clone()
    }

    pub fn create_requests(&self) -> Vec<JobRequest> {
        self.st().create_requests.clone()
    }

    pub fn cancel_calls(&self) -> Vec<String> {
        self.st().cancel_calls.clone()
    }

    pub fn poll_count(&self, id: &str) -> u64 {
        self.st().poll_counts.get(id).copied().unwrap_or(0)
    }
}

pub fn complete_json(id: &str) -> String {
    format!(
        r#"{{"status": "Complete!", "title": "Video {id}", "filepath": "/srv/out/{id}.mp4", "filesize": 2048}}"#
    )
}

impl Backend for FakeBackend {
    fn create_job(&self, request: &JobRequest) -> Result<JobId, BackendError> {
        let delay = {
            let mut st = self.st();
            st.create_calls.push(request.source_url.clone());
            st.create_requests.push(request.clone());
            st.create_delay
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let mut st = self.st();
        if let Some(reason) = st.create_failures.get(&request.source_url) {
            return Err(BackendError::Rejected(reason.clone()));
        }
        st.next_id += 1;
        Ok(JobId::new(format!("job-{}", st.next_id)))
    }

    fn poll_status(&self, id: &JobId) -> Result<StatusResponse, BackendError> {
        let (json, delay) = {
            let mut st = self.st();
            *st.poll_counts.entry(id.to_string()).or_default() += 1;
            let scripted = st
                .scripts
                .get_mut(id.as_str())
                .and_then(|q| q.pop_front());
            match scripted {
                Some(s) => s,
                None if st.failed.contains_key(id.as_str()) => (
                    format!(r#"{{"status": "Error", "error": "{}"}}"#, st.failed[id.as_str()]),
                    Duration::ZERO,
                ),
                None if st.completed.contains(id.as_str()) => {
                    (complete_json(id.as_str()), Duration::ZERO)
                }
                None => (RUNNING.to_string(), Duration::ZERO),
            }
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        Ok(serde_json::from_str(&json)?)
    }

    fn cancel_job(&self, id: &JobId) -> Result<(), BackendError> {
        self.st().cancel_calls.push(id.to_string());
        Ok(())
    }

    fn fetch_result(&self, _id: &JobId, out: &mut dyn Write) -> Result<u64, BackendError> {
        let bytes = self.st().artifact.clone();
        out.write_all(&bytes)?;
        Ok(bytes.len() as u64)
    }

    fn result_url(&self, id: &JobId) -> String {
        format!("http://fake/api/download-file/{id}")
    }

    fn search(&self, _query: &str) -> Result<Vec<Candidate>, BackendError> {
        Ok(self.st().candidates.clone())
    }

    fn resolve_collection(&self, _url: &str) -> Result<Vec<Candidate>, BackendError> {
        Ok(self.st().candidates.clone())
    }
}
