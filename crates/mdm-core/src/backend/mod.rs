//! Contract with the job-processing backend.
//!
//! The session only talks to the backend through the [`Backend`] trait. Calls
//! are blocking (libcurl); the session runs them on tokio's blocking pool so
//! other pollers and user actions keep going while a call is in flight.

mod error;
mod http;
mod wire;

use std::io::Write;

use crate::collection::Candidate;
use crate::job::{JobId, JobRequest};

pub use error::BackendError;
pub use http::CurlBackend;
pub use wire::{CreateResponse, Field, ProgressWire, RawPercent, StatusResponse};

/// Operations the session needs from the backend.
pub trait Backend: Send + Sync + 'static {
    /// Create a job; returns the backend-assigned id.
    /// A `{error}` reply is reported as `BackendError::Rejected`.
    fn create_job(&self, request: &JobRequest) -> Result<JobId, BackendError>;

    /// Fetch the current status of a job.
    fn poll_status(&self, id: &JobId) -> Result<StatusResponse, BackendError>;

    /// Ask the backend to stop a job. The reply body is ignored.
    fn cancel_job(&self, id: &JobId) -> Result<(), BackendError>;

    /// Stream the produced artifact into `out`; returns the number of bytes written.
    fn fetch_result(&self, id: &JobId, out: &mut dyn Write) -> Result<u64, BackendError>;

    /// Where the artifact of a completed job can be retrieved from.
    fn result_url(&self, id: &JobId) -> String;

    /// Search for candidate sources.
    fn search(&self, query: &str) -> Result<Vec<Candidate>, BackendError>;

    /// Expand a multi-item source (e.g. a playlist) into its items, in order.
    fn resolve_collection(&self, url: &str) -> Result<Vec<Candidate>, BackendError>;
}
