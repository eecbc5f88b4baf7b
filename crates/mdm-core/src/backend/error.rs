//! Backend call errors.

/// Error returned by a backend call. Used so the session can tell a rejected
/// job apart from a transport problem before logging or surfacing it.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u32, body: String },
    /// Response body was not the expected JSON.
    #[error("invalid response: {0}")]
    Decode(#[from] serde_json::Error),
    /// Backend answered with an explicit `error` field.
    #[error("{0}")]
    Rejected(String),
    /// The configured API URL cannot carry endpoint paths.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
    /// Writing the artifact locally failed.
    #[error("storage: {0}")]
    Io(#[from] std::io::Error),
    /// The blocking task running the call panicked or was cancelled.
    #[error("backend task: {0}")]
    Task(String),
}

impl BackendError {
    /// Throttling and 5xx answers, timeouts and connection failures: worth trying again later.
    pub fn is_transient(&self) -> bool {
        match self {
            BackendError::Curl(e) => {
                e.is_operation_timedout()
                    || e.is_couldnt_connect()
                    || e.is_couldnt_resolve_host()
                    || e.is_recv_error()
                    || e.is_send_error()
                    || e.is_got_nothing()
            }
            BackendError::Http { status, .. } => *status == 429 || (500..=599).contains(status),
            BackendError::Task(_) => true,
            BackendError::Decode(_)
            | BackendError::Rejected(_)
            | BackendError::InvalidUrl(_)
            | BackendError::Io(_) => false,
        }
    }
}
