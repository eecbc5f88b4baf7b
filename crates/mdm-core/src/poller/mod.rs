//! Status Poller building blocks.
//!
//! A poller is one repeating task per admitted job; the session drives it
//! (see `session::poll`). This module holds the pieces that do not need the
//! session: the stop handle and the reconciliation of a status response into
//! a job patch.

mod reconcile;
mod task;

pub use reconcile::{is_complete_status, reconcile, Outcome, Reconciled};
pub use task::{FetchGuard, PollTask};

/// Failure reason of a job that exceeded `max_poll_attempts`.
pub const TIMEOUT_REASON: &str = "Timeout";

/// Ticks are skipped while this many status fetches of the job are unanswered.
pub const MAX_POLLS_IN_FLIGHT: usize = 4;
