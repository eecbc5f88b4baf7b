//! CLI command handlers, one file per command.

mod batch;
mod download;
mod gif;
mod history;
mod playlist;
pub(crate) mod search;
mod watch;

pub use batch::run_batch;
pub use download::run_download;
pub use gif::run_gif;
pub use history::{run_clear_history, run_history};
pub use playlist::run_playlist;
pub use search::run_search;
