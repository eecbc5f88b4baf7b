//! Building the session used by the download commands.

use anyhow::{Context, Result};
use mdm_core::backend::CurlBackend;
use mdm_core::config::MdmConfig;
use mdm_core::history::{self, HistoryStore};
use mdm_core::notify::{ChannelSink, Notification};
use mdm_core::session::{Session, SessionOptions};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

/// History log at its default location, capped as configured.
pub fn load_history(cfg: &MdmConfig) -> Result<HistoryStore> {
    let path = history::default_path().context("locate history file")?;
    Ok(HistoryStore::load(path, cfg.history_limit))
}

/// Session talking to the configured backend; notifications arrive on the receiver.
pub fn open(cfg: &MdmConfig) -> Result<(Session, UnboundedReceiver<Notification>)> {
    let backend = CurlBackend::from_config(cfg)
        .with_context(|| format!("invalid api_url in config: {}", cfg.api_url))?;
    let (sink, rx) = ChannelSink::new();
    let session = Session::new(
        SessionOptions::from(cfg),
        Arc::new(backend),
        Arc::new(sink),
        load_history(cfg)?,
    );
    tracing::debug!(api_url = %cfg.api_url, "session opened");
    Ok((session, rx))
}
