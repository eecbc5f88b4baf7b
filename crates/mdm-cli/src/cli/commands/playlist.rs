//! `mdm playlist <url>` – download every item of a collection.

use anyhow::Result;
use mdm_core::config::MdmConfig;
use std::path::Path;

use super::watch::watch_and_report;
use crate::cli::session;

pub async fn run_playlist(
    cfg: &MdmConfig,
    download_dir: &Path,
    url: &str,
    format: &str,
    quality: &str,
) -> Result<()> {
    let (session, mut rx) = session::open(cfg)?;
    let handles = session.submit_collection(url, format, quality).await?;
    println!("Playlist has {} item(s).", handles.len());
    watch_and_report(&session, &mut rx, &handles, download_dir).await
}
