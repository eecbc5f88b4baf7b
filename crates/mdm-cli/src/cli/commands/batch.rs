//! `mdm batch <file>` – download every URL listed in a file.

use anyhow::{Context, Result};
use mdm_core::collection::parse_batch_urls;
use mdm_core::config::MdmConfig;
use mdm_core::job::JobRequest;
use std::path::Path;

use super::watch::watch_and_report;
use crate::cli::session;

pub async fn run_batch(
    cfg: &MdmConfig,
    download_dir: &Path,
    file: &Path,
    format: &str,
    quality: &str,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("read URL list: {}", file.display()))?;
    let urls = parse_batch_urls(&text);
    if urls.is_empty() {
        anyhow::bail!("no URLs in {}", file.display());
    }
    println!("Queueing {} download(s)...", urls.len());

    let (session, mut rx) = session::open(cfg)?;
    let requests = urls
        .iter()
        .map(|u| JobRequest::new(u.as_str(), format, quality))
        .collect();
    let handles = session.submit_batch(requests).await?;
    watch_and_report(&session, &mut rx, &handles, download_dir).await
}
