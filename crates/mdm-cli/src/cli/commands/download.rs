//! `mdm download <url>` – download one URL.

use anyhow::Result;
use mdm_core::config::MdmConfig;
use mdm_core::job::JobRequest;
use std::path::Path;

use super::watch::watch_and_report;
use crate::cli::session;

pub async fn run_download(
    cfg: &MdmConfig,
    download_dir: &Path,
    url: &str,
    format: &str,
    quality: &str,
) -> Result<()> {
    let (session, mut rx) = session::open(cfg)?;
    let handle = session
        .submit(JobRequest::new(url, format, quality))
        .await?;
    watch_and_report(&session, &mut rx, &[handle], download_dir).await
}
