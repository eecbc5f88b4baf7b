//! `mdm gif <url>` – convert a clip to a GIF.

use anyhow::Result;
use mdm_core::config::MdmConfig;
use mdm_core::job::{GifClip, GifQuality, JobRequest};
use std::path::Path;

use super::watch::watch_and_report;
use crate::cli::session;

pub async fn run_gif(
    cfg: &MdmConfig,
    download_dir: &Path,
    url: &str,
    start: u32,
    duration: u32,
    quality: GifQuality,
) -> Result<()> {
    let clip = GifClip::new(start, duration, quality);
    println!(
        "Creating GIF: {}s-{}s at {} fps, {}px wide",
        clip.start_time, clip.end_time, clip.fps, clip.width
    );
    let (session, mut rx) = session::open(cfg)?;
    let handle = session.submit(JobRequest::gif(url, clip)).await?;
    watch_and_report(&session, &mut rx, &[handle], download_dir).await
}
