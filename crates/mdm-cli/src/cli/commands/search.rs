//! `mdm search <query>` – list results, optionally download picked ones.

use anyhow::Result;
use mdm_core::collection::{requests_from_candidates, Candidate};
use mdm_core::config::MdmConfig;
use std::path::Path;

use super::watch::watch_and_report;
use crate::cli::{display, session};

pub async fn run_search(
    cfg: &MdmConfig,
    download_dir: &Path,
    query: &str,
    pick: &[usize],
    format: &str,
    quality: &str,
) -> Result<()> {
    let (session, mut rx) = session::open(cfg)?;
    let results = session.search(query).await?;
    if results.is_empty() {
        println!("No results for \"{query}\".");
        return Ok(());
    }
    for (i, c) in results.iter().enumerate() {
        println!("{:>3}. {}", i + 1, describe(c));
    }
    if pick.is_empty() {
        return Ok(());
    }

    let chosen = picked(&results, pick)?;
    let handles = session
        .submit_batch(requests_from_candidates(&chosen, format, quality))
        .await?;
    watch_and_report(&session, &mut rx, &handles, download_dir).await
}

fn describe(c: &Candidate) -> String {
    let mut line = c.title.clone();
    if let Some(d) = c.duration {
        line.push_str(&format!(" [{}]", display::duration(d)));
    }
    if let Some(u) = &c.uploader {
        line.push_str(&format!(" by {u}"));
    }
    if let Some(v) = c.view_count {
        line.push_str(&format!(", {v} views"));
    }
    line
}

/// Results at the given 1-based positions, in the order picked.
pub(crate) fn picked(results: &[Candidate], pick: &[usize]) -> Result<Vec<Candidate>> {
    pick.iter()
        .map(|&n| {
            n.checked_sub(1)
                .and_then(|i| results.get(i))
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no search result number {n} (have {})", results.len()))
        })
        .collect()
}
