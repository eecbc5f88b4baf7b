//! `mdm history` and `mdm clear-history`.

use anyhow::Result;
use mdm_core::config::MdmConfig;
use mdm_core::job::unix_millis;

use crate::cli::{display, session};

const SHOWN: usize = 20;

pub fn run_history(cfg: &MdmConfig) -> Result<()> {
    let store = session::load_history(cfg)?;
    if store.is_empty() {
        println!("No downloads yet.");
        return Ok(());
    }
    let now = unix_millis();
    println!(
        "{:<10} {:<8} {:<8} {:<12} {}",
        "WHEN", "FORMAT", "QUALITY", "SIZE", "TITLE"
    );
    for e in store.entries().iter().take(SHOWN) {
        println!(
            "{:<10} {:<8} {:<8} {:<12} {}",
            display::relative_time(now, e.completed_at),
            e.output_format,
            e.quality_hint,
            display::file_size(e.file_size_bytes),
            e.title
        );
    }
    if store.len() > SHOWN {
        println!("... and {} older", store.len() - SHOWN);
    }
    Ok(())
}

pub fn run_clear_history(cfg: &MdmConfig, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("refusing to clear history without --yes");
    }
    let mut store = session::load_history(cfg)?;
    let removed = store.len();
    store.clear()?;
    println!("History cleared ({removed} entries removed).");
    Ok(())
}
