//! Drive submitted jobs to completion: print notifications and progress,
//! save artifacts as they become ready.

use anyhow::Result;
use mdm_core::error::ErrorKind;
use mdm_core::job::JobId;
use mdm_core::notify::{Notification, NotificationLevel};
use mdm_core::scheduler::{HandleState, JobHandle};
use mdm_core::session::Session;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::cli::display;

const PROGRESS_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Default)]
pub struct Summary {
    pub completed: usize,
    pub failed: usize,
    /// Refused by the backend at creation.
    pub rejected: usize,
    pub cancelled: usize,
    pub saved: usize,
}

pub async fn watch(
    session: &Session,
    rx: &mut UnboundedReceiver<Notification>,
    handles: &[JobHandle],
    download_dir: &Path,
) -> Summary {
    let mut saved: HashSet<JobId> = HashSet::new();
    let mut save_failed: HashSet<JobId> = HashSet::new();
    let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);

    loop {
        tokio::select! {
            Some(n) = rx.recv() => {
                print_notification(&n);
                if n.level == NotificationLevel::Success {
                    if let Some(id) = n.job_id.clone() {
                        match session.save_result(&id, download_dir).await {
                            Ok(path) => {
                                println!("  saved {}", path.display());
                                saved.insert(id);
                            }
                            Err(e) => {
                                eprintln!("  could not save {id}: {e}");
                                save_failed.insert(id);
                            }
                        }
                    }
                }
            }
            _ = ticker.tick() => {
                for job in session.jobs().iter().filter(|j| !j.is_terminal()) {
                    println!("  {}", display::progress_line(job));
                }
                let waiting = session.waiting_count();
                if waiting > 0 {
                    println!("  {waiting} queued");
                }
            }
        }

        let all_settled = handles.iter().all(|h| match h.state() {
            HandleState::Completed(id) => saved.contains(&id) || save_failed.contains(&id),
            state => state.is_terminal(),
        });
        if all_settled {
            break;
        }
    }

    let mut summary = Summary {
        saved: saved.len(),
        ..Summary::default()
    };
    for h in handles {
        match h.state() {
            HandleState::Completed(_) => summary.completed += 1,
            HandleState::Failed(f) if f.kind == ErrorKind::AdmissionFailure => {
                summary.rejected += 1
            }
            HandleState::Failed(_) => summary.failed += 1,
            HandleState::Cancelled => summary.cancelled += 1,
            HandleState::Pending | HandleState::Admitted(_) => {}
        }
    }
    session.shutdown();
    tracing::info!(?summary, "all jobs settled");
    summary
}

fn print_notification(n: &Notification) {
    match n.level {
        NotificationLevel::Success => println!("✓ {}", n.message),
        NotificationLevel::Info => println!("• {}", n.message),
        NotificationLevel::Error => eprintln!("✗ {}", n.message),
    }
}

/// Watch `handles`, print a one-line summary and fail if any job failed.
pub async fn watch_and_report(
    session: &Session,
    rx: &mut UnboundedReceiver<Notification>,
    handles: &[JobHandle],
    download_dir: &Path,
) -> Result<()> {
    if handles.is_empty() {
        println!("Nothing to download.");
        return Ok(());
    }
    let s = watch(session, rx, handles, download_dir).await;
    println!(
        "Done: {} completed ({} saved), {} failed, {} rejected, {} cancelled.",
        s.completed, s.saved, s.failed, s.rejected, s.cancelled
    );
    if s.failed + s.rejected > 0 {
        anyhow::bail!("{} job(s) failed", s.failed + s.rejected);
    }
    Ok(())
}
