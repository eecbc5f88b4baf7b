//! Human-readable formatting for terminal output.

use mdm_core::job::{Job, JobStatus};

/// "Just now", "5m ago", "3h ago" or "2d ago" for a Unix-millisecond timestamp;
/// the UTC date once it is a week old.
pub fn relative_time(now_ms: i64, then_ms: i64) -> String {
    let minutes = (now_ms - then_ms).max(0) / 60_000;
    let hours = minutes / 60;
    let days = hours / 24;
    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        utc_date(then_ms)
    }
}

/// `YYYY-MM-DD` (UTC) for Unix milliseconds.
fn utc_date(ms: i64) -> String {
    // Civil-from-days, proleptic Gregorian calendar.
    let z = ms.div_euclid(86_400_000) + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    format!("{year:04}-{month:02}-{day:02}")
}

/// File size with binary units and two decimals, e.g. "1.50 MB".
pub fn file_size(bytes: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let Some(bytes) = bytes.filter(|b| *b > 0) else {
        return "-".to_string();
    };
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// Seconds as m:ss (or h:mm:ss).
pub fn duration(secs: f64) -> String {
    let total = secs.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

/// One progress line for a tracked job.
pub fn progress_line(job: &Job) -> String {
    let status = match job.status {
        JobStatus::Running => job.status_text.as_deref().unwrap_or("running"),
        other => other.as_str(),
    };
    let speed = job.speed_hint.as_deref().unwrap_or("");
    format!(
        "{:>3}% {:<10} {:<16} {}",
        job.progress_percent,
        speed,
        status,
        job.display_title()
    )
}
