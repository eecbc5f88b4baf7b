//! Producers of job requests: batch text, search results and collections.

use serde::{Deserialize, Serialize};

use crate::job::JobRequest;

/// One item returned by a search or a collection lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Duration in seconds.
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub uploader: Option<String>,
}

/// Split batch input into source URLs: one per line, trimmed, blank lines dropped.
pub fn parse_batch_urls(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// One request per candidate, in the candidates' order.
pub fn requests_from_candidates(
    candidates: &[Candidate],
    format: &str,
    quality: &str,
) -> Vec<JobRequest> {
    candidates
        .iter()
        .map(|c| JobRequest::new(c.url.as_str(), format, quality))
        .collect()
}
