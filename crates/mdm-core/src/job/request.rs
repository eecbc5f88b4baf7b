//! Submission payloads: plain downloads and GIF clips.

use std::str::FromStr;

use crate::error::SessionError;

/// Output format used when the caller does not pick one.
pub const DEFAULT_FORMAT: &str = "mp4";
/// Quality hint used when the caller does not pick one.
pub const DEFAULT_QUALITY: &str = "720p";

/// Preset quality for GIF clips; selects frame rate and width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GifQuality {
    High,
    #[default]
    Medium,
    Low,
}

impl GifQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            GifQuality::High => "high",
            GifQuality::Medium => "medium",
            GifQuality::Low => "low",
        }
    }

    pub fn fps(self) -> u32 {
        match self {
            GifQuality::High => 20,
            GifQuality::Medium => 15,
            GifQuality::Low => 10,
        }
    }

    pub fn width(self) -> u32 {
        match self {
            GifQuality::High => 640,
            GifQuality::Medium => 480,
            GifQuality::Low => 320,
        }
    }
}

impl FromStr for GifQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(GifQuality::High),
            "medium" => Ok(GifQuality::Medium),
            "low" => Ok(GifQuality::Low),
            other => Err(format!("unknown GIF quality: {other} (expected high, medium or low)")),
        }
    }
}

/// Clip parameters for a GIF conversion job. Times are in seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifClip {
    pub start_time: u32,
    pub end_time: u32,
    pub fps: u32,
    pub width: u32,
    pub quality: GifQuality,
}

impl GifClip {
    /// Clip of `duration` seconds starting at `start`, with the preset's fps and width.
    pub fn new(start: u32, duration: u32, quality: GifQuality) -> Self {
        Self {
            start_time: start,
            end_time: start.saturating_add(duration),
            fps: quality.fps(),
            width: quality.width(),
            quality,
        }
    }
}

/// What the user asked for; captured at submission time and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub source_url: String,
    pub output_format: String,
    pub quality_hint: String,
    /// Present for GIF conversions, which use a dedicated create endpoint.
    pub gif: Option<GifClip>,
}

impl JobRequest {
    pub fn new(
        source_url: impl Into<String>,
        output_format: impl Into<String>,
        quality_hint: impl Into<String>,
    ) -> Self {
        Self {
            source_url: source_url.into().trim().to_string(),
            output_format: output_format.into(),
            quality_hint: quality_hint.into(),
            gif: None,
        }
    }

    /// Request with the default format and quality.
    pub fn with_defaults(source_url: impl Into<String>) -> Self {
        Self::new(source_url, DEFAULT_FORMAT, DEFAULT_QUALITY)
    }

    /// GIF conversion request; format is "gif" and the quality hint is the preset name.
    pub fn gif(source_url: impl Into<String>, clip: GifClip) -> Self {
        let quality = clip.quality.as_str();
        Self {
            gif: Some(clip),
            ..Self::new(source_url, "gif", quality)
        }
    }

    /// Rejects requests that must never reach the backend.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.source_url.trim().is_empty() {
            return Err(SessionError::InvalidRequest("source URL is empty".into()));
        }
        if let Some(clip) = &self.gif {
            if clip.end_time <= clip.start_time {
                return Err(SessionError::InvalidRequest(format!(
                    "GIF clip end ({}) must be after start ({})",
                    clip.end_time, clip.start_time
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_url_is_invalid() {
        let req = JobRequest::new("   ", "mp4", "720p");
        assert!(matches!(req.validate(), Err(SessionError::InvalidRequest(_))));
        assert!(JobRequest::with_defaults("https://example.com/watch?v=1")
            .validate()
            .is_ok());
    }

    #[test]
    fn source_url_is_trimmed() {
        let req = JobRequest::with_defaults("  https://example.com/a \n");
        assert_eq!(req.source_url, "https://example.com/a");
        assert_eq!(req.output_format, "mp4");
        assert_eq!(req.quality_hint, "720p");
    }

    #[test]
    fn gif_presets() {
        let clip = GifClip::new(12, 5, GifQuality::High);
        assert_eq!((clip.start_time, clip.end_time), (12, 17));
        assert_eq!((clip.fps, clip.width), (20, 640));
        let low = GifClip::new(0, 3, "low".parse().unwrap());
        assert_eq!((low.fps, low.width), (10, 320));
        assert_eq!(GifClip::new(0, 5, GifQuality::default()).fps, 15);
        assert!("ultra".parse::<GifQuality>().is_err());
    }

    #[test]
    fn gif_request_shape_and_validation() {
        let req = JobRequest::gif("https://example.com/v", GifClip::new(3, 5, GifQuality::Medium));
        assert_eq!(req.output_format, "gif");
        assert_eq!(req.quality_hint, "medium");
        assert!(req.validate().is_ok());

        let zero = JobRequest::gif("https://example.com/v", GifClip::new(3, 0, GifQuality::Low));
        assert!(matches!(zero.validate(), Err(SessionError::InvalidRequest(_))));
    }
}
