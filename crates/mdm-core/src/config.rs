use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// HTTP timeouts for backend calls (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Total timeout in seconds for JSON calls (create, status, cancel, search).
    pub request_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
        }
    }
}

/// Global configuration loaded from `~/.config/mdm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MdmConfig {
    /// Base URL of the job-processing backend.
    pub api_url: String,
    /// Maximum number of concurrently active (admitted, non-terminal) jobs.
    pub max_concurrent_jobs: usize,
    /// Status poll period per job, in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum number of entries kept in the history log.
    pub history_limit: usize,
    /// How long a completed job stays visible in the registry, in milliseconds.
    pub completed_linger_ms: u64,
    /// Optional safeguard: fail a job with reason `Timeout` after this many polls.
    #[serde(default)]
    pub max_poll_attempts: Option<u32>,
    /// Output format used when none is given (e.g. "mp4", "mp3").
    pub default_format: String,
    /// Quality hint used when none is given (e.g. "720p").
    pub default_quality: String,
    /// Directory where finished artifacts are saved (None = current directory).
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// Optional HTTP timeouts; if missing, built-in defaults are used.
    #[serde(default)]
    pub http: Option<HttpConfig>,
}

impl Default for MdmConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000".to_string(),
            max_concurrent_jobs: 3,
            poll_interval_ms: 1000,
            history_limit: crate::history::DEFAULT_HISTORY_LIMIT,
            completed_linger_ms: 3000,
            max_poll_attempts: None,
            default_format: "mp4".to_string(),
            default_quality: "720p".to_string(),
            download_dir: None,
            http: None,
        }
    }
}

impl MdmConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn completed_linger(&self) -> Duration {
        Duration::from_millis(self.completed_linger_ms)
    }

    /// HTTP timeouts with defaults applied.
    pub fn http(&self) -> HttpConfig {
        self.http.clone().unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<MdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = MdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config: {}", path.display()))?;
    let cfg: MdmConfig =
        toml::from_str(&data).with_context(|| format!("parse config: {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = MdmConfig::default();
        assert_eq!(cfg.api_url, "http://localhost:5000");
        assert_eq!(cfg.max_concurrent_jobs, 3);
        assert_eq!(cfg.poll_interval(), Duration::from_secs(1));
        assert_eq!(cfg.history_limit, 50);
        assert_eq!(cfg.completed_linger(), Duration::from_secs(3));
        assert!(cfg.max_poll_attempts.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = MdmConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: MdmConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.api_url, cfg.api_url);
        assert_eq!(parsed.max_concurrent_jobs, cfg.max_concurrent_jobs);
        assert_eq!(parsed.poll_interval_ms, cfg.poll_interval_ms);
        assert_eq!(parsed.default_format, cfg.default_format);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            api_url = "https://backend.example.com"
            max_concurrent_jobs = 5
            poll_interval_ms = 250
            history_limit = 20
            completed_linger_ms = 0
            default_format = "mp3"
            default_quality = "1080p"
        "#;
        let cfg: MdmConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.api_url, "https://backend.example.com");
        assert_eq!(cfg.max_concurrent_jobs, 5);
        assert_eq!(cfg.poll_interval(), Duration::from_millis(250));
        assert_eq!(cfg.history_limit, 20);
        assert!(cfg.download_dir.is_none());
        assert!(cfg.http.is_none());
        assert_eq!(cfg.http().request_timeout_secs, 30);
    }

    #[test]
    fn config_toml_http_and_hardening() {
        let toml = r#"
            api_url = "http://127.0.0.1:5000"
            max_concurrent_jobs = 3
            poll_interval_ms = 1000
            history_limit = 50
            completed_linger_ms = 3000
            max_poll_attempts = 600
            default_format = "mp4"
            default_quality = "720p"
            download_dir = "/tmp/media"

            [http]
            connect_timeout_secs = 2
            request_timeout_secs = 10
        "#;
        let cfg: MdmConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.max_poll_attempts, Some(600));
        assert_eq!(cfg.download_dir, Some(PathBuf::from("/tmp/media")));
        let http = cfg.http();
        assert_eq!(http.connect_timeout_secs, 2);
        assert_eq!(http.request_timeout_secs, 10);
    }
}
