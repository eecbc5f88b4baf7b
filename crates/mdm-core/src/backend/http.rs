//! libcurl implementation of [`Backend`] against the JSON HTTP API.

use std::io::Write;
use std::str;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use super::error::BackendError;
use super::wire::{
    CollectionBody, CollectionResponse, CreateBody, CreateGifBody, CreateResponse, SearchBody,
    SearchResponse, StatusResponse,
};
use super::Backend;
use crate::collection::Candidate;
use crate::config::{HttpConfig, MdmConfig};
use crate::job::{JobId, JobRequest};

/// Talks to the backend over HTTP. Each call uses a fresh curl handle and
/// blocks the current thread; the session runs calls on the blocking pool.
#[derive(Debug, Clone)]
pub struct CurlBackend {
    base: Url,
    http: HttpConfig,
}

impl CurlBackend {
    pub fn new(api_url: &str, http: HttpConfig) -> Result<Self, BackendError> {
        let base = Url::parse(api_url.trim())
            .map_err(|e| BackendError::InvalidUrl(format!("{api_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(api_url.to_string()));
        }
        Ok(Self { base, http })
    }

    pub fn from_config(cfg: &MdmConfig) -> Result<Self, BackendError> {
        Self::new(&cfg.api_url, cfg.http())
    }

    /// `<base>/<segments...>`, keeping any path prefix of the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn easy(&self, url: &Url) -> Result<curl::easy::Easy, BackendError> {
        let mut easy = curl::easy::Easy::new();
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.connect_timeout(Duration::from_secs(self.http.connect_timeout_secs))?;
        Ok(easy)
    }

    /// Perform a request and return (HTTP status, body).
    fn perform(
        &self,
        url: &Url,
        json_body: Option<Vec<u8>>,
    ) -> Result<(u32, Vec<u8>), BackendError> {
        let mut easy = self.easy(url)?;
        easy.timeout(Duration::from_secs(self.http.request_timeout_secs))?;
        let mut headers = curl::easy::List::new();
        headers.append("Accept: application/json")?;
        if let Some(body) = json_body {
            headers.append("Content-Type: application/json")?;
            easy.post(true)?;
            easy.post_fields_copy(&body)?;
        }
        easy.http_headers(headers)?;

        let mut buf = Vec::new();
        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                buf.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }
        let code = easy.response_code()?;
        tracing::trace!(url = %url, code, bytes = buf.len(), "backend call");
        Ok((code, buf))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, BackendError> {
        let (code, body) = self.perform(url, None)?;
        check_status(code, &body)?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &Url,
        body: &B,
    ) -> Result<T, BackendError> {
        let (code, resp) = self.perform(url, Some(serde_json::to_vec(body)?))?;
        check_status(code, &resp)?;
        Ok(serde_json::from_slice(&resp)?)
    }
}

fn check_status(code: u32, body: &[u8]) -> Result<(), BackendError> {
    if (200..300).contains(&code) {
        return Ok(());
    }
    Err(BackendError::Http {
        status: code,
        body: String::from_utf8_lossy(body).chars().take(512).collect(),
    })
}

impl Backend for CurlBackend {
    fn create_job(&self, request: &JobRequest) -> Result<JobId, BackendError> {
        let (url, payload) = match &request.gif {
            Some(clip) => (
                self.endpoint(&["api", "create-gif"])?,
                serde_json::to_vec(&CreateGifBody {
                    url: &request.source_url,
                    start_time: clip.start_time,
                    end_time: clip.end_time,
                    quality: clip.quality.as_str(),
                    fps: clip.fps,
                    width: clip.width,
                })?,
            ),
            None => (
                self.endpoint(&["api", "download"])?,
                serde_json::to_vec(&CreateBody {
                    url: &request.source_url,
                    format: &request.output_format,
                    quality: &request.quality_hint,
                })?,
            ),
        };
        let (code, body) = self.perform(&url, Some(payload))?;
        // An `{error}` body wins over the HTTP status: it carries the reason to show.
        let parsed: Option<CreateResponse> = serde_json::from_slice(&body).ok();
        if let Some(reason) = parsed
            .as_ref()
            .and_then(|r| r.error.as_deref())
            .filter(|e| !e.trim().is_empty())
        {
            return Err(BackendError::Rejected(reason.to_string()));
        }
        check_status(code, &body)?;
        match parsed.and_then(|r| r.download_id).filter(|id| !id.is_empty()) {
            Some(id) => Ok(JobId::new(id)),
            None => Err(BackendError::Rejected(
                "backend returned no download id".into(),
            )),
        }
    }

    fn poll_status(&self, id: &JobId) -> Result<StatusResponse, BackendError> {
        self.get_json(&self.endpoint(&["api", "status", id.as_str()])?)
    }

    fn cancel_job(&self, id: &JobId) -> Result<(), BackendError> {
        let url = self.endpoint(&["api", "cancel", id.as_str()])?;
        let (code, body) = self.perform(&url, Some(b"{}".to_vec()))?;
        check_status(code, &body)
    }

    fn fetch_result(&self, id: &JobId, out: &mut dyn Write) -> Result<u64, BackendError> {
        let url = self.endpoint(&["api", "download-file", id.as_str()])?;
        let mut easy = self.easy(&url)?;
        easy.fail_on_error(true)?;

        let mut written: u64 = 0;
        let mut write_err: Option<std::io::Error> = None;
        let res = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match out.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_err = Some(e);
                    // Short count aborts the transfer.
                    Ok(0)
                }
            })?;
            transfer.perform()
        };
        if let Some(e) = write_err {
            return Err(BackendError::Io(e));
        }
        if let Err(e) = res {
            if e.is_http_returned_error() {
                let status = easy.response_code().unwrap_or(0);
                return Err(BackendError::Http {
                    status,
                    body: e.to_string(),
                });
            }
            return Err(e.into());
        }
        out.flush()?;
        Ok(written)
    }

    fn result_url(&self, id: &JobId) -> String {
        self.endpoint(&["api", "download-file", id.as_str()])
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}/api/download-file/{}", self.base, id))
    }

    fn search(&self, query: &str) -> Result<Vec<Candidate>, BackendError> {
        let url = self.endpoint(&["api", "search"])?;
        let resp: SearchResponse = self.post_json(&url, &SearchBody { query })?;
        Ok(resp.results)
    }

    fn resolve_collection(&self, url: &str) -> Result<Vec<Candidate>, BackendError> {
        let endpoint = self.endpoint(&["api", "playlist-info"])?;
        let resp: CollectionResponse = self.post_json(&endpoint, &CollectionBody { url })?;
        Ok(resp.videos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path_prefix() {
        let b = CurlBackend::new("http://host:5000/prefix/", HttpConfig::default()).unwrap();
        let url = b.endpoint(&["api", "status", "abc"]).unwrap();
        assert_eq!(url.as_str(), "http://host:5000/prefix/api/status/abc");

        let b = CurlBackend::new("http://host:5000", HttpConfig::default()).unwrap();
        assert_eq!(
            b.result_url(&JobId::new("x1")),
            "http://host:5000/api/download-file/x1"
        );
    }

    #[test]
    fn job_ids_are_escaped_as_path_segments() {
        let b = CurlBackend::new("http://host", HttpConfig::default()).unwrap();
        let url = b.endpoint(&["api", "status", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://host/api/status/a%2Fb");
    }

    #[test]
    fn rejects_unusable_api_urls() {
        assert!(matches!(
            CurlBackend::new("not a url", HttpConfig::default()),
            Err(BackendError::InvalidUrl(_))
        ));
        assert!(matches!(
            CurlBackend::new("mailto:me@example.com", HttpConfig::default()),
            Err(BackendError::InvalidUrl(_))
        ));
    }

    #[test]
    fn non_2xx_is_http_error() {
        assert!(check_status(200, b"").is_ok());
        match check_status(503, b"busy") {
            Err(BackendError::Http { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "busy");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
