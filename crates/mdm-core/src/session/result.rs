use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{blocking, Session};
use crate::error::SessionError;
use crate::job::{JobId, JobStatus};
use crate::storage;

impl Session {
    /// Download the artifact of a Complete job into `dir`.
    ///
    /// The file is written as `<name>.part` and renamed once complete; the
    /// name is the backend's result file name, sanitized. Only jobs still in
    /// the registry can be saved, so call this before the linger period ends.
    pub async fn save_result(&self, id: &JobId, dir: &Path) -> Result<PathBuf, SessionError> {
        let filename = {
            let st = self.state();
            let job = st
                .registry
                .get(id)
                .ok_or_else(|| SessionError::NotFound(id.clone()))?;
            match (&job.status, &job.result) {
                (JobStatus::Complete, Some(result)) => result.filename.clone(),
                _ => return Err(SessionError::NotComplete(id.clone())),
            }
        };

        let backend = Arc::clone(&self.inner.backend);
        let job_id = id.clone();
        let dir = dir.to_path_buf();
        let path = blocking(move || {
            storage::save_artifact(&dir, &filename, |out| backend.fetch_result(&job_id, out))
        })
        .await?;
        tracing::info!(job_id = %id, path = %path.display(), "artifact saved");
        Ok(path)
    }

    /// Where the artifact of `id` can be retrieved from the backend.
    pub fn result_url(&self, id: &JobId) -> String {
        self.inner.backend.result_url(id)
    }
}
