//! Saving finished artifacts to disk.
//!
//! The artifact is streamed into `<name>.part` next to its destination and
//! renamed into place only once the transfer finished, so a partially fetched
//! file never carries the final name.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::backend::BackendError;

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// File name used when the backend did not name the artifact.
pub const FALLBACK_FILENAME: &str = "download";

/// Path of the in-progress file for `final_path`.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut name = final_path.as_os_str().to_owned();
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Longest sanitized name; leaves room for [`TEMP_SUFFIX`] within NAME_MAX (255).
pub const MAX_FILENAME_BYTES: usize = 255 - TEMP_SUFFIX.len();

/// Extensions longer than this are not kept when a name is shortened.
const MAX_EXTENSION_BYTES: usize = 16;

/// Make a backend-supplied name safe as a single Linux path component.
///
/// Path separators, NUL and control characters become `_` (runs collapsed);
/// leading/trailing dots and whitespace are trimmed. Long names are cut to
/// [`MAX_FILENAME_BYTES`] so the `.part` file name still fits, keeping a short
/// extension. An unusable name yields [`FALLBACK_FILENAME`].
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;
    for c in name.chars() {
        let c = if c == '/' || c == '\\' || c == '\0' || c.is_control() {
            '_'
        } else {
            c
        };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c: char| c == '.' || c == '_' || c.is_whitespace());
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else if trimmed.len() <= MAX_FILENAME_BYTES {
        trimmed.to_string()
    } else {
        shorten(trimmed, MAX_FILENAME_BYTES)
    }
}

/// Cut `name` to at most `max` bytes on a char boundary, keeping its extension if short.
fn shorten(name: &str, max: usize) -> String {
    let ext = match name.rfind('.') {
        Some(i) if i > 0 && name.len() - i <= MAX_EXTENSION_BYTES => &name[i..],
        _ => "",
    };
    let stem = &name[..name.len() - ext.len()];
    let mut take = max - ext.len();
    while !stem.is_char_boundary(take) {
        take -= 1;
    }
    format!("{}{}", &stem[..take], ext)
}

/// Write an artifact into `dir/<sanitized filename>` via a `.part` file.
///
/// `fetch` streams the bytes into the writer it is given. On any error the
/// partial file is removed. Returns the final path.
pub fn save_artifact<F>(dir: &Path, filename: &str, fetch: F) -> Result<PathBuf, BackendError>
where
    F: FnOnce(&mut dyn Write) -> Result<u64, BackendError>,
{
    fs::create_dir_all(dir)?;
    let final_path = dir.join(sanitize_filename(filename));
    let part = temp_path(&final_path);

    let result = (|| {
        let file = File::create(&part)?;
        let mut writer = BufWriter::new(file);
        let bytes = fetch(&mut writer)?;
        let file = writer.into_inner().map_err(|e| e.into_error())?;
        file.sync_all()?;
        fs::rename(&part, &final_path)?;
        Ok::<u64, BackendError>(bytes)
    })();

    match result {
        Ok(bytes) => {
            tracing::debug!(path = %final_path.display(), bytes, "artifact saved");
            Ok(final_path)
        }
        Err(e) => {
            let _ = fs::remove_file(&part);
            Err(e)
        }
    }
}
