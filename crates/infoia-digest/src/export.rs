//! JSON export of a committed digest for the rendering side.

use std::path::{Path, PathBuf};

use infoia_core::Digest;
use thiserror::Error;

pub const LATEST_FILE: &str = "latest.json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("digest could not be serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File name of a digest export: `digest-<edition>-<run id>.json`.
#[must_use]
pub fn export_file_name(digest: &Digest) -> String {
    format!("digest-{}-{}.json", digest.edition, digest.run_id)
}

/// Write `digest` into `dir` under its own name and as `latest.json`,
/// creating `dir` if needed. Returns the path of the per-run file.
///
/// # Errors
///
/// Returns [`ExportError::Io`] if the directory or either file cannot be
/// written.
pub async fn export_digest(digest: &Digest, dir: &Path) -> Result<PathBuf, ExportError> {
    let json = serde_json::to_vec_pretty(digest)?;

    tokio::fs::create_dir_all(dir).await.map_err(io_err(dir))?;

    let path = dir.join(export_file_name(digest));
    tokio::fs::write(&path, &json).await.map_err(io_err(&path))?;

    let latest = dir.join(LATEST_FILE);
    tokio::fs::write(&latest, &json)
        .await
        .map_err(io_err(&latest))?;

    tracing::info!(path = %path.display(), "digest exported");
    Ok(path)
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError {
    let path = path.to_path_buf();
    move |source| ExportError::Io { path, source }
}
