use crate::s3::error::StorageError;
use crate::s3::storage::Storage;
use bytes::Bytes;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Upload every file under `dir` to `bucket`, keyed by its `/`-separated path
/// relative to `dir`. Creates the bucket when missing. Returns the uploaded keys.
pub async fn upload_directory<S: Storage>(
    storage: &S,
    bucket: &str,
    dir: &Path,
) -> Result<Vec<String>, StorageError> {
    storage.ensure_bucket(bucket).await?;

    let mut keys = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            StorageError::ReadError(dir.display().to_string(), e.to_string())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| StorageError::Other(e.into()))?;
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let data = tokio::fs::read(entry.path()).await.map_err(|e| {
            StorageError::ReadError(entry.path().display().to_string(), e.to_string())
        })?;
        debug!("Uploading {} ({} bytes)", key, data.len());
        storage.put_object(bucket, &key, Bytes::from(data)).await?;
        keys.push(key);
    }

    info!("Uploaded {} files from {} to '{}'", keys.len(), dir.display(), bucket);
    Ok(keys)
}
