//! JSON snapshot file.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::StoreError;
use crate::data::StoreData;

/// Read and parse the snapshot, returning it with the file's mtime.
pub async fn load(path: &Path) -> Result<(StoreData, Option<SystemTime>), StoreError> {
    let bytes = tokio::fs::read(path).await?;
    let mut data: StoreData = serde_json::from_slice(&bytes)?;
    data.sync_sequences();
    let mtime = modified(path).await?;
    Ok((data, mtime))
}

/// Write the snapshot atomically and return the new mtime.
pub async fn save(path: &Path, data: &StoreData) -> Result<SystemTime, StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(data)?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(tokio::fs::metadata(path).await?.modified()?)
}

/// Modification time, or `None` when the file does not exist.
pub async fn modified(path: &Path) -> Result<Option<SystemTime>, StoreError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta.modified()?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_creates_parent_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");
        let data = crate::seed::seed_data(chrono::Utc::now());

        save(&path, &data).await.unwrap();
        let (loaded, mtime) = load(&path).await.unwrap();

        assert!(mtime.is_some());
        assert_eq!(loaded.products.len(), data.products.len());
        assert_eq!(loaded.sequences, data.sequences);
        assert!(!temp_path(&path).exists());
    }

    #[tokio::test]
    async fn test_modified_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(modified(&dir.path().join("nope.json")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();
        assert!(matches!(load(&path).await, Err(StoreError::Serialization(_))));
    }
}
