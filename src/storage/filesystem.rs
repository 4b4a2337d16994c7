use async_trait::async_trait;
use axum::body::Bytes;
use std::io::ErrorKind;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use super::{validate_bucket, validate_key, ObjectStore, StorageError};

/// Objects stored as files under `root/{bucket}/{key}`
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        validate_bucket(bucket)?;
        validate_key(key)?;
        Ok(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl ObjectStore for FileSystemStore {
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<u64, StorageError> {
        let path = self.path_for(bucket, key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        // Write beside the target then rename so readers never see a partial file
        let staging = path.with_extension("upload");
        fs::write(&staging, &body).await?;
        fs::rename(&staging, &path).await?;

        debug!("stored {} bytes at {}", body.len(), path.display());
        Ok(body.len() as u64)
    }

    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError> {
        let path = self.path_for(bucket, key)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemStore::new(dir.path());

        let size = store.put("videos", "1-intro.mp4", Bytes::from_static(b"frames")).await.unwrap();
        assert_eq!(size, 6);
        assert_eq!(store.get("videos", "1-intro.mp4").await.unwrap(), Bytes::from_static(b"frames"));

        store.put("videos", "1-intro.mp4", Bytes::from_static(b"v2")).await.unwrap();
        assert_eq!(store.get("videos", "1-intro.mp4").await.unwrap(), Bytes::from_static(b"v2"));

        store.delete("videos", "1-intro.mp4").await.unwrap();
        assert!(matches!(
            store.get("videos", "1-intro.mp4").await,
            Err(StorageError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSystemStore::new(dir.path());
        assert!(matches!(
            store.put("videos", "../escape", Bytes::new()).await,
            Err(StorageError::InvalidKey(_))
        ));
    }
}
