//! Object storage for uploaded video files, plus time-limited signed links.

mod filesystem;
mod signer;

pub use filesystem::FileSystemStore;
pub use signer::{SignedQuery, UrlSigner, SIGNED_URL_TTL_MINUTES};

use async_trait::async_trait;
use axum::body::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("signed url has expired")]
    Expired,

    #[error("signed url signature does not match")]
    InvalidSignature,

    #[error("media signing key rejected: {0}")]
    SigningKey(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `bucket/key`, replacing any previous object; returns its size
    async fn put(&self, bucket: &str, key: &str, body: Bytes) -> Result<u64, StorageError>;
    async fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StorageError>;
    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

/// Keys are relative paths of `[A-Za-z0-9._-]` segments; buckets a single such segment.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('/')
        && key.split('/').all(|segment| {
            !segment.is_empty()
                && segment != "."
                && segment != ".."
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        });
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

pub fn validate_bucket(bucket: &str) -> Result<(), StorageError> {
    if bucket.contains('/') {
        return Err(StorageError::InvalidKey(bucket.to_string()));
    }
    validate_key(bucket)
}

/// Content type served for a stored object, by extension
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()).as_deref() {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mov") => "video/quicktime",
        Some("ogv") => "video/ogg",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}
