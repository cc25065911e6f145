//! Profile image storage
//!
//! The upload endpoint hands a `data:` URI to an [`ImageStore`] and records
//! the returned reference on the principal.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("{0}")]
    InvalidImage(String),
    #[error("image write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Blob-upload collaborator
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the image and return its public reference
    async fn upload(&self, data_uri: &str) -> Result<String, ImageStoreError>;
}

/// Decoded `data:image/...;base64,` payload
#[derive(Debug, PartialEq, Eq)]
pub struct ImagePayload {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

pub fn parse_data_uri(data_uri: &str) -> Result<ImagePayload, ImageStoreError> {
    let invalid = || ImageStoreError::InvalidImage("Invalid image data".to_string());

    let rest = data_uri.trim().strip_prefix("data:").ok_or_else(invalid)?;
    let (meta, encoded) = rest.split_once(',').ok_or_else(invalid)?;
    let mime = meta.strip_suffix(";base64").ok_or_else(invalid)?;

    let extension = match mime.to_ascii_lowercase().as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        _ => {
            return Err(ImageStoreError::InvalidImage(
                "Only JPEG, PNG, and GIF images are allowed".to_string(),
            ))
        }
    };

    let bytes = STANDARD.decode(encoded.trim()).map_err(|_| invalid())?;
    if bytes.is_empty() {
        return Err(invalid());
    }

    Ok(ImagePayload { extension, bytes })
}

/// Writes images into a local directory served under `public_prefix`
pub struct DiskImageStore {
    dir: PathBuf,
    public_prefix: String,
}

impl DiskImageStore {
    pub fn new(dir: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_prefix: public_prefix.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ImageStore for DiskImageStore {
    async fn upload(&self, data_uri: &str) -> Result<String, ImageStoreError> {
        let payload = parse_data_uri(data_uri)?;
        let file_name = format!("{}.{}", Uuid::new_v4().simple(), payload.extension);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file_name), &payload.bytes).await?;

        info!(file = %file_name, bytes = payload.bytes.len(), "Stored profile image");
        Ok(format!("{}/{}", self.public_prefix, file_name))
    }
}
