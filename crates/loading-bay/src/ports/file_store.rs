//! Storage for payment proofs and vehicle photos. The bay keeps only the returned id and
//! url.

use crate::error::BayError;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

const ACCEPTED_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "application/pdf",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("Upload is empty")]
    Empty,

    #[error("Unsupported content type: {0}")]
    UnsupportedType(String),

    #[error("File store unavailable: {0}")]
    Unavailable(String),
}

impl From<FileStoreError> for BayError {
    fn from(e: FileStoreError) -> Self {
        match e {
            FileStoreError::Empty | FileStoreError::UnsupportedType(_) => {
                BayError::Validation(e.to_string())
            }
            FileStoreError::Unavailable(_) => BayError::Dependency(e.to_string()),
        }
    }
}

#[async_trait]
pub trait FileStore: Send + Sync {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredFile, FileStoreError>;
}

/// Rejects empty uploads and anything that is not an image or a PDF.
pub fn check_upload(bytes: &[u8], content_type: &str) -> Result<(), FileStoreError> {
    if bytes.is_empty() {
        return Err(FileStoreError::Empty);
    }
    let normalized = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !ACCEPTED_TYPES.contains(&normalized.as_str()) {
        return Err(FileStoreError::UnsupportedType(content_type.to_string()));
    }
    Ok(())
}

struct StoredBlob {
    content_type: String,
    bytes: Vec<u8>,
}

/// Keeps uploads in process memory.
pub struct InMemoryFileStore {
    base_url: String,
    files: RwLock<HashMap<String, StoredBlob>>,
}

impl InMemoryFileStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Content type and bytes of a stored file.
    pub async fn fetch(&self, id: &str) -> Option<(String, Vec<u8>)> {
        self.files
            .read()
            .await
            .get(id)
            .map(|blob| (blob.content_type.clone(), blob.bytes.clone()))
    }

    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredFile, FileStoreError> {
        check_upload(&bytes, content_type)?;
        let id = Uuid::new_v4().simple().to_string();
        let url = format!("{}/files/{}", self.base_url, id);
        self.files.write().await.insert(
            id.clone(),
            StoredBlob {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(StoredFile { id, url })
    }
}
