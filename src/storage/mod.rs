//! Card output storage
//! Uses Apache Arrow object_store crate so runs can target a local directory
//! while tests stay in memory

use object_store::{ObjectStore, local::LocalFileSystem, path::Path as StoragePath};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cannot prepare output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Metadata returned after upload
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub key: String,
    pub size: usize,
}

/// Object key of the card written for a run-local sequence number
pub fn card_key(sequence: u32) -> String {
    format!("Card_{}.png", sequence)
}

/// Storage client wrapping object_store
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
}

impl StorageClient {
    /// Create new storage client with any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Store cards as files under `dir`, creating it if needed
    pub fn local(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|source| StorageError::OutputDir {
            path: dir.display().to_string(),
            source,
        })?;

        let store = LocalFileSystem::new_with_prefix(dir)?;
        Ok(Self::new(Arc::new(store)))
    }

    /// Create in-memory storage for testing/development
    pub fn in_memory() -> Self {
        Self::new(Arc::new(object_store::memory::InMemory::new()))
    }

    /// Upload bytes to storage
    pub async fn upload(&self, key: &str, data: Vec<u8>) -> Result<UploadMetadata> {
        let path = StoragePath::from(key);
        let size = data.len();

        self.store.put(&path, data.into()).await?;

        tracing::debug!(key, size, "Uploaded to storage");

        Ok(UploadMetadata {
            key: key.to_string(),
            size,
        })
    }

    /// Download from storage
    pub async fn download(&self, key: &str) -> Result<Vec<u8>> {
        let path = StoragePath::from(key);

        let result = self.store.get(&path).await?;
        let bytes = result.bytes().await?;

        Ok(bytes.to_vec())
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = StoragePath::from(key);

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_card_key() {
        assert_eq!(card_key(1), "Card_1.png");
        assert_eq!(card_key(10), "Card_10.png");
    }

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let storage = StorageClient::in_memory();

        let meta = storage.upload("Card_1.png", vec![1, 2, 3]).await.unwrap();
        assert_eq!(meta.size, 3);

        assert!(storage.exists("Card_1.png").await.unwrap());
        assert!(!storage.exists("Card_2.png").await.unwrap());
        assert_eq!(storage.download("Card_1.png").await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_local_writes_plain_files() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("cards");

        let storage = StorageClient::local(&out).unwrap();
        storage.upload(&card_key(1), b"png".to_vec()).await.unwrap();

        let written = std::fs::read(out.join("Card_1.png")).unwrap();
        assert_eq!(written, b"png");
    }
}
