//! Submission file store boundary
//!
//! Bytes are written and served by an external store; the workflow only
//! needs to know whether a plaintext path points at something and how big
//! it is.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

/// Errors raised by a file store lookup
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("path escapes the storage root: {0}")]
    OutsideRoot(String),

    #[error("file not found: {0}")]
    NotFound(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only view of the durable file store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Check whether a file exists at `path`
    async fn exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Size of the file at `path` in bytes
    async fn size(&self, path: &str) -> Result<u64, StorageError>;
}

/// File store rooted at a local directory
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a store path under the root, refusing absolute paths and
    /// parent segments.
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(StorageError::OutsideRoot(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn exists(&self, path: &str) -> Result<bool, StorageError> {
        let full = self.resolve(path)?;
        Ok(fs::try_exists(&full).await?)
    }

    async fn size(&self, path: &str) -> Result<u64, StorageError> {
        let full = self.resolve(path)?;
        match fs::metadata(&full).await {
            Ok(meta) if meta.is_file() => Ok(meta.len()),
            Ok(_) => Err(StorageError::NotFound(path.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (LocalFileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());
        (store, dir)
    }

    #[tokio::test]
    async fn test_exists_and_size() {
        let (store, dir) = temp_store();
        std::fs::create_dir_all(dir.path().join("2026")).unwrap();
        std::fs::write(dir.path().join("2026/copie.pdf"), b"twelve bytes").unwrap();

        assert!(store.exists("2026/copie.pdf").await.unwrap());
        assert_eq!(store.size("2026/copie.pdf").await.unwrap(), 12);
        assert!(!store.exists("2026/absent.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_file_size_is_not_found() {
        let (store, _dir) = temp_store();
        assert!(matches!(
            store.size("absent.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_paths_cannot_escape_root() {
        let (store, _dir) = temp_store();
        assert!(matches!(
            store.exists("../secret").await,
            Err(StorageError::OutsideRoot(_))
        ));
        assert!(matches!(
            store.size("/etc/passwd").await,
            Err(StorageError::OutsideRoot(_))
        ));
    }
}
