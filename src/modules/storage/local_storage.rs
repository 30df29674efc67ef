//! Local filesystem attachment storage
//!
//! Files live under a private root that is never served as static content.
//! Keys are derived purely from `(case_id, attachment_id)` with no extension;
//! filenames and MIME types stay in metadata.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the storage root if it does not exist
    pub async fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create storage root {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Storage key for an attachment
    pub fn key_for(case_id: Uuid, attachment_id: Uuid) -> String {
        format!("{}/{}", case_id, attachment_id)
    }

    /// Resolve a key to its on-disk path.
    ///
    /// Only keys of the form `<uuid>/<uuid>` are accepted.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let (case_part, attachment_part) = key
            .split_once('/')
            .ok_or_else(|| AppError::Storage(format!("Malformed storage key: {}", key)))?;

        let case_id = Uuid::parse_str(case_part)
            .map_err(|_| AppError::Storage(format!("Malformed storage key: {}", key)))?;
        let attachment_id = Uuid::parse_str(attachment_part)
            .map_err(|_| AppError::Storage(format!("Malformed storage key: {}", key)))?;

        Ok(self
            .root
            .join(case_id.to_string())
            .join(attachment_id.to_string()))
    }

    /// Write bytes for a key, replacing any previous content
    pub async fn write(&self, key: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Storage(format!("Failed to create directory for {}: {}", key, e))
            })?;
        }

        // Write then rename so readers never observe a partial file
        let tmp = path.with_extension("part");
        fs::write(&tmp, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", key, e)))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to finalize {}: {}", key, e)))?;

        debug!("Stored {} bytes at {}", data.len(), key);
        Ok(())
    }

    pub async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.path_for(key)?;
        fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::NotFound("Attachment file not found".to_string()),
            _ => AppError::Storage(format!("Failed to read {}: {}", key, e)),
        })
    }

    /// Remove the bytes for a key. A missing file counts as success.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Storage key {} already absent", key);
                Ok(())
            }
            Err(e) => Err(AppError::Storage(format!("Failed to delete {}: {}", key, e))),
        }
    }

    /// Best-effort removal of a case directory once it is empty
    pub async fn remove_case_dir(&self, case_id: Uuid) {
        let dir = self.root.join(case_id.to_string());
        match fs::remove_dir(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove case directory {}: {}", dir.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let key = LocalStorage::key_for(Uuid::new_v4(), Uuid::new_v4());

        storage.write(&key, b"evidence").await.unwrap();
        assert_eq!(storage.read(&key).await.unwrap(), b"evidence");

        storage.delete(&key).await.unwrap();
        assert!(matches!(
            storage.read(&key).await,
            Err(AppError::NotFound(_))
        ));
        // Deleting again is not an error
        storage.delete(&key).await.unwrap();
    }

    #[test]
    fn test_key_has_no_extension_and_stays_under_root() {
        let storage = LocalStorage::new("/srv/wb");
        let case_id = Uuid::new_v4();
        let attachment_id = Uuid::new_v4();
        let key = LocalStorage::key_for(case_id, attachment_id);

        let path = storage.path_for(&key).unwrap();
        assert!(path.starts_with("/srv/wb"));
        assert_eq!(path.extension(), None);
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), attachment_id.to_string());
    }

    #[test]
    fn test_rejects_traversal_keys() {
        let storage = LocalStorage::new("/srv/wb");
        assert!(storage.path_for("../etc/passwd").is_err());
        assert!(storage.path_for("evidence.pdf").is_err());
        assert!(storage
            .path_for(&format!("{}/../../x", Uuid::new_v4()))
            .is_err());
    }

    #[tokio::test]
    async fn test_remove_case_dir() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let case_id = Uuid::new_v4();
        let key = LocalStorage::key_for(case_id, Uuid::new_v4());

        storage.write(&key, b"x").await.unwrap();
        storage.delete(&key).await.unwrap();
        storage.remove_case_dir(case_id).await;

        assert!(!dir.path().join(case_id.to_string()).exists());
    }
}
