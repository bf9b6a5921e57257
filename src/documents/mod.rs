//! Document blob storage behind an injectable trait.
//!
//! The portal treats uploaded files as opaque blobs: the REST layer records
//! metadata in SQLite and hands the bytes here. The default implementation
//! writes under the configured uploads directory; an object-store
//! implementation can replace it without touching the routes.

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use uuid::Uuid;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist the blob and return its store-relative path.
    async fn save(
        &self,
        user_id: &str,
        doc_type: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String>;

    /// Remove a previously saved blob. Missing files are not an error.
    async fn delete(&self, stored_path: &str) -> Result<()>;
}

/// Local-filesystem store: `{root}/{user_id}/{doc_type}/{uuid}.{ext}`.
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl DocumentStore for LocalDiskStore {
    async fn save(
        &self,
        user_id: &str,
        doc_type: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let extension = original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.len() <= 10)
            .unwrap_or("bin");
        let relative = format!("{user_id}/{doc_type}/{}.{extension}", Uuid::new_v4());
        let full = self.root.join(&relative);

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create upload directory")?;
        }
        tokio::fs::write(&full, bytes)
            .await
            .with_context(|| format!("Failed to write upload: {}", full.display()))?;
        Ok(relative)
    }

    async fn delete(&self, stored_path: &str) -> Result<()> {
        let full = self.root.join(stored_path);
        match tokio::fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete: {}", full.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn save_and_delete_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = LocalDiskStore::new(dir.path());

        let path = store
            .save("user-1", "aadhaar", "card.pdf", b"content")
            .await
            .unwrap();
        assert!(path.starts_with("user-1/aadhaar/"));
        assert!(path.ends_with(".pdf"));
        assert_eq!(
            tokio::fs::read(dir.path().join(&path)).await.unwrap(),
            b"content"
        );

        store.delete(&path).await.unwrap();
        assert!(!dir.path().join(&path).exists());
        // Deleting again is a no-op.
        store.delete(&path).await.unwrap();
    }

    #[tokio::test]
    async fn extension_falls_back_for_odd_names() {
        let dir = TempDir::new().unwrap();
        let store = LocalDiskStore::new(dir.path());
        let path = store.save("u", "other", "noext", b"x").await.unwrap();
        assert!(path.ends_with(".bin"));
    }
}
