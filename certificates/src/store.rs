//! Filesystem asset store.

use eventdesk_core::providers::AssetStore;
use eventdesk_core::{DeskError, Result};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

/// Stores assets as files under a root directory.
///
/// Keys map to relative paths below the root; keys that would escape it
/// (absolute paths, `..`) are rejected.
#[derive(Clone, Debug)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    /// Store rooted at `root`. The directory is created on first write.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Storage`] for an empty key or one that leaves the root.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let contained = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !contained {
            return Err(DeskError::Storage(format!("Invalid asset key: {key:?}")));
        }
        Ok(self.root.join(relative))
    }
}

impl AssetStore for LocalAssetStore {
    fn put(&self, key: &str, bytes: Vec<u8>) -> impl Future<Output = Result<()>> + Send {
        let path = self.path_for(key);
        let key = key.to_string();

        async move {
            let path = path?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DeskError::Storage(format!("Failed to create directory: {e}")))?;
            }
            tokio::fs::write(&path, &bytes)
                .await
                .map_err(|e| DeskError::Storage(format!("Failed to write {key}: {e}")))?;

            tracing::debug!(key = %key, bytes = bytes.len(), "Asset stored");
            Ok(())
        }
    }

    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send {
        let path = self.path_for(key);
        let key = key.to_string();

        async move {
            match tokio::fs::read(path?).await {
                Ok(bytes) => Ok(Some(bytes)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(DeskError::Storage(format!("Failed to read {key}: {e}"))),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path());

        store.put("certificates/Ada.png", vec![1, 2, 3]).await.unwrap();

        assert_eq!(
            store.get("certificates/Ada.png").await.unwrap(),
            Some(vec![1, 2, 3])
        );
        assert!(dir.path().join("certificates").join("Ada.png").exists());
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path());
        assert_eq!(store.get("templates/certificate.png").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_put_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalAssetStore::new(dir.path());

        store.put("fonts/certificate", vec![1]).await.unwrap();
        store.put("fonts/certificate", vec![2]).await.unwrap();

        assert_eq!(store.get("fonts/certificate").await.unwrap(), Some(vec![2]));
    }

    #[test]
    fn test_keys_cannot_escape_root() {
        let store = LocalAssetStore::new("/srv/assets");
        for key in ["", "../secret", "a/../../b", "/etc/passwd", "./x"] {
            assert!(
                matches!(store.path_for(key), Err(DeskError::Storage(_))),
                "{key:?} was accepted"
            );
        }
        assert_eq!(
            store.path_for("certificates/sample.png").unwrap(),
            PathBuf::from("/srv/assets/certificates/sample.png")
        );
    }
}
