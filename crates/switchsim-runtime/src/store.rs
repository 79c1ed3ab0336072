//! Durable copy of the latest config push per switch

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::StoreError;

const CONFIG_MESSAGE_SUFFIX: &str = "ConfigMessage";

/// Writes `<dir>/<switchName>ConfigMessage`, replacing earlier content
#[derive(Debug, Clone)]
pub struct ConfigMessageStore {
    dir: PathBuf,
}

impl ConfigMessageStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, switch_name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", switch_name, CONFIG_MESSAGE_SUFFIX))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn persist(&self, switch_name: &str, raw: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.path_for(switch_name);
        tokio::fs::write(&path, raw).await.map_err(|source| StoreError {
            path: path.display().to_string(),
            source,
        })?;

        debug!("{}: config message written to {}", switch_name, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_persist_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigMessageStore::new(dir.path());

        store.persist("sw0", b"first payload, longer").await.unwrap();
        let path = store.persist("sw0", b"second").await.unwrap();

        assert_eq!(path, dir.path().join("sw0ConfigMessage"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_persist_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigMessageStore::new(dir.path());

        let path = store.persist("sw1", b"same").await.unwrap();
        let first = tokio::fs::read(&path).await.unwrap();
        store.persist("sw1", b"same").await.unwrap();
        let second = tokio::fs::read(&path).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_persist_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigMessageStore::new(dir.path().join("missing"));

        let err = store.persist("sw0", b"x").await.unwrap_err();
        assert!(err.path.ends_with("sw0ConfigMessage"));
    }
}
