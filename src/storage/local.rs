//! Filesystem-backed object store.
//!
//! Object paths are interpreted relative to a root directory. Uploads are
//! written to a temporary sibling first and renamed into place, so readers
//! never observe a partially written object.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

use super::{ObjectStore, StorageError, StorageResult};

/// Object store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a store rooted at `root`. The directory is created on first upload.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map an object path onto the filesystem, refusing paths that would
    /// escape the root.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        let mut resolved = self.root.clone();
        let mut has_file = false;

        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    has_file = true;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        has_file.then_some(resolved)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    async fn download(&self, path: &str) -> StorageResult<Vec<u8>> {
        let file = self
            .resolve(path)
            .ok_or_else(|| StorageError::read(path, "Invalid object path"))?;

        debug!("Reading {}", file.display());

        fs::read(&file).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::read(path, "Object not found")
            } else {
                StorageError::read(path, e.to_string())
            }
        })
    }

    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: &str,
        overwrite: bool,
    ) -> StorageResult<()> {
        let file = self
            .resolve(path)
            .ok_or_else(|| StorageError::write(path, "Invalid object path"))?;

        if !overwrite && fs::try_exists(&file).await.unwrap_or(false) {
            return Err(StorageError::write(path, "The resource already exists"));
        }

        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::write(path, e.to_string()))?;
        }

        let tmp = file.with_extension("tmp");
        fs::write(&tmp, &bytes)
            .await
            .map_err(|e| StorageError::write(path, e.to_string()))?;
        fs::rename(&tmp, &file)
            .await
            .map_err(|e| StorageError::write(path, e.to_string()))?;

        debug!("Wrote {} ({} bytes)", file.display(), bytes.len());
        Ok(())
    }
}
