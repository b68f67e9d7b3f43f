//! Object storage abstraction.
//!
//! The merge pipeline reads source batches from, and writes the merged
//! document to, an external object store. Backends implement
//! [`ObjectStore`]:
//!
//! - [`SupabaseStore`] talks to the Supabase Storage REST API
//! - [`LocalStore`] keeps objects as files under a root directory
//! - [`MemoryStore`] keeps objects in process memory

pub mod local;
pub mod memory;
pub mod supabase;

pub use local::LocalStore;
pub use memory::{MemoryStore, StoreOp};
pub use supabase::SupabaseStore;

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::error::Result;

/// Content type of every document this service publishes.
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Result type for object store operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Errors reported by an object store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The object is absent or could not be transferred.
    #[error("{reason}")]
    Read {
        /// Object path.
        path: String,
        /// Store-side reason.
        reason: String,
    },

    /// The object could not be written.
    #[error("{reason}")]
    Write {
        /// Object path.
        path: String,
        /// Store-side reason.
        reason: String,
    },
}

impl StorageError {
    /// Create a Read error.
    pub fn read(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Read {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Write error.
    pub fn write(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Write {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The object path the failed operation targeted.
    pub fn path(&self) -> &str {
        match self {
            Self::Read { path, .. } | Self::Write { path, .. } => path,
        }
    }
}

/// Capability to read and write whole objects.
///
/// Implementations must be shareable across concurrent requests; they hold
/// only immutable configuration and connection pools.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short name of the backend, used in logs.
    fn backend_name(&self) -> &'static str;

    /// Download the full content of the object at `path`.
    async fn download(&self, path: &str) -> StorageResult<Vec<u8>>;

    /// Upload `bytes` to `path`.
    ///
    /// When `overwrite` is false and an object already exists at `path`, the
    /// upload fails with [`StorageError::Write`].
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        overwrite: bool,
    ) -> StorageResult<()>;
}

/// Build the object store selected by `config`.
///
/// # Errors
///
/// Returns an error if the backend cannot be initialised from its settings.
pub fn connect(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    let store: Arc<dyn ObjectStore> = match config {
        StorageConfig::Supabase(supabase) => Arc::new(SupabaseStore::new(supabase)?),
        StorageConfig::Local { root } => Arc::new(LocalStore::new(root.clone())),
        StorageConfig::Memory => Arc::new(MemoryStore::new()),
    };
    Ok(store)
}
