//! Retrieval of source batches from the object store.
//!
//! Batches are downloaded strictly one after another, in request order. The
//! first failed download aborts the whole fetch; no further paths are
//! requested and no partial result is returned.

use std::sync::Arc;
use tracing::info;

use crate::error::{MergeError, Result};
use crate::storage::ObjectStore;
use crate::utils::format_file_size;

/// Raw bytes of one downloaded batch, tagged with its request position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchBuffer {
    /// Zero-based position of the batch in the request.
    pub index: usize,
    /// Object path the batch was downloaded from.
    pub path: String,
    /// Encoded PDF bytes.
    pub bytes: Vec<u8>,
}

impl BatchBuffer {
    /// Size of the batch in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the batch holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Downloads batches in order.
pub struct Fetcher {
    store: Arc<dyn ObjectStore>,
}

impl Fetcher {
    /// Create a fetcher reading from `store`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Download every path in `paths`, in order.
    ///
    /// The returned buffers are index-aligned with `paths`.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Fetch`] naming the first path that could not be
    /// downloaded, or that the store returned no data for.
    pub async fn fetch_all(&self, paths: &[String]) -> Result<Vec<BatchBuffer>> {
        let total = paths.len();
        let mut buffers = Vec::with_capacity(total);

        for (index, path) in paths.iter().enumerate() {
            info!("Downloading batch {}/{}: {}", index + 1, total, path);

            let bytes = self
                .store
                .download(path)
                .await
                .map_err(|e| MergeError::fetch(index, path, e.to_string()))?;

            if bytes.is_empty() {
                return Err(MergeError::fetch(index, path, "store returned no data"));
            }

            info!(
                "Batch {} downloaded: {}",
                index + 1,
                format_file_size(bytes.len() as u64)
            );

            buffers.push(BatchBuffer {
                index,
                path: path.clone(),
                bytes,
            });
        }

        Ok(buffers)
    }
}
