//! Publishing merged documents to the object store.
//!
//! The output location is derived from the merge group and output format
//! alone, so re-running a merge replaces the previous output in place.

use std::sync::Arc;
use tracing::info;

use crate::config::PublishOptions;
use crate::error::{MergeError, Result};
use crate::io::{PdfWriter, WriteOptions};
use crate::merge::MergedDocument;
use crate::storage::{ObjectStore, PDF_CONTENT_TYPE};
use crate::utils::format_file_size;

/// Location and shape of a published merged document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    /// Object path the merged document was written to.
    pub output_path: String,
    /// Size of the merged document in bytes.
    pub size_bytes: u64,
    /// Number of pages in the merged document.
    pub page_count: usize,
}

/// Object path for the merged output of `group_id` in `format`.
///
/// ```
/// use pdfmerge::publish::output_path;
///
/// assert_eq!(output_path("temp", "ord_42", "a5"), "temp/ord_42/merged_a5.pdf");
/// ```
pub fn output_path(prefix: &str, group_id: &str, format: &str) -> String {
    format!(
        "{}/{}/merged_{}.pdf",
        prefix.trim_matches('/'),
        group_id,
        format
    )
}

/// Serializes merged documents and uploads them.
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    writer: PdfWriter,
    prefix: String,
}

impl Publisher {
    /// Create a publisher writing to `store`.
    pub fn new(store: Arc<dyn ObjectStore>, options: &PublishOptions) -> Self {
        Self {
            store,
            writer: PdfWriter::with_options(WriteOptions {
                compress: options.compress,
            }),
            prefix: options.prefix.clone(),
        }
    }

    /// Object path this publisher uses for `group_id` and `format`.
    pub fn output_path(&self, group_id: &str, format: &str) -> String {
        output_path(&self.prefix, group_id, format)
    }

    /// Serialize `merged` and upload it, replacing any previous output.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::MergeFailed`] if serialization fails and
    /// [`MergeError::Publish`] if the store rejects the upload.
    pub async fn publish(
        &self,
        merged: MergedDocument,
        group_id: &str,
        format: &str,
    ) -> Result<MergeResult> {
        let page_count = merged.page_count;
        let bytes = self.writer.to_bytes(merged.document).await?;
        let size_bytes = bytes.len() as u64;

        info!(
            "Merge complete: {} bytes ({}), {} pages",
            size_bytes,
            format_file_size(size_bytes),
            page_count
        );

        let path = self.output_path(group_id, format);
        self.store
            .upload(&path, bytes, PDF_CONTENT_TYPE, true)
            .await
            .map_err(|e| MergeError::publish(&path, e.to_string()))?;

        info!("Uploaded merged PDF to: {}", path);

        Ok(MergeResult {
            output_path: path,
            size_bytes,
            page_count,
        })
    }
}
