//! Serializing merged documents into bytes.
//!
//! The merged document never touches the local filesystem: it is encoded
//! into an in-memory buffer which the publisher uploads as-is.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::io::PdfWriter;
//! use lopdf::Document;
//!
//! # async fn example(doc: Document) -> Result<(), Box<dyn std::error::Error>> {
//! let bytes = PdfWriter::new().to_bytes(doc).await?;
//! println!("Encoded {} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use tokio::task;

use crate::error::{MergeError, Result};

/// Options for encoding PDF documents.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Compress content streams before encoding.
    pub compress: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self { compress: true }
    }
}

/// PDF writer with configurable behavior.
#[derive(Debug, Clone, Default)]
pub struct PdfWriter {
    options: WriteOptions,
}

impl PdfWriter {
    /// Create a new PDF writer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer with custom options.
    pub fn with_options(options: WriteOptions) -> Self {
        Self { options }
    }

    /// Create a writer without compression (faster but larger output).
    pub fn without_compression() -> Self {
        Self::with_options(WriteOptions { compress: false })
    }

    /// Encode `doc` into a byte buffer.
    ///
    /// Encoding runs on the blocking thread pool so large documents do not
    /// stall the async runtime.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::MergeFailed`] if the document cannot be
    /// serialized.
    pub async fn to_bytes(&self, mut doc: Document) -> Result<Vec<u8>> {
        let options = self.options.clone();

        task::spawn_blocking(move || {
            if options.compress {
                doc.compress();
            }

            let mut buffer = Vec::new();
            doc.save_to(&mut buffer).map_err(|e| {
                MergeError::merge_failed(format!("Failed to serialize merged PDF: {e}"))
            })?;

            Ok::<_, MergeError>(buffer)
        })
        .await
        .map_err(|e| MergeError::other(format!("Write task failed: {e}")))?
    }
}
