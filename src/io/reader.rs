//! Decoding downloaded batches into PDF documents.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::fetch::BatchBuffer;
//! use pdfmerge::io::PdfReader;
//!
//! # fn example(batch: BatchBuffer) -> Result<(), Box<dyn std::error::Error>> {
//! let loaded = PdfReader::new().load(&batch)?;
//! println!("{} has {} pages", loaded.path, loaded.page_count);
//! # Ok(())
//! # }
//! ```

use lopdf::Document;
use std::time::{Duration, Instant};

use crate::error::{MergeError, Result};
use crate::fetch::BatchBuffer;

/// A decoded batch with metadata.
#[derive(Debug)]
pub struct LoadedPdf {
    /// The PDF document.
    pub document: Document,

    /// Zero-based position of the batch in the request.
    pub index: usize,

    /// Object path the batch was downloaded from.
    pub path: String,

    /// Number of pages in the document.
    pub page_count: usize,

    /// Size of the encoded batch in bytes.
    pub byte_len: u64,

    /// Time taken to decode the batch.
    pub load_time: Duration,
}

/// Decodes raw batch bytes into documents.
#[derive(Debug, Clone, Default)]
pub struct PdfReader;

impl PdfReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Decode a single batch.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::Decode`] naming the batch if its bytes are not a
    /// well-formed PDF (including encrypted documents that cannot be opened).
    pub fn load(&self, batch: &BatchBuffer) -> Result<LoadedPdf> {
        let start = Instant::now();

        let document = Document::load_mem(&batch.bytes).map_err(|e| {
            let reason = e.to_string();
            if reason.contains("encrypt") || reason.contains("password") {
                MergeError::decode(batch.index, &batch.path, format!("PDF is encrypted: {reason}"))
            } else {
                MergeError::decode(batch.index, &batch.path, reason)
            }
        })?;

        let page_count = document.get_pages().len();

        Ok(LoadedPdf {
            document,
            index: batch.index,
            path: batch.path.clone(),
            page_count,
            byte_len: batch.bytes.len() as u64,
            load_time: start.elapsed(),
        })
    }
}
