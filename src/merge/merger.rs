//! Core PDF merging implementation.
//!
//! The first batch seeds the merged document. Every following batch is
//! decoded, its objects are renumbered past the merged document's highest
//! id, and its pages are appended to the merged root page tree. Source
//! order and each source's internal page order are preserved.

use lopdf::Document;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::error::{MergeError, Result};
use crate::fetch::BatchBuffer;
use crate::io::PdfReader;
use crate::merge::pages;

/// Statistics about a merge operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeStatistics {
    /// Number of batches merged.
    pub files_merged: usize,

    /// Page count of each batch, in request order.
    pub pages_per_batch: Vec<usize>,

    /// Total number of pages in the merged document.
    pub total_pages: usize,

    /// Total size of the encoded batches.
    pub input_size: u64,

    /// Time spent decoding batches.
    pub load_time: Duration,

    /// Total time taken for the merge.
    pub merge_time: Duration,
}

/// The composed document together with its page count.
#[derive(Debug)]
pub struct MergedDocument {
    /// The merged PDF document.
    pub document: Document,

    /// Number of pages in `document`.
    pub page_count: usize,

    /// Statistics about the merge.
    pub statistics: MergeStatistics,
}

/// PDF merger that concatenates batches.
#[derive(Debug, Clone, Default)]
pub struct Merger {
    reader: PdfReader,
}

impl Merger {
    /// Create a new merger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `batches` into a single document, in the order given.
    ///
    /// Each batch's bytes are released as soon as it has been decoded.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `batches` is empty
    /// - Any batch fails to decode ([`MergeError::Decode`], naming the batch)
    /// - The merged page tree cannot be updated
    pub fn merge(&self, batches: Vec<BatchBuffer>) -> Result<MergedDocument> {
        let merge_start = Instant::now();
        let total = batches.len();

        let mut batches = batches.into_iter();
        let first = batches.next().ok_or(MergeError::EmptySourceList)?;

        let seed = self.reader.load(&first)?;
        drop(first);

        let mut load_time = seed.load_time;
        let mut input_size = seed.byte_len;
        let mut pages_per_batch = Vec::with_capacity(total);
        pages_per_batch.push(seed.page_count);

        info!("[1/{}] Base: {} ({} pages)", total, seed.path, seed.page_count);

        let mut merged = seed.document;
        let pages_id = pages::root_pages_id(&merged)?;
        let mut max_id = merged.max_id;

        for batch in batches {
            info!("Merging batch {}/{}...", batch.index + 1, total);

            let loaded = self.reader.load(&batch)?;
            drop(batch);

            load_time += loaded.load_time;
            input_size += loaded.byte_len;
            pages_per_batch.push(loaded.page_count);

            let mut doc = loaded.document;

            // Avoid object id collisions by renumbering the incoming document
            doc.renumber_objects_with(max_id + 1);
            max_id = doc.max_id;

            let detached = pages::detach_pages(&doc)?;
            merged.objects.extend(doc.objects);

            let added = pages::attach_pages(&mut merged, pages_id, detached)?;
            debug!("{} ({} pages added)", loaded.path, added);
        }

        merged.max_id = max_id;

        let expected: usize = pages_per_batch.iter().sum();
        pages::set_page_count(&mut merged, pages_id, expected)?;

        if total > 1 {
            // Drop the source catalogs and page tree roots left unreferenced.
            merged.prune_objects();
            merged.renumber_objects();
        }

        let page_count = merged.get_pages().len();
        if page_count != expected {
            return Err(MergeError::merge_failed(format!(
                "merged document has {page_count} pages, expected {expected}"
            )));
        }

        let statistics = MergeStatistics {
            files_merged: total,
            pages_per_batch,
            total_pages: page_count,
            input_size,
            load_time,
            merge_time: merge_start.elapsed(),
        };

        Ok(MergedDocument {
            document: merged,
            page_count,
            statistics,
        })
    }
}
