//! Request-scoped merge pipeline.
//!
//! A [`Pipeline`] runs exactly one [`MergeRequest`] through the stages
//! fetch, merge and publish, each completing before the next begins. The
//! first failure moves the pipeline to [`PipelineState::Failed`] and is
//! returned to the caller; nothing is retried.

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::config::PublishOptions;
use crate::error::{MergeError, Result};
use crate::fetch::{BatchBuffer, Fetcher};
use crate::merge::{MergedDocument, Merger};
use crate::publish::{MergeResult, Publisher};
use crate::storage::ObjectStore;
use crate::utils::format_file_size;

/// One merge request, as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    /// Object paths of the batches, in output order.
    pub source_paths: Vec<String>,
    /// Merge group the output belongs to.
    pub group_id: String,
    /// Output format label, part of the output path.
    pub output_format: String,
}

impl MergeRequest {
    /// Create a request.
    pub fn new(
        source_paths: Vec<String>,
        group_id: impl Into<String>,
        output_format: impl Into<String>,
    ) -> Self {
        Self {
            source_paths,
            group_id: group_id.into(),
            output_format: output_format.into(),
        }
    }

    /// Check the request before any I/O is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::EmptySourceList`] if there are no source paths
    /// and [`MergeError::InvalidRequest`] if a source path is blank or the
    /// group id or format cannot form an output path.
    pub fn validate(&self) -> Result<()> {
        if self.source_paths.is_empty() {
            return Err(MergeError::EmptySourceList);
        }

        if let Some(position) = self.source_paths.iter().position(|p| p.trim().is_empty()) {
            return Err(MergeError::invalid_request(format!(
                "storagePaths[{position}] must not be empty"
            )));
        }

        validate_segment("orderId", &self.group_id)?;
        validate_segment("format", &self.output_format)?;

        Ok(())
    }
}

fn validate_segment(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(MergeError::invalid_request(format!("{field} is required")));
    }
    if value.contains('/') || value.contains('\\') || value.contains("..") {
        return Err(MergeError::invalid_request(format!(
            "{field} must not contain path separators: {value}"
        )));
    }
    Ok(())
}

/// Stage a pipeline is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Fetching,
    Merging,
    Publishing,
    Done(MergeResult),
    Failed(String),
}

impl PipelineState {
    /// Whether the pipeline can move from `self` to `next`.
    pub fn can_transition_to(&self, next: &PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, next),
            (Idle, Fetching)
                | (Fetching, Merging)
                | (Merging, Publishing)
                | (Publishing, Done(_))
                | (Fetching | Merging | Publishing, Failed(_))
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done(_) | PipelineState::Failed(_))
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "idle"),
            PipelineState::Fetching => write!(f, "fetching"),
            PipelineState::Merging => write!(f, "merging"),
            PipelineState::Publishing => write!(f, "publishing"),
            PipelineState::Done(_) => write!(f, "done"),
            PipelineState::Failed(_) => write!(f, "failed"),
        }
    }
}

/// Runs a single merge request against an object store.
pub struct Pipeline {
    fetcher: Fetcher,
    publisher: Publisher,
    state: PipelineState,
}

impl Pipeline {
    /// Create an idle pipeline.
    pub fn new(store: Arc<dyn ObjectStore>, options: &PublishOptions) -> Self {
        Self {
            fetcher: Fetcher::new(Arc::clone(&store)),
            publisher: Publisher::new(store, options),
            state: PipelineState::Idle,
        }
    }

    /// Current stage.
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Run `request` to completion or to its first failure.
    ///
    /// An invalid request is rejected while the pipeline is still idle, so
    /// no store call is made for it.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by validation or by any stage. A
    /// pipeline that has already run refuses to run again.
    pub async fn run(&mut self, request: MergeRequest) -> Result<MergeResult> {
        if self.state != PipelineState::Idle {
            return Err(MergeError::other(format!(
                "pipeline already ran (state: {})",
                self.state
            )));
        }

        request.validate()?;

        info!(
            "Merging {} batches for {} ({})",
            request.source_paths.len(),
            request.group_id,
            request.output_format
        );

        match self.execute(&request).await {
            Ok(result) => {
                self.transition(PipelineState::Done(result.clone()));
                Ok(result)
            }
            Err(e) => {
                error!("Merge failed for {}: {}", request.group_id, e);
                self.transition(PipelineState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn execute(&mut self, request: &MergeRequest) -> Result<MergeResult> {
        self.transition(PipelineState::Fetching);
        let buffers = self.fetcher.fetch_all(&request.source_paths).await?;

        self.transition(PipelineState::Merging);
        let merged = merge_blocking(buffers).await?;
        log_statistics(&merged);

        self.transition(PipelineState::Publishing);
        self.publisher
            .publish(merged, &request.group_id, &request.output_format)
            .await
    }

    fn transition(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_transition_to(&next),
            "invalid transition {} -> {}",
            self.state,
            next
        );
        debug!("Pipeline {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Decode and compose on the blocking pool; the buffers are consumed there.
fn log_statistics(merged: &MergedDocument) {
    let stats = &merged.statistics;
    debug!(
        "Merged {} files ({} pages, per batch {:?}) from {} in {:.2?} (load {:.2?})",
        stats.files_merged,
        stats.total_pages,
        stats.pages_per_batch,
        format_file_size(stats.input_size),
        stats.merge_time,
        stats.load_time
    );
}

async fn merge_blocking(buffers: Vec<BatchBuffer>) -> Result<MergedDocument> {
    tokio::task::spawn_blocking(move || Merger::new().merge(buffers))
        .await
        .map_err(|e| MergeError::other(format!("Merge task failed: {e}")))?
}
