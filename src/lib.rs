//! pdfmerge - Concatenate stored PDF batches into a single document.
//!
//! This library implements a small HTTP service that downloads an ordered
//! list of PDF batches from object storage, appends their pages in order to
//! one document and uploads the result. It provides:
//!
//! - Strictly ordered, fail-fast retrieval of source batches
//! - Page concatenation that preserves source and intra-source order
//! - Idempotent publishing to a path derived from the merge group
//! - Supabase, filesystem and in-memory storage backends
//!
//! # Examples
//!
//! ## Running a merge
//!
//! ```no_run
//! use pdfmerge::config::PublishOptions;
//! use pdfmerge::pipeline::{MergeRequest, Pipeline};
//! use pdfmerge::storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(MemoryStore::new());
//! let request = MergeRequest::new(
//!     vec!["batches/1.pdf".to_string(), "batches/2.pdf".to_string()],
//!     "ord_1042",
//!     "a5",
//! );
//!
//! let mut pipeline = Pipeline::new(store, &PublishOptions::default());
//! let result = pipeline.run(request).await?;
//! println!("{} pages written to {}", result.page_count, result.output_path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Serving HTTP
//!
//! ```no_run
//! use pdfmerge::config::Config;
//! use pdfmerge::{server, storage};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(Config::for_memory("s3cret"));
//! let store = storage::connect(&config.storage)?;
//! server::serve(config, store).await?;
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all)]

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod io;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod publish;
pub mod server;
pub mod storage;
pub mod utils;


// Re-export commonly used types
pub use config::Config;
pub use error::{MergeError, Result};
pub use pipeline::{MergeRequest, Pipeline};
pub use publish::MergeResult;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
