//! PDF merging functionality.
//!
//! This module composes downloaded batches into one document:
//! - [`merger`]: decodes batches and appends their pages in order
//! - [`pages`]: page-tree surgery used while appending

pub mod merger;
pub mod pages;

pub use merger::{MergeStatistics, MergedDocument, Merger};
