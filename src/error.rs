//! Error types for pdfmerge.
//!
//! Every failure a merge request can run into is expressed as a
//! [`MergeError`]. The first error raised by any stage aborts the request;
//! errors are never aggregated.
//!
//! # Error Categories
//!
//! - **Validation**: malformed or empty requests, rejected before any I/O
//! - **Fetch**: a batch could not be downloaded from the object store
//! - **Decode**: a downloaded batch is not a well-formed PDF
//! - **Merge**: the composed page tree could not be built or serialized
//! - **Publish**: the merged document could not be written back to the store

use std::io;

/// Result type alias for pdfmerge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// The pipeline stage (or surrounding concern) an error originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed.
    Validation,
    /// A source batch could not be retrieved.
    Fetch,
    /// A source batch could not be decoded.
    Decode,
    /// Page composition or serialization failed.
    Merge,
    /// The merged output could not be stored.
    Publish,
    /// The process configuration is invalid.
    Config,
    /// Anything else.
    Internal,
}

/// Main error type for pdfmerge operations.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// The request carried no source paths.
    #[error("storagePaths is required and must be a non-empty array")]
    EmptySourceList,

    /// The request is malformed in some other way.
    #[error("Invalid merge request: {message}")]
    InvalidRequest {
        /// What is wrong with the request.
        message: String,
    },

    /// A batch could not be downloaded.
    #[error("Failed to download {path}: {reason}")]
    Fetch {
        /// Zero-based position of the batch in the request.
        index: usize,
        /// Object path of the batch.
        path: String,
        /// Reason reported by the store.
        reason: String,
    },

    /// A downloaded batch is not a well-formed PDF.
    #[error("Failed to decode batch {} ({path}): {reason}", .index + 1)]
    Decode {
        /// Zero-based position of the batch in the request.
        index: usize,
        /// Object path of the batch.
        path: String,
        /// Parser error.
        reason: String,
    },

    /// The page tree of the composed document could not be built or saved.
    #[error("Merge operation failed: {reason}")]
    MergeFailed {
        /// Description of what went wrong.
        reason: String,
    },

    /// The merged document could not be uploaded.
    #[error("Failed to upload merged PDF to {path}: {reason}")]
    Publish {
        /// Destination object path.
        path: String,
        /// Reason reported by the store.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl MergeError {
    /// Create an InvalidRequest error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Create a Fetch error.
    pub fn fetch(index: usize, path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            index,
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Decode error.
    pub fn decode(index: usize, path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            index,
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a MergeFailed error.
    pub fn merge_failed(reason: impl Into<String>) -> Self {
        Self::MergeFailed {
            reason: reason.into(),
        }
    }

    /// Create a Publish error.
    pub fn publish(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Publish {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// The stage this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySourceList | Self::InvalidRequest { .. } => ErrorKind::Validation,
            Self::Fetch { .. } => ErrorKind::Fetch,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::MergeFailed { .. } => ErrorKind::Merge,
            Self::Publish { .. } => ErrorKind::Publish,
            Self::InvalidConfig { .. } => ErrorKind::Config,
            Self::Io(_) | Self::Other { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error was caused by the caller's input.
    ///
    /// Client errors are detected before any I/O takes place.
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Object path of the source batch this error refers to, if any.
    pub fn source_path(&self) -> Option<&str> {
        match self {
            Self::Fetch { path, .. } | Self::Decode { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl From<lopdf::Error> for MergeError {
    fn from(err: lopdf::Error) -> Self {
        Self::merge_failed(err.to_string())
    }
}
