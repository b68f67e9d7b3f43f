//! Configuration module for pdfmerge.
//!
//! A [`Config`] is built once at startup (see [`crate::cli`]), validated, and
//! then shared read-only by every request. It handles:
//! - Storage backend selection and credentials
//! - Output location and serialization options
//! - HTTP listener settings and the shared request secret

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{MergeError, Result};

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default storage bucket holding both batches and merged output.
pub const DEFAULT_BUCKET: &str = "print-queue";

/// Default namespace for merged output objects.
pub const DEFAULT_OUTPUT_PREFIX: &str = "temp";

/// Default maximum accepted request body size (200 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 200 * 1024 * 1024;

/// Which object store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// Supabase Storage over HTTP.
    #[default]
    Supabase,
    /// Files under a local directory.
    Local,
    /// Process memory (contents are lost on exit).
    Memory,
}

impl FromStr for StorageBackend {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "supabase" => Ok(Self::Supabase),
            "local" => Ok(Self::Local),
            "memory" => Ok(Self::Memory),
            _ => Err(MergeError::invalid_config(format!(
                "Invalid storage backend: {s}. Must be one of: supabase, local, memory"
            ))),
        }
    }
}

/// Connection settings for Supabase Storage.
#[derive(Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Service role key used for both read and write access.
    pub service_key: String,
    /// Bucket holding source batches and merged output.
    pub bucket: String,
}

impl fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("service_key", &"[REDACTED]")
            .field("bucket", &self.bucket)
            .finish()
    }
}

/// Storage backend with its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Supabase Storage.
    Supabase(SupabaseConfig),
    /// Local directory.
    Local {
        /// Root directory of the store.
        root: PathBuf,
    },
    /// In-process memory.
    Memory,
}

impl StorageConfig {
    /// The backend this configuration selects.
    pub fn backend(&self) -> StorageBackend {
        match self {
            Self::Supabase(_) => StorageBackend::Supabase,
            Self::Local { .. } => StorageBackend::Local,
            Self::Memory => StorageBackend::Memory,
        }
    }
}

/// How merged documents are serialized and where they are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOptions {
    /// Namespace prepended to every output path.
    pub prefix: String,
    /// Compress content streams before serializing.
    pub compress: bool,
}

impl Default for PublishOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            compress: true,
        }
    }
}

/// Validated, process-wide configuration.
#[derive(Clone)]
pub struct Config {
    /// Address the HTTP server binds to.
    pub listen: SocketAddr,
    /// Shared secret expected in the `x-api-secret` header.
    pub api_secret: String,
    /// Object store settings.
    pub storage: StorageConfig,
    /// Output settings.
    pub publish: PublishOptions,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Enable debug logging.
    pub verbose: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("listen", &self.listen)
            .field("api_secret", &"[REDACTED]")
            .field("storage", &self.storage)
            .field("publish", &self.publish)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl Config {
    /// Configuration for local runs and tests: in-memory storage on an
    /// ephemeral loopback port.
    pub fn for_memory(api_secret: impl Into<String>) -> Self {
        Self {
            listen: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0),
            api_secret: api_secret.into(),
            storage: StorageConfig::Memory,
            publish: PublishOptions::default(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            verbose: false,
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::InvalidConfig`] if:
    /// - The API secret is empty
    /// - Supabase is selected without a URL, key or bucket
    /// - Local storage is selected without a root directory
    /// - The output prefix is empty or escapes its namespace
    /// - The body limit is zero
    pub fn validate(&self) -> Result<()> {
        if self.api_secret.trim().is_empty() {
            return Err(MergeError::invalid_config("MERGE_API_SECRET must not be empty"));
        }

        match &self.storage {
            StorageConfig::Supabase(supabase) => {
                if supabase.url.trim().is_empty() {
                    return Err(MergeError::invalid_config("SUPABASE_URL is required"));
                }
                if !supabase.url.starts_with("http://") && !supabase.url.starts_with("https://")
                {
                    return Err(MergeError::invalid_config(format!(
                        "SUPABASE_URL must be an http(s) URL, got: {}",
                        supabase.url
                    )));
                }
                if supabase.service_key.trim().is_empty() {
                    return Err(MergeError::invalid_config(
                        "SUPABASE_SERVICE_ROLE_KEY is required",
                    ));
                }
                if supabase.bucket.trim().is_empty() {
                    return Err(MergeError::invalid_config("STORAGE_BUCKET must not be empty"));
                }
            }
            StorageConfig::Local { root } => {
                if root.as_os_str().is_empty() {
                    return Err(MergeError::invalid_config(
                        "LOCAL_STORAGE_ROOT is required for local storage",
                    ));
                }
            }
            StorageConfig::Memory => {}
        }

        let prefix = self.publish.prefix.trim_matches('/');
        if prefix.is_empty() || prefix.split('/').any(|seg| seg.is_empty() || seg == "..") {
            return Err(MergeError::invalid_config(format!(
                "Invalid output prefix: {:?}",
                self.publish.prefix
            )));
        }

        if self.max_body_bytes == 0 {
            return Err(MergeError::invalid_config("MAX_BODY_BYTES must be positive"));
        }

        Ok(())
    }
}
