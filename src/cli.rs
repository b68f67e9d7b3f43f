//! Command-line and environment parsing for pdfmerge.
//!
//! Every setting can be given as a flag or through the environment variable
//! named next to it, which is how the service is normally deployed.
//!
//! # Examples
//!
//! ```no_run
//! use pdfmerge::cli::Cli;
//! use clap::Parser;
//!
//! let cli = Cli::parse();
//! let config = cli.to_config().expect("invalid configuration");
//! println!("Listening on {}", config.listen);
//! ```

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{
    Config, DEFAULT_BUCKET, DEFAULT_MAX_BODY_BYTES, DEFAULT_OUTPUT_PREFIX, DEFAULT_PORT,
    PublishOptions, StorageBackend, StorageConfig, SupabaseConfig,
};
use crate::error::{MergeError, Result};

/// Merge stored PDF batches into a single document over HTTP.
///
/// pdfmerge downloads the requested batches from object storage,
/// concatenates their pages in order and uploads the merged document
/// back to the store.
#[derive(Parser, Debug, Clone)]
#[command(name = "pdfmerge")]
#[command(version)]
#[command(about = "HTTP service that concatenates stored PDF batches", long_about = None)]
pub struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Shared secret callers must send in the `x-api-secret` header
    #[arg(long, env = "MERGE_API_SECRET", hide_env_values = true)]
    pub api_secret: String,

    /// Object store backend
    ///
    /// - supabase: Supabase Storage (requires URL and service role key)
    /// - local: files under --local-root
    /// - memory: in-process, contents are lost on exit
    #[arg(long, env = "STORAGE_BACKEND", value_name = "BACKEND", default_value = "supabase")]
    #[arg(value_parser = ["supabase", "local", "memory"])]
    pub storage: String,

    /// Supabase project URL
    #[arg(long, env = "SUPABASE_URL", value_name = "URL")]
    pub supabase_url: Option<String>,

    /// Supabase service role key
    #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    /// Bucket holding source batches and merged output
    #[arg(long, env = "STORAGE_BUCKET", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Root directory for the local backend
    #[arg(long, env = "LOCAL_STORAGE_ROOT", value_name = "DIR")]
    pub local_root: Option<PathBuf>,

    /// Namespace for merged output objects
    #[arg(long, env = "OUTPUT_PREFIX", default_value = DEFAULT_OUTPUT_PREFIX)]
    pub output_prefix: String,

    /// Maximum request body size in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,

    /// Do not compress content streams of the merged document
    #[arg(long)]
    pub no_compress: bool,

    /// Verbose output - log each pipeline state transition
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Convert parsed arguments into a validated [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The storage backend is unknown
    /// - Settings required by the selected backend are missing
    /// - Configuration validation fails
    pub fn to_config(&self) -> Result<Config> {
        let backend = StorageBackend::from_str(&self.storage)?;

        let storage = match backend {
            StorageBackend::Supabase => {
                let url = self
                    .supabase_url
                    .clone()
                    .ok_or_else(|| MergeError::invalid_config("SUPABASE_URL is required"))?;
                let service_key = self.supabase_key.clone().ok_or_else(|| {
                    MergeError::invalid_config("SUPABASE_SERVICE_ROLE_KEY is required")
                })?;
                StorageConfig::Supabase(SupabaseConfig {
                    url,
                    service_key,
                    bucket: self.bucket.clone(),
                })
            }
            StorageBackend::Local => {
                let root = self.local_root.clone().ok_or_else(|| {
                    MergeError::invalid_config("LOCAL_STORAGE_ROOT is required for local storage")
                })?;
                StorageConfig::Local { root }
            }
            StorageBackend::Memory => StorageConfig::Memory,
        };

        let config = Config {
            listen: SocketAddr::new(self.bind, self.port),
            api_secret: self.api_secret.clone(),
            storage,
            publish: PublishOptions {
                prefix: self.output_prefix.clone(),
                compress: !self.no_compress,
            },
            max_body_bytes: self.max_body_bytes,
            verbose: self.verbose,
        };

        config.validate()?;

        Ok(config)
    }
}
