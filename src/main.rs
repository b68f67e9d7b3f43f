//! pdfmerge - HTTP service that concatenates stored PDF batches.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};

use pdfmerge::cli::Cli;
use pdfmerge::{logging, server, storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse()
        .to_config()
        .context("Invalid configuration")?;

    logging::init(config.verbose)?;
    debug!("{:?}", config);

    info!("{} v{}", pdfmerge::NAME, pdfmerge::VERSION);
    info!("Storage backend: {:?}", config.storage.backend());

    let store = storage::connect(&config.storage).context("Failed to initialise storage")?;

    server::serve(Arc::new(config), store)
        .await
        .context("HTTP server failed")?;

    Ok(())
}
