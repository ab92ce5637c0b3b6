//! dymlls - DYML language server
//!
//! This binary serves one editor session over stdin/stdout, providing
//! diagnostics, semantic highlighting and XML export for DYML documents.

use anyhow::{Context, Result};
use clap::Parser;

mod args;
mod logging;

use args::Args;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    logging::init(&args.log_level, args.log_json)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting dymlls");

    // Load configuration
    let config = if let Some(config_path) = &args.config {
        dymlls_core::ServerConfig::load_from(config_path)
            .with_context(|| format!("failed to load config from {}", config_path.display()))?
    } else {
        dymlls_core::ServerConfig::load().context("failed to load configuration")?
    };

    tracing::debug!(
        max_documents = config.documents.max_documents,
        preview = config.features.preview,
        semantic_tokens = config.features.semantic_tokens,
        max_depth = config.toolchain.max_depth,
        "configuration loaded"
    );

    // Start the server
    let code = dymlls_core::serve(config).await.context("server error")?;

    tracing::info!("dymlls shutdown complete");
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
