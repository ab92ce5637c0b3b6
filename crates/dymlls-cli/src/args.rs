//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// DYML language server
///
/// Speaks the Language Server Protocol on stdin/stdout and provides
/// diagnostics, semantic highlighting and XML export for DYML documents.
#[derive(Debug, Parser)]
#[command(name = "dymlls")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, searches for dymlls.toml in:
    /// 1. $DYMLLS_CONFIG environment variable
    /// 2. Current directory
    /// 3. ~/.config/dymlls/dymlls.toml
    #[arg(short, long, value_name = "FILE", env = "DYMLLS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level or filter directive
    ///
    /// Valid values: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info", env = "DYMLLS_LOG")]
    pub log_level: String,

    /// Output logs as JSON (for structured logging)
    #[arg(long, default_value = "false", env = "DYMLLS_LOG_JSON")]
    pub log_json: bool,
}
