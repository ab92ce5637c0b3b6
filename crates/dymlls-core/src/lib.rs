//! # dymlls-core
//!
//! Core library of the DYML language server.
//!
//! This crate provides the session engine that connects editors to the DYML
//! toolchain over the Language Server Protocol: diagnostics, semantic
//! highlighting, XML export and an HTML preview.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`lsp`] - Transport framing, protocol envelopes and the session dispatcher
//! - [`bridge`] - Document store and conversion of toolchain output to LSP types
//! - [`dyml`] - The DYML lexer, parser and XML encoder
//! - [`config`] - Configuration types and loading
//! - [`error`] - Error types for the library
//!
//! ## Example
//!
//! ```rust,ignore
//! use dymlls_core::{serve, ServerConfig};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), dymlls_core::Error> {
//!     let config = ServerConfig::load()?;
//!     let code = serve(config).await?;
//!     std::process::exit(code);
//! }
//! ```

pub mod bridge;
pub mod config;
pub mod dyml;
pub mod error;
pub mod lsp;

pub use config::ServerConfig;
pub use error::Error;
use lsp::{LspTransport, Session};
use tokio::io::{AsyncBufRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::dyml::Toolchain;

/// Serve one client on stdin/stdout until it exits or closes the stream.
///
/// Returns the process exit code.
///
/// # Errors
///
/// Returns an error if stdout cannot be flushed after the session ends.
pub async fn serve(config: ServerConfig) -> Result<i32, Error> {
    tracing::info!("Starting dymlls {}", env!("CARGO_PKG_VERSION"));

    let session = Session::new(&config);
    let mut transport =
        LspTransport::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .with_max_content_length(lsp::content_length_limit(&config.documents));

    tracing::info!("Listening for LSP messages on stdio...");
    let code = run(session, &mut transport).await;

    let (_, mut stdout) = transport.into_inner();
    stdout.flush().await?;
    tracing::info!("dymlls shutting down with exit code {code}");
    Ok(code)
}

/// Drive `session` with messages from `transport` until the client exits.
///
/// Messages are handled strictly one at a time. Malformed messages and
/// failed sends are logged and skipped. The loop ends on `exit`, on EOF or
/// on a read error. Returns the session's exit code, or `0` when the input
/// simply ended.
pub async fn run<T, R, W>(mut session: Session<T>, transport: &mut LspTransport<R, W>) -> i32
where
    T: Toolchain,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let message = match transport.receive().await {
            Ok(message) => message,
            Err(Error::TransportClosed) => {
                tracing::info!("Client closed the input stream");
                return 0;
            }
            Err(Error::Io(err)) => {
                tracing::error!("Failed to read from client: {err}");
                return 0;
            }
            Err(err) => {
                tracing::warn!("Dropping malformed message: {err}");
                continue;
            }
        };

        for outbound in session.handle(message) {
            if let Err(err) = transport.send(&outbound).await {
                tracing::error!("Failed to send message: {err}");
            }
        }

        if let Some(code) = session.exit_code() {
            return code;
        }
    }
}
