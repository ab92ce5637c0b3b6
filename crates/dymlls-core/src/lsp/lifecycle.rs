//! Session lifecycle and capability negotiation.
//!
//! A session moves through these states:
//! 1. `Uninitialized` until the `initialize` request
//! 2. `Initialized` until the client's `initialized` notification
//! 3. `Running` while documents are edited
//! 4. `ShuttingDown` after `shutdown`, waiting for `exit`

use lsp_types::{
    InitializeResult, PositionEncodingKind, SaveOptions,
    SemanticTokensFullOptions, SemanticTokensOptions, SemanticTokensServerCapabilities,
    ServerCapabilities, ServerInfo, TextDocumentSyncCapability, TextDocumentSyncKind,
    TextDocumentSyncOptions, TextDocumentSyncSaveOptions, WorkDoneProgressOptions,
};

use crate::bridge::TokenLegend;
use crate::config::FeatureConfig;

/// Name reported in `serverInfo`.
pub const SERVER_NAME: &str = "dymlls";

/// State of the client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// `initialize` has not been received.
    Uninitialized,
    /// Capabilities were sent; waiting for `initialized`.
    Initialized,
    /// Handshake complete.
    Running,
    /// `shutdown` was received; only `exit` is expected.
    ShuttingDown,
}

impl SessionState {
    /// Check if document notifications are processed in this state.
    #[must_use]
    pub const fn accepts_documents(&self) -> bool {
        matches!(self, Self::Initialized | Self::Running)
    }
}

/// Capabilities advertised in the `initialize` response.
///
/// Documents are synced in full with save notifications. Semantic tokens are
/// offered for whole documents only, and only when enabled.
#[must_use]
pub fn server_capabilities(features: &FeatureConfig) -> ServerCapabilities {
    let semantic_tokens_provider = features.semantic_tokens.then(|| {
        SemanticTokensServerCapabilities::SemanticTokensOptions(SemanticTokensOptions {
            legend: TokenLegend::legend(),
            range: Some(false),
            full: Some(SemanticTokensFullOptions::Bool(true)),
            work_done_progress_options: WorkDoneProgressOptions::default(),
        })
    });

    ServerCapabilities {
        position_encoding: Some(PositionEncodingKind::UTF16),
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(true),
                })),
                ..Default::default()
            },
        )),
        semantic_tokens_provider,
        ..Default::default()
    }
}

/// Full `initialize` result including server info.
#[must_use]
pub fn initialize_result(features: &FeatureConfig) -> InitializeResult {
    InitializeResult {
        capabilities: server_capabilities(features),
        server_info: Some(ServerInfo {
            name: SERVER_NAME.to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    }
}
