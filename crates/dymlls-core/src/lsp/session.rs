//! Session dispatcher.
//!
//! [`Session`] owns all per-client state and turns one inbound message into
//! the outbound messages it causes. It performs no I/O; the serve loop in
//! the crate root moves messages between the session and the transport.

use lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, HoverParams, SemanticTokens, SemanticTokensParams,
    SemanticTokensResult, Uri,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::bridge::{self, DocumentStore, TokenLegend};
use crate::config::{FeatureConfig, ServerConfig};
use crate::dyml::{Dyml, Toolchain};
use crate::error::{Error, Result};
use crate::lsp::lifecycle::{SessionState, initialize_result};
use crate::lsp::types::{
    InboundMessage, JsonRpcError, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    OutboundMessage,
};

/// Method of the XML export request.
pub const ENCODE_XML_METHOD: &str = "custom/encodeXML";

/// Params of `custom/encodeXML`; clients send the uri bare, in an array or
/// in an object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EncodeXmlParams {
    List(Vec<Uri>),
    Object { uri: Uri },
    Bare(Uri),
}

impl EncodeXmlParams {
    fn into_uri(self) -> Option<Uri> {
        match self {
            Self::List(uris) => uris.into_iter().next(),
            Self::Object { uri } | Self::Bare(uri) => Some(uri),
        }
    }
}

/// Per-client session state.
#[derive(Debug)]
pub struct Session<T = Dyml> {
    state: SessionState,
    documents: DocumentStore,
    toolchain: T,
    legend: TokenLegend,
    features: FeatureConfig,
    shutdown_requested: bool,
    exit_code: Option<i32>,
}

impl Session<Dyml> {
    /// Create a session using the built-in DYML toolchain.
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_toolchain(config, Dyml::from_config(&config.toolchain))
    }
}

impl<T: Toolchain> Session<T> {
    /// Create a session using a custom toolchain.
    #[must_use]
    pub fn with_toolchain(config: &ServerConfig, toolchain: T) -> Self {
        Self {
            state: SessionState::Uninitialized,
            documents: DocumentStore::with_limits(config.documents),
            toolchain,
            legend: TokenLegend::new(),
            features: config.features,
            shutdown_requested: false,
            exit_code: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Open documents.
    #[must_use]
    pub const fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Process exit code, set once `exit` has been received.
    ///
    /// `0` if `shutdown` came first, `1` otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Handle one inbound message.
    ///
    /// Requests always yield exactly one response, placed first. Any
    /// notifications for the client follow in the order they were produced.
    pub fn handle(&mut self, message: InboundMessage) -> Vec<OutboundMessage> {
        match message {
            InboundMessage::Request(request) => {
                vec![OutboundMessage::Response(self.handle_request(request))]
            }
            InboundMessage::Notification(notification) => {
                let mut outbound = Vec::new();
                self.handle_notification(notification, &mut outbound);
                outbound
            }
        }
    }

    fn handle_request(&mut self, request: JsonRpcRequest) -> JsonRpcResponse {
        let JsonRpcRequest {
            id, method, params, ..
        } = request;
        debug!("Dispatching request {id}: {method}");

        match self.state {
            SessionState::Uninitialized if method != "initialize" => {
                warn!("Request '{method}' received before initialize");
                return JsonRpcResponse::failure(id, JsonRpcError::server_not_initialized());
            }
            SessionState::ShuttingDown => {
                warn!("Request '{method}' received after shutdown");
                return JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request("server is shutting down"),
                );
            }
            SessionState::Initialized | SessionState::Running if method == "initialize" => {
                warn!("Duplicate initialize request");
                return JsonRpcResponse::failure(
                    id,
                    JsonRpcError::invalid_request("server already initialized"),
                );
            }
            _ => {}
        }

        let outcome = match method.as_str() {
            "initialize" => self.initialize(params).map(Some),
            "shutdown" => Ok(Some(self.shutdown())),
            "textDocument/hover" => {
                decode::<HoverParams>(&method, params).map(|_| Some(Value::Null))
            }
            "textDocument/semanticTokens/full" if self.features.semantic_tokens => {
                decode::<SemanticTokensParams>(&method, params)
                    .and_then(|params| self.semantic_tokens(&params.text_document.uri))
                    .map(Some)
            }
            ENCODE_XML_METHOD => decode::<EncodeXmlParams>(&method, params)
                .map(|params| Some(self.encode_xml(params.into_uri()))),
            _ => Ok(None),
        };

        match outcome {
            Ok(Some(result)) => JsonRpcResponse::success(id, result),
            Ok(None) => {
                debug!("Unknown request method: {method}");
                JsonRpcResponse::failure(id, JsonRpcError::method_not_found(&method))
            }
            Err(err) => {
                warn!("Dropping request {id}: {err}");
                JsonRpcResponse::failure(id, JsonRpcError::invalid_params(&err))
            }
        }
    }

    fn initialize(&mut self, params: Option<Value>) -> Result<Value> {
        if let Some(name) = params
            .as_ref()
            .and_then(|p| p.pointer("/clientInfo/name"))
            .and_then(Value::as_str)
        {
            info!("Initializing session for client '{name}'");
        }

        self.state = SessionState::Initialized;
        Ok(serde_json::to_value(initialize_result(&self.features))?)
    }

    fn shutdown(&mut self) -> Value {
        info!("Shutdown requested");
        self.shutdown_requested = true;
        self.state = SessionState::ShuttingDown;
        Value::Null
    }

    fn semantic_tokens(&self, uri: &Uri) -> Result<Value> {
        let data = match self.documents.content(uri) {
            Ok(content) => self.legend.encode(&self.toolchain, content),
            Err(err) => {
                debug!("Semantic tokens for closed document: {err}");
                Vec::new()
            }
        };
        trace!("Encoded {} semantic tokens for {}", data.len(), uri.as_str());

        let result = SemanticTokensResult::Tokens(SemanticTokens {
            result_id: None,
            data,
        });
        Ok(serde_json::to_value(result)?)
    }

    fn encode_xml(&self, uri: Option<Uri>) -> Value {
        let Some(uri) = uri else {
            warn!("{ENCODE_XML_METHOD} without a document uri");
            return Value::String(String::new());
        };

        let xml = match self.documents.content(&uri) {
            Ok(content) => self.toolchain.encode_xml(content).unwrap_or_else(|err| {
                debug!("XML encoding of {} failed: {err}", uri.as_str());
                String::new()
            }),
            Err(err) => {
                debug!("{ENCODE_XML_METHOD}: {err}");
                String::new()
            }
        };
        Value::String(xml)
    }

    fn handle_notification(
        &mut self,
        notification: JsonRpcNotification,
        outbound: &mut Vec<OutboundMessage>,
    ) {
        let JsonRpcNotification { method, params, .. } = notification;
        debug!("Dispatching notification: {method}");

        if method == "exit" {
            self.exit();
            return;
        }

        match (self.state, method.as_str()) {
            (SessionState::Initialized, "initialized") => {
                self.state = SessionState::Running;
                info!("Session running");
                self.push_preview(outbound);
            }
            (_, "$/cancelRequest") => {
                trace!("Ignoring cancellation; requests complete before the next is read");
            }
            (state, _) if !state.accepts_documents() => {
                debug!("Dropping '{method}' in state {state:?}");
            }
            (_, "textDocument/didOpen") => {
                if let Some(params) = decode_logged::<DidOpenTextDocumentParams>(&method, params) {
                    self.did_open(params, outbound);
                }
            }
            (_, "textDocument/didChange") => {
                if let Some(params) = decode_logged::<DidChangeTextDocumentParams>(&method, params)
                {
                    self.did_change(params, outbound);
                }
            }
            (_, "textDocument/didSave") => {
                if let Some(params) = decode_logged::<DidSaveTextDocumentParams>(&method, params) {
                    self.did_save(params, outbound);
                }
            }
            (_, "textDocument/didClose") => {
                if let Some(params) = decode_logged::<DidCloseTextDocumentParams>(&method, params)
                {
                    self.did_close(&params.text_document.uri, outbound);
                }
            }
            _ => debug!("Ignoring notification: {method}"),
        }
    }

    fn exit(&mut self) {
        let code = i32::from(!self.shutdown_requested);
        if code != 0 {
            warn!("Exit received without prior shutdown");
        }
        info!("Exit received, code {code}");
        self.exit_code = Some(code);
    }

    fn did_open(&mut self, params: DidOpenTextDocumentParams, outbound: &mut Vec<OutboundMessage>) {
        let uri = params.text_document.uri;
        if let Err(err) = self.documents.open(uri.clone(), params.text_document.text) {
            warn!("Cannot open {}: {err}", uri.as_str());
            return;
        }
        info!("Opened {}", uri.as_str());

        self.push_diagnostics(&uri, outbound);
        self.push_preview(outbound);
    }

    fn did_change(
        &mut self,
        params: DidChangeTextDocumentParams,
        outbound: &mut Vec<OutboundMessage>,
    ) {
        let uri = params.text_document.uri;
        let mut text = None;
        for change in params.content_changes {
            if change.range.is_some() {
                warn!("Ignoring ranged change for {}; only full sync is supported", uri.as_str());
            } else {
                text = Some(change.text);
            }
        }
        let Some(text) = text else {
            return;
        };

        if self.replace(&uri, text) {
            self.push_diagnostics(&uri, outbound);
        }
    }

    fn did_save(&mut self, params: DidSaveTextDocumentParams, outbound: &mut Vec<OutboundMessage>) {
        let uri = params.text_document.uri;
        if let Some(text) = params.text {
            self.replace(&uri, text);
        }

        if self.documents.is_open(&uri) {
            self.push_diagnostics(&uri, outbound);
        } else {
            debug!("Save for unknown document {}", uri.as_str());
        }
        self.push_preview(outbound);
    }

    fn did_close(&mut self, uri: &Uri, outbound: &mut Vec<OutboundMessage>) {
        if self.documents.close(uri).is_some() {
            info!("Closed {}", uri.as_str());
        } else {
            debug!("Close for unknown document {}", uri.as_str());
        }

        push(outbound, bridge::publish_diagnostics(uri, None, Vec::new()));
        self.push_preview(outbound);
    }

    /// Replace a document's content, returning whether the store changed.
    fn replace(&mut self, uri: &Uri, text: String) -> bool {
        match self.documents.replace(uri, text) {
            Ok(Some(version)) => {
                debug!("Updated {} to local version {version}", uri.as_str());
                true
            }
            Ok(None) => {
                debug!("Ignoring update for unknown document {}", uri.as_str());
                false
            }
            Err(err) => {
                warn!("Cannot update {}: {err}", uri.as_str());
                false
            }
        }
    }

    fn push_diagnostics(&self, uri: &Uri, outbound: &mut Vec<OutboundMessage>) {
        let Ok(state) = self.documents.get(uri) else {
            return;
        };
        let diagnostics = bridge::diagnose(&self.toolchain, &state.content);
        debug!("{} diagnostic(s) for {}", diagnostics.len(), uri.as_str());
        push(
            outbound,
            bridge::publish_diagnostics(uri, Some(state.version), diagnostics),
        );
    }

    fn push_preview(&self, outbound: &mut Vec<OutboundMessage>) {
        if self.features.preview {
            push(outbound, bridge::preview(&self.documents));
        }
    }
}

fn push(outbound: &mut Vec<OutboundMessage>, notification: Result<JsonRpcNotification>) {
    match notification {
        Ok(notification) => outbound.push(OutboundMessage::Notification(notification)),
        Err(err) => warn!("Failed to build notification: {err}"),
    }
}

/// Decode method params into their typed shape.
fn decode<P: DeserializeOwned>(method: &str, params: Option<Value>) -> Result<P> {
    serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|source| Error::InvalidParams {
        method: method.to_string(),
        source,
    })
}

fn decode_logged<P: DeserializeOwned>(method: &str, params: Option<Value>) -> Option<P> {
    decode(method, params)
        .map_err(|err| warn!("Dropping notification: {err}"))
        .ok()
}
