//! Outbound notifications pushed to the client.
//!
//! Each builder returns a `Result`; callers log failures and carry on.

use lsp_types::notification::{Notification, PublishDiagnostics};
use lsp_types::{Diagnostic, PublishDiagnosticsParams, Uri};

use super::state::DocumentStore;
use crate::error::Result;
use crate::lsp::types::JsonRpcNotification;

/// Method of the HTML preview notification.
pub const PREVIEW_METHOD: &str = "custom/preview";

/// Build a `textDocument/publishDiagnostics` notification.
///
/// The list fully replaces whatever the client shows for `uri`; an empty
/// list clears it.
///
/// # Errors
///
/// Returns an error if the params cannot be serialized.
pub fn publish_diagnostics(
    uri: &Uri,
    version: Option<i32>,
    diagnostics: Vec<Diagnostic>,
) -> Result<JsonRpcNotification> {
    let params = PublishDiagnosticsParams {
        uri: uri.clone(),
        diagnostics,
        version,
    };
    Ok(JsonRpcNotification::new(
        PublishDiagnostics::METHOD,
        serde_json::to_value(params)?,
    ))
}

/// Build a `custom/preview` notification summarizing the open documents.
///
/// # Errors
///
/// Returns an error if the params cannot be serialized.
pub fn preview(documents: &DocumentStore) -> Result<JsonRpcNotification> {
    Ok(JsonRpcNotification::new(
        PREVIEW_METHOD,
        serde_json::to_value(render_preview(documents))?,
    ))
}

/// Render the preview page.
#[must_use]
pub fn render_preview(documents: &DocumentStore) -> String {
    let mut html = String::from("<html>\n<head><meta charset=\"utf-8\"></head>\n<body>\n");
    html.push_str("<h1>DYML Preview</h1>\n<hr>\n");
    html.push_str(&format!("<p>{} open document(s)</p>\n", documents.len()));

    if !documents.is_empty() {
        html.push_str("<ul>\n");
        for uri in documents.uris() {
            html.push_str("<li>");
            html.push_str(&escape_html(uri.as_str()));
            html.push_str("</li>\n");
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
