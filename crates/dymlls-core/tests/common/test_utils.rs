use dymlls_core::dyml::Toolchain;
use dymlls_core::lsp::{LspTransport, Session};
use serde_json::{Value, json};

/// Document uri used by most tests.
pub const DOC_URI: &str = "file:///workspace/doc.dyml";

/// Frame a JSON value with a `Content-Length` header.
pub fn frame(message: &Value) -> String {
    let body = message.to_string();
    format!("Content-Length: {}\r\n\r\n{body}", body.len())
}

/// Split a byte stream written by the server back into JSON messages.
#[allow(clippy::unwrap_used)]
pub fn unframe(output: &[u8]) -> Vec<Value> {
    let text = std::str::from_utf8(output).unwrap();
    let mut messages = Vec::new();
    let mut rest = text;

    while let Some((header, tail)) = rest.split_once("\r\n\r\n") {
        let length: usize = header
            .strip_prefix("Content-Length: ")
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        messages.push(serde_json::from_str(&tail[..length]).unwrap());
        rest = &tail[length..];
    }

    messages
}

/// Run a session over in-memory streams fed with raw `input` bytes.
///
/// Returns the exit code and every message the server wrote.
pub async fn run_bytes<T: Toolchain>(session: Session<T>, input: &[u8]) -> (i32, Vec<Value>) {
    let mut transport = LspTransport::new(input, Vec::new());
    let code = dymlls_core::run(session, &mut transport).await;
    let (_, output) = transport.into_inner();
    (code, unframe(&output))
}

/// Run a session over in-memory streams fed with `input`.
pub async fn run_raw<T: Toolchain>(session: Session<T>, input: &str) -> (i32, Vec<Value>) {
    run_bytes(session, input.as_bytes()).await
}

/// Run a session over in-memory streams fed with `messages`.
pub async fn run_messages<T: Toolchain>(
    session: Session<T>,
    messages: &[Value],
) -> (i32, Vec<Value>) {
    let input: String = messages.iter().map(frame).collect();
    run_raw(session, &input).await
}

pub fn initialize(id: i64) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": "initialize", "params": {"capabilities": {}}})
}

pub fn initialized() -> Value {
    json!({"jsonrpc": "2.0", "method": "initialized", "params": {}})
}

pub fn shutdown(id: i64) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": "shutdown"})
}

pub fn exit() -> Value {
    json!({"jsonrpc": "2.0", "method": "exit"})
}

pub fn did_open(uri: &str, text: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "textDocument/didOpen",
        "params": {"textDocument": {"uri": uri, "languageId": "dyml", "version": 1, "text": text}}
    })
}

pub fn did_change(uri: &str, version: i32, text: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "textDocument/didChange",
        "params": {
            "textDocument": {"uri": uri, "version": version},
            "contentChanges": [{"text": text}]
        }
    })
}

pub fn did_close(uri: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "method": "textDocument/didClose",
        "params": {"textDocument": {"uri": uri}}
    })
}

pub fn semantic_tokens(id: i64, uri: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "textDocument/semanticTokens/full",
        "params": {"textDocument": {"uri": uri}}
    })
}

pub fn encode_xml(id: i64, uri: &str) -> Value {
    json!({"jsonrpc": "2.0", "id": id, "method": "custom/encodeXML", "params": [uri]})
}

/// Response with the given id.
#[allow(clippy::expect_used)]
pub fn response(messages: &[Value], id: i64) -> &Value {
    messages
        .iter()
        .find(|m| m.get("id") == Some(&json!(id)) && m.get("method").is_none())
        .expect("response not found")
}

/// Notifications with the given method, in order.
pub fn notifications<'a>(messages: &'a [Value], method: &str) -> Vec<&'a Value> {
    messages
        .iter()
        .filter(|m| m.get("id").is_none() && m["method"] == json!(method))
        .collect()
}

/// Decode a semantic token `data` array into `(line, start, length, type)` tuples.
#[allow(clippy::unwrap_used)]
pub fn decode_tokens(data: &Value) -> Vec<(u64, u64, u64, u64)> {
    let data: Vec<u64> = data
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect();
    assert_eq!(data.len() % 5, 0, "semantic token data must be quintuples");

    let mut line = 0;
    let mut start = 0;
    data.chunks(5)
        .map(|q| {
            line += q[0];
            start = if q[0] == 0 { start + q[1] } else { q[1] };
            (line, start, q[2], q[3])
        })
        .collect()
}
