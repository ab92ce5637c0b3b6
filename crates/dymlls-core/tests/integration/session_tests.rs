use dymlls_core::config::ServerConfig;
use dymlls_core::lsp::Session;
use serde_json::json;

use crate::common::test_utils::{
    DOC_URI, did_change, did_close, did_open, encode_xml, exit, frame, initialize, initialized,
    notifications, response, run_bytes, run_messages, run_raw, shutdown,
};

fn session() -> Session {
    Session::new(&ServerConfig::default())
}

#[tokio::test]
async fn test_full_lifecycle() {
    let (code, out) = run_messages(
        session(),
        &[initialize(1), initialized(), shutdown(2), exit()],
    )
    .await;

    assert_eq!(code, 0);
    let init = response(&out, 1);
    assert_eq!(init["result"]["serverInfo"]["name"], json!("dymlls"));
    assert_eq!(
        init["result"]["capabilities"]["semanticTokensProvider"]["legend"]["tokenTypes"],
        json!(["comment", "keyword", "string", "operator", "type"])
    );
    assert_eq!(response(&out, 2)["result"], json!(null));
    assert_eq!(notifications(&out, "custom/preview").len(), 1);
}

#[tokio::test]
async fn test_exit_without_shutdown_is_code_one() {
    let (code, _) = run_messages(session(), &[initialize(1), initialized(), exit()]).await;
    assert_eq!(code, 1);
}

#[tokio::test]
async fn test_eof_ends_loop_with_code_zero() {
    let (code, out) = run_messages(session(), &[initialize(1)]).await;
    assert_eq!(code, 0);
    assert_eq!(out.len(), 1);
}

#[tokio::test]
async fn test_messages_after_exit_are_not_read() {
    let (code, out) = run_messages(
        session(),
        &[initialize(1), shutdown(2), exit(), initialize(3)],
    )
    .await;
    assert_eq!(code, 0);
    assert_eq!(out.len(), 2);
}

#[tokio::test]
async fn test_malformed_message_does_not_stop_loop() {
    let input = format!(
        "{}Content-Length: 9\r\n\r\n{{garbage}}Content-Type: text/plain\r\n\r\n{}{}",
        frame(&initialize(1)),
        frame(&json!({"jsonrpc": "2.0", "id": 9, "result": null})),
        frame(&shutdown(2)),
    );
    let (_, out) = run_raw(session(), &input).await;

    assert_eq!(out.len(), 2);
    assert!(response(&out, 1)["result"].is_object());
    assert_eq!(response(&out, 2)["result"], json!(null));
}

#[tokio::test]
async fn test_non_utf8_header_does_not_stop_loop() {
    let mut input = b"X-Junk: \xff\xfe\r\nContent-Length: 2\r\n\r\n{}".to_vec();
    input.extend_from_slice(frame(&initialize(1)).as_bytes());
    input.extend_from_slice(frame(&shutdown(2)).as_bytes());

    let (code, out) = run_bytes(session(), &input).await;

    assert_eq!(code, 0);
    assert_eq!(out.len(), 2);
    assert!(response(&out, 1)["result"].is_object());
    assert_eq!(response(&out, 2)["result"], json!(null));
}

#[tokio::test]
async fn test_huge_content_length_is_dropped() {
    let input = format!(
        "Content-Length: 18446744073709551615\r\n\r\n{}",
        frame(&initialize(1))
    );
    let (code, out) = run_raw(session(), &input).await;

    assert_eq!(code, 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_document_lifecycle_publishes_and_clears() {
    let (_, out) = run_messages(
        session(),
        &[
            initialize(1),
            initialized(),
            did_open(DOC_URI, "#a{ok}\n#1"),
            did_change(DOC_URI, 2, "#a{ok}"),
            did_close(DOC_URI),
        ],
    )
    .await;

    let published = notifications(&out, "textDocument/publishDiagnostics");
    assert_eq!(published.len(), 3);

    let on_open = &published[0]["params"];
    assert_eq!(on_open["uri"], json!(DOC_URI));
    assert_eq!(on_open["diagnostics"][0]["range"]["start"]["line"], json!(1));
    assert_eq!(on_open["diagnostics"][0]["source"], json!("dyml"));

    assert_eq!(published[1]["params"]["diagnostics"], json!([]));
    assert_eq!(published[1]["params"]["version"], json!(2));
    assert_eq!(published[2]["params"]["diagnostics"], json!([]));

    // initialized, didOpen and didClose each push a preview.
    let previews = notifications(&out, "custom/preview");
    assert_eq!(previews.len(), 3);
    assert!(previews[1]["params"].as_str().unwrap().contains(DOC_URI));
    assert!(previews[2]["params"]
        .as_str()
        .unwrap()
        .contains("0 open document(s)"));
}

#[tokio::test]
async fn test_change_without_open_is_ignored() {
    let (_, out) = run_messages(
        session(),
        &[
            initialize(1),
            initialized(),
            did_change(DOC_URI, 2, "B"),
            encode_xml(2, DOC_URI),
        ],
    )
    .await;

    assert!(notifications(&out, "textDocument/publishDiagnostics").is_empty());
    assert_eq!(response(&out, 2)["result"], json!(""));
}

#[tokio::test]
async fn test_encode_xml_valid_and_invalid() {
    let (_, out) = run_messages(
        session(),
        &[
            initialize(1),
            initialized(),
            did_open(DOC_URI, "#list @kind{todo} {\n  #item{milk}\n  #item{eggs & ham}\n}"),
            encode_xml(2, DOC_URI),
            did_change(DOC_URI, 2, "#list {\n  #item{milk}\n"),
            encode_xml(3, DOC_URI),
        ],
    )
    .await;

    assert_eq!(
        response(&out, 2)["result"],
        json!("<root><list kind=\"todo\"><item>milk</item><item>eggs &amp; ham</item></list></root>")
    );
    assert_eq!(response(&out, 3)["result"], json!(""));
}

#[tokio::test]
async fn test_request_ids_are_echoed() {
    let (_, out) = run_messages(
        session(),
        &[
            json!({"jsonrpc": "2.0", "id": "init-1", "method": "initialize", "params": {}}),
            json!({"jsonrpc": "2.0", "id": 77, "method": "textDocument/references", "params": {}}),
        ],
    )
    .await;

    assert_eq!(out[0]["id"], json!("init-1"));
    assert_eq!(out[1]["id"], json!(77));
    assert_eq!(out[1]["error"]["code"], json!(-32601));
}

#[tokio::test]
async fn test_document_limit_is_enforced() {
    let mut config = ServerConfig::default();
    config.documents.max_documents = 1;

    let (_, out) = run_messages(
        Session::new(&config),
        &[
            initialize(1),
            initialized(),
            did_open("file:///workspace/one.dyml", "#a{x}"),
            did_open("file:///workspace/two.dyml", "#b{y}"),
            encode_xml(2, "file:///workspace/two.dyml"),
        ],
    )
    .await;

    assert_eq!(notifications(&out, "textDocument/publishDiagnostics").len(), 1);
    assert_eq!(response(&out, 2)["result"], json!(""));
}
