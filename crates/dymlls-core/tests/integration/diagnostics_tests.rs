use dymlls_core::config::ServerConfig;
use dymlls_core::lsp::Session;
use rstest::rstest;
use serde_json::{Value, json};

use crate::common::test_utils::{
    DOC_URI, did_change, did_open, initialize, initialized, notifications, run_messages,
};

async fn published(config: &ServerConfig, text: &str) -> Vec<Value> {
    let (_, out) = run_messages(
        Session::new(config),
        &[initialize(1), initialized(), did_open(DOC_URI, text)],
    )
    .await;
    let published = notifications(&out, "textDocument/publishDiagnostics");
    assert_eq!(published.len(), 1);
    published[0]["params"]["diagnostics"]
        .as_array()
        .unwrap()
        .clone()
}

fn start(diagnostic: &Value) -> (u64, u64) {
    let pos = &diagnostic["range"]["start"];
    (pos["line"].as_u64().unwrap(), pos["character"].as_u64().unwrap())
}

#[rstest]
#[case::plain_text("hello world")]
#[case::nested("#a{#b @k{v} {text}}")]
#[case::g2_block("#!{ a @x=\"1\" { \"t\", b } }")]
#[case::escaped_hash("price \\#1")]
#[tokio::test]
async fn test_valid_documents_have_no_diagnostics(#[case] text: &str) {
    assert!(published(&ServerConfig::default(), text).await.is_empty());
}

#[tokio::test]
async fn test_error_on_second_line() {
    let diagnostics = published(&ServerConfig::default(), "#a{ok}\n#1").await;
    assert!(!diagnostics.is_empty());
    assert_eq!(start(&diagnostics[0]), (1, 0));
    assert_eq!(diagnostics[0]["severity"], json!(1));
}

#[tokio::test]
async fn test_unclosed_block_reports_two_locations() {
    let diagnostics = published(&ServerConfig::default(), "#a {\n  text\n").await;
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(start(&diagnostics[0]), (0, 3));
    assert_eq!(start(&diagnostics[1]).0, 2);
}

#[tokio::test]
async fn test_duplicate_attribute_reports_both_definitions() {
    let diagnostics = published(&ServerConfig::default(), "#a @k{1} @k{2}").await;
    assert_eq!(diagnostics.len(), 2);
    assert!(start(&diagnostics[0]).1 < start(&diagnostics[1]).1);
}

#[tokio::test]
async fn test_depth_limit_from_config() {
    let mut config = ServerConfig::default();
    config.toolchain.max_depth = 2;

    let diagnostics = published(&config, "#a{#b{#c{deep}}}").await;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0]["range"],
        json!({"start": {"line": 0, "character": 0}, "end": {"line": 0, "character": 0}})
    );

    assert!(published(&config, "#a{#b{shallow}}").await.is_empty());
}

#[tokio::test]
async fn test_each_pass_replaces_previous_diagnostics() {
    let (_, out) = run_messages(
        Session::new(&ServerConfig::default()),
        &[
            initialize(1),
            initialized(),
            did_open(DOC_URI, "#a{"),
            did_change(DOC_URI, 2, "#a{"),
            did_change(DOC_URI, 3, "#a{}"),
        ],
    )
    .await;

    let published = notifications(&out, "textDocument/publishDiagnostics");
    assert_eq!(published.len(), 3);
    assert_eq!(
        published[0]["params"]["diagnostics"],
        published[1]["params"]["diagnostics"]
    );
    assert_eq!(published[2]["params"]["diagnostics"], json!([]));
}
