use dymlls_core::config::ServerConfig;
use dymlls_core::dyml::{LexError, Pos, TokenKind};
use dymlls_core::lsp::Session;
use serde_json::json;

use crate::common::fake_toolchain::{ScriptedToolchain, token};
use crate::common::test_utils::{
    DOC_URI, decode_tokens, did_open, initialize, initialized, response, run_messages,
    semantic_tokens,
};

async fn tokens_for<T: dymlls_core::dyml::Toolchain>(
    session: Session<T>,
    text: &str,
) -> serde_json::Value {
    let (_, out) = run_messages(
        session,
        &[
            initialize(1),
            initialized(),
            did_open(DOC_URI, text),
            semantic_tokens(2, DOC_URI),
        ],
    )
    .await;
    response(&out, 2)["result"]["data"].clone()
}

#[tokio::test]
async fn test_identifier_then_definition() {
    let toolchain = ScriptedToolchain::new(vec![
        Ok(token(TokenKind::Identifier, 0, 1)),
        Ok(token(TokenKind::DefineElement, 1, 4)),
    ]);
    let session = Session::with_toolchain(&ServerConfig::default(), toolchain);

    let data = tokens_for(session, "A{B}").await;
    assert_eq!(data, json!([0, 0, 1, 1, 0, 0, 1, 3, 4, 0]));

    let positions: Vec<_> = decode_tokens(&data)
        .into_iter()
        .map(|(line, start, _, _)| (line, start))
        .collect();
    assert_eq!(positions, vec![(0, 0), (0, 1)]);
}

#[tokio::test]
async fn test_partial_tokens_before_lex_error() {
    let toolchain = ScriptedToolchain::new(vec![
        Ok(token(TokenKind::CharData, 0, 3)),
        Err(LexError {
            pos: Pos::new(1, 4),
            message: "boom".to_string(),
        }),
        Ok(token(TokenKind::Identifier, 5, 6)),
    ]);
    let session = Session::with_toolchain(&ServerConfig::default(), toolchain);

    let data = tokens_for(session, "abc #x").await;
    assert_eq!(data, json!([0, 0, 3, 2, 0]));
}

#[tokio::test]
async fn test_dyml_document_highlighting() {
    let session = Session::new(&ServerConfig::default());
    let text = "#? list\n#list @kind{todo} {\n  #item{milk\n  and honey}\n}";

    let decoded = decode_tokens(&tokens_for(session, text).await);
    assert_eq!(
        decoded,
        vec![
            (0, 0, 2, 0),  // #?
            (0, 2, 5, 0),  // comment text
            (1, 0, 1, 4),  // #
            (1, 1, 4, 1),  // list
            (1, 6, 1, 4),  // @
            (1, 7, 4, 1),  // kind
            (1, 11, 1, 3), // {
            (1, 12, 4, 2), // todo
            (1, 16, 1, 3), // }
            (1, 18, 1, 3), // {
            (2, 0, 2, 2),  // indent; the bare newline before it is empty
            (2, 2, 1, 4),  // #
            (2, 3, 4, 1),  // item
            (2, 7, 1, 3),  // {
            (2, 8, 4, 2),  // first line of the text
            (3, 0, 11, 2), // second line of the text
            (3, 11, 1, 3), // }
            (4, 0, 1, 3),  // }
        ]
    );
}

#[tokio::test]
async fn test_delta_positions_are_non_decreasing() {
    let session = Session::new(&ServerConfig::default());
    let text = "#!{\n  a @x=\"1\" {\n    // note\n    \"text\", b\n  }\n}\n";

    let decoded = decode_tokens(&tokens_for(session, text).await);
    assert!(!decoded.is_empty());
    for pair in decoded.windows(2) {
        assert!((pair[0].0, pair[0].1) < (pair[1].0, pair[1].1));
    }
    assert!(decoded.iter().any(|t| t.3 == 0), "comment highlighted");
}

#[tokio::test]
async fn test_unknown_document_yields_empty_data() {
    let (_, out) = run_messages(
        Session::new(&ServerConfig::default()),
        &[initialize(1), initialized(), semantic_tokens(2, DOC_URI)],
    )
    .await;
    assert_eq!(response(&out, 2)["result"]["data"], json!([]));
}
