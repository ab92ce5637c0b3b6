//! Semantic token encoding for `textDocument/semanticTokens/full`.

use std::collections::HashMap;

use lsp_types::{SemanticToken, SemanticTokenType, SemanticTokensLegend};

use super::encoding::{AbsoluteToken, split_multiline, to_deltas};
use crate::dyml::{Token, TokenKind, Toolchain};

/// Token types advertised to the client, in legend order.
pub const LEGEND: [SemanticTokenType; 5] = [
    SemanticTokenType::COMMENT,
    SemanticTokenType::KEYWORD,
    SemanticTokenType::STRING,
    SemanticTokenType::OPERATOR,
    SemanticTokenType::TYPE,
];

/// Type used for token kinds missing from [`CLASSIFICATION`].
const FALLBACK: SemanticTokenType = SemanticTokenType::KEYWORD;

const CLASSIFICATION: &[(TokenKind, SemanticTokenType)] = &[
    (TokenKind::Identifier, SemanticTokenType::KEYWORD),
    (TokenKind::CharData, SemanticTokenType::STRING),
    (TokenKind::G1Comment, SemanticTokenType::COMMENT),
    (TokenKind::G2Comment, SemanticTokenType::COMMENT),
    (TokenKind::DefineElement, SemanticTokenType::TYPE),
    (TokenKind::DefineAttribute, SemanticTokenType::TYPE),
    (TokenKind::G2Preamble, SemanticTokenType::TYPE),
    (TokenKind::BlockStart, SemanticTokenType::OPERATOR),
    (TokenKind::BlockEnd, SemanticTokenType::OPERATOR),
    (TokenKind::Assign, SemanticTokenType::OPERATOR),
    (TokenKind::Comma, SemanticTokenType::OPERATOR),
];

/// Maps token kinds to legend indices. Built once per session.
#[derive(Debug, Clone)]
pub struct TokenLegend {
    indices: HashMap<TokenKind, u32>,
    comment: u32,
    fallback: u32,
}

impl Default for TokenLegend {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenLegend {
    /// Build the lookup table from [`LEGEND`] and the kind classification.
    #[must_use]
    pub fn new() -> Self {
        let indices = CLASSIFICATION
            .iter()
            .filter_map(|(kind, ty)| index_of(ty).map(|index| (*kind, index)))
            .collect();

        Self {
            indices,
            comment: index_of(&SemanticTokenType::COMMENT).unwrap_or_default(),
            fallback: index_of(&FALLBACK).unwrap_or_default(),
        }
    }

    /// Legend sent to the client during initialization.
    #[must_use]
    pub fn legend() -> SemanticTokensLegend {
        SemanticTokensLegend {
            token_types: LEGEND.to_vec(),
            token_modifiers: Vec::new(),
        }
    }

    /// Legend index for a token of `kind`.
    #[must_use]
    pub fn classify(&self, kind: TokenKind) -> u32 {
        self.indices.get(&kind).copied().unwrap_or(self.fallback)
    }

    /// Legend index for `token`, given the token before it.
    ///
    /// Character data that stays on the line of a `#?` marker is the
    /// comment's text.
    #[must_use]
    pub fn classify_after(&self, token: &Token, previous: Option<&Token>) -> u32 {
        if continues_comment(token, previous) {
            return self.comment;
        }
        self.classify(token.kind)
    }

    /// Tokenize `source` and encode the result as delta semantic tokens.
    ///
    /// If tokenization fails partway, the tokens produced before the failure
    /// are still returned.
    #[must_use]
    pub fn encode<T: Toolchain + ?Sized>(&self, toolchain: &T, source: &str) -> Vec<SemanticToken> {
        let mut absolute = Vec::new();
        let mut previous = None;

        for item in toolchain.tokenize(source) {
            let token = match item {
                Ok(token) => token,
                Err(err) => {
                    tracing::debug!("tokenization stopped early: {err}");
                    break;
                }
            };

            let token_type = self.classify_after(&token, previous.as_ref());

            absolute.extend(
                split_multiline(source, &token)
                    .into_iter()
                    .filter(|span| span.length > 0)
                    .map(|span| AbsoluteToken {
                        line: span.line,
                        start: span.start,
                        length: span.length,
                        token_type,
                        modifiers: 0,
                    }),
            );
            previous = Some(token);
        }

        to_deltas(&absolute)
    }
}

fn continues_comment(token: &Token, previous: Option<&Token>) -> bool {
    token.kind == TokenKind::CharData
        && previous.is_some_and(|prev| {
            prev.kind == TokenKind::G1Comment && token.end.line == prev.end.line
        })
}

fn index_of(ty: &SemanticTokenType) -> Option<u32> {
    LEGEND
        .iter()
        .position(|candidate| candidate == ty)
        .and_then(|index| u32::try_from(index).ok())
}
