//! Position encoding conversion utilities.
//!
//! Handles conversion between toolchain positions (1-based, UTF-16 columns)
//! and LSP positions (0-based), splitting of multi-line tokens, and the
//! delta encoding used by `textDocument/semanticTokens`.

use std::ops::Range;

use lsp_types::{Position, SemanticToken};

use crate::dyml::{Pos, Token};

/// Convert a toolchain position (1-based) to an LSP position (0-based).
///
/// Positions below 1 are a caller bug; release builds clamp them to 0.
#[must_use]
pub fn to_zero_based(pos: Pos) -> Position {
    debug_assert!(pos.line >= 1 && pos.col >= 1, "position {pos} is not 1-based");
    Position {
        line: pos.line.saturating_sub(1),
        character: pos.col.saturating_sub(1),
    }
}

/// Length of `text` in UTF-16 code units.
#[must_use]
pub fn utf16_len(text: &str) -> u32 {
    let len = text.encode_utf16().count();
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Portion of a token that lies on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineSpan {
    /// Line (0-based).
    pub line: u32,
    /// Start column in UTF-16 code units (0-based).
    pub start: u32,
    /// Length in UTF-16 code units, line terminator excluded.
    pub length: u32,
    /// Byte range in the source, line terminator included.
    pub bytes: Range<usize>,
}

/// Split `token` into one span per physical line it covers.
///
/// A token covering lines `L..=L+k` yields exactly `k + 1` spans. Their byte
/// ranges are contiguous and concatenate to the token's byte range.
#[must_use]
pub fn split_multiline(source: &str, token: &Token) -> Vec<LineSpan> {
    let origin = to_zero_based(token.begin);
    let mut spans = Vec::new();
    let mut offset = token.byte_begin;

    let mut pieces = token.text(source).split('\n').peekable();
    let mut line = origin.line;
    while let Some(piece) = pieces.next() {
        let terminator = usize::from(pieces.peek().is_some());
        let visible = piece.strip_suffix('\r').unwrap_or(piece);
        spans.push(LineSpan {
            line,
            start: if line == origin.line { origin.character } else { 0 },
            length: utf16_len(visible),
            bytes: offset..offset + piece.len() + terminator,
        });
        offset += piece.len() + terminator;
        line += 1;
    }

    spans
}

/// A semantic token in absolute LSP coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbsoluteToken {
    /// Line (0-based).
    pub line: u32,
    /// Start column in UTF-16 code units (0-based).
    pub start: u32,
    /// Length in UTF-16 code units.
    pub length: u32,
    /// Index into the token type legend.
    pub token_type: u32,
    /// Token modifier bitset.
    pub modifiers: u32,
}

/// Delta-encode absolute tokens.
///
/// `tokens` must be sorted by `(line, start)`.
#[must_use]
pub fn to_deltas(tokens: &[AbsoluteToken]) -> Vec<SemanticToken> {
    let mut encoded = Vec::with_capacity(tokens.len());
    let mut prev_line = 0;
    let mut prev_start = 0;

    for token in tokens {
        debug_assert!(
            (token.line, token.start) >= (prev_line, prev_start),
            "semantic tokens out of order"
        );
        let delta_line = token.line.saturating_sub(prev_line);
        let delta_start = if delta_line == 0 {
            token.start.saturating_sub(prev_start)
        } else {
            token.start
        };

        encoded.push(SemanticToken {
            delta_line,
            delta_start,
            length: token.length,
            token_type: token.token_type,
            token_modifiers_bitset: token.modifiers,
        });

        prev_line = token.line;
        prev_start = token.start;
    }

    encoded
}

/// Decode a delta-encoded sequence back to absolute tokens.
#[must_use]
pub fn from_deltas(tokens: &[SemanticToken]) -> Vec<AbsoluteToken> {
    let mut line = 0;
    let mut start = 0;

    tokens
        .iter()
        .map(|token| {
            line += token.delta_line;
            start = if token.delta_line == 0 {
                start + token.delta_start
            } else {
                token.delta_start
            };
            AbsoluteToken {
                line,
                start,
                length: token.length,
                token_type: token.token_type,
                modifiers: token.token_modifiers_bitset,
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::dyml::{Lexer, TokenKind};

    fn absolute(line: u32, start: u32, length: u32) -> AbsoluteToken {
        AbsoluteToken {
            line,
            start,
            length,
            token_type: 1,
            modifiers: 0,
        }
    }

    fn token(source: &str, kind: TokenKind) -> Token {
        Lexer::new(source)
            .map(Result::unwrap)
            .find(|t| t.kind == kind)
            .unwrap()
    }

    #[rstest]
    #[case(Pos::new(1, 1), 0, 0)]
    #[case(Pos::new(2, 5), 1, 4)]
    #[case(Pos::new(10, 1), 9, 0)]
    fn test_to_zero_based(#[case] pos: Pos, #[case] line: u32, #[case] character: u32) {
        assert_eq!(to_zero_based(pos), Position { line, character });
    }

    #[rstest]
    #[case("", 0)]
    #[case("abc", 3)]
    #[case("héllo", 5)]
    #[case("a😀b", 4)]
    fn test_utf16_len(#[case] text: &str, #[case] expected: u32) {
        assert_eq!(utf16_len(text), expected);
    }

    #[test]
    fn test_split_single_line_token() {
        let source = "#item";
        let name = token(source, TokenKind::Identifier);
        let spans = split_multiline(source, &name);
        assert_eq!(
            spans,
            vec![LineSpan {
                line: 0,
                start: 1,
                length: 4,
                bytes: 1..5,
            }]
        );
    }

    #[test]
    fn test_split_multiline_covers_token_exactly() {
        let source = "#p{ab\r\ncd\n\nef}";
        let text = token(source, TokenKind::CharData);
        assert_eq!(text.begin.line, 1);
        assert_eq!(text.end.line, 4);

        let spans = split_multiline(source, &text);
        assert_eq!(spans.len(), 4);

        let lines: Vec<_> = spans.iter().map(|s| (s.line, s.start, s.length)).collect();
        assert_eq!(lines, vec![(0, 3, 2), (1, 0, 2), (2, 0, 0), (3, 0, 2)]);

        let rebuilt: String = spans.iter().map(|s| &source[s.bytes.clone()]).collect();
        assert_eq!(rebuilt, text.text(source));
        assert_eq!(spans.first().unwrap().bytes.start, text.byte_begin);
        assert_eq!(spans.last().unwrap().bytes.end, text.byte_end);
        for pair in spans.windows(2) {
            assert_eq!(pair[0].bytes.end, pair[1].bytes.start);
        }
    }

    #[test]
    fn test_split_counts_utf16_units() {
        let source = "#p{😀x\nü}";
        let text = token(source, TokenKind::CharData);
        let spans = split_multiline(source, &text);
        let lengths: Vec<_> = spans.iter().map(|s| s.length).collect();
        assert_eq!(lengths, vec![3, 1]);
    }

    #[test]
    fn test_to_deltas_empty() {
        assert!(to_deltas(&[]).is_empty());
        assert!(from_deltas(&[]).is_empty());
    }

    #[test]
    fn test_to_deltas_single_token_is_unchanged() {
        let encoded = to_deltas(&[absolute(3, 7, 2)]);
        assert_eq!(encoded.len(), 1);
        assert_eq!(encoded[0].delta_line, 3);
        assert_eq!(encoded[0].delta_start, 7);
        assert_eq!(encoded[0].length, 2);
    }

    #[test]
    fn test_to_deltas_same_line_and_new_line() {
        let encoded = to_deltas(&[absolute(0, 0, 1), absolute(0, 4, 2), absolute(2, 3, 1)]);
        let deltas: Vec<_> = encoded.iter().map(|t| (t.delta_line, t.delta_start)).collect();
        assert_eq!(deltas, vec![(0, 0), (0, 4), (2, 3)]);
    }

    #[test]
    fn test_delta_roundtrip() {
        let tokens = vec![
            absolute(0, 0, 1),
            absolute(0, 1, 3),
            absolute(0, 9, 2),
            absolute(1, 0, 5),
            absolute(4, 12, 1),
            absolute(4, 13, 1),
            absolute(9, 2, 8),
        ];
        assert_eq!(from_deltas(&to_deltas(&tokens)), tokens);
    }
}
