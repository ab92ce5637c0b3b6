//! Token types produced by the DYML lexer.

use std::fmt;
use std::ops::Range;

/// A 1-based source position.
///
/// Columns are counted in UTF-16 code units so they line up with the
/// default LSP position encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    /// Line number (1-based).
    pub line: u32,
    /// Column in UTF-16 code units (1-based).
    pub col: u32,
}

impl Pos {
    /// The first position of every document.
    pub const START: Self = Self { line: 1, col: 1 };

    /// Create a position from 1-based line and column.
    #[must_use]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Position directly after the last character of `text`.
    #[must_use]
    pub fn end_of(text: &str) -> Self {
        let mut pos = Self::START;
        for ch in text.chars() {
            pos.advance(ch);
        }
        pos
    }

    /// Move past `ch`.
    pub(crate) fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            #[allow(clippy::cast_possible_truncation)]
            let width = ch.len_utf16() as u32;
            self.col += width;
        }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Plain text in G1, or a string literal in G2.
    CharData,
    /// Element or attribute name.
    Identifier,
    /// `#?` marker; the comment text that follows is a separate `CharData`.
    G1Comment,
    /// `// ...` line comment inside a G2 block.
    G2Comment,
    /// `#` introducing an element.
    DefineElement,
    /// `@` introducing an attribute.
    DefineAttribute,
    /// `#!` introducing a G2 block.
    G2Preamble,
    /// `{`
    BlockStart,
    /// `}`
    BlockEnd,
    /// `=`
    Assign,
    /// `,`
    Comma,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CharData => "text",
            Self::Identifier => "identifier",
            Self::G1Comment => "'#?'",
            Self::G2Comment => "comment",
            Self::DefineElement => "'#'",
            Self::DefineAttribute => "'@'",
            Self::G2Preamble => "'#!'",
            Self::BlockStart => "'{'",
            Self::BlockEnd => "'}'",
            Self::Assign => "'='",
            Self::Comma => "','",
        };
        f.write_str(name)
    }
}

/// A lexed token with both line/column and byte positions.
///
/// The end position and `byte_end` are exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Token category.
    pub kind: TokenKind,
    /// Position of the first character.
    pub begin: Pos,
    /// Position directly after the last character.
    pub end: Pos,
    /// Byte offset of the first character.
    pub byte_begin: usize,
    /// Byte offset directly after the last character.
    pub byte_end: usize,
}

impl Token {
    /// Byte range of the token within its source.
    #[must_use]
    pub const fn bytes(&self) -> Range<usize> {
        self.byte_begin..self.byte_end
    }

    /// Source text covered by the token, empty if the range is not valid for `source`.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.bytes()).unwrap_or_default()
    }

    /// Whether the token spans more than one line.
    #[must_use]
    pub const fn is_multiline(&self) -> bool {
        self.begin.line != self.end.line
    }
}
