//! Modal lexer for DYML.
//!
//! DYML switches between two grammars. G1 is text oriented: everything is
//! character data until a `#` introduces an element, comment or G2 block.
//! G2 (inside `#!{ ... }`) is structure oriented: whitespace is insignificant,
//! bare words are element names and text must be quoted.
//!
//! The lexer yields tokens lazily and stops after the first error.

use super::error::LexError;
use super::token::{Pos, Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Text,
    G2,
}

/// What the next call to the lexer has to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Content,
    ElementName,
    ElementTail,
    AttributeName,
    AttributeOpen,
    AttributeValue,
    AttributeClose,
    AttributeAssign,
    StringValue,
    CommentText,
    PreambleOpen,
}

/// Iterator over the tokens of a DYML document.
#[derive(Debug)]
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    pos: Pos,
    modes: Vec<Mode>,
    expect: Expect,
    failed: bool,
}

impl<'a> Lexer<'a> {
    /// Create a lexer positioned at the start of `source`.
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            pos: Pos::START,
            modes: vec![Mode::Text],
            expect: Expect::Content,
            failed: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        self.pos.advance(ch);
        Some(ch)
    }

    fn skip_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
    }

    /// Consume text up to one of `stops`, honouring `\` escapes.
    fn scan_text(&mut self, stops: &[char]) {
        while let Some(ch) = self.peek() {
            if stops.contains(&ch) {
                break;
            }
            self.bump();
            if ch == '\\' {
                self.bump();
            }
        }
    }

    fn mode(&self) -> Mode {
        self.modes.last().copied().unwrap_or(Mode::Text)
    }

    fn close_block(&mut self) {
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    const fn mark(&self) -> (usize, Pos) {
        (self.offset, self.pos)
    }

    const fn token(&self, kind: TokenKind, start: (usize, Pos)) -> Token {
        Token {
            kind,
            begin: start.1,
            end: self.pos,
            byte_begin: start.0,
            byte_end: self.offset,
        }
    }

    fn fail(&mut self, pos: Pos, message: impl Into<String>) -> LexError {
        self.failed = true;
        LexError {
            pos,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        match self.expect {
            Expect::Content => match self.mode() {
                Mode::Text => self.lex_text(),
                Mode::G2 => self.lex_g2(),
            },
            Expect::ElementName | Expect::AttributeName => self.lex_name(),
            Expect::ElementTail => self.lex_element_tail(),
            Expect::AttributeOpen => self.lex_attribute_open(),
            Expect::AttributeValue => self.lex_attribute_value(),
            Expect::AttributeClose => self.lex_attribute_close(),
            Expect::AttributeAssign => self.lex_attribute_assign(),
            Expect::StringValue => self.lex_string_value(),
            Expect::CommentText => self.lex_comment_text(),
            Expect::PreambleOpen => self.lex_preamble_open(),
        }
    }

    fn lex_text(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.mark();
        let kind = match self.peek() {
            None => return Ok(None),
            Some('#') => match self.peek_second() {
                Some('?') => {
                    self.bump();
                    self.bump();
                    self.expect = Expect::CommentText;
                    TokenKind::G1Comment
                }
                Some('!') => {
                    self.bump();
                    self.bump();
                    self.expect = Expect::PreambleOpen;
                    TokenKind::G2Preamble
                }
                Some(ch) if is_name_start(ch) => {
                    self.bump();
                    self.expect = Expect::ElementName;
                    TokenKind::DefineElement
                }
                _ => {
                    return Err(self.fail(
                        self.pos,
                        "expected an element name, '?' or '!' after '#'",
                    ));
                }
            },
            Some('}') => {
                self.bump();
                self.close_block();
                TokenKind::BlockEnd
            }
            Some(_) => {
                self.scan_text(&['#', '}']);
                TokenKind::CharData
            }
        };
        Ok(Some(self.token(kind, start)))
    }

    fn lex_g2(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_while(char::is_whitespace);
        let start = self.mark();
        let Some(ch) = self.peek() else {
            return Ok(None);
        };
        let kind = match ch {
            '/' if self.peek_second() == Some('/') => {
                self.skip_while(|c| c != '\n' && c != '\r');
                TokenKind::G2Comment
            }
            '"' => {
                self.scan_string()?;
                TokenKind::CharData
            }
            '{' => {
                self.bump();
                self.modes.push(Mode::G2);
                TokenKind::BlockStart
            }
            '}' => {
                self.bump();
                self.close_block();
                TokenKind::BlockEnd
            }
            ',' => {
                self.bump();
                TokenKind::Comma
            }
            '=' => {
                self.bump();
                TokenKind::Assign
            }
            '@' => {
                self.bump();
                self.expect = Expect::AttributeName;
                TokenKind::DefineAttribute
            }
            c if is_name_start(c) => {
                self.skip_while(is_name_char);
                TokenKind::Identifier
            }
            other => {
                return Err(self.fail(self.pos, format!("unexpected character {other:?}")));
            }
        };
        Ok(Some(self.token(kind, start)))
    }

    fn lex_name(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.mark();
        if !self.peek().is_some_and(is_name_start) {
            let what = if self.expect == Expect::ElementName {
                "element"
            } else {
                "attribute"
            };
            return Err(self.fail(self.pos, format!("expected {what} name")));
        }
        self.skip_while(is_name_char);
        self.expect = match (self.expect, self.mode()) {
            (Expect::ElementName, _) => Expect::ElementTail,
            (_, Mode::Text) => Expect::AttributeOpen,
            (_, Mode::G2) => Expect::AttributeAssign,
        };
        Ok(Some(self.token(TokenKind::Identifier, start)))
    }

    fn lex_element_tail(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_while(|c| c == ' ' || c == '\t');
        let start = self.mark();
        match self.peek() {
            Some('@') => {
                self.bump();
                self.expect = Expect::AttributeName;
                Ok(Some(self.token(TokenKind::DefineAttribute, start)))
            }
            Some('{') => {
                self.bump();
                self.modes.push(Mode::Text);
                self.expect = Expect::Content;
                Ok(Some(self.token(TokenKind::BlockStart, start)))
            }
            _ => {
                self.expect = Expect::Content;
                self.lex_text()
            }
        }
    }

    fn lex_attribute_open(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.mark();
        if self.peek() != Some('{') {
            return Err(self.fail(self.pos, "expected '{' after attribute name"));
        }
        self.bump();
        self.expect = Expect::AttributeValue;
        Ok(Some(self.token(TokenKind::BlockStart, start)))
    }

    fn lex_attribute_value(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.mark();
        self.scan_text(&['}']);
        self.expect = Expect::AttributeClose;
        if self.offset == start.0 {
            return self.lex_attribute_close();
        }
        Ok(Some(self.token(TokenKind::CharData, start)))
    }

    fn lex_attribute_close(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.mark();
        if self.peek() != Some('}') {
            return Err(self.fail(self.pos, "unterminated attribute value, expected '}'"));
        }
        self.bump();
        self.expect = Expect::ElementTail;
        Ok(Some(self.token(TokenKind::BlockEnd, start)))
    }

    fn lex_attribute_assign(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_while(char::is_whitespace);
        let start = self.mark();
        if self.peek() != Some('=') {
            return Err(self.fail(self.pos, "expected '=' after attribute name"));
        }
        self.bump();
        self.expect = Expect::StringValue;
        Ok(Some(self.token(TokenKind::Assign, start)))
    }

    fn lex_string_value(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_while(char::is_whitespace);
        let start = self.mark();
        if self.peek() != Some('"') {
            return Err(self.fail(self.pos, "expected a string literal"));
        }
        self.scan_string()?;
        self.expect = Expect::Content;
        Ok(Some(self.token(TokenKind::CharData, start)))
    }

    fn lex_comment_text(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.mark();
        self.skip_while(|c| c != '\n' && c != '\r');
        self.expect = Expect::Content;
        if self.offset == start.0 {
            return self.lex_text();
        }
        Ok(Some(self.token(TokenKind::CharData, start)))
    }

    fn lex_preamble_open(&mut self) -> Result<Option<Token>, LexError> {
        let start = self.mark();
        if self.peek() != Some('{') {
            return Err(self.fail(self.pos, "expected '{' after '#!'"));
        }
        self.bump();
        self.modes.push(Mode::G2);
        self.expect = Expect::Content;
        Ok(Some(self.token(TokenKind::BlockStart, start)))
    }

    /// Consume a `"`-quoted literal, which may span lines.
    fn scan_string(&mut self) -> Result<(), LexError> {
        let opened_at = self.pos;
        self.bump();
        loop {
            match self.bump() {
                None => return Err(self.fail(opened_at, "unterminated string literal")),
                Some('\\') => {
                    self.bump();
                }
                Some('"') => return Ok(()),
                Some(_) => {}
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.next_token().transpose()
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | ':')
}
