//! Recursive descent parser building a DYML document tree.

use super::error::{ErrorDetail, ToolchainError};
use super::lexer::Lexer;
use super::token::{Pos, Token, TokenKind};

/// Parsed DYML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    /// Top level nodes in source order.
    pub children: Vec<Node>,
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// Unescaped text content.
    Text(String),
}

/// A named element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Element name.
    pub name: String,
    /// Attributes in source order; names are unique.
    pub attributes: Vec<(String, String)>,
    /// Child nodes in source order.
    pub children: Vec<Node>,
}

type ParseResult<T> = Result<T, ToolchainError>;

/// Parse `source` into a [`Document`], rejecting nesting deeper than `max_depth`.
///
/// # Errors
///
/// Returns a positioned error for lexing failures, unexpected tokens,
/// unclosed blocks and duplicate attributes, and a generic error when
/// the nesting limit is exceeded.
pub fn parse(source: &str, max_depth: usize) -> ParseResult<Document> {
    let tokens = Lexer::new(source).collect::<Result<Vec<_>, _>>()?;
    let mut parser = Parser {
        source,
        tokens,
        index: 0,
        max_depth,
        eof: Pos::end_of(source),
    };

    let children = parser.g1_nodes(0)?;
    if let Some(token) = parser.peek() {
        return Err(ToolchainError::Positioned {
            details: vec![ErrorDetail::at_token(
                token,
                format!("unexpected {} without a matching '{{'", token.kind),
            )],
        });
    }
    Ok(Document { children })
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    index: usize,
    max_depth: usize,
    eof: Pos,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.index)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.index).cloned();
        if token.is_some() {
            self.index += 1;
        }
        token
    }

    fn text(&self, token: &Token) -> &str {
        token.text(self.source)
    }

    fn unexpected(&self, expected: &str) -> ToolchainError {
        match self.peek() {
            Some(token) => ToolchainError::Positioned {
                details: vec![ErrorDetail::at_token(
                    token,
                    format!("expected {expected}, found {}", token.kind),
                )],
            },
            None => ToolchainError::at(
                self.eof,
                self.eof,
                format!("expected {expected}, found end of input"),
            ),
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> ParseResult<Token> {
        if self.peek_kind() == Some(kind) {
            if let Some(token) = self.advance() {
                return Ok(token);
            }
        }
        Err(self.unexpected(expected))
    }

    /// Consume the `}` matching `open`.
    fn close_block(&mut self, open: &Token) -> ParseResult<()> {
        match self.peek_kind() {
            Some(TokenKind::BlockEnd) => {
                self.advance();
                Ok(())
            }
            None => Err(ToolchainError::Positioned {
                details: vec![
                    ErrorDetail::at_token(open, "this block is never closed"),
                    ErrorDetail::new(self.eof, self.eof, "expected '}' before end of input"),
                ],
            }),
            Some(_) => Err(self.unexpected("'}'")),
        }
    }

    fn check_depth(&self, depth: usize) -> ParseResult<()> {
        if depth >= self.max_depth {
            return Err(ToolchainError::Generic {
                message: format!("maximum nesting depth of {} exceeded", self.max_depth),
            });
        }
        Ok(())
    }

    fn g1_nodes(&mut self, depth: usize) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::BlockEnd => break,
                TokenKind::CharData => {
                    if let Some(token) = self.advance() {
                        nodes.push(Node::Text(unescape(self.text(&token))));
                    }
                }
                TokenKind::G1Comment => {
                    self.advance();
                    if self.peek_kind() == Some(TokenKind::CharData) {
                        self.advance();
                    }
                }
                TokenKind::DefineElement => nodes.push(Node::Element(self.g1_element(depth)?)),
                TokenKind::G2Preamble => {
                    self.advance();
                    self.check_depth(depth)?;
                    let open = self.expect(TokenKind::BlockStart, "'{' after '#!'")?;
                    nodes.extend(self.g2_nodes(depth + 1)?);
                    self.close_block(&open)?;
                }
                _ => return Err(self.unexpected("text or '#'")),
            }
        }
        Ok(nodes)
    }

    fn g1_element(&mut self, depth: usize) -> ParseResult<Element> {
        self.check_depth(depth)?;
        self.expect(TokenKind::DefineElement, "'#'")?;
        let name_token = self.expect(TokenKind::Identifier, "an element name")?;
        let mut element = Element {
            name: self.text(&name_token).to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        };

        let mut seen: Vec<Token> = Vec::new();
        while self.peek_kind() == Some(TokenKind::DefineAttribute) {
            self.advance();
            let key = self.expect(TokenKind::Identifier, "an attribute name")?;
            self.expect(TokenKind::BlockStart, "'{'")?;
            let value = if self.peek_kind() == Some(TokenKind::CharData) {
                self.advance()
                    .map(|t| unescape(self.text(&t)))
                    .unwrap_or_default()
            } else {
                String::new()
            };
            self.expect(TokenKind::BlockEnd, "'}'")?;
            self.add_attribute(&mut element, &mut seen, key, value)?;
        }

        if self.peek_kind() == Some(TokenKind::BlockStart) {
            let open = self.expect(TokenKind::BlockStart, "'{'")?;
            element.children = self.g1_nodes(depth + 1)?;
            self.close_block(&open)?;
        }
        Ok(element)
    }

    fn g2_nodes(&mut self, depth: usize) -> ParseResult<Vec<Node>> {
        let mut nodes = Vec::new();
        while let Some(kind) = self.peek_kind() {
            match kind {
                TokenKind::BlockEnd => break,
                TokenKind::G2Comment | TokenKind::Comma => {
                    self.advance();
                }
                TokenKind::CharData => {
                    if let Some(token) = self.advance() {
                        nodes.push(Node::Text(unquote(self.text(&token))));
                    }
                }
                TokenKind::Identifier => nodes.push(Node::Element(self.g2_element(depth)?)),
                _ => return Err(self.unexpected("an element name or a string")),
            }
        }
        Ok(nodes)
    }

    fn g2_element(&mut self, depth: usize) -> ParseResult<Element> {
        self.check_depth(depth)?;
        let name_token = self.expect(TokenKind::Identifier, "an element name")?;
        let mut element = Element {
            name: self.text(&name_token).to_string(),
            attributes: Vec::new(),
            children: Vec::new(),
        };

        let mut seen: Vec<Token> = Vec::new();
        while self.peek_kind() == Some(TokenKind::DefineAttribute) {
            self.advance();
            let key = self.expect(TokenKind::Identifier, "an attribute name")?;
            self.expect(TokenKind::Assign, "'='")?;
            let value = self.expect(TokenKind::CharData, "a string literal")?;
            let value = unquote(self.text(&value));
            self.add_attribute(&mut element, &mut seen, key, value)?;
        }

        if self.peek_kind() == Some(TokenKind::BlockStart) {
            let open = self.expect(TokenKind::BlockStart, "'{'")?;
            element.children = self.g2_nodes(depth + 1)?;
            self.close_block(&open)?;
        }
        Ok(element)
    }

    fn add_attribute(
        &self,
        element: &mut Element,
        seen: &mut Vec<Token>,
        key: Token,
        value: String,
    ) -> ParseResult<()> {
        let name = self.text(&key);
        if let Some(first) = seen.iter().find(|t| self.text(t) == name) {
            return Err(ToolchainError::Positioned {
                details: vec![
                    ErrorDetail::at_token(first, format!("'{name}' was first defined here")),
                    ErrorDetail::at_token(&key, format!("duplicate attribute '{name}'")),
                ],
            });
        }
        element.attributes.push((name.to_string(), value));
        seen.push(key);
        Ok(())
    }
}

/// Drop G1 escape backslashes.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Strip the quotes of a G2 string literal and resolve its escapes.
fn unquote(raw: &str) -> String {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(raw);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
