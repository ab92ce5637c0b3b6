//! The DYML language toolchain.
//!
//! The session engine only talks to the toolchain through the [`Toolchain`]
//! trait: tokenize for highlighting, parse for diagnostics and encode for the
//! XML preview. [`Dyml`] is the built-in implementation.

mod error;
mod lexer;
mod parser;
mod token;
mod xml;

pub use error::{ErrorDetail, LexError, ToolchainError};
pub use lexer::Lexer;
pub use parser::{Document, Element, Node, parse};
pub use token::{Pos, Token, TokenKind};

use crate::config::{MAX_NESTING_DEPTH, ToolchainConfig};

/// Lazily produced token stream; ends after the first error.
pub type TokenStream<'a> = Box<dyn Iterator<Item = Result<Token, LexError>> + 'a>;

/// Narrow interface between the session engine and a markup toolchain.
pub trait Toolchain {
    /// Tokenize `text`. The stream stops after yielding an error.
    fn tokenize<'a>(&self, text: &'a str) -> TokenStream<'a>;

    /// Parse `text` into a document.
    ///
    /// # Errors
    ///
    /// Returns a [`ToolchainError`] describing why `text` is not a valid document.
    fn parse(&self, text: &str) -> Result<Document, ToolchainError>;

    /// Render `text` as XML.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `text` is not a valid document; never partial output.
    fn encode_xml(&self, text: &str) -> Result<String, ToolchainError>;
}

/// Built-in DYML toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dyml {
    max_depth: usize,
}

impl Dyml {
    /// Create a toolchain rejecting nesting deeper than `max_depth`.
    ///
    /// `max_depth` is capped at [`MAX_NESTING_DEPTH`].
    #[must_use]
    pub const fn new(max_depth: usize) -> Self {
        let max_depth = if max_depth > MAX_NESTING_DEPTH {
            MAX_NESTING_DEPTH
        } else {
            max_depth
        };
        Self { max_depth }
    }

    /// Create a toolchain from configuration.
    #[must_use]
    pub const fn from_config(config: &ToolchainConfig) -> Self {
        Self::new(config.max_depth)
    }

    /// Maximum accepted nesting depth.
    #[must_use]
    pub const fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for Dyml {
    fn default() -> Self {
        Self::from_config(&ToolchainConfig::default())
    }
}

impl Toolchain for Dyml {
    fn tokenize<'a>(&self, text: &'a str) -> TokenStream<'a> {
        Box::new(Lexer::new(text))
    }

    fn parse(&self, text: &str) -> Result<Document, ToolchainError> {
        parser::parse(text, self.max_depth)
    }

    fn encode_xml(&self, text: &str) -> Result<String, ToolchainError> {
        let document = self.parse(text)?;
        Ok(xml::encode(&document))
    }
}
