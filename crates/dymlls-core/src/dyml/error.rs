//! Error types reported by the DYML toolchain.

use super::token::{Pos, Token};

/// Lexing failed at a specific position. The lexer stops after the first one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{pos}: {message}")]
pub struct LexError {
    /// Position at which lexing failed.
    pub pos: Pos,
    /// Human readable description.
    pub message: String,
}

/// One location and message within a positioned error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    /// Start of the offending range (1-based).
    pub begin: Pos,
    /// End of the offending range (1-based, exclusive).
    pub end: Pos,
    /// What went wrong at this location.
    pub message: String,
}

impl ErrorDetail {
    /// Create a detail covering `begin..end`.
    pub fn new(begin: Pos, end: Pos, message: impl Into<String>) -> Self {
        Self {
            begin,
            end,
            message: message.into(),
        }
    }

    /// Create a detail covering a token.
    pub fn at_token(token: &Token, message: impl Into<String>) -> Self {
        Self::new(token.begin, token.end, message)
    }
}

/// Failure reported by [`Toolchain::parse`](super::Toolchain::parse) and
/// [`Toolchain::encode_xml`](super::Toolchain::encode_xml).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolchainError {
    /// Error tied to one or more source locations.
    #[error("{}", describe(.details))]
    Positioned {
        /// Locations and messages, most relevant first.
        details: Vec<ErrorDetail>,
    },

    /// Error without a usable source location.
    #[error("{message}")]
    Generic {
        /// Human readable description.
        message: String,
    },
}

impl ToolchainError {
    /// Positioned error with a single detail.
    pub fn at(begin: Pos, end: Pos, message: impl Into<String>) -> Self {
        Self::Positioned {
            details: vec![ErrorDetail::new(begin, end, message)],
        }
    }
}

impl From<LexError> for ToolchainError {
    fn from(err: LexError) -> Self {
        let end = Pos::new(err.pos.line, err.pos.col + 1);
        Self::at(err.pos, end, err.message)
    }
}

fn describe(details: &[ErrorDetail]) -> String {
    match details.first() {
        Some(first) if details.len() > 1 => format!(
            "{}: {} (and {} more)",
            first.begin,
            first.message,
            details.len() - 1
        ),
        Some(first) => format!("{}: {}", first.begin, first.message),
        None => "unknown error".to_string(),
    }
}
