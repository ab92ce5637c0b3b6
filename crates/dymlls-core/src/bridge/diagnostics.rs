//! Conversion of toolchain parse results into LSP diagnostics.

use lsp_types::{Diagnostic, DiagnosticSeverity, Range};

use super::encoding::to_zero_based;
use crate::dyml::{Toolchain, ToolchainError};

/// Value of [`Diagnostic::source`] for every diagnostic the server emits.
pub const DIAGNOSTIC_SOURCE: &str = "dyml";

/// Parse `content` and describe every problem as a diagnostic.
///
/// A successful parse yields an empty list, which clears the client's view.
#[must_use]
pub fn diagnose<T: Toolchain + ?Sized>(toolchain: &T, content: &str) -> Vec<Diagnostic> {
    match toolchain.parse(content) {
        Ok(_) => Vec::new(),
        Err(err) => to_diagnostics(&err),
    }
}

/// Convert a toolchain error into diagnostics.
///
/// Positioned errors produce one diagnostic per detail. Generic errors
/// produce a single diagnostic anchored at the document origin.
#[must_use]
pub fn to_diagnostics(err: &ToolchainError) -> Vec<Diagnostic> {
    match err {
        ToolchainError::Positioned { details } => details
            .iter()
            .map(|detail| {
                let range = Range::new(to_zero_based(detail.begin), to_zero_based(detail.end));
                error_diagnostic(range, detail.message.clone())
            })
            .collect(),
        ToolchainError::Generic { message } => {
            vec![error_diagnostic(Range::default(), message.clone())]
        }
    }
}

fn error_diagnostic(range: Range, message: String) -> Diagnostic {
    Diagnostic {
        range,
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message,
        ..Diagnostic::default()
    }
}
