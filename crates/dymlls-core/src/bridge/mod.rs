//! Translation layer between the DYML toolchain and LSP.
//!
//! This module owns the document store and converts toolchain output
//! (tokens, parse errors) into LSP semantic tokens and diagnostics.

mod diagnostics;
mod encoding;
mod notifications;
mod semantic_tokens;
mod state;

pub use diagnostics::{DIAGNOSTIC_SOURCE, diagnose, to_diagnostics};
pub use encoding::{
    AbsoluteToken, LineSpan, from_deltas, split_multiline, to_deltas, to_zero_based, utf16_len,
};
pub use notifications::{PREVIEW_METHOD, preview, publish_diagnostics, render_preview};
pub use semantic_tokens::{LEGEND, TokenLegend};
pub use state::{DocumentState, DocumentStore};
