//! LSP server side of the session.
//!
//! This module frames JSON-RPC 2.0 messages over byte streams and
//! dispatches them to the per-client [`Session`].

mod lifecycle;
mod session;
mod transport;
pub mod types;

pub use lifecycle::{SERVER_NAME, SessionState, initialize_result, server_capabilities};
pub use session::{ENCODE_XML_METHOD, Session};
pub use transport::{DEFAULT_MAX_CONTENT_LENGTH, LspTransport, content_length_limit};
