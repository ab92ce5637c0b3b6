//! LSP transport layer for stdio communication.
//!
//! This module implements the LSP header-content message format over any
//! async byte stream. Messages follow the format:
//! ```text
//! Content-Length: 123\r\n
//! \r\n
//! {"jsonrpc":"2.0",...}
//! ```

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{trace, warn};

use crate::config::DocumentLimits;
use crate::error::{Error, Result};
use crate::lsp::types::InboundMessage;

/// Body size cap used when documents are not size-limited.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

/// Allowance for the JSON-RPC envelope around a document's text.
const ENVELOPE_HEADROOM: usize = 64 * 1024;

/// Largest message body worth reading under `limits`.
///
/// Document text is JSON-escaped inside the body, so the configured file
/// size is doubled before the envelope allowance is added.
#[must_use]
pub fn content_length_limit(limits: &DocumentLimits) -> usize {
    if limits.max_file_size == 0 {
        return DEFAULT_MAX_CONTENT_LENGTH;
    }
    usize::try_from(limits.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(ENVELOPE_HEADROOM)
}

/// LSP transport layer handling header-content format.
///
/// Parses `Content-Length` headers and reads exact message content from
/// `reader`; frames outbound messages onto `writer`.
#[derive(Debug)]
pub struct LspTransport<R, W> {
    reader: R,
    writer: W,
    max_content_length: usize,
}

impl<R, W> LspTransport<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create a transport over a buffered reader and a writer.
    #[must_use]
    pub const fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            max_content_length: DEFAULT_MAX_CONTENT_LENGTH,
        }
    }

    /// Reject message bodies longer than `max` bytes.
    #[must_use]
    pub fn with_max_content_length(mut self, max: usize) -> Self {
        self.max_content_length = max;
        self
    }

    /// Consume the transport, returning the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    /// Send a message to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Message serialization fails
    /// - Writing or flushing the output fails
    pub async fn send<T: Serialize>(&mut self, message: &T) -> Result<()> {
        let content = serde_json::to_string(message)?;
        let header = format!("Content-Length: {}\r\n\r\n", content.len());

        trace!("Sending LSP message: {}", content);

        self.writer.write_all(header.as_bytes()).await?;
        self.writer.write_all(content.as_bytes()).await?;
        self.writer.flush().await?;

        Ok(())
    }

    /// Receive the next message from the client.
    ///
    /// The body is always consumed in full, so after a framing, JSON or
    /// envelope error the stream is positioned at the next message.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input reached EOF ([`Error::TransportClosed`])
    /// - Reading from the input fails ([`Error::Io`])
    /// - A header line is not valid UTF-8
    /// - Content-Length header is missing, invalid or above the size cap
    /// - JSON parsing fails
    /// - The body is neither a request nor a notification
    pub async fn receive(&mut self) -> Result<InboundMessage> {
        let headers = self.read_headers().await?;

        let content_length = headers
            .get("content-length")
            .ok_or_else(|| Error::LspProtocolError("Missing Content-Length header".to_string()))?
            .parse::<usize>()
            .map_err(|e| Error::LspProtocolError(format!("Invalid Content-Length: {e}")))?;

        if content_length > self.max_content_length {
            self.skip_content(content_length).await?;
            return Err(Error::LspProtocolError(format!(
                "Content-Length {content_length} exceeds limit of {} bytes",
                self.max_content_length
            )));
        }

        let content = self.read_content(content_length).await?;

        trace!("Received LSP message: {}", content);

        let value: Value = serde_json::from_str(&content)?;
        InboundMessage::from_value(value)
    }

    /// Read headers until blank line.
    ///
    /// Header names are case-insensitive and stored lowercased. A header
    /// block with a line that is not UTF-8 is rejected as a whole, after
    /// its body has been skipped.
    async fn read_headers(&mut self) -> Result<HashMap<String, String>> {
        let mut headers = HashMap::new();
        let mut invalid = None;
        let mut line = Vec::new();

        loop {
            line.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut line).await?;

            if bytes_read == 0 {
                trace!("EOF detected in read_headers");
                return Err(Error::TransportClosed);
            }

            if line == b"\r\n" || line == b"\n" {
                break;
            }

            match std::str::from_utf8(&line) {
                Ok(text) => {
                    if let Some((key, value)) = text.trim_end().split_once(':') {
                        headers.insert(key.trim().to_lowercase(), value.trim().to_string());
                    } else {
                        warn!("Malformed header: {}", text.trim());
                    }
                }
                Err(e) => {
                    warn!("Header line is not valid UTF-8: {e}");
                    invalid.get_or_insert(e);
                }
            }
        }

        if let Some(e) = invalid {
            if let Some(length) = headers
                .get("content-length")
                .and_then(|v| v.parse::<usize>().ok())
            {
                self.skip_content(length).await?;
            }
            return Err(Error::LspProtocolError(format!(
                "Invalid UTF-8 in header: {e}"
            )));
        }

        Ok(headers)
    }

    /// Discard up to `length` body bytes without buffering them.
    async fn skip_content(&mut self, length: usize) -> Result<()> {
        let limit = u64::try_from(length).unwrap_or(u64::MAX);
        let skipped = tokio::io::copy(&mut (&mut self.reader).take(limit), &mut tokio::io::sink())
            .await?;
        trace!("Skipped {skipped} body bytes");
        Ok(())
    }

    /// Read exact number of content bytes.
    async fn read_content(&mut self, length: usize) -> Result<String> {
        let mut buffer = vec![0u8; length];
        self.reader.read_exact(&mut buffer).await?;

        String::from_utf8(buffer)
            .map_err(|e| Error::LspProtocolError(format!("Invalid UTF-8 in content: {e}")))
    }
}
