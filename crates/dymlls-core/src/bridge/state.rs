//! Document state management.
//!
//! Tracks open documents and their versions. Content is always replaced as a
//! whole; there is no incremental patching.

use std::collections::HashMap;

use lsp_types::Uri;

use crate::config::DocumentLimits;
use crate::error::{Error, Result};

/// State of a single document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentState {
    /// Document URI.
    pub uri: Uri,
    /// Local version, starting at 1 and incremented on every replacement.
    pub version: i32,
    /// Document content.
    pub content: String,
}

/// Tracks open documents by URI.
#[derive(Debug, Default)]
pub struct DocumentStore {
    documents: HashMap<String, DocumentState>,
    limits: DocumentLimits,
}

impl DocumentStore {
    /// Create a new document store with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new document store with custom limits.
    #[must_use]
    pub fn with_limits(limits: DocumentLimits) -> Self {
        Self {
            documents: HashMap::new(),
            limits,
        }
    }

    /// Check if a document is currently open.
    #[must_use]
    pub fn is_open(&self, uri: &Uri) -> bool {
        self.documents.contains_key(uri.as_str())
    }

    /// Get the state of an open document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentNotFound`] if the document is not open.
    pub fn get(&self, uri: &Uri) -> Result<&DocumentState> {
        self.documents
            .get(uri.as_str())
            .ok_or_else(|| Error::DocumentNotFound(uri.as_str().to_string()))
    }

    /// Get the content of an open document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DocumentNotFound`] if the document is not open.
    pub fn content(&self, uri: &Uri) -> Result<&str> {
        self.get(uri).map(|state| state.content.as_str())
    }

    /// Get the number of open documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if there are no open documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// URIs of all open documents, sorted.
    #[must_use]
    pub fn uris(&self) -> Vec<&Uri> {
        let mut uris: Vec<_> = self.documents.values().map(|state| &state.uri).collect();
        uris.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        uris
    }

    /// Open a document, replacing any previous state for the same URI.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Document limit is exceeded
    /// - File size limit is exceeded
    pub fn open(&mut self, uri: Uri, content: String) -> Result<()> {
        let reopening = self.documents.contains_key(uri.as_str());
        if !reopening
            && self.limits.max_documents > 0
            && self.documents.len() >= self.limits.max_documents
        {
            return Err(Error::DocumentLimitExceeded {
                current: self.documents.len(),
                max: self.limits.max_documents,
            });
        }
        self.check_size(&content)?;

        let state = DocumentState {
            uri: uri.clone(),
            version: 1,
            content,
        };
        self.documents.insert(uri.as_str().to_string(), state);
        Ok(())
    }

    /// Replace a document's content and increment its version.
    ///
    /// Returns `Ok(None)` without touching the store if the document is not open.
    ///
    /// # Errors
    ///
    /// Returns an error if the new content exceeds the file size limit.
    pub fn replace(&mut self, uri: &Uri, content: String) -> Result<Option<i32>> {
        if !self.is_open(uri) {
            return Ok(None);
        }
        self.check_size(&content)?;

        Ok(self.documents.get_mut(uri.as_str()).map(|state| {
            state.version += 1;
            state.content = content;
            state.version
        }))
    }

    /// Close a document and remove it from tracking.
    ///
    /// Returns the document state if it was open.
    pub fn close(&mut self, uri: &Uri) -> Option<DocumentState> {
        self.documents.remove(uri.as_str())
    }

    fn check_size(&self, content: &str) -> Result<()> {
        let size = content.len() as u64;
        if self.limits.max_file_size > 0 && size > self.limits.max_file_size {
            return Err(Error::FileSizeLimitExceeded {
                size,
                max: self.limits.max_file_size,
            });
        }
        Ok(())
    }
}
