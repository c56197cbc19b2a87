//! Document identity and point-in-time content snapshots.

use crate::diagnostic::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Stable identity of a document as the host names it (a URI or a path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File extension of the document identity, if any.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.0).extension().and_then(|ext| ext.to_str())
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&Path> for DocumentId {
    fn from(path: &Path) -> Self {
        Self(path.display().to_string())
    }
}

/// Content of one document captured at a single point in time.
///
/// The text is shared; cloning a snapshot is cheap, which lets several
/// concurrently running backends read the same content without copies.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    id: DocumentId,
    text: Arc<str>,
}

impl DocumentSnapshot {
    pub fn new(id: DocumentId, text: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &DocumentId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines, counting a trailing newline as starting a new
    /// (empty) final line, the way editors do.
    #[must_use]
    pub fn line_count(&self) -> u32 {
        self.text.split('\n').count() as u32
    }

    /// Character length of the given 0-indexed line, 0 if out of range.
    #[must_use]
    pub fn line_len(&self, line: u32) -> u32 {
        self.text
            .split('\n')
            .nth(line as usize)
            .map_or(0, |l| l.chars().count() as u32)
    }

    /// Whole-line span for the given line, clamped into the document.
    #[must_use]
    pub fn line_span(&self, line: u32) -> Span {
        let clamped = line.min(self.line_count().saturating_sub(1));
        Span::line(clamped, self.line_len(clamped))
    }

    #[must_use]
    pub fn first_line_span(&self) -> Span {
        self.line_span(0)
    }

    /// Single-character span at `(line, column)`, with the line clamped
    /// into the document.
    #[must_use]
    pub fn caret_span(&self, line: u32, column: u32) -> Span {
        let clamped = line.min(self.line_count().saturating_sub(1));
        Span::caret(clamped, column)
    }
}
