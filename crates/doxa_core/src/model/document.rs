//! Document domain model.
//!
//! # Responsibility
//! - Define the stored document row and its read projections.
//! - Carry creation input for new documents.
//!
//! # Invariants
//! - `(name, corpus)` is unique by convention only; storage does not enforce it.
//! - `validation == None` means the document must be revalidated.

use serde::{Deserialize, Serialize};

/// Caller-assigned document identity.
pub type DocId = i64;

/// Schema reference stored when a document has no validation schema.
pub const NO_SCHEMA: &str = "--none--";

/// Mode every newly created document is stored with.
pub const DEFAULT_MODE: &str = "xml";

/// Mode whose documents are invalidated by non-`meta` rule changes.
pub const ETHER_MODE: &str = "ether";

/// Full stored document row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub name: String,
    pub corpus: String,
    pub status: String,
    pub assignee: String,
    pub filename: String,
    pub content: String,
    /// Format tag such as `xml` or `ether`.
    pub mode: String,
    pub schema: String,
    /// Cached validation report written back by the validation engine.
    pub validation: Option<String>,
    /// Last-processed marker written back by the validation engine.
    pub timestamp: Option<String>,
    /// Opaque cached render.
    pub cache: Option<String>,
}

/// Editor-facing projection returned by `get_doc_info`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub name: String,
    pub corpus: String,
    pub filename: String,
    pub status: String,
    pub assignee: String,
    pub mode: String,
    pub schema: String,
}

/// Listing projection returned by `list_documents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocId,
    pub name: String,
    pub corpus: String,
    pub mode: String,
    pub content: String,
}

/// Input for `create_document`.
///
/// `mode` is accepted for call-site symmetry with the other fields, but
/// documents are always stored with [`DEFAULT_MODE`]; switch modes with
/// `update_mode` after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument {
    pub id: DocId,
    pub name: String,
    pub corpus: String,
    pub status: String,
    pub assignee: String,
    pub filename: String,
    pub content: String,
    pub mode: String,
    pub schema: String,
}

impl NewDocument {
    /// Creates input with default mode and no schema.
    pub fn new(
        id: DocId,
        name: impl Into<String>,
        corpus: impl Into<String>,
        status: impl Into<String>,
        assignee: impl Into<String>,
        filename: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            corpus: corpus.into(),
            status: status.into(),
            assignee: assignee.into(),
            filename: filename.into(),
            content: content.into(),
            mode: DEFAULT_MODE.to_string(),
            schema: NO_SCHEMA.to_string(),
        }
    }

    /// Sets the schema reference.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Sets the requested mode. Ignored by `create_document`.
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }
}

/// Optional filters for `list_documents`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentFilter {
    pub corpus: Option<String>,
    pub status: Option<String>,
}

impl DocumentFilter {
    pub fn corpus(corpus: impl Into<String>) -> Self {
        Self {
            corpus: Some(corpus.into()),
            status: None,
        }
    }

    pub fn status(status: impl Into<String>) -> Self {
        Self {
            corpus: None,
            status: Some(status.into()),
        }
    }
}
