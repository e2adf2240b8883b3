//! Metadata entry model.
//!
//! # Invariants
//! - Document-scoped entries carry `docid` and no `corpus_meta`.
//! - Corpus-scoped entries carry `corpus_meta` and no `docid`.

use crate::model::document::DocId;
use serde::{Deserialize, Serialize};

/// Autoincrement identity of one metadata row.
pub type MetaId = i64;

/// Which owner a metadata operation targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaScope {
    /// Entry belongs to one document.
    #[default]
    Document,
    /// Entry belongs to the corpus of the referenced document.
    Corpus,
}

impl MetaScope {
    pub fn is_corpus(self) -> bool {
        matches!(self, Self::Corpus)
    }
}

/// One stored metadata row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub docid: Option<DocId>,
    pub metaid: MetaId,
    pub key: String,
    pub value: String,
    pub corpus_meta: Option<String>,
}

impl MetadataEntry {
    pub fn scope(&self) -> MetaScope {
        if self.corpus_meta.is_some() {
            MetaScope::Corpus
        } else {
            MetaScope::Document
        }
    }
}
