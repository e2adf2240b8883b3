//! Document use-case service.
//!
//! # Responsibility
//! - Guard document creation against `(name, corpus)` duplicates.
//! - Delegate everything else to the repository unchanged.
//!
//! # Invariants
//! - The duplicate guard is advisory; storage does not enforce uniqueness,
//!   so concurrent creators can still race past it.

use crate::model::document::{DocId, DocumentInfo, NewDocument};
use crate::repo::doc_repo::{DocumentRepository, RepoError, RepoResult};
use log::warn;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for document use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// A document with the same name already exists in the corpus.
    DuplicateDocument { name: String, corpus: String },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateDocument { name, corpus } => {
                write!(f, "document `{name}` already exists in corpus `{corpus}`")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::DuplicateDocument { .. } => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Use-case service wrapper for document operations.
pub struct DocumentService<R: DocumentRepository> {
    repo: R,
}

impl<R: DocumentRepository> DocumentService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Underlying repository, for operations this service does not wrap.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Creates a document unless one with the same name and corpus exists.
    pub fn create_unique(&self, doc: &NewDocument) -> Result<DocId, ServiceError> {
        if self.repo.doc_exists(&doc.name, &doc.corpus)? {
            warn!(
                "event=doc_create module=service status=rejected error_code=duplicate_document id={}",
                doc.id
            );
            return Err(ServiceError::DuplicateDocument {
                name: doc.name.clone(),
                corpus: doc.corpus.clone(),
            });
        }
        Ok(self.repo.create_document(doc)?)
    }

    /// Loads the editor projection and body of one document.
    ///
    /// Returns `Ok(None)` when the document does not exist.
    pub fn open_for_editing(&self, id: DocId) -> RepoResult<Option<(DocumentInfo, String)>> {
        let Some(info) = self.repo.get_doc_info(id)? else {
            return Ok(None);
        };
        let content = self.repo.get_doc_content(id)?;
        Ok(Some((info, content)))
    }
}
