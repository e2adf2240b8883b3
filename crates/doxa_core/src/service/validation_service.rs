//! Store-side surface used by the external validation engine.
//!
//! # Responsibility
//! - Hand out rule sets per validation pass.
//! - Write validation reports and processing markers back.

use crate::model::document::{DocId, DocumentFilter};
use crate::model::rule::{Rule, RuleDomain};
use crate::repo::doc_repo::{DocumentRepository, RepoResult};
use crate::repo::rule_repo::RuleRepository;

/// Validation engine facade over document and rule repositories.
pub struct ValidationService<D: DocumentRepository, R: RuleRepository> {
    docs: D,
    rules: R,
}

impl<D: DocumentRepository, R: RuleRepository> ValidationService<D, R> {
    pub fn new(docs: D, rules: R) -> Self {
        Self { docs, rules }
    }

    /// Rules consumed by one validation pass.
    pub fn rules_for(&self, domain: RuleDomain) -> RepoResult<Vec<Rule>> {
        self.rules.get_rules_for_domain(domain)
    }

    /// Stores the report and processing marker for one document.
    pub fn record_result(&self, id: DocId, validation: &str, timestamp: &str) -> RepoResult<()> {
        self.docs.update_validation(id, validation)?;
        self.docs.update_timestamp(id, timestamp)
    }

    /// Returns the cached report, `None` if the document must be revalidated
    /// or does not exist.
    pub fn cached_result(&self, id: DocId) -> RepoResult<Option<String>> {
        Ok(self.docs.get_document(id)?.and_then(|doc| doc.validation))
    }

    /// Ids of documents matching `filter` whose validation was invalidated.
    pub fn stale_documents(&self, filter: &DocumentFilter) -> RepoResult<Vec<DocId>> {
        let mut stale = Vec::new();
        for summary in self.docs.list_documents(filter)? {
            if self.cached_result(summary.id)?.is_none() {
                stale.push(summary.id);
            }
        }
        Ok(stale)
    }
}
