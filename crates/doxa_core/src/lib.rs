//! Persistence core for the doxa document-annotation tool.
//! This crate owns documents, metadata, validation rules and the
//! invalidation protocol that keeps cached validation results honest.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod render;
pub mod repo;
pub mod service;

pub use config::StoreConfig;
pub use db::{open_db, open_db_in_memory, reset_database, DbError, DbResult, Store};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::document::{
    DocId, Document, DocumentFilter, DocumentInfo, DocumentSummary, NewDocument,
};
pub use model::metadata::{MetaId, MetaScope, MetadataEntry};
pub use model::rule::{
    NewRule, Rule, RuleDomain, RuleId, RuleParseError, RuleSort, RuleSortKey, SortDirection,
};
pub use render::meta_table::{print_meta, render_meta_table};
pub use repo::doc_repo::{DocumentRepository, RepoError, RepoResult, SqliteDocumentRepository};
pub use repo::meta_repo::{MetadataRepository, SqliteMetadataRepository};
pub use repo::rule_repo::{RuleRepository, SqliteRuleRepository};
pub use service::document_service::{DocumentService, ServiceError};
pub use service::validation_service::ValidationService;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
