//! Metadata repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Upsert, delete and list document- and corpus-scoped metadata.
//!
//! # Invariants
//! - Saving a key that already exists for the same owner replaces the row.
//! - Document-scoped writes invalidate the owning document; corpus-scoped
//!   writes invalidate nothing.
//! - Listings are ordered by key, case-insensitively.

use crate::db::{execute, run_scoped, StatementOutput};
use crate::model::document::DocId;
use crate::model::metadata::{MetaId, MetaScope, MetadataEntry};
use crate::repo::doc_repo::{corpus_of, text, RepoError, RepoResult};
use crate::repo::invalidation::invalidate_doc_by_id;
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};

const META_SELECT_SQL: &str = "SELECT docid, metaid, key, value, corpus_meta FROM metadata";

/// Repository interface for metadata operations.
pub trait MetadataRepository {
    /// Upserts `key = value` for the document or for its corpus.
    ///
    /// Returns the identity of the resulting row. Corpus scope fails with
    /// `NotFound` when `docid` does not exist and with `MissingCorpus` when
    /// the document has no corpus.
    fn save_meta(&self, docid: DocId, key: &str, value: &str, scope: MetaScope)
        -> RepoResult<MetaId>;
    /// Removes one row by identity.
    fn delete_meta(&self, metaid: MetaId, docid: DocId, scope: MetaScope) -> RepoResult<()>;
    /// Lists entries of the document, or of its corpus.
    ///
    /// Corpus scope on a missing or corpus-less document yields an empty list.
    fn get_doc_meta(&self, docid: DocId, scope: MetaScope) -> RepoResult<Vec<MetadataEntry>>;
}

/// SQLite-backed metadata repository.
pub struct SqliteMetadataRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMetadataRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MetadataRepository for SqliteMetadataRepository<'_> {
    fn save_meta(
        &self,
        docid: DocId,
        key: &str,
        value: &str,
        scope: MetaScope,
    ) -> RepoResult<MetaId> {
        run_scoped(self.conn, |conn| match scope {
            MetaScope::Corpus => {
                let corpus = corpus_of(conn, docid)?
                    .ok_or(RepoError::NotFound(docid))?
                    .ok_or(RepoError::MissingCorpus(docid))?;
                new_meta_id(execute(
                    conn,
                    "INSERT OR REPLACE INTO metadata (docid, key, value, corpus_meta)
                     VALUES (NULL, ?1, ?2, ?3);",
                    params![key, value, corpus],
                    true,
                )?)
            }
            MetaScope::Document => {
                let metaid = new_meta_id(execute(
                    conn,
                    "INSERT OR REPLACE INTO metadata (docid, key, value, corpus_meta)
                     VALUES (?1, ?2, ?3, NULL);",
                    params![docid, key, value],
                    true,
                )?)?;
                invalidate_doc_by_id(conn, docid)?;
                Ok(metaid)
            }
        })
    }

    fn delete_meta(&self, metaid: MetaId, docid: DocId, scope: MetaScope) -> RepoResult<()> {
        run_scoped(self.conn, |conn| {
            conn.execute("DELETE FROM metadata WHERE metaid = ?1;", [metaid])?;
            if !scope.is_corpus() {
                invalidate_doc_by_id(conn, docid)?;
            }
            Ok(())
        })
    }

    fn get_doc_meta(&self, docid: DocId, scope: MetaScope) -> RepoResult<Vec<MetadataEntry>> {
        let (owner_column, owner) = match scope {
            MetaScope::Corpus => match corpus_of(self.conn, docid)? {
                Some(Some(corpus)) => ("corpus_meta", Value::Text(corpus)),
                Some(None) | None => return Ok(Vec::new()),
            },
            MetaScope::Document => ("docid", Value::Integer(docid)),
        };

        let mut stmt = self.conn.prepare(&format!(
            "{META_SELECT_SQL} WHERE {owner_column} = ?1 ORDER BY key COLLATE NOCASE ASC;"
        ))?;
        let mut rows = stmt.query([owner])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_meta_row(row)?);
        }
        Ok(entries)
    }
}

fn new_meta_id(output: StatementOutput) -> RepoResult<MetaId> {
    output
        .new_id()
        .ok_or_else(|| RepoError::InvalidData("metadata insert returned no id".to_string()))
}

fn parse_meta_row(row: &Row<'_>) -> rusqlite::Result<MetadataEntry> {
    Ok(MetadataEntry {
        docid: row.get("docid")?,
        metaid: row.get("metaid")?,
        key: text(row, "key")?,
        value: text(row, "value")?,
        corpus_meta: row.get("corpus_meta")?,
    })
}
