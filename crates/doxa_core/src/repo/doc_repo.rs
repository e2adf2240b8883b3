//! Document repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `docs` table.
//! - Apply validation invalidation for identity and content changes.
//! - Cascade document deletion to owned metadata rows.
//!
//! # Invariants
//! - `create_document` always stores mode `xml`.
//! - `update_docname`, `update_corpus` and `save_content` clear `validation`;
//!   the remaining setters never do.
//! - `delete_doc` removes the row and its metadata atomically.

use crate::db::{run_scoped, DbError};
use crate::model::document::{
    DocId, Document, DocumentFilter, DocumentInfo, DocumentSummary, NewDocument, DEFAULT_MODE,
};
use crate::repo::invalidation::invalidate_doc_by_id;
use log::info;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for document, metadata and rule persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// The referenced document does not exist.
    NotFound(DocId),
    /// The document has no corpus to attach corpus-scoped data to.
    MissingCorpus(DocId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "document not found: {id}"),
            Self::MissingCorpus(id) => write!(f, "document {id} has no corpus"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::MissingCorpus(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for document operations.
pub trait DocumentRepository {
    /// Inserts a document with its caller-assigned id. `doc.mode` is ignored.
    fn create_document(&self, doc: &NewDocument) -> RepoResult<DocId>;
    /// Whether a document with exactly this name and corpus exists.
    fn doc_exists(&self, name: &str, corpus: &str) -> RepoResult<bool>;
    fn get_doc_info(&self, id: DocId) -> RepoResult<Option<DocumentInfo>>;
    fn get_document(&self, id: DocId) -> RepoResult<Option<Document>>;
    /// Returns the raw body. Fails with `NotFound` for a missing document.
    fn get_doc_content(&self, id: DocId) -> RepoResult<String>;
    fn list_documents(&self, filter: &DocumentFilter) -> RepoResult<Vec<DocumentSummary>>;
    /// Distinct corpus names, case-insensitively ordered.
    fn get_corpora(&self) -> RepoResult<Vec<String>>;

    fn update_assignee(&self, id: DocId, assignee: &str) -> RepoResult<()>;
    fn update_status(&self, id: DocId, status: &str) -> RepoResult<()>;
    fn update_filename(&self, id: DocId, filename: &str) -> RepoResult<()>;
    fn update_mode(&self, id: DocId, mode: &str) -> RepoResult<()>;
    fn update_schema(&self, id: DocId, schema: &str) -> RepoResult<()>;

    /// Renames the document and invalidates its validation.
    fn update_docname(&self, id: DocId, name: &str) -> RepoResult<()>;
    /// Moves the document to another corpus and invalidates its validation.
    fn update_corpus(&self, id: DocId, corpus: &str) -> RepoResult<()>;
    /// Replaces the body from the editor and invalidates its validation.
    fn save_content(&self, id: DocId, content: &str) -> RepoResult<()>;

    /// Stores a validation report produced by the validation engine.
    fn update_validation(&self, id: DocId, validation: &str) -> RepoResult<()>;
    fn update_timestamp(&self, id: DocId, timestamp: &str) -> RepoResult<()>;

    fn get_cache(&self, id: DocId) -> RepoResult<Option<String>>;
    fn set_cache(&self, id: DocId, cache: Option<&str>) -> RepoResult<()>;

    /// Deletes the document and every metadata row it owns.
    fn delete_doc(&self, id: DocId) -> RepoResult<()>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn update_field(
        &self,
        sql: &'static str,
        id: DocId,
        value: Option<&str>,
        invalidate: bool,
    ) -> RepoResult<()> {
        run_scoped(self.conn, |conn| {
            conn.execute(sql, params![value, id])?;
            if invalidate {
                invalidate_doc_by_id(conn, id)?;
            }
            Ok(())
        })
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn create_document(&self, doc: &NewDocument) -> RepoResult<DocId> {
        run_scoped(self.conn, |conn| {
            conn.execute(
                "INSERT INTO docs (
                    id,
                    name,
                    corpus,
                    status,
                    assignee_username,
                    filename,
                    content,
                    mode,
                    schema
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                params![
                    doc.id,
                    doc.name.as_str(),
                    doc.corpus.as_str(),
                    doc.status.as_str(),
                    doc.assignee.as_str(),
                    doc.filename.as_str(),
                    doc.content.as_str(),
                    DEFAULT_MODE,
                    doc.schema.as_str(),
                ],
            )?;
            Ok(doc.id)
        })
    }

    fn doc_exists(&self, name: &str, corpus: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM docs WHERE name = ?1 AND corpus = ?2
            );",
            params![name, corpus],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn get_doc_info(&self, id: DocId) -> RepoResult<Option<DocumentInfo>> {
        let info = self
            .conn
            .query_row(
                "SELECT name, corpus, filename, status, assignee_username, mode, schema
                 FROM docs
                 WHERE id = ?1;",
                [id],
                |row| {
                    Ok(DocumentInfo {
                        name: text(row, "name")?,
                        corpus: text(row, "corpus")?,
                        filename: text(row, "filename")?,
                        status: text(row, "status")?,
                        assignee: text(row, "assignee_username")?,
                        mode: text(row, "mode")?,
                        schema: text(row, "schema")?,
                    })
                },
            )
            .optional()?;
        Ok(info)
    }

    fn get_document(&self, id: DocId) -> RepoResult<Option<Document>> {
        let doc = self
            .conn
            .query_row(
                "SELECT
                    id,
                    name,
                    corpus,
                    status,
                    assignee_username,
                    filename,
                    content,
                    mode,
                    schema,
                    validation,
                    timestamp,
                    cache
                 FROM docs
                 WHERE id = ?1;",
                [id],
                parse_document_row,
            )
            .optional()?;
        Ok(doc)
    }

    fn get_doc_content(&self, id: DocId) -> RepoResult<String> {
        let content: Option<Option<String>> = self
            .conn
            .query_row("SELECT content FROM docs WHERE id = ?1;", [id], |row| {
                row.get(0)
            })
            .optional()?;
        match content {
            Some(body) => Ok(body.unwrap_or_default()),
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn list_documents(&self, filter: &DocumentFilter) -> RepoResult<Vec<DocumentSummary>> {
        let mut sql = String::from("SELECT id, name, corpus, mode, content FROM docs WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(corpus) = filter.corpus.as_ref() {
            sql.push_str(" AND corpus = ?");
            bind_values.push(Value::Text(corpus.clone()));
        }
        if let Some(status) = filter.status.as_ref() {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.clone()));
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut docs = Vec::new();
        while let Some(row) = rows.next()? {
            docs.push(DocumentSummary {
                id: row.get("id")?,
                name: text(row, "name")?,
                corpus: text(row, "corpus")?,
                mode: text(row, "mode")?,
                content: text(row, "content")?,
            });
        }
        Ok(docs)
    }

    fn get_corpora(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT corpus
             FROM docs
             WHERE corpus IS NOT NULL
             ORDER BY corpus COLLATE NOCASE ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut corpora = Vec::new();
        while let Some(row) = rows.next()? {
            corpora.push(row.get(0)?);
        }
        Ok(corpora)
    }

    fn update_assignee(&self, id: DocId, assignee: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE docs SET assignee_username = ?1 WHERE id = ?2;",
            id,
            Some(assignee),
            false,
        )
    }

    fn update_status(&self, id: DocId, status: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE docs SET status = ?1 WHERE id = ?2;",
            id,
            Some(status),
            false,
        )
    }

    fn update_filename(&self, id: DocId, filename: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE docs SET filename = ?1 WHERE id = ?2;",
            id,
            Some(filename),
            false,
        )
    }

    fn update_mode(&self, id: DocId, mode: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE docs SET mode = ?1 WHERE id = ?2;",
            id,
            Some(mode),
            false,
        )
    }

    fn update_schema(&self, id: DocId, schema: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE docs SET schema = ?1 WHERE id = ?2;",
            id,
            Some(schema),
            false,
        )
    }

    fn update_docname(&self, id: DocId, name: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE docs SET name = ?1 WHERE id = ?2;",
            id,
            Some(name),
            true,
        )
    }

    fn update_corpus(&self, id: DocId, corpus: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE docs SET corpus = ?1 WHERE id = ?2;",
            id,
            Some(corpus),
            true,
        )
    }

    fn save_content(&self, id: DocId, content: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE docs SET content = ?1 WHERE id = ?2;",
            id,
            Some(content),
            true,
        )
    }

    fn update_validation(&self, id: DocId, validation: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE docs SET validation = ?1 WHERE id = ?2;",
            id,
            Some(validation),
            false,
        )
    }

    fn update_timestamp(&self, id: DocId, timestamp: &str) -> RepoResult<()> {
        self.update_field(
            "UPDATE docs SET timestamp = ?1 WHERE id = ?2;",
            id,
            Some(timestamp),
            false,
        )
    }

    fn get_cache(&self, id: DocId) -> RepoResult<Option<String>> {
        let cache: Option<Option<String>> = self
            .conn
            .query_row("SELECT cache FROM docs WHERE id = ?1;", [id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(cache.flatten())
    }

    fn set_cache(&self, id: DocId, cache: Option<&str>) -> RepoResult<()> {
        self.update_field("UPDATE docs SET cache = ?1 WHERE id = ?2;", id, cache, false)
    }

    fn delete_doc(&self, id: DocId) -> RepoResult<()> {
        let (docs_removed, meta_removed) = run_scoped(self.conn, |conn| {
            let docs_removed = conn.execute("DELETE FROM docs WHERE id = ?1;", [id])?;
            let meta_removed = conn.execute("DELETE FROM metadata WHERE docid = ?1;", [id])?;
            Ok::<_, RepoError>((docs_removed, meta_removed))
        })?;
        info!(
            "event=doc_delete module=repo status=ok docs_removed={} meta_removed={}",
            docs_removed, meta_removed
        );
        Ok(())
    }
}

/// Resolves the corpus name of one document.
///
/// The outer `None` means the document does not exist; the inner one means
/// its `corpus` column is `NULL`.
pub(crate) fn corpus_of(
    conn: &Connection,
    id: DocId,
) -> rusqlite::Result<Option<Option<String>>> {
    conn.query_row("SELECT corpus FROM docs WHERE id = ?1;", [id], |row| {
        row.get(0)
    })
    .optional()
}

/// Reads a nullable text column, mapping `NULL` to an empty string.
pub(crate) fn text(row: &Row<'_>, column: &str) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
}

fn parse_document_row(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: row.get("id")?,
        name: text(row, "name")?,
        corpus: text(row, "corpus")?,
        status: text(row, "status")?,
        assignee: text(row, "assignee_username")?,
        filename: text(row, "filename")?,
        content: text(row, "content")?,
        mode: text(row, "mode")?,
        schema: text(row, "schema")?,
        validation: row.get("validation")?,
        timestamp: row.get("timestamp")?,
        cache: row.get("cache")?,
    })
}
