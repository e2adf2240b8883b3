//! Validation invalidation statements.
//!
//! # Responsibility
//! - Clear cached `docs.validation` so the external engine recomputes it.
//! - Map a rule domain to the set of documents it can affect.
//!
//! # Invariants
//! - Invalidation only ever writes `NULL` into `validation`; no other
//!   column is touched.
//! - Rule-driven invalidation over-approximates: a `meta` rule clears every
//!   document, any other domain clears every `ether` document.

use crate::db::{run_scoped, DbResult};
use crate::model::document::{DocId, ETHER_MODE};
use crate::model::rule::RuleDomain;
use log::debug;
use rusqlite::{params, Connection};

/// Pattern matching every document name or corpus.
pub const MATCH_ALL: &str = "%";

/// Clears validation for one document. Returns the number of rows touched.
pub fn invalidate_doc_by_id(conn: &Connection, id: DocId) -> DbResult<usize> {
    run_scoped(conn, |conn| {
        let changed = conn.execute("UPDATE docs SET validation = NULL WHERE id = ?1;", [id])?;
        Ok(changed)
    })
}

/// Clears validation for documents whose name and corpus match the given
/// `LIKE` patterns.
pub fn invalidate_doc_by_name(
    conn: &Connection,
    doc_pattern: &str,
    corpus_pattern: &str,
) -> DbResult<usize> {
    run_scoped(conn, |conn| {
        let changed = conn.execute(
            "UPDATE docs
             SET validation = NULL
             WHERE name LIKE ?1
               AND corpus LIKE ?2;",
            params![doc_pattern, corpus_pattern],
        )?;
        debug!(
            "event=invalidate module=repo status=ok scope=by_name changed={}",
            changed
        );
        Ok(changed)
    })
}

/// Like [`invalidate_doc_by_name`], restricted to `ether`-mode documents.
pub fn invalidate_ether_docs(
    conn: &Connection,
    doc_pattern: &str,
    corpus_pattern: &str,
) -> DbResult<usize> {
    run_scoped(conn, |conn| {
        let changed = conn.execute(
            "UPDATE docs
             SET validation = NULL
             WHERE name LIKE ?1
               AND corpus LIKE ?2
               AND mode = ?3;",
            params![doc_pattern, corpus_pattern, ETHER_MODE],
        )?;
        debug!(
            "event=invalidate module=repo status=ok scope=ether changed={}",
            changed
        );
        Ok(changed)
    })
}

/// Clears validation on every document a rule of `domain` can affect.
pub fn invalidate_for_rule_domain(conn: &Connection, domain: RuleDomain) -> DbResult<usize> {
    if domain.invalidates_all_documents() {
        invalidate_doc_by_name(conn, MATCH_ALL, MATCH_ALL)
    } else {
        invalidate_ether_docs(conn, MATCH_ALL, MATCH_ALL)
    }
}
