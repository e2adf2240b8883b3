//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service orchestration.
//! - Own the validation invalidation protocol.
//!
//! # Invariants
//! - Writes that change what a document validates against clear its
//!   `validation` in the same scoped transaction as the write.
//! - Setters and deletes on missing ids are silent no-ops; only reads that
//!   must yield a value report `NotFound`.

pub mod doc_repo;
pub mod invalidation;
pub mod meta_repo;
pub mod rule_repo;
