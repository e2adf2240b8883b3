//! Domain model for documents, their metadata and validation rules.
//!
//! # Responsibility
//! - Define the records exchanged between repositories and callers.
//! - Keep column-name mapping out of the public shape.
//!
//! # Invariants
//! - Document ids are assigned by the caller, never generated by storage.
//! - A metadata entry is scoped to exactly one of document or corpus.
//! - Validation rules match documents by pattern, not by foreign key.

pub mod document;
pub mod metadata;
pub mod rule;
