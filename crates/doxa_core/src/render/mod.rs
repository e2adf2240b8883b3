//! HTML fragments built from stored records.
//!
//! # Responsibility
//! - Produce markup snippets consumed by editor page templates.
//! - Escape every stored value before it reaches markup.

pub mod meta_table;
