//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep request handlers and the validation engine decoupled from storage details.

pub mod document_service;
pub mod validation_service;
