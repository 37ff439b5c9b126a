//! Common types and utilities for the sts compiler.
//!
//! This crate provides foundational types used across all sts crates:
//! - Source spans (`Span`)
//! - Line maps for offset -> 1-based line/character conversion
//! - Diagnostics, message codes and the immutable `MessageCatalog`
//! - Compiler limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::Span;

// Position types for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, MessageCatalog};

// Centralized limits and thresholds
pub mod limits;
