//! Diagnostic types and message lookup.
//!
//! Diagnostics are data: each one records a file, a byte span, a message
//! code, a category and its ordered interpolation arguments. Message text is
//! produced at formatting time from a `MessageCatalog`, so the same
//! diagnostic can be rendered in any locale.

use serde::Serialize;

mod catalog;
mod data;

pub use catalog::MessageCatalog;
pub use data::{DIAGNOSTIC_MESSAGES, diagnostic_codes, diagnostic_messages};

use crate::span::Span;

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
}

impl DiagnosticCategory {
    pub fn name(self) -> &'static str {
        match self {
            DiagnosticCategory::Warning => "warning",
            DiagnosticCategory::Error => "error",
        }
    }
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// A compiler diagnostic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// `None` for whole-program diagnostics.
    pub file: Option<String>,
    pub span: Span,
    pub code: u32,
    pub category: DiagnosticCategory,
    /// Ordered interpolation arguments for `{0}`, `{1}`, ...
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic whose category comes from the built-in table.
    ///
    /// Unknown codes default to `Error`.
    pub fn new(file: Option<&str>, span: Span, code: u32, args: Vec<String>) -> Self {
        Diagnostic {
            file: file.map(str::to_string),
            span,
            code,
            category: get_diagnostic_category(code).unwrap_or(DiagnosticCategory::Error),
            args,
        }
    }

    /// Create an error diagnostic in `file`.
    pub fn error(file: &str, span: Span, code: u32, args: Vec<String>) -> Self {
        Diagnostic {
            file: Some(file.to_string()),
            span,
            code,
            category: DiagnosticCategory::Error,
            args,
        }
    }

    /// Create a diagnostic that is not tied to a file.
    pub fn global(code: u32, args: Vec<String>) -> Self {
        Diagnostic::new(None, Span::default(), code, args)
    }

    #[must_use]
    pub fn with_category(mut self, category: DiagnosticCategory) -> Self {
        self.category = category;
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }

    /// Message text rendered through `catalog`.
    pub fn message_text(&self, catalog: &MessageCatalog) -> String {
        catalog.format(self.code, &self.args)
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the category for a diagnostic code.
#[must_use]
pub fn get_diagnostic_category(code: u32) -> Option<DiagnosticCategory> {
    get_diagnostic_message(code).map(|m| m.category)
}
