//! Tests for diagnostic construction and catalog formatting.

use sts_common::diagnostics::{diagnostic_codes, format_message};
use sts_common::{Diagnostic, DiagnosticCategory, MessageCatalog, Span};

#[test]
fn test_format_message_replaces_placeholders_in_order() {
    assert_eq!(
        format_message("Type '{0}' is not assignable to type '{1}'.", &["string", "number"]),
        "Type 'string' is not assignable to type 'number'."
    );
}

#[test]
fn test_category_comes_from_message_table() {
    let error = Diagnostic::new(
        Some("a.ts"),
        Span::new(0, 1),
        diagnostic_codes::CANNOT_FIND_NAME,
        vec!["x".into()],
    );
    assert_eq!(error.category, DiagnosticCategory::Error);

    let warning = Diagnostic::new(
        Some("a.ts"),
        Span::new(0, 1),
        diagnostic_codes::ANY_FLOWS_INTO_TYPED_POSITION,
        vec!["number".into()],
    );
    assert_eq!(warning.category, DiagnosticCategory::Warning);
    assert!(!warning.is_error());
}

#[test]
fn test_english_catalog_renders_arguments() {
    let catalog = MessageCatalog::english();
    let diag = Diagnostic::error(
        "a.ts",
        Span::new(4, 5),
        diagnostic_codes::CANNOT_FIND_NAME,
        vec!["foo".into()],
    );
    assert_eq!(diag.message_text(&catalog), "Cannot find name 'foo'.");
}

#[test]
fn test_locale_catalog_overrides_only_translated_codes() {
    let catalog = MessageCatalog::from_locale_json(
        "DE",
        r#"{ "Cannot_find_name_0_2304": "Der Name \"{0}\" wurde nicht gefunden.", "bogus": 3 }"#,
    )
    .expect("valid locale json");

    assert_eq!(catalog.locale_id(), Some("de"));
    assert!(catalog.has_translation(2304));
    assert_eq!(
        catalog.format(2304, &["x".to_string()]),
        "Der Name \"x\" wurde nicht gefunden."
    );
    // Untranslated codes fall back to English.
    assert_eq!(
        catalog.format(2300, &["x".to_string()]),
        "Duplicate identifier 'x'."
    );
}

#[test]
fn test_locale_catalog_rejects_non_object_json() {
    assert!(MessageCatalog::from_locale_json("de", "[1, 2]").is_none());
    assert!(MessageCatalog::from_locale_json("de", "not json").is_none());
}

#[test]
fn test_global_diagnostic_has_no_file() {
    let diag = Diagnostic::global(diagnostic_codes::CANNOT_READ_FILE, vec!["lib.d.ts".into(), "missing".into()]);
    assert!(diag.file.is_none());
    assert_eq!(
        diag.message_text(&MessageCatalog::english()),
        "Cannot read file 'lib.d.ts': missing."
    );
}
