//! Shared fixtures: build a registry from source text and run both passes.

#![allow(dead_code)]

use sts_binder::{FileSnapshot, SemanticRegistry};
use sts_checker::{CheckerOptions, SoundChecker, TagKind};
use sts_common::Diagnostic;

pub const FILE: &str = "test.ts";

/// Registry over `files`, in order. Panics on syntax errors.
pub fn registry(files: &[(&str, &str)]) -> SemanticRegistry {
    let mut registry = SemanticRegistry::new();
    let snapshots: Vec<FileSnapshot> = files
        .iter()
        .map(|(path, text)| FileSnapshot::new(*path, 1, *text))
        .collect();
    registry.update_file_set(&snapshots);
    for entry in registry.files() {
        assert!(
            entry.syntax_diagnostics().is_empty(),
            "{}: {:?}",
            entry.path,
            entry.syntax_diagnostics()
        );
    }
    registry
}

/// Checker diagnostics and tag annotations of a single checked file.
pub struct Checked {
    pub diagnostics: Vec<Diagnostic>,
    /// (source text of the flagged expression, decision) in walk order.
    pub tags: Vec<(String, TagKind)>,
}

impl Checked {
    pub fn codes(&self) -> Vec<u32> {
        self.diagnostics.iter().map(|d| d.code).collect()
    }

    pub fn tag_of(&self, text: &str) -> Option<TagKind> {
        self.tags
            .iter()
            .find(|(flagged, _)| flagged == text)
            .map(|(_, kind)| *kind)
    }
}

pub fn check(source: &str) -> Checked {
    check_with(source, CheckerOptions::default())
}

pub fn check_with(source: &str, options: CheckerOptions) -> Checked {
    let registry = registry(&[(FILE, source)]);
    let mut checker = SoundChecker::new(&registry, options);
    checker.check_program();

    let entry = registry.entry(FILE).expect("file entry");
    let tags = checker
        .file_tags(entry.id)
        .map(|tags| {
            tags.annotations
                .iter()
                .map(|annotation| {
                    let text = &source[annotation.span.start as usize..annotation.span.end as usize];
                    (text.to_string(), annotation.kind)
                })
                .collect()
        })
        .unwrap_or_default();
    let diagnostics = entry.diagnostics().to_vec();
    Checked { diagnostics, tags }
}

/// Codes of every checker diagnostic, asserting there are no others.
pub fn assert_codes(source: &str, expected: &[u32]) {
    let checked = check(source);
    assert_eq!(checked.codes(), expected, "{:#?}", checked.diagnostics);
}

pub fn assert_clean(source: &str) {
    assert_codes(source, &[]);
}
