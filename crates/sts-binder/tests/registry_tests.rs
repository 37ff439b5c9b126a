//! Tests for the semantic registry.

use sts_binder::{FileSnapshot, NamePartition, SemanticRegistry, SymbolId};
use sts_common::{Diagnostic, Span};
use sts_parser::NodeIndex;

fn snapshot(path: &str, version: u32, text: &str) -> FileSnapshot {
    FileSnapshot::new(path, version, text)
}

#[test]
fn test_get_or_create_reuses_unchanged_entry() {
    let mut registry = SemanticRegistry::new();
    let a = snapshot("a.ts", 1, "var x = 1;");
    let first = registry.get_or_create_file_entry(&a);
    let second = registry.get_or_create_file_entry(&a);
    assert_eq!(first, second);

    let edited = snapshot("a.ts", 2, "var x = 2;");
    let third = registry.get_or_create_file_entry(&edited);
    assert_ne!(first, third);
    assert_eq!(registry.file_count(), 1);
}

#[test]
fn test_stale_declaration_ids_are_inert() {
    let mut registry = SemanticRegistry::new();
    registry.update_file_set(&[snapshot("a.ts", 1, "var x = 1;")]);
    let old = registry.find_global("x", NamePartition::Value)[0];
    assert!(registry.declaration(old).is_some());

    registry.update_file_set(&[snapshot("a.ts", 2, "var y = 1;\nvar x = 1;")]);
    assert!(registry.declaration(old).is_none());
    assert!(registry.parent_path(old).is_none());
    let new = registry.find_global("x", NamePartition::Value)[0];
    assert_ne!(old, new);
}

#[test]
fn test_update_file_set_diff() {
    let mut registry = SemanticRegistry::new();
    registry.update_file_set(&[
        snapshot("a.ts", 1, "var a = 1;"),
        snapshot("b.ts", 1, "var b = 1;"),
        snapshot("c.ts", 1, "var c = 1;"),
    ]);
    let b_id = registry.entry("b.ts").unwrap().id;

    let change = registry.update_file_set(&[
        snapshot("c.ts", 2, "var c = 2;"),
        snapshot("b.ts", 1, "var b = 1;"),
        snapshot("d.ts", 1, "var d = 1;"),
    ]);
    assert_eq!(change.added, vec!["d.ts".to_string()]);
    assert_eq!(change.changed, vec!["c.ts".to_string()]);
    assert_eq!(change.removed, vec!["a.ts".to_string()]);
    assert_eq!(change.unchanged, vec!["b.ts".to_string()]);

    assert_eq!(registry.entry("b.ts").unwrap().id, b_id);
    let order: Vec<&str> = registry.files().map(|e| e.path.as_str()).collect();
    assert_eq!(order, vec!["c.ts", "b.ts", "d.ts"]);
    assert!(registry.find_global("a", NamePartition::Value).is_empty());
}

#[test]
fn test_symbol_maps_cleared_on_any_change() {
    let mut registry = SemanticRegistry::new();
    registry.update_file_set(&[
        snapshot("a.ts", 1, "var a = 1;"),
        snapshot("b.ts", 1, "var b = 1;"),
    ]);
    let a = registry.find_global("a", NamePartition::Value)[0];
    registry.record_declaration_symbol(a, SymbolId(7));
    assert_eq!(registry.symbol_for_declaration(a), Some(SymbolId(7)));
    let node = registry.declaration(a).unwrap().node;
    assert_eq!(registry.symbol_for(a.file, node), Some(SymbolId(7)));

    let generation = registry.symbol_generation();
    let change = registry.update_file_set(&[
        snapshot("a.ts", 1, "var a = 1;"),
        snapshot("b.ts", 2, "var b = 2;"),
    ]);
    assert_eq!(change.unchanged, vec!["a.ts".to_string()]);
    // a.ts keeps its tree but loses its symbols.
    assert!(registry.declaration(a).is_some());
    assert_eq!(registry.symbol_for_declaration(a), None);
    assert!(registry.symbol_generation() > generation);

    // No change, no invalidation.
    let generation = registry.symbol_generation();
    registry.update_file_set(&[
        snapshot("a.ts", 1, "var a = 1;"),
        snapshot("b.ts", 2, "var b = 2;"),
    ]);
    assert_eq!(registry.symbol_generation(), generation);
}

#[test]
fn test_invalidate_one_and_all() {
    let mut registry = SemanticRegistry::new();
    registry.update_file_set(&[
        snapshot("a.ts", 1, "var a = 1;"),
        snapshot("b.ts", 1, "var b = 1;"),
    ]);
    registry.invalidate(Some("a.ts"));
    assert!(registry.entry("a.ts").is_none());
    assert!(registry.entry("b.ts").is_some());
    registry.invalidate(None);
    assert_eq!(registry.file_count(), 0);
}

#[test]
fn test_find_global_follows_file_order() {
    let mut registry = SemanticRegistry::new();
    registry.update_file_set(&[
        snapshot("b.ts", 1, "interface Shared { b: number; }"),
        snapshot("a.ts", 1, "interface Shared { a: number; }"),
    ]);
    let found = registry.find_global("Shared", NamePartition::Type);
    let files: Vec<&str> = found
        .iter()
        .map(|&id| registry.file_name_of(id).unwrap())
        .collect();
    assert_eq!(files, vec!["b.ts", "a.ts"]);
}

#[test]
fn test_parent_path_is_memoized() {
    let mut registry = SemanticRegistry::new();
    registry.update_file_set(&[snapshot("a.ts", 1, "module M { class C { m() {} } }")]);
    let m = registry.find_global("M", NamePartition::Container)[0];
    let tree = &registry.entry("a.ts").unwrap().tree;
    let c = tree.lookup(m, NamePartition::Type, "C")[0];
    let method = tree.lookup(c, NamePartition::Value, "m")[0];

    let path = registry.parent_path(method).unwrap();
    assert_eq!(path.len(), 4);
    assert!(path[0].is_root());
    assert_eq!(&path[1..], &[m, c, method]);
    let again = registry.parent_path(method).unwrap();
    assert!(std::rc::Rc::ptr_eq(&path, &again));
}

#[test]
fn test_diagnostics_and_lookup_by_node() {
    let mut registry = SemanticRegistry::new();
    let id = registry.get_or_create_file_entry(&snapshot("a.ts", 1, "var a = 1;\nvar a = 2;"));
    let entry = registry.entry_by_id(id).unwrap();
    assert_eq!(entry.declaration_diagnostics().len(), 1);
    assert!(entry.syntax_diagnostics().is_empty());
    assert_eq!(
        registry.declaration_for(id, entry.parsed.root),
        Some(entry.tree.root())
    );
    assert_eq!(registry.declaration_for(id, NodeIndex::NONE), None);

    registry.add_diagnostic(Some("a.ts"), Diagnostic::error("a.ts", Span::new(0, 1), 2322, vec![]));
    registry.add_diagnostic(None, Diagnostic::global(5012, vec!["x".into(), "y".into()]));
    assert_eq!(registry.entry("a.ts").unwrap().diagnostics().len(), 1);
    assert_eq!(registry.global_diagnostics().len(), 1);
    registry.clear_check_diagnostics();
    assert!(registry.entry("a.ts").unwrap().diagnostics().is_empty());
}

#[test]
fn test_global_declaration_has_no_file() {
    let registry = SemanticRegistry::new();
    let global = registry.global_declaration();
    assert_eq!(global.kind, sts_binder::DeclKind::Script);
    assert!(global.parent.is_none());
}
