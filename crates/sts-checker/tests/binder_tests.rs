//! Tests for binding declarations to symbols.

mod support;

use sts_binder::NamePartition;
use sts_checker::{CheckerOptions, Meaning, SoundChecker, SymbolKind};
use sts_common::diagnostics::diagnostic_codes;
use sts_solver::TypeId;
use support::{FILE, assert_clean, assert_codes, check, registry};

#[test]
fn test_binding_is_idempotent() {
    let registry = registry(&[(FILE, "class C { x: number; }\nfunction f() {}")]);
    let mut checker = SoundChecker::new(&registry, CheckerOptions::default());
    for (name, partition) in [("C", NamePartition::Type), ("f", NamePartition::Value)] {
        let decl = registry.find_global(name, partition)[0];
        let first = checker.bind_declaration(decl).unwrap();
        let second = checker.bind_declaration(decl).unwrap();
        assert_eq!(first, second, "{name}");
        assert_eq!(registry.symbol_for_declaration(decl), Some(first));
    }
}

#[test]
fn test_type_and_value_names_do_not_collide() {
    let source = "class Foo { x: number; }\nvar Foo = 1;\nvar a: Foo;\nvar n: number = Foo;";
    let registry = registry(&[(FILE, source)]);
    let mut checker = SoundChecker::new(&registry, CheckerOptions::default());
    checker.check_program();
    assert!(registry.entry(FILE).unwrap().diagnostics().is_empty());
    assert!(registry.entry(FILE).unwrap().declaration_diagnostics().is_empty());

    let root = registry.entry(FILE).unwrap().tree.root();
    let as_type = checker.resolve_name(root, "Foo", Meaning::Type).unwrap();
    let as_value = checker.resolve_name(root, "Foo", Meaning::Value).unwrap();
    assert_ne!(as_type, as_value);

    let class = checker.bind_declaration(as_type).unwrap();
    let variable = checker.bind_declaration(as_value).unwrap();
    assert!(matches!(checker.symbol(class).unwrap().kind, SymbolKind::Class(_)));
    assert!(matches!(checker.symbol(variable).unwrap().kind, SymbolKind::Variable(_)));
    assert_eq!(checker.type_of_symbol(variable), TypeId::NUMBER);
}

#[test]
fn test_interfaces_merge_across_files() {
    let registry = registry(&[
        ("a.ts", "interface Point { x: number; }"),
        ("b.ts", "interface Point { y: number; }\nvar p: Point = { x: 1, y: 2 };"),
    ]);
    let mut checker = SoundChecker::new(&registry, CheckerOptions::default());
    checker.check_program();
    for entry in registry.files() {
        assert!(entry.diagnostics().is_empty(), "{}: {:?}", entry.path, entry.diagnostics());
    }

    let decls = registry.find_global("Point", NamePartition::Type);
    assert_eq!(decls.len(), 2);
    let first = checker.bind_declaration(decls[0]).unwrap();
    let second = checker.bind_declaration(decls[1]).unwrap();
    assert_eq!(first, second);
    assert_eq!(checker.symbol(first).unwrap().declarations.len(), 2);
}

#[test]
fn test_overloads_bind_to_one_function() {
    let source = r#"
function over(x: number): number;
function over(x: string): string;
function over(x: any): any { return x; }
var s: string = over("a");
var n: number = over(1);
"#;
    let registry = registry(&[(FILE, source)]);
    let mut checker = SoundChecker::new(&registry, CheckerOptions::default());
    checker.check_program();
    assert!(registry.entry(FILE).unwrap().diagnostics().is_empty());

    let decls = registry.find_global("over", NamePartition::Value);
    assert_eq!(decls.len(), 3);
    let symbol = checker.bind_declaration(decls[0]).unwrap();
    for &decl in &decls[1..] {
        assert_eq!(checker.bind_declaration(decl), Some(symbol));
    }
    match &checker.symbol(symbol).unwrap().kind {
        SymbolKind::Function(function) => {
            assert_eq!(function.overloads.len(), 2);
            assert!(function.implementation.is_some());
            assert_eq!(function.visible_signatures().len(), 2);
        }
        other => panic!("expected a function, got {}", other.name()),
    }
}

#[test]
fn test_generic_instantiation_is_cached() {
    let source = "class Box<T> { value: T; }\nvar a: Box<number>;\nvar b: Box<number>;\nvar c: Box<string>;";
    let registry = registry(&[(FILE, source)]);
    let mut checker = SoundChecker::new(&registry, CheckerOptions::default());
    checker.check_program();

    let class = checker
        .bind_declaration(registry.find_global("Box", NamePartition::Type)[0])
        .unwrap();
    let state = checker.state_mut();
    let number_box = state.instantiate_symbol(class, vec![TypeId::NUMBER]);
    let again = state.instantiate_symbol(class, vec![TypeId::NUMBER]);
    let string_box = state.instantiate_symbol(class, vec![TypeId::STRING]);
    assert_eq!(number_box, again);
    assert_ne!(number_box, string_box);

    let type_of = |checker: &mut SoundChecker, name: &str| {
        let decl = registry.find_global(name, NamePartition::Value)[0];
        let symbol = checker.bind_declaration(decl).unwrap();
        checker.type_of_symbol(symbol)
    };
    let a = type_of(&mut checker, "a");
    let b = type_of(&mut checker, "b");
    let c = type_of(&mut checker, "c");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(checker.format_type(a), "Box<number>");
}

#[test]
fn test_generic_reference_needs_arguments() {
    assert_codes(
        "class Box<T> { value: T; }\nvar b: Box;",
        &[diagnostic_codes::GENERIC_TYPE_REQUIRES_TYPE_ARGUMENTS],
    );
}

#[test]
fn test_unresolved_type_name_reports_once() {
    let checked = check("var a: Missing;\nvar b: number = a;");
    assert_eq!(checked.codes(), vec![diagnostic_codes::CANNOT_FIND_NAME]);
    assert_eq!(checked.diagnostics[0].args, vec!["Missing".to_string()]);
}

#[test]
fn test_self_referencing_initializer() {
    let checked = check("var r = r;");
    assert_eq!(checked.codes(), vec![diagnostic_codes::IMPLICIT_ANY_SELF_REFERENCE]);
}

#[test]
fn test_inheritance_cycle_is_cut() {
    let checked = check("class A extends B { }\nclass B extends A { }\nvar a: A = new A();");
    let cycles = checked
        .codes()
        .into_iter()
        .filter(|&code| code == diagnostic_codes::TYPE_RECURSIVELY_REFERENCES_ITSELF_AS_BASE)
        .count();
    assert_eq!(cycles, 2);
    assert_eq!(checked.codes().len(), 2, "{:#?}", checked.diagnostics);
}

#[test]
fn test_implicit_constructor_inherits_base_parameters() {
    assert_codes(
        r#"
class Base { constructor(public x: number) { } }
class Derived extends Base { }
var d = new Derived(1);
var n: number = d.x;
var e = new Derived();
"#,
        &[diagnostic_codes::SUPPLIED_PARAMETERS_DO_NOT_MATCH],
    );
}

#[test]
fn test_qualified_names_resolve_through_modules() {
    assert_clean(
        r#"
module Shapes {
    export interface Point { x: number; y: number; }
    export var origin: Point = { x: 0, y: 0 };
}
var p: Shapes.Point = Shapes.origin;
var x: number = p.x;
"#,
    );
}
