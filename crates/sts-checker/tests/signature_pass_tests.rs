//! Tests for pass 1: declared shapes only, independent of file order.

mod support;

use sts_binder::{FileId, NamePartition, SemanticRegistry};
use sts_checker::{CheckerOptions, SoundChecker};
use sts_common::diagnostics::diagnostic_codes;
use support::registry;

const NODE: &str = "interface Node { next: Edge; value: number; }\nclass Tree { root: Edge; size(): number { return 0; } }";
const EDGE: &str = "interface Edge { target: Node; weight: number; }\nclass Walker extends Tree { visit(n: Node): Edge { return n.next; } }";

fn file_ids(registry: &SemanticRegistry) -> Vec<FileId> {
    registry.files().map(|entry| entry.id).collect()
}

fn all_diagnostics(registry: &SemanticRegistry) -> Vec<u32> {
    registry
        .files()
        .flat_map(|entry| entry.diagnostics().iter().map(|d| d.code).collect::<Vec<_>>())
        .collect()
}

/// Member list of `name` as the formatter prints it.
fn members_of(checker: &mut SoundChecker, registry: &SemanticRegistry, name: &str) -> String {
    let decl = registry.find_global(name, NamePartition::Type)[0];
    let symbol = checker.bind_declaration(decl).unwrap();
    let ty = checker.symbol(symbol).and_then(|s| s.declared_type()).unwrap();
    let shape = checker.state_mut().shape_of_type(ty).unwrap();
    shape
        .properties
        .iter()
        .map(|property| format!("{}: {}", property.name, checker.format_type(property.type_id)))
        .collect::<Vec<_>>()
        .join("; ")
}

#[test]
fn test_cross_file_references_resolve_in_either_order() {
    let mut results = Vec::new();
    for files in [[("node.ts", NODE), ("edge.ts", EDGE)], [("edge.ts", EDGE), ("node.ts", NODE)]] {
        let registry = registry(&files);
        let mut checker = SoundChecker::new(&registry, CheckerOptions::default());
        for file in file_ids(&registry) {
            checker.build_signatures(file);
        }
        assert!(all_diagnostics(&registry).is_empty(), "{:?}", all_diagnostics(&registry));

        let shapes = ["Node", "Edge", "Tree", "Walker"]
            .map(|name| members_of(&mut checker, &registry, name));
        results.push(shapes);
    }
    assert_eq!(results[0], results[1]);
    assert_eq!(results[0][0], "next: Edge; value: number");
    // Inherited members come first.
    assert!(results[0][3].starts_with("root: Edge; size: "), "{}", results[0][3]);
    assert!(results[0][3].ends_with("visit: (n: Node) => Edge"), "{}", results[0][3]);
}

#[test]
fn test_signature_pass_does_not_walk_bodies() {
    let registry = registry(&[(
        "a.ts",
        "function f(): number { var s: string = 1; return 1; }\nvar x: number = \"no\";",
    )]);
    let mut checker = SoundChecker::new(&registry, CheckerOptions::default());
    for file in file_ids(&registry) {
        checker.build_signatures(file);
    }
    assert!(all_diagnostics(&registry).is_empty());

    for file in file_ids(&registry) {
        checker.check_file(file);
    }
    assert_eq!(
        all_diagnostics(&registry),
        vec![diagnostic_codes::TYPE_NOT_ASSIGNABLE, diagnostic_codes::TYPE_NOT_ASSIGNABLE]
    );
}

#[test]
fn test_signature_errors_are_reported_once() {
    let registry = registry(&[("a.ts", "function f(x: Missing): Missing { return x; }\nf(1);")]);
    let mut checker = SoundChecker::new(&registry, CheckerOptions::default());
    checker.check_program();
    assert_eq!(
        all_diagnostics(&registry),
        vec![diagnostic_codes::CANNOT_FIND_NAME, diagnostic_codes::CANNOT_FIND_NAME]
    );
}

#[test]
#[should_panic(expected = "check pass started before signatures were built")]
fn test_check_before_all_files_are_built_panics() {
    let registry = registry(&[("a.ts", "var a = 1;"), ("b.ts", "var b = 2;")]);
    let mut checker = SoundChecker::new(&registry, CheckerOptions::default());
    let files = file_ids(&registry);
    checker.build_signatures(files[0]);
    checker.check_file(files[0]);
}

#[test]
fn test_non_sound_mode_builds_shapes_only() {
    let registry = registry(&[("a.ts", "interface I { x: Missing; }\nvar n: number = \"s\";")]);
    let options = CheckerOptions {
        sound: false,
        ..CheckerOptions::default()
    };
    let mut checker = SoundChecker::new(&registry, options);
    checker.check_program();
    assert_eq!(all_diagnostics(&registry), vec![diagnostic_codes::CANNOT_FIND_NAME]);
    let file = file_ids(&registry)[0];
    assert!(checker.file_tags(file).is_none());
}
