//! Tests for the declaration tree builder.

use sts_binder::declaration::internal_names;
use sts_binder::{
    BuildResult, DeclFlags, DeclId, DeclKind, DeclarationBuilder, DeclarationTree, FileId,
    NamePartition,
};
use sts_common::diagnostics::diagnostic_codes;
use sts_parser::ParsedFile;

fn build(source: &str) -> (ParsedFile, BuildResult) {
    let parsed = ParsedFile::parse("test.ts", source);
    assert!(parsed.diagnostics.is_empty(), "{:?}", parsed.diagnostics);
    let result = DeclarationBuilder::new(FileId(1), "test.ts", &parsed.arena).build(parsed.root);
    (parsed, result)
}

fn only(tree: &DeclarationTree, parent: DeclId, partition: NamePartition, name: &str) -> DeclId {
    let found = tree.lookup(parent, partition, name);
    assert_eq!(found.len(), 1, "expected one '{name}' in {partition:?}");
    found[0]
}

#[test]
fn test_root_carries_file_name() {
    let (_, result) = build("var x = 1;");
    let tree = &result.tree;
    let root = tree.get(tree.root()).unwrap();
    assert_eq!(root.kind, DeclKind::Script);
    let x = only(tree, tree.root(), NamePartition::Value, "x");
    assert_eq!(tree.file_name_of(x), Some("test.ts"));
    assert_eq!(tree.root_of(x), tree.root());
}

#[test]
fn test_partitions_by_kind() {
    let (_, result) = build(
        r#"
class C {}
interface I {}
enum E { A }
module M { export var v = 1; }
module Types { interface T {} }
function f<T>(p: T) {}
"#,
    );
    let tree = &result.tree;
    let root = tree.root();
    assert_eq!(tree.lookup(root, NamePartition::Type, "C").len(), 1);
    assert!(tree.lookup(root, NamePartition::Value, "C").is_empty());
    assert_eq!(tree.lookup(root, NamePartition::Type, "I").len(), 1);
    for partition in [NamePartition::Type, NamePartition::Container, NamePartition::Value] {
        assert_eq!(tree.lookup(root, partition, "E").len(), 1);
    }
    assert_eq!(tree.lookup(root, NamePartition::Container, "M").len(), 1);
    assert_eq!(tree.lookup(root, NamePartition::Value, "M").len(), 1);
    // Uninstantiated module is not a value.
    assert_eq!(tree.lookup(root, NamePartition::Container, "Types").len(), 1);
    assert!(tree.lookup(root, NamePartition::Value, "Types").is_empty());

    let f = only(tree, root, NamePartition::Value, "f");
    assert_eq!(tree.lookup(f, NamePartition::TypeParameter, "T").len(), 1);
    assert_eq!(tree.lookup(f, NamePartition::Value, "p").len(), 1);
}

#[test]
fn test_class_and_value_share_a_name() {
    let (_, result) = build("class Point { x: number; }\nvar Point = 5;");
    assert!(result.diagnostics.is_empty());
    let tree = &result.tree;
    let ty = only(tree, tree.root(), NamePartition::Type, "Point");
    let value = only(tree, tree.root(), NamePartition::Value, "Point");
    assert_eq!(tree.get(ty).unwrap().kind, DeclKind::Class);
    assert_eq!(tree.get(value).unwrap().kind, DeclKind::Variable);
}

#[test]
fn test_class_members() {
    let (_, result) = build(
        r#"
class C {
    static count: number;
    name: string;
    constructor(public x: number, private y?: number) {}
    m(): void {}
    [key: string]: any;
}
"#,
    );
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    let tree = &result.tree;
    let class = only(tree, tree.root(), NamePartition::Type, "C");

    let count = tree.get(only(tree, class, NamePartition::Value, "count")).unwrap();
    assert!(count.has(DeclFlags::PROPERTY | DeclFlags::STATIC));

    let x = tree.get(only(tree, class, NamePartition::Value, "x")).unwrap();
    assert_eq!(x.kind, DeclKind::Variable);
    assert!(x.has(DeclFlags::PROPERTY | DeclFlags::PUBLIC));
    let y = tree.get(only(tree, class, NamePartition::Value, "y")).unwrap();
    assert!(y.has(DeclFlags::PRIVATE | DeclFlags::OPTIONAL));

    let m = tree.get(only(tree, class, NamePartition::Value, "m")).unwrap();
    assert_eq!(m.kind, DeclKind::Function);
    assert!(m.has(DeclFlags::METHOD));
    assert!(!m.has(DeclFlags::SIGNATURE));

    let ctors = tree.group(class, internal_names::NEW, DeclKind::ConstructSignature);
    assert_eq!(ctors.len(), 1);
    let ctor = tree.get(ctors[0]).unwrap();
    assert!(ctor.has(DeclFlags::CONSTRUCTOR));
    // Constructor parameters live under the constructor.
    assert_eq!(tree.children_of_kind(ctors[0], DeclKind::Parameter).len(), 2);
    assert_eq!(tree.children_of_kind(class, DeclKind::IndexSignature).len(), 1);
}

#[test]
fn test_overloads_form_a_group() {
    let (_, result) = build(
        "function f(a: number): number;\nfunction f(a: string): string;\nfunction f(a: any): any { return a; }",
    );
    assert!(result.diagnostics.is_empty());
    let tree = &result.tree;
    let group = tree.group(tree.root(), "f", DeclKind::Function);
    assert_eq!(group.len(), 3);
    let signatures: Vec<bool> = group
        .iter()
        .map(|&id| tree.get(id).unwrap().has(DeclFlags::SIGNATURE))
        .collect();
    assert_eq!(signatures, vec![true, true, false]);
}

#[test]
fn test_enum_member_ordinals() {
    let (_, result) = build("enum Color { Red, Green = 5, Blue }");
    let tree = &result.tree;
    let color = only(tree, tree.root(), NamePartition::Type, "Color");
    let ordinals: Vec<(String, u32)> = tree
        .children_of_kind(color, DeclKind::EnumMember)
        .into_iter()
        .map(|id| {
            let decl = tree.get(id).unwrap();
            (decl.name.clone(), decl.ordinal)
        })
        .collect();
    assert_eq!(
        ordinals,
        vec![
            ("Red".to_string(), 0),
            ("Green".to_string(), 1),
            ("Blue".to_string(), 2)
        ]
    );
}

#[test]
fn test_duplicate_identifiers() {
    let (_, result) = build(
        r#"
var a = 1;
var a = 2;
interface I { x: number; }
interface I { y: number; }
class K {}
interface K {}
module K { export var z = 1; }
function g(p, p) {}
"#,
    );
    let names: Vec<&str> = result
        .diagnostics
        .iter()
        .inspect(|d| assert_eq!(d.code, diagnostic_codes::DUPLICATE_IDENTIFIER))
        .map(|d| d.args[0].as_str())
        .collect();
    // interface+interface and module+class merge.
    assert_eq!(names, vec!["a", "K", "p"]);
}

#[test]
fn test_static_and_instance_members_do_not_collide() {
    let (_, result) = build("class C { static x: number; x: string; }");
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_ambient_flag_is_inherited() {
    let (_, result) = build("declare module Lib { function f(): void; var v: number; }");
    let tree = &result.tree;
    let lib = only(tree, tree.root(), NamePartition::Container, "Lib");
    let f = tree.get(only(tree, lib, NamePartition::Value, "f")).unwrap();
    assert!(f.has(DeclFlags::AMBIENT | DeclFlags::SIGNATURE));
    let v = tree.get(only(tree, lib, NamePartition::Value, "v")).unwrap();
    assert!(v.has(DeclFlags::AMBIENT));
}

#[test]
fn test_function_expressions_and_escaped_names() {
    let (parsed, result) = build("var f = function () { var inner = 1; };\nvar __proto = 1;");
    let tree = &result.tree;
    let root = tree.root();
    let anon = tree.children_of_kind(root, DeclKind::FunctionExpression);
    assert_eq!(anon.len(), 1);
    let anon_decl = tree.get(anon[0]).unwrap();
    assert_eq!(anon_decl.display_name, "<anonymous>");
    assert_eq!(tree.lookup(anon[0], NamePartition::Value, "inner").len(), 1);
    // Anonymous functions are not visible by name.
    assert!(tree.lookup(root, NamePartition::Value, "__function").is_empty());

    let escaped = only(tree, root, NamePartition::Value, "___proto");
    assert_eq!(tree.get(escaped).unwrap().display_name, "__proto");

    assert_eq!(result.node_decls.get(&anon_decl.node), Some(&anon[0]));
    assert!(anon_decl.span.end as usize <= parsed.arena.span(parsed.root).end as usize);
}
