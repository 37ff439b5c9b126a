//! Tests for the recursive-descent parser.

use sts_common::diagnostics::diagnostic_codes;
use sts_parser::{ModifierFlags, NodeData, NodeIndex, ParsedFile, SyntaxKind};

fn parse(source: &str) -> ParsedFile {
    ParsedFile::parse("test.ts", source)
}

fn statements(file: &ParsedFile) -> Vec<NodeIndex> {
    match file.arena.data(file.root) {
        NodeData::SourceFile { statements, .. } => statements.iter().collect(),
        other => panic!("expected source file, got {other:?}"),
    }
}

fn find_kind(file: &ParsedFile, kind: SyntaxKind) -> Vec<NodeIndex> {
    (0..file.arena.len() as u32)
        .map(NodeIndex)
        .filter(|&idx| file.arena.kind(idx) == Some(kind))
        .collect()
}

#[test]
fn test_declarations_parse_without_errors() {
    let file = parse(
        r#"
module Shapes {
    export interface Point { x: number; y?: number; [key: string]: any; }
    export class Circle implements Point {
        static count: number = 0;
        constructor(public x: number, private r: number) {}
        area(): number { return this.r * this.r; }
    }
    export enum Color { Red, Green = 2, Blue }
}
declare var ambient: string;
function overloaded(a: number): number;
function overloaded(a: string): string;
function overloaded(a: any): any { return a; }
"#,
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    assert_eq!(statements(&file).len(), 5);
    assert_eq!(find_kind(&file, SyntaxKind::FunctionDeclaration).len(), 3);
    assert_eq!(find_kind(&file, SyntaxKind::Constructor).len(), 1);
    assert_eq!(find_kind(&file, SyntaxKind::IndexSignature).len(), 1);
}

#[test]
fn test_declare_modifier_is_recorded() {
    let file = parse("declare var ambient: string;\nvar declare = 1;");
    assert!(file.diagnostics.is_empty());
    let stmts = statements(&file);
    assert!(file.arena.flags(stmts[0]).contains(ModifierFlags::DECLARE));
    assert!(!file.arena.flags(stmts[1]).contains(ModifierFlags::DECLARE));
}

#[test]
fn test_dotted_module_desugars_to_nested_modules() {
    let file = parse("module A.B.C { var x = 1; }");
    assert!(file.diagnostics.is_empty());
    let stmts = statements(&file);
    assert_eq!(stmts.len(), 1);
    let NodeData::Module { name, body } = file.arena.data(stmts[0]) else {
        panic!("expected module");
    };
    assert_eq!(file.arena.identifier_text(*name), Some("A"));
    let inner = body.nodes[0];
    assert_eq!(file.arena.kind(inner), Some(SyntaxKind::ModuleDeclaration));
    assert!(file.arena.flags(inner).contains(ModifierFlags::EXPORT));
    assert_eq!(find_kind(&file, SyntaxKind::ModuleDeclaration).len(), 3);
}

#[test]
fn test_tuple_rest_start_marker() {
    let file = parse(
        "var a: [number, string];\nvar b: [number, ...string];\nvar c: [...string, number];",
    );
    assert!(file.diagnostics.is_empty());
    let rests: Vec<(usize, Option<u32>)> = find_kind(&file, SyntaxKind::TupleType)
        .into_iter()
        .map(|idx| match file.arena.data(idx) {
            NodeData::TupleType {
                elements,
                rest_start,
            } => (elements.len(), *rest_start),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(rests, vec![(2, None), (2, Some(1)), (2, Some(0))]);
}

#[test]
fn test_second_rest_marker_is_an_error() {
    let file = parse("var a: [...number, ...string];");
    assert_eq!(file.diagnostics.len(), 1);
    assert_eq!(file.diagnostics[0].code, diagnostic_codes::TYPE_EXPECTED);
}

#[test]
fn test_function_type_versus_parenthesized_type() {
    let file = parse("var f: (a: number) => string;\nvar g: (number)[];\nvar h: () => void;");
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    assert_eq!(find_kind(&file, SyntaxKind::FunctionType).len(), 2);
    assert_eq!(find_kind(&file, SyntaxKind::ArrayType).len(), 1);
}

#[test]
fn test_generic_type_references_and_qualified_names() {
    let file = parse("var b: Box<Box<number>>;\nvar p: Shapes.Point;");
    assert!(file.diagnostics.is_empty());
    assert_eq!(find_kind(&file, SyntaxKind::TypeReference).len(), 3);
    let qualified = find_kind(&file, SyntaxKind::QualifiedName);
    assert_eq!(qualified.len(), 1);
    assert_eq!(
        file.arena.entity_name_text(qualified[0]).as_deref(),
        Some("Shapes.Point")
    );
}

#[test]
fn test_binary_precedence() {
    let file = parse("x = 1 + 2 * 3;");
    assert!(file.diagnostics.is_empty());
    let stmt = statements(&file)[0];
    let NodeData::ExpressionStatement { expression } = file.arena.data(stmt) else {
        panic!("expected expression statement");
    };
    let NodeData::Binary {
        operator, right, ..
    } = file.arena.data(*expression)
    else {
        panic!("expected assignment");
    };
    assert_eq!(*operator, SyntaxKind::EqualsToken);
    let NodeData::Binary {
        operator, right, ..
    } = file.arena.data(*right)
    else {
        panic!("expected addition");
    };
    assert_eq!(*operator, SyntaxKind::PlusToken);
    assert!(matches!(
        file.arena.data(*right),
        NodeData::Binary {
            operator: SyntaxKind::AsteriskToken,
            ..
        }
    ));
}

#[test]
fn test_expressions_parse() {
    let file = parse(
        r#"
var o = { a: 1, "b": "two", m(x: number) { return x; } };
var t = [1, "a", true];
var c = new Circle(1, 2).area();
var e = <any>o.a[0];
var f = function (x) { return !x; };
if (c > 1 && c < 3) { c = -c; } else c = 0;
while (false) ;
"#,
    );
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    assert_eq!(find_kind(&file, SyntaxKind::NewExpression).len(), 1);
    assert_eq!(find_kind(&file, SyntaxKind::TypeAssertionExpression).len(), 1);
    assert_eq!(find_kind(&file, SyntaxKind::FunctionExpression).len(), 2);
    assert_eq!(find_kind(&file, SyntaxKind::ElementAccessExpression).len(), 1);
}

#[test]
fn test_new_callee_excludes_call_suffix() {
    let file = parse("new A.B(1).c;");
    let news = find_kind(&file, SyntaxKind::NewExpression);
    assert_eq!(news.len(), 1);
    let NodeData::Call { callee, arguments } = file.arena.data(news[0]) else {
        panic!("expected new payload");
    };
    assert_eq!(arguments.len(), 1);
    assert_eq!(
        file.arena.kind(*callee),
        Some(SyntaxKind::PropertyAccessExpression)
    );
}

#[test]
fn test_missing_tokens_report_and_recover() {
    let file = parse("var x: number = ;\nvar y = 1;\nclass { }\nvar z: = 2;");
    let codes: Vec<u32> = file.diagnostics.iter().map(|d| d.code).collect();
    assert!(codes.contains(&diagnostic_codes::EXPRESSION_EXPECTED));
    assert!(codes.contains(&diagnostic_codes::IDENTIFIER_EXPECTED));
    assert!(codes.contains(&diagnostic_codes::TYPE_EXPECTED));
    // Recovery keeps later declarations.
    assert_eq!(find_kind(&file, SyntaxKind::VariableDeclaration).len(), 3);
}

#[test]
fn test_unexpected_token_at_statement_level() {
    let file = parse("var a = 1;\n) var b = 2;");
    assert_eq!(file.diagnostics.len(), 1);
    assert_eq!(
        file.diagnostics[0].code,
        diagnostic_codes::DECLARATION_OR_STATEMENT_EXPECTED
    );
    assert_eq!(find_kind(&file, SyntaxKind::VariableDeclaration).len(), 2);
}

#[test]
fn test_missing_close_paren_reports_token_expected() {
    let file = parse("foo(1, 2;");
    assert_eq!(file.diagnostics[0].code, diagnostic_codes::TOKEN_EXPECTED);
    assert_eq!(file.diagnostics[0].args, vec![")".to_string()]);
}

#[test]
fn test_scanner_errors_become_diagnostics() {
    let file = parse("var s = 'open\nvar t = 1;");
    assert!(
        file.diagnostics
            .iter()
            .any(|d| d.code == diagnostic_codes::UNTERMINATED_STRING_LITERAL)
    );
}

#[test]
fn test_spans_cover_declarations() {
    let source = "var x = 1;\nclass C {}";
    let file = parse(source);
    let stmts = statements(&file);
    let class_span = file.arena.span(stmts[1]);
    assert_eq!(&source[class_span.start as usize..class_span.end as usize], "class C {}");
    assert_eq!(file.line_map.position_of(class_span.start).line, 2);
}
