//! Tests for tuple values flowing into tuple types.

mod support;

use sts_checker::TagKind;
use sts_common::diagnostics::diagnostic_codes;
use support::{assert_clean, assert_codes, check};

#[test]
fn test_order_matters_not_just_element_types() {
    let checked = check("var t: [number, string] = [\"a\", 1];");
    assert_eq!(checked.codes(), vec![diagnostic_codes::TYPE_NOT_ASSIGNABLE]);
    assert_eq!(
        checked.diagnostics[0].args,
        vec!["[string, number]".to_string(), "[number, string]".to_string()]
    );
}

#[test]
fn test_fixed_width_must_match_exactly() {
    let checked = check("var ok: [number, string] = [1, \"a\"];\nvar long: [number, string] = [1, \"a\", true];\nvar short: [number, string] = [1];");
    assert_eq!(
        checked.codes(),
        vec![diagnostic_codes::TUPLE_WIDTH_MISMATCH, diagnostic_codes::TUPLE_WIDTH_MISMATCH]
    );
    assert_eq!(
        checked.diagnostics[0].args,
        vec![
            "[number, string, boolean]".to_string(),
            "3".to_string(),
            "[number, string]".to_string()
        ]
    );
    assert_eq!(checked.diagnostics[1].args[1], "1");
}

#[test]
fn test_rest_tail_accepts_widths_from_rest_start() {
    assert_clean(
        r#"
var one: [number, ...string] = [4];
var two: [number, ...string] = [4, "a"];
var many: [number, ...string] = [4, "a", "b", "c"];
"#,
    );
    assert_codes("var none: [number, ...string] = [];", &[diagnostic_codes::TUPLE_WIDTH_MISMATCH]);
}

#[test]
fn test_rest_tail_element_must_match_some_tail_type() {
    let checked = check("var t: [number, ...string] = [4, \"a\", 5];");
    assert_eq!(checked.codes(), vec![diagnostic_codes::TYPE_NOT_ASSIGNABLE]);
    assert_eq!(checked.diagnostics[0].args, vec!["number".to_string(), "string".to_string()]);
    // Reported at the offending element.
    let span = checked.diagnostics[0].span;
    assert_eq!(span.end - span.start, 1);
}

#[test]
fn test_fixed_prefix_is_strict() {
    assert_codes(
        "var t: [number, boolean, ...string, boolean] = [\"a\", false, \"b\", false];",
        &[diagnostic_codes::TYPE_NOT_ASSIGNABLE],
    );
}

#[test]
fn test_all_rest_tuple_accepts_any_width() {
    assert_clean(
        r#"
var empty: [...string, number] = [];
var one: [...string, number] = ["a"];
var aligned: [...string, number] = ["a", 1, "b", 2];
var unaligned: [...string, number] = ["a", 1, "b"];
"#,
    );
}

#[test]
fn test_end_to_end_tuple_literals() {
    let checked = check(
        r#"
var a: [number, boolean, ...string, boolean] = [4, false, "a", false];
var b: [number, ...string] = [4];
var c: [...string, number] = ["a", "b", "c", 4];
"#,
    );
    assert!(checked.diagnostics.is_empty(), "{:#?}", checked.diagnostics);
    assert_eq!(checked.tag_of("[4, false, \"a\", false]"), Some(TagKind::Tag));
    assert_eq!(checked.tag_of("[4]"), Some(TagKind::Tag));
    // "b" sits in the number slot of the cycle but matches the string slot,
    // so the value is checked when it is admitted.
    assert_eq!(checked.tag_of("[\"a\", \"b\", \"c\", 4]"), Some(TagKind::CheckAndTag));
}

#[test]
fn test_tuple_value_into_wider_tuple_type() {
    let checked = check(
        r#"
var fixed = [1, "a", "b"];
var first: [number, string, string] = fixed;
var open: [number, ...string] = fixed;
function make(): [number, string] { return [1, "x"]; }
var made: [number, ...string] = make();
"#,
    );
    assert!(checked.diagnostics.is_empty(), "{:#?}", checked.diagnostics);
    assert_eq!(checked.tag_of("fixed"), Some(TagKind::Tag));
    assert_eq!(checked.tag_of("make()"), Some(TagKind::Tag));
}

#[test]
fn test_tuple_depth_subtyping_through_interfaces() {
    let checked = check(
        r#"
interface Shape { foo(): void; bar: string; }
class Square { side: number = 1; bar: string = "sq"; foo(): void { } }
var s = new Square();
var pair: [number, Shape] = [1, s];
var literal: [number, Shape] = [2, { foo: function () { }, bar: "x", extra: true }];
var wrong: [number, Shape] = [3, { bar: "x" }];
"#,
    );
    assert_eq!(checked.codes(), vec![diagnostic_codes::TYPE_NOT_ASSIGNABLE]);
    assert_eq!(checked.tag_of("[1, s]"), Some(TagKind::Tag));
}

#[test]
fn test_element_access_on_tuples() {
    assert_codes(
        r#"
var t: [number, ...string] = [1, "a"];
var n: number = t[0];
var s: string = t[5];
var bad: number = t[1];
"#,
        &[diagnostic_codes::TYPE_NOT_ASSIGNABLE],
    );
}
