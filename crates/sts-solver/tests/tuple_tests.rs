use super::*;
use crate::intern::TypeInterner;
use crate::subtype::is_subtype_of;
use crate::test_support::MockResolver;
use crate::types::PropertyInfo;
use sts_binder::SymbolId;

const N: TypeId = TypeId::NUMBER;
const S: TypeId = TypeId::STRING;
const B: TypeId = TypeId::BOOLEAN;

fn open(elements: Vec<TypeId>, rest_start: u32) -> TupleShape {
    TupleShape::new(elements, rest_start)
}

/// Relates a concrete value of the given element types to a tuple shape.
fn accepts(target: &TupleShape, value: &[TypeId]) -> bool {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let source = interner.fixed_tuple(value.to_vec());
    let target = interner.tuple(target.clone());
    is_subtype_of(&interner, &resolver, source, target)
}

#[test]
fn test_element_at_cycles_through_tail() {
    let shape = open(vec![N, S, B], 1);

    assert_eq!(tuple_element_at(&shape, 0), Some(N));
    assert_eq!(tuple_element_at(&shape, 1), Some(S));
    assert_eq!(tuple_element_at(&shape, 2), Some(B));
    assert_eq!(tuple_element_at(&shape, 3), Some(S));
    assert_eq!(tuple_element_at(&shape, 4), Some(B));
    assert_eq!(tuple_element_at(&shape, 1001), Some(B));
}

#[test]
fn test_element_at_past_fixed_width_is_none() {
    let shape = TupleShape::fixed(vec![N, S]);
    assert_eq!(tuple_element_at(&shape, 1), Some(S));
    assert_eq!(tuple_element_at(&shape, 2), None);
}

#[test]
fn test_width_check() {
    let fixed = TupleShape::fixed(vec![N, S]);
    let rest = open(vec![N, S], 1);

    assert_eq!(tuple_width_check(2, &fixed), TupleWidthCheck::Fits);
    assert_eq!(
        tuple_width_check(3, &fixed),
        TupleWidthCheck::WrongWidth { expected: 2 }
    );
    assert_eq!(tuple_width_check(7, &rest), TupleWidthCheck::Fits);
    assert_eq!(
        tuple_width_check(0, &rest),
        TupleWidthCheck::TooShort { required: 1 }
    );
}

#[test]
fn test_fixed_tuple_order_matters() {
    let target = TupleShape::fixed(vec![N, S]);

    assert!(accepts(&target, &[N, S]));
    assert!(!accepts(&target, &[S, N]));
    assert!(!accepts(&target, &[N]));
    assert!(!accepts(&target, &[N, S, S]));
}

#[test]
fn test_rest_after_first_element() {
    // (number, string) with rest-start 1
    let target = open(vec![N, S], 1);

    assert!(accepts(&target, &[N]));
    assert!(accepts(&target, &[N, S]));
    assert!(accepts(&target, &[N, S, S, S]));
    assert!(!accepts(&target, &[]));
    assert!(!accepts(&target, &[N, S, N]));
    assert!(!accepts(&target, &[S]));
}

#[test]
fn test_all_rest_tuple_cycles() {
    // (string, number) with rest-start 0
    let target = open(vec![S, N], 0);

    assert!(accepts(&target, &[]));
    assert!(accepts(&target, &[S, N]));
    assert!(accepts(&target, &[S, N, S, N]));
    assert!(accepts(&target, &[S, N, S, N, S, N]));
    assert!(!accepts(&target, &[N, S]));
    assert!(!accepts(&target, &[S, S]));
}

#[test]
fn test_non_aligned_width_wraps_cyclically() {
    // Tail of length 2, values ending mid-cycle.
    let target = open(vec![N, S, B], 1);

    assert!(accepts(&target, &[N, S]));
    assert!(accepts(&target, &[N, S, B, S]));
    assert!(!accepts(&target, &[N, S, B, B]));
    assert!(!accepts(&target, &[N, S, B, N]));
}

#[test]
fn test_unused_rest_slots_impose_nothing() {
    let target = open(vec![N, B, S, B], 2);

    // Width 2 never reaches the tail, width 3 uses only its first slot.
    assert!(accepts(&target, &[N, B]));
    assert!(accepts(&target, &[N, B, S]));
    assert!(!accepts(&target, &[N]));
}

#[test]
fn test_mixed_prefix_and_tail() {
    let target = open(vec![N, B, S, B], 2);

    assert!(accepts(&target, &[N, B, S, B]));
    assert!(accepts(&target, &[N, B, S, B, S, B]));
    assert!(!accepts(&target, &[N, B, B, S]));
}

#[test]
fn test_tuple_element_depth_subtyping() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let method = interner.function(crate::types::SignatureShape::new(vec![], TypeId::VOID));
    let foo_bar = resolver.interface(
        &interner,
        SymbolId(1),
        "FooBar",
        vec![
            PropertyInfo::method("foo", method),
            PropertyInfo::new("bar", S),
        ],
    );
    let other = resolver.class(
        &interner,
        SymbolId(2),
        "Other",
        None,
        vec![
            PropertyInfo::method("foo", method),
            PropertyInfo::new("bar", S),
            PropertyInfo::new("baz", N),
        ],
    );
    let lacking = interner.object(vec![PropertyInfo::new("bar", S)]);

    let target = interner.tuple(TupleShape::fixed(vec![N, foo_bar]));
    let good = interner.fixed_tuple(vec![N, other]);
    let bad = interner.fixed_tuple(vec![N, lacking]);

    assert!(is_subtype_of(&interner, &resolver, good, target));
    assert!(!is_subtype_of(&interner, &resolver, bad, target));
}

#[test]
fn test_open_tuple_into_open_tuple() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let rel = |source: TupleShape, target: TupleShape| {
        let s = interner.tuple(source);
        let t = interner.tuple(target);
        is_subtype_of(&interner, &resolver, s, t)
    };

    assert!(rel(open(vec![N, S], 1), open(vec![N, S], 1)));
    assert!(rel(open(vec![N, S, S], 1), open(vec![N, S], 1)));
    assert!(rel(open(vec![S, N, S, N], 2), open(vec![S, N], 0)));
    assert!(!rel(open(vec![S, N], 0), open(vec![S, N, S, N], 2)));
    assert!(!rel(open(vec![N, S, N], 1), open(vec![N, S], 1)));
}

#[test]
fn test_open_tuple_never_fits_fixed_tuple() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let source = interner.tuple(open(vec![N, S], 1));
    let target = interner.fixed_tuple(vec![N, S]);

    assert!(!is_subtype_of(&interner, &resolver, source, target));
}

#[test]
fn test_tuple_into_array() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let numbers = interner.array(N);

    let pair = interner.fixed_tuple(vec![N, N]);
    let mixed = interner.fixed_tuple(vec![N, S]);

    assert!(is_subtype_of(&interner, &resolver, pair, numbers));
    assert!(!is_subtype_of(&interner, &resolver, mixed, numbers));
}

#[test]
fn test_array_into_tuple_needs_all_rest_target() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let numbers = interner.array(N);

    let all_rest = interner.tuple(open(vec![N], 0));
    let prefixed = interner.tuple(open(vec![N, N], 1));
    let fixed = interner.fixed_tuple(vec![N]);

    assert!(is_subtype_of(&interner, &resolver, numbers, all_rest));
    assert!(!is_subtype_of(&interner, &resolver, numbers, prefixed));
    assert!(!is_subtype_of(&interner, &resolver, numbers, fixed));
}

#[test]
fn test_gcd() {
    assert_eq!(gcd(4, 6), 2);
    assert_eq!(gcd(3, 1), 1);
    assert_eq!(gcd(5, 5), 5);
}
