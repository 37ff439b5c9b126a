use super::*;
use crate::types::ParamInfo;

#[test]
fn test_interner_intrinsics_have_fixed_ids() {
    let interner = TypeInterner::new();

    for kind in IntrinsicKind::ALL {
        let key = interner
            .lookup(kind.type_id())
            .expect("intrinsic should be pre-registered");
        assert_eq!(*key, TypeKey::Intrinsic(kind));
    }
    assert_eq!(interner.len(), TypeId::FIRST_USER as usize);
}

#[test]
fn test_interner_deduplication() {
    let interner = TypeInterner::new();

    let a = interner.array(TypeId::NUMBER);
    let b = interner.array(TypeId::NUMBER);
    let c = interner.array(TypeId::STRING);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(!a.is_intrinsic());
}

#[test]
fn test_object_property_order_is_normalized() {
    let interner = TypeInterner::new();

    let ab = interner.object(vec![
        PropertyInfo::new("a", TypeId::NUMBER),
        PropertyInfo::new("b", TypeId::STRING),
    ]);
    let ba = interner.object(vec![
        PropertyInfo::new("b", TypeId::STRING),
        PropertyInfo::new("a", TypeId::NUMBER),
    ]);

    assert_eq!(ab, ba);
}

#[test]
fn test_function_signature_round_trips_through_lookup() {
    let interner = TypeInterner::new();
    let signature = SignatureShape::new(
        vec![ParamInfo::required("x", TypeId::NUMBER)],
        TypeId::STRING,
    );

    let fn_type = interner.function(signature.clone());

    assert_eq!(interner.function_signature(fn_type), Some(signature));
    assert_eq!(interner.function_signature(TypeId::NUMBER), None);
}

#[test]
fn test_tuple_shapes_with_different_rest_start_are_distinct() {
    let interner = TypeInterner::new();

    let fixed = interner.tuple(TupleShape::new(vec![TypeId::NUMBER, TypeId::STRING], 2));
    let open = interner.tuple(TupleShape::new(vec![TypeId::NUMBER, TypeId::STRING], 1));

    assert_ne!(fixed, open);
    assert_eq!(interner.tuple_shape(open).map(|s| s.rest_start()), Some(1));
}

#[test]
#[should_panic(expected = "exceeds width")]
fn test_tuple_rest_start_past_width_panics() {
    let _ = TupleShape::new(vec![TypeId::NUMBER], 2);
}

#[test]
fn test_lookup_of_unknown_id_is_none() {
    let interner = TypeInterner::new();
    assert!(interner.lookup(TypeId(10_000)).is_none());
}
