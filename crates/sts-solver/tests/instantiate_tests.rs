use super::*;

#[test]
fn test_substitutes_type_parameters() {
    let interner = TypeInterner::new();
    let t = interner.type_param(SymbolId(1));
    let subst = TypeSubstitution::from_args(&[SymbolId(1)], &[TypeId::NUMBER]);

    assert_eq!(instantiate_type(&interner, t, &subst), TypeId::NUMBER);
    assert_eq!(
        instantiate_type(&interner, interner.array(t), &subst),
        interner.array(TypeId::NUMBER)
    );
}

#[test]
fn test_missing_arguments_become_any() {
    let subst = TypeSubstitution::from_args(&[SymbolId(1), SymbolId(2)], &[TypeId::STRING]);
    assert_eq!(subst.get(SymbolId(1)), Some(TypeId::STRING));
    assert_eq!(subst.get(SymbolId(2)), Some(TypeId::ANY));
    assert_eq!(subst.len(), 2);
}

#[test]
fn test_substitutes_through_objects_tuples_and_applications() {
    let interner = TypeInterner::new();
    let t = interner.type_param(SymbolId(1));
    let generic = interner.object(vec![
        PropertyInfo::new("value", t),
        PropertyInfo::new("pair", interner.tuple(TupleShape::new(vec![t, TypeId::STRING], 1))),
        PropertyInfo::new("boxed", interner.application(SymbolId(9), vec![t])),
    ]);
    let subst = TypeSubstitution::from_args(&[SymbolId(1)], &[TypeId::BOOLEAN]);

    let expected = interner.object(vec![
        PropertyInfo::new("value", TypeId::BOOLEAN),
        PropertyInfo::new(
            "pair",
            interner.tuple(TupleShape::new(vec![TypeId::BOOLEAN, TypeId::STRING], 1)),
        ),
        PropertyInfo::new("boxed", interner.application(SymbolId(9), vec![TypeId::BOOLEAN])),
    ]);

    assert_eq!(instantiate_type(&interner, generic, &subst), expected);
}

#[test]
fn test_named_references_are_untouched() {
    let interner = TypeInterner::new();
    let named = interner.reference(SymbolId(4));
    let subst = TypeSubstitution::from_args(&[SymbolId(1)], &[TypeId::NUMBER]);

    assert_eq!(instantiate_type(&interner, named, &subst), named);
}

#[test]
fn test_signature_own_type_parameters_shadow() {
    let interner = TypeInterner::new();
    let t = interner.type_param(SymbolId(1));
    let inner = SignatureShape {
        type_params: vec![SymbolId(1)],
        params: vec![ParamInfo::required("x", t)],
        return_type: t,
    };
    let outer = interner.object(vec![PropertyInfo::method("id", interner.function(inner.clone()))]);
    let subst = TypeSubstitution::from_args(&[SymbolId(1)], &[TypeId::NUMBER]);

    // The method binds its own T, so the outer substitution must not reach it.
    assert_eq!(instantiate_type(&interner, outer, &subst), outer);
}

#[test]
fn test_instantiate_signature_specializes_generic() {
    let interner = TypeInterner::new();
    let t = interner.type_param(SymbolId(1));
    let identity = SignatureShape {
        type_params: vec![SymbolId(1)],
        params: vec![ParamInfo::required("x", t)],
        return_type: t,
    };
    let subst = TypeSubstitution::from_args(&[SymbolId(1)], &[TypeId::STRING]);

    let specialized = instantiate_signature(&interner, &identity, &subst);

    assert!(specialized.type_params.is_empty());
    assert_eq!(specialized.params[0].type_id, TypeId::STRING);
    assert_eq!(specialized.return_type, TypeId::STRING);
}

#[test]
fn test_runaway_nesting_resolves_to_error() {
    let interner = TypeInterner::new();
    let t = interner.type_param(SymbolId(1));
    let mut nested = t;
    for _ in 0..200 {
        nested = interner.array(nested);
    }
    let subst = TypeSubstitution::from_args(&[SymbolId(1)], &[TypeId::NUMBER]);

    let result = instantiate_type(&interner, nested, &subst);

    let mut depth = 0;
    let mut current = result;
    while let Some(element) = interner.array_element(current) {
        depth += 1;
        current = element;
    }
    assert_eq!(current, TypeId::ERROR);
    assert!(depth < 200);
}
