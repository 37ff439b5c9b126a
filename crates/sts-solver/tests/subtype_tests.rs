use super::*;
use crate::test_support::MockResolver;
use crate::types::{ParamInfo, PropertyInfo, SignatureShape};

fn fn_type(interner: &TypeInterner, params: Vec<ParamInfo>, ret: TypeId) -> TypeId {
    interner.function(SignatureShape::new(params, ret))
}

#[test]
fn test_primitives_relate_by_identity() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();

    assert!(is_subtype_of(&interner, &resolver, TypeId::NUMBER, TypeId::NUMBER));
    assert!(!is_subtype_of(&interner, &resolver, TypeId::NUMBER, TypeId::STRING));
    assert!(!is_subtype_of(&interner, &resolver, TypeId::BOOLEAN, TypeId::VOID));
    assert!(!is_subtype_of(&interner, &resolver, TypeId::STRING, TypeId::BOOLEAN));
}

#[test]
fn test_null_and_undefined_inhabit_every_type() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let arr = interner.array(TypeId::STRING);

    for target in [TypeId::NUMBER, TypeId::STRING, arr] {
        assert!(is_subtype_of(&interner, &resolver, TypeId::NULL, target));
        assert!(is_subtype_of(&interner, &resolver, TypeId::UNDEFINED, target));
    }
    assert!(!is_subtype_of(&interner, &resolver, TypeId::NUMBER, TypeId::NULL));
}

#[test]
fn test_any_and_error_relate_both_ways() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let arr = interner.array(TypeId::NUMBER);

    assert!(is_subtype_of(&interner, &resolver, TypeId::ANY, arr));
    assert!(is_subtype_of(&interner, &resolver, arr, TypeId::ANY));
    assert!(is_subtype_of(&interner, &resolver, TypeId::ERROR, TypeId::STRING));
    assert!(is_subtype_of(&interner, &resolver, TypeId::STRING, TypeId::ERROR));
}

#[test]
fn test_arrays_are_covariant() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let named = resolver.interface(
        &interner,
        SymbolId(1),
        "Named",
        vec![PropertyInfo::new("name", TypeId::STRING)],
    );
    let person = interner.object(vec![
        PropertyInfo::new("name", TypeId::STRING),
        PropertyInfo::new("age", TypeId::NUMBER),
    ]);

    let people = interner.array(person);
    let nameds = interner.array(named);
    assert!(is_subtype_of(&interner, &resolver, people, nameds));
    assert!(!is_subtype_of(&interner, &resolver, nameds, people));
}

#[test]
fn test_structural_width_and_depth() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let inner = resolver.interface(
        &interner,
        SymbolId(1),
        "Inner",
        vec![PropertyInfo::new("x", TypeId::NUMBER)],
    );
    let outer = resolver.interface(
        &interner,
        SymbolId(2),
        "Outer",
        vec![PropertyInfo::new("inner", inner)],
    );

    let good = interner.object(vec![
        PropertyInfo::new("inner", interner.object(vec![
            PropertyInfo::new("x", TypeId::NUMBER),
            PropertyInfo::new("y", TypeId::STRING),
        ])),
        PropertyInfo::new("extra", TypeId::BOOLEAN),
    ]);
    let bad = interner.object(vec![PropertyInfo::new(
        "inner",
        interner.object(vec![PropertyInfo::new("x", TypeId::STRING)]),
    )]);

    assert!(is_subtype_of(&interner, &resolver, good, outer));
    assert!(!is_subtype_of(&interner, &resolver, bad, outer));
}

#[test]
fn test_optional_properties() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let target = interner.object(vec![
        PropertyInfo::new("a", TypeId::NUMBER),
        PropertyInfo::optional("b", TypeId::STRING),
    ]);

    let without_b = interner.object(vec![PropertyInfo::new("a", TypeId::NUMBER)]);
    let wrong_b = interner.object(vec![
        PropertyInfo::new("a", TypeId::NUMBER),
        PropertyInfo::new("b", TypeId::NUMBER),
    ]);
    let optional_a = interner.object(vec![PropertyInfo::optional("a", TypeId::NUMBER)]);

    assert!(is_subtype_of(&interner, &resolver, without_b, target));
    assert!(!is_subtype_of(&interner, &resolver, wrong_b, target));
    assert!(!is_subtype_of(&interner, &resolver, optional_a, target));
}

#[test]
fn test_classes_are_nominal() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let props = || vec![PropertyInfo::new("x", TypeId::NUMBER)];
    let base = resolver.class(&interner, SymbolId(1), "Base", None, props());
    let derived = resolver.class(&interner, SymbolId(2), "Derived", Some(SymbolId(1)), props());
    let lookalike = resolver.class(&interner, SymbolId(3), "Lookalike", None, props());

    assert!(is_subtype_of(&interner, &resolver, derived, base));
    assert!(!is_subtype_of(&interner, &resolver, base, derived));
    assert!(!is_subtype_of(&interner, &resolver, lookalike, base));
}

#[test]
fn test_only_class_instances_inhabit_a_class_type() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let props = || vec![PropertyInfo::new("x", TypeId::NUMBER)];
    let class = resolver.class(&interner, SymbolId(1), "C", None, props());
    let interface = resolver.interface(&interner, SymbolId(2), "I", props());
    let literal = interner.object(props());

    assert!(!is_subtype_of(&interner, &resolver, literal, class));
    assert!(!is_subtype_of(&interner, &resolver, interface, class));
    assert!(is_subtype_of(&interner, &resolver, class, interface));
    assert!(is_subtype_of(&interner, &resolver, TypeId::NULL, class));
}

#[test]
fn test_class_instance_satisfies_interface_structurally() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let point = resolver.class(
        &interner,
        SymbolId(1),
        "Point",
        None,
        vec![
            PropertyInfo::new("x", TypeId::NUMBER),
            PropertyInfo::new("y", TypeId::NUMBER),
        ],
    );
    let has_x = resolver.interface(
        &interner,
        SymbolId(2),
        "HasX",
        vec![PropertyInfo::new("x", TypeId::NUMBER)],
    );

    assert!(is_subtype_of(&interner, &resolver, point, has_x));
    assert!(!is_subtype_of(&interner, &resolver, has_x, point));
}

#[test]
fn test_enum_and_number_relate_both_ways() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let color = resolver.enumeration(&interner, SymbolId(1), "Color");
    let size = resolver.enumeration(&interner, SymbolId(2), "Size");

    assert!(is_subtype_of(&interner, &resolver, color, TypeId::NUMBER));
    assert!(is_subtype_of(&interner, &resolver, TypeId::NUMBER, color));
    assert!(!is_subtype_of(&interner, &resolver, color, size));
    assert!(!is_subtype_of(&interner, &resolver, TypeId::STRING, color));
}

#[test]
fn test_function_parameters_are_contravariant() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let animal = resolver.interface(
        &interner,
        SymbolId(1),
        "Animal",
        vec![PropertyInfo::new("name", TypeId::STRING)],
    );
    let dog = resolver.interface(
        &interner,
        SymbolId(2),
        "Dog",
        vec![
            PropertyInfo::new("name", TypeId::STRING),
            PropertyInfo::new("bark", TypeId::BOOLEAN),
        ],
    );

    let takes_animal = fn_type(&interner, vec![ParamInfo::required("a", animal)], TypeId::VOID);
    let takes_dog = fn_type(&interner, vec![ParamInfo::required("d", dog)], TypeId::VOID);

    assert!(is_subtype_of(&interner, &resolver, takes_animal, takes_dog));
    assert!(!is_subtype_of(&interner, &resolver, takes_dog, takes_animal));
}

#[test]
fn test_source_may_take_fewer_parameters() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let nullary = fn_type(&interner, vec![], TypeId::NUMBER);
    let binary = fn_type(
        &interner,
        vec![
            ParamInfo::required("a", TypeId::NUMBER),
            ParamInfo::required("b", TypeId::STRING),
        ],
        TypeId::NUMBER,
    );

    assert!(is_subtype_of(&interner, &resolver, nullary, binary));
    assert!(!is_subtype_of(&interner, &resolver, binary, nullary));
}

#[test]
fn test_void_return_accepts_any_source_return() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let returns_number = fn_type(&interner, vec![], TypeId::NUMBER);
    let returns_void = fn_type(&interner, vec![], TypeId::VOID);
    let returns_string = fn_type(&interner, vec![], TypeId::STRING);

    assert!(is_subtype_of(&interner, &resolver, returns_number, returns_void));
    assert!(!is_subtype_of(&interner, &resolver, returns_number, returns_string));
}

#[test]
fn test_rest_parameter_matches_each_position() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let variadic = fn_type(
        &interner,
        vec![ParamInfo::rest("xs", interner.array(TypeId::NUMBER))],
        TypeId::VOID,
    );
    let two_numbers = fn_type(
        &interner,
        vec![
            ParamInfo::required("a", TypeId::NUMBER),
            ParamInfo::required("b", TypeId::NUMBER),
        ],
        TypeId::VOID,
    );
    let number_string = fn_type(
        &interner,
        vec![
            ParamInfo::required("a", TypeId::NUMBER),
            ParamInfo::required("b", TypeId::STRING),
        ],
        TypeId::VOID,
    );

    assert!(is_subtype_of(&interner, &resolver, variadic, two_numbers));
    assert!(!is_subtype_of(&interner, &resolver, variadic, number_string));
}

#[test]
fn test_recursive_interfaces_relate_coinductively() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let node = interner.reference(SymbolId(1));
    let link = interner.reference(SymbolId(2));
    resolver.set_members(
        node,
        vec![
            PropertyInfo::new("next", node),
            PropertyInfo::new("value", TypeId::NUMBER),
        ],
    );
    resolver.set_members(
        link,
        vec![
            PropertyInfo::new("next", link),
            PropertyInfo::new("value", TypeId::NUMBER),
        ],
    );

    let mut checker = SubtypeChecker::new(&interner, &resolver);
    assert!(checker.check_subtype(node, link).is_true());
    assert!(checker.check_subtype(link, node).is_true());
    assert!(!checker.depth_exceeded());
}

#[test]
fn test_recursive_interfaces_with_mismatch_are_rejected() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let node = interner.reference(SymbolId(1));
    let named = interner.reference(SymbolId(2));
    resolver.set_members(
        node,
        vec![
            PropertyInfo::new("next", node),
            PropertyInfo::new("value", TypeId::NUMBER),
        ],
    );
    resolver.set_members(
        named,
        vec![
            PropertyInfo::new("next", named),
            PropertyInfo::new("value", TypeId::STRING),
        ],
    );

    assert!(!is_subtype_of(&interner, &resolver, node, named));
}

#[test]
fn test_type_parameter_uses_its_constraint() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    let has_len = interner.object(vec![PropertyInfo::new("len", TypeId::NUMBER)]);
    let constrained = resolver.type_param(&interner, SymbolId(1), "T", Some(has_len));
    let unconstrained = resolver.type_param(&interner, SymbolId(2), "U", None);

    assert!(is_subtype_of(&interner, &resolver, constrained, has_len));
    assert!(!is_subtype_of(&interner, &resolver, unconstrained, has_len));
    assert!(!is_subtype_of(&interner, &resolver, has_len, constrained));
}

#[test]
fn test_empty_object_accepts_everything() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let empty = interner.object(vec![]);

    assert!(is_subtype_of(&interner, &resolver, TypeId::NUMBER, empty));
    assert!(is_subtype_of(&interner, &resolver, interner.array(TypeId::STRING), empty));
}

#[test]
fn test_string_index_signature() {
    let interner = TypeInterner::new();
    let resolver = MockResolver::new();
    let dictionary = interner.object_with_shape(ObjectShape {
        string_index: Some(TypeId::NUMBER),
        ..ObjectShape::default()
    });
    let numbers = interner.object(vec![
        PropertyInfo::new("a", TypeId::NUMBER),
        PropertyInfo::new("b", TypeId::NUMBER),
    ]);
    let mixed = interner.object(vec![
        PropertyInfo::new("a", TypeId::NUMBER),
        PropertyInfo::new("b", TypeId::STRING),
    ]);

    assert!(is_subtype_of(&interner, &resolver, numbers, dictionary));
    assert!(!is_subtype_of(&interner, &resolver, mixed, dictionary));
}

#[test]
fn test_result_conjunction() {
    use SubtypeResult::*;
    assert_eq!(True.and(Provisional), Provisional);
    assert_eq!(Provisional.and(False), False);
    assert_eq!(True.and(True), True);
    assert!(Provisional.is_true());
}
