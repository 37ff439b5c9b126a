use super::*;
use crate::test_support::MockResolver;
use crate::types::PropertyInfo;

#[test]
fn test_format_intrinsics_and_arrays() {
    let interner = TypeInterner::new();
    let fmt = TypeFormatter::new(&interner);

    assert_eq!(fmt.format(TypeId::NUMBER), "number");
    assert_eq!(fmt.format(TypeId::UNDEFINED), "undefined");
    assert_eq!(fmt.format(interner.array(TypeId::STRING)), "string[]");
    assert_eq!(
        fmt.format(interner.array(interner.array(TypeId::BOOLEAN))),
        "boolean[][]"
    );
}

#[test]
fn test_format_tuples_mark_rest_start() {
    let interner = TypeInterner::new();
    let fmt = TypeFormatter::new(&interner);

    let fixed = interner.fixed_tuple(vec![TypeId::NUMBER, TypeId::STRING]);
    let rest = interner.tuple(TupleShape::new(vec![TypeId::NUMBER, TypeId::STRING], 1));
    let all_rest = interner.tuple(TupleShape::new(vec![TypeId::STRING, TypeId::NUMBER], 0));

    assert_eq!(fmt.format(fixed), "[number, string]");
    assert_eq!(fmt.format(rest), "[number, ...string]");
    assert_eq!(fmt.format(all_rest), "[...string, number]");
    assert_eq!(fmt.format(interner.fixed_tuple(vec![])), "[]");
}

#[test]
fn test_format_objects_and_functions() {
    let interner = TypeInterner::new();
    let fmt = TypeFormatter::new(&interner);

    let method = interner.function(SignatureShape::new(vec![], TypeId::VOID));
    let object = interner.object(vec![
        PropertyInfo::new("a", TypeId::NUMBER),
        PropertyInfo::optional("b", TypeId::STRING),
        PropertyInfo::method("run", method),
    ]);
    let func = interner.function(SignatureShape::new(
        vec![
            ParamInfo::required("a", TypeId::NUMBER),
            ParamInfo::optional("b", TypeId::STRING),
            ParamInfo::rest("c", interner.array(TypeId::BOOLEAN)),
        ],
        TypeId::STRING,
    ));

    assert_eq!(fmt.format(object), "{ a: number; b?: string; run(): void }");
    assert_eq!(
        fmt.format(func),
        "(a: number, b?: string, ...c: boolean[]) => string"
    );
    assert_eq!(fmt.format(interner.array(method)), "(() => void)[]");
    assert_eq!(fmt.format(interner.object(vec![])), "{}");
}

#[test]
fn test_format_named_types_through_resolver() {
    let interner = TypeInterner::new();
    let mut resolver = MockResolver::new();
    resolver.name(SymbolId(1), "Box");
    resolver.name(SymbolId(2), "C");

    let fmt = TypeFormatter::with_resolver(&interner, &resolver);

    assert_eq!(
        fmt.format(interner.application(SymbolId(1), vec![TypeId::NUMBER])),
        "Box<number>"
    );
    assert_eq!(fmt.format(interner.class_constructor(SymbolId(2))), "typeof C");
    assert_eq!(fmt.format(interner.reference(SymbolId(2))), "C");
}
