//! Subtype relation benchmarks.
//!
//! Measures tuple relations with long cyclic tails and wide structural
//! object comparisons.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::rc::Rc;
use sts_binder::SymbolId;
use sts_solver::{
    ObjectShape, PropertyInfo, SubtypeChecker, TupleShape, TypeId, TypeInterner, TypeResolver,
};

/// Resolver for benches that only use anonymous types.
struct NoNamedTypes;

impl TypeResolver for NoNamedTypes {
    fn object_shape(&self, _ty: TypeId) -> Option<Rc<ObjectShape>> {
        None
    }
    fn class_of(&self, _ty: TypeId) -> Option<SymbolId> {
        None
    }
    fn derives_from(&self, class: SymbolId, base: SymbolId) -> bool {
        class == base
    }
    fn is_enum_type(&self, _ty: TypeId) -> bool {
        false
    }
    fn constraint_of(&self, _type_param: SymbolId) -> Option<TypeId> {
        None
    }
    fn symbol_name(&self, symbol: SymbolId) -> String {
        format!("T{}", symbol.0)
    }
}

fn bench_tuple_tails(c: &mut Criterion) {
    let mut group = c.benchmark_group("tuple_tail");
    let interner = TypeInterner::new();
    let target = interner.tuple(TupleShape::new(
        vec![TypeId::NUMBER, TypeId::STRING, TypeId::BOOLEAN],
        1,
    ));

    for width in [16usize, 256, 4096] {
        let mut elements = vec![TypeId::NUMBER];
        elements.extend(
            [TypeId::STRING, TypeId::BOOLEAN]
                .into_iter()
                .cycle()
                .take(width - 1),
        );
        let source = interner.fixed_tuple(elements);
        group.bench_with_input(BenchmarkId::from_parameter(width), &source, |b, &source| {
            b.iter(|| {
                let mut checker = SubtypeChecker::new(&interner, &NoNamedTypes);
                black_box(checker.is_subtype_of(black_box(source), target))
            })
        });
    }
    group.finish();
}

fn bench_open_tuple_periods(c: &mut Criterion) {
    let interner = TypeInterner::new();
    let tail = |period: usize| vec![TypeId::NUMBER; period];
    let source = interner.tuple(TupleShape::new(tail(7), 0));
    let target = interner.tuple(TupleShape::new(tail(11), 0));

    c.bench_function("open_tuple_lcm_77", |b| {
        b.iter(|| {
            let mut checker = SubtypeChecker::new(&interner, &NoNamedTypes);
            black_box(checker.is_subtype_of(source, target))
        })
    });
}

fn bench_wide_objects(c: &mut Criterion) {
    let interner = TypeInterner::new();
    let props = |count: usize| -> Vec<PropertyInfo> {
        (0..count)
            .map(|i| PropertyInfo::new(&format!("p{i}"), TypeId::NUMBER))
            .collect()
    };
    let source = interner.object(props(200));
    let target = interner.object(props(100));

    c.bench_function("wide_object_200_into_100", |b| {
        b.iter(|| {
            let mut checker = SubtypeChecker::new(&interner, &NoNamedTypes);
            black_box(checker.is_subtype_of(source, target))
        })
    });
}

criterion_group!(
    benches,
    bench_tuple_tails,
    bench_open_tuple_periods,
    bench_wide_objects
);
criterion_main!(benches);
