//! The subtype relation.
//!
//! `SubtypeChecker` answers "is a value of type S usable where T is
//! expected". The relation mixes three disciplines:
//!
//! - primitives relate by identity (`null` and `undefined` excepted, they
//!   inhabit every type),
//! - class instance types are nominal: the source class must derive from the
//!   target class through declared heritage,
//! - interfaces, object literals and function types are structural, tuples
//!   follow the width/rest rules in `subtype_rules::tuples`.
//!
//! Named types are opaque to the solver; their members come from the
//! checker through [`TypeResolver`].

use crate::intern::TypeInterner;
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::types::{ObjectShape, TypeId, TypeKey};
use std::rc::Rc;
use sts_binder::SymbolId;
use tracing::trace;

/// Checker-side knowledge the relation needs about named types.
pub trait TypeResolver {
    /// Structural view of a named, applied, constructor or namespace type.
    /// Anonymous object types are read straight from the interner and never
    /// reach this method.
    fn object_shape(&self, ty: TypeId) -> Option<Rc<ObjectShape>>;

    /// The class symbol when `ty` is a class instance type (plain or applied).
    fn class_of(&self, ty: TypeId) -> Option<SymbolId>;

    /// Whether `class` is `base` or (transitively) extends it.
    fn derives_from(&self, class: SymbolId, base: SymbolId) -> bool;

    fn is_enum_type(&self, ty: TypeId) -> bool;

    fn constraint_of(&self, type_param: SymbolId) -> Option<TypeId>;

    fn symbol_name(&self, symbol: SymbolId) -> String;
}

/// Outcome of one comparison.
///
/// `Provisional` means the answer leaned on an assumption about a pair that
/// was still being compared further up the stack. It counts as related.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubtypeResult {
    True,
    False,
    Provisional,
}

impl SubtypeResult {
    #[inline]
    pub fn is_true(self) -> bool {
        !matches!(self, SubtypeResult::False)
    }

    #[inline]
    pub fn is_false(self) -> bool {
        matches!(self, SubtypeResult::False)
    }

    #[inline]
    pub fn from_bool(value: bool) -> Self {
        if value {
            SubtypeResult::True
        } else {
            SubtypeResult::False
        }
    }

    /// Conjunction: `False` wins, then `Provisional`.
    #[inline]
    pub fn and(self, other: SubtypeResult) -> SubtypeResult {
        match (self, other) {
            (SubtypeResult::False, _) | (_, SubtypeResult::False) => SubtypeResult::False,
            (SubtypeResult::Provisional, _) | (_, SubtypeResult::Provisional) => {
                SubtypeResult::Provisional
            }
            _ => SubtypeResult::True,
        }
    }
}

pub struct SubtypeChecker<'a, R: TypeResolver + ?Sized> {
    pub(crate) interner: &'a TypeInterner,
    pub(crate) resolver: &'a R,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a, R: TypeResolver + ?Sized> SubtypeChecker<'a, R> {
    pub fn new(interner: &'a TypeInterner, resolver: &'a R) -> Self {
        SubtypeChecker {
            interner,
            resolver,
            guard: RecursionGuard::with_profile(RecursionProfile::SubtypeCheck),
        }
    }

    pub fn is_subtype_of(&mut self, source: TypeId, target: TypeId) -> bool {
        self.check_subtype(source, target).is_true()
    }

    /// Whether the last comparisons gave up somewhere on the depth limit.
    pub fn depth_exceeded(&self) -> bool {
        self.guard.is_exceeded()
    }

    pub fn check_subtype(&mut self, source: TypeId, target: TypeId) -> SubtypeResult {
        if source == target {
            return SubtypeResult::True;
        }
        // The error type relates both ways so one failure never cascades.
        if target.is_any_or_error() || source.is_any_or_error() {
            return SubtypeResult::True;
        }
        if source == TypeId::NULL || source == TypeId::UNDEFINED {
            return SubtypeResult::True;
        }

        let pair = (source, target);
        match self.guard.enter(pair) {
            RecursionResult::Entered => {}
            RecursionResult::Cycle => {
                trace!(source = source.0, target = target.0, "subtype cycle, assuming related");
                return SubtypeResult::Provisional;
            }
            RecursionResult::DepthExceeded => return SubtypeResult::False,
        }
        let result = self.check_subtype_inner(source, target);
        self.guard.leave(pair);
        result
    }

    fn check_subtype_inner(&mut self, source: TypeId, target: TypeId) -> SubtypeResult {
        let (Some(source_key), Some(target_key)) =
            (self.interner.lookup(source), self.interner.lookup(target))
        else {
            return SubtypeResult::False;
        };

        if let TypeKey::TypeParameter(param) = *source_key {
            return match self.resolver.constraint_of(param) {
                Some(constraint) if constraint != source => self.check_subtype(constraint, target),
                _ => SubtypeResult::False,
            };
        }
        if matches!(*target_key, TypeKey::TypeParameter(_)) {
            return SubtypeResult::False;
        }

        let source_enum = self.resolver.is_enum_type(source);
        let target_enum = self.resolver.is_enum_type(target);
        if source_enum || target_enum {
            return SubtypeResult::from_bool(
                (source_enum && target == TypeId::NUMBER)
                    || (target_enum && source == TypeId::NUMBER),
            );
        }

        match (source_key.as_ref(), target_key.as_ref()) {
            (_, TypeKey::Intrinsic(_)) => SubtypeResult::False,
            (TypeKey::Array(source_elem), TypeKey::Array(target_elem)) => {
                self.check_subtype(*source_elem, *target_elem)
            }
            (TypeKey::Tuple(source_tuple), TypeKey::Array(target_elem)) => {
                self.check_tuple_to_array(source_tuple, *target_elem)
            }
            (TypeKey::Array(source_elem), TypeKey::Tuple(target_tuple)) => {
                self.check_array_to_tuple(*source_elem, target_tuple)
            }
            (TypeKey::Tuple(source_tuple), TypeKey::Tuple(target_tuple)) => {
                self.check_tuple_subtype(source_tuple, target_tuple)
            }
            _ => {
                // A class target admits only instances of itself or a
                // declared subclass; matching members are not enough.
                if let Some(target_class) = self.resolver.class_of(target) {
                    let derived = self
                        .resolver
                        .class_of(source)
                        .is_some_and(|source_class| {
                            self.resolver.derives_from(source_class, target_class)
                        });
                    if !derived {
                        return SubtypeResult::False;
                    }
                }
                self.check_object_subtype(source, target)
            }
        }
    }

    /// Structural view of any object-like type.
    pub(crate) fn shape_of(&self, ty: TypeId) -> Option<Rc<ObjectShape>> {
        match self.interner.lookup(ty)?.as_ref() {
            TypeKey::Object(shape) => Some(Rc::new(shape.clone())),
            TypeKey::Ref(_)
            | TypeKey::Application { .. }
            | TypeKey::ClassConstructor(_)
            | TypeKey::Namespace(_) => self.resolver.object_shape(ty),
            _ => None,
        }
    }
}

/// One-shot convenience over [`SubtypeChecker`].
pub fn is_subtype_of<R: TypeResolver + ?Sized>(
    interner: &TypeInterner,
    resolver: &R,
    source: TypeId,
    target: TypeId,
) -> bool {
    SubtypeChecker::new(interner, resolver).is_subtype_of(source, target)
}

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod tests;
