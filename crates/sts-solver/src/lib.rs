//! Type representation and relations.
//!
//! - **Interning**: every structural type is a `TypeKey` interned to a
//!   `TypeId`, so two independently built occurrences of one shape compare
//!   equal by id.
//! - **Named types are lazy**: classes, interfaces and enums are
//!   `TypeKey::Ref(SymbolId)` and generic references are
//!   `TypeKey::Application`; their members come from a `TypeResolver`
//!   supplied by the checker. This keeps cyclic declarations finite.
//! - **Subtyping** is coinductive: a pair already being compared is assumed
//!   to hold.

mod format;
mod instantiate;
mod intern;
pub mod recursion;
mod subtype;
mod subtype_rules;
pub mod types;

#[cfg(test)]
mod test_support;

pub use format::TypeFormatter;
pub use instantiate::{TypeSubstitution, instantiate_signature, instantiate_type};
pub use intern::TypeInterner;
pub use recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};
pub use subtype::{SubtypeChecker, SubtypeResult, TypeResolver, is_subtype_of};
pub use subtype_rules::tuples::{TupleWidthCheck, tuple_element_at, tuple_width_check};
pub use types::{
    IntrinsicKind, ObjectShape, ParamInfo, PropertyInfo, SignatureShape, TupleShape, TypeId,
    TypeKey,
};
