//! Subtype rules, split by the kind of type being related.
//!
//! Each file extends `SubtypeChecker` with the `check_*` methods for one
//! family; dispatch lives in `subtype.rs`.

mod functions;
mod objects;
pub mod tuples;
