//! Centralized limits and thresholds for the sts compiler.
//!
//! These prevent stack overflow or runaway work in recursive algorithms.

/// Maximum depth for expression type checking.
///
/// Deeply nested expressions bail out with the error type past this depth.
pub const MAX_EXPR_CHECK_DEPTH: u32 = 500;

/// Maximum nesting depth for the subtype relation.
///
/// Structural recursion through deeply nested (but acyclic) object types
/// gives up and answers "not related" past this depth. Cycles are handled
/// separately by the in-progress set and never reach this limit.
pub const MAX_SUBTYPE_DEPTH: u32 = 64;

/// Maximum depth for generic type instantiation.
///
/// Instantiating `Box<Box<Box<...>>>` deeper than this resolves to the
/// error type instead of recursing forever.
pub const MAX_INSTANTIATION_DEPTH: u32 = 50;

/// Maximum number of positions compared when relating two open tuples.
///
/// Two open tuples are compared over their prefixes plus one common period
/// of their repeating tails; the period is capped to keep the work bounded.
pub const MAX_TUPLE_PERIOD: usize = 1024;

/// Maximum number of ancestors walked when resolving a declaration's parent chain.
pub const MAX_PARENT_CHAIN: usize = 10_000;
