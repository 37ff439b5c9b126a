//! Symbol binder and two-pass sound type checker.
//!
//! This crate is organized into several submodules:
//! - `context` - `CheckerContext`, options, the contextual-type stack
//! - `state` - `CheckerState` plumbing shared by every pass
//! - `symbols` - the symbol arena and the closed `SymbolKind` union
//! - `symbol_binder` - binding declarations to symbols, name lookup, generic instantiation
//! - `type_resolution` - type annotations, variable and signature types
//! - `declared_shapes` - member shapes of classes, interfaces and modules
//! - `class_inheritance` - heritage clauses and inheritance cycle cutting
//! - `signature_pass` - pass 1, declared shapes only
//! - `check_pass` - pass 2, statements and typing boundaries
//! - `expr` / `call_checker` - expression typing and call resolution
//! - `runtime_tags` - tag decisions and runtime descriptors for the emitter
//! - `sound_checker` - the per-compilation driver and sticky freshness
//!
//! Every `impl CheckerState` block lives next to the concern it implements;
//! `SoundChecker` is the entry point callers use.

pub mod context;
mod context_resolver;
pub mod runtime_tags;
pub mod sound_checker;
pub mod state;
pub mod symbol_binder;
pub mod symbols;

mod call_checker;
mod check_pass;
mod class_inheritance;
mod declared_shapes;
mod expr;
mod signature_pass;
mod type_resolution;

pub use context::{CheckerContext, CheckerOptions, ContextualTypeStack};
pub use runtime_tags::{
    ClassDescriptor, FileDescriptors, FileTags, InterfaceDescriptor, MethodDescriptor,
    RuntimeCall, RuntimeType, TagAnnotation, TagKind, TupleDescriptor, render_type,
};
pub use sound_checker::{SoundChecker, StickyFreshnessTracker};
pub use state::CheckerState;
pub use symbol_binder::Meaning;
pub use symbols::{Resolution, Symbol, SymbolArena, SymbolId, SymbolKind};
