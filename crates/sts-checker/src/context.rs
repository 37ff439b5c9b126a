//! Checker context: the state shared by every phase of one checking session.
//!
//! `CheckerContext` owns the type interner, the symbol arena and every cache
//! that maps declarations and syntax to resolved types. The registry is
//! borrowed; the context records symbols into it as declarations are bound.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use sts_binder::{DeclId, FileId, SemanticRegistry};
use sts_parser::NodeIndex;
use sts_solver::{ObjectShape, RecursionProfile, TypeId, TypeInterner};

use crate::class_inheritance::HeritageClause;
use crate::runtime_tags::FileTags;
use crate::sound_checker::StickyFreshnessTracker;
use crate::symbols::{SymbolArena, SymbolId};

/// Options that change what the checker reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CheckerOptions {
    /// Run the sound check at all. When off, only declared shapes are built.
    pub sound: bool,
    /// Warn (9001) whenever an `any` value flows into a typed position.
    pub no_implicit_any_flow: bool,
    /// Record runtime tag decisions for the emitter.
    pub runtime_checks: bool,
}

impl Default for CheckerOptions {
    fn default() -> Self {
        CheckerOptions {
            sound: true,
            no_implicit_any_flow: false,
            runtime_checks: true,
        }
    }
}

/// Merge identity of a declaration: where it is declared, its name and the
/// kind group it merges with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum MergeScope {
    /// Top level of any file.
    Global,
    /// Member of (or local to) a bound symbol.
    Symbol(SymbolId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum MergeGroup {
    Interface,
    Module,
    Enum,
    Function,
    StaticFunction,
}

pub(crate) type MergeKey = (MergeScope, String, MergeGroup);

/// Stack of expected types for the expression being resolved.
///
/// Every push names the node that pushed it and must be popped by the same
/// node. A `None` frame records "no expectation here" and is still pushed.
#[derive(Debug, Default)]
pub struct ContextualTypeStack {
    frames: Vec<(NodeIndex, Option<TypeId>)>,
}

impl ContextualTypeStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: NodeIndex, expected: Option<TypeId>) {
        self.frames.push((node, expected));
    }

    /// Panics if the top frame was pushed by a different node.
    pub fn pop(&mut self, node: NodeIndex) -> Option<TypeId> {
        match self.frames.pop() {
            Some((pushed_by, expected)) => {
                assert_eq!(
                    pushed_by, node,
                    "contextual type frame pushed by {pushed_by:?} popped by {node:?}"
                );
                expected
            }
            None => panic!("contextual type stack underflow at {node:?}"),
        }
    }

    /// The innermost expectation.
    pub fn current(&self) -> Option<TypeId> {
        self.frames.last().and_then(|&(_, expected)| expected)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Per-function state while walking a body.
#[derive(Clone, Debug)]
pub(crate) struct FunctionFrame {
    /// Declared return type; `None` while the return type is being inferred.
    pub return_type: Option<TypeId>,
    /// First `return expr` type seen, for inference.
    pub inferred_return: Option<TypeId>,
    pub has_return_value: bool,
}

pub struct CheckerContext<'a> {
    pub registry: &'a SemanticRegistry,
    pub types: TypeInterner,
    pub options: CheckerOptions,
    pub symbols: SymbolArena,
    /// Registry generation the symbol arena was built against.
    pub(crate) generation: u64,

    pub(crate) merged: FxHashMap<MergeKey, SymbolId>,
    /// (generic, args) -> instantiated symbol.
    pub(crate) instantiations: FxHashMap<(SymbolId, Vec<TypeId>), SymbolId>,
    pub(crate) application_shapes: RefCell<FxHashMap<TypeId, Rc<ObjectShape>>>,
    /// Heritage as written, before cycle cutting.
    pub(crate) heritage_clauses: FxHashMap<SymbolId, Rc<[HeritageClause]>>,
    /// Variables found referring to themselves while being inferred.
    pub(crate) circular: FxHashSet<SymbolId>,

    /// Resolved type annotations.
    pub(crate) type_node_types: FxHashMap<(FileId, NodeIndex), TypeId>,
    /// Static type of every checked expression, per file.
    pub(crate) node_types: FxHashMap<FileId, FxHashMap<NodeIndex, TypeId>>,
    pub(crate) tags: FxHashMap<FileId, FileTags>,

    pub contextual: ContextualTypeStack,
    pub(crate) freshness: StickyFreshnessTracker,

    pub(crate) current_file: FileId,
    pub(crate) scopes: Vec<DeclId>,
    pub(crate) this_types: Vec<TypeId>,
    pub(crate) functions: Vec<FunctionFrame>,
    /// Nonzero while types are inferred outside the pass-2 walk; nothing is
    /// reported or tagged then.
    pub(crate) speculative: u32,
    pub(crate) expr_depth: sts_solver::DepthCounter,

    /// Types whose named members are all resolved, so the solver can
    /// relate them without asking for a shape that is not there yet.
    pub(crate) resolved_types: FxHashSet<TypeId>,
    /// Function bodies already walked by pass 2.
    pub(crate) checked_bodies: FxHashSet<DeclId>,

    pub(crate) signatures_built: FxHashSet<FileId>,
    pub(crate) files_checked: FxHashSet<FileId>,
}

impl<'a> CheckerContext<'a> {
    pub fn new(registry: &'a SemanticRegistry, options: CheckerOptions) -> Self {
        registry.reset_symbol_maps();
        registry.clear_check_diagnostics();
        CheckerContext {
            registry,
            types: TypeInterner::new(),
            options,
            symbols: SymbolArena::new(),
            generation: registry.symbol_generation(),
            merged: FxHashMap::default(),
            instantiations: FxHashMap::default(),
            application_shapes: RefCell::new(FxHashMap::default()),
            heritage_clauses: FxHashMap::default(),
            circular: FxHashSet::default(),
            type_node_types: FxHashMap::default(),
            node_types: FxHashMap::default(),
            tags: FxHashMap::default(),
            contextual: ContextualTypeStack::new(),
            freshness: StickyFreshnessTracker::new(),
            current_file: FileId::GLOBAL,
            scopes: Vec::new(),
            this_types: Vec::new(),
            functions: Vec::new(),
            speculative: 0,
            expr_depth: sts_solver::DepthCounter::with_profile(RecursionProfile::ExpressionCheck),
            resolved_types: FxHashSet::default(),
            checked_bodies: FxHashSet::default(),
            signatures_built: FxHashSet::default(),
            files_checked: FxHashSet::default(),
        }
    }

    /// Panics when the registry's symbol maps were cleared after this
    /// session started; every id this context handed out is stale then.
    pub fn assert_current_generation(&self) {
        assert_eq!(
            self.generation,
            self.registry.symbol_generation(),
            "checker session outlived a registry file-set change"
        );
    }

    pub fn node_type(&self, file: FileId, node: NodeIndex) -> Option<TypeId> {
        self.node_types.get(&file)?.get(&node).copied()
    }

    pub(crate) fn record_node_type(&mut self, node: NodeIndex, ty: TypeId) {
        if self.speculative > 0 {
            return;
        }
        self.node_types
            .entry(self.current_file)
            .or_default()
            .insert(node, ty);
    }

    pub fn current_scope(&self) -> Option<DeclId> {
        self.scopes.last().copied()
    }

    pub fn is_speculative(&self) -> bool {
        self.speculative > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contextual_frames_balance() {
        let mut stack = ContextualTypeStack::new();
        stack.push(NodeIndex(1), Some(TypeId::NUMBER));
        stack.push(NodeIndex(2), None);
        assert_eq!(stack.current(), None);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop(NodeIndex(2)), None);
        assert_eq!(stack.current(), Some(TypeId::NUMBER));
        assert_eq!(stack.pop(NodeIndex(1)), Some(TypeId::NUMBER));
        assert!(stack.is_empty());
    }

    #[test]
    #[should_panic(expected = "popped by")]
    fn contextual_pop_by_other_node_panics() {
        let mut stack = ContextualTypeStack::new();
        stack.push(NodeIndex(1), None);
        stack.pop(NodeIndex(7));
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn contextual_underflow_panics() {
        let mut stack = ContextualTypeStack::new();
        stack.pop(NodeIndex(0));
    }
}
