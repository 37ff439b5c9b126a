//! `CheckerState`: the checker's mutable entry point.
//!
//! Binding, type resolution and both passes are `impl CheckerState` blocks
//! spread over the crate's modules. This file holds the plumbing they share:
//! registry access, diagnostic reporting, and the scoped helpers that keep
//! the context stacks balanced.

use sts_binder::{DeclId, Declaration, FileEntry, FileId, SemanticRegistry};
use sts_common::{Diagnostic, Span};
use sts_parser::{NodeArena, NodeIndex};
use sts_solver::{SubtypeChecker, TypeFormatter, TypeId};
use tracing::trace;

use crate::context::{CheckerContext, CheckerOptions, FunctionFrame};

pub struct CheckerState<'a> {
    pub ctx: CheckerContext<'a>,
}

impl<'a> CheckerState<'a> {
    pub fn new(registry: &'a SemanticRegistry, options: CheckerOptions) -> Self {
        CheckerState {
            ctx: CheckerContext::new(registry, options),
        }
    }

    // =========================================================================
    // Registry access
    // =========================================================================

    pub(crate) fn registry(&self) -> &'a SemanticRegistry {
        self.ctx.registry
    }

    pub(crate) fn entry(&self, file: FileId) -> Option<&'a FileEntry> {
        self.registry().entry_by_id(file)
    }

    pub(crate) fn arena(&self, file: FileId) -> Option<&'a NodeArena> {
        self.entry(file).map(|entry| &entry.parsed.arena)
    }

    pub(crate) fn current_arena(&self) -> Option<&'a NodeArena> {
        self.arena(self.ctx.current_file)
    }

    pub(crate) fn declaration(&self, id: DeclId) -> Option<&'a Declaration> {
        self.registry().declaration(id)
    }

    pub(crate) fn declaration_for_node(&self, node: NodeIndex) -> Option<DeclId> {
        self.registry().declaration_for(self.ctx.current_file, node)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Report against `node` in the current file. Dropped while inferring.
    pub(crate) fn error_at(&self, node: NodeIndex, code: u32, args: Vec<String>) {
        if self.ctx.is_speculative() {
            return;
        }
        self.report(self.ctx.current_file, node, code, args);
    }

    /// Report regardless of speculation. For facts computed exactly once.
    pub(crate) fn report(&self, file: FileId, node: NodeIndex, code: u32, args: Vec<String>) {
        let span = self.arena(file).map(|arena| arena.span(node)).unwrap_or_default();
        self.report_span(file, span, code, args);
    }

    pub(crate) fn report_span(&self, file: FileId, span: Span, code: u32, args: Vec<String>) {
        let path = self.entry(file).map(|entry| entry.path.as_str());
        trace!(code, file = path.unwrap_or("<global>"), "diagnostic");
        self.registry()
            .add_diagnostic(path, Diagnostic::new(path, span, code, args));
    }

    // =========================================================================
    // Types
    // =========================================================================

    pub fn format_type(&self, ty: TypeId) -> String {
        TypeFormatter::with_resolver(&self.ctx.types, &self.ctx).format(ty)
    }

    pub fn is_subtype_of(&self, source: TypeId, target: TypeId) -> bool {
        SubtypeChecker::new(&self.ctx.types, &self.ctx).is_subtype_of(source, target)
    }

    // =========================================================================
    // Scoped helpers
    // =========================================================================

    /// Run `f` with `expected` pushed as the contextual type of `node`.
    pub(crate) fn with_contextual<R>(
        &mut self,
        node: NodeIndex,
        expected: Option<TypeId>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.ctx.contextual.push(node, expected);
        let result = f(self);
        self.ctx.contextual.pop(node);
        result
    }

    /// Run `f` with reporting and tagging switched off.
    pub(crate) fn speculatively<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.ctx.speculative += 1;
        let result = f(self);
        self.ctx.speculative -= 1;
        result
    }

    /// Run `f` as if walking `file`. The scope stack is per file and restored.
    pub(crate) fn in_file<R>(&mut self, file: FileId, f: impl FnOnce(&mut Self) -> R) -> R {
        if file == self.ctx.current_file {
            return f(self);
        }
        let previous = std::mem::replace(&mut self.ctx.current_file, file);
        let scopes = std::mem::take(&mut self.ctx.scopes);
        let result = f(self);
        self.ctx.scopes = scopes;
        self.ctx.current_file = previous;
        result
    }

    pub(crate) fn in_scope<R>(&mut self, scope: DeclId, f: impl FnOnce(&mut Self) -> R) -> R {
        self.ctx.scopes.push(scope);
        let result = f(self);
        self.ctx.scopes.pop();
        result
    }

    pub(crate) fn with_this<R>(&mut self, this_type: TypeId, f: impl FnOnce(&mut Self) -> R) -> R {
        self.ctx.this_types.push(this_type);
        let result = f(self);
        self.ctx.this_types.pop();
        result
    }

    /// Run `f` as the body of a function returning `return_type`
    /// (`None` to infer). Returns `f`'s result and the finished frame.
    pub(crate) fn in_function<R>(
        &mut self,
        return_type: Option<TypeId>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> (R, FunctionFrame) {
        self.ctx.functions.push(FunctionFrame {
            return_type,
            inferred_return: None,
            has_return_value: false,
        });
        let result = f(self);
        let frame = match self.ctx.functions.pop() {
            Some(frame) => frame,
            None => unreachable!("function frame stack underflow"),
        };
        (result, frame)
    }

    /// Evaluate something declared in `decl`'s file and scope from wherever
    /// the walk currently is, without reporting.
    pub(crate) fn infer_in<R>(&mut self, scope: DeclId, f: impl FnOnce(&mut Self) -> R) -> R {
        let contextual_depth = self.ctx.contextual.depth();
        let result = self.in_file(scope.file, |state| {
            state.speculatively(|state| state.in_scope(scope, f))
        });
        debug_assert_eq!(contextual_depth, self.ctx.contextual.depth());
        result
    }
}
