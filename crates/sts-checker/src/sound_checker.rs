//! Sound checking session: the two-pass driver and sticky freshness.
//!
//! `SoundChecker` owns one `CheckerState` for a compilation. Callers run
//! `build_signatures` for every file before `check_file` for any file;
//! checking a file before the whole set is built is a caller bug and panics.

use rustc_hash::FxHashMap;
use sts_binder::{DeclId, FileId, SemanticRegistry};
use sts_parser::NodeIndex;
use sts_solver::{TypeId, TypeInterner};
use tracing::{debug, info_span};

use crate::context::CheckerOptions;
use crate::runtime_tags::FileTags;
use crate::state::CheckerState;
use crate::symbol_binder::Meaning;
use crate::symbols::{Symbol, SymbolId};

/// Tracks bindings that still hold a fresh array or object literal.
///
/// A literal stays fresh through unannotated variables (`var a = [1, "x"];
/// var b = a;`) until the binding is used in a typed position, where it is
/// tagged like the literal itself would be and stops being fresh.
#[derive(Debug, Default)]
pub struct StickyFreshnessTracker {
    /// Fresh binding -> type of the literal it holds.
    fresh_bindings: FxHashMap<SymbolId, TypeId>,
}

impl StickyFreshnessTracker {
    pub fn new() -> Self {
        StickyFreshnessTracker {
            fresh_bindings: FxHashMap::default(),
        }
    }

    /// Mark a variable as initialized with a fresh literal.
    pub fn mark_binding_fresh(&mut self, symbol: SymbolId, source_type: TypeId) {
        self.fresh_bindings.insert(symbol, source_type);
    }

    /// Called when the binding flows into an annotated position or through
    /// a type assertion.
    pub fn consume_freshness(&mut self, symbol: SymbolId) {
        self.fresh_bindings.remove(&symbol);
    }

    pub fn is_binding_fresh(&self, symbol: SymbolId) -> bool {
        self.fresh_bindings.contains_key(&symbol)
    }

    #[cfg(test)]
    pub(crate) fn fresh_source_type(&self, symbol: SymbolId) -> Option<TypeId> {
        self.fresh_bindings.get(&symbol).copied()
    }

    /// `var b = a` where `a` is fresh makes `b` fresh as well.
    pub fn transfer_freshness(&mut self, from: SymbolId, to: SymbolId) {
        if let Some(source_type) = self.fresh_bindings.get(&from).copied() {
            self.fresh_bindings.insert(to, source_type);
        }
    }

    pub fn clear(&mut self) {
        self.fresh_bindings.clear();
    }

    #[cfg(test)]
    pub(crate) fn fresh_binding_count(&self) -> usize {
        self.fresh_bindings.len()
    }
}

/// One checking session over a registry's file set.
pub struct SoundChecker<'a> {
    state: CheckerState<'a>,
}

impl<'a> SoundChecker<'a> {
    pub fn new(registry: &'a SemanticRegistry, options: CheckerOptions) -> Self {
        SoundChecker {
            state: CheckerState::new(registry, options),
        }
    }

    pub fn options(&self) -> CheckerOptions {
        self.state.ctx.options
    }

    /// Pass 1 for one file.
    pub fn build_signatures(&mut self, file: FileId) {
        self.state.ctx.assert_current_generation();
        let _span = info_span!("build_signatures", file = file.0).entered();
        self.state.build_file_signatures(file);
    }

    /// Pass 2 for one file.
    ///
    /// Panics unless pass 1 has run for every file in the registry.
    pub fn check_file(&mut self, file: FileId) {
        self.state.ctx.assert_current_generation();
        let registry = self.state.ctx.registry;
        let unbuilt: Vec<&str> = registry
            .files()
            .filter(|entry| !self.state.ctx.signatures_built.contains(&entry.id))
            .map(|entry| entry.path.as_str())
            .collect();
        assert!(
            unbuilt.is_empty(),
            "check pass started before signatures were built for {unbuilt:?}"
        );
        if !self.state.ctx.options.sound || !self.state.ctx.files_checked.insert(file) {
            return;
        }
        let _span = info_span!("check_file", file = file.0).entered();
        self.state.ctx.freshness.clear();
        self.state.check_source_file(file);
        self.state.synthesize_descriptors(file);
        debug!(file = file.0, "checked");
    }

    /// Both passes over every file, in file-list order.
    pub fn check_program(&mut self) {
        let files: Vec<FileId> = self.state.ctx.registry.files().map(|entry| entry.id).collect();
        for &file in &files {
            self.build_signatures(file);
        }
        for &file in &files {
            self.check_file(file);
        }
    }

    pub fn bind_declaration(&mut self, decl: DeclId) -> Option<SymbolId> {
        self.state.bind(decl)
    }

    pub fn symbol(&self, symbol: SymbolId) -> Option<&Symbol> {
        self.state.ctx.symbols.get(symbol)
    }

    /// Declared or inferred type of a bound symbol.
    pub fn type_of_symbol(&mut self, symbol: SymbolId) -> TypeId {
        self.state.type_of_symbol(symbol)
    }

    /// Look `name` up from `scope` the way a value or type reference would.
    pub fn resolve_name(&self, scope: DeclId, name: &str, meaning: Meaning) -> Option<DeclId> {
        self.state.resolve_name(scope, name, meaning)
    }

    /// Static type pass 2 recorded for an expression node.
    pub fn expression_type(&self, file: FileId, node: NodeIndex) -> Option<TypeId> {
        self.state.ctx.node_type(file, node)
    }

    pub fn format_type(&self, ty: TypeId) -> String {
        self.state.format_type(ty)
    }

    pub fn is_subtype_of(&self, source: TypeId, target: TypeId) -> bool {
        self.state.is_subtype_of(source, target)
    }

    pub fn types(&self) -> &TypeInterner {
        &self.state.ctx.types
    }

    /// Tag annotations and descriptors of a checked file.
    pub fn file_tags(&self, file: FileId) -> Option<&FileTags> {
        self.state.ctx.tags.get(&file)
    }

    pub fn state_mut(&mut self) -> &mut CheckerState<'a> {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sticky_freshness_basic() {
        let mut tracker = StickyFreshnessTracker::new();
        let symbol = SymbolId(1);
        assert!(!tracker.is_binding_fresh(symbol));

        tracker.mark_binding_fresh(symbol, TypeId::NUMBER);
        assert!(tracker.is_binding_fresh(symbol));
        assert_eq!(tracker.fresh_source_type(symbol), Some(TypeId::NUMBER));

        tracker.consume_freshness(symbol);
        assert!(!tracker.is_binding_fresh(symbol));
        assert_eq!(tracker.fresh_binding_count(), 0);
    }

    #[test]
    fn sticky_freshness_transfer() {
        let mut tracker = StickyFreshnessTracker::new();
        let a = SymbolId(1);
        let b = SymbolId(2);
        let c = SymbolId(3);

        tracker.mark_binding_fresh(a, TypeId::STRING);
        tracker.transfer_freshness(a, b);
        assert!(tracker.is_binding_fresh(b));
        assert_eq!(tracker.fresh_source_type(b), Some(TypeId::STRING));

        // Consuming one binding leaves the other fresh.
        tracker.consume_freshness(a);
        assert!(tracker.is_binding_fresh(b));

        tracker.transfer_freshness(a, c);
        assert!(!tracker.is_binding_fresh(c));
    }

    #[test]
    fn sticky_freshness_clear() {
        let mut tracker = StickyFreshnessTracker::new();
        tracker.mark_binding_fresh(SymbolId(1), TypeId::ANY);
        tracker.mark_binding_fresh(SymbolId(2), TypeId::ANY);
        assert_eq!(tracker.fresh_binding_count(), 2);
        tracker.clear();
        assert_eq!(tracker.fresh_binding_count(), 0);
    }
}
