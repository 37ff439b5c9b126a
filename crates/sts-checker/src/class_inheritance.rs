//! Heritage resolution and inheritance cycle detection.
//!
//! Heritage is first collected as written (`heritage_clauses`), then cut:
//! a clause whose base can reach the derived symbol again through written
//! heritage reports 2506 and is dropped, so every later walk over bases
//! terminates. Every class in a cycle reports at its own clause.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use sts_binder::{DeclKind, FileId};
use sts_common::diagnostics::diagnostic_codes;
use sts_parser::{NodeData, NodeIndex};
use sts_solver::{TypeId, TypeKey};
use tracing::debug;

use crate::state::CheckerState;
use crate::symbols::{Resolution, Symbol, SymbolId, SymbolKind};

/// One `extends` entry as written.
#[derive(Clone, Debug)]
pub struct HeritageClause {
    /// Class or interface the clause names.
    pub base: SymbolId,
    /// The clause's type, e.g. `Base<number>`.
    pub type_id: TypeId,
    pub file: FileId,
    pub node: NodeIndex,
}

impl<'a> CheckerState<'a> {
    /// `extends` clauses of a class or of every declaration of an interface.
    pub(crate) fn heritage_clauses(&mut self, symbol: SymbolId) -> Rc<[HeritageClause]> {
        if let Some(clauses) = self.ctx.heritage_clauses.get(&symbol) {
            return Rc::clone(clauses);
        }
        // Guards re-entry through a base that names this symbol again.
        self.ctx.heritage_clauses.insert(symbol, Rc::from(Vec::new()));

        let declarations = match self.ctx.symbols.get(symbol) {
            Some(entry) => entry.declarations.clone(),
            None => Default::default(),
        };
        let mut clauses = Vec::new();
        for decl_id in declarations {
            let (Some(decl), Some(arena)) = (self.declaration(decl_id), self.arena(decl_id.file))
            else {
                continue;
            };
            let nodes: Vec<NodeIndex> = match (decl.kind, arena.data(decl.node)) {
                (DeclKind::Class, NodeData::Class { extends, .. }) if extends.is_some() => {
                    vec![*extends]
                }
                (DeclKind::Interface, NodeData::Interface { extends, .. }) => {
                    extends.iter().collect()
                }
                _ => Vec::new(),
            };
            for node in nodes {
                let type_id = self.type_from_node(decl_id.file, node, decl_id);
                let base = match self.ctx.types.lookup(type_id).as_deref() {
                    Some(TypeKey::Ref(base) | TypeKey::Application { base, .. }) => *base,
                    _ => continue,
                };
                clauses.push(HeritageClause {
                    base,
                    type_id,
                    file: decl_id.file,
                    node,
                });
            }
        }
        let clauses: Rc<[HeritageClause]> = Rc::from(clauses);
        self.ctx.heritage_clauses.insert(symbol, Rc::clone(&clauses));
        clauses
    }

    /// Whether written heritage leads from `from` back to `target`.
    fn reaches(&mut self, from: SymbolId, target: SymbolId) -> bool {
        let mut visited = FxHashSet::default();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(self.heritage_clauses(current).iter().map(|clause| clause.base));
        }
        false
    }

    /// Resolve a class's base class and implemented interfaces, or an
    /// interface's extended types, cutting cyclic edges.
    pub(crate) fn resolve_heritage(&mut self, symbol: SymbolId) {
        let is_class = match self.ctx.symbols.get(symbol).map(|s| &s.kind) {
            Some(SymbolKind::Class(class)) if class.heritage.is_unresolved() => true,
            Some(SymbolKind::Interface(interface)) if interface.heritage.is_unresolved() => false,
            _ => return,
        };
        self.set_heritage_state(symbol, Resolution::Resolving);

        let name = self
            .ctx
            .symbols
            .get(symbol)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        let mut accepted = Vec::new();
        for clause in self.heritage_clauses(symbol).iter() {
            if self.reaches(clause.base, symbol) {
                debug!(%name, base = ?clause.base, "inheritance cycle, edge cut");
                self.report(
                    clause.file,
                    clause.node,
                    diagnostic_codes::TYPE_RECURSIVELY_REFERENCES_ITSELF_AS_BASE,
                    vec![name.clone()],
                );
                continue;
            }
            accepted.push(clause.clone());
        }

        if is_class {
            let base = accepted.into_iter().find(|clause| {
                self.ctx
                    .symbols
                    .get(clause.base)
                    .is_some_and(Symbol::is_class)
            });
            let implements = self.implemented_types(symbol);
            if let Some(Symbol {
                kind: SymbolKind::Class(class),
                ..
            }) = self.ctx.symbols.get_mut(symbol)
            {
                class.base_class = base.as_ref().map(|clause| clause.base);
                class.base_type = base.map(|clause| clause.type_id);
                class.implements = implements;
            }
        } else if let Some(Symbol {
            kind: SymbolKind::Interface(interface),
            ..
        }) = self.ctx.symbols.get_mut(symbol)
        {
            interface.extends = accepted.into_iter().map(|clause| clause.type_id).collect();
        }
        self.set_heritage_state(symbol, Resolution::Resolved(()));
    }

    fn implemented_types(&mut self, class: SymbolId) -> Vec<TypeId> {
        let Some(decl_id) = self.ctx.symbols.get(class).and_then(Symbol::first_declaration) else {
            return Vec::new();
        };
        let (Some(decl), Some(arena)) = (self.declaration(decl_id), self.arena(decl_id.file)) else {
            return Vec::new();
        };
        let NodeData::Class { implements, .. } = arena.data(decl.node) else {
            return Vec::new();
        };
        implements
            .iter()
            .map(|node| self.type_from_node(decl_id.file, node, decl_id))
            .collect()
    }

    fn set_heritage_state(&mut self, symbol: SymbolId, state: Resolution<()>) {
        match self.ctx.symbols.get_mut(symbol).map(|s| &mut s.kind) {
            Some(SymbolKind::Class(class)) => class.heritage = state,
            Some(SymbolKind::Interface(interface)) => interface.heritage = state,
            _ => {}
        }
    }
}
