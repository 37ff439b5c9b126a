//! Symbol binding and name resolution.
//!
//! `bind` turns a declaration into its symbol. It is memoized through the
//! registry's declaration -> symbol map, so binding a declaration twice
//! yields the same symbol. Declarations that merge (interfaces, modules and
//! enums with the same name in one scope or at the top level of different
//! files, function overloads) share one symbol through the merge table.

use smallvec::SmallVec;
use sts_binder::declaration::escape_identifier;
use sts_binder::{DeclFlags, DeclId, DeclKind, Declaration, NamePartition};
use sts_parser::{NodeData, NodeIndex};
use sts_solver::TypeId;
use tracing::{debug, trace};

use crate::context::{MergeGroup, MergeKey, MergeScope};
use crate::state::CheckerState;
use crate::symbols::{
    ClassSymbol, EnumMemberSymbol, EnumSymbol, FunctionSymbol, InstantiatedSymbol,
    InterfaceSymbol, ModuleSymbol, Resolution, SignatureSymbol, Symbol, SymbolId, SymbolKind,
    TypeParameterSymbol, VariableSymbol,
};

/// What a name is looked up as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Meaning {
    Value,
    Type,
    Namespace,
}

impl Meaning {
    fn partitions(self) -> &'static [NamePartition] {
        match self {
            Meaning::Value => &[NamePartition::Value],
            Meaning::Type => &[NamePartition::TypeParameter, NamePartition::Type],
            Meaning::Namespace => &[NamePartition::Container],
        }
    }
}

fn merge_group(decl: &Declaration) -> Option<MergeGroup> {
    match decl.kind {
        DeclKind::Interface => Some(MergeGroup::Interface),
        DeclKind::Module => Some(MergeGroup::Module),
        DeclKind::Enum => Some(MergeGroup::Enum),
        DeclKind::Function if decl.has(DeclFlags::STATIC) => Some(MergeGroup::StaticFunction),
        DeclKind::Function => Some(MergeGroup::Function),
        _ => None,
    }
}

impl<'a> CheckerState<'a> {
    /// The symbol `decl` denotes. `None` for the file root and for ids of
    /// replaced file entries.
    pub fn bind(&mut self, decl_id: DeclId) -> Option<SymbolId> {
        if let Some(symbol) = self.registry().symbol_for_declaration(decl_id) {
            return Some(symbol);
        }
        let decl = self.declaration(decl_id)?;
        if decl.kind == DeclKind::Script {
            return None;
        }

        let key = self.merge_key(decl_id, decl);
        if let Some(key) = &key
            && let Some(&existing) = self.ctx.merged.get(key)
        {
            self.add_declaration(existing, decl_id, decl);
            return Some(existing);
        }

        let symbol = self.create_symbol(decl_id, decl);
        if let Some(key) = key {
            self.ctx.merged.insert(key, symbol);
        }
        debug!(name = %decl.display_name, kind = decl.kind.name(), ?symbol, "bound");
        Some(symbol)
    }

    fn merge_key(&mut self, decl_id: DeclId, decl: &Declaration) -> Option<MergeKey> {
        let group = merge_group(decl)?;
        if decl.name.is_empty() {
            return None;
        }
        let parent = decl.parent?;
        let scope = if parent.is_root() {
            MergeScope::Global
        } else {
            MergeScope::Symbol(self.bind(parent)?)
        };
        trace!(?decl_id, ?scope, "merge key");
        Some((scope, decl.name.clone(), group))
    }

    fn record(&mut self, symbol: SymbolId, decl_id: DeclId, decl: &Declaration) {
        if let Some(entry) = self.ctx.symbols.get_mut(symbol) {
            entry.declarations.push(decl_id);
            entry.flags |= decl.flags;
        }
        self.registry().record_declaration_symbol(decl_id, symbol);
    }

    fn create_symbol(&mut self, decl_id: DeclId, decl: &'a Declaration) -> SymbolId {
        let placeholder = match decl.kind {
            DeclKind::Module => SymbolKind::Module(ModuleSymbol {
                namespace_type: TypeId::ERROR,
                exports: Resolution::Unresolved,
            }),
            DeclKind::Class => SymbolKind::Class(ClassSymbol {
                type_params: Vec::new(),
                instance_type: TypeId::ERROR,
                constructor_type: TypeId::ERROR,
                base_class: None,
                base_type: None,
                implements: Vec::new(),
                heritage: Resolution::Unresolved,
                members: Resolution::Unresolved,
                statics: Resolution::Unresolved,
                constructors: Vec::new(),
                synthesized: Vec::new(),
            }),
            DeclKind::Interface => SymbolKind::Interface(InterfaceSymbol {
                type_params: Vec::new(),
                instance_type: TypeId::ERROR,
                extends: Vec::new(),
                heritage: Resolution::Unresolved,
                members: Resolution::Unresolved,
            }),
            DeclKind::Enum => SymbolKind::Enum(EnumSymbol {
                instance_type: TypeId::ERROR,
                namespace_type: TypeId::ERROR,
                members: Vec::new(),
            }),
            DeclKind::EnumMember => SymbolKind::EnumMember(EnumMemberSymbol {
                ordinal: decl.ordinal,
                parent_enum: SymbolId(u32::MAX),
            }),
            DeclKind::Function | DeclKind::FunctionExpression => {
                SymbolKind::Function(FunctionSymbol {
                    overloads: Vec::new(),
                    implementation: None,
                    type_id: Resolution::Unresolved,
                })
            }
            DeclKind::CallSignature | DeclKind::ConstructSignature => {
                SymbolKind::Signature(SignatureSymbol {
                    decl: Some(decl_id),
                    shape: Resolution::Unresolved,
                })
            }
            DeclKind::Parameter => SymbolKind::Parameter(VariableSymbol {
                type_id: Resolution::Unresolved,
            }),
            DeclKind::TypeParameter => SymbolKind::TypeParameter(TypeParameterSymbol {
                type_id: TypeId::ERROR,
                constraint: Resolution::Unresolved,
            }),
            DeclKind::Variable | DeclKind::IndexSignature => {
                SymbolKind::Variable(VariableSymbol {
                    type_id: Resolution::Unresolved,
                })
            }
            DeclKind::Script => unreachable!("script roots are never bound"),
        };

        let id = self
            .ctx
            .symbols
            .alloc(Symbol::new(&decl.display_name, placeholder));
        self.record(id, decl_id, decl);
        self.complete_symbol(id, decl_id, decl);
        id
    }

    /// Fill in the parts of a new symbol that need its own id.
    fn complete_symbol(&mut self, id: SymbolId, decl_id: DeclId, decl: &'a Declaration) {
        match decl.kind {
            DeclKind::Class | DeclKind::Interface => {
                let type_params = self.bind_type_parameters(decl_id);
                let constructor = self.ctx.types.class_constructor(id);
                let instance_type = if type_params.is_empty() {
                    self.ctx.types.reference(id)
                } else {
                    let args = type_params
                        .iter()
                        .map(|&param| self.ctx.types.type_param(param))
                        .collect();
                    self.ctx.types.application(id, args)
                };
                if let Some(symbol) = self.ctx.symbols.get_mut(id) {
                    match &mut symbol.kind {
                        SymbolKind::Class(class) => {
                            class.type_params = type_params;
                            class.instance_type = instance_type;
                            class.constructor_type = constructor;
                        }
                        SymbolKind::Interface(interface) => {
                            interface.type_params = type_params;
                            interface.instance_type = instance_type;
                        }
                        _ => {}
                    }
                }
            }
            DeclKind::Module => {
                let namespace = self.ctx.types.namespace(id);
                if let Some(Symbol {
                    kind: SymbolKind::Module(module),
                    ..
                }) = self.ctx.symbols.get_mut(id)
                {
                    module.namespace_type = namespace;
                }
            }
            DeclKind::Enum => {
                let instance = self.ctx.types.reference(id);
                let namespace = self.ctx.types.namespace(id);
                if let Some(Symbol {
                    kind: SymbolKind::Enum(enumeration),
                    ..
                }) = self.ctx.symbols.get_mut(id)
                {
                    enumeration.instance_type = instance;
                    enumeration.namespace_type = namespace;
                }
                self.bind_enum_members(id, decl_id);
            }
            DeclKind::EnumMember => {
                let parent = decl.parent.and_then(|parent| self.bind(parent));
                if let Some(parent) = parent
                    && let Some(Symbol {
                        kind: SymbolKind::EnumMember(member),
                        ..
                    }) = self.ctx.symbols.get_mut(id)
                {
                    member.parent_enum = parent;
                }
            }
            DeclKind::TypeParameter => {
                let type_param = self.ctx.types.type_param(id);
                if let Some(Symbol {
                    kind: SymbolKind::TypeParameter(param),
                    ..
                }) = self.ctx.symbols.get_mut(id)
                {
                    param.type_id = type_param;
                }
            }
            DeclKind::Function | DeclKind::FunctionExpression => {
                self.add_function_signature(id, decl_id, decl);
            }
            _ => {}
        }
    }

    /// Merge another declaration into an existing symbol.
    fn add_declaration(&mut self, symbol: SymbolId, decl_id: DeclId, decl: &'a Declaration) {
        self.record(symbol, decl_id, decl);
        match decl.kind {
            DeclKind::Function => self.add_function_signature(symbol, decl_id, decl),
            DeclKind::Enum => self.bind_enum_members(symbol, decl_id),
            _ => {}
        }
        debug!(name = %decl.display_name, ?symbol, "merged declaration");
    }

    /// Give a function symbol the signature of one more declaration. Body-less
    /// declarations are overloads; the one with a body is the implementation.
    fn add_function_signature(&mut self, function: SymbolId, decl_id: DeclId, decl: &Declaration) {
        let has_body = self
            .arena(decl_id.file)
            .is_some_and(|arena| match arena.data(decl.node) {
                NodeData::Function { body, .. } => body.is_some(),
                _ => false,
            });
        let mut signature = Symbol::new(
            &decl.display_name,
            SymbolKind::Signature(SignatureSymbol {
                decl: Some(decl_id),
                shape: Resolution::Unresolved,
            }),
        );
        signature.declarations.push(decl_id);
        signature.flags = decl.flags;
        let signature = self.ctx.symbols.alloc(signature);

        if let Some(Symbol {
            kind: SymbolKind::Function(function),
            ..
        }) = self.ctx.symbols.get_mut(function)
        {
            if has_body && function.implementation.is_none() {
                function.implementation = Some(signature);
            } else {
                function.overloads.push(signature);
            }
            function.type_id = Resolution::Unresolved;
        }
    }

    fn bind_enum_members(&mut self, enumeration: SymbolId, decl_id: DeclId) {
        let Some(tree) = self.registry().tree(decl_id.file) else {
            return;
        };
        let members: SmallVec<[SymbolId; 8]> = tree
            .children_of_kind(decl_id, DeclKind::EnumMember)
            .into_iter()
            .filter_map(|member| self.bind(member))
            .collect();
        if let Some(Symbol {
            kind: SymbolKind::Enum(symbol),
            ..
        }) = self.ctx.symbols.get_mut(enumeration)
        {
            symbol.members.extend(members);
        }
    }

    /// Type parameter symbols declared directly under `owner`, in order.
    pub(crate) fn bind_type_parameters(&mut self, owner: DeclId) -> Vec<SymbolId> {
        let Some(tree) = self.registry().tree(owner.file) else {
            return Vec::new();
        };
        tree.children_of_kind(owner, DeclKind::TypeParameter)
            .into_iter()
            .filter_map(|param| self.bind(param))
            .collect()
    }

    // =========================================================================
    // Generic instantiation
    // =========================================================================

    /// The specialization of `generic` for `args`, created on first request.
    pub fn instantiate_symbol(&mut self, generic: SymbolId, args: Vec<TypeId>) -> SymbolId {
        let key = (generic, args);
        if let Some(&existing) = self.ctx.instantiations.get(&key) {
            return existing;
        }
        let (generic, args) = key;
        let type_id = self.ctx.types.application(generic, args.clone());
        let (name, declarations) = match self.ctx.symbols.get(generic) {
            Some(symbol) => (symbol.name.clone(), symbol.declarations.clone()),
            None => (String::new(), SmallVec::new()),
        };
        let mut symbol = Symbol::new(
            &name,
            SymbolKind::Instantiated(InstantiatedSymbol {
                generic,
                args: args.clone(),
                type_id,
            }),
        );
        symbol.declarations = declarations;
        let id = self.ctx.symbols.alloc(symbol);
        trace!(?generic, ?id, "instantiated");
        self.ctx.instantiations.insert((generic, args), id);
        id
    }

    // =========================================================================
    // Name resolution
    // =========================================================================

    /// Resolve `name` as seen from `scope`: the scope chain innermost first,
    /// then the top level of every file.
    pub fn resolve_name(&self, scope: DeclId, name: &str, meaning: Meaning) -> Option<DeclId> {
        let key = escape_identifier(name);
        let registry = self.registry();
        let path = registry.parent_path(scope)?;
        for &container in path.iter().rev() {
            let Some(decl) = registry.declaration(container) else {
                continue;
            };
            if let Some(found) = self.lookup_in_container(decl, &key, meaning) {
                return Some(found);
            }
            if decl.kind == DeclKind::Module
                && let Some(found) = self.lookup_in_merged_module(container, &key, meaning)
            {
                return Some(found);
            }
        }
        self.lookup_global(&key, meaning)
    }

    fn lookup_in_container(
        &self,
        decl: &Declaration,
        key: &str,
        meaning: Meaning,
    ) -> Option<DeclId> {
        // Class and interface members are reached through `this` or a
        // value, never lexically; only their type parameters are in scope.
        if matches!(decl.kind, DeclKind::Class | DeclKind::Interface) {
            return match meaning {
                Meaning::Type => decl
                    .caches
                    .lookup(NamePartition::TypeParameter, key)
                    .first()
                    .copied(),
                _ => None,
            };
        }
        for &partition in meaning.partitions() {
            if let Some(&found) = decl.caches.lookup(partition, key).first() {
                return Some(found);
            }
        }
        if meaning == Meaning::Value {
            return self.class_as_value(decl.caches.lookup(NamePartition::Type, key));
        }
        None
    }

    /// A class name in value position denotes its constructor.
    fn class_as_value(&self, candidates: &[DeclId]) -> Option<DeclId> {
        candidates.iter().copied().find(|&candidate| {
            self.declaration(candidate)
                .is_some_and(|decl| decl.kind == DeclKind::Class)
        })
    }

    /// Exported names from other declarations of the module `container` belongs to.
    fn lookup_in_merged_module(&self, container: DeclId, key: &str, meaning: Meaning) -> Option<DeclId> {
        let symbol = self.registry().symbol_for_declaration(container)?;
        let declarations = &self.ctx.symbols.get(symbol)?.declarations;
        for &other in declarations.iter().filter(|&&other| other != container) {
            let Some(decl) = self.declaration(other) else {
                continue;
            };
            let exported = |found: &DeclId| {
                self.declaration(*found)
                    .is_some_and(|d| d.has(DeclFlags::EXPORTED))
            };
            for &partition in meaning.partitions() {
                if let Some(&found) = decl.caches.lookup(partition, key).iter().find(|f| exported(f)) {
                    return Some(found);
                }
            }
        }
        None
    }

    fn lookup_global(&self, key: &str, meaning: Meaning) -> Option<DeclId> {
        let registry = self.registry();
        for &partition in meaning.partitions() {
            if let Some(&found) = registry.find_global(key, partition).first() {
                return Some(found);
            }
        }
        if meaning == Meaning::Value {
            return self.class_as_value(&registry.find_global(key, NamePartition::Type));
        }
        None
    }

    /// Look `name` up among the members of a module or enum symbol.
    pub(crate) fn resolve_member_name(
        &self,
        container: SymbolId,
        name: &str,
        meaning: Meaning,
    ) -> Option<DeclId> {
        let key = escape_identifier(name);
        let symbol = self.ctx.symbols.get(container)?;
        for &decl_id in &symbol.declarations {
            let Some(decl) = self.declaration(decl_id) else {
                continue;
            };
            for &partition in meaning.partitions() {
                if let Some(&found) = decl.caches.lookup(partition, &key).first() {
                    return Some(found);
                }
            }
            if meaning == Meaning::Value
                && let Some(found) = self.class_as_value(decl.caches.lookup(NamePartition::Type, &key))
            {
                return Some(found);
            }
        }
        None
    }

    /// Resolve an identifier or qualified name node to a declaration.
    pub(crate) fn resolve_entity_name(
        &mut self,
        scope: DeclId,
        file: sts_binder::FileId,
        name: NodeIndex,
        meaning: Meaning,
    ) -> Option<DeclId> {
        let arena = self.arena(file)?;
        match arena.data(name) {
            NodeData::Identifier { text } => self.resolve_name(scope, text, meaning),
            NodeData::QualifiedName { left, right } => {
                let container_decl = self.resolve_entity_name(scope, file, *left, Meaning::Namespace)?;
                let container = self.bind(container_decl)?;
                let right = arena.identifier_text(*right)?;
                self.resolve_member_name(container, right, meaning)
            }
            _ => None,
        }
    }
}
