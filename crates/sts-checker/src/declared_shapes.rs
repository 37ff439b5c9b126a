//! Member shapes of classes, interfaces and modules.
//!
//! A class contributes two shapes: its instance members (inherited members
//! first, own members override) and its static side, which carries the
//! construct signatures. A class without a constructor gets a synthesized
//! one that takes its base constructor's parameters. Interface shapes merge
//! every declaration of the interface plus the shapes it extends. A module's
//! shape is its exported values.

use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use sts_binder::declaration::internal_names;
use sts_binder::{DeclFlags, DeclId, DeclKind, Declaration};
use sts_solver::{
    ObjectShape, PropertyInfo, SignatureShape, TypeId, TypeKey, TypeResolver, TypeSubstitution,
    instantiate_signature,
};
use tracing::debug;

use crate::state::CheckerState;
use crate::symbols::{Resolution, SignatureSymbol, Symbol, SymbolId, SymbolKind};

/// Accumulates a shape; later members replace earlier ones of the same name.
#[derive(Default)]
struct ShapeBuilder {
    properties: IndexMap<String, PropertyInfo>,
    shape: ObjectShape,
}

impl ShapeBuilder {
    fn inherit(&mut self, base: &ObjectShape, with_signatures: bool) {
        for property in &base.properties {
            self.properties
                .insert(property.name.clone(), property.clone());
        }
        if with_signatures {
            self.shape
                .call_signatures
                .extend(base.call_signatures.iter().cloned());
            self.shape
                .construct_signatures
                .extend(base.construct_signatures.iter().cloned());
        }
        self.shape.string_index = self.shape.string_index.or(base.string_index);
        self.shape.number_index = self.shape.number_index.or(base.number_index);
    }

    fn property(&mut self, property: PropertyInfo) {
        self.properties.insert(property.name.clone(), property);
    }

    fn finish(mut self) -> Rc<ObjectShape> {
        self.shape.properties = self.properties.into_values().collect();
        self.shape.normalize();
        Rc::new(self.shape)
    }
}

fn push_shape_types(shape: &ObjectShape, stack: &mut Vec<TypeId>) {
    stack.extend(shape.properties.iter().map(|property| property.type_id));
    for signature in shape
        .call_signatures
        .iter()
        .chain(shape.construct_signatures.iter())
    {
        stack.extend(signature.params.iter().map(|param| param.type_id));
        stack.push(signature.return_type);
    }
    stack.extend(shape.string_index);
    stack.extend(shape.number_index);
}

/// Which side of a class a member belongs to.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Instance,
    Static,
}

impl<'a> CheckerState<'a> {
    /// Structural view of any type, resolving member shapes on demand.
    pub fn shape_of_type(&mut self, ty: TypeId) -> Option<Rc<ObjectShape>> {
        let key = self.ctx.types.lookup(ty)?;
        match key.as_ref() {
            TypeKey::Ref(symbol) | TypeKey::Application { base: symbol, .. } => {
                self.resolve_members(*symbol);
            }
            TypeKey::ClassConstructor(symbol) => {
                self.class_statics(*symbol);
            }
            TypeKey::Namespace(symbol) => {
                self.module_exports(*symbol);
            }
            TypeKey::TypeParameter(param) => {
                let constraint = self.type_parameter_constraint(*param)?;
                return self.shape_of_type(constraint);
            }
            _ => {}
        }
        self.ctx.object_shape(ty)
    }

    /// Resolve the member shapes of every named type reachable from `ty`.
    /// The solver reads shapes without resolving them, so both sides of a
    /// relation go through here first.
    pub(crate) fn resolve_type_deeply(&mut self, ty: TypeId) {
        let mut stack = vec![ty];
        while let Some(ty) = stack.pop() {
            if ty.is_intrinsic() || !self.ctx.resolved_types.insert(ty) {
                continue;
            }
            let Some(key) = self.ctx.types.lookup(ty) else {
                continue;
            };
            match key.as_ref() {
                TypeKey::Array(element) => stack.push(*element),
                TypeKey::Tuple(shape) => stack.extend(shape.elements.iter().copied()),
                TypeKey::Application { args, .. } => {
                    stack.extend(args.iter().copied());
                    if let Some(shape) = self.shape_of_type(ty) {
                        push_shape_types(&shape, &mut stack);
                    }
                }
                TypeKey::Intrinsic(_) => {}
                _ => {
                    if let Some(shape) = self.shape_of_type(ty) {
                        push_shape_types(&shape, &mut stack);
                    }
                }
            }
        }
    }

    /// Instance members of a class or members of an interface.
    pub(crate) fn resolve_members(&mut self, symbol: SymbolId) -> Option<Rc<ObjectShape>> {
        match self.ctx.symbols.get(symbol).map(|s| &s.kind) {
            Some(SymbolKind::Class(_)) => self.class_members(symbol),
            Some(SymbolKind::Interface(_)) => self.interface_members(symbol),
            Some(SymbolKind::Instantiated(inst)) => {
                let generic = inst.generic;
                self.resolve_members(generic)
            }
            _ => None,
        }
    }

    // =========================================================================
    // Classes
    // =========================================================================

    pub(crate) fn class_members(&mut self, symbol: SymbolId) -> Option<Rc<ObjectShape>> {
        match &self.ctx.symbols.get(symbol)?.kind {
            SymbolKind::Class(class) => match &class.members {
                Resolution::Resolved(shape) => return Some(Rc::clone(shape)),
                Resolution::Resolving => return None,
                Resolution::Unresolved => {}
            },
            _ => return None,
        }
        self.set_class_members(symbol, Resolution::Resolving);
        self.resolve_heritage(symbol);

        let mut builder = ShapeBuilder::default();
        let base_type = match &self.ctx.symbols.get(symbol)?.kind {
            SymbolKind::Class(class) => class.base_type,
            _ => None,
        };
        if let Some(base_type) = base_type
            && let Some(base) = self.shape_of_type(base_type)
        {
            builder.inherit(&base, false);
        }
        self.collect_members(symbol, Side::Instance, &mut builder);

        let shape = builder.finish();
        debug!(symbol = ?symbol, members = shape.properties.len(), "class members");
        self.set_class_members(symbol, Resolution::Resolved(Rc::clone(&shape)));
        Some(shape)
    }

    /// The static side: static members plus construct signatures.
    pub(crate) fn class_statics(&mut self, symbol: SymbolId) -> Option<Rc<ObjectShape>> {
        match &self.ctx.symbols.get(symbol)?.kind {
            SymbolKind::Class(class) => match &class.statics {
                Resolution::Resolved(shape) => return Some(Rc::clone(shape)),
                Resolution::Resolving => return None,
                Resolution::Unresolved => {}
            },
            _ => return None,
        }
        self.set_class_statics(symbol, Resolution::Resolving);
        self.resolve_heritage(symbol);

        let (base_class, base_type) = match &self.ctx.symbols.get(symbol)?.kind {
            SymbolKind::Class(class) => (class.base_class, class.base_type),
            _ => (None, None),
        };
        let mut builder = ShapeBuilder::default();
        let base_statics = base_class.and_then(|base| self.class_statics(base));
        if let Some(base_statics) = &base_statics {
            builder.inherit(base_statics, false);
        }
        self.collect_members(symbol, Side::Static, &mut builder);

        let constructors = self.constructor_signatures(symbol, base_class, base_type, base_statics);
        builder.shape.construct_signatures = constructors
            .iter()
            .map(|&signature| self.signature_of(signature))
            .collect();
        if let Some(Symbol {
            kind: SymbolKind::Class(class),
            ..
        }) = self.ctx.symbols.get_mut(symbol)
        {
            class.constructors = constructors;
        }

        let shape = builder.finish();
        self.set_class_statics(symbol, Resolution::Resolved(Rc::clone(&shape)));
        Some(shape)
    }

    /// Declared constructors, or one synthesized from the base constructor.
    fn constructor_signatures(
        &mut self,
        class: SymbolId,
        base_class: Option<SymbolId>,
        base_type: Option<TypeId>,
        base_statics: Option<Rc<ObjectShape>>,
    ) -> Vec<SymbolId> {
        let Some(decl_id) = self.ctx.symbols.get(class).and_then(Symbol::first_declaration) else {
            return Vec::new();
        };
        let Some(tree) = self.registry().tree(decl_id.file) else {
            return Vec::new();
        };
        let declared: Vec<DeclId> = tree
            .children_of_kind(decl_id, DeclKind::ConstructSignature)
            .into_iter()
            .filter(|&child| {
                self.declaration(child)
                    .is_some_and(|decl| decl.has(DeclFlags::CONSTRUCTOR))
            })
            .collect();
        if !declared.is_empty() {
            let signatures: Vec<(SymbolId, bool)> = declared
                .into_iter()
                .filter_map(|ctor| {
                    let symbol = self.bind(ctor)?;
                    Some((symbol, self.has_body(ctor)))
                })
                .collect();
            let overloads: Vec<SymbolId> = signatures
                .iter()
                .filter(|(_, has_body)| !has_body)
                .map(|&(symbol, _)| symbol)
                .collect();
            return if overloads.is_empty() {
                signatures.into_iter().map(|(symbol, _)| symbol).collect()
            } else {
                overloads
            };
        }
        self.synthesize_constructor(class, decl_id, base_class, base_type, base_statics)
    }

    fn has_body(&self, decl_id: DeclId) -> bool {
        let (Some(decl), Some(arena)) = (self.declaration(decl_id), self.arena(decl_id.file)) else {
            return false;
        };
        matches!(
            arena.data(decl.node),
            sts_parser::NodeData::Function { body, .. } if body.is_some()
        )
    }

    fn synthesize_constructor(
        &mut self,
        class: SymbolId,
        class_decl: DeclId,
        base_class: Option<SymbolId>,
        base_type: Option<TypeId>,
        base_statics: Option<Rc<ObjectShape>>,
    ) -> Vec<SymbolId> {
        let (type_params, instance_type) = match self.ctx.symbols.get(class).map(|s| &s.kind) {
            Some(SymbolKind::Class(symbol)) => (symbol.type_params.clone(), symbol.instance_type),
            _ => return Vec::new(),
        };

        // Base constructor parameters, specialized to the written base type.
        let subst = match (base_class, base_type.and_then(|ty| self.ctx.types.lookup(ty))) {
            (Some(base), Some(key)) => match key.as_ref() {
                TypeKey::Application { args, .. } => {
                    let params = self
                        .ctx
                        .symbols
                        .get(base)
                        .map(|s| s.type_params().to_vec())
                        .unwrap_or_default();
                    TypeSubstitution::from_args(&params, args)
                }
                _ => TypeSubstitution::new(),
            },
            _ => TypeSubstitution::new(),
        };
        let inherited: Vec<SignatureShape> = base_statics
            .map(|statics| statics.construct_signatures.clone())
            .unwrap_or_default();
        let shapes: Vec<SignatureShape> = if inherited.is_empty() {
            vec![SignatureShape {
                type_params: type_params.clone(),
                ..SignatureShape::new(Vec::new(), instance_type)
            }]
        } else {
            inherited
                .iter()
                .map(|base| {
                    let mut shape = instantiate_signature(&self.ctx.types, base, &subst);
                    shape.type_params = type_params.clone();
                    shape.return_type = instance_type;
                    shape
                })
                .collect()
        };

        let synthesized = Declaration::synthesized(
            internal_names::CONSTRUCTOR,
            DeclKind::ConstructSignature,
            DeclFlags::CONSTRUCTOR,
            class_decl,
        );
        let mut ids = Vec::with_capacity(shapes.len());
        for shape in shapes {
            let mut signature = Symbol::new(
                "constructor",
                SymbolKind::Signature(SignatureSymbol {
                    decl: None,
                    shape: Resolution::Resolved(shape),
                }),
            );
            signature.flags = synthesized.flags;
            ids.push(self.ctx.symbols.alloc(signature));
        }
        if let Some(Symbol {
            kind: SymbolKind::Class(symbol),
            ..
        }) = self.ctx.symbols.get_mut(class)
        {
            symbol.synthesized.push(synthesized);
        }
        debug!(?class, count = ids.len(), "synthesized constructor");
        ids
    }

    /// Properties and methods declared directly on a class or interface.
    fn collect_members(&mut self, symbol: SymbolId, side: Side, builder: &mut ShapeBuilder) {
        let declarations = match self.ctx.symbols.get(symbol) {
            Some(entry) => entry.declarations.clone(),
            None => return,
        };
        let mut seen = FxHashSet::default();
        for decl_id in declarations {
            let Some(decl) = self.declaration(decl_id) else {
                continue;
            };
            for &child_id in &decl.children {
                let Some(child) = self.declaration(child_id) else {
                    continue;
                };
                let is_static = child.has(DeclFlags::STATIC);
                if is_static != (side == Side::Static) {
                    continue;
                }
                let optional = child.has(DeclFlags::OPTIONAL);
                match child.kind {
                    DeclKind::Variable if child.has(DeclFlags::PROPERTY) => {
                        let Some(member) = self.bind(child_id) else {
                            continue;
                        };
                        let ty = self.variable_type(member);
                        builder.property(PropertyInfo {
                            optional,
                            ..PropertyInfo::new(&child.display_name, ty)
                        });
                    }
                    DeclKind::Function if child.has(DeclFlags::METHOD) => {
                        let Some(member) = self.bind(child_id) else {
                            continue;
                        };
                        if !seen.insert(member) {
                            continue;
                        }
                        let ty = self.function_type(member);
                        builder.property(PropertyInfo {
                            optional,
                            ..PropertyInfo::method(&child.display_name, ty)
                        });
                    }
                    DeclKind::IndexSignature if side == Side::Instance => {
                        let Some(member) = self.bind(child_id) else {
                            continue;
                        };
                        let value = self.variable_type(member);
                        let key = self.index_key_type(child_id);
                        if key == TypeId::NUMBER {
                            builder.shape.number_index = Some(value);
                        } else {
                            builder.shape.string_index = Some(value);
                        }
                    }
                    DeclKind::CallSignature | DeclKind::ConstructSignature
                        if decl.kind == DeclKind::Interface =>
                    {
                        let Some(signature) = self.bind(child_id) else {
                            continue;
                        };
                        let shape = self.signature_of(signature);
                        if child.kind == DeclKind::CallSignature {
                            builder.shape.call_signatures.push(shape);
                        } else {
                            builder.shape.construct_signatures.push(shape);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    fn index_key_type(&mut self, decl_id: DeclId) -> TypeId {
        let (Some(decl), Some(arena)) = (self.declaration(decl_id), self.arena(decl_id.file)) else {
            return TypeId::STRING;
        };
        match arena.data(decl.node) {
            sts_parser::NodeData::IndexSignature { key_type, .. } => {
                let scope = decl.parent.unwrap_or(decl_id);
                self.type_from_node(decl_id.file, *key_type, scope)
            }
            _ => TypeId::STRING,
        }
    }

    fn set_class_members(&mut self, symbol: SymbolId, state: Resolution<Rc<ObjectShape>>) {
        if let Some(Symbol {
            kind: SymbolKind::Class(class),
            ..
        }) = self.ctx.symbols.get_mut(symbol)
        {
            class.members = state;
        }
    }

    fn set_class_statics(&mut self, symbol: SymbolId, state: Resolution<Rc<ObjectShape>>) {
        if let Some(Symbol {
            kind: SymbolKind::Class(class),
            ..
        }) = self.ctx.symbols.get_mut(symbol)
        {
            class.statics = state;
        }
    }

    // =========================================================================
    // Interfaces
    // =========================================================================

    pub(crate) fn interface_members(&mut self, symbol: SymbolId) -> Option<Rc<ObjectShape>> {
        match &self.ctx.symbols.get(symbol)?.kind {
            SymbolKind::Interface(interface) => match &interface.members {
                Resolution::Resolved(shape) => return Some(Rc::clone(shape)),
                Resolution::Resolving => return None,
                Resolution::Unresolved => {}
            },
            _ => return None,
        }
        self.set_interface_members(symbol, Resolution::Resolving);
        self.resolve_heritage(symbol);

        let extends = match &self.ctx.symbols.get(symbol)?.kind {
            SymbolKind::Interface(interface) => interface.extends.clone(),
            _ => Vec::new(),
        };
        let mut builder = ShapeBuilder::default();
        for base in extends {
            if let Some(shape) = self.shape_of_type(base) {
                builder.inherit(&shape, true);
            }
        }
        self.collect_members(symbol, Side::Instance, &mut builder);

        let shape = builder.finish();
        self.set_interface_members(symbol, Resolution::Resolved(Rc::clone(&shape)));
        Some(shape)
    }

    fn set_interface_members(&mut self, symbol: SymbolId, state: Resolution<Rc<ObjectShape>>) {
        if let Some(Symbol {
            kind: SymbolKind::Interface(interface),
            ..
        }) = self.ctx.symbols.get_mut(symbol)
        {
            interface.members = state;
        }
    }

    // =========================================================================
    // Modules
    // =========================================================================

    /// Exported values of every declaration of a module.
    pub(crate) fn module_exports(&mut self, symbol: SymbolId) -> Option<Rc<ObjectShape>> {
        let declarations = match self.ctx.symbols.get(symbol)? {
            Symbol {
                kind: SymbolKind::Module(module),
                declarations,
                ..
            } => match &module.exports {
                Resolution::Resolved(shape) => return Some(Rc::clone(shape)),
                Resolution::Resolving => return None,
                Resolution::Unresolved => declarations.clone(),
            },
            _ => return None,
        };
        self.set_module_exports(symbol, Resolution::Resolving);

        let mut builder = ShapeBuilder::default();
        let mut seen = FxHashSet::default();
        for decl_id in declarations {
            let Some(decl) = self.declaration(decl_id) else {
                continue;
            };
            for &child_id in &decl.children {
                let Some(child) = self.declaration(child_id) else {
                    continue;
                };
                if !child.has(DeclFlags::EXPORTED) {
                    continue;
                }
                let exported = match child.kind {
                    DeclKind::Variable | DeclKind::Function | DeclKind::Class | DeclKind::Enum => {
                        true
                    }
                    DeclKind::Module => child.has(DeclFlags::INSTANTIATED),
                    _ => false,
                };
                if !exported {
                    continue;
                }
                let Some(member) = self.bind(child_id) else {
                    continue;
                };
                if !seen.insert(member) {
                    continue;
                }
                let ty = self.type_of_symbol(member);
                builder.property(PropertyInfo::new(&child.display_name, ty));
            }
        }

        let shape = builder.finish();
        self.set_module_exports(symbol, Resolution::Resolved(Rc::clone(&shape)));
        Some(shape)
    }

    fn set_module_exports(&mut self, symbol: SymbolId, state: Resolution<Rc<ObjectShape>>) {
        if let Some(Symbol {
            kind: SymbolKind::Module(module),
            ..
        }) = self.ctx.symbols.get_mut(symbol)
        {
            module.exports = state;
        }
    }
}
