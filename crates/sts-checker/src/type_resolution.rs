//! Declared types: type annotations, value symbols and signatures.
//!
//! Everything here is lazy and memoized. Type annotation nodes are cached by
//! `(file, node)`, so the 2304/2314 diagnostics they produce are reported
//! exactly once no matter how many times the annotation is reached. Value
//! symbol types and signature shapes live in `Resolution` cells on the symbol;
//! reaching a cell that is still `Resolving` is a circular reference.

use sts_binder::{DeclFlags, DeclId, DeclKind, FileId};
use sts_common::diagnostics::diagnostic_codes;
use sts_parser::{ModifierFlags, NodeData, NodeIndex, NodeList, SyntaxKind};
use sts_solver::{
    IntrinsicKind, ObjectShape, ParamInfo, PropertyInfo, SignatureShape, TupleShape, TypeId,
};
use tracing::trace;

use crate::state::CheckerState;
use crate::symbol_binder::Meaning;
use crate::symbols::{Resolution, Symbol, SymbolId, SymbolKind};

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Type annotations
    // =========================================================================

    /// The type a type node denotes, with names resolved from `scope`.
    pub(crate) fn type_from_node(&mut self, file: FileId, node: NodeIndex, scope: DeclId) -> TypeId {
        if node.is_none() {
            return TypeId::ANY;
        }
        if let Some(&ty) = self.ctx.type_node_types.get(&(file, node)) {
            return ty;
        }
        let ty = self.resolve_type_node(file, node, scope);
        self.ctx.type_node_types.insert((file, node), ty);
        ty
    }

    fn resolve_type_node(&mut self, file: FileId, node: NodeIndex, scope: DeclId) -> TypeId {
        let Some(arena) = self.arena(file) else {
            return TypeId::ERROR;
        };
        match arena.data(node) {
            NodeData::KeywordType { keyword } => {
                IntrinsicKind::from_keyword(keyword).map_or(TypeId::ERROR, IntrinsicKind::type_id)
            }
            NodeData::TypeReference { name, type_args } => {
                self.type_reference(file, node, *name, type_args, scope)
            }
            NodeData::ArrayType { element } => {
                let element = self.type_from_node(file, *element, scope);
                self.ctx.types.array(element)
            }
            NodeData::TupleType {
                elements,
                rest_start,
            } => {
                let elements: Vec<TypeId> = elements
                    .iter()
                    .map(|element| self.type_from_node(file, element, scope))
                    .collect();
                let shape = match *rest_start {
                    Some(k) if (k as usize) < elements.len() => TupleShape::new(elements, k),
                    _ => TupleShape::fixed(elements),
                };
                self.ctx.types.tuple(shape)
            }
            NodeData::TypeLiteral { members } => self.type_literal(file, members, scope),
            NodeData::FunctionType {
                params,
                return_type,
            } => {
                let signature = self.signature_from_nodes(file, params, *return_type, scope);
                self.ctx.types.function(signature)
            }
            _ => TypeId::ERROR,
        }
    }

    fn type_reference(
        &mut self,
        file: FileId,
        node: NodeIndex,
        name: NodeIndex,
        type_args: &NodeList,
        scope: DeclId,
    ) -> TypeId {
        let Some(arena) = self.arena(file) else {
            return TypeId::ERROR;
        };
        let text = arena.entity_name_text(name).unwrap_or_default();
        let Some(decl) = self.resolve_entity_name(scope, file, name, Meaning::Type) else {
            self.report(file, name, diagnostic_codes::CANNOT_FIND_NAME, vec![text]);
            return TypeId::ERROR;
        };
        let Some(symbol) = self.bind(decl) else {
            return TypeId::ERROR;
        };
        let args: Vec<TypeId> = type_args
            .iter()
            .map(|arg| self.type_from_node(file, arg, scope))
            .collect();

        let (arity, declared) = match self.ctx.symbols.get(symbol) {
            Some(entry) => (entry.type_params().len(), entry.declared_type()),
            None => return TypeId::ERROR,
        };
        if arity == 0 {
            return declared.unwrap_or(TypeId::ERROR);
        }
        if args.len() != arity {
            self.report(
                file,
                node,
                diagnostic_codes::GENERIC_TYPE_REQUIRES_TYPE_ARGUMENTS,
                vec![text, arity.to_string()],
            );
            return TypeId::ERROR;
        }
        let instance = self.instantiate_symbol(symbol, args);
        self.ctx
            .symbols
            .get(instance)
            .and_then(Symbol::declared_type)
            .unwrap_or(TypeId::ERROR)
    }

    /// `{ a: T; m(): U; (x: V): W; [key: string]: X }`
    fn type_literal(&mut self, file: FileId, members: &NodeList, scope: DeclId) -> TypeId {
        let Some(arena) = self.arena(file) else {
            return TypeId::ERROR;
        };
        let mut shape = ObjectShape::default();
        for member in members.iter() {
            let optional = arena.flags(member).contains(ModifierFlags::OPTIONAL);
            match (arena.kind(member), arena.data(member)) {
                (
                    Some(SyntaxKind::PropertySignature),
                    NodeData::Variable {
                        name,
                        type_annotation,
                        ..
                    },
                ) => {
                    let name = arena.identifier_text(*name).unwrap_or_default();
                    let ty = self.type_from_node(file, *type_annotation, scope);
                    shape.properties.push(PropertyInfo {
                        optional,
                        ..PropertyInfo::new(name, ty)
                    });
                }
                (
                    Some(SyntaxKind::MethodSignature),
                    NodeData::Function {
                        name,
                        params,
                        return_type,
                        ..
                    },
                ) => {
                    let name = arena.identifier_text(*name).unwrap_or_default();
                    let signature = self.signature_from_nodes(file, params, *return_type, scope);
                    let ty = self.ctx.types.function(signature);
                    shape.properties.push(PropertyInfo {
                        optional,
                        ..PropertyInfo::method(name, ty)
                    });
                }
                (
                    Some(kind @ (SyntaxKind::CallSignature | SyntaxKind::ConstructSignature)),
                    NodeData::Function {
                        params,
                        return_type,
                        ..
                    },
                ) => {
                    let signature = self.signature_from_nodes(file, params, *return_type, scope);
                    if kind == SyntaxKind::CallSignature {
                        shape.call_signatures.push(signature);
                    } else {
                        shape.construct_signatures.push(signature);
                    }
                }
                (
                    _,
                    NodeData::IndexSignature {
                        key_type,
                        value_type,
                        ..
                    },
                ) => {
                    let key = self.type_from_node(file, *key_type, scope);
                    let value = self.type_from_node(file, *value_type, scope);
                    if key == TypeId::NUMBER {
                        shape.number_index = Some(value);
                    } else {
                        shape.string_index = Some(value);
                    }
                }
                _ => {}
            }
        }
        self.ctx.types.object_with_shape(shape)
    }

    /// Signature of a function type or type-literal member. These have no
    /// declarations of their own, so parameters are read from syntax.
    fn signature_from_nodes(
        &mut self,
        file: FileId,
        params: &NodeList,
        return_type: NodeIndex,
        scope: DeclId,
    ) -> SignatureShape {
        let Some(arena) = self.arena(file) else {
            return SignatureShape::new(Vec::new(), TypeId::ERROR);
        };
        let mut infos = Vec::with_capacity(params.len());
        for param in params.iter() {
            let NodeData::Parameter {
                name,
                type_annotation,
                initializer,
            } = arena.data(param)
            else {
                continue;
            };
            let flags = arena.flags(param);
            let rest = flags.contains(ModifierFlags::REST);
            let type_id = if type_annotation.is_some() {
                self.type_from_node(file, *type_annotation, scope)
            } else if rest {
                self.ctx.types.array(TypeId::ANY)
            } else {
                TypeId::ANY
            };
            infos.push(ParamInfo {
                name: arena.identifier_text(*name).unwrap_or_default().to_string(),
                type_id,
                optional: flags.contains(ModifierFlags::OPTIONAL) || initializer.is_some(),
                rest,
            });
        }
        let return_type = self.type_from_node(file, return_type, scope);
        SignatureShape::new(infos, return_type)
    }

    // =========================================================================
    // Value symbols
    // =========================================================================

    /// The type of the value `symbol` denotes.
    pub fn type_of_symbol(&mut self, symbol: SymbolId) -> TypeId {
        let Some(entry) = self.ctx.symbols.get(symbol) else {
            return TypeId::ERROR;
        };
        match &entry.kind {
            SymbolKind::Variable(_) | SymbolKind::Parameter(_) => self.variable_type(symbol),
            SymbolKind::Function(_) => self.function_type(symbol),
            SymbolKind::Class(class) => {
                let constructor = class.constructor_type;
                self.class_statics(symbol);
                constructor
            }
            SymbolKind::Module(module) => {
                let namespace = module.namespace_type;
                self.module_exports(symbol);
                namespace
            }
            SymbolKind::Enum(enumeration) => enumeration.namespace_type,
            SymbolKind::EnumMember(member) => match self.ctx.symbols.get(member.parent_enum) {
                Some(Symbol {
                    kind: SymbolKind::Enum(enumeration),
                    ..
                }) => enumeration.instance_type,
                _ => TypeId::ERROR,
            },
            SymbolKind::Interface(_)
            | SymbolKind::TypeParameter(_)
            | SymbolKind::Signature(_)
            | SymbolKind::Instantiated(_) => TypeId::ERROR,
        }
    }

    fn variable_cell(&self, symbol: SymbolId) -> Option<Resolution<TypeId>> {
        match &self.ctx.symbols.get(symbol)?.kind {
            SymbolKind::Variable(variable) | SymbolKind::Parameter(variable) => {
                Some(variable.type_id.clone())
            }
            _ => None,
        }
    }

    fn set_variable_cell(&mut self, symbol: SymbolId, state: Resolution<TypeId>) {
        if let Some(entry) = self.ctx.symbols.get_mut(symbol)
            && let SymbolKind::Variable(variable) | SymbolKind::Parameter(variable) = &mut entry.kind
        {
            variable.type_id = state;
        }
    }

    /// Declared or inferred type of a variable, parameter or property.
    pub(crate) fn variable_type(&mut self, symbol: SymbolId) -> TypeId {
        match self.variable_cell(symbol) {
            None => return TypeId::ERROR,
            Some(Resolution::Resolved(ty)) => return ty,
            Some(Resolution::Resolving) => {
                self.report_self_reference(symbol);
                return TypeId::ANY;
            }
            Some(Resolution::Unresolved) => {}
        }
        let Some(decl_id) = self.ctx.symbols.get(symbol).and_then(Symbol::first_declaration) else {
            return TypeId::ANY;
        };
        let (Some(decl), Some(arena)) = (self.declaration(decl_id), self.arena(decl_id.file)) else {
            return TypeId::ERROR;
        };
        let (annotation, initializer) = match arena.data(decl.node) {
            NodeData::Variable {
                type_annotation,
                initializer,
                ..
            }
            | NodeData::Parameter {
                type_annotation,
                initializer,
                ..
            } => (*type_annotation, *initializer),
            NodeData::IndexSignature { value_type, .. } => (*value_type, NodeIndex::NONE),
            _ => (NodeIndex::NONE, NodeIndex::NONE),
        };
        let scope = decl.parent.unwrap_or_else(|| DeclId::root(decl_id.file));

        let ty = if annotation.is_some() {
            self.type_from_node(decl_id.file, annotation, scope)
        } else if initializer.is_some() {
            self.set_variable_cell(symbol, Resolution::Resolving);
            let this_type = self.this_type_for(decl_id);
            let inferred = self.infer_in(scope, |state| {
                state.with_this(this_type, |state| state.check_expression(initializer, None))
            });
            if self.ctx.circular.contains(&symbol) {
                TypeId::ANY
            } else {
                inferred
            }
        } else if decl.has(DeclFlags::REST) {
            self.ctx.types.array(TypeId::ANY)
        } else {
            TypeId::ANY
        };
        trace!(name = %decl.display_name, ty = ty.0, "variable type");
        self.set_variable_cell(symbol, Resolution::Resolved(ty));
        ty
    }

    /// 7022, once per variable, at its name.
    fn report_self_reference(&mut self, symbol: SymbolId) {
        if !self.ctx.circular.insert(symbol) {
            return;
        }
        let Some(decl_id) = self.ctx.symbols.get(symbol).and_then(Symbol::first_declaration) else {
            return;
        };
        let (Some(decl), Some(arena)) = (self.declaration(decl_id), self.arena(decl_id.file)) else {
            return;
        };
        self.report(
            decl_id.file,
            arena.declaration_name(decl.node),
            diagnostic_codes::IMPLICIT_ANY_SELF_REFERENCE,
            vec![decl.display_name.clone()],
        );
    }

    /// Give an unannotated parameter its type from a contextual signature.
    /// A parameter whose type is already known keeps it.
    pub(crate) fn assign_parameter_type(&mut self, symbol: SymbolId, ty: TypeId) {
        if matches!(self.variable_cell(symbol), Some(Resolution::Unresolved)) {
            self.set_variable_cell(symbol, Resolution::Resolved(ty));
        }
    }

    /// Object type with one call signature per visible overload.
    pub(crate) fn function_type(&mut self, symbol: SymbolId) -> TypeId {
        let signatures = match self.ctx.symbols.get(symbol).map(|s| &s.kind) {
            Some(SymbolKind::Function(function)) => match &function.type_id {
                Resolution::Resolved(ty) => return *ty,
                Resolution::Resolving => return TypeId::ANY,
                Resolution::Unresolved => function.visible_signatures(),
            },
            _ => return TypeId::ERROR,
        };
        self.set_function_cell(symbol, Resolution::Resolving);
        let shape = ObjectShape {
            call_signatures: signatures
                .into_iter()
                .map(|signature| self.signature_of(signature))
                .collect(),
            ..ObjectShape::default()
        };
        let ty = self.ctx.types.object_with_shape(shape);
        self.set_function_cell(symbol, Resolution::Resolved(ty));
        ty
    }

    fn set_function_cell(&mut self, symbol: SymbolId, state: Resolution<TypeId>) {
        if let Some(Symbol {
            kind: SymbolKind::Function(function),
            ..
        }) = self.ctx.symbols.get_mut(symbol)
        {
            function.type_id = state;
        }
    }

    // =========================================================================
    // Signatures
    // =========================================================================

    /// Shape of a signature symbol. A signature reached again while its own
    /// return type is being inferred reads as `(...) => any`.
    pub fn signature_of(&mut self, signature: SymbolId) -> SignatureShape {
        let decl = match self.ctx.symbols.get(signature).map(|s| &s.kind) {
            Some(SymbolKind::Signature(sig)) => match &sig.shape {
                Resolution::Resolved(shape) => return shape.clone(),
                Resolution::Resolving => {
                    return SignatureShape::new(
                        vec![ParamInfo::rest("args", self.ctx.types.array(TypeId::ANY))],
                        TypeId::ANY,
                    );
                }
                Resolution::Unresolved => sig.decl,
            },
            _ => return SignatureShape::new(Vec::new(), TypeId::ERROR),
        };
        let Some(decl) = decl else {
            return SignatureShape::new(Vec::new(), TypeId::ANY);
        };
        self.set_signature_cell(signature, Resolution::Resolving);
        let shape = self.signature_from_declaration(decl);
        self.set_signature_cell(signature, Resolution::Resolved(shape.clone()));
        shape
    }

    pub(crate) fn set_signature_cell(&mut self, signature: SymbolId, state: Resolution<SignatureShape>) {
        if let Some(Symbol {
            kind: SymbolKind::Signature(sig),
            ..
        }) = self.ctx.symbols.get_mut(signature)
        {
            sig.shape = state;
        }
    }

    fn signature_from_declaration(&mut self, decl_id: DeclId) -> SignatureShape {
        let file = decl_id.file;
        let (Some(decl), Some(arena), Some(tree)) = (
            self.declaration(decl_id),
            self.arena(file),
            self.registry().tree(file),
        ) else {
            return SignatureShape::new(Vec::new(), TypeId::ERROR);
        };
        let NodeData::Function {
            return_type, body, ..
        } = arena.data(decl.node)
        else {
            return SignatureShape::new(Vec::new(), TypeId::ERROR);
        };

        // A class constructor is generic over the class's type parameters
        // and returns the class instance type.
        let class = if decl.has(DeclFlags::CONSTRUCTOR) {
            decl.parent.and_then(|parent| self.bind(parent))
        } else {
            None
        };
        let mut type_params = match class.and_then(|class| self.ctx.symbols.get(class)) {
            Some(entry) => entry.type_params().to_vec(),
            None => Vec::new(),
        };
        type_params.extend(self.bind_type_parameters(decl_id));

        let mut params = Vec::new();
        for param_id in tree.children_of_kind(decl_id, DeclKind::Parameter) {
            let (Some(param), Some(symbol)) = (self.declaration(param_id), self.bind(param_id)) else {
                continue;
            };
            let has_initializer = matches!(
                arena.data(param.node),
                NodeData::Parameter { initializer, .. } if initializer.is_some()
            );
            let type_id = self.variable_type(symbol);
            params.push(ParamInfo {
                name: param.display_name.clone(),
                type_id,
                optional: param.has(DeclFlags::OPTIONAL) || has_initializer,
                rest: param.has(DeclFlags::REST),
            });
        }

        let return_type = if let Some(class) = class {
            self.ctx
                .symbols
                .get(class)
                .and_then(Symbol::declared_type)
                .unwrap_or(TypeId::ERROR)
        } else if return_type.is_some() {
            self.type_from_node(file, *return_type, decl_id)
        } else if body.is_some() {
            self.infer_return_type(decl_id, *body)
        } else {
            TypeId::ANY
        };

        SignatureShape {
            type_params,
            params,
            return_type,
        }
    }

    /// Type of the first `return` expression in `body`, or `void`.
    fn infer_return_type(&mut self, decl_id: DeclId, body: NodeIndex) -> TypeId {
        let this_type = self.this_type_for(decl_id);
        let (_, frame) = self.infer_in(decl_id, |state| {
            state.with_this(this_type, |state| {
                state.in_function(None, |state| state.check_block(body))
            })
        });
        frame.inferred_return.unwrap_or(TypeId::VOID)
    }

    /// Type of `this` inside a member of a class, `any` elsewhere.
    pub(crate) fn this_type_for(&mut self, decl_id: DeclId) -> TypeId {
        let Some(decl) = self.declaration(decl_id) else {
            return TypeId::ANY;
        };
        let Some(parent_id) = decl.parent else {
            return TypeId::ANY;
        };
        let is_class_member = self
            .declaration(parent_id)
            .is_some_and(|parent| parent.kind == DeclKind::Class);
        if !is_class_member {
            return TypeId::ANY;
        }
        let Some(class) = self.bind(parent_id) else {
            return TypeId::ANY;
        };
        match self.ctx.symbols.get(class).map(|s| &s.kind) {
            Some(SymbolKind::Class(class)) if decl.has(DeclFlags::STATIC) => class.constructor_type,
            Some(SymbolKind::Class(class)) => class.instance_type,
            _ => TypeId::ANY,
        }
    }

    // =========================================================================
    // Type parameters
    // =========================================================================

    pub(crate) fn type_parameter_constraint(&mut self, symbol: SymbolId) -> Option<TypeId> {
        match self.ctx.symbols.get(symbol).map(|s| &s.kind) {
            Some(SymbolKind::TypeParameter(param)) => match &param.constraint {
                Resolution::Resolved(constraint) => return *constraint,
                Resolution::Resolving => return None,
                Resolution::Unresolved => {}
            },
            _ => return None,
        }
        self.set_constraint_cell(symbol, Resolution::Resolving);
        let constraint = self.resolve_constraint(symbol);
        self.set_constraint_cell(symbol, Resolution::Resolved(constraint));
        constraint
    }

    fn resolve_constraint(&mut self, symbol: SymbolId) -> Option<TypeId> {
        let decl_id = self.ctx.symbols.get(symbol)?.first_declaration()?;
        let decl = self.declaration(decl_id)?;
        let arena = self.arena(decl_id.file)?;
        let NodeData::TypeParameter { constraint, .. } = arena.data(decl.node) else {
            return None;
        };
        if constraint.is_none() {
            return None;
        }
        let scope = decl.parent?;
        Some(self.type_from_node(decl_id.file, *constraint, scope))
    }

    fn set_constraint_cell(&mut self, symbol: SymbolId, state: Resolution<Option<TypeId>>) {
        if let Some(Symbol {
            kind: SymbolKind::TypeParameter(param),
            ..
        }) = self.ctx.symbols.get_mut(symbol)
        {
            param.constraint = state;
        }
    }
}
