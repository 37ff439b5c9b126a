//! Pass 2: walking executable code.
//!
//! Statements are walked in source order with the declaration that owns
//! them as the lexical scope. Every typing boundary goes through
//! `check_boundary`, which relates the value's type to the expected type,
//! reports a failure and carries on, and decides whether the position
//! needs a runtime tag.
//!
//! ## Tag decisions
//!
//! | value                                   | target                         | decision        |
//! |-----------------------------------------|--------------------------------|-----------------|
//! | `any`                                   | anything but `any`             | check-and-tag   |
//! | literal with an `any` element or member | a slot that is not `any`       | check-and-tag   |
//! | fresh literal or sticky-fresh binding   | tuple, interface, object type  | tag             |
//! | fresh tuple literal, tail element only  | open tuple                     | check-and-tag   |
//! |   matching another tail slot            |                                |                 |
//! | class, object or tuple                  | interface, object, array, or a | tag             |
//! |                                         | different tuple                |                 |
//! | identical, primitive, class upcast      |                                | none            |

use std::rc::Rc;
use sts_binder::{DeclFlags, DeclId, DeclKind, FileId};
use sts_common::diagnostics::diagnostic_codes;
use sts_common::limits::MAX_SUBTYPE_DEPTH;
use sts_parser::{NodeData, NodeIndex, NodeList, SyntaxKind};
use sts_solver::{TupleShape, TypeId, TypeKey, TypeResolver, tuple_element_at, tuple_width_check};
use tracing::trace;

use crate::runtime_tags::TagKind;
use crate::state::CheckerState;
use crate::symbol_binder::Meaning;
use crate::symbols::{Symbol, SymbolId, SymbolKind};

/// Kind of typing boundary, which picks the diagnostic for a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Boundary {
    Assignment,
    Argument,
    Return,
}

impl Boundary {
    fn code(self) -> u32 {
        match self {
            Boundary::Argument => diagnostic_codes::ARGUMENT_NOT_ASSIGNABLE,
            Boundary::Assignment | Boundary::Return => diagnostic_codes::TYPE_NOT_ASSIGNABLE,
        }
    }
}

/// Outcome of relating a value to an expected type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Relation {
    Assignable(Option<TagKind>),
    /// Fixed-width tuple value that cannot fit the target tuple.
    WidthMismatch { width: usize },
    /// One element of a fresh tuple value fits no slot.
    ElementMismatch {
        node: NodeIndex,
        source: TypeId,
        target: TypeId,
    },
    NotAssignable,
}

impl Relation {
    pub(crate) fn is_assignable(self) -> bool {
        matches!(self, Relation::Assignable(_))
    }
}

impl<'a> CheckerState<'a> {
    // =========================================================================
    // Boundaries
    // =========================================================================

    /// Relate `source` (the type of `node`) to `target` without reporting.
    pub(crate) fn relate(&mut self, node: NodeIndex, source: TypeId, target: TypeId) -> Relation {
        match self.relate_types(node, source, target) {
            Relation::Assignable(kind)
                if kind != Some(TagKind::CheckAndTag) && self.carries_any(source, target, 0) =>
            {
                trace!(source = source.0, target = target.0, "any component in a typed slot");
                Relation::Assignable(Some(TagKind::CheckAndTag))
            }
            relation => relation,
        }
    }

    fn relate_types(&mut self, node: NodeIndex, source: TypeId, target: TypeId) -> Relation {
        if target.is_any_or_error() || source == TypeId::ERROR {
            return Relation::Assignable(None);
        }
        if source == TypeId::ANY {
            return Relation::Assignable(Some(TagKind::CheckAndTag));
        }
        self.resolve_type_deeply(source);
        self.resolve_type_deeply(target);

        let literal = self.fresh_literal_node(node);
        let fresh = literal.is_some() || self.is_sticky_fresh(node);

        if let (Some(source_tuple), Some(target_tuple)) =
            (self.ctx.types.tuple_shape(source), self.ctx.types.tuple_shape(target))
            && source_tuple.is_fixed()
        {
            let width = source_tuple.width();
            if !tuple_width_check(width, &target_tuple).fits() {
                return Relation::WidthMismatch { width };
            }
            if fresh && !target_tuple.is_fixed() {
                return self.relate_fresh_tuple(literal.unwrap_or(node), &source_tuple, &target_tuple);
            }
        }
        if !self.is_subtype_of(source, target) {
            return Relation::NotAssignable;
        }
        Relation::Assignable(self.upcast_tag(source, target, fresh))
    }

    /// A fresh tuple value into an open tuple. The fixed prefix must match
    /// slot by slot. A tail element that misses its cyclic slot but matches
    /// another tail slot is admitted with a runtime check.
    fn relate_fresh_tuple(&mut self, value: NodeIndex, source: &TupleShape, target: &TupleShape) -> Relation {
        let element_nodes: Vec<NodeIndex> = match self.current_arena().map(|arena| arena.data(value)) {
            Some(NodeData::ArrayLiteral { elements }) => elements.iter().collect(),
            _ => Vec::new(),
        };
        let rest_start = target.rest_start();
        let tail = &target.elements[rest_start..];
        let mut kind = TagKind::Tag;
        for (index, &element) in source.elements.iter().enumerate() {
            let Some(slot) = tuple_element_at(target, index) else {
                return Relation::WidthMismatch {
                    width: source.width(),
                };
            };
            if self.is_subtype_of(element, slot) {
                continue;
            }
            if index >= rest_start && tail.iter().any(|&other| self.is_subtype_of(element, other)) {
                trace!(index, "tail element off its cyclic slot");
                kind = TagKind::CheckAndTag;
                continue;
            }
            return Relation::ElementMismatch {
                node: element_nodes.get(index).copied().unwrap_or(value),
                source: element,
                target: slot,
            };
        }
        Relation::Assignable(Some(kind))
    }

    /// Whether an `any` part of a literal-shaped `source` lands in a slot of
    /// `target` that is not `any` itself.
    fn carries_any(&self, source: TypeId, target: TypeId, depth: u32) -> bool {
        if source == target || target.is_any_or_error() || depth >= MAX_SUBTYPE_DEPTH {
            return false;
        }
        if source == TypeId::ANY {
            return true;
        }
        let Some(source_key) = self.ctx.types.lookup(source) else {
            return false;
        };
        match source_key.as_ref() {
            TypeKey::Tuple(source_tuple) => {
                if let Some(target_tuple) = self.ctx.types.tuple_shape(target) {
                    source_tuple.elements.iter().enumerate().any(|(index, &element)| {
                        tuple_element_at(&target_tuple, index)
                            .is_some_and(|slot| self.carries_any(element, slot, depth + 1))
                    })
                } else if let Some(slot) = self.ctx.types.array_element(target) {
                    source_tuple
                        .elements
                        .iter()
                        .any(|&element| self.carries_any(element, slot, depth + 1))
                } else {
                    false
                }
            }
            TypeKey::Array(element) => self
                .ctx
                .types
                .array_element(target)
                .is_some_and(|slot| self.carries_any(*element, slot, depth + 1)),
            TypeKey::Object(shape) => {
                let target_shape = match self.ctx.types.lookup(target).as_deref() {
                    Some(TypeKey::Object(target_shape)) => Some(Rc::new(target_shape.clone())),
                    Some(TypeKey::Ref(_) | TypeKey::Application { .. }) => self.ctx.object_shape(target),
                    _ => None,
                };
                target_shape.is_some_and(|target_shape| {
                    target_shape.properties.iter().any(|expected| {
                        shape
                            .properties
                            .iter()
                            .find(|property| property.name == expected.name)
                            .is_some_and(|property| {
                                self.carries_any(property.type_id, expected.type_id, depth + 1)
                            })
                    })
                })
            }
            _ => false,
        }
    }

    /// Runtime operation for an upcast that type checks statically.
    pub(crate) fn upcast_tag(&self, source: TypeId, target: TypeId, fresh: bool) -> Option<TagKind> {
        let target_key = self.ctx.types.lookup(target)?;
        let structural_target = matches!(
            target_key.as_ref(),
            TypeKey::Tuple(_) | TypeKey::Object(_) | TypeKey::Ref(_) | TypeKey::Application { .. }
        ) && !self.ctx.is_enum_type(target);
        if fresh && structural_target {
            return Some(TagKind::Tag);
        }
        if source == target || source.is_intrinsic() || target.is_intrinsic() {
            return None;
        }
        if self.ctx.is_enum_type(source) || self.ctx.is_enum_type(target) {
            return None;
        }
        if self.ctx.class_of(source).is_some() && self.ctx.class_of(target).is_some() {
            return None;
        }
        let source_key = self.ctx.types.lookup(source)?;
        let structural_source = matches!(
            source_key.as_ref(),
            TypeKey::Tuple(_) | TypeKey::Object(_) | TypeKey::Ref(_) | TypeKey::Application { .. }
        );
        let widening_target =
            structural_target || matches!(target_key.as_ref(), TypeKey::Array(_));
        (structural_source && widening_target).then_some(TagKind::Tag)
    }

    /// Check that the value at `node` may flow into `target`, report the
    /// failure if not, and flag the position for the emitter.
    pub(crate) fn check_boundary(
        &mut self,
        node: NodeIndex,
        source: TypeId,
        target: TypeId,
        boundary: Boundary,
    ) -> bool {
        match self.relate(node, source, target) {
            Relation::Assignable(kind) => {
                if source == TypeId::ANY
                    && !target.is_any_or_error()
                    && self.ctx.options.no_implicit_any_flow
                {
                    let target_text = self.format_type(target);
                    self.error_at(
                        node,
                        diagnostic_codes::ANY_FLOWS_INTO_TYPED_POSITION,
                        vec![target_text],
                    );
                }
                if let Some(kind) = kind {
                    self.record_tag(node, kind, source, target);
                }
                self.consume_freshness_of(node);
                true
            }
            Relation::WidthMismatch { width } => {
                let source_text = self.format_type(source);
                let target_text = self.format_type(target);
                self.error_at(
                    node,
                    diagnostic_codes::TUPLE_WIDTH_MISMATCH,
                    vec![source_text, width.to_string(), target_text],
                );
                false
            }
            Relation::ElementMismatch {
                node: element,
                source,
                target,
            } => {
                let source_text = self.format_type(source);
                let target_text = self.format_type(target);
                self.error_at(element, boundary.code(), vec![source_text, target_text]);
                false
            }
            Relation::NotAssignable => {
                let source_text = self.format_type(source);
                let target_text = self.format_type(target);
                self.error_at(node, boundary.code(), vec![source_text, target_text]);
                false
            }
        }
    }

    // =========================================================================
    // Freshness
    // =========================================================================

    fn skip_parentheses(&self, mut node: NodeIndex) -> NodeIndex {
        let Some(arena) = self.current_arena() else {
            return node;
        };
        while let NodeData::Parenthesized { expression } = arena.data(node) {
            node = *expression;
        }
        node
    }

    /// The array or object literal `node` is, looking through parentheses.
    pub(crate) fn fresh_literal_node(&self, node: NodeIndex) -> Option<NodeIndex> {
        let node = self.skip_parentheses(node);
        match self.current_arena()?.kind(node)? {
            SyntaxKind::ArrayLiteralExpression | SyntaxKind::ObjectLiteralExpression => Some(node),
            _ => None,
        }
    }

    /// Variable a bare identifier expression names.
    fn binding_symbol(&mut self, node: NodeIndex) -> Option<SymbolId> {
        let node = self.skip_parentheses(node);
        let NodeData::Identifier { text } = self.current_arena()?.data(node) else {
            return None;
        };
        let decl = self.resolve_name(self.scope(), text, Meaning::Value)?;
        self.bind(decl)
    }

    fn is_sticky_fresh(&mut self, node: NodeIndex) -> bool {
        self.binding_symbol(node)
            .is_some_and(|symbol| self.ctx.freshness.is_binding_fresh(symbol))
    }

    /// A fresh binding used in a typed position stops being fresh.
    pub(crate) fn consume_freshness_of(&mut self, node: NodeIndex) {
        if self.ctx.is_speculative() {
            return;
        }
        if let Some(symbol) = self.binding_symbol(node) {
            self.ctx.freshness.consume_freshness(symbol);
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Walk every top-level statement of `file`.
    pub(crate) fn check_source_file(&mut self, file: FileId) {
        let Some(entry) = self.entry(file) else {
            return;
        };
        let NodeData::SourceFile { statements, .. } = entry.parsed.arena.data(entry.parsed.root)
        else {
            return;
        };
        self.in_file(file, |state| {
            state.in_scope(DeclId::root(file), |state| state.check_statements(statements))
        });
    }

    /// Walk a function body.
    pub(crate) fn check_block(&mut self, body: NodeIndex) {
        if let Some(NodeData::Block { statements }) = self.current_arena().map(|arena| arena.data(body)) {
            self.check_statements(statements);
        }
    }

    fn check_statements(&mut self, statements: &NodeList) {
        for statement in statements.iter() {
            self.check_statement(statement);
        }
    }

    fn check_statement(&mut self, node: NodeIndex) {
        let Some(arena) = self.current_arena() else {
            return;
        };
        let Some(kind) = arena.kind(node) else {
            return;
        };
        match (kind, arena.data(node)) {
            (_, NodeData::VariableStatement { declarations }) => {
                for declaration in declarations.iter() {
                    self.check_variable_declaration(declaration);
                }
            }
            (SyntaxKind::FunctionDeclaration, NodeData::Function { .. }) => {
                if let Some(decl) = self.declaration_for_node(node) {
                    self.check_function_body(decl);
                }
            }
            (_, NodeData::Class { .. }) => self.check_class_declaration(node),
            (_, NodeData::Interface { .. }) => {
                if let Some(decl) = self.declaration_for_node(node)
                    && let Some(symbol) = self.bind(decl)
                {
                    self.interface_members(symbol);
                }
            }
            (_, NodeData::Enum { members, .. }) => self.check_enum_declaration(node, members),
            (_, NodeData::Module { body, .. }) => {
                if let Some(decl) = self.declaration_for_node(node) {
                    self.in_scope(decl, |state| state.check_statements(body));
                }
            }
            (_, NodeData::Block { statements }) => self.check_statements(statements),
            (_, NodeData::Return { expression }) => self.check_return(*expression),
            (
                _,
                NodeData::If {
                    condition,
                    then_statement,
                    else_statement,
                },
            ) => {
                self.check_expression(*condition, None);
                self.check_statement(*then_statement);
                self.check_statement(*else_statement);
            }
            (_, NodeData::While { condition, body }) => {
                self.check_expression(*condition, None);
                self.check_statement(*body);
            }
            (_, NodeData::ExpressionStatement { expression }) => {
                self.check_expression(*expression, None);
            }
            _ => {}
        }
    }

    fn check_variable_declaration(&mut self, node: NodeIndex) {
        let Some(arena) = self.current_arena() else {
            return;
        };
        let NodeData::Variable {
            type_annotation,
            initializer,
            ..
        } = arena.data(node)
        else {
            return;
        };
        let Some(symbol) = self.declaration_for_node(node).and_then(|decl| self.bind(decl)) else {
            return;
        };
        let declared = self.variable_type(symbol);
        if initializer.is_none() {
            return;
        }
        if type_annotation.is_some() {
            let source = self.check_expression(*initializer, Some(declared));
            self.check_boundary(*initializer, source, declared, Boundary::Assignment);
            return;
        }

        let source = self.check_expression(*initializer, None);
        if self.ctx.is_speculative() {
            return;
        }
        if self.fresh_literal_node(*initializer).is_some() {
            self.ctx.freshness.mark_binding_fresh(symbol, source);
        } else if let Some(from) = self.binding_symbol(*initializer) {
            self.ctx.freshness.transfer_freshness(from, symbol);
        }
    }

    fn check_return(&mut self, expression: NodeIndex) {
        let declared = self.ctx.functions.last().and_then(|frame| frame.return_type);
        if expression.is_none() {
            return;
        }
        let ty = self.check_expression(expression, declared);
        if let Some(frame) = self.ctx.functions.last_mut() {
            frame.has_return_value = true;
            frame.inferred_return.get_or_insert(ty);
        }
        if let Some(declared) = declared {
            self.check_boundary(expression, ty, declared, Boundary::Return);
        }
    }

    fn check_enum_declaration(&mut self, node: NodeIndex, members: &NodeList) {
        let (Some(arena), Some(decl)) = (self.current_arena(), self.declaration_for_node(node)) else {
            return;
        };
        self.in_scope(decl, |state| {
            for member in members.iter() {
                let NodeData::EnumMember { initializer, .. } = arena.data(member) else {
                    continue;
                };
                if initializer.is_none() {
                    continue;
                }
                let ty = state.check_expression(*initializer, Some(TypeId::NUMBER));
                state.check_boundary(*initializer, ty, TypeId::NUMBER, Boundary::Assignment);
            }
        });
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Walk the body of a function, method or constructor once.
    pub(crate) fn check_function_body(&mut self, decl_id: DeclId) {
        if self.ctx.is_speculative() || !self.ctx.checked_bodies.insert(decl_id) {
            return;
        }
        let file = decl_id.file;
        let (Some(decl), Some(arena)) = (self.declaration(decl_id), self.arena(file)) else {
            return;
        };
        let NodeData::Function {
            return_type, body, ..
        } = arena.data(decl.node)
        else {
            return;
        };
        if body.is_none() {
            return;
        }
        let declared = if decl.has(DeclFlags::CONSTRUCTOR) || return_type.is_none() {
            None
        } else {
            Some(self.type_from_node(file, *return_type, decl_id))
        };
        let this_type = self.this_type_for(decl_id);
        let frame = self.in_file(file, |state| {
            state.in_scope(decl_id, |state| {
                state.with_this(this_type, |state| {
                    state.check_parameter_initializers(decl_id);
                    state.in_function(declared, |state| state.check_block(*body)).1
                })
            })
        });
        if let Some(declared) = declared
            && !matches!(declared, TypeId::VOID | TypeId::ANY | TypeId::ERROR)
            && !frame.has_return_value
        {
            self.report(
                file,
                *return_type,
                diagnostic_codes::FUNCTION_MUST_RETURN_A_VALUE,
                Vec::new(),
            );
        }
    }

    /// `function f(x: number = "a")`
    fn check_parameter_initializers(&mut self, decl_id: DeclId) {
        let (Some(tree), Some(arena)) = (self.registry().tree(decl_id.file), self.arena(decl_id.file))
        else {
            return;
        };
        for param_id in tree.children_of_kind(decl_id, DeclKind::Parameter) {
            let Some(param) = self.declaration(param_id) else {
                continue;
            };
            let NodeData::Parameter { initializer, .. } = arena.data(param.node) else {
                continue;
            };
            if initializer.is_none() {
                continue;
            }
            let Some(symbol) = self.bind(param_id) else {
                continue;
            };
            let declared = self.variable_type(symbol);
            let ty = self.check_expression(*initializer, Some(declared));
            self.check_boundary(*initializer, ty, declared, Boundary::Assignment);
        }
    }

    // =========================================================================
    // Classes
    // =========================================================================

    fn check_class_declaration(&mut self, node: NodeIndex) {
        if self.ctx.is_speculative() {
            return;
        }
        let Some(decl_id) = self.declaration_for_node(node) else {
            return;
        };
        let (Some(decl), Some(symbol)) = (self.declaration(decl_id), self.bind(decl_id)) else {
            return;
        };
        self.class_members(symbol);
        self.class_statics(symbol);
        self.check_class_heritage(decl_id, symbol);

        for &child_id in &decl.children {
            let Some(child) = self.declaration(child_id) else {
                continue;
            };
            match child.kind {
                DeclKind::Variable if child.has(DeclFlags::PROPERTY) => {
                    self.check_property_initializer(decl_id, child_id);
                }
                DeclKind::Function if child.has(DeclFlags::METHOD) => {
                    self.check_function_body(child_id);
                }
                DeclKind::ConstructSignature if child.has(DeclFlags::CONSTRUCTOR) => {
                    self.check_function_body(child_id);
                }
                _ => {}
            }
        }
    }

    /// A class must be a subtype of its base class and of every interface
    /// it implements.
    fn check_class_heritage(&mut self, decl_id: DeclId, symbol: SymbolId) {
        let (instance, base, implements) = match self.ctx.symbols.get(symbol) {
            Some(Symbol {
                kind: SymbolKind::Class(class),
                ..
            }) => (class.instance_type, class.base_type, class.implements.clone()),
            _ => return,
        };
        let (Some(decl), Some(arena)) = (self.declaration(decl_id), self.arena(decl_id.file)) else {
            return;
        };
        let name_node = arena.declaration_name(decl.node);
        self.resolve_type_deeply(instance);

        if let Some(base) = base {
            self.resolve_type_deeply(base);
            if !self.is_subtype_of(instance, base) {
                let base_text = self.format_type(base);
                self.error_at(
                    name_node,
                    diagnostic_codes::CLASS_INCORRECTLY_EXTENDS,
                    vec![decl.display_name.clone(), base_text],
                );
            }
        }
        for interface in implements {
            if interface.is_any_or_error() {
                continue;
            }
            self.resolve_type_deeply(interface);
            if !self.is_subtype_of(instance, interface) {
                let interface_text = self.format_type(interface);
                self.error_at(
                    name_node,
                    diagnostic_codes::CLASS_INCORRECTLY_IMPLEMENTS,
                    vec![decl.display_name.clone(), interface_text],
                );
            }
        }
    }

    /// `x: T = init` inside a class body, including parameter properties'
    /// default values, which the constructor walk already covers.
    fn check_property_initializer(&mut self, class: DeclId, property: DeclId) {
        let (Some(decl), Some(arena)) = (self.declaration(property), self.arena(property.file)) else {
            return;
        };
        let NodeData::Variable {
            type_annotation,
            initializer,
            ..
        } = arena.data(decl.node)
        else {
            return;
        };
        let Some(symbol) = self.bind(property) else {
            return;
        };
        let declared = self.variable_type(symbol);
        if initializer.is_none() {
            return;
        }
        let expected = type_annotation.is_some().then_some(declared);
        let this_type = self.this_type_for(property);
        let ty = self.in_scope(class, |state| {
            state.with_this(this_type, |state| state.check_expression(*initializer, expected))
        });
        if let Some(expected) = expected {
            self.check_boundary(*initializer, ty, expected, Boundary::Assignment);
        }
    }
}
