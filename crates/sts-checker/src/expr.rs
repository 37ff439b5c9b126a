//! Expression typing.
//!
//! `check_expression` is the single entry point: it pushes the expected type
//! as the node's contextual frame, computes the static type, and records it
//! for the emitter. Typing boundaries inside expressions (assignment, call
//! arguments, assertions) are checked here through the boundary rules in
//! `check_pass`.

use sts_binder::{DeclId, DeclKind};
use sts_common::diagnostics::diagnostic_codes;
use sts_parser::{NodeData, NodeIndex, NodeList, SyntaxKind};
use sts_solver::{PropertyInfo, SignatureShape, TypeId, tuple_element_at};
use tracing::trace;

use crate::check_pass::Boundary;
use crate::runtime_tags::TagKind;
use crate::state::CheckerState;
use crate::symbol_binder::Meaning;

impl<'a> CheckerState<'a> {
    /// Static type of `node`, checked against nothing but typed with
    /// `expected` as its contextual type.
    pub(crate) fn check_expression(&mut self, node: NodeIndex, expected: Option<TypeId>) -> TypeId {
        if node.is_none() {
            return TypeId::ERROR;
        }
        if !self.ctx.expr_depth.enter() {
            return TypeId::ERROR;
        }
        let ty = self.with_contextual(node, expected, |state| state.compute_expression_type(node));
        self.ctx.expr_depth.leave();
        self.ctx.record_node_type(node, ty);
        ty
    }

    fn compute_expression_type(&mut self, node: NodeIndex) -> TypeId {
        let Some(arena) = self.current_arena() else {
            return TypeId::ERROR;
        };
        let Some(kind) = arena.kind(node) else {
            return TypeId::ERROR;
        };
        match (kind, arena.data(node)) {
            (SyntaxKind::NumericLiteral, _) => TypeId::NUMBER,
            (SyntaxKind::StringLiteral, _) => TypeId::STRING,
            (SyntaxKind::BooleanLiteral, _) => TypeId::BOOLEAN,
            (SyntaxKind::NullLiteral, _) => TypeId::NULL,
            (SyntaxKind::ThisExpression, _) => {
                self.ctx.this_types.last().copied().unwrap_or(TypeId::ANY)
            }
            (_, NodeData::Identifier { text }) => self.identifier_type(node, text),
            (_, NodeData::ArrayLiteral { elements }) => self.array_literal_type(elements),
            (_, NodeData::ObjectLiteral { properties }) => self.object_literal_type(properties),
            (SyntaxKind::FunctionExpression, NodeData::Function { .. }) => {
                self.function_expression_type(node)
            }
            (SyntaxKind::CallExpression, NodeData::Call { callee, arguments }) => {
                self.check_call(node, *callee, arguments)
            }
            (SyntaxKind::NewExpression, NodeData::Call { callee, arguments }) => {
                self.check_new(node, *callee, arguments)
            }
            (_, NodeData::PropertyAccess { expression, name }) => {
                self.property_access_type(*expression, *name)
            }
            (
                _,
                NodeData::ElementAccess {
                    expression,
                    argument,
                },
            ) => self.element_access_type(*expression, *argument),
            (
                _,
                NodeData::Binary {
                    left,
                    operator,
                    right,
                },
            ) => self.binary_type(*left, *operator, *right),
            (_, NodeData::PrefixUnary { operator, operand }) => {
                self.check_expression(*operand, None);
                match operator {
                    SyntaxKind::ExclamationToken => TypeId::BOOLEAN,
                    _ => TypeId::NUMBER,
                }
            }
            (
                _,
                NodeData::TypeAssertion {
                    type_node,
                    expression,
                },
            ) => self.type_assertion_type(*type_node, *expression),
            (_, NodeData::Parenthesized { expression }) => {
                let expected = self.ctx.contextual.current();
                self.check_expression(*expression, expected)
            }
            _ => TypeId::ERROR,
        }
    }

    /// Innermost declaration scope of the walk.
    pub(crate) fn scope(&self) -> DeclId {
        self.ctx
            .current_scope()
            .unwrap_or_else(|| DeclId::root(self.ctx.current_file))
    }

    // =========================================================================
    // Names
    // =========================================================================

    fn identifier_type(&mut self, node: NodeIndex, text: &str) -> TypeId {
        // Left behind by parser recovery; already reported.
        if text.is_empty() {
            return TypeId::ERROR;
        }
        let Some(decl) = self.resolve_name(self.scope(), text, Meaning::Value) else {
            if text == "undefined" {
                return TypeId::UNDEFINED;
            }
            self.error_at(node, diagnostic_codes::CANNOT_FIND_NAME, vec![text.to_string()]);
            return TypeId::ERROR;
        };
        let Some(symbol) = self.bind(decl) else {
            return TypeId::ERROR;
        };
        if !self.ctx.is_speculative() {
            self.registry()
                .record_node_symbol(self.ctx.current_file, node, symbol);
        }
        self.type_of_symbol(symbol)
    }

    // =========================================================================
    // Literals
    // =========================================================================

    /// `[a, b]`. Under a tuple expectation the literal is a fixed tuple of
    /// its element types; otherwise same-typed elements make an array and
    /// mixed ones a fixed tuple.
    fn array_literal_type(&mut self, elements: &NodeList) -> TypeId {
        let expected = self.ctx.contextual.current();
        let expected_tuple = expected.and_then(|ty| self.ctx.types.tuple_shape(ty));
        let expected_element = expected.and_then(|ty| self.ctx.types.array_element(ty));

        let mut types = Vec::with_capacity(elements.len());
        for (index, element) in elements.iter().enumerate() {
            let element_expected = match &expected_tuple {
                Some(shape) => tuple_element_at(shape, index),
                None => expected_element,
            };
            types.push(self.check_expression(element, element_expected));
        }
        if expected_tuple.is_some() {
            return self.ctx.types.fixed_tuple(types);
        }
        let Some(&first) = types.first() else {
            return match expected_element {
                Some(_) => expected.unwrap_or(TypeId::ANY),
                None => self.ctx.types.array(TypeId::ANY),
            };
        };
        // An `any` element stays visible so the boundary can check it.
        if let Some(element) = expected_element
            && types.iter().all(|&ty| {
                (ty != TypeId::ANY || element == TypeId::ANY) && self.is_subtype_of(ty, element)
            })
        {
            return self.ctx.types.array(element);
        }
        if types.iter().all(|&ty| ty == first) {
            self.ctx.types.array(first)
        } else {
            self.ctx.types.fixed_tuple(types)
        }
    }

    /// `{ a: 1, m() { ... } }`
    fn object_literal_type(&mut self, properties: &NodeList) -> TypeId {
        let Some(arena) = self.current_arena() else {
            return TypeId::ERROR;
        };
        let expected_shape = match self.ctx.contextual.current() {
            Some(expected) => self.shape_of_type(expected),
            None => None,
        };
        let mut members = Vec::with_capacity(properties.len());
        for property in properties.iter() {
            let NodeData::PropertyAssignment { name, initializer } = arena.data(property) else {
                continue;
            };
            let Some(text) = arena.identifier_text(*name) else {
                continue;
            };
            let expected = expected_shape
                .as_ref()
                .and_then(|shape| shape.property(text))
                .map(|member| member.type_id);
            let ty = self.with_this(TypeId::ANY, |state| state.check_expression(*initializer, expected));
            self.ctx.record_node_type(property, ty);
            // Method shorthand shares its start with the property.
            let is_method = arena.kind(*initializer) == Some(SyntaxKind::FunctionExpression)
                && arena.span(*initializer).start == arena.span(property).start;
            members.push(PropertyInfo {
                is_method,
                ..PropertyInfo::new(text, ty)
            });
        }
        self.ctx.types.object(members)
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn function_expression_type(&mut self, node: NodeIndex) -> TypeId {
        let Some(decl_id) = self.declaration_for_node(node) else {
            return TypeId::ERROR;
        };
        let Some(symbol) = self.bind(decl_id) else {
            return TypeId::ERROR;
        };
        if let Some(expected) = self.ctx.contextual.current()
            && let Some(contextual) = self.contextual_signature(expected)
        {
            self.assign_contextual_parameters(decl_id, &contextual);
        }
        let ty = self.function_type(symbol);
        if !self.ctx.is_speculative() {
            self.check_function_body(decl_id);
        }
        ty
    }

    /// The single call signature an expected function type offers.
    fn contextual_signature(&mut self, expected: TypeId) -> Option<SignatureShape> {
        let shape = self.shape_of_type(expected)?;
        match shape.call_signatures.as_slice() {
            [signature] => Some(signature.clone()),
            _ => None,
        }
    }

    /// Unannotated parameters take their type from the contextual signature.
    fn assign_contextual_parameters(&mut self, decl_id: DeclId, contextual: &SignatureShape) {
        let (Some(tree), Some(arena)) = (self.registry().tree(decl_id.file), self.arena(decl_id.file))
        else {
            return;
        };
        for (index, param_id) in tree
            .children_of_kind(decl_id, DeclKind::Parameter)
            .into_iter()
            .enumerate()
        {
            let Some(param) = self.declaration(param_id) else {
                continue;
            };
            let annotated = matches!(
                arena.data(param.node),
                NodeData::Parameter { type_annotation, .. } if type_annotation.is_some()
            );
            if annotated {
                continue;
            }
            let Some(ty) = self.parameter_type_at(contextual, index) else {
                continue;
            };
            if let Some(symbol) = self.bind(param_id) {
                trace!(param = %param.display_name, ty = ty.0, "contextual parameter");
                self.assign_parameter_type(symbol, ty);
            }
        }
    }


    // =========================================================================
    // Member access
    // =========================================================================

    fn property_access_type(&mut self, expression: NodeIndex, name: NodeIndex) -> TypeId {
        let object = self.check_expression(expression, None);
        let text = self
            .current_arena()
            .and_then(|arena| arena.identifier_text(name))
            .unwrap_or_default();
        if text.is_empty() {
            return TypeId::ERROR;
        }
        self.member_type(name, object, text)
    }

    /// Type of property `name` of `object`; 2339 at `name_node` if missing.
    pub(crate) fn member_type(&mut self, name_node: NodeIndex, object: TypeId, name: &str) -> TypeId {
        if object.is_any_or_error() {
            return object;
        }
        if name == "length"
            && (object == TypeId::STRING
                || self.ctx.types.array_element(object).is_some()
                || self.ctx.types.tuple_shape(object).is_some())
        {
            return TypeId::NUMBER;
        }
        if let Some(shape) = self.shape_of_type(object) {
            if let Some(property) = shape.property(name) {
                return property.type_id;
            }
            if let Some(index) = shape.string_index {
                return index;
            }
        }
        let object_text = self.format_type(object);
        self.error_at(
            name_node,
            diagnostic_codes::PROPERTY_DOES_NOT_EXIST,
            vec![name.to_string(), object_text],
        );
        TypeId::ERROR
    }

    fn element_access_type(&mut self, expression: NodeIndex, argument: NodeIndex) -> TypeId {
        let object = self.check_expression(expression, None);
        let index = self.check_expression(argument, None);
        if object.is_any_or_error() {
            return object;
        }
        let Some(arena) = self.current_arena() else {
            return TypeId::ERROR;
        };
        let literal = match arena.kind(argument) {
            Some(SyntaxKind::NumericLiteral | SyntaxKind::StringLiteral) => arena.literal_text(argument),
            _ => None,
        };

        if let Some(shape) = self.ctx.types.tuple_shape(object) {
            let Some(position) = literal.and_then(|text| text.parse::<usize>().ok()) else {
                // Unknown index: only a tuple of one element type has a single answer.
                let first = shape.elements.first().copied().unwrap_or(TypeId::ANY);
                return if shape.elements.iter().all(|&ty| ty == first) {
                    first
                } else {
                    TypeId::ANY
                };
            };
            return match tuple_element_at(&shape, position) {
                Some(ty) => ty,
                None => {
                    let object_text = self.format_type(object);
                    self.error_at(
                        argument,
                        diagnostic_codes::PROPERTY_DOES_NOT_EXIST,
                        vec![position.to_string(), object_text],
                    );
                    TypeId::ERROR
                }
            };
        }
        if let Some(element) = self.ctx.types.array_element(object) {
            return element;
        }
        if object == TypeId::STRING {
            return TypeId::STRING;
        }
        if let Some(text) = literal
            && arena.kind(argument) == Some(SyntaxKind::StringLiteral)
        {
            return self.member_type(argument, object, text);
        }
        let Some(shape) = self.shape_of_type(object) else {
            return TypeId::ANY;
        };
        let indexed = if index == TypeId::NUMBER {
            shape.number_index.or(shape.string_index)
        } else {
            shape.string_index
        };
        indexed.unwrap_or(TypeId::ANY)
    }

    // =========================================================================
    // Operators
    // =========================================================================

    fn binary_type(&mut self, left: NodeIndex, operator: SyntaxKind, right: NodeIndex) -> TypeId {
        if operator == SyntaxKind::EqualsToken {
            return self.assignment_type(left, right);
        }
        let left_type = self.check_expression(left, None);
        let right_type = self.check_expression(right, None);
        match operator {
            SyntaxKind::PlusToken => {
                if left_type == TypeId::STRING || right_type == TypeId::STRING {
                    TypeId::STRING
                } else if left_type.is_any_or_error() || right_type.is_any_or_error() {
                    TypeId::ANY
                } else {
                    TypeId::NUMBER
                }
            }
            SyntaxKind::MinusToken
            | SyntaxKind::AsteriskToken
            | SyntaxKind::SlashToken
            | SyntaxKind::PercentToken => TypeId::NUMBER,
            SyntaxKind::AmpersandAmpersandToken => right_type,
            SyntaxKind::BarBarToken => {
                if self.is_subtype_of(right_type, left_type) {
                    left_type
                } else if self.is_subtype_of(left_type, right_type) {
                    right_type
                } else {
                    TypeId::ANY
                }
            }
            _ => TypeId::BOOLEAN,
        }
    }

    /// `left = right`: the right side crosses a boundary into the left's type.
    fn assignment_type(&mut self, left: NodeIndex, right: NodeIndex) -> TypeId {
        let target = self.check_expression(left, None);
        let source = self.check_expression(right, Some(target));
        self.check_boundary(right, source, target, Boundary::Assignment);
        source
    }

    /// `<T>expr`. Upcasts are free, downcasts are checked at run time, and
    /// unrelated types are a 2352.
    fn type_assertion_type(&mut self, type_node: NodeIndex, expression: NodeIndex) -> TypeId {
        let target = self.type_from_node(self.ctx.current_file, type_node, self.scope());
        let source = self.check_expression(expression, Some(target));
        self.consume_freshness_of(expression);
        if target.is_any_or_error() || source == TypeId::ERROR {
            return target;
        }
        if source == TypeId::ANY {
            self.record_tag(expression, TagKind::CheckAndTag, source, target);
            return target;
        }
        self.resolve_type_deeply(source);
        self.resolve_type_deeply(target);
        if self.is_subtype_of(source, target) {
            if let Some(kind) = self.upcast_tag(source, target, false) {
                self.record_tag(expression, kind, source, target);
            }
        } else if self.is_subtype_of(target, source) {
            self.record_tag(expression, TagKind::CheckAndTag, source, target);
        } else {
            let source_text = self.format_type(source);
            let target_text = self.format_type(target);
            self.error_at(
                expression,
                diagnostic_codes::TYPE_ASSERTION_INCOMPATIBLE,
                vec![source_text, target_text],
            );
        }
        target
    }
}
