//! Call and `new` expressions.
//!
//! - Candidate signatures are filtered by arity first; with several left,
//!   the first whose arguments all fit is chosen, tried without reporting.
//! - Generic signatures bind each type parameter from the first argument
//!   passed to a `T` or `T[]` parameter; unbound parameters become `any`.
//! - Arguments are then checked for real against the chosen signature,
//!   each one a typing boundary (2345).

use sts_common::diagnostics::diagnostic_codes;
use sts_parser::{NodeIndex, NodeList, SyntaxKind};
use sts_solver::{SignatureShape, TypeId, TypeKey, TypeSubstitution, instantiate_signature};
use tracing::trace;

use crate::check_pass::Boundary;
use crate::state::CheckerState;

/// Which signature list a call site draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallKind {
    Call,
    New,
}

impl<'a> CheckerState<'a> {
    pub(crate) fn check_call(&mut self, node: NodeIndex, callee: NodeIndex, arguments: &NodeList) -> TypeId {
        self.check_call_like(node, callee, arguments, CallKind::Call)
    }

    pub(crate) fn check_new(&mut self, node: NodeIndex, callee: NodeIndex, arguments: &NodeList) -> TypeId {
        self.check_call_like(node, callee, arguments, CallKind::New)
    }

    fn check_call_like(
        &mut self,
        node: NodeIndex,
        callee: NodeIndex,
        arguments: &NodeList,
        kind: CallKind,
    ) -> TypeId {
        let callee_type = self.check_expression(callee, None);
        if callee_type.is_any_or_error() {
            self.check_arguments_unguided(arguments);
            return callee_type;
        }
        let signatures = match self.shape_of_type(callee_type) {
            Some(shape) if kind == CallKind::Call => shape.call_signatures.clone(),
            Some(shape) => shape.construct_signatures.clone(),
            None => Vec::new(),
        };
        if signatures.is_empty() {
            self.check_arguments_unguided(arguments);
            match kind {
                CallKind::Call => {
                    let callee_text = self.format_type(callee_type);
                    self.error_at(
                        callee,
                        diagnostic_codes::EXPRESSION_NOT_CALLABLE,
                        vec![callee_text],
                    );
                }
                CallKind::New => {
                    self.error_at(callee, diagnostic_codes::EXPRESSION_NOT_NEWABLE, Vec::new());
                }
            }
            return TypeId::ERROR;
        }
        self.resolve_call(node, &signatures, arguments)
    }

    /// Pick a signature, check the arguments against it and return its
    /// instantiated return type.
    fn resolve_call(&mut self, node: NodeIndex, signatures: &[SignatureShape], arguments: &NodeList) -> TypeId {
        let count = arguments.len();
        let candidates: Vec<&SignatureShape> = signatures
            .iter()
            .filter(|signature| signature.accepts_arity(count))
            .collect();

        let chosen = match candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            _ => candidates.iter().copied().find(|&candidate| {
                let instantiated = self.instantiate_for_call(candidate, arguments);
                self.speculatively(|state| state.arguments_fit(&instantiated, arguments))
            }),
        };
        let Some(signature) = chosen else {
            trace!(count, overloads = signatures.len(), "no signature matches call");
            self.check_arguments_unguided(arguments);
            self.error_at(node, diagnostic_codes::SUPPLIED_PARAMETERS_DO_NOT_MATCH, Vec::new());
            return TypeId::ERROR;
        };

        let instantiated = self.instantiate_for_call(signature, arguments);
        for (index, argument) in arguments.iter().enumerate() {
            let expected = self.parameter_type_at(&instantiated, index);
            let ty = self.check_expression(argument, expected);
            if let Some(expected) = expected {
                self.check_boundary(argument, ty, expected, Boundary::Argument);
            }
        }
        instantiated.return_type
    }

    /// Type a parameter at `index` takes, reading a rest parameter's element.
    pub(crate) fn parameter_type_at(&self, signature: &SignatureShape, index: usize) -> Option<TypeId> {
        let param = match signature.params.get(index) {
            Some(param) => param,
            None => signature.params.last().filter(|param| param.rest)?,
        };
        if param.rest {
            Some(
                self.ctx
                    .types
                    .array_element(param.type_id)
                    .unwrap_or(TypeId::ANY),
            )
        } else {
            Some(param.type_id)
        }
    }

    fn arguments_fit(&mut self, signature: &SignatureShape, arguments: &NodeList) -> bool {
        for (index, argument) in arguments.iter().enumerate() {
            // A function argument's parameters take their types from the
            // chosen signature only.
            if self.is_function_expression(argument) {
                continue;
            }
            let Some(expected) = self.parameter_type_at(signature, index) else {
                continue;
            };
            let ty = self.check_expression(argument, Some(expected));
            if !self.relate(argument, ty, expected).is_assignable() {
                return false;
            }
        }
        true
    }

    fn check_arguments_unguided(&mut self, arguments: &NodeList) {
        for argument in arguments.iter() {
            self.check_expression(argument, None);
        }
    }

    fn is_function_expression(&self, node: NodeIndex) -> bool {
        self.current_arena()
            .and_then(|arena| arena.kind(node))
            .is_some_and(|kind| kind == SyntaxKind::FunctionExpression)
    }

    // =========================================================================
    // Generic inference
    // =========================================================================

    fn instantiate_for_call(&mut self, signature: &SignatureShape, arguments: &NodeList) -> SignatureShape {
        if signature.type_params.is_empty() {
            return signature.clone();
        }
        let subst = self.infer_type_arguments(signature, arguments);
        instantiate_signature(&self.ctx.types, signature, &subst)
    }

    fn infer_type_arguments(&mut self, signature: &SignatureShape, arguments: &NodeList) -> TypeSubstitution {
        let mut subst = TypeSubstitution::new();
        for (index, argument) in arguments.iter().enumerate() {
            if self.is_function_expression(argument) {
                continue;
            }
            let Some(param_type) = self.parameter_type_at(signature, index) else {
                continue;
            };
            let Some(key) = self.ctx.types.lookup(param_type) else {
                continue;
            };
            let (param, through_array) = match key.as_ref() {
                TypeKey::TypeParameter(param) => (*param, false),
                TypeKey::Array(element) => match self.ctx.types.lookup(*element).as_deref() {
                    Some(TypeKey::TypeParameter(param)) => (*param, true),
                    _ => continue,
                },
                _ => continue,
            };
            if !signature.type_params.contains(&param) || subst.get(param).is_some() {
                continue;
            }
            let argument_type = self.speculatively(|state| state.check_expression(argument, None));
            let inferred = if through_array {
                self.element_type_of(argument_type)
            } else {
                Some(argument_type)
            };
            if let Some(inferred) = inferred {
                subst.insert(param, inferred);
            }
        }
        for &param in &signature.type_params {
            if subst.get(param).is_none() {
                subst.insert(param, TypeId::ANY);
            }
        }
        subst
    }

    /// Element type of an array, or of a tuple whose elements agree.
    fn element_type_of(&self, ty: TypeId) -> Option<TypeId> {
        if let Some(element) = self.ctx.types.array_element(ty) {
            return Some(element);
        }
        let shape = self.ctx.types.tuple_shape(ty)?;
        let first = *shape.elements.first()?;
        shape
            .elements
            .iter()
            .all(|&element| element == first)
            .then_some(first)
    }
}
