//! Signature rules.
//!
//! Parameters are contravariant and returns covariant. A source may take
//! fewer parameters than the target supplies; a `void` target return
//! accepts any source return.

use crate::instantiate::{TypeSubstitution, instantiate_signature};
use crate::subtype::{SubtypeChecker, SubtypeResult, TypeResolver};
use crate::types::{SignatureShape, TypeId};

impl<R: TypeResolver + ?Sized> SubtypeChecker<'_, R> {
    pub(crate) fn check_signature_subtype(
        &mut self,
        source: &SignatureShape,
        target: &SignatureShape,
    ) -> SubtypeResult {
        // A generic source is compared with its type parameters erased.
        if !source.type_params.is_empty() && target.type_params.is_empty() {
            let erased = TypeSubstitution::erasing(&source.type_params);
            let source = instantiate_signature(self.interner, source, &erased);
            return self.check_signature_subtype(&source, target);
        }

        if !target.has_rest() && source.min_args() > target.params.len() {
            return SubtypeResult::False;
        }

        let mut result = SubtypeResult::True;
        let positions = source.params.len().max(target.params.len());
        for index in 0..positions {
            let (Some(source_param), Some(target_param)) =
                (self.param_type_at(source, index), self.param_type_at(target, index))
            else {
                continue;
            };
            result = result.and(self.check_subtype(target_param, source_param));
            if result.is_false() {
                return result;
            }
        }

        if target.return_type == TypeId::VOID {
            return result;
        }
        result.and(self.check_subtype(source.return_type, target.return_type))
    }

    /// Type accepted at argument position `index`, looking through a
    /// trailing rest parameter.
    pub(crate) fn param_type_at(&self, signature: &SignatureShape, index: usize) -> Option<TypeId> {
        let last = signature.params.len().checked_sub(1)?;
        let param = &signature.params[index.min(last)];
        if param.rest {
            return Some(
                self.interner
                    .array_element(param.type_id)
                    .unwrap_or(TypeId::ANY),
            );
        }
        (index <= last).then_some(param.type_id)
    }
}
