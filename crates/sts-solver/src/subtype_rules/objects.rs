//! Structural rules for object-like types: width and depth subtyping over
//! properties, call and construct signatures, and index signatures.

use crate::subtype::{SubtypeChecker, SubtypeResult, TypeResolver};
use crate::types::{ObjectShape, SignatureShape, TypeId};

impl<R: TypeResolver + ?Sized> SubtypeChecker<'_, R> {
    pub(crate) fn check_object_subtype(&mut self, source: TypeId, target: TypeId) -> SubtypeResult {
        let Some(target_shape) = self.shape_of(target) else {
            return SubtypeResult::False;
        };
        // `{}` accepts every value.
        if target_shape.is_empty() {
            return SubtypeResult::True;
        }
        let Some(source_shape) = self.shape_of(source) else {
            return SubtypeResult::False;
        };

        let mut result = self.check_properties(&source_shape, &target_shape);
        if result.is_false() {
            return result;
        }
        result = result.and(self.check_signature_lists(
            &source_shape.call_signatures,
            &target_shape.call_signatures,
        ));
        if result.is_false() {
            return result;
        }
        result = result.and(self.check_signature_lists(
            &source_shape.construct_signatures,
            &target_shape.construct_signatures,
        ));
        if result.is_false() {
            return result;
        }
        result.and(self.check_index_signatures(&source_shape, &target_shape))
    }

    /// Every required target property must exist on the source with a
    /// compatible type. Extra source properties are ignored.
    fn check_properties(&mut self, source: &ObjectShape, target: &ObjectShape) -> SubtypeResult {
        let mut result = SubtypeResult::True;
        for target_prop in &target.properties {
            let Some(source_prop) = source.property(&target_prop.name) else {
                if target_prop.optional {
                    continue;
                }
                return SubtypeResult::False;
            };
            if source_prop.optional && !target_prop.optional {
                return SubtypeResult::False;
            }
            result = result.and(self.check_subtype(source_prop.type_id, target_prop.type_id));
            if result.is_false() {
                return result;
            }
        }
        result
    }

    /// Each target signature needs some source signature that relates to it.
    fn check_signature_lists(
        &mut self,
        source: &[SignatureShape],
        target: &[SignatureShape],
    ) -> SubtypeResult {
        let mut result = SubtypeResult::True;
        for target_sig in target {
            let matched = source
                .iter()
                .map(|source_sig| self.check_signature_subtype(source_sig, target_sig))
                .find(|r| r.is_true());
            match matched {
                Some(found) => result = result.and(found),
                None => return SubtypeResult::False,
            }
        }
        result
    }

    fn check_index_signatures(&mut self, source: &ObjectShape, target: &ObjectShape) -> SubtypeResult {
        let mut result = SubtypeResult::True;
        if let Some(target_index) = target.string_index {
            result = match source.string_index {
                Some(source_index) => self.check_subtype(source_index, target_index),
                None => self.check_all_properties_against(source, target_index, |_| true),
            };
            if result.is_false() {
                return result;
            }
        }
        if let Some(target_index) = target.number_index {
            let source_index = source.number_index.or(source.string_index);
            result = result.and(match source_index {
                Some(source_index) => self.check_subtype(source_index, target_index),
                None => self.check_all_properties_against(source, target_index, |name| {
                    name.parse::<f64>().is_ok()
                }),
            });
        }
        result
    }

    /// Without its own index signature a source is indexable when every
    /// property an index could reach fits the target index type.
    fn check_all_properties_against(
        &mut self,
        source: &ObjectShape,
        index_type: TypeId,
        reachable: impl Fn(&str) -> bool,
    ) -> SubtypeResult {
        let mut result = SubtypeResult::True;
        for prop in source.properties.iter().filter(|p| reachable(&p.name)) {
            result = result.and(self.check_subtype(prop.type_id, index_type));
            if result.is_false() {
                return result;
            }
        }
        result
    }
}
