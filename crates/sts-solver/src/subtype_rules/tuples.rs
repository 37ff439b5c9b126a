//! Tuple and array rules.
//!
//! A tuple is `(elements[0..n], k)`. Indices below `k` are fixed; from `k`
//! on, positions cycle through the tail `elements[k..n]`, so index `i >= k`
//! uses `elements[k + (i - k) % (n - k)]`. When `k == n` the tuple has
//! exactly `n` elements.
//!
//! A value of width `w` fits an open tuple whenever `w >= k`. Widths that
//! end partway through a cycle are accepted, and tail slots past the end of
//! the value constrain nothing.

use crate::subtype::{SubtypeChecker, SubtypeResult, TypeResolver};
use crate::types::{TupleShape, TypeId};
use sts_common::limits::MAX_TUPLE_PERIOD;

/// Element type expected at `index`, or `None` past the end of a fixed tuple.
pub fn tuple_element_at(shape: &TupleShape, index: usize) -> Option<TypeId> {
    let rest_start = shape.rest_start();
    if index < rest_start {
        return Some(shape.elements[index]);
    }
    let period = shape.period();
    if period == 0 {
        return None;
    }
    Some(shape.elements[rest_start + (index - rest_start) % period])
}

/// Whether a value of some width can fit a tuple at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TupleWidthCheck {
    Fits,
    /// Open tuple, value shorter than the fixed prefix.
    TooShort { required: usize },
    /// Fixed tuple, value of a different width.
    WrongWidth { expected: usize },
}

impl TupleWidthCheck {
    pub fn fits(self) -> bool {
        matches!(self, TupleWidthCheck::Fits)
    }
}

pub fn tuple_width_check(width: usize, target: &TupleShape) -> TupleWidthCheck {
    if target.is_fixed() {
        if width == target.width() {
            TupleWidthCheck::Fits
        } else {
            TupleWidthCheck::WrongWidth {
                expected: target.width(),
            }
        }
    } else if width >= target.rest_start() {
        TupleWidthCheck::Fits
    } else {
        TupleWidthCheck::TooShort {
            required: target.rest_start(),
        }
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

impl<R: TypeResolver + ?Sized> SubtypeChecker<'_, R> {
    pub(crate) fn check_tuple_subtype(
        &mut self,
        source: &TupleShape,
        target: &TupleShape,
    ) -> SubtypeResult {
        if source.is_fixed() {
            return self.check_fixed_tuple_elements(&source.elements, target);
        }
        // An open source may be arbitrarily long, so the target must be open
        // too and its fixed prefix covered by the source's.
        if target.is_fixed() || source.rest_start() < target.rest_start() {
            return SubtypeResult::False;
        }

        let (source_period, target_period) = (source.period(), target.period());
        let common = source_period / gcd(source_period, target_period) * target_period;
        if common > MAX_TUPLE_PERIOD {
            return self.check_open_tuple_tails_pairwise(source, target);
        }

        // Both sides are periodic past the source prefix, so one common
        // period beyond it covers every index.
        let mut result = SubtypeResult::True;
        for index in 0..source.rest_start() + common {
            let (Some(s), Some(t)) = (
                tuple_element_at(source, index),
                tuple_element_at(target, index),
            ) else {
                return SubtypeResult::False;
            };
            result = result.and(self.check_subtype(s, t));
            if result.is_false() {
                return result;
            }
        }
        result
    }

    /// Relates the element types of a concrete value of known width.
    pub(crate) fn check_fixed_tuple_elements(
        &mut self,
        elements: &[TypeId],
        target: &TupleShape,
    ) -> SubtypeResult {
        if !tuple_width_check(elements.len(), target).fits() {
            return SubtypeResult::False;
        }
        let mut result = SubtypeResult::True;
        for (index, &element) in elements.iter().enumerate() {
            let Some(expected) = tuple_element_at(target, index) else {
                return SubtypeResult::False;
            };
            result = result.and(self.check_subtype(element, expected));
            if result.is_false() {
                return result;
            }
        }
        result
    }

    fn check_open_tuple_tails_pairwise(
        &mut self,
        source: &TupleShape,
        target: &TupleShape,
    ) -> SubtypeResult {
        let mut result = SubtypeResult::True;
        for index in 0..source.rest_start() {
            let (Some(s), Some(t)) = (
                tuple_element_at(source, index),
                tuple_element_at(target, index),
            ) else {
                return SubtypeResult::False;
            };
            result = result.and(self.check_subtype(s, t));
            if result.is_false() {
                return result;
            }
        }
        let target_tail = &target.elements[target.rest_start()..];
        for &s in &source.elements[source.rest_start()..] {
            for &t in target_tail {
                result = result.and(self.check_subtype(s, t));
                if result.is_false() {
                    return result;
                }
            }
        }
        result
    }

    pub(crate) fn check_tuple_to_array(
        &mut self,
        source: &TupleShape,
        target_elem: TypeId,
    ) -> SubtypeResult {
        let mut result = SubtypeResult::True;
        for &element in &source.elements {
            result = result.and(self.check_subtype(element, target_elem));
            if result.is_false() {
                return result;
            }
        }
        result
    }

    /// An array has unknown width, so only an all-rest tuple can take it,
    /// and its element must fit every tail slot.
    pub(crate) fn check_array_to_tuple(
        &mut self,
        source_elem: TypeId,
        target: &TupleShape,
    ) -> SubtypeResult {
        if target.rest_start() != 0 || target.is_fixed() {
            return SubtypeResult::False;
        }
        let mut result = SubtypeResult::True;
        for &element in &target.elements {
            result = result.and(self.check_subtype(source_elem, element));
            if result.is_false() {
                return result;
            }
        }
        result
    }
}

#[cfg(test)]
#[path = "../../tests/tuple_tests.rs"]
mod tests;
