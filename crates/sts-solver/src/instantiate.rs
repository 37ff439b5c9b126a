//! Generic instantiation by substitution.
//!
//! `instantiate_type` replaces type parameters with type arguments,
//! re-interning every rebuilt shape. Named types (`Ref`) are left alone;
//! applications have their arguments substituted.

use crate::intern::TypeInterner;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{ObjectShape, ParamInfo, PropertyInfo, SignatureShape, TupleShape, TypeId, TypeKey};
use rustc_hash::FxHashMap;
use sts_binder::SymbolId;

/// Mapping from type parameter symbols to type arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: FxHashMap<SymbolId, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs parameters with arguments positionally; missing arguments
    /// become `any`.
    pub fn from_args(params: &[SymbolId], args: &[TypeId]) -> Self {
        let map = params
            .iter()
            .enumerate()
            .map(|(i, &param)| (param, args.get(i).copied().unwrap_or(TypeId::ANY)))
            .collect();
        TypeSubstitution { map }
    }

    /// Substitutes `any` for every parameter.
    pub fn erasing(params: &[SymbolId]) -> Self {
        Self::from_args(params, &[])
    }

    pub fn insert(&mut self, param: SymbolId, arg: TypeId) {
        self.map.insert(param, arg);
    }

    pub fn get(&self, param: SymbolId) -> Option<TypeId> {
        self.map.get(&param).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Copy without the given parameters, for signatures that declare
    /// their own type parameters of the same symbols.
    fn without(&self, shadowed: &[SymbolId]) -> TypeSubstitution {
        let mut map = self.map.clone();
        for param in shadowed {
            map.remove(param);
        }
        TypeSubstitution { map }
    }
}

struct TypeInstantiator<'a> {
    interner: &'a TypeInterner,
    depth: DepthCounter,
}

impl<'a> TypeInstantiator<'a> {
    fn new(interner: &'a TypeInterner) -> Self {
        TypeInstantiator {
            interner,
            depth: DepthCounter::with_profile(RecursionProfile::Instantiation),
        }
    }

    fn instantiate(&mut self, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
        if ty.is_intrinsic() || subst.is_empty() {
            return ty;
        }
        if !self.depth.enter() {
            return TypeId::ERROR;
        }
        let result = self.instantiate_key(ty, subst);
        self.depth.leave();
        result
    }

    fn instantiate_key(&mut self, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
        let Some(key) = self.interner.lookup(ty) else {
            return ty;
        };
        match key.as_ref() {
            TypeKey::TypeParameter(param) => subst.get(*param).unwrap_or(ty),
            TypeKey::Array(element) => {
                let element = self.instantiate(*element, subst);
                self.interner.array(element)
            }
            TypeKey::Tuple(shape) => {
                let elements = shape
                    .elements
                    .iter()
                    .map(|&e| self.instantiate(e, subst))
                    .collect();
                self.interner
                    .tuple(TupleShape::new(elements, shape.rest_start))
            }
            TypeKey::Object(shape) => {
                let shape = self.instantiate_shape(shape, subst);
                self.interner.object_with_shape(shape)
            }
            TypeKey::Application { base, args } => {
                let args = args.iter().map(|&a| self.instantiate(a, subst)).collect();
                self.interner.application(*base, args)
            }
            TypeKey::Intrinsic(_)
            | TypeKey::Ref(_)
            | TypeKey::ClassConstructor(_)
            | TypeKey::Namespace(_) => ty,
        }
    }

    fn instantiate_shape(&mut self, shape: &ObjectShape, subst: &TypeSubstitution) -> ObjectShape {
        ObjectShape {
            properties: shape
                .properties
                .iter()
                .map(|p| PropertyInfo {
                    type_id: self.instantiate(p.type_id, subst),
                    ..p.clone()
                })
                .collect(),
            call_signatures: shape
                .call_signatures
                .iter()
                .map(|s| self.instantiate_signature(s, subst))
                .collect(),
            construct_signatures: shape
                .construct_signatures
                .iter()
                .map(|s| self.instantiate_signature(s, subst))
                .collect(),
            string_index: shape.string_index.map(|t| self.instantiate(t, subst)),
            number_index: shape.number_index.map(|t| self.instantiate(t, subst)),
        }
    }

    fn instantiate_signature(
        &mut self,
        signature: &SignatureShape,
        subst: &TypeSubstitution,
    ) -> SignatureShape {
        let shadowed;
        let subst = if signature.type_params.iter().any(|p| subst.get(*p).is_some()) {
            shadowed = subst.without(&signature.type_params);
            &shadowed
        } else {
            subst
        };
        SignatureShape {
            type_params: signature.type_params.clone(),
            params: signature
                .params
                .iter()
                .map(|p| ParamInfo {
                    type_id: self.instantiate(p.type_id, subst),
                    ..p.clone()
                })
                .collect(),
            return_type: self.instantiate(signature.return_type, subst),
        }
    }
}

pub fn instantiate_type(interner: &TypeInterner, ty: TypeId, subst: &TypeSubstitution) -> TypeId {
    TypeInstantiator::new(interner).instantiate(ty, subst)
}

/// Substitutes through a signature. Type parameters bound by `subst` are
/// dropped from the result, so this also specializes a generic signature.
pub fn instantiate_signature(
    interner: &TypeInterner,
    signature: &SignatureShape,
    subst: &TypeSubstitution,
) -> SignatureShape {
    let mut instantiator = TypeInstantiator::new(interner);
    let own: Vec<SymbolId> = signature
        .type_params
        .iter()
        .copied()
        .filter(|p| subst.get(*p).is_none())
        .collect();
    let outer = SignatureShape {
        type_params: Vec::new(),
        ..signature.clone()
    };
    let mut result = instantiator.instantiate_signature(&outer, subst);
    result.type_params = own;
    result
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod tests;
