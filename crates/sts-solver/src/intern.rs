//! Type interning.
//!
//! Every `TypeKey` maps to exactly one `TypeId`. The interner is shared by
//! reference through the checker, so storage sits behind `RefCell`s and
//! lookups hand out `Rc<TypeKey>` clones instead of borrows.

use crate::types::{
    IntrinsicKind, ObjectShape, PropertyInfo, SignatureShape, TupleShape, TypeId, TypeKey,
};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use sts_binder::SymbolId;

pub struct TypeInterner {
    keys: RefCell<Vec<Rc<TypeKey>>>,
    ids: RefCell<FxHashMap<Rc<TypeKey>, TypeId>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    /// Creates an interner with the intrinsic types pre-registered at their
    /// fixed ids.
    pub fn new() -> Self {
        let interner = TypeInterner {
            keys: RefCell::new(Vec::with_capacity(64)),
            ids: RefCell::new(FxHashMap::default()),
        };
        for kind in IntrinsicKind::ALL {
            let id = interner.intern(TypeKey::Intrinsic(kind));
            debug_assert_eq!(id, kind.type_id());
        }
        interner
    }

    pub fn intern(&self, key: TypeKey) -> TypeId {
        if let Some(&id) = self.ids.borrow().get(&key) {
            return id;
        }
        let key = Rc::new(key);
        let mut keys = self.keys.borrow_mut();
        let id = TypeId(keys.len() as u32);
        keys.push(Rc::clone(&key));
        self.ids.borrow_mut().insert(key, id);
        id
    }

    pub fn lookup(&self, id: TypeId) -> Option<Rc<TypeKey>> {
        self.keys.borrow().get(id.0 as usize).cloned()
    }

    pub fn len(&self) -> usize {
        self.keys.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn array(&self, element: TypeId) -> TypeId {
        self.intern(TypeKey::Array(element))
    }

    pub fn tuple(&self, shape: TupleShape) -> TypeId {
        self.intern(TypeKey::Tuple(shape))
    }

    pub fn fixed_tuple(&self, elements: Vec<TypeId>) -> TypeId {
        self.tuple(TupleShape::fixed(elements))
    }

    pub fn object(&self, properties: Vec<PropertyInfo>) -> TypeId {
        self.object_with_shape(ObjectShape::new(properties))
    }

    pub fn object_with_shape(&self, mut shape: ObjectShape) -> TypeId {
        shape.normalize();
        self.intern(TypeKey::Object(shape))
    }

    /// Function type: an object with exactly one call signature.
    pub fn function(&self, signature: SignatureShape) -> TypeId {
        self.intern(TypeKey::Object(ObjectShape {
            call_signatures: vec![signature],
            ..ObjectShape::default()
        }))
    }

    pub fn reference(&self, symbol: SymbolId) -> TypeId {
        self.intern(TypeKey::Ref(symbol))
    }

    pub fn application(&self, base: SymbolId, args: Vec<TypeId>) -> TypeId {
        self.intern(TypeKey::Application { base, args })
    }

    pub fn type_param(&self, symbol: SymbolId) -> TypeId {
        self.intern(TypeKey::TypeParameter(symbol))
    }

    pub fn class_constructor(&self, symbol: SymbolId) -> TypeId {
        self.intern(TypeKey::ClassConstructor(symbol))
    }

    pub fn namespace(&self, symbol: SymbolId) -> TypeId {
        self.intern(TypeKey::Namespace(symbol))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn array_element(&self, id: TypeId) -> Option<TypeId> {
        match self.lookup(id)?.as_ref() {
            TypeKey::Array(element) => Some(*element),
            _ => None,
        }
    }

    pub fn tuple_shape(&self, id: TypeId) -> Option<TupleShape> {
        match self.lookup(id)?.as_ref() {
            TypeKey::Tuple(shape) => Some(shape.clone()),
            _ => None,
        }
    }

    /// The single call signature of an anonymous function type.
    pub fn function_signature(&self, id: TypeId) -> Option<SignatureShape> {
        match self.lookup(id)?.as_ref() {
            TypeKey::Object(shape)
                if shape.call_signatures.len() == 1
                    && shape.properties.is_empty()
                    && shape.construct_signatures.is_empty() =>
            {
                shape.call_signatures.first().cloned()
            }
            _ => None,
        }
    }

    pub fn is_type_parameter(&self, id: TypeId) -> bool {
        matches!(
            self.lookup(id).as_deref(),
            Some(TypeKey::TypeParameter(_))
        )
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
