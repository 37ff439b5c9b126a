//! Hand-built `TypeResolver` for solver unit tests.

use crate::intern::TypeInterner;
use crate::subtype::TypeResolver;
use crate::types::{ObjectShape, PropertyInfo, TypeId};
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;
use sts_binder::SymbolId;

#[derive(Default)]
pub(crate) struct MockResolver {
    shapes: FxHashMap<TypeId, Rc<ObjectShape>>,
    classes: FxHashMap<TypeId, SymbolId>,
    bases: FxHashMap<SymbolId, SymbolId>,
    enums: FxHashSet<TypeId>,
    constraints: FxHashMap<SymbolId, TypeId>,
    names: FxHashMap<SymbolId, String>,
}

impl MockResolver {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn name(&mut self, symbol: SymbolId, name: &str) {
        self.names.insert(symbol, name.to_string());
    }

    pub(crate) fn interface(
        &mut self,
        interner: &TypeInterner,
        symbol: SymbolId,
        name: &str,
        properties: Vec<PropertyInfo>,
    ) -> TypeId {
        let ty = interner.reference(symbol);
        self.name(symbol, name);
        self.shapes.insert(ty, Rc::new(ObjectShape::new(properties)));
        ty
    }

    /// Declares the members after the type exists, for self-referencing shapes.
    pub(crate) fn set_members(&mut self, ty: TypeId, properties: Vec<PropertyInfo>) {
        self.shapes.insert(ty, Rc::new(ObjectShape::new(properties)));
    }

    pub(crate) fn class(
        &mut self,
        interner: &TypeInterner,
        symbol: SymbolId,
        name: &str,
        base: Option<SymbolId>,
        properties: Vec<PropertyInfo>,
    ) -> TypeId {
        let ty = self.interface(interner, symbol, name, properties);
        self.classes.insert(ty, symbol);
        if let Some(base) = base {
            self.bases.insert(symbol, base);
        }
        ty
    }

    pub(crate) fn enumeration(&mut self, interner: &TypeInterner, symbol: SymbolId, name: &str) -> TypeId {
        let ty = interner.reference(symbol);
        self.name(symbol, name);
        self.enums.insert(ty);
        ty
    }

    pub(crate) fn type_param(
        &mut self,
        interner: &TypeInterner,
        symbol: SymbolId,
        name: &str,
        constraint: Option<TypeId>,
    ) -> TypeId {
        self.name(symbol, name);
        if let Some(constraint) = constraint {
            self.constraints.insert(symbol, constraint);
        }
        interner.type_param(symbol)
    }
}

impl TypeResolver for MockResolver {
    fn object_shape(&self, ty: TypeId) -> Option<Rc<ObjectShape>> {
        self.shapes.get(&ty).cloned()
    }

    fn class_of(&self, ty: TypeId) -> Option<SymbolId> {
        self.classes.get(&ty).copied()
    }

    fn derives_from(&self, class: SymbolId, base: SymbolId) -> bool {
        let mut current = Some(class);
        while let Some(symbol) = current {
            if symbol == base {
                return true;
            }
            current = self.bases.get(&symbol).copied();
        }
        false
    }

    fn is_enum_type(&self, ty: TypeId) -> bool {
        self.enums.contains(&ty)
    }

    fn constraint_of(&self, type_param: SymbolId) -> Option<TypeId> {
        self.constraints.get(&type_param).copied()
    }

    fn symbol_name(&self, symbol: SymbolId) -> String {
        self.names
            .get(&symbol)
            .cloned()
            .unwrap_or_else(|| format!("symbol#{}", symbol.0))
    }
}
