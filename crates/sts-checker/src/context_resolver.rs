//! `TypeResolver` implementation for `CheckerContext`.
//!
//! The solver sees classes, interfaces, enums and namespaces only as
//! symbol references. This impl answers its questions from the symbol
//! arena. It is read-only: member shapes are resolved by the signature pass
//! before any relation is asked about them, and a shape that is still
//! unresolved reads as absent. Shapes of generic applications are derived
//! on demand by substitution and cached.

use std::rc::Rc;

use sts_binder::{DeclKind, SymbolId};
use sts_common::limits::MAX_PARENT_CHAIN;
use sts_solver::{
    ObjectShape, PropertyInfo, TypeId, TypeKey, TypeResolver, TypeSubstitution, instantiate_type,
};

use crate::context::CheckerContext;
use crate::symbols::SymbolKind;

impl<'a> CheckerContext<'a> {
    /// Members of a class instance or interface type, resolved or not.
    pub(crate) fn declared_members(&self, symbol: SymbolId) -> Option<Rc<ObjectShape>> {
        match &self.symbols.get(symbol)?.kind {
            SymbolKind::Class(class) => class.members.resolved(),
            SymbolKind::Interface(interface) => interface.members.resolved(),
            _ => None,
        }
    }

    fn application_shape(&self, ty: TypeId, base: SymbolId, args: &[TypeId]) -> Option<Rc<ObjectShape>> {
        if let Some(shape) = self.application_shapes.borrow().get(&ty) {
            return Some(Rc::clone(shape));
        }
        let generic = self.declared_members(base)?;
        let params = self.symbols.get(base)?.type_params();
        let subst = TypeSubstitution::from_args(params, args);
        let generic_id = self.types.object_with_shape(generic.as_ref().clone());
        let instantiated = instantiate_type(&self.types, generic_id, &subst);
        let shape = match self.types.lookup(instantiated)?.as_ref() {
            TypeKey::Object(shape) => Rc::new(shape.clone()),
            _ => return None,
        };
        self.application_shapes
            .borrow_mut()
            .insert(ty, Rc::clone(&shape));
        Some(shape)
    }

    /// `typeof E`: one property per member, each of the enum type.
    fn enum_namespace_shape(&self, symbol: SymbolId) -> Option<Rc<ObjectShape>> {
        let SymbolKind::Enum(enumeration) = &self.symbols.get(symbol)?.kind else {
            return None;
        };
        let properties = enumeration
            .members
            .iter()
            .filter_map(|&member| self.symbols.get(member))
            .map(|member| PropertyInfo::new(&member.name, enumeration.instance_type))
            .collect();
        Some(Rc::new(ObjectShape::new(properties)))
    }

    /// Base class of `class`, after cycle cutting.
    pub(crate) fn base_class_of(&self, class: SymbolId) -> Option<SymbolId> {
        match &self.symbols.get(class)?.kind {
            SymbolKind::Class(symbol) => symbol.base_class,
            _ => None,
        }
    }
}

impl<'a> TypeResolver for CheckerContext<'a> {
    fn object_shape(&self, ty: TypeId) -> Option<Rc<ObjectShape>> {
        match self.types.lookup(ty)?.as_ref() {
            TypeKey::Object(shape) => Some(Rc::new(shape.clone())),
            TypeKey::Ref(symbol) => self.declared_members(*symbol),
            TypeKey::Application { base, args } => self.application_shape(ty, *base, args),
            TypeKey::ClassConstructor(symbol) => match &self.symbols.get(*symbol)?.kind {
                SymbolKind::Class(class) => class.statics.resolved(),
                _ => None,
            },
            TypeKey::Namespace(symbol) => match &self.symbols.get(*symbol)?.kind {
                SymbolKind::Module(module) => module.exports.resolved(),
                SymbolKind::Enum(_) => self.enum_namespace_shape(*symbol),
                _ => None,
            },
            _ => None,
        }
    }

    fn class_of(&self, ty: TypeId) -> Option<SymbolId> {
        let symbol = match self.types.lookup(ty)?.as_ref() {
            TypeKey::Ref(symbol) => *symbol,
            TypeKey::Application { base, .. } => *base,
            _ => return None,
        };
        self.symbols
            .get(symbol)
            .is_some_and(|s| s.is_class())
            .then_some(symbol)
    }

    fn derives_from(&self, class: SymbolId, base: SymbolId) -> bool {
        let mut current = Some(class);
        for _ in 0..MAX_PARENT_CHAIN {
            match current {
                Some(symbol) if symbol == base => return true,
                Some(symbol) => current = self.base_class_of(symbol),
                None => return false,
            }
        }
        false
    }

    fn is_enum_type(&self, ty: TypeId) -> bool {
        match self.types.lookup(ty).as_deref() {
            Some(TypeKey::Ref(symbol)) => self
                .symbols
                .get(*symbol)
                .is_some_and(|s| matches!(s.kind, SymbolKind::Enum(_))),
            _ => false,
        }
    }

    fn constraint_of(&self, type_param: SymbolId) -> Option<TypeId> {
        match &self.symbols.get(type_param)?.kind {
            SymbolKind::TypeParameter(param) => param.constraint.resolved().flatten(),
            _ => None,
        }
    }

    fn symbol_name(&self, symbol: SymbolId) -> String {
        let Some(entry) = self.symbols.get(symbol) else {
            return format!("symbol#{}", symbol.0);
        };
        // Qualify members of modules so descriptors and messages are unambiguous.
        let mut name = entry.name.clone();
        let mut parent = entry
            .first_declaration()
            .and_then(|decl| self.registry.declaration(decl))
            .and_then(|decl| decl.parent);
        while let Some(parent_id) = parent {
            let Some(decl) = self.registry.declaration(parent_id) else {
                break;
            };
            if decl.kind != DeclKind::Module {
                break;
            }
            name = format!("{}.{name}", decl.display_name);
            parent = decl.parent;
        }
        name
    }
}
