//! Symbols: the resolved entities declarations denote.
//!
//! Symbols live in a `SymbolArena` owned by the checker and are addressed by
//! `SymbolId`. Each symbol's kind-specific data is a variant of the closed
//! `SymbolKind` union, so every dispatch over symbol kinds is an exhaustive
//! match. Lazily computed facts are `Resolution` cells: `Resolving` marks a
//! computation in progress, which is how circular references are detected.

use smallvec::SmallVec;
use std::rc::Rc;
use sts_binder::{DeclFlags, DeclId, Declaration};
use sts_solver::{ObjectShape, SignatureShape, TypeId};

pub use sts_binder::SymbolId;

/// State of a lazily computed fact.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Resolution<T> {
    #[default]
    Unresolved,
    Resolving,
    Resolved(T),
}

impl<T: Clone> Resolution<T> {
    pub fn resolved(&self) -> Option<T> {
        match self {
            Resolution::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, Resolution::Resolving)
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, Resolution::Unresolved)
    }
}

#[derive(Clone, Debug)]
pub struct ModuleSymbol {
    /// `typeof M`
    pub namespace_type: TypeId,
    pub exports: Resolution<Rc<ObjectShape>>,
}

#[derive(Clone, Debug)]
pub struct ClassSymbol {
    pub type_params: Vec<SymbolId>,
    /// `C`, or `C<T, ...>` over its own type parameters.
    pub instance_type: TypeId,
    /// `typeof C`
    pub constructor_type: TypeId,
    pub base_class: Option<SymbolId>,
    /// Instantiated base type, e.g. `Base<number>`.
    pub base_type: Option<TypeId>,
    pub implements: Vec<TypeId>,
    pub heritage: Resolution<()>,
    pub members: Resolution<Rc<ObjectShape>>,
    pub statics: Resolution<Rc<ObjectShape>>,
    /// Construct signatures, in declaration order.
    pub constructors: Vec<SymbolId>,
    /// Declarations created for this class with no source syntax (the
    /// implicit constructor). Owned here, never listed as tree children.
    pub synthesized: Vec<Declaration>,
}

#[derive(Clone, Debug)]
pub struct InterfaceSymbol {
    pub type_params: Vec<SymbolId>,
    pub instance_type: TypeId,
    pub extends: Vec<TypeId>,
    pub heritage: Resolution<()>,
    pub members: Resolution<Rc<ObjectShape>>,
}

#[derive(Clone, Debug)]
pub struct EnumSymbol {
    pub instance_type: TypeId,
    /// `typeof E`
    pub namespace_type: TypeId,
    pub members: Vec<SymbolId>,
}

#[derive(Clone, Debug)]
pub struct EnumMemberSymbol {
    pub ordinal: u32,
    pub parent_enum: SymbolId,
}

#[derive(Clone, Debug)]
pub struct FunctionSymbol {
    /// Body-less overload signatures, in declaration order.
    pub overloads: Vec<SymbolId>,
    pub implementation: Option<SymbolId>,
    pub type_id: Resolution<TypeId>,
}

impl FunctionSymbol {
    /// Signatures callers see: the overloads when there are any, otherwise
    /// the implementation.
    pub fn visible_signatures(&self) -> Vec<SymbolId> {
        if self.overloads.is_empty() {
            self.implementation.into_iter().collect()
        } else {
            self.overloads.clone()
        }
    }
}

#[derive(Clone, Debug)]
pub struct VariableSymbol {
    pub type_id: Resolution<TypeId>,
}

#[derive(Clone, Debug)]
pub struct TypeParameterSymbol {
    pub type_id: TypeId,
    pub constraint: Resolution<Option<TypeId>>,
}

#[derive(Clone, Debug)]
pub struct SignatureSymbol {
    /// `None` for synthesized constructors.
    pub decl: Option<DeclId>,
    pub shape: Resolution<SignatureShape>,
}

/// A generic class or interface applied to concrete type arguments.
#[derive(Clone, Debug)]
pub struct InstantiatedSymbol {
    pub generic: SymbolId,
    pub args: Vec<TypeId>,
    pub type_id: TypeId,
}

#[derive(Clone, Debug)]
pub enum SymbolKind {
    Module(ModuleSymbol),
    Class(ClassSymbol),
    Interface(InterfaceSymbol),
    Enum(EnumSymbol),
    EnumMember(EnumMemberSymbol),
    Function(FunctionSymbol),
    Variable(VariableSymbol),
    Parameter(VariableSymbol),
    TypeParameter(TypeParameterSymbol),
    Signature(SignatureSymbol),
    Instantiated(InstantiatedSymbol),
}

impl SymbolKind {
    pub fn name(&self) -> &'static str {
        match self {
            SymbolKind::Module(_) => "module",
            SymbolKind::Class(_) => "class",
            SymbolKind::Interface(_) => "interface",
            SymbolKind::Enum(_) => "enum",
            SymbolKind::EnumMember(_) => "enum member",
            SymbolKind::Function(_) => "function",
            SymbolKind::Variable(_) => "variable",
            SymbolKind::Parameter(_) => "parameter",
            SymbolKind::TypeParameter(_) => "type parameter",
            SymbolKind::Signature(_) => "signature",
            SymbolKind::Instantiated(_) => "instantiation",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Every declaration merged into this symbol, in binding order.
    pub declarations: SmallVec<[DeclId; 2]>,
    pub flags: DeclFlags,
}

impl Symbol {
    pub fn new(name: &str, kind: SymbolKind) -> Self {
        Symbol {
            name: name.to_string(),
            kind,
            declarations: SmallVec::new(),
            flags: DeclFlags::empty(),
        }
    }

    pub fn first_declaration(&self) -> Option<DeclId> {
        self.declarations.first().copied()
    }

    pub fn is_class(&self) -> bool {
        matches!(self.kind, SymbolKind::Class(_))
    }

    pub fn type_params(&self) -> &[SymbolId] {
        match &self.kind {
            SymbolKind::Class(class) => &class.type_params,
            SymbolKind::Interface(interface) => &interface.type_params,
            _ => &[],
        }
    }

    /// The type this symbol denotes in a type position.
    pub fn declared_type(&self) -> Option<TypeId> {
        match &self.kind {
            SymbolKind::Class(class) => Some(class.instance_type),
            SymbolKind::Interface(interface) => Some(interface.instance_type),
            SymbolKind::Enum(enumeration) => Some(enumeration.instance_type),
            SymbolKind::TypeParameter(param) => Some(param.type_id),
            SymbolKind::Instantiated(inst) => Some(inst.type_id),
            _ => None,
        }
    }
}

/// Storage for every symbol of one checking session.
#[derive(Debug, Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.index())
    }

    pub fn get_mut(&mut self, id: SymbolId) -> Option<&mut Symbol> {
        self.symbols.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(i, s)| (SymbolId(i as u32), s))
    }
}
