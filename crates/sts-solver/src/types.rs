//! Type data.

use serde::Serialize;
use sts_binder::SymbolId;

/// Handle to an interned type. Equal ids mean equal structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// Result of a failed resolution. Related to everything in both
    /// directions so one error never cascades.
    pub const ERROR: TypeId = TypeId(0);
    pub const ANY: TypeId = TypeId(1);
    pub const NUMBER: TypeId = TypeId(2);
    pub const STRING: TypeId = TypeId(3);
    pub const BOOLEAN: TypeId = TypeId(4);
    pub const VOID: TypeId = TypeId(5);
    pub const NULL: TypeId = TypeId(6);
    pub const UNDEFINED: TypeId = TypeId(7);

    /// First id handed out for non-intrinsic types.
    pub const FIRST_USER: u32 = 8;

    #[inline]
    pub fn is_intrinsic(self) -> bool {
        self.0 < Self::FIRST_USER
    }

    /// `number`, `string` or `boolean`.
    #[inline]
    pub fn is_primitive(self) -> bool {
        matches!(self, TypeId::NUMBER | TypeId::STRING | TypeId::BOOLEAN)
    }

    #[inline]
    pub fn is_any_or_error(self) -> bool {
        matches!(self, TypeId::ANY | TypeId::ERROR)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IntrinsicKind {
    Error,
    Any,
    Number,
    String,
    Boolean,
    Void,
    Null,
    Undefined,
}

impl IntrinsicKind {
    pub const ALL: [IntrinsicKind; 8] = [
        IntrinsicKind::Error,
        IntrinsicKind::Any,
        IntrinsicKind::Number,
        IntrinsicKind::String,
        IntrinsicKind::Boolean,
        IntrinsicKind::Void,
        IntrinsicKind::Null,
        IntrinsicKind::Undefined,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IntrinsicKind::Error => "error",
            IntrinsicKind::Any => "any",
            IntrinsicKind::Number => "number",
            IntrinsicKind::String => "string",
            IntrinsicKind::Boolean => "boolean",
            IntrinsicKind::Void => "void",
            IntrinsicKind::Null => "null",
            IntrinsicKind::Undefined => "undefined",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<IntrinsicKind> {
        Some(match keyword {
            "any" => IntrinsicKind::Any,
            "number" => IntrinsicKind::Number,
            "string" => IntrinsicKind::String,
            "boolean" => IntrinsicKind::Boolean,
            "void" => IntrinsicKind::Void,
            "null" => IntrinsicKind::Null,
            "undefined" => IntrinsicKind::Undefined,
            _ => return None,
        })
    }

    pub fn type_id(self) -> TypeId {
        TypeId(self as u32)
    }
}

/// Tuple descriptor: elements for indices `[0, n)` and the rest-start
/// index `k`. Indices at or after `k` repeat the tail `elements[k..]`;
/// `k == n` is a fixed-width tuple.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TupleShape {
    pub elements: Vec<TypeId>,
    pub rest_start: u32,
}

impl TupleShape {
    /// Panics if `rest_start > elements.len()`.
    pub fn new(elements: Vec<TypeId>, rest_start: u32) -> Self {
        assert!(
            rest_start as usize <= elements.len(),
            "tuple rest start {rest_start} exceeds width {}",
            elements.len()
        );
        TupleShape {
            elements,
            rest_start,
        }
    }

    pub fn fixed(elements: Vec<TypeId>) -> Self {
        let rest_start = elements.len() as u32;
        TupleShape {
            elements,
            rest_start,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn rest_start(&self) -> usize {
        self.rest_start as usize
    }

    pub fn is_fixed(&self) -> bool {
        self.rest_start() == self.width()
    }

    /// Length of the repeating tail.
    pub fn period(&self) -> usize {
        self.width() - self.rest_start()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ParamInfo {
    pub name: String,
    pub type_id: TypeId,
    pub optional: bool,
    /// `...name: T[]`; `type_id` is the array type.
    pub rest: bool,
}

impl ParamInfo {
    pub fn required(name: &str, type_id: TypeId) -> Self {
        ParamInfo {
            name: name.to_string(),
            type_id,
            optional: false,
            rest: false,
        }
    }

    pub fn optional(name: &str, type_id: TypeId) -> Self {
        ParamInfo {
            optional: true,
            ..ParamInfo::required(name, type_id)
        }
    }

    pub fn rest(name: &str, type_id: TypeId) -> Self {
        ParamInfo {
            rest: true,
            ..ParamInfo::required(name, type_id)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SignatureShape {
    pub type_params: Vec<SymbolId>,
    pub params: Vec<ParamInfo>,
    pub return_type: TypeId,
}

impl SignatureShape {
    pub fn new(params: Vec<ParamInfo>, return_type: TypeId) -> Self {
        SignatureShape {
            type_params: Vec::new(),
            params,
            return_type,
        }
    }

    /// Number of arguments a call must supply.
    pub fn min_args(&self) -> usize {
        self.params
            .iter()
            .take_while(|p| !p.optional && !p.rest)
            .count()
    }

    pub fn optional_count(&self) -> usize {
        self.params.iter().filter(|p| p.optional).count()
    }

    pub fn has_rest(&self) -> bool {
        self.params.last().is_some_and(|p| p.rest)
    }

    /// Whether `count` arguments fit this signature's arity.
    pub fn accepts_arity(&self, count: usize) -> bool {
        count >= self.min_args() && (self.has_rest() || count <= self.params.len())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct PropertyInfo {
    pub name: String,
    pub type_id: TypeId,
    pub optional: bool,
    pub is_method: bool,
}

impl PropertyInfo {
    pub fn new(name: &str, type_id: TypeId) -> Self {
        PropertyInfo {
            name: name.to_string(),
            type_id,
            optional: false,
            is_method: false,
        }
    }

    pub fn optional(name: &str, type_id: TypeId) -> Self {
        PropertyInfo {
            optional: true,
            ..PropertyInfo::new(name, type_id)
        }
    }

    pub fn method(name: &str, type_id: TypeId) -> Self {
        PropertyInfo {
            is_method: true,
            ..PropertyInfo::new(name, type_id)
        }
    }
}

/// Structural object type. Properties are kept sorted by name so equal
/// shapes intern to one id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectShape {
    pub properties: Vec<PropertyInfo>,
    pub call_signatures: Vec<SignatureShape>,
    pub construct_signatures: Vec<SignatureShape>,
    pub string_index: Option<TypeId>,
    pub number_index: Option<TypeId>,
}

impl ObjectShape {
    pub fn new(mut properties: Vec<PropertyInfo>) -> Self {
        properties.sort_by(|a, b| a.name.cmp(&b.name));
        ObjectShape {
            properties,
            ..ObjectShape::default()
        }
    }

    pub fn normalize(&mut self) {
        self.properties.sort_by(|a, b| a.name.cmp(&b.name));
        self.properties.dedup_by(|b, a| a.name == b.name);
    }

    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties
            .binary_search_by(|p| p.name.as_str().cmp(name))
            .ok()
            .map(|index| &self.properties[index])
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.call_signatures.is_empty()
            && self.construct_signatures.is_empty()
            && self.string_index.is_none()
            && self.number_index.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeKey {
    Intrinsic(IntrinsicKind),
    Array(TypeId),
    Tuple(TupleShape),
    /// Anonymous object type, including function types (one call signature).
    Object(ObjectShape),
    /// Non-generic class instance, interface or enum type.
    Ref(SymbolId),
    /// Generic class or interface applied to type arguments.
    Application { base: SymbolId, args: Vec<TypeId> },
    TypeParameter(SymbolId),
    /// Static side of a class: `typeof C`.
    ClassConstructor(SymbolId),
    /// Value side of a module or enum.
    Namespace(SymbolId),
}
