//! Declarations and per-file declaration trees.
//!
//! A `DeclarationTree` is an arena of `Declaration`s for one file. Index 0 is
//! the root (`DeclKind::Script`). Parents own their children through the
//! `children` list and index them by name in four partitions, so a type and a
//! value may share a name in one scope.

use bitflags::bitflags;
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;
use sts_common::Span;
use sts_parser::NodeIndex;

/// Identifier of one registry file entry. Never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u32);

impl FileId {
    /// The synthetic file holding the global declaration.
    pub const GLOBAL: FileId = FileId(0);
}

/// A declaration address: owning file entry plus arena index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId {
    pub file: FileId,
    pub index: u32,
}

impl DeclId {
    pub const fn new(file: FileId, index: u32) -> Self {
        DeclId { file, index }
    }

    /// Root declaration of `file`.
    pub const fn root(file: FileId) -> Self {
        DeclId { file, index: 0 }
    }

    pub fn is_root(self) -> bool {
        self.index == 0
    }
}

/// Closed set of declaration kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DeclKind {
    Module,
    Class,
    Interface,
    Enum,
    EnumMember,
    Function,
    FunctionExpression,
    Variable,
    Parameter,
    TypeParameter,
    CallSignature,
    ConstructSignature,
    IndexSignature,
    Script,
}

impl DeclKind {
    pub fn name(self) -> &'static str {
        match self {
            DeclKind::Module => "module",
            DeclKind::Class => "class",
            DeclKind::Interface => "interface",
            DeclKind::Enum => "enum",
            DeclKind::EnumMember => "enum member",
            DeclKind::Function => "function",
            DeclKind::FunctionExpression => "function expression",
            DeclKind::Variable => "variable",
            DeclKind::Parameter => "parameter",
            DeclKind::TypeParameter => "type parameter",
            DeclKind::CallSignature => "call signature",
            DeclKind::ConstructSignature => "construct signature",
            DeclKind::IndexSignature => "index signature",
            DeclKind::Script => "script",
        }
    }

    /// Kinds that introduce a scope with their own name caches.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            DeclKind::Script
                | DeclKind::Module
                | DeclKind::Class
                | DeclKind::Interface
                | DeclKind::Enum
                | DeclKind::Function
                | DeclKind::FunctionExpression
                | DeclKind::CallSignature
                | DeclKind::ConstructSignature
        )
    }

    pub fn is_signature_like(self) -> bool {
        matches!(
            self,
            DeclKind::Function
                | DeclKind::FunctionExpression
                | DeclKind::CallSignature
                | DeclKind::ConstructSignature
        )
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
    pub struct DeclFlags: u32 {
        const EXPORTED = 1 << 0;
        /// `declare`, or nested in an ambient declaration
        const AMBIENT = 1 << 1;
        const PUBLIC = 1 << 2;
        const PRIVATE = 1 << 3;
        const STATIC = 1 << 4;
        const OPTIONAL = 1 << 5;
        const REST = 1 << 6;
        /// Class or interface property
        const PROPERTY = 1 << 7;
        /// Class or interface method
        const METHOD = 1 << 8;
        /// Class constructor (on a `ConstructSignature`)
        const CONSTRUCTOR = 1 << 9;
        /// Body-less overload signature
        const SIGNATURE = 1 << 10;
        const CONST = 1 << 11;
        /// Module containing value declarations
        const INSTANTIATED = 1 << 12;
        /// Created by the checker, not by source syntax
        const SYNTHESIZED = 1 << 13;
    }
}

/// Which name cache a declaration is indexed in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum NamePartition {
    Type,
    Container,
    TypeParameter,
    Value,
}

impl NamePartition {
    pub const ALL: [NamePartition; 4] = [
        NamePartition::Type,
        NamePartition::Container,
        NamePartition::TypeParameter,
        NamePartition::Value,
    ];
}

pub type DeclList = SmallVec<[DeclId; 1]>;

/// Name-partitioned child indexes plus declaration groups.
#[derive(Clone, Debug, Default)]
pub struct NameCaches {
    types: FxHashMap<String, DeclList>,
    containers: FxHashMap<String, DeclList>,
    type_parameters: FxHashMap<String, DeclList>,
    values: FxHashMap<String, DeclList>,
    /// Declarations sharing name and kind, in source order.
    groups: FxHashMap<(String, DeclKind), DeclList>,
}

impl NameCaches {
    fn partition(&self, partition: NamePartition) -> &FxHashMap<String, DeclList> {
        match partition {
            NamePartition::Type => &self.types,
            NamePartition::Container => &self.containers,
            NamePartition::TypeParameter => &self.type_parameters,
            NamePartition::Value => &self.values,
        }
    }

    fn partition_mut(&mut self, partition: NamePartition) -> &mut FxHashMap<String, DeclList> {
        match partition {
            NamePartition::Type => &mut self.types,
            NamePartition::Container => &mut self.containers,
            NamePartition::TypeParameter => &mut self.type_parameters,
            NamePartition::Value => &mut self.values,
        }
    }

    pub fn lookup(&self, partition: NamePartition, name: &str) -> &[DeclId] {
        self.partition(partition)
            .get(name)
            .map_or(&[], |list| list.as_slice())
    }

    pub fn insert(&mut self, partition: NamePartition, name: &str, decl: DeclId) {
        self.partition_mut(partition)
            .entry(name.to_string())
            .or_default()
            .push(decl);
    }

    pub fn add_to_group(&mut self, name: &str, kind: DeclKind, decl: DeclId) {
        self.groups
            .entry((name.to_string(), kind))
            .or_default()
            .push(decl);
    }

    pub fn group(&self, name: &str, kind: DeclKind) -> &[DeclId] {
        self.groups
            .get(&(name.to_string(), kind))
            .map_or(&[], |list| list.as_slice())
    }

    /// Names in `partition`, unordered.
    pub fn names(&self, partition: NamePartition) -> impl Iterator<Item = &str> {
        self.partition(partition).keys().map(String::as_str)
    }
}

#[derive(Clone, Debug)]
pub struct Declaration {
    /// Lookup key. Identifiers starting with `__` are escaped with an extra
    /// leading underscore so they cannot collide with internal names.
    pub name: String,
    pub display_name: String,
    pub kind: DeclKind,
    pub flags: DeclFlags,
    pub span: Span,
    /// Declaring syntax node, `NONE` for the global root and synthesized declarations.
    pub node: NodeIndex,
    pub parent: Option<DeclId>,
    pub children: Vec<DeclId>,
    /// Enum member ordinal, parameter position, or type parameter position.
    pub ordinal: u32,
    pub caches: NameCaches,
}

impl Declaration {
    pub fn new(name: &str, display_name: &str, kind: DeclKind, flags: DeclFlags) -> Self {
        Declaration {
            name: name.to_string(),
            display_name: display_name.to_string(),
            kind,
            flags,
            span: Span::default(),
            node: NodeIndex::NONE,
            parent: None,
            children: Vec::new(),
            ordinal: 0,
            caches: NameCaches::default(),
        }
    }

    /// A declaration with no source syntax. `lexical_parent` is recorded as
    /// the parent link but the parent does not list it as a child.
    pub fn synthesized(name: &str, kind: DeclKind, flags: DeclFlags, lexical_parent: DeclId) -> Self {
        let mut decl = Declaration::new(name, name, kind, flags | DeclFlags::SYNTHESIZED);
        decl.parent = Some(lexical_parent);
        decl
    }

    pub fn has(&self, flags: DeclFlags) -> bool {
        self.flags.contains(flags)
    }

    pub fn is_synthesized(&self) -> bool {
        self.flags.contains(DeclFlags::SYNTHESIZED)
    }

    /// Partitions this declaration is indexed in by its parent.
    pub fn partitions(&self) -> SmallVec<[NamePartition; 3]> {
        let mut out = SmallVec::new();
        match self.kind {
            DeclKind::Class | DeclKind::Interface => out.push(NamePartition::Type),
            DeclKind::Module => {
                out.push(NamePartition::Container);
                if self.flags.contains(DeclFlags::INSTANTIATED) {
                    out.push(NamePartition::Value);
                }
            }
            DeclKind::Enum => {
                out.push(NamePartition::Type);
                out.push(NamePartition::Container);
                out.push(NamePartition::Value);
            }
            DeclKind::TypeParameter => out.push(NamePartition::TypeParameter),
            DeclKind::Function
            | DeclKind::FunctionExpression
            | DeclKind::Variable
            | DeclKind::Parameter
            | DeclKind::EnumMember => out.push(NamePartition::Value),
            DeclKind::CallSignature
            | DeclKind::ConstructSignature
            | DeclKind::IndexSignature
            | DeclKind::Script => {}
        }
        out
    }
}

/// Lookup key for an identifier.
pub fn escape_identifier(text: &str) -> String {
    if text.starts_with("__") {
        format!("_{text}")
    } else {
        text.to_string()
    }
}

/// Inverse of `escape_identifier`.
pub fn unescape_identifier(name: &str) -> &str {
    if name.starts_with("___") {
        &name[1..]
    } else {
        name
    }
}

/// Internal names for unnamed members.
pub mod internal_names {
    pub const CALL: &str = "__call";
    pub const NEW: &str = "__new";
    pub const INDEX: &str = "__index";
    pub const CONSTRUCTOR: &str = "__constructor";
    pub const ANONYMOUS: &str = "__function";
    pub const ANONYMOUS_DISPLAY: &str = "<anonymous>";
}

/// All declarations of one file. Index 0 is the root.
#[derive(Clone, Debug)]
pub struct DeclarationTree {
    pub file: FileId,
    /// `None` only for the global declaration.
    pub file_name: Option<String>,
    decls: Vec<Declaration>,
}

impl DeclarationTree {
    /// A tree holding only a `Script` root.
    pub fn new(file: FileId, file_name: Option<String>) -> Self {
        let display = file_name.clone().unwrap_or_else(|| "<global>".to_string());
        let root = Declaration::new("", &display, DeclKind::Script, DeclFlags::empty());
        DeclarationTree {
            file,
            file_name,
            decls: vec![root],
        }
    }

    pub fn root(&self) -> DeclId {
        DeclId::root(self.file)
    }

    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// `None` when `id` belongs to a different (or stale) file entry.
    pub fn get(&self, id: DeclId) -> Option<&Declaration> {
        if id.file != self.file {
            return None;
        }
        self.decls.get(id.index as usize)
    }

    pub(crate) fn get_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        if id.file != self.file {
            return None;
        }
        self.decls.get_mut(id.index as usize)
    }

    pub fn ids(&self) -> impl Iterator<Item = DeclId> + '_ {
        (0..self.decls.len() as u32).map(|index| DeclId::new(self.file, index))
    }

    /// Append `decl` under `parent`, linking it into the parent's child list.
    /// Name caches are updated separately by `index_name`.
    pub(crate) fn attach(&mut self, mut decl: Declaration, parent: DeclId) -> DeclId {
        let id = DeclId::new(self.file, self.decls.len() as u32);
        decl.parent = Some(parent);
        self.decls.push(decl);
        if let Some(parent_decl) = self.get_mut(parent) {
            parent_decl.children.push(id);
        }
        id
    }

    /// Insert `id` into its parent's caches for `partitions`.
    pub(crate) fn index_name(&mut self, id: DeclId, partitions: &[NamePartition]) {
        let Some((parent, name, _)) = self.parent_key(id) else {
            return;
        };
        if let Some(parent_decl) = self.get_mut(parent) {
            for &partition in partitions {
                parent_decl.caches.insert(partition, &name, id);
            }
        }
    }

    /// Add `id` to its parent's (name, kind) declaration group.
    pub(crate) fn index_group(&mut self, id: DeclId) {
        let Some((parent, name, kind)) = self.parent_key(id) else {
            return;
        };
        if let Some(parent_decl) = self.get_mut(parent) {
            parent_decl.caches.add_to_group(&name, kind, id);
        }
    }

    fn parent_key(&self, id: DeclId) -> Option<(DeclId, String, DeclKind)> {
        let decl = self.get(id)?;
        Some((decl.parent?, decl.name.clone(), decl.kind))
    }

    /// Children of `parent` named `name` in `partition`.
    pub fn lookup(&self, parent: DeclId, partition: NamePartition, name: &str) -> &[DeclId] {
        self.get(parent)
            .map_or(&[], |decl| decl.caches.lookup(partition, name))
    }

    pub fn group(&self, parent: DeclId, name: &str, kind: DeclKind) -> &[DeclId] {
        self.get(parent)
            .map_or(&[], |decl| decl.caches.group(name, kind))
    }

    /// Children of `parent` with the given kind, in source order.
    pub fn children_of_kind(&self, parent: DeclId, kind: DeclKind) -> Vec<DeclId> {
        self.get(parent)
            .map(|decl| {
                decl.children
                    .iter()
                    .copied()
                    .filter(|&child| self.get(child).is_some_and(|c| c.kind == kind))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Walk parent links to the root.
    ///
    /// Panics if the chain does not reach a root within the chain limit,
    /// which would mean the tree is malformed.
    pub fn root_of(&self, id: DeclId) -> DeclId {
        let mut current = id;
        for _ in 0..sts_common::limits::MAX_PARENT_CHAIN {
            match self.get(current).and_then(|d| d.parent) {
                Some(parent) => current = parent,
                None => return current,
            }
        }
        panic!("declaration parent chain does not terminate: {id:?}");
    }

    /// File name, derived by walking to the root.
    pub fn file_name_of(&self, id: DeclId) -> Option<&str> {
        let root = self.root_of(id);
        debug_assert!(root.is_root());
        self.file_name.as_deref()
    }
}
