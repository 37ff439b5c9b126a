//! Declaration tree builder.
//!
//! One top-down walk over a file's syntax tree. Entering a declaring
//! construct creates a `Declaration`, links it under the current parent,
//! indexes it in the parent's name caches and declaration group, then
//! recurses. There is no backtracking: module instantiation is the only
//! fact discovered after the body, and it only adds the module to the value
//! cache.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use sts_common::Diagnostic;
use sts_common::diagnostics::diagnostic_codes;
use sts_parser::{ModifierFlags, NodeArena, NodeData, NodeIndex, NodeList, SyntaxKind};
use tracing::{debug, trace};

use crate::declaration::{
    DeclFlags, DeclId, DeclKind, Declaration, DeclarationTree, FileId, NamePartition,
    escape_identifier, internal_names,
};

/// Output of building one file.
#[derive(Debug)]
pub struct BuildResult {
    pub tree: DeclarationTree,
    /// Declaring AST node -> declaration.
    pub node_decls: FxHashMap<NodeIndex, DeclId>,
    /// Duplicate-identifier diagnostics, reported in the semantic phase.
    pub diagnostics: Vec<Diagnostic>,
}

pub struct DeclarationBuilder<'a> {
    arena: &'a NodeArena,
    file_name: &'a str,
    tree: DeclarationTree,
    node_decls: FxHashMap<NodeIndex, DeclId>,
    diagnostics: Vec<Diagnostic>,
}

fn modifier_flags(modifiers: ModifierFlags) -> DeclFlags {
    let mut flags = DeclFlags::empty();
    if modifiers.contains(ModifierFlags::EXPORT) {
        flags |= DeclFlags::EXPORTED;
    }
    if modifiers.contains(ModifierFlags::DECLARE) {
        flags |= DeclFlags::AMBIENT;
    }
    if modifiers.contains(ModifierFlags::PUBLIC) {
        flags |= DeclFlags::PUBLIC;
    }
    if modifiers.contains(ModifierFlags::PRIVATE) {
        flags |= DeclFlags::PRIVATE;
    }
    if modifiers.contains(ModifierFlags::STATIC) {
        flags |= DeclFlags::STATIC;
    }
    if modifiers.contains(ModifierFlags::OPTIONAL) {
        flags |= DeclFlags::OPTIONAL;
    }
    if modifiers.contains(ModifierFlags::REST) {
        flags |= DeclFlags::REST;
    }
    if modifiers.contains(ModifierFlags::CONST) {
        flags |= DeclFlags::CONST;
    }
    flags
}

/// Whether two same-named declarations in one partition may coexist.
fn can_merge(existing: &Declaration, new: &Declaration) -> bool {
    let member = DeclFlags::PROPERTY | DeclFlags::METHOD;
    if existing.flags.intersects(member)
        && new.flags.intersects(member)
        && existing.has(DeclFlags::STATIC) != new.has(DeclFlags::STATIC)
    {
        return true;
    }
    match (existing.kind, new.kind) {
        (DeclKind::Interface, DeclKind::Interface)
        | (DeclKind::Module, DeclKind::Module)
        | (DeclKind::Enum, DeclKind::Enum)
        | (DeclKind::Function, DeclKind::Function) => true,
        (DeclKind::Module, DeclKind::Class | DeclKind::Enum | DeclKind::Function)
        | (DeclKind::Class | DeclKind::Enum | DeclKind::Function, DeclKind::Module) => true,
        _ => false,
    }
}

impl<'a> DeclarationBuilder<'a> {
    pub fn new(file: FileId, file_name: &'a str, arena: &'a NodeArena) -> Self {
        DeclarationBuilder {
            arena,
            file_name,
            tree: DeclarationTree::new(file, Some(file_name.to_string())),
            node_decls: FxHashMap::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn build(mut self, root: NodeIndex) -> BuildResult {
        let _span = tracing::debug_span!("build_declarations", file = %self.file_name).entered();

        let root_decl = self.tree.root();
        if let Some(decl) = self.tree.get_mut(root_decl) {
            decl.node = root;
            decl.span = self.arena.span(root);
        }
        self.node_decls.insert(root, root_decl);

        if let NodeData::SourceFile { statements, .. } = self.arena.data(root) {
            self.visit_statements(statements, root_decl, false);
        }

        debug!(
            declarations = self.tree.len(),
            duplicates = self.diagnostics.len(),
            "declaration tree built"
        );
        BuildResult {
            tree: self.tree,
            node_decls: self.node_decls,
            diagnostics: self.diagnostics,
        }
    }

    // =========================================================================
    // Declaring
    // =========================================================================

    fn name_of(&self, name_node: NodeIndex) -> &'a str {
        self.arena.identifier_text(name_node).unwrap_or("")
    }

    /// Create a declaration for `node` and index it under `parent`.
    fn declare(
        &mut self,
        node: NodeIndex,
        name_node: NodeIndex,
        text: &str,
        kind: DeclKind,
        flags: DeclFlags,
        parent: DeclId,
        ordinal: u32,
    ) -> DeclId {
        let (name, display_text) = match kind {
            DeclKind::CallSignature => (internal_names::CALL.to_string(), "()".to_string()),
            DeclKind::ConstructSignature => (internal_names::NEW.to_string(), "new()".to_string()),
            DeclKind::IndexSignature => (internal_names::INDEX.to_string(), "[]".to_string()),
            DeclKind::FunctionExpression if text.is_empty() => (
                internal_names::ANONYMOUS.to_string(),
                internal_names::ANONYMOUS_DISPLAY.to_string(),
            ),
            _ => (escape_identifier(text), text.to_string()),
        };

        let mut decl = Declaration::new(&name, &display_text, kind, flags);
        decl.node = node;
        decl.span = self.arena.span(node);
        decl.ordinal = ordinal;
        let id = self.tree.attach(decl, parent);
        if node.is_some() && !self.node_decls.contains_key(&node) {
            self.node_decls.insert(node, id);
        }
        trace!(name = %display_text, kind = kind.name(), ?id, "declare");

        if text.is_empty() && !matches!(
            kind,
            DeclKind::CallSignature | DeclKind::ConstructSignature | DeclKind::IndexSignature
        ) {
            // Missing name: the parser already reported it.
            return id;
        }

        let partitions: SmallVec<[NamePartition; 3]> = match self.tree.get(id) {
            Some(decl) if kind != DeclKind::FunctionExpression => decl.partitions(),
            _ => SmallVec::new(),
        };
        self.check_and_index(id, parent, name_node, &partitions);
        self.tree.index_group(id);

        if kind == DeclKind::FunctionExpression && !text.is_empty() {
            // A named function expression sees its own name.
            if let Some(decl) = self.tree.get_mut(id) {
                decl.caches.insert(NamePartition::Value, &name, id);
            }
        }
        id
    }

    /// Report 2300 against earlier non-mergeable declarations, then index.
    fn check_and_index(
        &mut self,
        id: DeclId,
        parent: DeclId,
        name_node: NodeIndex,
        partitions: &[NamePartition],
    ) {
        let Some(new_decl) = self.tree.get(id) else {
            return;
        };
        let conflict = partitions.iter().any(|&partition| {
            self.tree
                .lookup(parent, partition, &new_decl.name)
                .iter()
                .filter_map(|&other| self.tree.get(other))
                .any(|existing| !can_merge(existing, new_decl))
        });
        if conflict {
            let span = if name_node.is_some() {
                self.arena.span(name_node)
            } else {
                new_decl.span
            };
            self.diagnostics.push(Diagnostic::error(
                self.file_name,
                span,
                diagnostic_codes::DUPLICATE_IDENTIFIER,
                vec![new_decl.display_name.clone()],
            ));
        }
        self.tree.index_name(id, partitions);
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn visit_statements(&mut self, statements: &NodeList, parent: DeclId, ambient: bool) {
        for stmt in statements.iter() {
            self.visit_statement(stmt, parent, ambient);
        }
    }

    fn inherited(&self, modifiers: ModifierFlags, ambient: bool) -> DeclFlags {
        let mut flags = modifier_flags(modifiers);
        if ambient {
            flags |= DeclFlags::AMBIENT;
        }
        flags
    }

    fn visit_statement(&mut self, idx: NodeIndex, parent: DeclId, ambient: bool) {
        let Some(node) = self.arena.get(idx) else {
            return;
        };
        let flags = self.inherited(node.flags, ambient);
        let ambient = flags.contains(DeclFlags::AMBIENT);

        match &node.data {
            NodeData::Module { name, body } => self.visit_module(idx, *name, body, flags, parent),
            NodeData::Class { .. } => self.visit_class(idx, flags, parent),
            NodeData::Interface { .. } => self.visit_interface(idx, flags, parent),
            NodeData::Enum { name, members } => {
                let text = self.name_of(*name);
                let enum_id = self.declare(idx, *name, text, DeclKind::Enum, flags, parent, 0);
                for (ordinal, member) in members.iter().enumerate() {
                    let NodeData::EnumMember { name, initializer } = self.arena.data(member) else {
                        continue;
                    };
                    let text = self.name_of(*name);
                    let member_flags = flags & DeclFlags::AMBIENT;
                    self.declare(
                        member,
                        *name,
                        text,
                        DeclKind::EnumMember,
                        member_flags,
                        enum_id,
                        ordinal as u32,
                    );
                    self.visit_expression(*initializer, enum_id, ambient);
                }
            }
            NodeData::Function { name, .. } if node.kind == SyntaxKind::FunctionDeclaration => {
                let text = self.name_of(*name);
                self.visit_function_like(idx, *name, text, DeclKind::Function, flags, parent);
            }
            NodeData::VariableStatement { declarations } => {
                for decl in declarations.iter() {
                    let NodeData::Variable {
                        name, initializer, ..
                    } = self.arena.data(decl)
                    else {
                        continue;
                    };
                    let text = self.name_of(*name);
                    self.declare(decl, *name, text, DeclKind::Variable, flags, parent, 0);
                    self.visit_expression(*initializer, parent, ambient);
                }
            }
            NodeData::Block { statements } => self.visit_statements(statements, parent, ambient),
            NodeData::If {
                condition,
                then_statement,
                else_statement,
            } => {
                self.visit_expression(*condition, parent, ambient);
                self.visit_statement(*then_statement, parent, ambient);
                self.visit_statement(*else_statement, parent, ambient);
            }
            NodeData::While { condition, body } => {
                self.visit_expression(*condition, parent, ambient);
                self.visit_statement(*body, parent, ambient);
            }
            NodeData::Return { expression } | NodeData::ExpressionStatement { expression } => {
                self.visit_expression(*expression, parent, ambient);
            }
            _ => {}
        }
    }

    fn visit_module(
        &mut self,
        idx: NodeIndex,
        name: NodeIndex,
        body: &NodeList,
        flags: DeclFlags,
        parent: DeclId,
    ) {
        let text = self.name_of(name);
        let module_id = self.declare(idx, name, text, DeclKind::Module, flags, parent, 0);
        self.visit_statements(body, module_id, flags.contains(DeclFlags::AMBIENT));

        let instantiated = self.tree.get(module_id).is_some_and(|module| {
            module.children.iter().any(|&child| {
                self.tree.get(child).is_some_and(|c| match c.kind {
                    DeclKind::Variable | DeclKind::Function | DeclKind::Class | DeclKind::Enum => {
                        true
                    }
                    DeclKind::Module => c.has(DeclFlags::INSTANTIATED),
                    _ => false,
                })
            })
        });
        if instantiated {
            if let Some(module) = self.tree.get_mut(module_id) {
                module.flags |= DeclFlags::INSTANTIATED;
            }
            if !text.is_empty() {
                self.check_and_index(module_id, parent, name, &[NamePartition::Value]);
            }
        }
    }

    fn visit_type_parameters(&mut self, type_params: &NodeList, owner: DeclId, ambient: bool) {
        for (ordinal, param) in type_params.iter().enumerate() {
            let NodeData::TypeParameter { name, .. } = self.arena.data(param) else {
                continue;
            };
            let text = self.name_of(*name);
            let flags = if ambient {
                DeclFlags::AMBIENT
            } else {
                DeclFlags::empty()
            };
            self.declare(
                param,
                *name,
                text,
                DeclKind::TypeParameter,
                flags,
                owner,
                ordinal as u32,
            );
        }
    }

    /// Functions, methods, constructors and call/construct signatures.
    fn visit_function_like(
        &mut self,
        idx: NodeIndex,
        name_node: NodeIndex,
        text: &str,
        kind: DeclKind,
        mut flags: DeclFlags,
        parent: DeclId,
    ) -> DeclId {
        let NodeData::Function {
            type_params,
            params,
            body,
            ..
        } = self.arena.data(idx)
        else {
            return parent;
        };
        if body.is_none() && matches!(kind, DeclKind::Function) {
            flags |= DeclFlags::SIGNATURE;
        }
        let ambient = flags.contains(DeclFlags::AMBIENT);
        let fn_id = self.declare(idx, name_node, text, kind, flags, parent, 0);

        self.visit_type_parameters(type_params, fn_id, ambient);
        for (ordinal, param) in params.iter().enumerate() {
            let Some(param_node) = self.arena.get(param) else {
                continue;
            };
            let NodeData::Parameter {
                name, initializer, ..
            } = &param_node.data
            else {
                continue;
            };
            let param_flags = self.inherited(param_node.flags, ambient);
            let text = self.name_of(*name);
            self.declare(
                param,
                *name,
                text,
                DeclKind::Parameter,
                param_flags,
                fn_id,
                ordinal as u32,
            );
            self.visit_expression(*initializer, fn_id, ambient);
        }

        if let NodeData::Block { statements } = self.arena.data(*body) {
            self.visit_statements(statements, fn_id, ambient);
        }
        fn_id
    }

    fn visit_class(&mut self, idx: NodeIndex, flags: DeclFlags, parent: DeclId) {
        let NodeData::Class {
            name,
            type_params,
            members,
            ..
        } = self.arena.data(idx)
        else {
            return;
        };
        let ambient = flags.contains(DeclFlags::AMBIENT);
        let text = self.name_of(*name);
        let class_id = self.declare(idx, *name, text, DeclKind::Class, flags, parent, 0);
        self.visit_type_parameters(type_params, class_id, ambient);

        for member in members.iter() {
            let Some(node) = self.arena.get(member) else {
                continue;
            };
            let member_flags = self.inherited(node.flags, ambient);
            match (&node.data, node.kind) {
                (
                    NodeData::Variable {
                        name, initializer, ..
                    },
                    SyntaxKind::PropertyDeclaration,
                ) => {
                    let text = self.name_of(*name);
                    self.declare(
                        member,
                        *name,
                        text,
                        DeclKind::Variable,
                        member_flags | DeclFlags::PROPERTY,
                        class_id,
                        0,
                    );
                    self.visit_expression(*initializer, class_id, ambient);
                }
                (NodeData::Function { name, .. }, SyntaxKind::MethodDeclaration) => {
                    let text = self.name_of(*name);
                    let flags = member_flags | DeclFlags::METHOD;
                    self.visit_function_like(
                        member,
                        *name,
                        text,
                        DeclKind::Function,
                        flags,
                        class_id,
                    );
                }
                (NodeData::Function { params, .. }, SyntaxKind::Constructor) => {
                    self.visit_function_like(
                        member,
                        NodeIndex::NONE,
                        "",
                        DeclKind::ConstructSignature,
                        member_flags | DeclFlags::CONSTRUCTOR,
                        class_id,
                    );
                    self.declare_parameter_properties(params, class_id, ambient);
                }
                (NodeData::IndexSignature { .. }, _) => {
                    self.declare(
                        member,
                        NodeIndex::NONE,
                        "",
                        DeclKind::IndexSignature,
                        member_flags,
                        class_id,
                        0,
                    );
                }
                _ => {}
            }
        }
    }

    /// `constructor(public x: number)` also declares property `x`.
    fn declare_parameter_properties(&mut self, params: &NodeList, class_id: DeclId, ambient: bool) {
        for param in params.iter() {
            let Some(node) = self.arena.get(param) else {
                continue;
            };
            if !node
                .flags
                .intersects(ModifierFlags::PUBLIC | ModifierFlags::PRIVATE)
            {
                continue;
            }
            let NodeData::Parameter { name, .. } = &node.data else {
                continue;
            };
            let mut flags = self.inherited(node.flags, ambient) | DeclFlags::PROPERTY;
            flags.remove(DeclFlags::REST);
            let text = self.name_of(*name);
            self.declare(param, *name, text, DeclKind::Variable, flags, class_id, 0);
        }
    }

    fn visit_interface(&mut self, idx: NodeIndex, flags: DeclFlags, parent: DeclId) {
        let NodeData::Interface {
            name,
            type_params,
            members,
            ..
        } = self.arena.data(idx)
        else {
            return;
        };
        let ambient = flags.contains(DeclFlags::AMBIENT);
        let text = self.name_of(*name);
        let interface_id = self.declare(idx, *name, text, DeclKind::Interface, flags, parent, 0);
        self.visit_type_parameters(type_params, interface_id, ambient);

        for member in members.iter() {
            let Some(node) = self.arena.get(member) else {
                continue;
            };
            let member_flags = self.inherited(node.flags, ambient);
            match node.kind {
                SyntaxKind::PropertySignature => {
                    let name = self.arena.declaration_name(member);
                    let text = self.name_of(name);
                    self.declare(
                        member,
                        name,
                        text,
                        DeclKind::Variable,
                        member_flags | DeclFlags::PROPERTY,
                        interface_id,
                        0,
                    );
                }
                SyntaxKind::MethodSignature => {
                    let name = self.arena.declaration_name(member);
                    let text = self.name_of(name);
                    self.visit_function_like(
                        member,
                        name,
                        text,
                        DeclKind::Function,
                        member_flags | DeclFlags::METHOD,
                        interface_id,
                    );
                }
                SyntaxKind::CallSignature => {
                    self.visit_function_like(
                        member,
                        NodeIndex::NONE,
                        "",
                        DeclKind::CallSignature,
                        member_flags,
                        interface_id,
                    );
                }
                SyntaxKind::ConstructSignature => {
                    self.visit_function_like(
                        member,
                        NodeIndex::NONE,
                        "",
                        DeclKind::ConstructSignature,
                        member_flags,
                        interface_id,
                    );
                }
                SyntaxKind::IndexSignature => {
                    self.declare(
                        member,
                        NodeIndex::NONE,
                        "",
                        DeclKind::IndexSignature,
                        member_flags,
                        interface_id,
                        0,
                    );
                }
                _ => {}
            }
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Find function expressions nested in an expression.
    fn visit_expression(&mut self, idx: NodeIndex, parent: DeclId, ambient: bool) {
        let Some(node) = self.arena.get(idx) else {
            return;
        };
        if node.kind == SyntaxKind::FunctionExpression {
            let name = self.arena.declaration_name(idx);
            let text = self.name_of(name);
            let flags = if ambient {
                DeclFlags::AMBIENT
            } else {
                DeclFlags::empty()
            };
            self.visit_function_like(idx, name, text, DeclKind::FunctionExpression, flags, parent);
            return;
        }
        if node.kind.is_type_node() {
            return;
        }
        for child in self.arena.children(idx) {
            self.visit_expression(child, parent, ambient);
        }
    }
}
