//! Arena-based AST storage.
//!
//! Nodes are stored contiguously in a `NodeArena` and referenced by
//! `NodeIndex`. Each node carries its kind, byte span, modifier flags and a
//! kind-specific `NodeData` payload whose child links are indices into the
//! same arena.

use bitflags::bitflags;
use serde::Serialize;
use sts_common::Span;

use crate::syntax_kind::SyntaxKind;

/// Index of a node in its file's `NodeArena`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: NodeIndex = NodeIndex(u32::MAX);

    #[inline]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline]
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// Ordered list of child nodes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NodeList {
    pub nodes: Vec<NodeIndex>,
}

impl NodeList {
    pub fn new(nodes: Vec<NodeIndex>) -> Self {
        NodeList { nodes }
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

bitflags! {
    /// Modifiers and markers attached to declaration nodes.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
    pub struct ModifierFlags: u16 {
        const EXPORT = 1 << 0;
        const DECLARE = 1 << 1;
        const PUBLIC = 1 << 2;
        const PRIVATE = 1 << 3;
        const STATIC = 1 << 4;
        /// `name?` on parameters and members
        const OPTIONAL = 1 << 5;
        /// `...name` on parameters
        const REST = 1 << 6;
        const CONST = 1 << 7;
        const LET = 1 << 8;
        /// Name was written as a string literal (`"foo": number`)
        const QUOTED_NAME = 1 << 9;
    }
}

/// Kind-specific node payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum NodeData {
    None,
    Identifier {
        text: String,
    },
    /// Numeric or string literal; `text` is the cooked value.
    Literal {
        text: String,
    },
    SourceFile {
        file_name: String,
        statements: NodeList,
    },
    Module {
        name: NodeIndex,
        body: NodeList,
    },
    Class {
        name: NodeIndex,
        type_params: NodeList,
        extends: NodeIndex,
        implements: NodeList,
        members: NodeList,
    },
    Interface {
        name: NodeIndex,
        type_params: NodeList,
        extends: NodeList,
        members: NodeList,
    },
    Enum {
        name: NodeIndex,
        members: NodeList,
    },
    EnumMember {
        name: NodeIndex,
        initializer: NodeIndex,
    },
    /// Function declarations/expressions, methods, constructors and
    /// call/construct signatures. `body` is `NONE` for signatures.
    Function {
        name: NodeIndex,
        type_params: NodeList,
        params: NodeList,
        return_type: NodeIndex,
        body: NodeIndex,
    },
    VariableStatement {
        declarations: NodeList,
    },
    /// Variable declarations, property declarations and property signatures.
    Variable {
        name: NodeIndex,
        type_annotation: NodeIndex,
        initializer: NodeIndex,
    },
    Parameter {
        name: NodeIndex,
        type_annotation: NodeIndex,
        initializer: NodeIndex,
    },
    TypeParameter {
        name: NodeIndex,
        constraint: NodeIndex,
    },
    IndexSignature {
        parameter: NodeIndex,
        key_type: NodeIndex,
        value_type: NodeIndex,
    },
    Block {
        statements: NodeList,
    },
    Return {
        expression: NodeIndex,
    },
    If {
        condition: NodeIndex,
        then_statement: NodeIndex,
        else_statement: NodeIndex,
    },
    While {
        condition: NodeIndex,
        body: NodeIndex,
    },
    ExpressionStatement {
        expression: NodeIndex,
    },
    BooleanLiteral {
        value: bool,
    },
    ArrayLiteral {
        elements: NodeList,
    },
    ObjectLiteral {
        properties: NodeList,
    },
    PropertyAssignment {
        name: NodeIndex,
        initializer: NodeIndex,
    },
    /// Call and `new` expressions.
    Call {
        callee: NodeIndex,
        arguments: NodeList,
    },
    PropertyAccess {
        expression: NodeIndex,
        name: NodeIndex,
    },
    ElementAccess {
        expression: NodeIndex,
        argument: NodeIndex,
    },
    Binary {
        left: NodeIndex,
        operator: SyntaxKind,
        right: NodeIndex,
    },
    PrefixUnary {
        operator: SyntaxKind,
        operand: NodeIndex,
    },
    TypeAssertion {
        type_node: NodeIndex,
        expression: NodeIndex,
    },
    Parenthesized {
        expression: NodeIndex,
    },
    /// `number`, `string`, `boolean`, `any`, `void`, `null`, `undefined`.
    KeywordType {
        keyword: String,
    },
    TypeReference {
        name: NodeIndex,
        type_args: NodeList,
    },
    QualifiedName {
        left: NodeIndex,
        right: NodeIndex,
    },
    ArrayType {
        element: NodeIndex,
    },
    /// `[A, B, ...C, D]`: `rest_start` is the index of the element written
    /// after `...`, or `None` for a fixed-width tuple.
    TupleType {
        elements: NodeList,
        rest_start: Option<u32>,
    },
    TypeLiteral {
        members: NodeList,
    },
    FunctionType {
        params: NodeList,
        return_type: NodeIndex,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct Node {
    pub kind: SyntaxKind,
    pub pos: u32,
    pub end: u32,
    pub flags: ModifierFlags,
    pub data: NodeData,
}

impl Node {
    pub fn span(&self) -> Span {
        Span::new(self.pos, self.end)
    }
}

/// Arena-based storage for AST nodes.
#[derive(Debug, Default, Serialize)]
pub struct NodeArena {
    pub nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena { nodes: Vec::new() }
    }

    /// Add a node to the arena and return its index
    pub fn add(&mut self, node: Node) -> NodeIndex {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        NodeIndex(index)
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get(index.0 as usize)
        }
    }

    pub fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            None
        } else {
            self.nodes.get_mut(index.0 as usize)
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn kind(&self, index: NodeIndex) -> Option<SyntaxKind> {
        self.get(index).map(|n| n.kind)
    }

    pub fn span(&self, index: NodeIndex) -> Span {
        self.get(index).map(Node::span).unwrap_or_default()
    }

    pub fn flags(&self, index: NodeIndex) -> ModifierFlags {
        self.get(index).map(|n| n.flags).unwrap_or_default()
    }

    pub fn data(&self, index: NodeIndex) -> &NodeData {
        static NONE: NodeData = NodeData::None;
        self.get(index).map_or(&NONE, |n| &n.data)
    }

    /// Text of an identifier node, or the cooked text of a literal used as a name.
    pub fn identifier_text(&self, index: NodeIndex) -> Option<&str> {
        match &self.get(index)?.data {
            NodeData::Identifier { text } | NodeData::Literal { text } => Some(text),
            _ => None,
        }
    }

    pub fn literal_text(&self, index: NodeIndex) -> Option<&str> {
        match &self.get(index)?.data {
            NodeData::Literal { text } => Some(text),
            _ => None,
        }
    }

    /// Direct children of a node in source order.
    pub fn children(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut children = Vec::new();
        let Some(node) = self.get(index) else {
            return children;
        };

        let add = |children: &mut Vec<NodeIndex>, idx: NodeIndex| {
            if idx.is_some() {
                children.push(idx);
            }
        };
        let add_list = |children: &mut Vec<NodeIndex>, list: &NodeList| {
            children.extend(list.iter());
        };

        match &node.data {
            NodeData::None
            | NodeData::Identifier { .. }
            | NodeData::Literal { .. }
            | NodeData::BooleanLiteral { .. }
            | NodeData::KeywordType { .. } => {}
            NodeData::SourceFile { statements, .. } => add_list(&mut children, statements),
            NodeData::Module { name, body } => {
                add(&mut children, *name);
                add_list(&mut children, body);
            }
            NodeData::Class {
                name,
                type_params,
                extends,
                implements,
                members,
            } => {
                add(&mut children, *name);
                add_list(&mut children, type_params);
                add(&mut children, *extends);
                add_list(&mut children, implements);
                add_list(&mut children, members);
            }
            NodeData::Interface {
                name,
                type_params,
                extends,
                members,
            } => {
                add(&mut children, *name);
                add_list(&mut children, type_params);
                add_list(&mut children, extends);
                add_list(&mut children, members);
            }
            NodeData::Enum { name, members } => {
                add(&mut children, *name);
                add_list(&mut children, members);
            }
            NodeData::EnumMember { name, initializer } => {
                add(&mut children, *name);
                add(&mut children, *initializer);
            }
            NodeData::Function {
                name,
                type_params,
                params,
                return_type,
                body,
            } => {
                add(&mut children, *name);
                add_list(&mut children, type_params);
                add_list(&mut children, params);
                add(&mut children, *return_type);
                add(&mut children, *body);
            }
            NodeData::VariableStatement { declarations } => add_list(&mut children, declarations),
            NodeData::Variable {
                name,
                type_annotation,
                initializer,
            }
            | NodeData::Parameter {
                name,
                type_annotation,
                initializer,
            } => {
                add(&mut children, *name);
                add(&mut children, *type_annotation);
                add(&mut children, *initializer);
            }
            NodeData::TypeParameter { name, constraint } => {
                add(&mut children, *name);
                add(&mut children, *constraint);
            }
            NodeData::IndexSignature {
                parameter,
                key_type,
                value_type,
            } => {
                add(&mut children, *parameter);
                add(&mut children, *key_type);
                add(&mut children, *value_type);
            }
            NodeData::Block { statements } => add_list(&mut children, statements),
            NodeData::Return { expression }
            | NodeData::ExpressionStatement { expression }
            | NodeData::Parenthesized { expression } => add(&mut children, *expression),
            NodeData::If {
                condition,
                then_statement,
                else_statement,
            } => {
                add(&mut children, *condition);
                add(&mut children, *then_statement);
                add(&mut children, *else_statement);
            }
            NodeData::While { condition, body } => {
                add(&mut children, *condition);
                add(&mut children, *body);
            }
            NodeData::ArrayLiteral { elements } => add_list(&mut children, elements),
            NodeData::ObjectLiteral { properties } => add_list(&mut children, properties),
            NodeData::PropertyAssignment { name, initializer } => {
                add(&mut children, *name);
                add(&mut children, *initializer);
            }
            NodeData::Call { callee, arguments } => {
                add(&mut children, *callee);
                add_list(&mut children, arguments);
            }
            NodeData::PropertyAccess { expression, name } => {
                add(&mut children, *expression);
                add(&mut children, *name);
            }
            NodeData::ElementAccess {
                expression,
                argument,
            } => {
                add(&mut children, *expression);
                add(&mut children, *argument);
            }
            NodeData::Binary { left, right, .. } => {
                add(&mut children, *left);
                add(&mut children, *right);
            }
            NodeData::PrefixUnary { operand, .. } => add(&mut children, *operand),
            NodeData::TypeAssertion {
                type_node,
                expression,
            } => {
                add(&mut children, *type_node);
                add(&mut children, *expression);
            }
            NodeData::TypeReference { name, type_args } => {
                add(&mut children, *name);
                add_list(&mut children, type_args);
            }
            NodeData::QualifiedName { left, right } => {
                add(&mut children, *left);
                add(&mut children, *right);
            }
            NodeData::ArrayType { element } => add(&mut children, *element),
            NodeData::TupleType { elements, .. } => add_list(&mut children, elements),
            NodeData::TypeLiteral { members } => add_list(&mut children, members),
            NodeData::FunctionType {
                params,
                return_type,
            } => {
                add_list(&mut children, params);
                add(&mut children, *return_type);
            }
        }
        children
    }

    /// The name node of a declaration, if it has one.
    pub fn declaration_name(&self, index: NodeIndex) -> NodeIndex {
        match self.data(index) {
            NodeData::Module { name, .. }
            | NodeData::Class { name, .. }
            | NodeData::Interface { name, .. }
            | NodeData::Enum { name, .. }
            | NodeData::EnumMember { name, .. }
            | NodeData::Function { name, .. }
            | NodeData::Variable { name, .. }
            | NodeData::Parameter { name, .. }
            | NodeData::TypeParameter { name, .. }
            | NodeData::PropertyAssignment { name, .. } => *name,
            _ => NodeIndex::NONE,
        }
    }

    /// Dotted text of an identifier or qualified name (`A.B.C`).
    pub fn entity_name_text(&self, index: NodeIndex) -> Option<String> {
        match self.data(index) {
            NodeData::Identifier { text } => Some(text.clone()),
            NodeData::QualifiedName { left, right } => {
                let left = self.entity_name_text(*left)?;
                let right = self.identifier_text(*right)?;
                Some(format!("{left}.{right}"))
            }
            _ => None,
        }
    }
}
