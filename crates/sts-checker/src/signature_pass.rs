//! Pass 1: building declared shapes.
//!
//! Resolves parameter and return types, member types and heritage for every
//! declaration of a file without walking statement or expression bodies.
//! Shapes are resolved lazily and memoized, so building every file before
//! any file is checked gives the same result for any file order.
//!
//! Declarations under a function expression are left alone: their
//! parameters may take their types from the position the expression is
//! written in, which only pass 2 knows.

use sts_binder::{DeclId, DeclKind, DeclarationTree, FileId};
use sts_parser::NodeData;
use tracing::{debug, trace};

use crate::state::CheckerState;

impl<'a> CheckerState<'a> {
    /// Resolve the declared shape of every declaration in `file`.
    pub(crate) fn build_file_signatures(&mut self, file: FileId) {
        if self.ctx.signatures_built.contains(&file) {
            return;
        }
        let Some(tree) = self.registry().tree(file) else {
            return;
        };
        let decls: Vec<DeclId> = tree
            .ids()
            .filter(|&id| !id.is_root() && !under_function_expression(tree, id))
            .collect();
        debug!(?file, count = decls.len(), "building signatures");
        self.in_file(file, |state| {
            for decl_id in decls {
                state.build_declaration_shape(decl_id);
            }
        });
        self.ctx.signatures_built.insert(file);
    }

    fn build_declaration_shape(&mut self, decl_id: DeclId) {
        let Some(decl) = self.declaration(decl_id) else {
            return;
        };
        let Some(symbol) = self.bind(decl_id) else {
            return;
        };
        trace!(name = %decl.display_name, kind = decl.kind.name(), "declared shape");
        match decl.kind {
            DeclKind::Class => {
                self.class_members(symbol);
                self.class_statics(symbol);
            }
            DeclKind::Interface => {
                self.interface_members(symbol);
            }
            DeclKind::Module => {
                self.module_exports(symbol);
            }
            DeclKind::Function => {
                self.function_type(symbol);
            }
            DeclKind::CallSignature | DeclKind::ConstructSignature => {
                self.signature_of(symbol);
            }
            DeclKind::TypeParameter => {
                self.type_parameter_constraint(symbol);
            }
            DeclKind::IndexSignature => {
                self.variable_type(symbol);
            }
            DeclKind::Variable | DeclKind::Parameter => {
                if self.is_annotated(decl_id) {
                    self.variable_type(symbol);
                }
            }
            DeclKind::Enum
            | DeclKind::EnumMember
            | DeclKind::FunctionExpression
            | DeclKind::Script => {}
        }
    }

    fn is_annotated(&self, decl_id: DeclId) -> bool {
        let (Some(decl), Some(arena)) = (self.declaration(decl_id), self.arena(decl_id.file)) else {
            return false;
        };
        match arena.data(decl.node) {
            NodeData::Variable {
                type_annotation, ..
            }
            | NodeData::Parameter {
                type_annotation, ..
            } => type_annotation.is_some(),
            _ => false,
        }
    }
}

fn under_function_expression(tree: &DeclarationTree, id: DeclId) -> bool {
    let mut current = Some(id);
    while let Some(decl) = current.and_then(|id| tree.get(id)) {
        if decl.kind == DeclKind::FunctionExpression {
            return true;
        }
        current = decl.parent;
    }
    false
}
