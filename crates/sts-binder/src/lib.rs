//! Declaration trees and the per-compilation semantic registry.
//!
//! - `declaration` - `Declaration`, kinds, flags and the name-partitioned caches
//! - `builder` - single-pass walk from a syntax tree to a `DeclarationTree`
//! - `registry` - `SemanticRegistry`, per-file entries, invalidation and global lookup
//!
//! Declarations are stored in a per-file arena and addressed by `DeclId`.
//! Every file entry gets a fresh `FileId`, so ids handed out before an edit
//! stop resolving once the entry is replaced.

pub mod builder;
pub mod declaration;
pub mod registry;

pub use builder::{BuildResult, DeclarationBuilder};
pub use declaration::{
    DeclFlags, DeclId, DeclKind, Declaration, DeclarationTree, FileId, NameCaches, NamePartition,
};
pub use registry::{FileEntry, FileSetChange, FileSnapshot, SemanticRegistry};

/// Identifier of a resolved symbol.
///
/// Symbols themselves live in the checker's symbol arena; the registry only
/// records which symbol a declaration or AST node is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct SymbolId(pub u32);

impl SymbolId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}
