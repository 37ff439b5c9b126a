//! Syntax-tree provider for the sts compiler.
//!
//! This crate turns source text into a per-file `NodeArena`:
//! - `scanner` - Tokenizer producing `SyntaxKind` tokens
//! - `node` - Arena-based AST storage (`Node`, `NodeIndex`, `NodeData`)
//! - `parser` - Recursive-descent parser with error recovery
//!
//! Only the subset of TypeScript the sound checker consumes is recognised.
//! Parse errors are collected as syntax diagnostics; the parser always
//! produces a tree.

pub mod node;
pub mod parser;
pub mod scanner;
pub mod syntax_kind;

pub use node::{ModifierFlags, Node, NodeArena, NodeData, NodeIndex, NodeList};
pub use parser::{ParsedFile, ParserState};
pub use scanner::Scanner;
pub use syntax_kind::SyntaxKind;
