//! sts: a sound type checker for a TypeScript subset.
//!
//! The work happens in the member crates; this package wires them into a
//! compile:
//! - `config` - tsconfig-style options and the message catalog
//! - `driver` - the phase sequence over a `SemanticRegistry`
//! - `reporter` - `path(line,col): error NNNN: text` rendering
//! - `tracing_config` - `STS_LOG` / `STS_LOG_FORMAT` subscriber setup

pub mod config;
pub mod driver;
pub mod reporter;
pub mod tracing_config;

pub use config::{CompilerOptions, ResolvedCompilerOptions, TsConfig};
pub use driver::{CompilationResult, CompileSteps, Compiler, Phase, PhaseResult};
pub use reporter::Reporter;

pub use sts_binder as binder;
pub use sts_checker as checker;
pub use sts_common as common;
pub use sts_parser as parser;
pub use sts_solver as solver;
