//! Compile driver.
//!
//! A compile is a fixed sequence of phases run over the whole file set:
//! syntax, semantic (declaration diagnostics), signature build, check.
//! Every file finishes a phase before any file starts the next one.
//! `CompileSteps` yields one `PhaseResult` per phase, so a caller can stop
//! pulling as soon as it has what it needs. Syntax errors end the sequence
//! after the first phase unless `continue_on_diagnostics` is set.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, info_span};

use sts_binder::{FileId, FileSetChange, FileSnapshot, SemanticRegistry};
use sts_checker::{FileTags, SoundChecker};
use sts_common::Diagnostic;

use crate::config::ResolvedCompilerOptions;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Syntax,
    Semantic,
    Signatures,
    Check,
}

impl Phase {
    fn next(self) -> Option<Phase> {
        match self {
            Phase::Syntax => Some(Phase::Semantic),
            Phase::Semantic => Some(Phase::Signatures),
            Phase::Signatures => Some(Phase::Check),
            Phase::Check => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Syntax => "syntax",
            Phase::Semantic => "semantic",
            Phase::Signatures => "signatures",
            Phase::Check => "check",
        }
    }
}

/// Diagnostics one phase produced, in file-list order.
#[derive(Clone, Debug, Serialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub diagnostics: Vec<Diagnostic>,
}

impl PhaseResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Lazily runs the phases of one compile.
pub struct CompileSteps<'a> {
    registry: &'a SemanticRegistry,
    checker: SoundChecker<'a>,
    continue_on_diagnostics: bool,
    next: Option<Phase>,
}

impl<'a> CompileSteps<'a> {
    pub fn new(registry: &'a SemanticRegistry, options: &ResolvedCompilerOptions) -> Self {
        CompileSteps {
            registry,
            checker: SoundChecker::new(registry, options.checker),
            continue_on_diagnostics: options.continue_on_diagnostics,
            next: Some(Phase::Syntax),
        }
    }

    /// The checking session, for reading types and tags once the sequence
    /// has run.
    pub fn checker(&self) -> &SoundChecker<'a> {
        &self.checker
    }

    fn file_ids(&self) -> Vec<FileId> {
        self.registry.files().map(|entry| entry.id).collect()
    }

    /// Checker diagnostics appended while `run` executes, per file in order.
    fn collect_added(&mut self, run: impl FnOnce(&mut SoundChecker<'a>)) -> Vec<Diagnostic> {
        let before: Vec<usize> = self
            .registry
            .files()
            .map(|entry| entry.diagnostics().len())
            .collect();
        let global_before = self.registry.global_diagnostics().len();

        run(&mut self.checker);

        let mut added: Vec<Diagnostic> = self.registry.global_diagnostics()[global_before..].to_vec();
        for (entry, &start) in self.registry.files().zip(&before) {
            added.extend(entry.diagnostics()[start..].iter().cloned());
        }
        added
    }

    fn run_phase(&mut self, phase: Phase) -> Vec<Diagnostic> {
        let _span = info_span!("phase", name = phase.name()).entered();
        match phase {
            Phase::Syntax => self
                .registry
                .files()
                .flat_map(|entry| entry.syntax_diagnostics().iter().cloned())
                .collect(),
            Phase::Semantic => self
                .registry
                .files()
                .flat_map(|entry| entry.declaration_diagnostics().iter().cloned())
                .collect(),
            Phase::Signatures => {
                let files = self.file_ids();
                self.collect_added(|checker| {
                    for file in files {
                        checker.build_signatures(file);
                    }
                })
            }
            Phase::Check => {
                let files = self.file_ids();
                self.collect_added(|checker| {
                    for file in files {
                        checker.check_file(file);
                    }
                })
            }
        }
    }
}

impl Iterator for CompileSteps<'_> {
    type Item = PhaseResult;

    fn next(&mut self) -> Option<PhaseResult> {
        let phase = self.next?;
        let diagnostics = self.run_phase(phase);
        let result = PhaseResult { phase, diagnostics };

        self.next = if phase == Phase::Syntax && result.has_errors() && !self.continue_on_diagnostics {
            info!(
                count = result.diagnostics.len(),
                "syntax errors; skipping remaining phases"
            );
            None
        } else {
            phase.next()
        };
        debug!(phase = phase.name(), diagnostics = result.diagnostics.len(), "phase done");
        Some(result)
    }
}

/// Everything a finished compile hands on: the diagnostics in reporting
/// order plus, per file path, what code generation needs.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub phases_run: Vec<Phase>,
    pub tags: IndexMap<String, FileTags>,
}

impl CompilationResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Owns the registry across compiles of a changing file set.
pub struct Compiler {
    registry: SemanticRegistry,
    options: ResolvedCompilerOptions,
}

impl Compiler {
    pub fn new(options: ResolvedCompilerOptions) -> Self {
        Compiler {
            registry: SemanticRegistry::new(),
            options,
        }
    }

    pub fn options(&self) -> &ResolvedCompilerOptions {
        &self.options
    }

    pub fn registry(&self) -> &SemanticRegistry {
        &self.registry
    }

    /// Different options invalidate every file entry.
    pub fn set_options(&mut self, options: ResolvedCompilerOptions) {
        if options != self.options {
            info!("compiler options changed; dropping all file entries");
            self.registry.invalidate(None);
            self.options = options;
        }
    }

    pub fn update_files(&mut self, snapshots: &[FileSnapshot]) -> FileSetChange {
        self.registry.update_file_set(snapshots)
    }

    /// Phases of a compile over the current file set, run on demand.
    pub fn steps(&self) -> CompileSteps<'_> {
        CompileSteps::new(&self.registry, &self.options)
    }

    /// Run every phase.
    pub fn compile(&self) -> CompilationResult {
        let _span = info_span!("compile", files = self.registry.file_count()).entered();
        let mut steps = self.steps();
        let mut result = CompilationResult::default();
        for phase in steps.by_ref() {
            result.phases_run.push(phase.phase);
            result.diagnostics.extend(phase.diagnostics);
        }
        for entry in self.registry.files() {
            if let Some(tags) = steps.checker().file_tags(entry.id) {
                result.tags.insert(entry.path.clone(), tags.clone());
            }
        }
        result
    }
}
