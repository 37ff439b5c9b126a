//! Semantic registry.
//!
//! One `SemanticRegistry` per compilation. It owns, per file, the parsed
//! syntax tree, the declaration tree, the AST -> declaration and
//! AST/declaration -> symbol maps, and the file's diagnostics. Entries are
//! never patched: an edited file gets a brand-new entry with a fresh
//! `FileId`, so anything computed against the old entry stops resolving.
//!
//! Symbol maps and added diagnostics sit behind `RefCell` so the checker
//! can fill them lazily through a shared `&SemanticRegistry` while it reads
//! declaration trees.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use sts_common::Diagnostic;
use sts_common::limits::MAX_PARENT_CHAIN;
use sts_parser::{NodeIndex, ParsedFile};
use tracing::{debug, info};

use crate::SymbolId;
use crate::builder::DeclarationBuilder;
use crate::declaration::{DeclId, Declaration, DeclarationTree, FileId, NamePartition};

/// Already-materialized file content handed in by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSnapshot {
    pub path: String,
    pub version: u32,
    pub text: String,
}

impl FileSnapshot {
    pub fn new(path: impl Into<String>, version: u32, text: impl Into<String>) -> Self {
        FileSnapshot {
            path: path.into(),
            version,
            text: text.into(),
        }
    }
}

/// Per-file registry state.
#[derive(Debug)]
pub struct FileEntry {
    pub id: FileId,
    pub path: String,
    pub version: u32,
    text: String,
    pub parsed: ParsedFile,
    pub tree: DeclarationTree,
    node_decls: FxHashMap<NodeIndex, DeclId>,
    declaration_diagnostics: Vec<Diagnostic>,
    diagnostics: RefCell<Vec<Diagnostic>>,
    node_symbols: RefCell<FxHashMap<NodeIndex, SymbolId>>,
    decl_symbols: RefCell<FxHashMap<DeclId, SymbolId>>,
    /// Root-to-declaration paths, written once per declaration.
    parent_paths: RefCell<FxHashMap<u32, Rc<[DeclId]>>>,
}

impl FileEntry {
    fn build(id: FileId, snapshot: &FileSnapshot) -> FileEntry {
        let parsed = ParsedFile::parse(&snapshot.path, &snapshot.text);
        let result = DeclarationBuilder::new(id, &snapshot.path, &parsed.arena).build(parsed.root);
        FileEntry {
            id,
            path: snapshot.path.clone(),
            version: snapshot.version,
            text: snapshot.text.clone(),
            parsed,
            tree: result.tree,
            node_decls: result.node_decls,
            declaration_diagnostics: result.diagnostics,
            diagnostics: RefCell::new(Vec::new()),
            node_symbols: RefCell::new(FxHashMap::default()),
            decl_symbols: RefCell::new(FxHashMap::default()),
            parent_paths: RefCell::new(FxHashMap::default()),
        }
    }

    fn matches(&self, snapshot: &FileSnapshot) -> bool {
        self.version == snapshot.version && self.text == snapshot.text
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn syntax_diagnostics(&self) -> &[Diagnostic] {
        &self.parsed.diagnostics
    }

    /// Duplicate-identifier diagnostics from the declaration builder.
    pub fn declaration_diagnostics(&self) -> &[Diagnostic] {
        &self.declaration_diagnostics
    }

    /// Diagnostics appended by the checker.
    pub fn diagnostics(&self) -> Ref<'_, Vec<Diagnostic>> {
        self.diagnostics.borrow()
    }

    pub fn declaration_for(&self, node: NodeIndex) -> Option<DeclId> {
        self.node_decls.get(&node).copied()
    }

    pub fn symbol_for(&self, node: NodeIndex) -> Option<SymbolId> {
        self.node_symbols.borrow().get(&node).copied()
    }

    fn clear_symbols(&self) {
        self.node_symbols.borrow_mut().clear();
        self.decl_symbols.borrow_mut().clear();
    }
}

/// Outcome of `update_file_set`, by path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileSetChange {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
}

impl FileSetChange {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }
}

pub struct SemanticRegistry {
    /// Entries in file-list order.
    files: IndexMap<String, FileEntry>,
    paths_by_id: FxHashMap<FileId, String>,
    global: DeclarationTree,
    global_diagnostics: RefCell<Vec<Diagnostic>>,
    next_file_id: u32,
    /// Bumped whenever symbol maps are cleared; symbol stores keyed to an
    /// older generation must be discarded.
    symbol_generation: u64,
}

impl Default for SemanticRegistry {
    fn default() -> Self {
        SemanticRegistry::new()
    }
}

impl SemanticRegistry {
    pub fn new() -> Self {
        SemanticRegistry {
            files: IndexMap::new(),
            paths_by_id: FxHashMap::default(),
            global: DeclarationTree::new(FileId::GLOBAL, None),
            global_diagnostics: RefCell::new(Vec::new()),
            next_file_id: 1,
            symbol_generation: 0,
        }
    }

    fn fresh_file_id(&mut self) -> FileId {
        let id = FileId(self.next_file_id);
        self.next_file_id += 1;
        id
    }

    pub fn symbol_generation(&self) -> u64 {
        self.symbol_generation
    }

    fn invalidate_symbols(&mut self) {
        for entry in self.files.values() {
            entry.clear_symbols();
        }
        self.symbol_generation += 1;
        debug!(generation = self.symbol_generation, "symbol maps invalidated");
    }

    fn rebuild_id_index(&mut self) {
        self.paths_by_id = self
            .files
            .values()
            .map(|entry| (entry.id, entry.path.clone()))
            .collect();
    }

    /// Return the entry for `snapshot.path`, replacing it when the content
    /// version differs.
    pub fn get_or_create_file_entry(&mut self, snapshot: &FileSnapshot) -> FileId {
        if let Some(entry) = self.files.get(&snapshot.path) {
            if entry.matches(snapshot) {
                return entry.id;
            }
        }
        let id = self.fresh_file_id();
        let entry = FileEntry::build(id, snapshot);
        // `insert` keeps the position of an existing key.
        self.files.insert(snapshot.path.clone(), entry);
        self.rebuild_id_index();
        self.invalidate_symbols();
        id
    }

    /// Diff the known file set against `snapshots`: removed files are
    /// dropped, changed files get new entries, unchanged files are kept.
    /// Entry order follows `snapshots`.
    pub fn update_file_set(&mut self, snapshots: &[FileSnapshot]) -> FileSetChange {
        let mut previous = std::mem::take(&mut self.files);
        let mut change = FileSetChange::default();

        for snapshot in snapshots {
            if self.files.contains_key(&snapshot.path) {
                continue;
            }
            let entry = match previous.swap_remove(&snapshot.path) {
                Some(entry) if entry.matches(snapshot) => {
                    change.unchanged.push(snapshot.path.clone());
                    entry
                }
                Some(_) => {
                    change.changed.push(snapshot.path.clone());
                    let id = self.fresh_file_id();
                    FileEntry::build(id, snapshot)
                }
                None => {
                    change.added.push(snapshot.path.clone());
                    let id = self.fresh_file_id();
                    FileEntry::build(id, snapshot)
                }
            };
            self.files.insert(snapshot.path.clone(), entry);
        }
        change.removed = previous.keys().cloned().collect();
        self.rebuild_id_index();

        if !change.is_empty() {
            self.invalidate_symbols();
        }
        info!(
            added = change.added.len(),
            changed = change.changed.len(),
            removed = change.removed.len(),
            unchanged = change.unchanged.len(),
            "file set updated"
        );
        change
    }

    /// Drop one file's entry, or every entry when `file` is `None`
    /// (compiler settings changed).
    pub fn invalidate(&mut self, file: Option<&str>) {
        match file {
            Some(path) => {
                if self.files.shift_remove(path).is_some() {
                    debug!(file = path, "file entry invalidated");
                }
            }
            None => {
                self.files.clear();
                self.global_diagnostics.borrow_mut().clear();
                debug!("all file entries invalidated");
            }
        }
        self.rebuild_id_index();
        self.invalidate_symbols();
    }

    /// Forget every recorded symbol without touching declaration trees.
    ///
    /// A checking session owns its symbol arena; ids recorded by an earlier
    /// session would point into an arena that no longer exists.
    pub fn reset_symbol_maps(&self) {
        for entry in self.files.values() {
            entry.clear_symbols();
        }
    }

    /// Clear diagnostics appended by a previous check.
    pub fn clear_check_diagnostics(&self) {
        for entry in self.files.values() {
            entry.diagnostics.borrow_mut().clear();
        }
        self.global_diagnostics.borrow_mut().clear();
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.files.values()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn entry(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }

    pub fn entry_by_id(&self, file: FileId) -> Option<&FileEntry> {
        self.paths_by_id
            .get(&file)
            .and_then(|path| self.files.get(path))
    }

    /// The declaration tree owning `file`, including the global tree.
    pub fn tree(&self, file: FileId) -> Option<&DeclarationTree> {
        if file == FileId::GLOBAL {
            return Some(&self.global);
        }
        self.entry_by_id(file).map(|entry| &entry.tree)
    }

    /// `None` for ids from replaced or removed entries.
    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.tree(id.file)?.get(id)
    }

    pub fn declaration_for(&self, file: FileId, node: NodeIndex) -> Option<DeclId> {
        self.entry_by_id(file)?.declaration_for(node)
    }

    pub fn symbol_for(&self, file: FileId, node: NodeIndex) -> Option<SymbolId> {
        self.entry_by_id(file)?.symbol_for(node)
    }

    pub fn record_node_symbol(&self, file: FileId, node: NodeIndex, symbol: SymbolId) {
        if let Some(entry) = self.entry_by_id(file) {
            entry.node_symbols.borrow_mut().insert(node, symbol);
        }
    }

    pub fn symbol_for_declaration(&self, decl: DeclId) -> Option<SymbolId> {
        self.entry_by_id(decl.file)?
            .decl_symbols
            .borrow()
            .get(&decl)
            .copied()
    }

    pub fn record_declaration_symbol(&self, decl: DeclId, symbol: SymbolId) {
        if let Some(entry) = self.entry_by_id(decl.file) {
            entry.decl_symbols.borrow_mut().insert(decl, symbol);
            let node = entry.tree.get(decl).map(|d| d.node);
            if let Some(node) = node.filter(|n| n.is_some()) {
                entry.node_symbols.borrow_mut().entry(node).or_insert(symbol);
            }
        }
    }

    /// Append a diagnostic to `file`'s list; unknown files go to the
    /// whole-program list.
    pub fn add_diagnostic(&self, file: Option<&str>, diagnostic: Diagnostic) {
        match file.and_then(|path| self.files.get(path)) {
            Some(entry) => entry.diagnostics.borrow_mut().push(diagnostic),
            None => self.global_diagnostics.borrow_mut().push(diagnostic),
        }
    }

    pub fn global_diagnostics(&self) -> Ref<'_, Vec<Diagnostic>> {
        self.global_diagnostics.borrow()
    }

    /// The synthetic root that owns no file, used for cross-file merging.
    pub fn global_declaration(&self) -> &Declaration {
        // The global tree always has its root at index 0.
        match self.global.get(self.global.root()) {
            Some(root) => root,
            None => unreachable!("global declaration tree has no root"),
        }
    }

    /// Top-level declarations named `name` across all files, in file order.
    pub fn find_global(&self, name: &str, partition: NamePartition) -> Vec<DeclId> {
        let mut found: Vec<DeclId> = self
            .global
            .lookup(self.global.root(), partition, name)
            .to_vec();
        for entry in self.files.values() {
            found.extend_from_slice(entry.tree.lookup(entry.tree.root(), partition, name));
        }
        found
    }

    /// Declarations from the root down to `decl`, inclusive.
    pub fn parent_path(&self, decl: DeclId) -> Option<Rc<[DeclId]>> {
        let entry = self.entry_by_id(decl.file)?;
        entry.tree.get(decl)?;
        if let Some(path) = entry.parent_paths.borrow().get(&decl.index) {
            return Some(Rc::clone(path));
        }

        let mut chain = vec![decl];
        let mut current = decl;
        while let Some(parent) = entry.tree.get(current).and_then(|d| d.parent) {
            assert!(
                chain.len() < MAX_PARENT_CHAIN,
                "declaration parent chain does not terminate: {decl:?}"
            );
            chain.push(parent);
            current = parent;
        }
        assert!(current.is_root(), "parent chain of {decl:?} ends at a non-root");
        chain.reverse();
        let path: Rc<[DeclId]> = chain.into();
        entry
            .parent_paths
            .borrow_mut()
            .entry(decl.index)
            .or_insert_with(|| Rc::clone(&path));
        Some(path)
    }

    /// File name of `decl`, found through its root.
    pub fn file_name_of(&self, decl: DeclId) -> Option<&str> {
        let tree = self.tree(decl.file)?;
        tree.get(decl)?;
        tree.file_name_of(decl)
    }
}
