//! The `WorkspaceIndex` itself: `URI -> tree/declarations/references`
//! mappings, with eviction governed by [`CachingStrategy`].

use indexmap::IndexMap;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use perl_symbol_extractor::{extract, Diagnostic};
use perl_symbol_types::{FunctionReference, PerFileIndex};
use perl_tree::{ParseError, ParserHost, SyntaxTree};

use crate::cache::CachingStrategy;

/// The mode under which a URI is being analyzed.
///
/// `OnFileOpen` forces tree retention even under the `eager` strategy
/// (editor-opened documents are always live); `OnWorkspaceOpen` parses from
/// the initial scan and is subject to the caching strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Editor `didOpen`/`didChange`: always retains the tree.
    OnFileOpen,
    /// Initial workspace scan: retains the tree only under `full` caching.
    OnWorkspaceOpen,
}

/// Errors that can occur while operating on the index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// A file could not be read from disk. This is logged and the scan
    /// continues; it is never fatal to the whole workspace scan.
    #[error("could not read {0}: {1}")]
    FileUnreadable(std::path::PathBuf, #[source] std::io::Error),
    /// The parser host failed to produce a tree.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The URI does not map to a readable filesystem path.
    #[error("URI does not resolve to a filesystem path: {0}")]
    UnresolvableUri(String),
}

/// Global `URI -> tree/declarations/references` index.
///
/// A single logical writer at a time is assumed; this type itself performs
/// no internal locking — the LSP facade is responsible for serializing
/// writers against readers, which a single-threaded request executor
/// satisfies trivially.
pub struct WorkspaceIndex {
    strategy: CachingStrategy,
    parser: ParserHost,
    trees_by_uri: HashMap<String, SyntaxTree>,
    decls_by_uri: IndexMap<String, Vec<FunctionReference>>,
    refs_by_uri: IndexMap<String, IndexMap<String, Vec<FunctionReference>>>,
}

impl WorkspaceIndex {
    /// Construct an empty index over a fresh [`ParserHost`], per the
    /// caching `strategy` negotiated from client settings.
    pub fn new(parser: ParserHost, strategy: CachingStrategy) -> Self {
        Self {
            strategy,
            parser,
            trees_by_uri: HashMap::new(),
            decls_by_uri: IndexMap::new(),
            refs_by_uri: IndexMap::new(),
        }
    }

    /// The caching strategy this index was constructed with.
    pub fn strategy(&self) -> CachingStrategy {
        self.strategy
    }

    /// Analyze `uri` whose current content is `text`: parse, extract, and
    /// replace any prior `declsByUri[uri]`/`refsByUri[uri]` wholesale — a
    /// reanalysis never carries declarations or references over from a
    /// previous version of the file.
    ///
    /// Returns the diagnostics produced by this pass (empty if
    /// `collect_diagnostics` is false or `max_diagnostics` is 0).
    pub fn analyze(
        &mut self,
        uri: &str,
        text: &str,
        mode: AnalysisMode,
        collect_diagnostics: bool,
        max_diagnostics: usize,
    ) -> Result<Vec<Diagnostic>, IndexError> {
        let tree = self.parser.parse(text)?;
        let cap = if collect_diagnostics { max_diagnostics } else { 0 };
        let (per_file, diagnostics) = extract(uri, &tree, cap);
        self.store(uri, tree, per_file, mode);
        Ok(diagnostics)
    }

    fn store(&mut self, uri: &str, tree: SyntaxTree, per_file: PerFileIndex, mode: AnalysisMode) {
        let retains_tree = matches!(mode, AnalysisMode::OnFileOpen) || self.strategy.retains_scan_trees();
        if retains_tree {
            self.trees_by_uri.insert(uri.to_string(), tree);
        } else {
            self.trees_by_uri.remove(uri);
        }
        self.decls_by_uri.insert(uri.to_string(), per_file.declarations);
        self.refs_by_uri.insert(uri.to_string(), per_file.references);
    }

    /// Return the cached tree for `uri`, reading and parsing the
    /// underlying file if it is absent, and inserting it if the caching
    /// strategy permits.
    pub fn tree_for(&mut self, uri: &str) -> Result<SyntaxTree, IndexError> {
        if let Some(tree) = self.trees_by_uri.get(uri) {
            return Ok(tree.copy());
        }
        let path = perl_uri::uri_to_fs_path(uri).ok_or_else(|| IndexError::UnresolvableUri(uri.to_string()))?;
        let text = fs::read_to_string(&path).map_err(|e| IndexError::FileUnreadable(path, e))?;
        let tree = self.parser.parse(&text)?;
        if self.strategy.retains_scan_trees() {
            self.trees_by_uri.insert(uri.to_string(), tree.copy());
        }
        Ok(tree)
    }

    /// Evict every entry keyed by `uri` from every map.
    pub fn close(&mut self, uri: &str) {
        self.trees_by_uri.remove(uri);
        self.decls_by_uri.remove(uri);
        self.refs_by_uri.remove(uri);
    }

    /// Declarations for every indexed URI, in the order `analyze`/`load`
    /// touched them (an `IndexMap` preserves insertion order, which the
    /// definition query relies on for a stable multi-file result ordering).
    pub fn decls_by_uri(&self) -> &IndexMap<String, Vec<FunctionReference>> {
        &self.decls_by_uri
    }

    /// References for every indexed URI, keyed by function name.
    pub fn refs_by_uri(&self) -> &IndexMap<String, IndexMap<String, Vec<FunctionReference>>> {
        &self.refs_by_uri
    }

    /// The tree for `uri` if currently resident in the cache, without
    /// triggering a read-and-parse fallback.
    pub fn resident_tree(&self, uri: &str) -> Option<&SyntaxTree> {
        self.trees_by_uri.get(uri)
    }

    /// Declarations for a single URI, if indexed.
    pub fn decls_for(&self, uri: &str) -> Option<&[FunctionReference]> {
        self.decls_by_uri.get(uri).map(Vec::as_slice)
    }

    /// References for a single URI, if indexed.
    pub fn refs_for(&self, uri: &str) -> Option<&IndexMap<String, Vec<FunctionReference>>> {
        self.refs_by_uri.get(uri)
    }

    /// Replace the persisted subset of the index (`declsByUri`,
    /// `refsByUri`) wholesale, as loaded from disk by `perl-persistence`.
    /// `treesByUri` is untouched — it is never persisted.
    pub fn replace_persisted(
        &mut self,
        decls_by_uri: IndexMap<String, Vec<FunctionReference>>,
        refs_by_uri: IndexMap<String, IndexMap<String, Vec<FunctionReference>>>,
    ) {
        self.decls_by_uri = decls_by_uri;
        self.refs_by_uri = refs_by_uri;
    }

    /// Number of URIs with cached trees (diagnostic/test helper).
    pub fn resident_tree_count(&self) -> usize {
        self.trees_by_uri.len()
    }

    /// True if `uri` is indexed at all (has decls or refs recorded).
    pub fn contains_uri(&self, uri: &str) -> bool {
        self.decls_by_uri.contains_key(uri) || self.refs_by_uri.contains_key(uri)
    }
}

/// Resolve a path under `workspace_root` without requiring the path to
/// already exist (used by the facade to build file lists before analysis).
pub fn normalize_workspace_path(workspace_root: &Path, relative: &Path) -> std::path::PathBuf {
    workspace_root.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> ParserHost {
        ParserHost::new().expect("grammar loads")
    }

    #[test]
    fn analyze_populates_decls_and_refs() {
        let mut index = WorkspaceIndex::new(host(), CachingStrategy::Eager);
        index
            .analyze(
                "file:///a.pm",
                "package Foo::Bar;\nsub greet { return 1; }\n1;\n",
                AnalysisMode::OnFileOpen,
                true,
                100,
            )
            .expect("analyzes");
        assert_eq!(index.decls_for("file:///a.pm").expect("present").len(), 1);
    }

    #[test]
    fn eager_strategy_discards_workspace_scan_trees() {
        let mut index = WorkspaceIndex::new(host(), CachingStrategy::Eager);
        index
            .analyze("file:///a.pm", "sub f { 1; }\n", AnalysisMode::OnWorkspaceOpen, false, 0)
            .expect("analyzes");
        assert!(index.resident_tree("file:///a.pm").is_none());
    }

    #[test]
    fn on_file_open_always_retains_tree_even_under_eager() {
        let mut index = WorkspaceIndex::new(host(), CachingStrategy::Eager);
        index
            .analyze("file:///a.pm", "sub f { 1; }\n", AnalysisMode::OnFileOpen, false, 0)
            .expect("analyzes");
        assert!(index.resident_tree("file:///a.pm").is_some());
    }

    #[test]
    fn full_strategy_retains_workspace_scan_trees() {
        let mut index = WorkspaceIndex::new(host(), CachingStrategy::Full);
        index
            .analyze("file:///a.pm", "sub f { 1; }\n", AnalysisMode::OnWorkspaceOpen, false, 0)
            .expect("analyzes");
        assert!(index.resident_tree("file:///a.pm").is_some());
    }

    #[test]
    fn close_removes_every_entry_for_the_uri() {
        let mut index = WorkspaceIndex::new(host(), CachingStrategy::Full);
        index
            .analyze("file:///a.pm", "sub f { 1; }\n", AnalysisMode::OnFileOpen, true, 100)
            .expect("analyzes");
        index.close("file:///a.pm");
        assert!(index.resident_tree("file:///a.pm").is_none());
        assert!(index.decls_for("file:///a.pm").is_none());
        assert!(index.refs_for("file:///a.pm").is_none());
        assert!(!index.contains_uri("file:///a.pm"));
    }

    #[test]
    fn reanalyzing_a_uri_replaces_rather_than_accumulates() {
        let mut index = WorkspaceIndex::new(host(), CachingStrategy::Full);
        index
            .analyze(
                "file:///a.pm",
                "sub one { 1; }\nsub two { 1; }\n",
                AnalysisMode::OnFileOpen,
                true,
                100,
            )
            .expect("analyzes");
        index
            .analyze("file:///a.pm", "sub one { 1; }\n", AnalysisMode::OnFileOpen, true, 100)
            .expect("analyzes");
        assert_eq!(index.decls_for("file:///a.pm").expect("present").len(), 1);
    }
}
