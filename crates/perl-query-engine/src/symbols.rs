//! `textDocument/documentSymbol` and `workspace/symbol`.

use perl_symbol_types::Range;
use perl_workspace_index::WorkspaceIndex;

/// One function/method symbol in a single file's outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSymbol {
    /// The bare function name.
    pub name: String,
    /// The range of the declaration's name identifier.
    pub range: Range,
}

/// One workspace-wide symbol match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolInformation {
    /// The bare function name.
    pub name: String,
    /// The declaring file.
    pub uri: String,
    /// The range of the declaration's name identifier.
    pub range: Range,
}

/// `textDocument/documentSymbol`: every declaration recorded for `uri`, in
/// `declsByUri` document order.
pub fn document_symbols(index: &WorkspaceIndex, uri: &str) -> Vec<DocumentSymbol> {
    index
        .decls_for(uri)
        .map(|decls| decls.iter().map(|d| DocumentSymbol { name: d.function_name.clone(), range: d.position }).collect())
        .unwrap_or_default()
}

/// `workspace/symbol`: every declaration across the workspace whose name
/// case-insensitively contains `query`. An empty query matches nothing —
/// the facade is expected to skip the round-trip entirely in that case, but
/// this function is defensive about it regardless.
pub fn workspace_symbols(index: &WorkspaceIndex, query: &str) -> Vec<SymbolInformation> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    let mut out = Vec::new();
    for (uri, decls) in index.decls_by_uri() {
        for decl in decls {
            if decl.function_name.to_lowercase().contains(&needle) {
                out.push(SymbolInformation { name: decl.function_name.clone(), uri: uri.clone(), range: decl.position });
            }
        }
    }
    out
}
