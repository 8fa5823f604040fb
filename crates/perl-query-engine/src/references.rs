//! `textDocument/references` and `textDocument/documentHighlight`.

use perl_tree::{Node, SyntaxTree};
use perl_workspace_index::WorkspaceIndex;

use crate::scope::{is_variable_node, visible_variables};
use crate::{node_range, Location};

fn by_start_position(a: &Node<'_>, b: &Node<'_>) -> std::cmp::Ordering {
    a.start_position().row.cmp(&b.start_position().row).then(a.start_position().column.cmp(&b.start_position().column))
}

/// Every reference to the symbol at `node`.
///
/// For a variable: as [`crate::definition::definition`] but without
/// uniquification — every visible occurrence with matching text, in
/// document order (this naturally includes occurrences both before and
/// after the cursor).
///
/// For a function/method: every call site recorded under that name, plus
/// its declaration(s). When `only_current_file` is set, only `uri`'s own
/// entries in `refsByUri`/`declsByUri` are consulted; otherwise every
/// indexed URI is.
pub fn references(
    tree: &SyntaxTree,
    node: Node<'_>,
    uri: &str,
    index: &WorkspaceIndex,
    only_current_file: bool,
) -> Vec<Location> {
    if is_variable_node(node.kind()) {
        let name = tree.node_text(&node);
        let mut visible = visible_variables(tree, node);
        visible.sort_by(by_start_position);
        return visible
            .into_iter()
            .filter(|candidate| tree.node_text(candidate) == name)
            .map(|found| Location::new(uri, node_range(&found)))
            .collect();
    }

    function_references(tree, node, uri, index, only_current_file)
}

fn function_references(
    tree: &SyntaxTree,
    node: Node<'_>,
    uri: &str,
    index: &WorkspaceIndex,
    only_current_file: bool,
) -> Vec<Location> {
    let name = tree.node_text(&node).to_string();
    let mut out = Vec::new();

    if only_current_file {
        if let Some(refs) = index.refs_for(uri) {
            if let Some(sites) = refs.get(&name) {
                out.extend(sites.iter().map(|r| Location::new(r.uri.clone(), r.position)));
            }
        }
        if let Some(decls) = index.decls_for(uri) {
            out.extend(decls.iter().filter(|d| d.function_name == name).map(|d| Location::new(d.uri.clone(), d.position)));
        }
        return out;
    }

    for (_, refs) in index.refs_by_uri() {
        if let Some(sites) = refs.get(&name) {
            out.extend(sites.iter().map(|r| Location::new(r.uri.clone(), r.position)));
        }
    }
    for (_, decls) in index.decls_by_uri() {
        out.extend(decls.iter().filter(|d| d.function_name == name).map(|d| Location::new(d.uri.clone(), d.position)));
    }
    out
}

/// `textDocument/documentHighlight`: references restricted to the current
/// file, rendered as read-kind highlights. Every highlight is a plain
/// "read" occurrence — the grammar doesn't distinguish lvalue writes from
/// reads at the node-kind level.
pub fn document_highlight(tree: &SyntaxTree, node: Node<'_>, uri: &str, index: &WorkspaceIndex) -> Vec<Location> {
    references(tree, node, uri, index, true)
}
