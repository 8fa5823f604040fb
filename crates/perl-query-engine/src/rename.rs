//! `textDocument/rename` and `textDocument/prepareRename`.

use indexmap::IndexMap;
use perl_tree::{Node, SyntaxTree};
use perl_workspace_index::WorkspaceIndex;

use perl_symbol_types::Range;

use crate::calls::is_function_name_site;
use crate::scope::is_variable_node;
use crate::{node_range, QueryError, TextEdit, WorkspaceEdit};

/// `textDocument/prepareRename`: the range and current text of the
/// identifier at `node`, regardless of whether it's ultimately renameable —
/// the editor uses this to show the in-place edit box. Rejection happens at
/// `rename` time.
pub fn prepare_rename(tree: &SyntaxTree, node: Node<'_>) -> (Range, String) {
    (node_range(&node), tree.node_text(&node).to_string())
}

/// Rename every occurrence of the symbol at `node` to `new_name`.
///
/// Variables rename within their visible scope (same set `references`
/// walks); functions rename every call site and declaration across the
/// workspace. A non-renameable node (anything that isn't a variable or a
/// recognized function/declaration name site) or an empty `new_name` is
/// rejected with [`QueryError::InvalidParams`].
pub fn rename(
    tree: &SyntaxTree,
    node: Node<'_>,
    uri: &str,
    index: &WorkspaceIndex,
    new_name: &str,
) -> Result<WorkspaceEdit, QueryError> {
    if new_name.is_empty() {
        return Err(QueryError::InvalidParams("new name must not be empty".to_string()));
    }

    if is_variable_node(node.kind()) {
        let name = tree.node_text(&node);
        let edits: Vec<TextEdit> = crate::scope::visible_variables(tree, node)
            .into_iter()
            .filter(|candidate| tree.node_text(candidate) == name)
            .map(|found| TextEdit::new(node_range(&found), new_name.to_string()))
            .collect();
        let mut changes = IndexMap::new();
        changes.insert(uri.to_string(), edits);
        return Ok(WorkspaceEdit { changes });
    }

    if !is_function_name_site(&node) {
        return Err(QueryError::InvalidParams(format!("node of kind \"{}\" is not renameable", node.kind())));
    }

    let name = tree.node_text(&node).to_string();
    let mut changes: IndexMap<String, Vec<TextEdit>> = IndexMap::new();
    for (ref_uri, refs) in index.refs_by_uri() {
        if let Some(sites) = refs.get(&name) {
            for site in sites {
                changes.entry(ref_uri.clone()).or_default().push(TextEdit::new(site.position, new_name.to_string()));
            }
        }
    }
    for (decl_uri, decls) in index.decls_by_uri() {
        for decl in decls.iter().filter(|d| d.function_name == name) {
            changes.entry(decl_uri.clone()).or_default().push(TextEdit::new(decl.position, new_name.to_string()));
        }
    }
    Ok(WorkspaceEdit { changes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use perl_tree::{kinds, ParserHost};
    use perl_workspace_index::{AnalysisMode, CachingStrategy};

    #[test]
    fn renaming_to_empty_string_is_rejected() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("my $x = 1;\n").expect("parses");
        let mut node = None;
        tree.walk(|n| {
            if n.kind() == kinds::SCALAR_VARIABLE {
                node = Some(n);
            }
        });
        let index = WorkspaceIndex::new(ParserHost::new().expect("grammar loads"), CachingStrategy::Eager);
        let err = rename(&tree, node.expect("variable present"), "file:///a.pl", &index, "").unwrap_err();
        assert_eq!(err, QueryError::InvalidParams("new name must not be empty".to_string()));
    }

    #[test]
    fn variable_rename_edits_every_visible_occurrence() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("my $x = 1;\nprint $x;\n").expect("parses");
        let mut sites = Vec::new();
        tree.walk(|n| {
            if n.kind() == kinds::SCALAR_VARIABLE && tree.node_text(&n) == "$x" {
                sites.push(n);
            }
        });
        let index = WorkspaceIndex::new(ParserHost::new().expect("grammar loads"), CachingStrategy::Eager);
        let edit = rename(&tree, sites[0], "file:///a.pl", &index, "y").expect("renames");
        assert_eq!(edit.changes["file:///a.pl"].len(), 2);
        assert!(edit.changes["file:///a.pl"].iter().all(|e| e.new_text == "y"));
    }

    #[test]
    fn function_rename_spans_declaration_and_call_sites() {
        let mut index = WorkspaceIndex::new(ParserHost::new().expect("grammar loads"), CachingStrategy::Eager);
        index.analyze("file:///a.pm", "sub greet { 1; }\n", AnalysisMode::OnFileOpen, false, 0).expect("analyzes");
        index.analyze("file:///b.pl", "greet();\n", AnalysisMode::OnFileOpen, false, 0).expect("analyzes");

        let host = ParserHost::new().expect("grammar loads");
        let decl_tree = host.parse("sub greet { 1; }\n").expect("parses");
        let mut decl_name = None;
        decl_tree.walk(|n| {
            if n.kind() == kinds::FUNCTION_DEFINITION {
                decl_name = n.child_by_field_name(kinds::FIELD_NAME);
            }
        });
        let decl_name = decl_name.expect("declaration name present");

        let edit = rename(&decl_tree, decl_name, "file:///a.pm", &index, "greeting").expect("renames");
        assert!(edit.changes.contains_key("file:///a.pm"));
        assert!(edit.changes.contains_key("file:///b.pl"));
    }

    #[test]
    fn non_renameable_node_is_rejected() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("package Foo;\n").expect("parses");
        let mut node = None;
        tree.walk(|n| {
            if n.kind() == kinds::PACKAGE_NAME {
                node = Some(n);
            }
        });
        let index = WorkspaceIndex::new(ParserHost::new().expect("grammar loads"), CachingStrategy::Eager);
        let err = rename(&tree, node.expect("package name present"), "file:///a.pm", &index, "Bar").unwrap_err();
        assert!(matches!(err, QueryError::InvalidParams(_)));
    }
}
