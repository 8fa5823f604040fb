//! `textDocument/definition`.

use perl_tree::{Node, SyntaxTree};
use perl_workspace_index::WorkspaceIndex;

use crate::scope::{is_variable_node, visible_variables};
use crate::{node_range, Location};

fn by_start_position(a: &Node<'_>, b: &Node<'_>) -> std::cmp::Ordering {
    a.start_position().row.cmp(&b.start_position().row).then(a.start_position().column.cmp(&b.start_position().column))
}

/// Resolve the definition of the node at a cursor.
///
/// For a variable node: compute the lexically visible variable set and
/// return the first occurrence — by document position — whose text equals
/// `node`'s text. At most one [`Location`].
///
/// For a function/method identifier: return every declaration across the
/// workspace whose `function_name` equals `node`'s text, in `declsByUri`
/// insertion order.
pub fn definition(tree: &SyntaxTree, node: Node<'_>, uri: &str, index: &WorkspaceIndex) -> Vec<Location> {
    if is_variable_node(node.kind()) {
        let name = tree.node_text(&node);
        let mut visible = visible_variables(tree, node);
        visible.sort_by(by_start_position);
        return visible
            .into_iter()
            .find(|candidate| tree.node_text(candidate) == name)
            .map(|found| vec![Location::new(uri, node_range(&found))])
            .unwrap_or_default();
    }

    let name = tree.node_text(&node);
    let mut out = Vec::new();
    for (decl_uri, decls) in index.decls_by_uri() {
        for decl in decls {
            if decl.function_name == name {
                out.push(Location::new(decl_uri.clone(), decl.position));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use perl_tree::{kinds, ParserHost};
    use perl_workspace_index::{AnalysisMode, CachingStrategy};

    fn index_with(entries: &[(&str, &str)]) -> WorkspaceIndex {
        let mut index = WorkspaceIndex::new(ParserHost::new().expect("grammar loads"), CachingStrategy::Eager);
        for (uri, text) in entries {
            index.analyze(uri, text, AnalysisMode::OnFileOpen, false, 0).expect("analyzes");
        }
        index
    }

    #[test]
    fn variable_definition_resolves_to_first_occurrence_in_scope() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("my $x = 1;\nprint $x;\n").expect("parses");
        let mut sites = Vec::new();
        tree.walk(|n| {
            if n.kind() == kinds::SCALAR_VARIABLE && tree.node_text(&n) == "$x" {
                sites.push(n);
            }
        });
        assert_eq!(sites.len(), 2);
        let index = index_with(&[]);
        let locs = definition(&tree, sites[1], "file:///a.pl", &index);
        assert_eq!(locs.len(), 1);
        assert_eq!(locs[0].range, node_range(&sites[0]));
    }

    #[test]
    fn function_definition_spans_every_declaring_uri_in_insertion_order() {
        let index = index_with(&[("file:///a.pm", "sub greet { 1; }\n"), ("file:///b.pm", "sub greet { 2; }\n")]);
        let host = ParserHost::new().expect("grammar loads");
        let call_tree = host.parse("greet();\n").expect("parses");
        let mut name_node = None;
        call_tree.walk(|n| {
            if kinds::is_call_site_kind(n.kind()) {
                name_node = crate::calls::call_site_name_node(&n);
            }
        });
        let name_node = name_node.expect("call site found");
        let locs = definition(&call_tree, name_node, "file:///c.pl", &index);
        assert_eq!(locs.len(), 2);
        assert_eq!(locs[0].uri, "file:///a.pm");
        assert_eq!(locs[1].uri, "file:///b.pm");
    }
}
