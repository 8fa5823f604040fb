//! `textDocument/hover`.

use perl_tree::{kinds, Node, SyntaxTree};

fn variable_kind_label(kind: &str) -> &'static str {
    match kind {
        kinds::SCALAR_VARIABLE | kinds::SPECIAL_SCALAR_VARIABLE => "scalar",
        kinds::ARRAY_VARIABLE => "array",
        kinds::HASH_VARIABLE => "hash",
        kinds::TYPEGLOB => "glob",
        _ => "variable",
    }
}

/// Hover text for the node at a cursor, or `None` if `node` isn't a symbol
/// hover applies to.
///
/// A variable renders as `my «text»; # «kind»`; a function identifier under
/// a call expression renders as `sub «call text»; # function` — the two
/// fixed hover shapes this query produces.
pub fn hover(tree: &SyntaxTree, node: Node<'_>) -> Option<String> {
    if kinds::is_variable_kind(node.kind()) {
        let text = tree.node_text(&node);
        return Some(format!("my {}; # {}", text, variable_kind_label(node.kind())));
    }

    let parent = node.parent()?;
    if parent.kind() == kinds::FUNCTION_DEFINITION || kinds::is_call_site_kind(parent.kind()) {
        return Some(format!("sub {}; # function", tree.node_text(&parent)));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use perl_tree::ParserHost;

    #[test]
    fn scalar_variable_hover() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("my $x = 1;\n").expect("parses");
        let mut node = None;
        tree.walk(|n| {
            if n.kind() == kinds::SCALAR_VARIABLE {
                node = Some(n);
            }
        });
        let text = hover(&tree, node.expect("variable present")).expect("hover text");
        assert_eq!(text, "my $x; # scalar");
    }

    #[test]
    fn function_call_hover_names_the_call_expression() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("greet();\n").expect("parses");
        let mut node = None;
        tree.walk(|n| {
            if kinds::is_call_site_kind(n.kind()) {
                node = crate::calls::call_site_name_node(&n);
            }
        });
        let text = hover(&tree, node.expect("call site present")).expect("hover text");
        assert!(text.starts_with("sub "));
        assert!(text.ends_with("; # function"));
    }

    #[test]
    fn non_symbol_node_has_no_hover() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("package Foo;\n").expect("parses");
        let text = hover(&tree, tree.root());
        assert!(text.is_none());
    }
}
