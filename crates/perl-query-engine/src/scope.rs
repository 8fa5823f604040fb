//! Variable lexical-scope resolution.
//!
//! A variable's visible scope is the set of `*_variable` nodes in the
//! outermost enclosing `block` of the query node, unioned with the
//! root-level variables of the file (a file with no enclosing block falls
//! back to root-level variables alone).

use perl_tree::{kinds, Node, SyntaxTree};

/// True if `kind` is one of the `$scalar`/`@array`/`%hash`/... variable kinds.
pub fn is_variable_node(kind: &str) -> bool {
    kind.ends_with("_variable")
}

/// Walk every ancestor of `node` and return the topmost one whose kind is
/// `block`, or `None` if `node` is never enclosed in a block (top-level
/// statements in a script with no braces at all).
fn outermost_enclosing_block<'a>(node: Node<'a>) -> Option<Node<'a>> {
    let mut outermost = None;
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if ancestor.kind() == kinds::BLOCK {
            outermost = Some(ancestor);
        }
        current = ancestor.parent();
    }
    outermost
}

/// Collect every `*_variable` node reachable from `node` without descending
/// into a nested `block` (unless `top` — the very first call for the
/// subtree root is allowed to walk through its own block boundary).
fn collect_variables<'a>(node: Node<'a>, top: bool, out: &mut Vec<Node<'a>>) {
    if is_variable_node(node.kind()) {
        out.push(node);
    }
    if node.kind() == kinds::BLOCK && !top {
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_variables(child, false, out);
    }
}

/// The set of variables visible at `node`: every `*_variable` in its
/// outermost enclosing block, unioned with every root-level variable of the
/// file. Order is document order (depth-first, as tree-sitter walks);
/// callers that need a specific ordering (e.g. "first occurrence") should
/// sort by start position themselves.
pub fn visible_variables<'a>(tree: &'a SyntaxTree, node: Node<'a>) -> Vec<Node<'a>> {
    let mut out = Vec::new();
    if let Some(block) = outermost_enclosing_block(node) {
        collect_variables(block, true, &mut out);
    }
    collect_variables(tree.root(), true, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use perl_tree::ParserHost;

    fn find_first<'a>(tree: &'a SyntaxTree, text: &str, kind: &str) -> Node<'a> {
        let mut found = None;
        tree.walk(|n| {
            if found.is_none() && n.kind() == kind && tree.node_text(&n) == text {
                found = Some(n);
            }
        });
        found.expect("node present")
    }

    #[test]
    fn inner_block_variable_resolves_within_its_block() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host
            .parse("my $outer = 1;\nsub f {\n    my $inner = 2;\n    print $inner;\n}\n")
            .expect("parses");
        let use_site = find_first(&tree, "$inner", kinds::SCALAR_VARIABLE);
        let visible = visible_variables(&tree, use_site);
        assert!(visible.iter().any(|n| tree.node_text(n) == "$inner"));
        assert!(visible.iter().any(|n| tree.node_text(n) == "$outer"));
    }

    #[test]
    fn root_level_variable_is_always_visible() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("my $x = 1;\nprint $x;\n").expect("parses");
        let use_site = find_first(&tree, "$x", kinds::SCALAR_VARIABLE);
        let visible = visible_variables(&tree, use_site);
        assert!(visible.iter().filter(|n| tree.node_text(n) == "$x").count() >= 2);
    }
}
