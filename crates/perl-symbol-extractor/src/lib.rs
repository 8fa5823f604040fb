//! Symbol extraction: a single-pass visitor over a [`perl_tree::SyntaxTree`]
//! that produces the per-file [`PerFileIndex`] (declarations + references)
//! plus a list of syntactic diagnostics.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

use perl_symbol_types::{FunctionReference, PackageName, PerFileIndex, Position, Range};
use perl_tree::{kinds, SyntaxTree};
use tree_sitter::Node;

/// A syntactic diagnostic produced while walking the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Range of the offending node.
    pub range: Range,
    /// Human-readable message: either an error or a missing-node report.
    pub message: String,
}

/// Extract declarations, references, and diagnostics from `tree` for `uri`.
///
/// This is the whole job: `(uri, tree) -> (PerFileIndex, Vec<Diagnostic>)`.
/// Diagnostics beyond `max_diagnostics` are not collected (the caller is the
/// one that enforces `maxNumberOfProblems` workspace-wide — this function
/// accepts a local cap for when the facade asks for
/// `collectDiagnostics=false` by passing `0`).
pub fn extract(uri: &str, tree: &SyntaxTree, max_diagnostics: usize) -> (PerFileIndex, Vec<Diagnostic>) {
    let mut index = PerFileIndex::new();
    tree.walk(|node| {
        if !kinds::SYMBOL_EXTRACTION_KINDS.contains(&node.kind()) {
            return;
        }
        if node.kind() == kinds::FUNCTION_DEFINITION {
            if let Some(name_node) = node.child_by_field_name(kinds::FIELD_NAME) {
                let reference = build_reference(uri, tree, &name_node, &node);
                index.push_declaration(reference);
            }
        } else if let Some(name_node) = call_site_name_node(&node) {
            let reference = build_reference(uri, tree, &name_node, &node);
            index.push_reference(reference);
        }
    });

    let diagnostics = if max_diagnostics == 0 { Vec::new() } else { collect_diagnostics(tree, max_diagnostics) };

    (index, diagnostics)
}

/// The name node for a call-site node: field `function_name` on the node
/// itself, or on its first child if the node carries none directly.
fn call_site_name_node<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    if let Some(n) = node.child_by_field_name(kinds::FIELD_FUNCTION_NAME) {
        return Some(n);
    }
    let first_child = node.child(0)?;
    first_child.child_by_field_name(kinds::FIELD_FUNCTION_NAME)
}

fn build_reference(uri: &str, tree: &SyntaxTree, name_node: &Node<'_>, site: &Node<'_>) -> FunctionReference {
    let function_name = tree.node_text(name_node).to_string();
    let package_name = resolve_package_name(tree, site);
    FunctionReference::new(uri, function_name, package_name, to_range(name_node))
}

fn to_range(node: &Node<'_>) -> Range {
    let start = node.start_position();
    let end = node.end_position();
    Range::new(
        Position::new(start.row as u32, start.column as u32),
        Position::new(end.row as u32, end.column as u32),
    )
}

/// Walk ancestors of `node` until one contains `package_statement`
/// descendants that precede `node` in document order; take the last such
/// statement (nested packages allowed). Empty string if none is found
/// anywhere up to the root.
fn resolve_package_name(tree: &SyntaxTree, node: &Node<'_>) -> PackageName {
    let node_start = node.start_byte();
    let mut ancestor = node.parent();
    while let Some(current) = ancestor {
        if let Some(pkg) = last_preceding_package_statement(&current, node_start) {
            if let Some(name_node) = pkg.child_by_field_name(kinds::FIELD_PACKAGE_NAME) {
                return PackageName::new(tree.node_text(&name_node));
            }
        }
        ancestor = current.parent();
    }
    PackageName::none()
}

fn last_preceding_package_statement<'a>(ancestor: &Node<'a>, before_byte: usize) -> Option<Node<'a>> {
    let mut best: Option<Node<'a>> = None;
    let mut cursor = ancestor.walk();
    let mut stack = vec![*ancestor];
    while let Some(n) = stack.pop() {
        if n.kind() == kinds::PACKAGE_STATEMENT
            && n.start_byte() < before_byte
            && best.is_none_or(|b| n.start_byte() > b.start_byte())
        {
            best = Some(n);
        }
        for child in n.children(&mut cursor) {
            stack.push(child);
        }
    }
    best
}

/// Short-circuiting diagnostic walk: descends only into error/missing
/// subtrees, emitting one of the two fixed message shapes per node.
fn collect_diagnostics(tree: &SyntaxTree, max_diagnostics: usize) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    tree.walk_error_nodes(|node| {
        if out.len() >= max_diagnostics {
            return;
        }
        let message = if node.is_missing() {
            format!("Syntax error: expected \"{}\"", node.kind())
        } else {
            format!("Syntax Error near expression «{}»", tree.node_text(&node))
        };
        out.push(Diagnostic { range: to_range(&node), message });
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use perl_tree::ParserHost;

    fn index_for(src: &str) -> PerFileIndex {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse(src).expect("parses");
        extract("file:///a.pm", &tree, 100).0
    }

    #[test]
    fn extracts_declaration_with_package_scope() {
        let idx = index_for("package Foo::Bar;\nsub greet { return \"hi\"; }\n1;\n");
        assert_eq!(idx.declarations.len(), 1);
        let decl = &idx.declarations[0];
        assert_eq!(decl.function_name, "greet");
        assert_eq!(decl.package_name.as_ref(), "Foo::Bar");
    }

    #[test]
    fn resolves_qualified_call_site_to_unqualified_reference_key() {
        let idx = index_for("Foo::Bar::greet();\n");
        assert_eq!(idx.references["greet"].len(), 1);
    }

    #[test]
    fn no_package_statement_yields_empty_package_name() {
        let idx = index_for("sub helper { 1; }\n");
        assert_eq!(idx.declarations[0].package_name.as_ref(), "");
    }

    #[test]
    fn diagnostics_collected_for_malformed_source() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("sub broken {\n").expect("parses with errors");
        let (_, diags) = extract("file:///bad.pl", &tree, 100);
        assert!(!diags.is_empty());
    }

    #[test]
    fn max_diagnostics_zero_disables_collection() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("sub broken {\n").expect("parses with errors");
        let (_, diags) = extract("file:///bad.pl", &tree, 0);
        assert!(diags.is_empty());
    }
}
