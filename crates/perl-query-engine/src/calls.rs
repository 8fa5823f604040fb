//! Shared call-site node helpers, mirroring the extraction logic in
//! `perl-symbol-extractor` so the query engine locates the same name node a
//! declaration or reference was recorded under.

use perl_tree::{kinds, Node};

/// The name node for a call-site node: field `function_name` on the node
/// itself, or on its first child if the node carries none directly.
pub fn call_site_name_node<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    if let Some(n) = node.child_by_field_name(kinds::FIELD_FUNCTION_NAME) {
        return Some(n);
    }
    let first_child = node.child(0)?;
    first_child.child_by_field_name(kinds::FIELD_FUNCTION_NAME)
}

/// True if `node` sits at a function/method call site or a declaration
/// name, i.e. it's a node `rename`/`references` should treat as a function
/// identifier rather than rejecting outright.
pub fn is_function_name_site(node: &Node<'_>) -> bool {
    if let Some(parent) = node.parent() {
        if parent.kind() == kinds::FUNCTION_DEFINITION {
            return parent.child_by_field_name(kinds::FIELD_NAME).is_some_and(|n| n == *node);
        }
        if kinds::is_call_site_kind(parent.kind()) {
            return call_site_name_node(&parent).is_some_and(|n| n == *node);
        }
        // A bare call site's name field can also live one level further up
        // when the call node wraps an inner identifier node (mirrors
        // `call_site_name_node`'s "first child" fallback).
        if let Some(grandparent) = parent.parent() {
            if kinds::is_call_site_kind(grandparent.kind()) {
                return call_site_name_node(&grandparent).is_some_and(|n| n == *node);
            }
        }
    }
    false
}
