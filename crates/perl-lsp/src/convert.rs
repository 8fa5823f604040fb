//! Internal `Position`/`Range`/`Location` (UTF-8 byte columns, tree-sitter
//! style) to wire `lsp_types` (UTF-16 code units) conversion, and node
//! resolution from a client-supplied cursor position.
//!
//! `perl_symbol_types::Position` stores a tree-sitter byte column, not a
//! UTF-16 code unit count, so every outgoing position goes through a byte
//! offset first: `row_col_to_byte_offset` to get there, then
//! `WirePosition::from_byte_offset` to render it in UTF-16. Incoming
//! positions travel the reverse path via `WirePosition::to_byte_offset`.

use perl_position_tracking::{row_col_to_byte_offset, WireLocation, WirePosition, WireRange};
use perl_query_engine::Location as EngineLocation;
use perl_symbol_types::{Position as InternalPosition, Range as InternalRange};
use perl_tree::{Node, Point};

/// Convert an internal position (tree-sitter byte column) to an LSP
/// position (UTF-16 code units), given the source text it was computed
/// against.
pub fn position_to_lsp(text: &str, position: InternalPosition) -> lsp_types::Position {
    let offset = row_col_to_byte_offset(text, position.row, position.column);
    WirePosition::from_byte_offset(text, offset).into()
}

/// Convert an internal range to an LSP range.
pub fn range_to_lsp(text: &str, range: InternalRange) -> lsp_types::Range {
    lsp_types::Range { start: position_to_lsp(text, range.start), end: position_to_lsp(text, range.end) }
}

/// Convert an engine [`Location`](EngineLocation) — whose range was computed
/// against `text`, the text of `location.uri` — to an LSP `Location`.
pub fn location_to_lsp(text: &str, location: &EngineLocation) -> lsp_types::Location {
    let start = WirePosition::from(position_to_lsp(text, location.range.start));
    let end = WirePosition::from(position_to_lsp(text, location.range.end));
    WireLocation::new(location.uri.clone(), WireRange::new(start, end)).into()
}

/// Convert a tree-sitter node's span (computed against `text`) directly to
/// an LSP range, for call sites that have a `Node` but no
/// [`InternalRange`] of their own (e.g. hover).
pub fn node_range_to_lsp(text: &str, node: &Node<'_>) -> lsp_types::Range {
    let start = node.start_position();
    let end = node.end_position();
    let range = InternalRange::new(
        InternalPosition::new(start.row as u32, start.column as u32),
        InternalPosition::new(end.row as u32, end.column as u32),
    );
    range_to_lsp(text, range)
}

/// Convert an LSP position (UTF-16) into a byte offset within `text`.
pub fn lsp_position_to_byte_offset(text: &str, position: lsp_types::Position) -> usize {
    WirePosition::new(position.line, position.character).to_byte_offset(text)
}

/// Resolve the tree-sitter node a client cursor position refers to.
///
/// LSP cursor positions sit *between* characters; when the cursor is
/// immediately after an identifier (the common case right after typing),
/// probing one byte earlier finds the identifier itself rather than
/// whatever follows it. Of the two candidates, the one with the smaller
/// byte span is preferred as the more specific (leaf-like) match.
pub fn node_at_position<'a>(tree: &'a perl_tree::SyntaxTree, text: &str, position: lsp_types::Position) -> Node<'a> {
    let offset = lsp_position_to_byte_offset(text, position);
    let point = byte_offset_to_point(text, offset);
    let at_cursor = tree.root().descendant_for_point_range(point, point);

    if offset == 0 {
        return at_cursor.unwrap_or_else(|| tree.root());
    }
    let before_point = byte_offset_to_point(text, offset - 1);
    let before_cursor = tree.root().descendant_for_point_range(before_point, before_point);

    match (at_cursor, before_cursor) {
        (Some(a), Some(b)) => {
            if node_span(&b) < node_span(&a) {
                b
            } else {
                a
            }
        }
        (Some(a), None) => a,
        (None, Some(b)) => b,
        (None, None) => tree.root(),
    }
}

fn node_span(node: &Node<'_>) -> usize {
    node.end_byte() - node.start_byte()
}

fn byte_offset_to_point(text: &str, offset: usize) -> Point {
    let offset = offset.min(text.len());
    let preceding = &text[..offset];
    let row = preceding.matches('\n').count();
    let line_start = preceding.rfind('\n').map(|i| i + 1).unwrap_or(0);
    Point::new(row, offset - line_start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use perl_tree::ParserHost;

    #[test]
    fn position_round_trips_through_lsp() {
        let text = "my $x = 1;\nprint $x;\n";
        let internal = InternalPosition::new(1, 6);
        let lsp = position_to_lsp(text, internal);
        assert_eq!(lsp.line, 1);
        assert_eq!(lsp.character, 6);
    }

    #[test]
    fn node_at_position_prefers_identifier_just_before_cursor() {
        let host = ParserHost::new().expect("grammar loads");
        let text = "my $x = 1;\n";
        let tree = host.parse(text).expect("parses");
        let node = node_at_position(&tree, text, lsp_types::Position { line: 0, character: 5 });
        assert_eq!(tree.node_text(&node), "$x");
    }
}
