//! Query engine: pure functions over a [`perl_workspace_index::WorkspaceIndex`]
//! and a single file's [`perl_tree::SyntaxTree`] — no I/O, no mutation of the
//! index, no knowledge of LSP wire types.
//!
//! Every function here takes the tree-sitter node the caller has already
//! resolved from a cursor position (via `Node::descendant_for_point_range`
//! or equivalent) and returns plain data: [`Location`]s, [`TextEdit`]s, or
//! strings. The LSP facade is responsible for translating these into
//! protocol types and for resolving a client position into the node this
//! crate's functions expect.

#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]
#![warn(missing_docs)]

mod calls;
pub mod completion;
pub mod definition;
pub mod hover;
pub mod imports;
pub mod references;
pub mod rename;
pub mod scope;
pub mod symbols;

use indexmap::IndexMap;
use perl_symbol_types::{Position, Range};

/// Convert a tree-sitter node's span into our internal [`Range`].
pub(crate) fn node_range(node: &perl_tree::Node<'_>) -> Range {
    let start = node.start_position();
    let end = node.end_position();
    Range::new(Position::new(start.row as u32, start.column as u32), Position::new(end.row as u32, end.column as u32))
}

/// A location within a single file: the URI it belongs to, and the range
/// inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// The URI of the containing file.
    pub uri: String,
    /// The range within that file.
    pub range: Range,
}

impl Location {
    /// Construct a location.
    pub fn new(uri: impl Into<String>, range: Range) -> Self {
        Self { uri: uri.into(), range }
    }
}

/// A single textual replacement within one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// The range to replace.
    pub range: Range,
    /// The text to replace it with.
    pub new_text: String,
}

impl TextEdit {
    /// Construct a text edit.
    pub fn new(range: Range, new_text: impl Into<String>) -> Self {
        Self { range, new_text: new_text.into() }
    }
}

/// A set of edits spanning one or more files, keyed by URI in the order the
/// edits were discovered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceEdit {
    /// `uri -> edits in that file`.
    pub changes: IndexMap<String, Vec<TextEdit>>,
}

/// Errors a query can fail with. A malformed request (renaming a
/// non-renameable node, an empty new name) is reported as `InvalidParams`
/// rather than panicking or silently no-op'ing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    /// The request's parameters were invalid for the node it targets.
    #[error("invalid params: {0}")]
    InvalidParams(String),
}
