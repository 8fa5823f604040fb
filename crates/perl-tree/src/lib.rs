//! Parser host: owns the tree-sitter Perl language handle, parses source
//! text into a [`SyntaxTree`], and exposes the tree-walk helpers the rest of
//! the workspace needs without leaking raw `tree_sitter` types past this
//! crate's boundary.
//!
//! A single language handle is initialized once per [`ParserHost`]; callers
//! are expected to construct exactly one host at startup and share it (the
//! host is `Clone` and cheap to clone — `tree_sitter::Parser` owns no shared
//! state with the language handle it wraps).

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

pub mod kinds;

use std::sync::Arc;
use tree_sitter::{Node, Parser, Tree};

/// Re-exported so downstream crates (the query engine, the LSP facade) can
/// name tree-sitter node types without taking a direct `tree-sitter`
/// dependency of their own.
pub use tree_sitter::{Node, Point};

/// Errors that can occur while constructing a parser or parsing text.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The tree-sitter language handle could not be loaded into a parser.
    #[error("failed to initialize tree-sitter Perl grammar: {0}")]
    LanguageInit(#[from] tree_sitter::LanguageError),
    /// tree-sitter failed to produce any tree at all (cancelled/timeout).
    #[error("tree-sitter produced no tree for the given input")]
    NoTree,
}

/// Owns the compiled tree-sitter Perl grammar and produces [`SyntaxTree`]s.
///
/// Construction performs the one-time language initialization: a single
/// language handle is initialized once at startup, and this must complete
/// before any analyzer or LSP request is serviced. Callers should construct
/// a `ParserHost` during process startup and propagate construction failure
/// as a fatal error.
#[derive(Clone)]
pub struct ParserHost {
    language: tree_sitter::Language,
}

impl ParserHost {
    /// Initialize the Perl grammar. This is the only fallible step; every
    /// subsequent parse is synchronous and deterministic.
    pub fn new() -> Result<Self, ParseError> {
        let language = tree_sitter_perl::LANGUAGE.into();
        // Fail fast if the grammar can't be loaded into a fresh parser —
        // this surfaces ABI mismatches at startup rather than at first parse.
        let mut probe = Parser::new();
        probe.set_language(&language)?;
        Ok(Self { language })
    }

    fn parser(&self) -> Result<Parser, ParseError> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    /// Parse `text` into a fresh [`SyntaxTree`].
    ///
    /// Parsing is synchronous and deterministic: the same text always
    /// produces a structurally identical tree.
    pub fn parse(&self, text: &str) -> Result<SyntaxTree, ParseError> {
        let mut parser = self.parser()?;
        let tree = parser.parse(text, None).ok_or(ParseError::NoTree)?;
        Ok(SyntaxTree { tree: Arc::new(tree), text: Arc::from(text) })
    }
}

/// An opaque parse tree, owned by the workspace index per URI.
///
/// `SyntaxTree` is cheap to clone (`Arc`-backed): [`copy`](SyntaxTree::copy)
/// and `Clone::clone` are equivalent, matching the `copy(tree) → SyntaxTree`
/// contract of the parser host. Dropping the last clone frees the
/// underlying tree-sitter tree.
#[derive(Clone)]
pub struct SyntaxTree {
    tree: Arc<Tree>,
    text: Arc<str>,
}

impl SyntaxTree {
    /// The root node of the tree.
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// The source text this tree was parsed from.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The text spanned by `node`.
    pub fn node_text<'a>(&'a self, node: &Node<'a>) -> &'a str {
        node.utf8_text(self.text.as_bytes()).unwrap_or("")
    }

    /// True if the tree contains any ERROR or MISSING node.
    pub fn has_error(&self) -> bool {
        self.root().has_error()
    }

    /// Clone the tree handle; semantically identical to [`Clone::clone`].
    pub fn copy(&self) -> SyntaxTree {
        self.clone()
    }

    /// Depth-first pre-order walk over every descendant of the root,
    /// including the root itself, invoking `visit` for each node.
    pub fn walk(&self, mut visit: impl FnMut(Node<'_>)) {
        let mut cursor = self.root().walk();
        loop {
            visit(cursor.node());
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }

    /// Short-circuiting error/missing-node walk: descends into a node only
    /// if it `has_error() || is_missing()`, for the syntactic diagnostic
    /// pass over the tree.
    pub fn walk_error_nodes(&self, mut visit: impl FnMut(Node<'_>)) {
        fn recurse<'a>(node: Node<'a>, visit: &mut impl FnMut(Node<'a>)) {
            if node.is_error() || node.is_missing() {
                visit(node);
            }
            if !node.has_error() {
                return;
            }
            let mut cursor = node.walk();
            for child in node.children(&mut cursor) {
                recurse(child, visit);
            }
        }
        recurse(self.root(), &mut visit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_trivial_package() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("package Foo::Bar;\nsub greet { return 1; }\n1;\n").expect("parses");
        assert!(!tree.has_error());
    }

    #[test]
    fn copy_shares_the_underlying_tree() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("my $x = 1;\n").expect("parses");
        let copy = tree.copy();
        assert_eq!(tree.text(), copy.text());
    }

    #[test]
    fn malformed_source_is_flagged_but_still_produces_a_tree() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("sub broken {\n").expect("parses even with errors");
        assert!(tree.has_error());
    }
}
