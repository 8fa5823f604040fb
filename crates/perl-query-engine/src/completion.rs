//! `textDocument/completion`.

use std::collections::HashSet;

use perl_tree::{kinds, Node, SyntaxTree};
use perl_workspace_index::WorkspaceIndex;

use crate::scope::visible_variables;

/// The kind of symbol a completion item names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionItemKind {
    /// An in-scope `$`/`@`/`%` variable.
    Variable,
    /// A package name, offered while typing a `use`/method-call prefix.
    Package,
    /// A subroutine/method name.
    Function,
}

/// A single completion candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    /// The text shown in the completion list.
    pub label: String,
    /// The text actually inserted on acceptance.
    pub insert_text: String,
    /// What kind of symbol this candidate names.
    pub kind: CompletionItemKind,
    /// Supplementary detail (the fully qualified name for a function item).
    pub detail: Option<String>,
}

/// How a function call is rendered in this file's convention — bare
/// (`greet()`) or package-qualified (`Pkg::greet()`). Drives whether
/// completion labels are stripped to the bare name or left qualified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionCallStyle {
    /// `Pkg::name(...)`.
    PackageNameFunctionName,
    /// `name(...)`.
    FunctionNameOnly,
}

/// True if completions should be suppressed entirely because the token
/// immediately preceding the cursor is a scope keyword (`my`/`our`/`local`)
/// — a bare scope keyword offers no useful completion since no sigil has
/// been typed yet.
pub fn is_suppressed_by_preceding_scope_keyword(preceding: Option<Node<'_>>) -> bool {
    preceding.is_some_and(|n| n.kind() == kinds::SCOPE)
}

/// Variable completions: the unique set of in-scope variables by text,
/// visible at `node`.
pub fn variable_completions(tree: &SyntaxTree, node: Node<'_>) -> Vec<CompletionItem> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for candidate in visible_variables(tree, node) {
        let text = tree.node_text(&candidate).to_string();
        if seen.insert(text.clone()) {
            out.push(CompletionItem { label: text.clone(), insert_text: text, kind: CompletionItemKind::Variable, detail: None });
        }
    }
    out
}

/// Package and function completions for a typed prefix.
///
/// Packages: one candidate per indexed URI whose first declaration's
/// package name case-insensitively contains `typed`; the inserted text is
/// just the package name inside a `use` statement, or `Pkg::` elsewhere (so
/// typing continues straight into the function name).
///
/// Functions: every declaration across the workspace whose name
/// case-insensitively contains `typed`, with the current file's own
/// declarations sorted ahead of every other file's. The label is the
/// qualified name (`Pkg::name`), stripped to the bare name when
/// `call_style` is [`FunctionCallStyle::FunctionNameOnly`].
pub fn identifier_completions(
    index: &WorkspaceIndex,
    current_uri: &str,
    typed: &str,
    in_use_statement: bool,
    call_style: FunctionCallStyle,
) -> Vec<CompletionItem> {
    let needle = typed.to_lowercase();
    let mut out = Vec::new();

    for decls in index.decls_by_uri().values() {
        let Some(first) = decls.first() else { continue };
        let pkg = first.package_name.as_ref();
        if pkg.is_empty() || !pkg.to_lowercase().contains(&needle) {
            continue;
        }
        let insert_text = if in_use_statement { pkg.to_string() } else { format!("{}::", pkg) };
        out.push(CompletionItem { label: pkg.to_string(), insert_text, kind: CompletionItemKind::Package, detail: None });
    }

    let mut current_file = Vec::new();
    let mut other_files = Vec::new();
    for (uri, decls) in index.decls_by_uri() {
        for decl in decls {
            if !decl.function_name.to_lowercase().contains(&needle) {
                continue;
            }
            let label = match call_style {
                FunctionCallStyle::FunctionNameOnly => decl.function_name.clone(),
                FunctionCallStyle::PackageNameFunctionName => decl.qualified_name(),
            };
            let item = CompletionItem {
                label,
                insert_text: format!("{}()", decl.function_name),
                kind: CompletionItemKind::Function,
                detail: Some(decl.qualified_name()),
            };
            if uri == current_uri {
                current_file.push(item);
            } else {
                other_files.push(item);
            }
        }
    }
    out.extend(current_file);
    out.extend(other_files);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use perl_tree::ParserHost;
    use perl_workspace_index::{AnalysisMode, CachingStrategy};

    #[test]
    fn variable_completions_dedupe_by_text() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("my $x = 1;\nprint $x;\n").expect("parses");
        let mut node = None;
        tree.walk(|n| {
            if n.kind() == kinds::SCALAR_VARIABLE {
                node = Some(n);
            }
        });
        let items = variable_completions(&tree, node.expect("variable present"));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].label, "$x");
    }

    #[test]
    fn function_completions_rank_current_file_first() {
        let mut index = WorkspaceIndex::new(ParserHost::new().expect("grammar loads"), CachingStrategy::Eager);
        index.analyze("file:///other.pm", "sub greeting { 1; }\n", AnalysisMode::OnFileOpen, false, 0).expect("analyzes");
        index.analyze("file:///here.pl", "sub greet { 1; }\n", AnalysisMode::OnFileOpen, false, 0).expect("analyzes");
        let items =
            identifier_completions(&index, "file:///here.pl", "gree", false, FunctionCallStyle::FunctionNameOnly);
        let functions: Vec<_> = items.iter().filter(|i| i.kind == CompletionItemKind::Function).collect();
        assert_eq!(functions[0].label, "greet");
    }

    #[test]
    fn scope_keyword_suppresses_completion() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("my $x = 1;\n").expect("parses");
        let mut scope_node = None;
        tree.walk(|n| {
            if n.kind() == kinds::SCOPE {
                scope_node = Some(n);
            }
        });
        assert!(is_suppressed_by_preceding_scope_keyword(scope_node));
        assert!(!is_suppressed_by_preceding_scope_keyword(None));
    }
}
