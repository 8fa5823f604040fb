//! Import synthesis: merging an auto-import into a file's existing
//! `use`/`no` statements and re-emitting them in canonical order.

use perl_tree::{kinds, Node, SyntaxTree};

use crate::{node_range, TextEdit};

/// Whether an existing import covers the whole package (`use Pkg;`) or only
/// a named subset of its subroutines (`use Pkg qw( a b );`).
#[derive(Debug, Clone, PartialEq, Eq)]
enum ImportKind {
    Full,
    FunctionOnly(Vec<String>),
}

struct ExistingImport<'a> {
    node: Node<'a>,
    package: String,
    kind: ImportKind,
}

fn parse_qw_list(text: &str) -> Vec<String> {
    text.trim_start_matches("qw").trim().trim_matches(|c: char| "(){}[]<>/".contains(c)).split_whitespace().map(str::to_string).collect()
}

fn collect_existing_imports<'a>(tree: &'a SyntaxTree) -> Vec<ExistingImport<'a>> {
    let mut out = Vec::new();
    tree.walk(|node| {
        if node.kind() != kinds::USE_NO_STATEMENT {
            return;
        }
        let mut package = None;
        let mut functions = None;
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            if child.kind() == kinds::BAREWORD_IMPORT {
                package = Some(tree.node_text(&child).to_string());
            } else if child.kind() == kinds::WORD_LIST_QW {
                functions = Some(parse_qw_list(tree.node_text(&child)));
            }
        }
        if let Some(package) = package {
            let kind = match functions {
                Some(fns) => ImportKind::FunctionOnly(fns),
                None => ImportKind::Full,
            };
            out.push(ExistingImport { node, package, kind });
        }
    });
    out
}

fn render_full(package: &str) -> String {
    format!("use {};", package)
}

fn render_function_only(package: &str, functions: &[String]) -> String {
    format!("use {} qw( {} );", package, functions.join(" "))
}

fn dedup_sorted(functions: &mut Vec<String>) {
    functions.sort();
    functions.dedup();
}

const PRAGMA_PACKAGES: [&str; 2] = ["strict", "warnings"];

/// Synthesize the single replacement edit that merges an auto-import of
/// `target_function` from `target_package` into `tree`'s existing imports,
/// re-emitting everything in canonical order. Returns `None` if the file
/// has no existing `use`/`no` statements to anchor a replacement range on —
/// the facade falls back to inserting at the top of the file in that case.
pub fn synthesize_import(tree: &SyntaxTree, target_package: &str, target_function: &str) -> Option<TextEdit> {
    let mut imports = collect_existing_imports(tree);
    if imports.is_empty() {
        return None;
    }

    // The replacement range is anchored on the imports that existed before
    // this call — a newly synthesized standalone entry (below) has no node
    // of its own and must not expand it.
    let range_start = imports.iter().min_by_key(|i| i.node.start_byte()).expect("non-empty").node;
    let last_node = imports.iter().max_by_key(|i| i.node.end_byte()).expect("non-empty").node;

    let already_covered = imports.iter().any(|i| i.package == target_package && matches!(i.kind, ImportKind::Full));
    if !already_covered {
        if let Some(existing) = imports
            .iter_mut()
            .find(|i| i.package == target_package && matches!(i.kind, ImportKind::FunctionOnly(_)))
        {
            if let ImportKind::FunctionOnly(functions) = &mut existing.kind {
                functions.push(target_function.to_string());
                dedup_sorted(functions);
            }
        } else {
            // Synthesize a standalone entry; it participates in canonical
            // ordering below like any other existing import, but carries no
            // node of its own (it doesn't widen the replacement range).
            imports.push(ExistingImport {
                node: range_start,
                package: target_package.to_string(),
                kind: ImportKind::FunctionOnly(vec![target_function.to_string()]),
            });
        }
    }

    let mut pragma_full: Vec<String> = Vec::new();
    let mut pragma_functions: Vec<(String, Vec<String>)> = Vec::new();
    let mut other_full: Vec<String> = Vec::new();
    let mut other_functions: Vec<(String, Vec<String>)> = Vec::new();

    for import in &imports {
        let is_pragma = PRAGMA_PACKAGES.contains(&import.package.as_str());
        match &import.kind {
            ImportKind::Full => {
                if is_pragma {
                    pragma_full.push(import.package.clone());
                } else {
                    other_full.push(import.package.clone());
                }
            }
            ImportKind::FunctionOnly(functions) => {
                let mut functions = functions.clone();
                dedup_sorted(&mut functions);
                if is_pragma {
                    pragma_functions.push((import.package.clone(), functions));
                } else {
                    other_functions.push((import.package.clone(), functions));
                }
            }
        }
    }

    pragma_full.sort();
    other_full.sort();
    pragma_functions.sort_by(|a, b| a.0.cmp(&b.0));
    other_functions.sort_by(|a, b| a.0.cmp(&b.0));

    let mut groups: Vec<Vec<String>> = Vec::new();
    let pragma_lines: Vec<String> = pragma_full
        .iter()
        .map(|p| render_full(p))
        .chain(pragma_functions.iter().map(|(p, fs)| render_function_only(p, fs)))
        .collect();
    if !pragma_lines.is_empty() {
        groups.push(pragma_lines);
    }
    let other_full_lines: Vec<String> = other_full.iter().map(|p| render_full(p)).collect();
    if !other_full_lines.is_empty() {
        groups.push(other_full_lines);
    }
    let other_function_lines: Vec<String> = other_functions.iter().map(|(p, fs)| render_function_only(p, fs)).collect();
    if !other_function_lines.is_empty() {
        groups.push(other_function_lines);
    }

    let rendered = groups.iter().map(|g| g.join("\n")).collect::<Vec<_>>().join("\n\n");

    let range = perl_symbol_types::Range::new(node_range(&range_start).start, node_range(&last_node).end);
    Some(TextEdit::new(range, rendered))
}

#[cfg(test)]
mod tests {
    use super::*;
    use perl_tree::ParserHost;

    #[test]
    fn appends_a_new_function_only_import_when_package_absent() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("use strict;\nuse warnings;\n\ngreet();\n").expect("parses");
        let edit = synthesize_import(&tree, "Foo::Bar", "greet").expect("existing imports anchor the edit");
        assert!(edit.new_text.contains("use strict;"));
        assert!(edit.new_text.contains("use warnings;"));
        assert!(edit.new_text.contains("use Foo::Bar qw( greet );"));
    }

    #[test]
    fn merges_into_an_existing_function_only_import_sorted_and_deduped() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("use strict;\nuse Foo::Bar qw( zeta alpha );\n").expect("parses");
        let edit = synthesize_import(&tree, "Foo::Bar", "alpha").expect("existing imports anchor the edit");
        assert!(edit.new_text.contains("use Foo::Bar qw( alpha zeta );"));
    }

    #[test]
    fn no_existing_imports_yields_no_edit() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("greet();\n").expect("parses");
        assert!(synthesize_import(&tree, "Foo::Bar", "greet").is_none());
    }

    #[test]
    fn synthesis_is_idempotent_once_canonical() {
        let host = ParserHost::new().expect("grammar loads");
        let tree = host.parse("use strict;\nuse warnings;\n\nuse Foo::Bar qw( greet );\n").expect("parses");
        let edit = synthesize_import(&tree, "Foo::Bar", "greet").expect("existing imports anchor the edit");
        let reparsed = ParserHost::new().expect("grammar loads").parse(&edit.new_text).expect("re-parses");
        let second = synthesize_import(&reparsed, "Foo::Bar", "greet").expect("still anchored");
        assert_eq!(second.new_text, edit.new_text);
    }
}
