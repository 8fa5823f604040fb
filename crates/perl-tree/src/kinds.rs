//! Named constants for the tree-sitter Perl node kinds and field names the
//! rest of the workspace consumes. Centralizing these avoids typos in the
//! string literals scattered across the symbol extractor and query engine.

/// A subroutine declaration: `sub name { ... }`.
pub const FUNCTION_DEFINITION: &str = "function_definition";
/// `name(args)`.
pub const CALL_WITH_ARGS_WITH_BRACKETS: &str = "call_expression_with_args_with_brackets";
/// `name args` (no parens, no brackets either side).
pub const CALL_WITH_ARGS_WITHOUT_BRACKETS: &str = "call_expression_with_args_without_brackets";
/// `name $scalar` style indirect-object-ish call.
pub const CALL_WITH_VARIABLE: &str = "call_expression_with_variable";
/// `name (args)` with a space before the parenthesis.
pub const CALL_WITH_SPACED_ARGS: &str = "call_expression_with_spaced_args";
/// Recursive/self call forms.
pub const CALL_RECURSIVE: &str = "call_expression_recursive";
/// `$obj->method(...)`.
pub const METHOD_INVOCATION: &str = "method_invocation";
/// `package Foo::Bar;`.
pub const PACKAGE_STATEMENT: &str = "package_statement";
/// The `Foo::Bar` identifier inside a package statement.
pub const PACKAGE_NAME: &str = "package_name";
/// `use Module ...;` / `no Module ...;`.
pub const USE_NO_STATEMENT: &str = "use_no_statement";
/// `use if ...;`.
pub const USE_NO_IF_STATEMENT: &str = "use_no_if_statement";
/// A bareword module name inside a use/no statement.
pub const BAREWORD_IMPORT: &str = "bareword_import";
/// `use subs ...;`.
pub const USE_NO_SUBS_STATEMENT: &str = "use_no_subs_statement";
/// `use feature ...;`.
pub const USE_NO_FEATURE_STATEMENT: &str = "use_no_feature_statement";
/// A version literal inside a use statement (`use v5.36;`).
pub const USE_NO_VERSION: &str = "use_no_version";
/// `qw(...)` word list.
pub const WORD_LIST_QW: &str = "word_list_qw";
/// `$scalar`.
pub const SCALAR_VARIABLE: &str = "scalar_variable";
/// `@array`.
pub const ARRAY_VARIABLE: &str = "array_variable";
/// `%hash`.
pub const HASH_VARIABLE: &str = "hash_variable";
/// `$_`, `$@`, `$!`, etc.
pub const SPECIAL_SCALAR_VARIABLE: &str = "special_scalar_variable";
/// `*glob`.
pub const TYPEGLOB: &str = "typeglob";
/// A `{ ... }` block.
pub const BLOCK: &str = "block";
/// `my`/`our`/`local` declaration scope keyword.
pub const SCOPE: &str = "scope";

/// Node kinds visited by the symbol extractor's single pass.
pub const SYMBOL_EXTRACTION_KINDS: &[&str] = &[
    FUNCTION_DEFINITION,
    CALL_WITH_ARGS_WITH_BRACKETS,
    CALL_WITH_ARGS_WITHOUT_BRACKETS,
    CALL_WITH_VARIABLE,
    CALL_WITH_SPACED_ARGS,
    CALL_RECURSIVE,
    METHOD_INVOCATION,
];

/// Field name carrying the declared name on a `function_definition`.
pub const FIELD_NAME: &str = "name";
/// Field name carrying the called function's identifier on call-site nodes.
pub const FIELD_FUNCTION_NAME: &str = "function_name";
/// Field name carrying the package identifier on a `package_statement`.
pub const FIELD_PACKAGE_NAME: &str = "package_name";

/// True if `kind` is one of the `*_variable` node kinds used throughout the
/// query engine's "treat as variable" branch.
pub fn is_variable_kind(kind: &str) -> bool {
    kind.ends_with("_variable")
}

/// True if `kind` is one of the call-site node kinds the symbol extractor
/// visits (everything in [`SYMBOL_EXTRACTION_KINDS`] except the declaration
/// kind itself).
pub fn is_call_site_kind(kind: &str) -> bool {
    matches!(
        kind,
        CALL_WITH_ARGS_WITH_BRACKETS
            | CALL_WITH_ARGS_WITHOUT_BRACKETS
            | CALL_WITH_VARIABLE
            | CALL_WITH_SPACED_ARGS
            | CALL_RECURSIVE
            | METHOD_INVOCATION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_kind_detection() {
        assert!(is_variable_kind(SCALAR_VARIABLE));
        assert!(is_variable_kind(ARRAY_VARIABLE));
        assert!(is_variable_kind(HASH_VARIABLE));
        assert!(!is_variable_kind(FUNCTION_DEFINITION));
    }

    #[test]
    fn call_site_kind_detection() {
        assert!(is_call_site_kind(METHOD_INVOCATION));
        assert!(!is_call_site_kind(FUNCTION_DEFINITION));
    }
}
