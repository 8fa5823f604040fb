//! The canonical index record: [`FunctionReference`] and the per-file
//! index shape it's aggregated into, plus the [`PackageName`] newtype.

use crate::Range;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A colon-separated Perl package identifier (e.g. `Foo::Bar`), or empty for
/// a top-level script with no enclosing `package` statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct PackageName(String);

impl PackageName {
    /// The empty package name used for top-level scripts.
    pub fn none() -> Self {
        Self(String::new())
    }

    /// Wrap a raw package identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// True if this is the empty (top-level) package name.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A declaration or call-site record: both use the same shape.
///
/// The `position` field is the range of the *name identifier* node, never
/// the enclosing construct (`sub NAME { ... }` → just `NAME`'s range).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionReference {
    /// The URI of the file this reference was extracted from.
    pub uri: String,
    /// The bare function/method name as written at this site.
    pub function_name: String,
    /// The innermost enclosing package at this position, or empty.
    pub package_name: PackageName,
    /// The range of the name identifier node.
    pub position: Range,
}

impl FunctionReference {
    /// Construct a new reference.
    pub fn new(
        uri: impl Into<String>,
        function_name: impl Into<String>,
        package_name: PackageName,
        position: Range,
    ) -> Self {
        Self { uri: uri.into(), function_name: function_name.into(), package_name, position }
    }

    /// The fully qualified name (`Pkg::name`), or the bare name if
    /// `package_name` is empty.
    pub fn qualified_name(&self) -> String {
        if self.package_name.is_empty() {
            self.function_name.clone()
        } else {
            format!("{}::{}", self.package_name, self.function_name)
        }
    }
}

/// Declarations and references extracted from a single file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerFileIndex {
    /// Ordered sequence of function/method declarations in this file.
    pub declarations: Vec<FunctionReference>,
    /// `functionName -> ordered call sites within this file`.
    pub references: IndexMap<String, Vec<FunctionReference>>,
}

impl PerFileIndex {
    /// An empty index, as produced for a file with no callable symbols.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a declaration, preserving insertion order.
    pub fn push_declaration(&mut self, decl: FunctionReference) {
        self.declarations.push(decl);
    }

    /// Record a call-site reference under its function name.
    pub fn push_reference(&mut self, reference: FunctionReference) {
        self.references.entry(reference.function_name.clone()).or_default().push(reference);
    }
}
