//! Persistence: Brotli-compressed serialization of the persisted
//! subset of the workspace index (`declsByUri`, `refsByUri`) to the
//! workspace sidecar file.
//!
//! The on-disk name is `function_map.zip` even though the payload is
//! Brotli-compressed JSON, not a ZIP archive — a preserved misnomer kept
//! verbatim for compatibility with existing workspace sidecars.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

use indexmap::IndexMap;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use perl_symbol_types::FunctionReference;
use serde::{Deserialize, Serialize};

/// The sidecar path segment under a workspace root: `.vscode/function_map.zip`.
pub const SIDECAR_RELATIVE_PATH: &str = ".vscode/function_map.zip";

/// Brotli compression quality. 9 balances size against latency for an
/// index that's rewritten once per workspace scan, not on a hot path.
const BROTLI_QUALITY: u32 = 9;
const BROTLI_LG_WINDOW_SIZE: u32 = 22;

/// The persisted subset of a `WorkspaceIndex`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedIndex {
    /// `uri -> declarations in that file`.
    #[serde(rename = "uriToFunctionDeclarations")]
    pub uri_to_function_declarations: IndexMap<String, Vec<FunctionReference>>,
    /// `uri -> functionName -> call sites in that file`.
    #[serde(rename = "functionReference")]
    pub function_reference: IndexMap<String, IndexMap<String, Vec<FunctionReference>>>,
}

impl PersistedIndex {
    /// Build a persisted snapshot from the two maps a `WorkspaceIndex`
    /// exposes. Takes ownership since this is called once, right before
    /// serialization.
    pub fn from_parts(
        decls_by_uri: IndexMap<String, Vec<FunctionReference>>,
        refs_by_uri: IndexMap<String, IndexMap<String, Vec<FunctionReference>>>,
    ) -> Self {
        Self { uri_to_function_declarations: decls_by_uri, function_reference: refs_by_uri }
    }

    /// Split back into the `(declsByUri, refsByUri)` shape
    /// `WorkspaceIndex::replace_persisted` expects.
    pub fn into_parts(
        self,
    ) -> (IndexMap<String, Vec<FunctionReference>>, IndexMap<String, IndexMap<String, Vec<FunctionReference>>>) {
        (self.uri_to_function_declarations, self.function_reference)
    }
}

/// Errors that can occur while loading a persisted index. Never fatal to
/// the caller: on any of these, the caller logs at info level and starts
/// with an empty index.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The sidecar file could not be read (including "doesn't exist yet").
    #[error("could not read {0}: {1}")]
    Read(PathBuf, #[source] std::io::Error),
    /// The sidecar file could not be written.
    #[error("could not write {0}: {1}")]
    Write(PathBuf, #[source] std::io::Error),
    /// Brotli decompression failed (corrupt or truncated file).
    #[error("brotli decompression failed: {0}")]
    Decompress(#[source] std::io::Error),
    /// The decompressed payload was not valid JSON for `PersistedIndex`.
    #[error("malformed index payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The sidecar path for `workspace_root`.
pub fn sidecar_path(workspace_root: &Path) -> PathBuf {
    workspace_root.join(SIDECAR_RELATIVE_PATH)
}

/// Serialize `index` to JSON, Brotli-compress it, and write it to
/// `<workspace_root>/.vscode/function_map.zip`, creating the `.vscode`
/// directory if needed.
pub fn save(workspace_root: &Path, index: &PersistedIndex) -> Result<(), PersistError> {
    let path = sidecar_path(workspace_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| PersistError::Write(path.clone(), e))?;
    }
    let json = serde_json::to_vec(index)?;
    let mut compressed = Vec::new();
    {
        let mut writer =
            brotli::CompressorWriter::new(&mut compressed, 4096, BROTLI_QUALITY, BROTLI_LG_WINDOW_SIZE);
        writer.write_all(&json).map_err(|e| PersistError::Write(path.clone(), e))?;
    }
    std::fs::write(&path, compressed).map_err(|e| PersistError::Write(path.clone(), e))
}

/// Load and decompress the sidecar at `<workspace_root>/.vscode/function_map.zip`.
///
/// Best-effort: any I/O or decode failure is surfaced as [`PersistError`];
/// the caller is expected to log it and proceed with an empty index rather
/// than treat it as fatal.
pub fn load(workspace_root: &Path) -> Result<PersistedIndex, PersistError> {
    let path = sidecar_path(workspace_root);
    let compressed = std::fs::read(&path).map_err(|e| PersistError::Read(path.clone(), e))?;
    let mut decompressed = Vec::new();
    brotli::Decompressor::new(compressed.as_slice(), 4096)
        .read_to_end(&mut decompressed)
        .map_err(PersistError::Decompress)?;
    let index = serde_json::from_slice(&decompressed)?;
    Ok(index)
}

/// True if a sidecar file exists at `workspace_root`, without attempting
/// to load it. Used by the facade to choose the "Indexing" vs
/// "Re-indexing" progress message before `load` is attempted.
pub fn sidecar_exists(workspace_root: &Path) -> bool {
    sidecar_path(workspace_root).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use perl_symbol_types::{PackageName, Position, Range};

    fn sample() -> PersistedIndex {
        let range = Range::new(Position::new(1, 4), Position::new(1, 9));
        let decl = FunctionReference::new("file:///a.pm", "greet", PackageName::new("Foo::Bar"), range);
        let mut uri_to_function_declarations = IndexMap::new();
        uri_to_function_declarations.insert("file:///a.pm".to_string(), vec![decl.clone()]);
        let mut fn_map = IndexMap::new();
        fn_map.insert("greet".to_string(), vec![decl]);
        let mut function_reference = IndexMap::new();
        function_reference.insert("file:///b.pl".to_string(), fn_map);
        PersistedIndex { uri_to_function_declarations, function_reference }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index = sample();
        save(dir.path(), &index).expect("saves");
        let loaded = load(dir.path()).expect("loads");
        assert_eq!(loaded, index);
    }

    #[test]
    fn sidecar_lands_at_the_legacy_zip_named_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        save(dir.path(), &sample()).expect("saves");
        assert!(dir.path().join(".vscode").join("function_map.zip").is_file());
    }

    #[test]
    fn load_of_missing_file_is_a_read_error_not_a_panic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load(dir.path()).expect_err("no sidecar yet");
        assert!(matches!(err, PersistError::Read(_, _)));
    }

    #[test]
    fn sidecar_exists_reflects_prior_save() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(!sidecar_exists(dir.path()));
        save(dir.path(), &sample()).expect("saves");
        assert!(sidecar_exists(dir.path()));
    }

    #[test]
    fn load_of_corrupt_file_is_a_decompress_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = sidecar_path(dir.path());
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, b"not brotli at all").expect("write garbage");
        let err = load(dir.path()).expect_err("garbage input");
        assert!(matches!(err, PersistError::Decompress(_)));
    }
}
