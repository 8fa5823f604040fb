//! Workspace file discovery for the initial workspace scan, using a
//! `WalkDir` fallback rather than a full glob/extglob engine.
//!
//! The default pattern (`**/*@(.pl|.pm|.t|.esp)`) and its
//! `GLOB_PATTERN`-overridden form are both "any extension in one
//! alternation group, anywhere under the workspace root" — there's no true
//! glob/extglob engine in the dependency graph, so rather than adding one we
//! extract the `@(...)` alternation group's pipe-separated extensions and
//! walk the tree filtering on them. This is a deliberate simplification of
//! the general glob pattern space (it doesn't support arbitrary
//! brace/char-class syntax), not a compatibility layer for every pattern
//! `GLOB_PATTERN` could theoretically hold.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Directory names a workspace scan never descends into.
const SKIP_DIRS: [&str; 5] = [".git", ".hg", ".svn", "target", "node_modules"];

/// Extract the dot-prefixed extensions named inside a pattern's `@(...)`
/// alternation group (e.g. `@(.pl|.pm|.t|.esp)` -> `["pl", "pm", "t",
/// "esp"]`). Falls back to the default extension set if the pattern carries
/// no such group.
pub fn extensions_from_pattern(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find("@(") else {
        return default_extensions();
    };
    let Some(close_rel) = pattern[open + 2..].find(')') else {
        return default_extensions();
    };
    let body = &pattern[open + 2..open + 2 + close_rel];
    let exts: Vec<String> = body.split('|').map(|s| s.trim_start_matches('.').to_string()).filter(|s| !s.is_empty()).collect();
    if exts.is_empty() {
        default_extensions()
    } else {
        exts
    }
}

fn default_extensions() -> Vec<String> {
    vec!["pl".to_string(), "pm".to_string(), "t".to_string(), "esp".to_string()]
}

fn should_skip_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry.file_name().to_str().is_some_and(|name| SKIP_DIRS.contains(&name))
}

fn has_matching_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension().and_then(|e| e.to_str()).is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

/// Enumerate every file under `root` whose extension appears in `pattern`'s
/// `@(...)` group, skipping well-known non-source directories.
pub fn discover_files(root: &Path, pattern: &str) -> Vec<PathBuf> {
    let extensions = extensions_from_pattern(pattern);
    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !should_skip_dir(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && has_matching_extension(e.path(), &extensions))
        .map(|e| e.path().to_path_buf())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn extracts_extensions_from_default_pattern() {
        let exts = extensions_from_pattern("**/*@(.pl|.pm|.t|.esp)");
        assert_eq!(exts, vec!["pl", "pm", "t", "esp"]);
    }

    #[test]
    fn falls_back_to_default_when_pattern_has_no_alternation_group() {
        let exts = extensions_from_pattern("**/*.pl");
        assert_eq!(exts, default_extensions());
    }

    #[test]
    fn discovers_matching_files_and_skips_git_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("a.pm"), "package A;\n").expect("write");
        fs::write(dir.path().join("README.md"), "# hi\n").expect("write");
        let git_dir = dir.path().join(".git");
        fs::create_dir(&git_dir).expect("mkdir");
        fs::write(git_dir.join("b.pm"), "package B;\n").expect("write");

        let files = discover_files(dir.path(), "**/*@(.pl|.pm|.t|.esp)");
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.pm"));
    }
}
