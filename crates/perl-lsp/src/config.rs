//! Settings pulled from `workspace/configuration` under the `perl.*` key,
//! plus the `GLOB_PATTERN` environment override.

use perl_query_engine::completion::FunctionCallStyle;
use perl_workspace_index::CachingStrategy;

/// Shape of an import auto-synthesized for completion resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStyle {
    /// `use Pkg;`.
    Full,
    /// `use Pkg qw( fn );`.
    FunctionOnly,
}

/// Runtime settings for the LSP server, updated from `workspace/configuration`
/// responses and `workspace/didChangeConfiguration` notifications.
#[derive(Debug, Clone)]
pub struct Settings {
    /// `perl.showAllErrors`: enables a full-file diagnostic walk rather than
    /// a capped one.
    pub show_all_errors: bool,
    /// `perl.maxNumberOfProblems`: workspace-wide diagnostic cap.
    pub max_number_of_problems: usize,
    /// `perl.caching`: tree retention policy.
    pub caching: CachingStrategy,
    /// `perl.importStyle`: shape of a synthesized auto-import.
    pub import_style: ImportStyle,
    /// `perl.functionCallStyle`: completion label form.
    pub function_call_style: FunctionCallStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_all_errors: false,
            max_number_of_problems: 100,
            caching: CachingStrategy::Eager,
            import_style: ImportStyle::FunctionOnly,
            function_call_style: FunctionCallStyle::PackageNameFunctionName,
        }
    }
}

impl Settings {
    /// Merge the `perl.*` settings out of a `workspace/configuration`
    /// response value. Unknown or missing keys leave the current value
    /// untouched.
    pub fn update_from_value(&mut self, settings: &serde_json::Value) {
        if let Some(b) = settings.get("showAllErrors").and_then(|v| v.as_bool()) {
            self.show_all_errors = b;
        }
        if let Some(n) = settings.get("maxNumberOfProblems").and_then(|v| v.as_u64()) {
            self.max_number_of_problems = n as usize;
        }
        if let Some(s) = settings.get("caching").and_then(|v| v.as_str()) {
            if let Some(strategy) = CachingStrategy::from_setting(s) {
                self.caching = strategy;
            }
        }
        if let Some(s) = settings.get("importStyle").and_then(|v| v.as_str()) {
            self.import_style = match s {
                "Full" => ImportStyle::Full,
                "Function Only" => ImportStyle::FunctionOnly,
                _ => self.import_style,
            };
        }
        if let Some(s) = settings.get("functionCallStyle").and_then(|v| v.as_str()) {
            self.function_call_style = match s {
                "packageName+functionName" => FunctionCallStyle::PackageNameFunctionName,
                "functionName only" => FunctionCallStyle::FunctionNameOnly,
                _ => self.function_call_style,
            };
        }
    }
}

/// The default glob pattern used for the initial workspace scan,
/// overridable by `GLOB_PATTERN`.
pub const DEFAULT_GLOB_PATTERN: &str = "**/*@(.pl|.pm|.t|.esp)";

/// The effective glob pattern: `GLOB_PATTERN` if set, else the default.
pub fn effective_glob_pattern() -> String {
    std::env::var("GLOB_PATTERN").unwrap_or_else(|_| DEFAULT_GLOB_PATTERN.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_eager_caching_with_function_only_imports() {
        let settings = Settings::default();
        assert!(!settings.show_all_errors);
        assert_eq!(settings.max_number_of_problems, 100);
        assert_eq!(settings.caching, CachingStrategy::Eager);
        assert_eq!(settings.import_style, ImportStyle::FunctionOnly);
        assert_eq!(settings.function_call_style, FunctionCallStyle::PackageNameFunctionName);
    }

    #[test]
    fn updates_recognized_keys_only() {
        let mut settings = Settings::default();
        settings.update_from_value(&serde_json::json!({
            "showAllErrors": true,
            "maxNumberOfProblems": 50,
            "caching": "full",
            "importStyle": "Full",
            "functionCallStyle": "functionName only",
            "unknownKey": 1,
        }));
        assert!(settings.show_all_errors);
        assert_eq!(settings.max_number_of_problems, 50);
        assert_eq!(settings.caching, CachingStrategy::Full);
        assert_eq!(settings.import_style, ImportStyle::Full);
        assert_eq!(settings.function_call_style, FunctionCallStyle::FunctionNameOnly);
    }

    #[test]
    fn unknown_enum_values_leave_current_setting_untouched() {
        let mut settings = Settings::default();
        settings.update_from_value(&serde_json::json!({ "caching": "bogus" }));
        assert_eq!(settings.caching, CachingStrategy::Eager);
    }
}
