//! The `eager` / `full` tree caching strategies.

/// Client-selectable policy for how long parsed trees are retained in
/// `treesByUri`.
///
/// Declarations and references are retained for every analyzed URI
/// regardless of strategy (they are the cold cache); only tree retention
/// differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachingStrategy {
    /// Retain trees only for URIs currently open in the editor. Workspace
    /// scan parses are discarded after symbol extraction. Default.
    #[default]
    Eager,
    /// Retain trees for every analyzed URI.
    Full,
}

impl CachingStrategy {
    /// Parse the `perl.caching` setting value.
    pub fn from_setting(value: &str) -> Option<Self> {
        match value {
            "eager" => Some(Self::Eager),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    /// Whether a tree produced by a workspace-scan parse (as opposed to an
    /// explicit file-open) should be retained under this strategy.
    pub fn retains_scan_trees(self) -> bool {
        matches!(self, Self::Full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_strategy_is_eager() {
        assert_eq!(CachingStrategy::default(), CachingStrategy::Eager);
    }

    #[test]
    fn only_full_retains_scan_trees() {
        assert!(!CachingStrategy::Eager.retains_scan_trees());
        assert!(CachingStrategy::Full.retains_scan_trees());
    }

    #[test]
    fn parses_setting_values() {
        assert_eq!(CachingStrategy::from_setting("eager"), Some(CachingStrategy::Eager));
        assert_eq!(CachingStrategy::from_setting("full"), Some(CachingStrategy::Full));
        assert_eq!(CachingStrategy::from_setting("bogus"), None);
    }
}
