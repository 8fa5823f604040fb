//! Diagnostic conversion and the workspace-wide `maxNumberOfProblems`
//! cap-tracking logic applied during a workspace scan.

use perl_symbol_extractor::Diagnostic as EngineDiagnostic;

use crate::convert::range_to_lsp;

/// Convert an engine [`EngineDiagnostic`] into the wire
/// `lsp_types::Diagnostic`.
pub fn diagnostic_to_lsp(text: &str, diagnostic: &EngineDiagnostic) -> lsp_types::Diagnostic {
    lsp_types::Diagnostic {
        range: range_to_lsp(text, diagnostic.range),
        severity: Some(lsp_types::DiagnosticSeverity::ERROR),
        code: None,
        code_description: None,
        source: Some("perl-lsp".to_string()),
        message: diagnostic.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

/// Tracks the cumulative diagnostic count across a workspace scan: once the
/// running total exceeds `max`, later files are analyzed with
/// `collectDiagnostics=false`.
#[derive(Debug, Clone)]
pub struct ProblemsCounter {
    max: usize,
    seen: usize,
}

impl ProblemsCounter {
    /// Construct a counter capped at `max` (the `perl.maxNumberOfProblems`
    /// setting).
    pub fn new(max: usize) -> Self {
        Self { max, seen: 0 }
    }

    /// Whether diagnostics should still be collected for the next file,
    /// given everything counted so far.
    pub fn should_collect(&self) -> bool {
        self.seen <= self.max
    }

    /// Record `count` newly produced diagnostics.
    pub fn record(&mut self, count: usize) {
        self.seen += count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_collecting_once_the_cap_is_exceeded() {
        let mut counter = ProblemsCounter::new(5);
        assert!(counter.should_collect());
        counter.record(6);
        assert!(!counter.should_collect());
    }

    #[test]
    fn exactly_at_the_cap_still_collects() {
        let mut counter = ProblemsCounter::new(5);
        counter.record(5);
        assert!(counter.should_collect());
    }
}
