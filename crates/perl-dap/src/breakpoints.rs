//! Breakpoint table: per-source-path replace semantics over the process
//! driver, with no AST involvement — verification is whatever `perl -d`
//! says back.

use std::collections::HashMap;

use crate::driver::{DriverError, PerlProcessDriver};
use crate::protocol::{Breakpoint, SourceBreakpoint};

const NOT_BREAKABLE_MESSAGE: &str = "Perl cannot set breakpoint here";

/// One recorded breakpoint: the line it was requested on, and the id
/// handed back to the client.
#[derive(Debug, Clone)]
struct Recorded {
    id: i64,
    line: i64,
}

/// Tracks, per source path, the breakpoints most recently set there.
#[derive(Debug, Default)]
pub struct BreakpointTable {
    by_path: HashMap<String, Vec<Recorded>>,
    next_id: i64,
}

impl BreakpointTable {
    pub fn new() -> Self {
        Self { by_path: HashMap::new(), next_id: 1 }
    }

    /// Replace every breakpoint previously recorded for `path`: clear them
    /// all via the process driver, then set `requested` in order, returning
    /// one `Breakpoint` per request in the same order.
    pub async fn set_breakpoints(
        &mut self,
        driver: &PerlProcessDriver,
        path: &str,
        requested: &[SourceBreakpoint],
    ) -> Result<Vec<Breakpoint>, DriverError> {
        if let Some(previous) = self.by_path.get(path) {
            let lines: Vec<u32> = previous.iter().map(|r| r.line as u32).collect();
            if !lines.is_empty() {
                driver.delete_breakpoints(&lines).await?;
            }
        }

        let mut recorded = Vec::with_capacity(requested.len());
        let mut results = Vec::with_capacity(requested.len());
        for bp in requested {
            let reply = driver.set_breakpoint(path, bp.line as u32, bp.condition.as_deref()).await?;
            let id = self.next_id;
            self.next_id += 1;
            if reply.contains("not breakable") {
                results.push(Breakpoint { id, verified: false, line: bp.line, message: Some(NOT_BREAKABLE_MESSAGE.to_string()) });
            } else {
                results.push(Breakpoint { id, verified: true, line: bp.line, message: None });
            }
            recorded.push(Recorded { id, line: bp.line });
        }

        self.by_path.insert(path.to_string(), recorded);
        Ok(results)
    }

    /// Whether `path:line` is a breakpoint this table currently knows about
    /// — used by the stop-on-entry heuristic.
    pub fn has_breakpoint_at(&self, path: &str, line: i64) -> bool {
        self.by_path.get(path).is_some_and(|bps| bps.iter().any(|bp| bp.line == line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_reports_no_breakpoint() {
        let table = BreakpointTable::new();
        assert!(!table.has_breakpoint_at("script.pl", 10));
    }

    #[test]
    fn next_id_starts_at_one() {
        let table = BreakpointTable::new();
        assert_eq!(table.next_id, 1);
    }

    #[test]
    fn has_breakpoint_at_reflects_inserted_records() {
        let mut table = BreakpointTable::new();
        table.by_path.insert("script.pl".to_string(), vec![Recorded { id: 1, line: 12 }, Recorded { id: 2, line: 20 }]);
        assert!(table.has_breakpoint_at("script.pl", 12));
        assert!(table.has_breakpoint_at("script.pl", 20));
        assert!(!table.has_breakpoint_at("script.pl", 13));
        assert!(!table.has_breakpoint_at("other.pl", 12));
    }
}
