//! Human and machine readable reports over a set of results.

use crate::run::ComparisonResult;
use serde::Serialize;
use std::fmt::Write as _;

/// Results of a comparison, with pass/fail counts.
#[derive(Debug, Clone, Serialize)]
pub struct ParityReport {
    /// Number of checks on which every factor agreed.
    pub passed: usize,
    /// Number of checks with at least one disagreement.
    pub failed: usize,
    /// Every result, in check order.
    pub results: Vec<ComparisonResult>,
}

impl ParityReport {
    /// Build a report from results.
    pub fn new(results: Vec<ComparisonResult>) -> Self {
        let passed = results.iter().filter(|r| r.ok).count();
        Self {
            passed,
            failed: results.len() - passed,
            results,
        }
    }

    /// Total number of checks.
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Returns true if every check agreed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Disagreeing results only.
    pub fn failures(&self) -> impl Iterator<Item = &ComparisonResult> {
        self.results.iter().filter(|r| !r.ok)
    }

    /// Format a summary string.
    pub fn summary(&self) -> String {
        format!(
            "{} ok, {} not ok (total: {})",
            self.passed,
            self.failed,
            self.total()
        )
    }

    /// One line per check; disagreeing checks are followed by each factor's
    /// name and value.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for result in &self.results {
            if result.ok {
                let _ = writeln!(out, "{} ok", result.message);
                continue;
            }
            let _ = writeln!(out, "{} NOT OK!", result.message);
            for run in &result.runs {
                let _ = writeln!(out, "  {}", run.name);
                let _ = writeln!(out, "    {}", run.value);
            }
        }
        let _ = writeln!(out, "{}", self.summary());
        out
    }

    /// Pretty-printed JSON of the whole report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::RunValue;
    use serde_json::json;

    fn result(ok: bool, message: &str, values: [i64; 2]) -> ComparisonResult {
        ComparisonResult {
            ok,
            message: message.to_string(),
            runs: values
                .iter()
                .enumerate()
                .map(|(i, v)| RunValue {
                    name: format!("Case {}", i + 1),
                    value: json!(v),
                })
                .collect(),
        }
    }

    #[test]
    fn test_counts_and_summary() {
        let report = ParityReport::new(vec![
            result(true, "a", [1, 1]),
            result(false, "b", [1, 2]),
            result(true, "c", [3, 3]),
        ]);
        assert_eq!(report.passed, 2);
        assert_eq!(report.failed, 1);
        assert!(!report.all_passed());
        assert_eq!(report.summary(), "2 ok, 1 not ok (total: 3)");
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn test_render_text() {
        let report = ParityReport::new(vec![result(true, "a", [1, 1]), result(false, "b", [1, 2])]);
        let text = report.render_text();
        assert_eq!(
            text,
            "a ok\nb NOT OK!\n  Case 1\n    1\n  Case 2\n    2\n1 ok, 1 not ok (total: 2)\n"
        );
    }

    #[test]
    fn test_to_json() {
        let report = ParityReport::new(vec![result(false, "b", [1, 2])]);
        let parsed: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed["failed"], json!(1));
        assert_eq!(parsed["results"][0]["runs"][1]["value"], json!(2));
    }
}
