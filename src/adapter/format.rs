//! Failure formatters for disagreeing results.

use crate::comparator::deep_equal;
use crate::run::ComparisonResult;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// Renders a failing [`ComparisonResult`] into the message of the raised
/// failure.
pub trait FailureFormatter {
    /// Render `result`. Only called when `result.ok` is false.
    fn format(&self, result: &ComparisonResult) -> String;
}

impl<F> FailureFormatter for F
where
    F: Fn(&ComparisonResult) -> String,
{
    fn format(&self, result: &ComparisonResult) -> String {
        self(result)
    }
}

fn header(result: &ComparisonResult) -> String {
    format!("Comparison failed for\n'{}'", result.message)
}

/// Every factor's value as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDumpFormatter;

impl FailureFormatter for JsonDumpFormatter {
    fn format(&self, result: &ComparisonResult) -> String {
        let mut out = header(result);
        for run in &result.runs {
            let pretty =
                serde_json::to_string_pretty(&run.value).unwrap_or_else(|_| run.value.to_string());
            let _ = write!(out, "\n\nResult for {}\n{}", run.name, pretty);
        }
        out
    }
}

/// Per-path differences between each adjacent pair of factors whose values
/// are not structurally equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralDiffFormatter;

impl FailureFormatter for StructuralDiffFormatter {
    fn format(&self, result: &ComparisonResult) -> String {
        let mut out = header(result);
        let mut any = false;
        for pair in result.runs.windows(2) {
            let (left, right) = (&pair[0], &pair[1]);
            let diffs = diff_values(&left.value, &right.value);
            if diffs.is_empty() {
                continue;
            }
            any = true;
            let _ = write!(out, "\n\n{} -> {}:", left.name, right.name);
            for diff in diffs {
                let _ = write!(
                    out,
                    "\n  {}: {} != {}",
                    diff.path,
                    render(diff.left.as_ref()),
                    render(diff.right.as_ref())
                );
            }
        }
        if !any {
            out.push_str("\n\nValues are structurally equal but were rejected by the comparator.");
        }
        out
    }
}

fn render(value: Option<&Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "<missing>".to_string(),
    }
}

/// One differing location between two values.
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    /// JSONPath-like location, rooted at `$`.
    pub path: String,
    /// Left value, `None` if absent.
    pub left: Option<Value>,
    /// Right value, `None` if absent.
    pub right: Option<Value>,
}

/// Leaf-level differences between `a` and `b`, objects in key order.
pub fn diff_values(a: &Value, b: &Value) -> Vec<Difference> {
    let mut out = Vec::new();
    walk("$".to_string(), Some(a), Some(b), &mut out);
    out
}

fn walk(path: String, a: Option<&Value>, b: Option<&Value>, out: &mut Vec<Difference>) {
    match (a, b) {
        (Some(Value::Object(x)), Some(Value::Object(y))) => {
            let keys: BTreeSet<&String> = x.keys().chain(y.keys()).collect();
            for key in keys {
                walk(format!("{path}.{key}"), x.get(key), y.get(key), out);
            }
        }
        (Some(Value::Array(x)), Some(Value::Array(y))) => {
            for i in 0..x.len().max(y.len()) {
                walk(format!("{path}[{i}]"), x.get(i), y.get(i), out);
            }
        }
        (Some(x), Some(y)) if deep_equal(x, y) => {}
        (None, None) => {}
        _ => out.push(Difference {
            path,
            left: a.cloned(),
            right: b.cloned(),
        }),
    }
}
