//! Result calculation for one aligned check.

use crate::comparator::Comparator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One factor's value inside a [`ComparisonResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunValue {
    /// Factor name.
    pub name: String,
    /// Value the factor reported.
    pub value: Value,
}

/// Agreement outcome for one alignment key across all factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// True iff every adjacent pair of factors agreed.
    pub ok: bool,
    /// Message of the check.
    pub message: String,
    /// Every factor's value, in factor declaration order.
    pub runs: Vec<RunValue>,
}

impl ComparisonResult {
    /// Names of the factors, in declaration order.
    pub fn factor_names(&self) -> impl Iterator<Item = &str> {
        self.runs.iter().map(|r| r.name.as_str())
    }
}

/// Chain-compare `values` in factor order.
///
/// Adjacent pairs `(v0, v1), (v1, v2), ...` are checked with
/// `comparator.compare(later, earlier)`, stopping at the first failure. All
/// values are kept in `runs` either way. Because only adjacent pairs are
/// checked, a non-transitive comparator makes the outcome depend on factor
/// order; that is the caller's responsibility.
///
/// `names` and `values` are expected to have the same length.
pub fn compute_result(
    message: impl Into<String>,
    names: &[String],
    values: Vec<Value>,
    comparator: &Comparator,
) -> ComparisonResult {
    debug_assert_eq!(names.len(), values.len());

    let ok = values
        .windows(2)
        .all(|pair| comparator.compare(&pair[1], &pair[0]));

    let runs = names
        .iter()
        .zip(values)
        .map(|(name, value)| RunValue {
            name: name.clone(),
            value,
        })
        .collect();

    ComparisonResult {
        ok,
        message: message.into(),
        runs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn names(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("F{i}")).collect()
    }

    #[test]
    fn test_chaining_fails_on_last_pair() {
        let result = compute_result(
            "chain",
            &names(3),
            vec![json!(1), json!(1), json!(2)],
            &Comparator::deep_equal(),
        );
        assert!(!result.ok);
        assert_eq!(result.runs.len(), 3);
        assert_eq!(result.runs[2].value, json!(2));
    }

    #[test]
    fn test_single_factor_is_ok() {
        let result = compute_result("one", &names(1), vec![json!("x")], &Comparator::default());
        assert!(result.ok);
        assert_eq!(result.factor_names().collect::<Vec<_>>(), vec!["F1"]);
    }

    #[test]
    fn test_short_circuits_after_first_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&calls);
        let cmp = Comparator::new("never", move |_, _| {
            counted.fetch_add(1, Ordering::SeqCst);
            false
        });
        let result = compute_result("sc", &names(4), vec![json!(1); 4], &cmp);
        assert!(!result.ok);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.runs.len(), 4);
    }

    #[test]
    fn test_argument_order_is_later_then_earlier() {
        let cmp = Comparator::new("gt", |a, b| a.as_i64() > b.as_i64());
        let result = compute_result("asc", &names(3), vec![json!(1), json!(2), json!(3)], &cmp);
        assert!(result.ok);

        let descending = compute_result("desc", &names(2), vec![json!(2), json!(1)], &cmp);
        assert!(!descending.ok);
    }
}
