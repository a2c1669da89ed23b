//! Comparator policy.
//!
//! A comparator is a two-argument predicate over two opaque values. The
//! default is deep structural equality; callers may supply their own per
//! session or per check.
//!
//! - [`fields`] - comparators that exclude fields or tolerate date skew

pub mod fields;

pub use fields::{
    approximately_equal, extract_fields, ignore_fields, with_date_fields, ExtractedFields,
    DEFAULT_DATE_FIELDS, DEFAULT_DATE_TOLERANCE_MS,
};

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type CompareFn = dyn Fn(&Value, &Value) -> bool + Send + Sync;

/// A pluggable equality policy.
///
/// Cheap to clone; the predicate is shared. The engine calls it as
/// `compare(later, earlier)` for each adjacent pair of factors.
#[derive(Clone)]
pub struct Comparator {
    label: Arc<str>,
    func: Arc<CompareFn>,
}

impl Comparator {
    /// Wrap a predicate under a label used in diagnostics.
    pub fn new<F>(label: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self {
            label: Arc::from(label.into()),
            func: Arc::new(func),
        }
    }

    /// Deep structural equality (see [`deep_equal`]).
    pub fn deep_equal() -> Self {
        Self::new("deep_equal", deep_equal)
    }

    /// Numbers agree within `tolerance`; anything else falls back to deep
    /// equality.
    pub fn tolerance(tolerance: f64) -> Self {
        Self::new(format!("tolerance({tolerance})"), move |a, b| {
            match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => approximately_equal(x, y, tolerance),
                _ => deep_equal(a, b),
            }
        })
    }

    /// Evaluate the predicate.
    pub fn compare(&self, a: &Value, b: &Value) -> bool {
        (self.func)(a, b)
    }

    /// Label given at construction.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for Comparator {
    fn default() -> Self {
        Self::deep_equal()
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Comparator").field(&self.label).finish()
    }
}

/// Structural equality over JSON values.
///
/// Objects are equal when they have the same key set and equal values
/// (key order is irrelevant), arrays element-wise, and numbers by numeric
/// value, so `1` equals `1.0`.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                x == y
            } else if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                x == y
            } else {
                x.as_f64() == y.as_f64()
            }
        }
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| deep_equal(x, y)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_equal_nested() {
        let a = json!({"a": [1, {"b": "c"}], "d": null});
        let b = json!({"d": null, "a": [1, {"b": "c"}]});
        assert!(deep_equal(&a, &b));

        let c = json!({"a": [1, {"b": "x"}], "d": null});
        assert!(!deep_equal(&a, &c));
    }

    #[test]
    fn test_deep_equal_numbers_by_value() {
        assert!(deep_equal(&json!(1), &json!(1.0)));
        assert!(!deep_equal(&json!(1), &json!(2)));
        assert!(!deep_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn test_deep_equal_extra_key() {
        assert!(!deep_equal(&json!({"a": 1}), &json!({"a": 1, "b": 2})));
        assert!(!deep_equal(&json!([1, 2]), &json!([1, 2, 3])));
    }

    #[test]
    fn test_tolerance_comparator() {
        let within_one = Comparator::tolerance(1.0);
        assert!(within_one.compare(&json!(1), &json!(2)));
        assert!(!within_one.compare(&json!(1), &json!(3)));
        assert!(within_one.compare(&json!("x"), &json!("x")));
        assert!(!within_one.compare(&json!("x"), &json!(1)));
    }

    #[test]
    fn test_custom_comparator_label() {
        let always = Comparator::new("always", |_, _| true);
        assert_eq!(always.label(), "always");
        assert!(always.compare(&json!(1), &json!("anything")));
        assert_eq!(format!("{:?}", always), "Comparator(\"always\")");
    }
}
