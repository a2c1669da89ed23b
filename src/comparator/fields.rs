//! Field-aware comparators built on top of [`deep_equal`].
//!
//! Useful when factors legitimately differ in some fields, e.g. generated
//! ids or timestamps taken at slightly different moments.

use super::{deep_equal, Comparator};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

/// Fields treated as dates by default.
pub const DEFAULT_DATE_FIELDS: [&str; 3] = ["created", "updated", "date"];

/// Default skew tolerated between two dates, in milliseconds.
pub const DEFAULT_DATE_TOLERANCE_MS: i64 = 10_000;

/// `|a - b| <= tolerance`.
pub fn approximately_equal(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// An object split into named fields and everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    /// The requested fields that were present.
    pub fields: Map<String, Value>,
    /// The value with those fields removed.
    pub rest: Value,
}

/// Split the named top-level fields out of `value`.
///
/// Non-object values have nothing to extract and are returned whole as
/// `rest`.
pub fn extract_fields<S: AsRef<str>>(value: &Value, fields: &[S]) -> ExtractedFields {
    match value {
        Value::Object(map) => {
            let mut rest = map.clone();
            let mut extracted = Map::new();
            for field in fields {
                if let Some(v) = rest.remove(field.as_ref()) {
                    extracted.insert(field.as_ref().to_string(), v);
                }
            }
            ExtractedFields {
                fields: extracted,
                rest: Value::Object(rest),
            }
        }
        other => ExtractedFields {
            fields: Map::new(),
            rest: other.clone(),
        },
    }
}

/// Deep equality after dropping `fields` from both sides.
pub fn ignore_fields<I, S>(fields: I) -> Comparator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
    let label = format!("ignore_fields({})", fields.join(","));
    Comparator::new(label, move |a, b| {
        deep_equal(
            &extract_fields(a, &fields).rest,
            &extract_fields(b, &fields).rest,
        )
    })
}

/// Deep equality on everything except `fields`, which must hold dates no
/// more than `tolerance` apart.
///
/// Dates are RFC 3339 strings or epoch milliseconds. A field missing on both
/// sides agrees; missing on one side, or unparseable, disagrees. The sign of
/// `tolerance` is ignored.
pub fn with_date_fields<I, S>(fields: I, tolerance: Duration) -> Comparator
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
    let tolerance_ms = tolerance.num_milliseconds().unsigned_abs();
    let label = format!("with_date_fields({}; {}ms)", fields.join(","), tolerance_ms);
    Comparator::new(label, move |a, b| {
        let ax = extract_fields(a, &fields);
        let bx = extract_fields(b, &fields);
        if !deep_equal(&ax.rest, &bx.rest) {
            return false;
        }
        fields.iter().all(|field| {
            match (ax.fields.get(field), bx.fields.get(field)) {
                (None, None) => true,
                (Some(x), Some(y)) => match (epoch_millis(x), epoch_millis(y)) {
                    (Some(x), Some(y)) => x.abs_diff(y) <= tolerance_ms,
                    _ => false,
                },
                _ => false,
            }
        })
    })
}

fn epoch_millis(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|d| d.timestamp_millis())
            .or_else(|_| s.parse::<DateTime<Utc>>().map(|d| d.timestamp_millis()))
            .ok(),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(float_millis)),
        _ => None,
    }
}

// Floats outside the i64 range would saturate and compare equal.
fn float_millis(f: f64) -> Option<i64> {
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}
