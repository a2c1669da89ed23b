//! Error handling for comparison sessions.
//!
//! Only structural misuse is an error here. A disagreement between factors is
//! an ordinary [`ComparisonResult`] with `ok == false`; it becomes an error
//! solely through the adapter layer, which wraps it in a
//! [`ComparisonAssertionError`].

use crate::run::{AlignmentKey, ComparisonResult};
use thiserror::Error;

/// Result type for all fallible operations in this crate.
pub type ParityResult<T> = Result<T, ParityError>;

/// Errors raised by the broker, the driver and the adapter layer.
#[derive(Debug, Error)]
pub enum ParityError {
    /// A session or broker was created without any factors.
    #[error("at least one factor is required")]
    NoFactors,

    /// A check was routed to a factor index outside the factor list.
    #[error("factor index {index} is out of range ({count} factors declared)")]
    UnknownFactor {
        /// Offending index.
        index: usize,
        /// Number of declared factors.
        count: usize,
    },

    /// A result was requested before every factor reported the key.
    #[error("check '{key}' is incomplete, still waiting on: {}", .missing.join(", "))]
    IncompleteRun {
        /// Key that was requested.
        key: AlignmentKey,
        /// Names of the factors that have not reported it yet.
        missing: Vec<String>,
    },

    /// The same factor reported the same alignment key twice.
    #[error("factor '{factor}' reported check '{key}' more than once")]
    DuplicateCheck {
        /// Factor name.
        factor: String,
        /// Duplicated key.
        key: AlignmentKey,
    },

    /// A check was emitted, or the broker read, while an eager result was
    /// being delivered.
    #[error("session accessed from inside its own result subscriber")]
    Reentrant,

    /// A value handed to `compare` could not be turned into JSON.
    #[error("value for check '{message}' could not be encoded: {source}")]
    Encode {
        /// Message of the check being emitted.
        message: String,
        /// Underlying serializer error.
        #[source]
        source: serde_json::Error,
    },

    /// Factors disagreed and the caller opted into fail-fast reporting.
    #[error(transparent)]
    Assertion(#[from] ComparisonAssertionError),

    /// I/O error while reading recorded runs.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Recorded runs were not valid JSON of the expected shape.
    #[error("invalid run file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Raised by the adapter layer when a completed check disagrees.
///
/// Carries the full result so the consumer can render every factor's value,
/// not just the failing pair.
#[derive(Debug, Error)]
#[error("{rendered}")]
pub struct ComparisonAssertionError {
    result: ComparisonResult,
    rendered: String,
}

impl ComparisonAssertionError {
    /// Wrap a failing result together with its formatted report.
    pub fn new(result: ComparisonResult, rendered: String) -> Self {
        Self { result, rendered }
    }

    /// The result that failed.
    pub fn result(&self) -> &ComparisonResult {
        &self.result
    }

    /// The formatted failure report.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incomplete_message_lists_missing_factors() {
        let err = ParityError::IncompleteRun {
            key: AlignmentKey::Position(2),
            missing: vec!["F2".to_string(), "F3".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "check '#2' is incomplete, still waiting on: F2, F3"
        );
    }

    #[test]
    fn test_assertion_error_displays_rendered_report() {
        let result = ComparisonResult {
            ok: false,
            message: "foo".to_string(),
            runs: Vec::new(),
        };
        let err: ParityError =
            ComparisonAssertionError::new(result, "Comparison failed".to_string()).into();
        assert_eq!(err.to_string(), "Comparison failed");
        match err {
            ParityError::Assertion(inner) => assert_eq!(inner.result().message, "foo"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
