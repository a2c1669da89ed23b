//! Factor Parity - run the same checks across several factors and verify
//! that they agree.
//!
//! A factor is one run condition: an implementation, an environment, a
//! configuration. The test author writes one callback; it runs once per
//! factor and emits named checks through a `compare` handle. Checks that
//! correspond across factors are aligned by key and chain-compared in
//! factor declaration order.
//!
//! # Architecture
//!
//! - [`comparator`] - equality policies (deep equality by default)
//! - [`run`] - alignment keys, result engine, run broker and factor driver
//! - [`adapter`] - binding to a host test framework's groups and hooks
//! - [`replay`] - offline comparison of recorded runs
//! - [`report`] - summaries and rendering
//! - [`error`] - error types
//!
//! # Example
//!
//! ```
//! use factor_parity::{run_comparison, Factor, SessionOptions};
//!
//! let factors = vec![
//!     Factor::new("F1").with_variable("foo", "bar"),
//!     Factor::new("F2").with_variable("foo", "bif"),
//! ];
//!
//! let session = run_comparison(factors, SessionOptions::default(), |factor, compare| {
//!     compare.check(&factor.variable("foo"), "foo")?;
//!     compare.check("x", "hard-coded")
//! })
//! .unwrap();
//!
//! let results = session.results().unwrap();
//! assert!(!results[0].ok);
//! assert!(results[1].ok);
//! ```

// Library code reports misuse through ParityError, never by panicking.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod adapter;
pub mod comparator;
pub mod error;
pub mod factor;
pub mod replay;
pub mod report;
pub mod run;

// Re-export commonly used types
pub use adapter::{AdapterOptions, DescribeMultiple, ScheduledHost, TestHost};
pub use comparator::{deep_equal, Comparator};
pub use error::{ComparisonAssertionError, ParityError, ParityResult};
pub use factor::Factor;
pub use replay::{calculate_results, RunFile};
pub use report::ParityReport;
pub use run::{
    run_comparison, AlignmentKey, Compare, ComparisonResult, KeyStrategy, RunBroker, Session,
    SessionOptions,
};
