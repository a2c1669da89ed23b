//! Run/result correlation engine.
//!
//! Checks emitted by each factor's callback are stored per factor under an
//! alignment key. Once every factor has reported a key, its values are
//! chain-compared in factor declaration order to produce a
//! [`ComparisonResult`].
//!
//! - [`key`] - alignment keys and key strategies
//! - [`engine`] - pure result calculation
//! - [`broker`] - the stateful aggregator
//! - [`driver`] - per-factor callback driver and `compare` handles

pub mod broker;
pub mod driver;
pub mod engine;
pub mod key;

pub use broker::{Check, ResultSink, Run, RunBroker};
pub use driver::{run_comparison, Compare, Session, SessionOptions};
pub use engine::{compute_result, ComparisonResult, RunValue};
pub use key::{AlignmentKey, KeyResolver, KeyStrategy};
