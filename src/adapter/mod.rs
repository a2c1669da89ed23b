//! Host test framework binding.
//!
//! The host framework is injected as a [`TestHost`] capability set rather
//! than assumed to exist in ambient scope. [`DescribeMultiple`] wraps each
//! factor in a named group, derives alignment keys from the current test and
//! check index inside that group, and turns every disagreeing result into a
//! [`ComparisonAssertionError`] as soon as the key completes.
//!
//! - [`format`] - failure formatters
//! - [`host`] - a reference host that records and schedules tests

pub mod format;
pub mod host;

pub use format::{
    diff_values, Difference, FailureFormatter, JsonDumpFormatter, StructuralDiffFormatter,
};
pub use host::{ExecutionOrder, HostReport, ScheduledHost, TestOutcome};

use crate::comparator::Comparator;
use crate::error::{ComparisonAssertionError, ParityResult};
use crate::factor::Factor;
use crate::run::{AlignmentKey, Compare, ComparisonResult, KeyStrategy, Session, SessionOptions};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Lifecycle hook registered with a host.
pub type Hook<'s> = Box<dyn FnMut() + 's>;

/// Body of a single test registered with a host.
pub type TestBody<'s> = Box<dyn FnOnce() -> ParityResult<()> + 's>;

/// Grouping and lifecycle primitives of a host test framework.
///
/// `'s` bounds everything the host stores, typically the borrow of the
/// comparison session that test bodies emit into.
pub trait TestHost<'s> {
    /// Open a named group and run `body` to register its contents.
    fn group<F>(&mut self, name: &str, body: F)
    where
        F: FnOnce(&mut Self);

    /// Run `hook` once before the first test of the current group.
    fn before_all(&mut self, hook: Hook<'s>);

    /// Run `hook` before every test of the current group.
    fn before_each(&mut self, hook: Hook<'s>);

    /// Register a test in the current group.
    fn test(&mut self, name: &str, body: TestBody<'s>);
}

/// Fail with a formatted report if `result` disagrees.
pub fn assert_result_ok(
    result: &ComparisonResult,
    formatter: &dyn FailureFormatter,
) -> ParityResult<()> {
    if result.ok {
        return Ok(());
    }
    let rendered = formatter.format(result);
    Err(ComparisonAssertionError::new(result.clone(), rendered).into())
}

/// Adapter configuration.
pub struct AdapterOptions {
    comparator: Comparator,
    formatter: Box<dyn FailureFormatter>,
}

impl AdapterOptions {
    /// Deep equality with JSON dump failure reports.
    pub fn new() -> Self {
        Self {
            comparator: Comparator::default(),
            formatter: Box::new(JsonDumpFormatter),
        }
    }

    /// Default comparator for checks that do not supply one.
    pub fn comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Formatter for failure reports.
    pub fn formatter<F>(mut self, formatter: F) -> Self
    where
        F: FailureFormatter + 'static,
    {
        self.formatter = Box::new(formatter);
        self
    }
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AdapterOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterOptions")
            .field("comparator", &self.comparator)
            .finish_non_exhaustive()
    }
}

/// Test and check counters for one factor's group.
#[derive(Debug, Default)]
struct ScopeCounter {
    test: Cell<Option<usize>>,
    check: Cell<Option<usize>>,
}

impl ScopeCounter {
    fn reset(&self) {
        self.test.set(None);
        self.check.set(None);
    }

    fn enter_test(&self) {
        self.test.set(Some(self.test.get().map_or(0, |t| t + 1)));
        self.check.set(None);
    }

    fn next_key(&self) -> AlignmentKey {
        let check = self.check.get().map_or(0, |c| c + 1);
        self.check.set(Some(check));
        match self.test.get() {
            Some(test) => AlignmentKey::Named(format!("{test}-{check}")),
            None => AlignmentKey::Named(format!("group-{check}")),
        }
    }
}

/// Runs the same test body once per factor inside a host framework,
/// failing each check as soon as every factor has reported it.
///
/// Keys are `"{test}-{check}"`: the index of the current test within the
/// factor's group and of the check within that test. Checks emitted
/// directly in the group body use `"group-{check}"`.
pub struct DescribeMultiple {
    session: Session,
    scopes: Rc<Vec<ScopeCounter>>,
}

impl DescribeMultiple {
    /// Build the adapter and its session.
    pub fn new(factors: Vec<Factor>, options: AdapterOptions) -> ParityResult<Self> {
        let scopes: Rc<Vec<ScopeCounter>> =
            Rc::new(factors.iter().map(|_| ScopeCounter::default()).collect());

        let resolver_scopes = Rc::clone(&scopes);
        let formatter = options.formatter;
        let session_options = SessionOptions::new()
            .comparator(options.comparator)
            .alignment(KeyStrategy::named(move |factor| {
                match resolver_scopes.get(factor) {
                    Some(scope) => scope.next_key(),
                    None => AlignmentKey::Named(format!("unscoped-{factor}")),
                }
            }))
            .on_result(move |result| assert_result_ok(result, formatter.as_ref()));

        Ok(Self {
            session: Session::new(factors, session_options)?,
            scopes,
        })
    }

    /// Register one group per factor with `host`.
    ///
    /// `body` receives the factor, the host (to register tests and hooks)
    /// and the factor's compare handle, which test bodies clone.
    ///
    /// The scope hooks are registered on the factor's group, so the host
    /// must run them for tests of nested groups too; tests in a nested group
    /// then count as tests of the factor's group.
    pub fn describe<'s, H, F>(&'s self, host: &mut H, mut body: F) -> ParityResult<()>
    where
        H: TestHost<'s>,
        F: FnMut(&'s Factor, &mut H, &Compare<'s>) -> ParityResult<()>,
    {
        self.session.run(|factor, compare| {
            let index = compare.factor_index();
            let mut outcome = Ok(());
            host.group(&factor.name, |host| {
                let scopes = Rc::clone(&self.scopes);
                host.before_all(Box::new(move || {
                    if let Some(scope) = scopes.get(index) {
                        scope.reset();
                    }
                }));
                let scopes = Rc::clone(&self.scopes);
                host.before_each(Box::new(move || {
                    if let Some(scope) = scopes.get(index) {
                        scope.enter_test();
                    }
                }));
                outcome = body(factor, host, compare);
            });
            outcome
        })
    }

    /// The underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// All results collected so far.
    pub fn results(&self) -> ParityResult<Vec<ComparisonResult>> {
        self.session.results()
    }
}

impl fmt::Debug for DescribeMultiple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescribeMultiple")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParityError;
    use crate::run::RunValue;
    use serde_json::json;

    #[test]
    fn test_scope_counter_keys() {
        let scope = ScopeCounter::default();
        assert_eq!(scope.next_key(), AlignmentKey::from("group-0"));
        scope.reset();
        scope.enter_test();
        assert_eq!(scope.next_key(), AlignmentKey::from("0-0"));
        assert_eq!(scope.next_key(), AlignmentKey::from("0-1"));
        scope.enter_test();
        assert_eq!(scope.next_key(), AlignmentKey::from("1-0"));
        scope.reset();
        scope.enter_test();
        assert_eq!(scope.next_key(), AlignmentKey::from("0-0"));
    }

    #[test]
    fn test_assert_result_ok() {
        let mut result = ComparisonResult {
            ok: true,
            message: "x".to_string(),
            runs: vec![RunValue {
                name: "F1".to_string(),
                value: json!(1),
            }],
        };
        assert!(assert_result_ok(&result, &JsonDumpFormatter).is_ok());

        result.ok = false;
        match assert_result_ok(&result, &JsonDumpFormatter) {
            Err(ParityError::Assertion(err)) => {
                assert_eq!(err.result(), &result);
                assert!(err.rendered().contains("Result for F1"));
            }
            other => panic!("expected assertion failure, got {other:?}"),
        }
    }
}
