//! Factor driver: runs one callback per factor and routes its checks into
//! the session's broker.

use super::broker::{Check, ResultSink, RunBroker};
use super::engine::ComparisonResult;
use super::key::{AlignmentKey, KeyStrategy};
use crate::comparator::Comparator;
use crate::error::{ParityError, ParityResult};
use crate::factor::Factor;
use serde::Serialize;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, debug_span};

/// Session configuration.
pub struct SessionOptions {
    comparator: Comparator,
    alignment: KeyStrategy,
    on_result: Option<ResultSink>,
}

impl SessionOptions {
    /// Deep equality, positional alignment, no eager subscriber.
    pub fn new() -> Self {
        Self {
            comparator: Comparator::default(),
            alignment: KeyStrategy::Positional,
            on_result: None,
        }
    }

    /// Comparator used when a check does not supply its own.
    pub fn comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Alignment key strategy.
    pub fn alignment(mut self, alignment: KeyStrategy) -> Self {
        self.alignment = alignment;
        self
    }

    /// Receive each result as soon as its key completes.
    pub fn on_result<F>(mut self, sink: F) -> Self
    where
        F: FnMut(&ComparisonResult) -> ParityResult<()> + 'static,
    {
        self.on_result = Some(Box::new(sink));
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionOptions")
            .field("comparator", &self.comparator)
            .field("alignment", &self.alignment)
            .field("on_result", &self.on_result.is_some())
            .finish()
    }
}

/// One comparison session: the factor list plus the broker that owns every
/// run.
///
/// Sessions live in a single cooperative scheduling domain; they are not
/// `Send`. [`Compare`] handles borrow the session, so they cannot outlive
/// it.
pub struct Session {
    factors: Vec<Factor>,
    broker: RefCell<RunBroker>,
    comparator: Comparator,
    alignment: KeyStrategy,
}

impl Session {
    /// Create a session. Fails if `factors` is empty.
    pub fn new(factors: Vec<Factor>, options: SessionOptions) -> ParityResult<Self> {
        let mut broker = RunBroker::new(&factors)?;
        if let Some(sink) = options.on_result {
            broker.subscribe(sink);
        }
        Ok(Self {
            factors,
            broker: RefCell::new(broker),
            comparator: options.comparator,
            alignment: options.alignment,
        })
    }

    /// Factors in declaration order.
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// A fresh compare handle for one factor. Positional keys restart at
    /// zero for every handle created here.
    pub fn compare_for(&self, factor_index: usize) -> ParityResult<Compare<'_>> {
        if factor_index >= self.factors.len() {
            return Err(ParityError::UnknownFactor {
                index: factor_index,
                count: self.factors.len(),
            });
        }
        Ok(Compare {
            session: self,
            factor_index,
            position: Rc::new(Cell::new(0)),
        })
    }

    /// Invoke `callback` once per factor, strictly in declaration order.
    ///
    /// The driver does not wait for anything the callback defers; checks
    /// emitted later through a cloned [`Compare`] still land in this
    /// session. Stops at the first callback error.
    pub fn run<'s, F>(&'s self, mut callback: F) -> ParityResult<()>
    where
        F: FnMut(&'s Factor, &Compare<'s>) -> ParityResult<()>,
    {
        for (index, factor) in self.factors.iter().enumerate() {
            let _span = debug_span!("factor", factor = %factor.name, index).entered();
            debug!("invoking factor callback");
            let compare = self.compare_for(index)?;
            callback(factor, &compare)?;
        }
        Ok(())
    }

    /// All results, in the first factor's check order.
    pub fn results(&self) -> ParityResult<Vec<ComparisonResult>> {
        self.broker()?.all_results()
    }

    /// Result for one key.
    pub fn result_for(&self, key: &AlignmentKey) -> ParityResult<ComparisonResult> {
        self.broker()?.result_for(key)
    }

    /// Whether every factor has reported `key`.
    pub fn is_complete(&self, key: &AlignmentKey) -> ParityResult<bool> {
        Ok(self.broker()?.is_complete(key))
    }

    /// Keys still waiting on at least one factor.
    pub fn pending_keys(&self) -> ParityResult<Vec<AlignmentKey>> {
        Ok(self.broker()?.pending_keys())
    }

    /// Read access to the broker.
    pub fn broker(&self) -> ParityResult<Ref<'_, RunBroker>> {
        self.broker.try_borrow().map_err(|_| ParityError::Reentrant)
    }

    fn record(&self, factor_index: usize, key: AlignmentKey, check: Check) -> ParityResult<()> {
        self.broker
            .try_borrow_mut()
            .map_err(|_| ParityError::Reentrant)?
            .record(factor_index, key, check)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("factors", &self.factors)
            .field("comparator", &self.comparator)
            .field("alignment", &self.alignment)
            .finish_non_exhaustive()
    }
}

/// The `compare` function handed to a factor callback, bound to one factor.
///
/// Cloning shares the positional counter, so clones captured by deferred
/// callbacks keep numbering checks in emission order.
#[derive(Clone)]
pub struct Compare<'s> {
    session: &'s Session,
    factor_index: usize,
    position: Rc<Cell<usize>>,
}

impl<'s> Compare<'s> {
    /// Index of the bound factor.
    pub fn factor_index(&self) -> usize {
        self.factor_index
    }

    /// The bound factor.
    pub fn factor(&self) -> &'s Factor {
        &self.session.factors[self.factor_index]
    }

    /// Emit a check using the session's default comparator.
    pub fn check<T>(&self, value: &T, message: impl Into<String>) -> ParityResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.emit(value, message.into(), None)
    }

    /// Emit a check with its own comparator.
    pub fn check_with<T>(
        &self,
        value: &T,
        message: impl Into<String>,
        comparator: &Comparator,
    ) -> ParityResult<()>
    where
        T: Serialize + ?Sized,
    {
        self.emit(value, message.into(), Some(comparator))
    }

    fn emit<T>(
        &self,
        value: &T,
        message: String,
        comparator: Option<&Comparator>,
    ) -> ParityResult<()>
    where
        T: Serialize + ?Sized,
    {
        let value = match serde_json::to_value(value) {
            Ok(value) => value,
            Err(source) => return Err(ParityError::Encode { message, source }),
        };

        let key = match &self.session.alignment {
            KeyStrategy::Positional => {
                let n = self.position.get();
                self.position.set(n + 1);
                AlignmentKey::Position(n)
            }
            KeyStrategy::Named(resolve) => resolve(self.factor_index),
        };

        let comparator = comparator.unwrap_or(&self.session.comparator).clone();
        let check = Check::new(value, message).with_comparator(comparator);
        self.session.record(self.factor_index, key, check)
    }
}

impl fmt::Debug for Compare<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compare")
            .field("factor", &self.factor().name)
            .field("position", &self.position.get())
            .finish()
    }
}

/// Build a session, run `callback` for every factor, and hand back the
/// session as the pull accessor for results.
pub fn run_comparison<F>(
    factors: Vec<Factor>,
    options: SessionOptions,
    mut callback: F,
) -> ParityResult<Session>
where
    F: for<'s> FnMut(&'s Factor, &Compare<'s>) -> ParityResult<()>,
{
    let session = Session::new(factors, options)?;
    session.run(|factor, compare| callback(factor, compare))?;
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn factors() -> Vec<Factor> {
        vec![
            Factor::new("F1").with_variable("foo", "bar"),
            Factor::new("F2").with_variable("foo", "bif"),
        ]
    }

    #[test]
    fn test_positional_session() {
        let session = run_comparison(factors(), SessionOptions::default(), |factor, compare| {
            compare.check(&factor.variable("foo"), "foo")?;
            compare.check("x", "hard-coded")
        })
        .unwrap();

        let results = session.results().unwrap();
        assert_eq!(results.len(), 2);
        assert!(!results[0].ok);
        assert_eq!(results[0].message, "foo");
        assert!(results[1].ok);
        assert_eq!(results[1].runs[1].value, json!("x"));
    }

    #[test]
    fn test_callback_error_stops_driver() {
        let session = Session::new(factors(), SessionOptions::default()).unwrap();
        let mut visited = Vec::new();
        let err = session
            .run(|factor, _| {
                visited.push(factor.name.clone());
                Err(ParityError::NoFactors)
            })
            .unwrap_err();
        assert!(matches!(err, ParityError::NoFactors));
        assert_eq!(visited, vec!["F1".to_string()]);
    }

    #[test]
    fn test_check_with_overrides_default() {
        let options = SessionOptions::new().comparator(Comparator::new("never", |_, _| false));
        let session = run_comparison(factors(), options, |_, compare| {
            compare.check(&1, "default")?;
            compare.check_with(&1, "own", &Comparator::deep_equal())
        })
        .unwrap();
        let results = session.results().unwrap();
        assert!(!results[0].ok);
        assert!(results[1].ok);
    }

    #[test]
    fn test_encode_failure_does_not_consume_position() {
        use std::collections::HashMap;

        let session = Session::new(factors(), SessionOptions::default()).unwrap();
        let compare = session.compare_for(0).unwrap();
        let mut bad = HashMap::new();
        bad.insert(vec![1u8], 1);
        assert!(matches!(
            compare.check(&bad, "bad"),
            Err(ParityError::Encode { .. })
        ));
        compare.check(&1, "good").unwrap();
        assert!(session
            .broker()
            .unwrap()
            .runs()
            .next()
            .unwrap()
            .contains(&AlignmentKey::Position(0)));
    }

    #[test]
    fn test_subscriber_reading_session_gets_reentrant() {
        let slot: Rc<Cell<Option<&'static Session>>> = Rc::new(Cell::new(None));
        let observed = Rc::new(Cell::new(None));
        let sink_slot = Rc::clone(&slot);
        let sink_observed = Rc::clone(&observed);
        let options = SessionOptions::new().on_result(move |_| {
            if let Some(session) = sink_slot.get() {
                let reentrant = matches!(session.results(), Err(ParityError::Reentrant));
                sink_observed.set(Some(reentrant));
            }
            Ok(())
        });

        let session: &'static Session =
            Box::leak(Box::new(Session::new(factors(), options).unwrap()));
        slot.set(Some(session));

        session.compare_for(0).unwrap().check(&1, "a").unwrap();
        assert_eq!(observed.get(), None);
        session.compare_for(1).unwrap().check(&1, "a").unwrap();
        assert_eq!(observed.get(), Some(true));

        // The broker is readable again once delivery has finished.
        assert!(session.results().unwrap()[0].ok);
    }

    #[test]
    fn test_compare_for_unknown_factor() {
        let session = Session::new(factors(), SessionOptions::default()).unwrap();
        assert!(matches!(
            session.compare_for(2),
            Err(ParityError::UnknownFactor { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_empty_factor_list() {
        assert!(matches!(
            Session::new(Vec::new(), SessionOptions::default()),
            Err(ParityError::NoFactors)
        ));
    }
}
