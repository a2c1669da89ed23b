//! Run broker: the stateful aggregator that correlates checks into results.

use super::engine::{compute_result, ComparisonResult};
use super::key::AlignmentKey;
use crate::comparator::Comparator;
use crate::error::{ParityError, ParityResult};
use crate::factor::Factor;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// One observation emitted by a factor's callback.
#[derive(Debug, Clone)]
pub struct Check {
    /// Observed value.
    pub value: Value,
    /// Human-readable name of the check.
    pub message: String,
    /// Equality policy for this check.
    pub comparator: Comparator,
}

impl Check {
    /// A check using deep equality.
    pub fn new(value: Value, message: impl Into<String>) -> Self {
        Self {
            value,
            message: message.into(),
            comparator: Comparator::default(),
        }
    }

    /// Replace the comparator.
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }
}

/// Per-factor accumulator of checks, keyed by alignment key.
///
/// Iteration follows insertion order.
#[derive(Debug)]
pub struct Run {
    name: String,
    order: Vec<AlignmentKey>,
    checks: HashMap<AlignmentKey, Check>,
}

impl Run {
    fn new(name: String) -> Self {
        Self {
            name,
            order: Vec::new(),
            checks: HashMap::new(),
        }
    }

    /// Factor name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keys in the order they were recorded.
    pub fn keys(&self) -> impl Iterator<Item = &AlignmentKey> {
        self.order.iter()
    }

    /// Check recorded under `key`, if any.
    pub fn get(&self, key: &AlignmentKey) -> Option<&Check> {
        self.checks.get(key)
    }

    /// Whether `key` has been recorded.
    pub fn contains(&self, key: &AlignmentKey) -> bool {
        self.checks.contains_key(key)
    }

    /// Number of recorded checks.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if nothing was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Eager-result subscriber. An error returned here propagates out of the
/// `record` call that completed the key.
pub type ResultSink = Box<dyn FnMut(&ComparisonResult) -> ParityResult<()>>;

/// Receives check occurrences per factor and computes results once every
/// factor has reported a key.
///
/// Policies:
/// - a second check for the same `(factor, key)` is rejected with
///   [`ParityError::DuplicateCheck`] and the first one is kept;
/// - the message and comparator of a result come from the first-declared
///   factor's check, whatever the other factors supplied;
/// - eager delivery happens on the record that completes a key, whichever
///   factor that is, so each key is delivered exactly once.
pub struct RunBroker {
    names: Vec<String>,
    runs: Vec<Option<Run>>,
    sink: Option<ResultSink>,
}

impl RunBroker {
    /// Broker for the given factors, in declaration order.
    pub fn new(factors: &[Factor]) -> ParityResult<Self> {
        Self::with_names(factors.iter().map(|f| f.name.clone()).collect())
    }

    /// Broker for bare factor names, in declaration order.
    pub fn with_names(names: Vec<String>) -> ParityResult<Self> {
        if names.is_empty() {
            return Err(ParityError::NoFactors);
        }
        let runs = names.iter().map(|_| None).collect();
        Ok(Self {
            names,
            runs,
            sink: None,
        })
    }

    /// Register the eager-result subscriber, replacing any previous one.
    pub fn subscribe(&mut self, sink: ResultSink) {
        self.sink = Some(sink);
    }

    /// Number of declared factors.
    pub fn factor_count(&self) -> usize {
        self.names.len()
    }

    /// Factor names in declaration order.
    pub fn factor_names(&self) -> &[String] {
        &self.names
    }

    /// Runs created so far, in declaration order.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.runs.iter().flatten()
    }

    /// Store `check` under `(factor_index, key)`.
    ///
    /// If this completes `key` and a subscriber is registered, the result is
    /// computed and delivered before returning.
    pub fn record(
        &mut self,
        factor_index: usize,
        key: AlignmentKey,
        check: Check,
    ) -> ParityResult<()> {
        let count = self.names.len();
        let name = self
            .names
            .get(factor_index)
            .ok_or(ParityError::UnknownFactor {
                index: factor_index,
                count,
            })?;

        let run = self.runs[factor_index].get_or_insert_with(|| Run::new(name.clone()));
        if run.contains(&key) {
            warn!(factor = %name, key = %key, "duplicate check rejected");
            return Err(ParityError::DuplicateCheck {
                factor: name.clone(),
                key,
            });
        }

        debug!(factor = %name, key = %key, check = %check.message, "recorded check");
        run.order.push(key.clone());
        run.checks.insert(key.clone(), check);

        if self.sink.is_some() && self.is_complete(&key) {
            let result = self.result_for(&key)?;
            debug!(key = %key, ok = result.ok, "check complete across factors");
            if let Some(sink) = self.sink.as_mut() {
                sink(&result)?;
            }
        }
        Ok(())
    }

    /// Whether every factor has reported `key`.
    pub fn is_complete(&self, key: &AlignmentKey) -> bool {
        self.runs
            .iter()
            .all(|run| run.as_ref().is_some_and(|r| r.contains(key)))
    }

    /// Names of the factors that have not reported `key`.
    pub fn missing_factors(&self, key: &AlignmentKey) -> Vec<String> {
        self.names
            .iter()
            .zip(&self.runs)
            .filter(|(_, run)| !run.as_ref().is_some_and(|r| r.contains(key)))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Keys reported by at least one factor but not yet by all of them, in
    /// first-seen order (scanning factors in declaration order).
    pub fn pending_keys(&self) -> Vec<AlignmentKey> {
        let mut seen = HashSet::new();
        self.runs()
            .flat_map(Run::keys)
            .filter(|key| seen.insert(*key))
            .filter(|key| !self.is_complete(key))
            .cloned()
            .collect()
    }

    /// Result for `key`, or [`ParityError::IncompleteRun`] if any factor has
    /// not reported it.
    pub fn result_for(&self, key: &AlignmentKey) -> ParityResult<ComparisonResult> {
        let checks: Option<Vec<&Check>> = self
            .runs
            .iter()
            .map(|run| run.as_ref().and_then(|r| r.get(key)))
            .collect();

        let checks = match checks {
            Some(checks) => checks,
            None => {
                return Err(ParityError::IncompleteRun {
                    key: key.clone(),
                    missing: self.missing_factors(key),
                })
            }
        };

        // Factor lists are never empty, so the first check exists.
        let (message, comparator) = match checks.first() {
            Some(first) => (first.message.clone(), first.comparator.clone()),
            None => return Err(ParityError::NoFactors),
        };
        let values = checks.into_iter().map(|c| c.value.clone()).collect();

        Ok(compute_result(message, &self.names, values, &comparator))
    }

    /// Results for every key of the first-declared factor, in its recording
    /// order. Fails if any of them is incomplete.
    pub fn all_results(&self) -> ParityResult<Vec<ComparisonResult>> {
        match self.runs.first().and_then(Option::as_ref) {
            Some(first) => first.keys().map(|key| self.result_for(key)).collect(),
            None => Ok(Vec::new()),
        }
    }
}

impl fmt::Debug for RunBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunBroker")
            .field("names", &self.names)
            .field("runs", &self.runs)
            .field("subscribed", &self.sink.is_some())
            .finish()
    }
}
