//! Replay of pre-recorded runs.
//!
//! Runs captured elsewhere (another process, an earlier session) can be
//! written to a JSON file and compared offline:
//!
//! ```json
//! { "runs": [
//!     { "name": "Case 1", "checks": [ { "message": "hard-coded", "value": "x" } ] },
//!     { "name": "Case 2", "checks": [ { "message": "hard-coded", "value": "x" } ] }
//! ] }
//! ```
//!
//! A check with an explicit `key` (number or string) is aligned by that key;
//! otherwise its position in `checks` is used.

use crate::comparator::Comparator;
use crate::error::ParityResult;
use crate::run::{AlignmentKey, Check, ComparisonResult, RunBroker};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::info;

/// One recorded check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedCheck {
    /// Check message.
    pub message: String,
    /// Recorded value.
    pub value: Value,
    /// Explicit alignment key; position in the run when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<AlignmentKey>,
}

/// One recorded factor run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedRun {
    /// Factor name.
    pub name: String,
    /// Checks in emission order.
    #[serde(default)]
    pub checks: Vec<RecordedCheck>,
}

/// A file of recorded runs, in factor declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunFile {
    /// Recorded runs.
    pub runs: Vec<RecordedRun>,
}

impl RunFile {
    /// Load from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> ParityResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let file = Self::from_json(&content)?;
        info!(
            path = %path.as_ref().display(),
            runs = file.runs.len(),
            "loaded recorded runs"
        );
        Ok(file)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> ParityResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compare the recorded runs.
    pub fn results(&self, comparator: &Comparator) -> ParityResult<Vec<ComparisonResult>> {
        calculate_results(&self.runs, comparator)
    }
}

/// Replay `runs` through a broker and return every result.
///
/// Fails with `NoFactors` for an empty list and `IncompleteRun` when a
/// check of the first run has no counterpart in some other run.
pub fn calculate_results(
    runs: &[RecordedRun],
    comparator: &Comparator,
) -> ParityResult<Vec<ComparisonResult>> {
    let mut broker = RunBroker::with_names(runs.iter().map(|r| r.name.clone()).collect())?;

    for (factor_index, run) in runs.iter().enumerate() {
        for (position, recorded) in run.checks.iter().enumerate() {
            let key = recorded
                .key
                .clone()
                .unwrap_or(AlignmentKey::Position(position));
            let check = Check::new(recorded.value.clone(), recorded.message.clone())
                .with_comparator(comparator.clone());
            broker.record(factor_index, key, check)?;
        }
    }

    broker.all_results()
}
