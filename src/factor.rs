//! Factor descriptors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One run condition under comparison.
///
/// A factor is immutable once handed to a session. `variables` carries
/// whatever the factor callback needs to parameterize its run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    /// Display name, used to label this factor's values in results.
    pub name: String,
    /// Per-factor variables (BTreeMap for deterministic iteration).
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
}

impl Factor {
    /// Create a factor with no variables.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Add a variable, replacing any previous value under the same key.
    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(key.into(), value.into());
        self
    }

    /// Look up a variable by name.
    pub fn variable(&self, key: &str) -> Option<&Value> {
        self.variables.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_lookup() {
        let factor = Factor::new("F1").with_variable("foo", "bar").with_variable("x", 1);
        assert_eq!(factor.name, "F1");
        assert_eq!(factor.variable("foo"), Some(&json!("bar")));
        assert_eq!(factor.variable("x"), Some(&json!(1)));
        assert_eq!(factor.variable("missing"), None);
    }

    #[test]
    fn test_deserialize_without_variables() {
        let factor: Factor = serde_json::from_str(r#"{"name":"Case 1"}"#).unwrap();
        assert_eq!(factor.name, "Case 1");
        assert!(factor.variables.is_empty());
    }
}
