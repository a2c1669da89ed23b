//! Alignment keys: the identity that correlates "the same" check across
//! factors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::rc::Rc;

/// Identity of one check occurrence.
///
/// Must be identical across factors for checks meant to be compared and
/// unique per occurrence within a factor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlignmentKey {
    /// Declaration order within a factor (zero-based).
    Position(usize),
    /// Externally derived name, e.g. sub-test identity plus check index.
    Named(String),
}

impl fmt::Display for AlignmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Position(n) => write!(f, "#{}", n),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl From<usize> for AlignmentKey {
    fn from(n: usize) -> Self {
        Self::Position(n)
    }
}

impl From<&str> for AlignmentKey {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for AlignmentKey {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

/// Resolves the key for the next check of the given factor index.
pub type KeyResolver = Rc<dyn Fn(usize) -> AlignmentKey>;

/// How a session assigns alignment keys.
///
/// Always chosen explicitly; the driver never guesses from context.
#[derive(Clone, Default)]
pub enum KeyStrategy {
    /// The Nth check of a factor aligns with the Nth check of every other
    /// factor. Requires identical emission order and count.
    #[default]
    Positional,
    /// Keys come from an injected resolver, so emission order may vary
    /// across factors as long as keys match.
    Named(KeyResolver),
}

impl KeyStrategy {
    /// Named strategy from a closure.
    pub fn named<F>(resolver: F) -> Self
    where
        F: Fn(usize) -> AlignmentKey + 'static,
    {
        Self::Named(Rc::new(resolver))
    }
}

impl fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positional => f.write_str("Positional"),
            Self::Named(_) => f.write_str("Named(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(AlignmentKey::Position(3).to_string(), "#3");
        assert_eq!(AlignmentKey::from("0-1").to_string(), "0-1");
    }

    #[test]
    fn test_untagged_deserialize() {
        let keys: Vec<AlignmentKey> = serde_json::from_str(r#"[4, "login/0"]"#).unwrap();
        assert_eq!(
            keys,
            vec![AlignmentKey::Position(4), AlignmentKey::Named("login/0".into())]
        );
    }

    #[test]
    fn test_named_strategy_resolves() {
        let strategy = KeyStrategy::named(|factor| AlignmentKey::Named(format!("f{factor}")));
        match strategy {
            KeyStrategy::Named(resolve) => assert_eq!(resolve(2), AlignmentKey::from("f2")),
            KeyStrategy::Positional => panic!("expected named strategy"),
        }
    }
}
