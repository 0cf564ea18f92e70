//! Strongly-typed names for keepawaked

use std::borrow::Borrow;
use std::fmt;

/// Name under which a sleep inhibition is held.
///
/// Derived from the name of an active workload. Two workloads reporting the
/// same name share a single inhibition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InhibitorName(String);

impl InhibitorName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InhibitorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InhibitorName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InhibitorName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Borrow<str> for InhibitorName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
