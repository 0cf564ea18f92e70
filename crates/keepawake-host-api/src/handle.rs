//! Inhibitor handle abstraction

use std::fmt;

/// Opaque handle to an inhibition held by a [`SleepInhibitor`](crate::SleepInhibitor)
///
/// Created by the inhibitor when an inhibition is granted and required to
/// release exactly that inhibition later. Callers only compare handles for
/// equality; the cookie is exposed for adapters and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InhibitorHandle(u32);

impl InhibitorHandle {
    pub fn from_cookie(cookie: u32) -> Self {
        Self(cookie)
    }

    pub fn cookie(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for InhibitorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cookie:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_equality_follows_cookie() {
        assert_eq!(InhibitorHandle::from_cookie(3), InhibitorHandle::from_cookie(3));
        assert_ne!(InhibitorHandle::from_cookie(3), InhibitorHandle::from_cookie(4));
        assert_eq!(InhibitorHandle::from_cookie(42).cookie(), 42);
    }

    #[test]
    fn handle_display() {
        assert_eq!(InhibitorHandle::from_cookie(9).to_string(), "cookie:9");
    }
}
