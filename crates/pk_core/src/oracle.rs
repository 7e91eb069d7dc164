//! Injectable capabilities the core consults but does not implement.
//!
//! The platform biometric prompt and the breached-password lookup live
//! outside this crate. Both are modelled so that "unavailable" behaves
//! exactly like "not consulted": the vault must keep working without them.

/// Outcome of a user-presence (biometric) prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Confirmed,
    /// No prompt available on this platform; treated as not consulted.
    Unsupported,
    Denied,
}

/// A user-presence prompt, e.g. Touch ID.
pub trait UserPresence: Send + Sync {
    fn confirm(&self, reason: &str) -> Presence;
}

/// Outcome of a breached-password lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachCheck {
    /// Present in known breach corpora, with an occurrence count when known.
    Found(u32),
    Clear,
    /// Lookup unavailable (offline, rate-limited); treated as not consulted.
    Unknown,
}

/// A breach-corpus oracle, e.g. the HIBP range API.
pub trait BreachOracle: Send + Sync {
    fn check(&self, password: &str) -> BreachCheck;
}

#[cfg(test)]
pub(crate) mod stubs {
    use super::*;

    pub struct AlwaysPresent;
    impl UserPresence for AlwaysPresent {
        fn confirm(&self, _reason: &str) -> Presence {
            Presence::Confirmed
        }
    }

    pub struct AlwaysDenied;
    impl UserPresence for AlwaysDenied {
        fn confirm(&self, _reason: &str) -> Presence {
            Presence::Denied
        }
    }

    pub struct FixedBreach(pub BreachCheck);
    impl BreachOracle for FixedBreach {
        fn check(&self, _password: &str) -> BreachCheck {
            self.0
        }
    }
}
