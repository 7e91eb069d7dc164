//! Master-password acceptance policy.
//!
//! Every failure surfaces as the single `PolicyReject` kind; which rule
//! fired is logged at debug level but never returned to the caller, so a
//! rejection leaks nothing about how close a guess was.

use zxcvbn::Score;

use crate::error::ServiceError;
use crate::oracle::{BreachCheck, BreachOracle};

/// ASCII punctuation accepted as "special" characters.
pub const SPECIAL_CHARS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_{|}~`";

#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    /// Require an uppercase letter, a digit, and a special character.
    pub require_classes: bool,
    /// Minimum zxcvbn score, 0–4.
    pub min_score: Score,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 12,
            require_classes: true,
            min_score: Score::Three,
        }
    }
}

impl PasswordPolicy {
    /// Validate a candidate master password. `breach` is consulted when
    /// provided; an `Unknown` result is treated as not consulted.
    pub fn validate(
        &self,
        password: &str,
        breach: Option<&dyn BreachOracle>,
    ) -> Result<(), ServiceError> {
        if password.len() < self.min_length {
            return reject("too_short");
        }

        if self.require_classes {
            if !password.chars().any(|c| c.is_uppercase()) {
                return reject("missing_uppercase");
            }
            if !password.chars().any(|c| c.is_ascii_digit()) {
                return reject("missing_digit");
            }
            if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
                return reject("missing_special");
            }
        }

        let estimate = zxcvbn::zxcvbn(password, &[]);
        if estimate.score() < self.min_score {
            return reject("low_strength_score");
        }

        if let Some(oracle) = breach {
            match oracle.check(password) {
                BreachCheck::Found(count) => {
                    tracing::debug!(count, "master password rejected: present in breach corpus");
                    return Err(ServiceError::PolicyReject);
                }
                BreachCheck::Clear => {}
                BreachCheck::Unknown => {
                    tracing::debug!("breach oracle unavailable, check skipped");
                }
            }
        }

        Ok(())
    }
}

fn reject(rule: &'static str) -> Result<(), ServiceError> {
    tracing::debug!(rule, "master password rejected");
    Err(ServiceError::PolicyReject)
}
