//! Single-session state machine guarding the unwrapped MEK.
//!
//! At most one session exists per process. Every privileged request passes
//! through [`SessionManager::validate`], which enforces the sliding TTL, the
//! constant-time token check, the owner binding, and per-session nonce
//! uniqueness. Any transition out of the unlocked state zeroizes the MEK
//! before the remaining fields are cleared.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;

use pk_crypto::{token, Mek};

/// Sliding session lifetime.
pub const SESSION_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("session expired")]
    Expired,
    #[error("invalid session state")]
    InvalidState,
    #[error("nonce replayed")]
    NonceReplay,
}

// Dropping the inner state zeroizes the MEK (`Mek` is ZeroizeOnDrop).
struct SessionInner {
    token: String,
    mek: Mek,
    dir: PathBuf,
    expires: Instant,
    nonces: HashSet<String>,
    owner: Option<String>,
}

/// Owns the unlocked MEK. All transitions hold the internal mutex; no
/// blocking work happens under it — callers receive a copy of the MEK and
/// compute outside.
pub struct SessionManager {
    inner: Mutex<Option<SessionInner>>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(None),
        }
    }

    /// Replace any prior session with a fresh one for `dir`, returning the
    /// token and TTL in seconds.
    pub fn establish(&self, dir: PathBuf, mek: Mek) -> (String, u64) {
        self.establish_with_owner(dir, mek, current_user_identifier())
    }

    fn establish_with_owner(&self, dir: PathBuf, mek: Mek, owner: Option<String>) -> (String, u64) {
        let session_token = token::generate_token();
        let mut guard = self.inner.lock();
        // Dropping the prior session zeroizes its MEK.
        *guard = Some(SessionInner {
            token: session_token.clone(),
            mek,
            dir,
            expires: Instant::now() + SESSION_TTL,
            nonces: HashSet::new(),
            owner,
        });
        (session_token, SESSION_TTL.as_secs())
    }

    /// Authenticate one privileged request. On success the nonce is
    /// consumed, the TTL slides, and the caller gets its own MEK copy to
    /// zeroize after use.
    pub fn validate(&self, token: &str, nonce: &str) -> Result<(Mek, PathBuf), SessionError> {
        self.validate_at(token, nonce, Instant::now(), current_user_identifier())
    }

    fn validate_at(
        &self,
        presented: &str,
        nonce: &str,
        now: Instant,
        current_user: Option<String>,
    ) -> Result<(Mek, PathBuf), SessionError> {
        let mut guard = self.inner.lock();
        let session = guard.as_mut().ok_or(SessionError::Unauthorized)?;

        if presented.is_empty() || nonce.is_empty() {
            return Err(SessionError::Unauthorized);
        }
        if now > session.expires {
            *guard = None;
            return Err(SessionError::Expired);
        }
        if !token::constant_time_eq(session.token.as_bytes(), presented.as_bytes()) {
            return Err(SessionError::Unauthorized);
        }
        // Owner binding is only enforced when both sides resolve; an
        // unresolvable identity (containers) skips the check.
        if let (Some(owner), Some(current)) = (session.owner.as_deref(), current_user.as_deref()) {
            if owner != current {
                return Err(SessionError::Unauthorized);
            }
        }
        if session.mek.as_bytes().len() != 32 {
            *guard = None;
            return Err(SessionError::InvalidState);
        }
        if !session.nonces.insert(nonce.to_string()) {
            return Err(SessionError::NonceReplay);
        }

        session.expires = now + SESSION_TTL;
        Ok((session.mek.clone(), session.dir.clone()))
    }

    /// Zeroize and drop the session. Idempotent.
    pub fn clear(&self) {
        *self.inner.lock() = None;
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Best-effort OS user identity for session ownership.
fn current_user_identifier() -> Option<String> {
    let name = whoami::username();
    if !name.is_empty() {
        return Some(name);
    }
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok()
        .filter(|v| !v.is_empty())
}
