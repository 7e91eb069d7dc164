//! pk_core — vault semantics above the raw stores.
//!
//! - `entry_crypto`: per-entry HKDF key derivation, AEAD encrypt/decrypt,
//!   and the at-read salt/nonce rotation that bounds any `(key, nonce)`
//!   pair's lifetime.
//! - `service`: the unlock/lock/add/get/update/delete/list facade that owns
//!   the MEK while unlocked.
//! - `policy`: master-password acceptance rules.
//! - `oracle`: injectable user-presence and breach-check capabilities, plus
//!   the HIBP k-anonymity client.

pub mod entry_crypto;
pub mod error;
pub mod hibp;
pub mod oracle;
pub mod policy;
pub mod service;

pub use error::ServiceError;
pub use service::{Credential, Service};
