//! pk_crypto — cryptographic primitives for the Passkeep vault
//!
//! Key hierarchy:
//! - **PDK** — Argon2id(master password, vault salt), 32 bytes. Wraps the MEK.
//! - **MEK** — 32 random bytes generated once per vault, held in RAM only
//!   while unlocked.
//! - **Per-entry key** — HKDF-SHA256(MEK, entry salt), 32 bytes, derived per
//!   operation and zeroized immediately after use.
//!
//! All symmetric encryption is AES-256-GCM with a fresh random 12-byte nonce
//! per call. Nonces are never reused with the same key; the per-entry salt is
//! rotated on every read so a row never accumulates decryptions under one
//! `(key, nonce)` pair.

pub mod aead;
pub mod error;
pub mod kdf;
pub mod keys;
pub mod rng;
pub mod token;

pub use error::CryptoError;
pub use keys::{Mek, Pdk};
