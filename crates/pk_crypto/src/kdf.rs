//! Key derivation.
//!
//! `derive_pdk` — Argon2id over the master password and the per-vault salt,
//! producing the 32-byte key that wraps the MEK.
//!
//! `derive_entry_key` — HKDF-SHA256 (RFC 5869, extract-then-expand) from the
//! MEK and a per-row salt, producing the per-entry AES key.

use argon2::{Algorithm, Argon2, Params, Version};
use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::{Mek, Pdk, KEY_LEN};

/// Minimum accepted Argon2 salt length in bytes (96 bits).
pub const MIN_SALT_LEN: usize = 12;

/// Salt length written into fresh vault headers.
pub const DEFAULT_SALT_LEN: usize = 12;

/// Tunable Argon2id parameters, persisted verbatim in the vault header so an
/// existing vault keeps unlocking after the defaults change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Params {
    pub memory_mb: u32,
    pub time: u32,
    pub parallelism: u32,
    pub salt_len: usize,
    pub key_len: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_mb: 64,
            time: 3,
            parallelism: 1,
            salt_len: DEFAULT_SALT_LEN,
            key_len: KEY_LEN as u32,
        }
    }
}

impl Argon2Params {
    fn validate(&self) -> Result<(), CryptoError> {
        if self.memory_mb == 0 {
            return Err(CryptoError::InvalidParams("memory must be positive".into()));
        }
        if self.time == 0 {
            return Err(CryptoError::InvalidParams("time must be positive".into()));
        }
        if self.parallelism == 0 {
            return Err(CryptoError::InvalidParams(
                "parallelism must be positive".into(),
            ));
        }
        if self.key_len as usize != KEY_LEN {
            return Err(CryptoError::InvalidParams(format!(
                "key length must be {KEY_LEN}"
            )));
        }
        if self.salt_len < MIN_SALT_LEN {
            return Err(CryptoError::InvalidParams(format!(
                "salt length must be at least {MIN_SALT_LEN}"
            )));
        }
        Ok(())
    }
}

/// Derive the password-derived key from a master password and vault salt.
pub fn derive_pdk(password: &[u8], salt: &[u8], params: &Argon2Params) -> Result<Pdk, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::InvalidKey("password is required".into()));
    }
    if salt.len() < MIN_SALT_LEN {
        return Err(CryptoError::InvalidSalt(format!(
            "salt must be at least {MIN_SALT_LEN} bytes"
        )));
    }
    params.validate()?;

    let argon_params = Params::new(
        params.memory_mb * 1024,
        params.time,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| CryptoError::InvalidParams(e.to_string()))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password, salt, &mut output[..])
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

    Ok(Pdk(*output))
}

/// Expand `ikm` + `salt` + `info` into `output.len()` bytes of key material.
pub fn hkdf_sha256(
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
    output: &mut [u8],
) -> Result<(), CryptoError> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    hk.expand(info, output)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))
}

/// Derive the 32-byte per-entry key from the MEK and a per-row salt.
/// The caller must not persist the result; drop zeroizes it.
pub fn derive_entry_key(
    mek: &Mek,
    salt: &[u8],
    info: &[u8],
) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    hkdf_sha256(mek.as_bytes(), salt, info, &mut key[..])?;
    Ok(key)
}
