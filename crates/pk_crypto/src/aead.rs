//! Authenticated encryption with associated data.
//!
//! AES-256-GCM. Key: 32 bytes. Nonce: 12 bytes (random per call). Tag: 16
//! bytes, appended to the ciphertext. Encryption returns the nonce and the
//! ciphertext separately; callers decide the storage layout (the entry store
//! prepends the nonce to the blob, the header keeps it in its own field).

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng as AeadOsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use zeroize::Zeroizing;

use crate::error::CryptoError;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under a 32-byte key with a fresh random nonce.
/// `aad` is authenticated but not encrypted.
pub fn encrypt(
    key: &[u8; KEY_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<([u8; NONCE_LEN], Vec<u8>), CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::AeadEncrypt)?;

    let nonce = Aes256Gcm::generate_nonce(&mut AeadOsRng);

    let ciphertext = cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::AeadEncrypt)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    nonce_bytes.copy_from_slice(&nonce);
    Ok((nonce_bytes, ciphertext))
}

/// Decrypt `ciphertext` (which carries the tag) under `key` and `nonce`.
pub fn decrypt(
    key: &[u8; KEY_LEN],
    nonce: &[u8],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if nonce.len() != NONCE_LEN {
        return Err(CryptoError::InvalidNonce {
            expected: NONCE_LEN,
            got: nonce.len(),
        });
    }

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::AeadDecrypt)?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), Payload { msg: ciphertext, aad })
        .map_err(|_| CryptoError::AeadDecrypt)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> [u8; KEY_LEN] {
        crate::rng::random_array()
    }

    #[test]
    fn roundtrip() {
        let k = key();
        let (nonce, ct) = encrypt(&k, b"hunter2", b"aad").unwrap();
        let pt = decrypt(&k, &nonce, &ct, b"aad").unwrap();
        assert_eq!(&pt[..], b"hunter2");
    }

    #[test]
    fn ciphertext_carries_tag() {
        let k = key();
        let (_, ct) = encrypt(&k, b"x", b"").unwrap();
        assert_eq!(ct.len(), 1 + TAG_LEN);
    }

    #[test]
    fn wrong_key_fails() {
        let (nonce, ct) = encrypt(&key(), b"secret", b"").unwrap();
        assert!(matches!(
            decrypt(&key(), &nonce, &ct, b""),
            Err(CryptoError::AeadDecrypt)
        ));
    }

    #[test]
    fn wrong_aad_fails() {
        let k = key();
        let (nonce, ct) = encrypt(&k, b"secret", b"right").unwrap();
        assert!(decrypt(&k, &nonce, &ct, b"wrong").is_err());
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let k = key();
        let (nonce, mut ct) = encrypt(&k, b"secret", b"").unwrap();
        ct[0] ^= 0xff;
        assert!(decrypt(&k, &nonce, &ct, b"").is_err());
    }

    #[test]
    fn bad_nonce_length_rejected() {
        let k = key();
        let (_, ct) = encrypt(&k, b"secret", b"").unwrap();
        assert!(matches!(
            decrypt(&k, &[0u8; 11], &ct, b""),
            Err(CryptoError::InvalidNonce { expected: 12, got: 11 })
        ));
    }

    #[test]
    fn nonces_differ_between_calls() {
        let k = key();
        let (n1, _) = encrypt(&k, b"p", b"").unwrap();
        let (n2, _) = encrypt(&k, b"p", b"").unwrap();
        assert_ne!(n1, n2);
    }
}
