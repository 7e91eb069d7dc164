//! Per-entry encryption.
//!
//! Every row gets its own 16-byte HKDF salt, so no two rows ever share an
//! AES key. The stored blob is the 12-byte GCM nonce followed by
//! ciphertext+tag.
//!
//! Decryption also re-encrypts the plaintext under fresh material and hands
//! the result back as `rotation`; the caller persists it when it differs
//! from what is stored. Surfacing the rotation in the return type keeps the
//! storage side effect out of the decrypt path itself.

use zeroize::Zeroizing;

use pk_crypto::{aead, kdf, Mek};

use crate::error::ServiceError;

pub const ENTRY_SALT_LEN: usize = 16;
const ENTRY_KEY_INFO: &[u8] = b"entry-key-v1";

/// Stored cipher material for one credential row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCipher {
    /// 16-byte HKDF salt.
    pub salt: Vec<u8>,
    /// AEAD nonce (12 bytes) followed by ciphertext+tag.
    pub blob: Vec<u8>,
}

/// Result of decrypting a row: the plaintext plus freshly rotated cipher
/// material the caller is responsible for persisting.
pub struct DecryptedEntry {
    pub plaintext: Zeroizing<String>,
    pub rotation: EntryCipher,
}

/// Encrypt a credential under the MEK with a fresh per-entry salt and nonce.
pub fn encrypt_entry(mek: &Mek, plaintext: &[u8]) -> Result<EntryCipher, ServiceError> {
    let salt = pk_crypto::rng::random_bytes(ENTRY_SALT_LEN);
    let per_key = kdf::derive_entry_key(mek, &salt, ENTRY_KEY_INFO)?;

    let (nonce, ciphertext) = aead::encrypt(&per_key, plaintext, &[])?;

    let mut blob = Vec::with_capacity(aead::NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);

    Ok(EntryCipher { salt, blob })
}

/// Decrypt a stored row and produce rotated cipher material for it.
pub fn decrypt_entry(mek: &Mek, salt: &[u8], blob: &[u8]) -> Result<DecryptedEntry, ServiceError> {
    if salt.len() != ENTRY_SALT_LEN {
        return Err(ServiceError::Crypto(pk_crypto::CryptoError::InvalidSalt(
            format!("entry salt must be {ENTRY_SALT_LEN} bytes"),
        )));
    }
    if blob.len() <= aead::NONCE_LEN {
        return Err(ServiceError::Crypto(pk_crypto::CryptoError::AeadDecrypt));
    }

    let per_key = kdf::derive_entry_key(mek, salt, ENTRY_KEY_INFO)?;
    let (nonce, ciphertext) = blob.split_at(aead::NONCE_LEN);
    let plaintext_bytes = aead::decrypt(&per_key, nonce, ciphertext, &[])?;

    let plaintext = Zeroizing::new(
        String::from_utf8(plaintext_bytes.to_vec())
            .map_err(|_| ServiceError::Crypto(pk_crypto::CryptoError::AeadDecrypt))?,
    );

    let rotation = encrypt_entry(mek, plaintext.as_bytes())?;

    Ok(DecryptedEntry { plaintext, rotation })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let mek = Mek::generate();
        let cipher = encrypt_entry(&mek, b"hunter2").unwrap();
        assert_eq!(cipher.salt.len(), ENTRY_SALT_LEN);
        assert!(cipher.blob.len() > aead::NONCE_LEN);

        let out = decrypt_entry(&mek, &cipher.salt, &cipher.blob).unwrap();
        assert_eq!(out.plaintext.as_str(), "hunter2");
    }

    #[test]
    fn rotation_differs_and_still_decrypts() {
        let mek = Mek::generate();
        let cipher = encrypt_entry(&mek, b"hunter2").unwrap();

        let first = decrypt_entry(&mek, &cipher.salt, &cipher.blob).unwrap();
        assert_ne!(first.rotation.salt, cipher.salt);
        assert_ne!(first.rotation.blob, cipher.blob);

        // The rotated material is a valid replacement for the row.
        let second = decrypt_entry(&mek, &first.rotation.salt, &first.rotation.blob).unwrap();
        assert_eq!(second.plaintext.as_str(), "hunter2");
        assert_ne!(second.rotation.blob, first.rotation.blob);
    }

    #[test]
    fn wrong_mek_fails() {
        let cipher = encrypt_entry(&Mek::generate(), b"secret").unwrap();
        assert!(decrypt_entry(&Mek::generate(), &cipher.salt, &cipher.blob).is_err());
    }

    #[test]
    fn malformed_inputs_rejected() {
        let mek = Mek::generate();
        let cipher = encrypt_entry(&mek, b"secret").unwrap();

        assert!(decrypt_entry(&mek, &cipher.salt[..8], &cipher.blob).is_err());
        assert!(decrypt_entry(&mek, &cipher.salt, &cipher.blob[..12]).is_err());
    }

    #[test]
    fn tampered_blob_fails() {
        let mek = Mek::generate();
        let mut cipher = encrypt_entry(&mek, b"secret").unwrap();
        let last = cipher.blob.len() - 1;
        cipher.blob[last] ^= 0x01;
        assert!(decrypt_entry(&mek, &cipher.salt, &cipher.blob).is_err());
    }
}
