use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("AEAD encryption failed")]
    AeadEncrypt,

    #[error("AEAD decryption failed (authentication tag mismatch or wrong key)")]
    AeadDecrypt,

    #[error("invalid nonce length: expected {expected}, got {got}")]
    InvalidNonce { expected: usize, got: usize },

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("invalid KDF salt: {0}")]
    InvalidSalt(String),

    #[error("invalid KDF parameters: {0}")]
    InvalidParams(String),

    #[error("base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}
