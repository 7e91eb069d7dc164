//! Fixed-size key material wrappers, zeroized on drop.

use zeroize::ZeroizeOnDrop;

use crate::error::CryptoError;
use crate::rng;

pub const KEY_LEN: usize = 32;

/// Master encryption key — 32 random bytes generated once per vault,
/// kept wrapped on disk and unwrapped into RAM only while unlocked.
#[derive(Clone, ZeroizeOnDrop)]
pub struct Mek([u8; KEY_LEN]);

impl Mek {
    /// Generate a fresh random MEK (vault initialisation only).
    pub fn generate() -> Self {
        Self(rng::random_array())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKey(format!("MEK must be {KEY_LEN} bytes")))?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Mek {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Mek([REDACTED])")
    }
}

/// Password-derived key — Argon2id output used only to wrap/unwrap the MEK.
#[derive(ZeroizeOnDrop)]
pub struct Pdk(pub(crate) [u8; KEY_LEN]);

impl Pdk {
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for Pdk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Pdk([REDACTED])")
    }
}
