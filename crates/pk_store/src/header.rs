//! Vault header: KDF parameters, vault salt, and the wrapped MEK.
//!
//! The header is the only place the MEK touches disk, always AEAD-wrapped
//! under the PDK with fixed associated data `"header.mek"`. Saves go through
//! a same-directory temp file and an atomic rename; a crash mid-save leaves
//! either the old or the new header, never a torn one.

use std::io::Write;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pk_crypto::aead;
use pk_crypto::kdf::{Argon2Params, MIN_SALT_LEN};
use pk_crypto::{Mek, Pdk};

use crate::error::StoreError;
use crate::paths::{restrict_file_mode, Paths};

pub const HEADER_VERSION: u32 = 1;
pub const KDF_NAME: &str = "argon2id";

const MEK_AAD: &[u8] = b"header.mek";
const WRAPPED_MEK_LEN: usize = 32 + aead::TAG_LEN;

/// Key-derivation parameters as persisted in `header.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KdfConfig {
    pub name: String,
    #[serde(rename = "memoryMB")]
    pub memory_mb: u32,
    pub time: u32,
    pub parallelism: u32,
    pub salt_len: usize,
    pub key_len: u32,
}

impl From<&Argon2Params> for KdfConfig {
    fn from(p: &Argon2Params) -> Self {
        Self {
            name: KDF_NAME.to_string(),
            memory_mb: p.memory_mb,
            time: p.time,
            parallelism: p.parallelism,
            salt_len: p.salt_len,
            key_len: p.key_len,
        }
    }
}

impl KdfConfig {
    pub fn to_params(&self) -> Argon2Params {
        Argon2Params {
            memory_mb: self.memory_mb,
            time: self.time,
            parallelism: self.parallelism,
            salt_len: self.salt_len,
            key_len: self.key_len,
        }
    }
}

/// Metadata persisted alongside the vault contents.
///
/// `salt`, `wrap_nonce`, and `wrapped_mek` are either all present
/// (initialised vault) or all absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultHeader {
    pub version: u32,
    pub user: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap_nonce: Option<String>,
    #[serde(rename = "wrappedMEK", default, skip_serializing_if = "Option::is_none")]
    pub wrapped_mek: Option<String>,
    pub kdf: KdfConfig,
}

impl VaultHeader {
    /// Fresh, not-yet-initialised header.
    pub fn new(user: &str, params: &Argon2Params) -> Self {
        let now = Utc::now();
        Self {
            version: HEADER_VERSION,
            user: user.to_string(),
            created_at: now,
            updated_at: now,
            salt: None,
            wrap_nonce: None,
            wrapped_mek: None,
            kdf: KdfConfig::from(params),
        }
    }

    /// True when the header carries a wrapped MEK.
    pub fn is_initialized(&self) -> bool {
        self.salt.is_some() && self.wrap_nonce.is_some() && self.wrapped_mek.is_some()
    }

    /// Decode the stored vault salt.
    pub fn decode_salt(&self) -> Result<Vec<u8>, StoreError> {
        let b64 = self
            .salt
            .as_deref()
            .ok_or_else(|| StoreError::InvalidHeader("salt missing".into()))?;
        let salt = B64.decode(b64).map_err(pk_crypto::CryptoError::from)?;
        if salt.len() != self.kdf.salt_len || salt.len() < MIN_SALT_LEN {
            return Err(StoreError::InvalidHeader(format!(
                "salt length {} does not match kdf.saltLen {}",
                salt.len(),
                self.kdf.salt_len
            )));
        }
        Ok(salt)
    }

    fn ensure_supported(&self) -> Result<(), StoreError> {
        if self.version != HEADER_VERSION {
            return Err(StoreError::Unsupported(format!(
                "header version {}",
                self.version
            )));
        }
        if self.kdf.name != KDF_NAME {
            return Err(StoreError::Unsupported(format!("kdf {:?}", self.kdf.name)));
        }
        if self.kdf.key_len != 32 {
            return Err(StoreError::InvalidHeader(format!(
                "kdf.keyLen {} (expected 32)",
                self.kdf.key_len
            )));
        }
        Ok(())
    }
}

/// Read `header.json` from the vault directory.
pub fn load_header(paths: &Paths) -> Result<VaultHeader, StoreError> {
    let data = match std::fs::read(paths.header_path()) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::HeaderNotFound)
        }
        Err(e) => return Err(StoreError::Io(e)),
    };
    serde_json::from_slice(&data).map_err(StoreError::CorruptHeader)
}

/// Persist the header atomically with mode 0600.
pub fn save_header(paths: &Paths, hdr: &VaultHeader) -> Result<(), StoreError> {
    paths.ensure_dir()?;

    let data = serde_json::to_vec_pretty(hdr)
        .map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let mut tmp = tempfile::Builder::new()
        .prefix("header-")
        .suffix(".json")
        .tempfile_in(paths.dir())?;
    tmp.write_all(&data)?;
    tmp.flush()?;
    restrict_file_mode(tmp.path())?;

    tmp.persist(paths.header_path())
        .map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// Wrap the MEK under `pdk` and persist the updated header.
pub fn wrap_and_save(
    paths: &Paths,
    hdr: &mut VaultHeader,
    pdk: &Pdk,
    mek: &Mek,
) -> Result<(), StoreError> {
    hdr.ensure_supported()?;

    let (nonce, ciphertext) = aead::encrypt(pdk.as_bytes(), mek.as_bytes(), MEK_AAD)?;
    hdr.wrap_nonce = Some(B64.encode(nonce));
    hdr.wrapped_mek = Some(B64.encode(&ciphertext));
    hdr.updated_at = Utc::now();

    save_header(paths, hdr)
}

/// Load the header and unwrap the MEK with `pdk`.
pub fn load_and_unwrap(paths: &Paths, pdk: &Pdk) -> Result<(Mek, VaultHeader), StoreError> {
    let hdr = load_header(paths)?;
    hdr.ensure_supported()?;

    if !hdr.is_initialized() {
        if hdr.salt.is_some() || hdr.wrap_nonce.is_some() || hdr.wrapped_mek.is_some() {
            return Err(StoreError::InvalidHeader(
                "salt, wrapNonce, and wrappedMEK must all be present or all absent".into(),
            ));
        }
        return Err(StoreError::MekNotWrapped);
    }

    let nonce = B64
        .decode(hdr.wrap_nonce.as_deref().unwrap_or_default())
        .map_err(pk_crypto::CryptoError::from)?;
    let wrapped = B64
        .decode(hdr.wrapped_mek.as_deref().unwrap_or_default())
        .map_err(pk_crypto::CryptoError::from)?;
    if nonce.len() != aead::NONCE_LEN {
        return Err(StoreError::InvalidHeader("wrapNonce must be 12 bytes".into()));
    }
    if wrapped.len() != WRAPPED_MEK_LEN {
        return Err(StoreError::InvalidHeader(format!(
            "wrappedMEK must be {WRAPPED_MEK_LEN} bytes"
        )));
    }

    let plaintext = aead::decrypt(pdk.as_bytes(), &nonce, &wrapped, MEK_AAD)?;
    let mek = Mek::from_slice(&plaintext).map_err(StoreError::Crypto)?;
    Ok((mek, hdr))
}

/// Replace the wrapped MEK under a newly derived PDK. The header must
/// already be initialised.
pub fn rewrap(
    paths: &Paths,
    hdr: &mut VaultHeader,
    new_pdk: &Pdk,
    mek: &Mek,
) -> Result<(), StoreError> {
    if !hdr.is_initialized() {
        return Err(StoreError::MekNotWrapped);
    }
    wrap_and_save(paths, hdr, new_pdk, mek)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pk_crypto::kdf::{derive_pdk, Argon2Params};

    fn fast_params() -> Argon2Params {
        Argon2Params {
            memory_mb: 1,
            time: 1,
            parallelism: 1,
            ..Argon2Params::default()
        }
    }

    fn test_paths() -> (tempfile::TempDir, Paths) {
        let tmp = tempfile::tempdir().unwrap();
        let paths = Paths::new(tmp.path().join("vault"));
        (tmp, paths)
    }

    fn pdk(password: &[u8], salt: &[u8]) -> Pdk {
        derive_pdk(password, salt, &fast_params()).unwrap()
    }

    #[test]
    fn missing_header_reports_not_found() {
        let (_tmp, paths) = test_paths();
        assert!(matches!(load_header(&paths), Err(StoreError::HeaderNotFound)));
    }

    #[test]
    fn corrupt_header_reported() {
        let (_tmp, paths) = test_paths();
        paths.ensure_dir().unwrap();
        std::fs::write(paths.header_path(), b"{not json").unwrap();
        assert!(matches!(load_header(&paths), Err(StoreError::CorruptHeader(_))));
    }

    #[test]
    fn wrap_roundtrip() {
        let (_tmp, paths) = test_paths();
        let salt = pk_crypto::rng::random_bytes(12);
        let key = pdk(b"master", &salt);
        let mek = Mek::generate();

        let mut hdr = VaultHeader::new("alice", &fast_params());
        hdr.salt = Some(B64.encode(&salt));
        wrap_and_save(&paths, &mut hdr, &key, &mek).unwrap();

        let (unwrapped, loaded) = load_and_unwrap(&paths, &key).unwrap();
        assert_eq!(unwrapped.as_bytes(), mek.as_bytes());
        assert_eq!(loaded.version, HEADER_VERSION);
        assert_eq!(loaded.kdf.name, KDF_NAME);
        assert!(loaded.is_initialized());
    }

    #[test]
    fn wrap_authenticity_wrong_pdk_fails() {
        let (_tmp, paths) = test_paths();
        let salt = pk_crypto::rng::random_bytes(12);
        let mek = Mek::generate();

        let mut hdr = VaultHeader::new("alice", &fast_params());
        hdr.salt = Some(B64.encode(&salt));
        wrap_and_save(&paths, &mut hdr, &pdk(b"master", &salt), &mek).unwrap();

        let err = load_and_unwrap(&paths, &pdk(b"wrong", &salt)).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Crypto(pk_crypto::CryptoError::AeadDecrypt)
        ));
    }

    #[test]
    fn uninitialized_header_reports_mek_not_wrapped() {
        let (_tmp, paths) = test_paths();
        let hdr = VaultHeader::new("alice", &fast_params());
        save_header(&paths, &hdr).unwrap();

        let salt = pk_crypto::rng::random_bytes(12);
        assert!(matches!(
            load_and_unwrap(&paths, &pdk(b"master", &salt)),
            Err(StoreError::MekNotWrapped)
        ));
    }

    #[test]
    fn unknown_version_is_fatal() {
        let (_tmp, paths) = test_paths();
        let salt = pk_crypto::rng::random_bytes(12);
        let key = pdk(b"master", &salt);
        let mek = Mek::generate();

        let mut hdr = VaultHeader::new("alice", &fast_params());
        hdr.salt = Some(B64.encode(&salt));
        wrap_and_save(&paths, &mut hdr, &key, &mek).unwrap();

        hdr.version = 2;
        save_header(&paths, &hdr).unwrap();
        assert!(matches!(
            load_and_unwrap(&paths, &key),
            Err(StoreError::Unsupported(_))
        ));
    }

    #[test]
    fn rewrap_requires_initialized_header() {
        let (_tmp, paths) = test_paths();
        let salt = pk_crypto::rng::random_bytes(12);
        let mut hdr = VaultHeader::new("alice", &fast_params());
        assert!(matches!(
            rewrap(&paths, &mut hdr, &pdk(b"new", &salt), &Mek::generate()),
            Err(StoreError::MekNotWrapped)
        ));
    }

    #[test]
    fn rewrap_switches_unlocking_pdk() {
        let (_tmp, paths) = test_paths();
        let salt = pk_crypto::rng::random_bytes(12);
        let old = pdk(b"old-master", &salt);
        let new = pdk(b"new-master", &salt);
        let mek = Mek::generate();

        let mut hdr = VaultHeader::new("alice", &fast_params());
        hdr.salt = Some(B64.encode(&salt));
        wrap_and_save(&paths, &mut hdr, &old, &mek).unwrap();

        let (_, mut current) = load_and_unwrap(&paths, &old).unwrap();
        rewrap(&paths, &mut current, &new, &mek).unwrap();

        assert!(load_and_unwrap(&paths, &old).is_err());
        let (unwrapped, _) = load_and_unwrap(&paths, &new).unwrap();
        assert_eq!(unwrapped.as_bytes(), mek.as_bytes());
    }

    // A stray temp file from an interrupted save must not break the vault:
    // the rename is the commit point, so the previous header stays intact.
    #[test]
    fn interrupted_save_leaves_old_header_parseable() {
        let (_tmp, paths) = test_paths();
        let salt = pk_crypto::rng::random_bytes(12);
        let key = pdk(b"master", &salt);
        let mek = Mek::generate();

        let mut hdr = VaultHeader::new("alice", &fast_params());
        hdr.salt = Some(B64.encode(&salt));
        wrap_and_save(&paths, &mut hdr, &key, &mek).unwrap();

        std::fs::write(paths.dir().join("header-interrupted.json"), b"partial").unwrap();

        let (unwrapped, _) = load_and_unwrap(&paths, &key).unwrap();
        assert_eq!(unwrapped.as_bytes(), mek.as_bytes());
    }

    #[cfg(unix)]
    #[test]
    fn header_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let (_tmp, paths) = test_paths();
        let hdr = VaultHeader::new("alice", &fast_params());
        save_header(&paths, &hdr).unwrap();
        let mode = std::fs::metadata(paths.header_path())
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn wire_field_names_match_format() {
        let mut hdr = VaultHeader::new("alice", &fast_params());
        hdr.salt = Some("c2FsdA==".into());
        hdr.wrap_nonce = Some("bm9uY2U=".into());
        hdr.wrapped_mek = Some("bWVr".into());
        let json = serde_json::to_string(&hdr).unwrap();
        for field in [
            "\"version\"",
            "\"user\"",
            "\"createdAt\"",
            "\"updatedAt\"",
            "\"salt\"",
            "\"wrapNonce\"",
            "\"wrappedMEK\"",
            "\"kdf\"",
            "\"memoryMB\"",
            "\"saltLen\"",
            "\"keyLen\"",
        ] {
            assert!(json.contains(field), "missing {field} in {json}");
        }
    }
}
