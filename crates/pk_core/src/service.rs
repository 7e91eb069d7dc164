//! High-level vault operations for hosts and CLIs.
//!
//! The service owns the vault directory's stores and, while unlocked, the
//! MEK. Callers that manage the MEK lifetime themselves (the native host's
//! session manager) unwrap it with [`Service::unwrap_mek`] and inject a
//! per-request copy via [`Service::attach_mek`].

use zeroize::Zeroizing;

use pk_crypto::kdf::{self, Argon2Params};
use pk_crypto::{Mek, Pdk};
use pk_store::{header, EntryStore, EntrySummary, Paths, StoreError, VaultHeader};

use crate::entry_crypto::{self, EntryCipher};
use crate::error::ServiceError;
use crate::oracle::{BreachOracle, Presence, UserPresence};
use crate::policy::PasswordPolicy;

/// A decrypted credential as returned to callers.
pub struct Credential {
    pub username: String,
    pub password: Zeroizing<String>,
}

pub struct Service {
    store: EntryStore,
    paths: Paths,
    mek: Option<Mek>,
    kdf_params: Argon2Params,
    policy: PasswordPolicy,
    presence: Option<Box<dyn UserPresence>>,
    breach: Option<Box<dyn BreachOracle>>,
}

impl Service {
    /// Bind a service to a vault directory, opening (or creating) the
    /// credential database inside it.
    pub fn open(dir: impl Into<std::path::PathBuf>) -> Result<Self, ServiceError> {
        let paths = Paths::new(dir);
        let store = EntryStore::open(&paths.db_path())?;
        Ok(Self {
            store,
            paths,
            mek: None,
            kdf_params: Argon2Params::default(),
            policy: PasswordPolicy::default(),
            presence: None,
            breach: None,
        })
    }

    pub fn with_presence(mut self, presence: Box<dyn UserPresence>) -> Self {
        self.presence = Some(presence);
        self
    }

    pub fn with_breach(mut self, breach: Box<dyn BreachOracle>) -> Self {
        self.breach = Some(breach);
        self
    }

    /// Override the Argon2 cost parameters used for *new* salts
    /// (`set_master` / `change_master`). Unlock always honours whatever the
    /// header records.
    pub fn set_kdf_params(&mut self, params: Argon2Params) {
        self.kdf_params = params;
    }

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn is_unlocked(&self) -> bool {
        self.mek.is_some()
    }

    fn mek(&self) -> Result<&Mek, ServiceError> {
        self.mek.as_ref().ok_or(ServiceError::Locked)
    }

    /// True when the header is missing or carries no wrapped MEK.
    pub fn needs_master_setup(&self) -> Result<bool, ServiceError> {
        match header::load_header(&self.paths) {
            Ok(hdr) => Ok(!hdr.is_initialized()),
            Err(StoreError::HeaderNotFound) => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    /// Initialise the vault: run policy, derive a PDK over a fresh salt,
    /// generate a fresh MEK, and persist the wrapped header.
    pub fn set_master(&mut self, user: &str, master: &str) -> Result<(), ServiceError> {
        let user = user.trim();
        if user.is_empty() {
            return Err(ServiceError::MissingUser);
        }
        if master.is_empty() {
            return Err(ServiceError::EmptyPassword);
        }
        self.policy.validate(master, self.breach.as_deref())?;

        let mut hdr = match header::load_header(&self.paths) {
            Ok(existing) => {
                if existing.is_initialized() {
                    return Err(ServiceError::AlreadyInitialized);
                }
                VaultHeader {
                    user: user.to_string(),
                    kdf: (&self.kdf_params).into(),
                    ..existing
                }
            }
            Err(StoreError::HeaderNotFound) => VaultHeader::new(user, &self.kdf_params),
            Err(e) => return Err(e.into()),
        };

        let salt = pk_crypto::rng::random_bytes(self.kdf_params.salt_len);
        hdr.salt = Some(encode_b64(&salt));

        let pdk = kdf::derive_pdk(master.as_bytes(), &salt, &self.kdf_params)?;
        let mek = Mek::generate();
        header::wrap_and_save(&self.paths, &mut hdr, &pdk, &mek)?;

        tracing::info!(user, "vault initialised");
        self.mek = None;
        Ok(())
    }

    /// Derive the PDK from the stored header and unwrap the MEK, without
    /// touching service state. Failures are deliberately collapsed into one
    /// kind: callers cannot tell a wrong password from a corrupted header.
    pub fn unwrap_mek(&self, master: &str) -> Result<Mek, ServiceError> {
        self.try_unwrap(master).map_err(|e| {
            tracing::debug!(error = %e, "unlock failed");
            ServiceError::UnlockFailed
        })
    }

    fn try_unwrap(&self, master: &str) -> Result<Mek, ServiceError> {
        let hdr = header::load_header(&self.paths)?;
        let salt = hdr.decode_salt()?;
        let pdk: Pdk = kdf::derive_pdk(master.as_bytes(), &salt, &hdr.kdf.to_params())?;
        let (mek, _) = header::load_and_unwrap(&self.paths, &pdk)?;
        Ok(mek)
    }

    /// Unlock the vault, consulting the user-presence oracle first when one
    /// is configured. `Unsupported` is treated as not consulted.
    pub fn unlock(&mut self, master: &str) -> Result<(), ServiceError> {
        if let Some(presence) = &self.presence {
            match presence.confirm("Unlock the vault") {
                Presence::Confirmed | Presence::Unsupported => {}
                Presence::Denied => return Err(ServiceError::PresenceDenied),
            }
        }
        let mek = self.unwrap_mek(master)?;
        self.mek = Some(mek);
        Ok(())
    }

    /// Inject an already-unwrapped MEK (the host's per-request session copy).
    pub fn attach_mek(&mut self, mek: Mek) {
        self.mek = Some(mek);
    }

    /// Drop the cached MEK. Zeroized on drop.
    pub fn lock(&mut self) {
        self.mek = None;
    }

    /// Re-derive the PDK over a fresh salt and rewrap the MEK. Either the
    /// whole operation lands (single atomic header replace) or the header is
    /// left unchanged.
    pub fn change_master(&mut self, old_master: &str, new_master: &str) -> Result<(), ServiceError> {
        if old_master.is_empty() || new_master.is_empty() {
            return Err(ServiceError::EmptyPassword);
        }
        self.policy.validate(new_master, self.breach.as_deref())?;

        let hdr = header::load_header(&self.paths)?;
        let old_salt = hdr.decode_salt()?;
        let params = hdr.kdf.to_params();

        let old_pdk = kdf::derive_pdk(old_master.as_bytes(), &old_salt, &params)?;
        let (mek, mut current) = header::load_and_unwrap(&self.paths, &old_pdk)
            .map_err(|_| ServiceError::UnlockFailed)?;

        let new_salt = pk_crypto::rng::random_bytes(self.kdf_params.salt_len);
        let new_pdk = kdf::derive_pdk(new_master.as_bytes(), &new_salt, &self.kdf_params)?;

        current.salt = Some(encode_b64(&new_salt));
        current.kdf = (&self.kdf_params).into();
        header::rewrap(&self.paths, &mut current, &new_pdk, &mek)?;

        tracing::info!("master password changed");
        self.mek = Some(mek);
        Ok(())
    }

    /// Encrypt and store a new credential. Fails with `Conflict` when the
    /// (website, username) pair already exists.
    pub fn add(&self, website: &str, username: &str, plaintext: &str) -> Result<i64, ServiceError> {
        let mek = self.mek()?;
        if website.is_empty() || username.trim().is_empty() {
            return Err(ServiceError::MissingSiteOrUser);
        }
        if plaintext.is_empty() {
            return Err(ServiceError::EmptyPassword);
        }

        let cipher = entry_crypto::encrypt_entry(mek, plaintext.as_bytes())?;
        let id = self
            .store
            .insert(website, username, "password", &cipher.salt, &cipher.blob)?;
        Ok(id)
    }

    /// Decrypt the credential for (website, username), persisting the
    /// rotated cipher material before returning.
    pub fn get(&self, website: &str, username: &str) -> Result<Zeroizing<String>, ServiceError> {
        let mek = self.mek()?;
        let row = self.store.by_site_and_user(website, username)?;

        let decrypted = entry_crypto::decrypt_entry(mek, &row.salt, &row.blob)?;
        self.persist_rotation(row.id, &row.entry_type, &row.salt, &row.blob, &decrypted.rotation)?;
        Ok(decrypted.plaintext)
    }

    /// Credential lookup for the native host. With a username, at most that
    /// row; without one, the first decryptable row by ascending username.
    pub fn find_for_site(
        &self,
        website: &str,
        username: Option<&str>,
    ) -> Result<Vec<Credential>, ServiceError> {
        let mek = self.mek()?;
        let mut out = Vec::new();

        match username {
            Some(user) => {
                let row = self.store.by_site_and_user(website, user)?;
                if let Ok(decrypted) = entry_crypto::decrypt_entry(mek, &row.salt, &row.blob) {
                    self.persist_rotation(
                        row.id,
                        &row.entry_type,
                        &row.salt,
                        &row.blob,
                        &decrypted.rotation,
                    )?;
                    out.push(Credential {
                        username: row.username,
                        password: decrypted.plaintext,
                    });
                }
            }
            None => {
                for row in self.store.by_website(website)? {
                    if let Ok(decrypted) = entry_crypto::decrypt_entry(mek, &row.salt, &row.blob) {
                        self.persist_rotation(
                            row.id,
                            &row.entry_type,
                            &row.salt,
                            &row.blob,
                            &decrypted.rotation,
                        )?;
                        out.push(Credential {
                            username: row.username,
                            password: decrypted.plaintext,
                        });
                        break;
                    }
                }
            }
        }

        Ok(out)
    }

    fn persist_rotation(
        &self,
        id: i64,
        entry_type: &str,
        old_salt: &[u8],
        old_blob: &[u8],
        rotation: &EntryCipher,
    ) -> Result<(), ServiceError> {
        if rotation.salt.as_slice() != old_salt || rotation.blob.as_slice() != old_blob {
            self.store
                .update_cipher(id, entry_type, &rotation.salt, &rotation.blob)?;
        }
        Ok(())
    }

    /// Replace the password (and optionally the type) of an existing entry.
    /// An empty `new_type` keeps the stored type.
    pub fn update(
        &self,
        website: &str,
        username: &str,
        new_type: Option<&str>,
        new_plaintext: &str,
    ) -> Result<(), ServiceError> {
        let mek = self.mek()?;
        if website.is_empty() || username.trim().is_empty() {
            return Err(ServiceError::MissingSiteOrUser);
        }
        if new_plaintext.is_empty() {
            return Err(ServiceError::EmptyPassword);
        }

        let row = self.store.by_site_and_user(website, username)?;
        let entry_type = match new_type {
            Some(t) if !t.is_empty() => t,
            _ => row.entry_type.as_str(),
        };

        let cipher = entry_crypto::encrypt_entry(mek, new_plaintext.as_bytes())?;
        self.store
            .update_cipher(row.id, entry_type, &cipher.salt, &cipher.blob)?;
        Ok(())
    }

    /// Remove the credential for (website, username).
    pub fn delete(&self, website: &str, username: &str) -> Result<(), ServiceError> {
        self.mek()?;
        if website.is_empty() || username.trim().is_empty() {
            return Err(ServiceError::MissingSiteOrUser);
        }
        self.store.delete_by_site_and_user(website, username)?;
        Ok(())
    }

    /// Metadata-only listing of all entries.
    pub fn list(&self) -> Result<Vec<EntrySummary>, ServiceError> {
        self.mek()?;
        Ok(self.store.list()?)
    }

    /// Raw cipher material for a row — test/diagnostic support for
    /// observing rotation without decrypting.
    pub fn raw_cipher(&self, website: &str, username: &str) -> Result<EntryCipher, ServiceError> {
        let row = self.store.by_site_and_user(website, username)?;
        Ok(EntryCipher {
            salt: row.salt,
            blob: row.blob,
        })
    }
}

fn encode_b64(bytes: &[u8]) -> String {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    STANDARD.encode(bytes)
}
