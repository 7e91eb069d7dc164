//! pk_store — on-disk state for a Passkeep vault directory.
//!
//! A vault directory holds exactly two artifacts:
//! - `header.json` — KDF parameters, vault salt, and the wrapped MEK.
//!   Replaced atomically (write temp file, rename) so readers always see a
//!   complete header.
//! - `vault.db` — SQLite database of credential rows. Secrets only ever
//!   appear in the `encrypted_pass` blob.
//!
//! Both files are created with owner-only permissions where the OS supports
//! it (0600 files, 0700 directory).

pub mod db;
pub mod entries;
pub mod error;
pub mod header;
pub mod paths;

pub use db::EntryStore;
pub use entries::{EntryRow, EntrySummary};
pub use error::StoreError;
pub use header::{KdfConfig, VaultHeader};
pub use paths::Paths;
