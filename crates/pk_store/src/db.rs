//! SQLite-backed credential store.
//!
//! The schema is ensured idempotently on every open, so the host can open
//! the database lazily per request without a separate migration step. The
//! database file is restricted to the owner on platforms with POSIX modes;
//! concurrent access from other processes is not supported.

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::Connection;

use crate::error::StoreError;
use crate::paths::{create_private_dir, restrict_file_mode};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS passwords (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    encrypted_pass BLOB     NOT NULL,
    salt           BLOB     NOT NULL,
    website        TEXT     NOT NULL,
    username       TEXT     NOT NULL,
    type           TEXT     NOT NULL DEFAULT 'password',
    created_at     DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at     DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE(website, username)
);

CREATE UNIQUE INDEX IF NOT EXISTS uniq_passwords_site_user
    ON passwords(website, username);
";

/// Open credential database. Interior mutex serialises access; the host
/// handles requests sequentially, so contention is not expected.
pub struct EntryStore {
    pub(crate) conn: Mutex<Connection>,
}

impl EntryStore {
    /// Open (or create) the database at `path`, ensuring the schema and
    /// owner-only file permissions.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                create_private_dir(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        restrict_file_mode(path)?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        tracing::debug!(path = %path.display(), "credential store opened");
        Ok(store)
    }

    /// In-memory database for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<(), StoreError> {
        self.conn.lock().execute_batch(SCHEMA)?;
        Ok(())
    }
}
