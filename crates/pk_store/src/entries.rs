//! Credential row operations.

use rusqlite::{params, OptionalExtension};

use crate::db::EntryStore;
use crate::error::StoreError;

/// A full credential row. `blob` is the AEAD nonce concatenated with the
/// ciphertext and tag; `salt` feeds the per-entry HKDF derivation.
#[derive(Debug, Clone)]
pub struct EntryRow {
    pub id: i64,
    pub website: String,
    pub username: String,
    pub entry_type: String,
    pub salt: Vec<u8>,
    pub blob: Vec<u8>,
    pub created_at: String,
    pub updated_at: String,
}

/// Metadata-only listing row. Never carries ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub id: i64,
    pub website: String,
    pub username: String,
}

const ROW_COLUMNS: &str =
    "id, encrypted_pass, salt, website, username, type, created_at, updated_at";

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        blob: row.get(1)?,
        salt: row.get(2)?,
        website: row.get(3)?,
        username: row.get(4)?,
        entry_type: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn map_insert_err(err: rusqlite::Error) -> StoreError {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict
        }
        _ => StoreError::Database(err),
    }
}

impl EntryStore {
    /// Insert a new credential row, returning its id. A `(website,
    /// username)` collision reports `Conflict` rather than overwriting.
    pub fn insert(
        &self,
        website: &str,
        username: &str,
        entry_type: &str,
        salt: &[u8],
        blob: &[u8],
    ) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO passwords (encrypted_pass, salt, website, username, type)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![blob, salt, website, username, entry_type],
        )
        .map_err(map_insert_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// Replace the cipher material (and type) of an existing row. Used both
    /// by explicit updates and by read-rotation.
    pub fn update_cipher(
        &self,
        id: i64,
        entry_type: &str,
        salt: &[u8],
        blob: &[u8],
    ) -> Result<(), StoreError> {
        let changed = self.conn.lock().execute(
            "UPDATE passwords
                SET encrypted_pass = ?1, salt = ?2, type = ?3,
                    updated_at = CURRENT_TIMESTAMP
              WHERE id = ?4",
            params![blob, salt, entry_type, id],
        )?;
        if changed == 0 {
            return Err(StoreError::EntryNotFound);
        }
        Ok(())
    }

    /// All rows for a website, ordered by username.
    pub fn by_website(&self, website: &str) -> Result<Vec<EntryRow>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ROW_COLUMNS} FROM passwords WHERE website = ?1 ORDER BY username"
        ))?;
        let rows = stmt
            .query_map(params![website], row_to_entry)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// The single row for (website, username).
    pub fn by_site_and_user(&self, website: &str, username: &str) -> Result<EntryRow, StoreError> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                &format!(
                    "SELECT {ROW_COLUMNS} FROM passwords WHERE website = ?1 AND username = ?2"
                ),
                params![website, username],
                row_to_entry,
            )
            .optional()?;
        row.ok_or(StoreError::EntryNotFound)
    }

    /// Delete the row for (website, username).
    pub fn delete_by_site_and_user(&self, website: &str, username: &str) -> Result<(), StoreError> {
        let deleted = self.conn.lock().execute(
            "DELETE FROM passwords WHERE website = ?1 AND username = ?2",
            params![website, username],
        )?;
        if deleted == 0 {
            return Err(StoreError::EntryNotFound);
        }
        Ok(())
    }

    /// Metadata for every row, ordered by (website, username).
    pub fn list(&self) -> Result<Vec<EntrySummary>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt = conn
            .prepare("SELECT id, website, username FROM passwords ORDER BY website, username")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(EntrySummary {
                    id: row.get(0)?,
                    website: row.get(1)?,
                    username: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
