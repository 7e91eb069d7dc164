//! Locations of vault artifacts on disk.

use std::path::{Path, PathBuf};

use crate::error::StoreError;

const HEADER_FILENAME: &str = "header.json";
const DB_FILENAME: &str = "vault.db";

/// Resolves vault artifact paths inside one vault directory.
#[derive(Debug, Clone)]
pub struct Paths {
    dir: PathBuf,
}

impl Paths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn header_path(&self) -> PathBuf {
        self.dir.join(HEADER_FILENAME)
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.join(DB_FILENAME)
    }

    /// Create the vault directory with owner-only permissions if missing.
    pub fn ensure_dir(&self) -> Result<(), StoreError> {
        if self.dir.as_os_str().is_empty() {
            return Err(StoreError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "vault directory not specified",
            )));
        }
        create_private_dir(&self.dir)
    }
}

#[cfg(unix)]
pub(crate) fn create_private_dir(dir: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn create_private_dir(dir: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

/// Restrict a file to owner read/write. No-op on platforms without POSIX
/// modes.
#[cfg(unix)]
pub(crate) fn restrict_file_mode(path: &Path) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(StoreError::Io(e)),
    }
}

#[cfg(not(unix))]
pub(crate) fn restrict_file_mode(_path: &Path) -> Result<(), StoreError> {
    Ok(())
}
