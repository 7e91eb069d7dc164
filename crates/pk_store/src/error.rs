use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("vault header not found")]
    HeaderNotFound,

    #[error("vault header is corrupt: {0}")]
    CorruptHeader(#[source] serde_json::Error),

    #[error("unsupported vault header: {0}")]
    Unsupported(String),

    #[error("vault header invalid: {0}")]
    InvalidHeader(String),

    #[error("wrapped MEK not present in header")]
    MekNotWrapped,

    #[error("header I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Crypto(#[from] pk_crypto::CryptoError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("credential entry not found")]
    EntryNotFound,

    #[error("credential entry already exists for this site and username")]
    Conflict,
}
