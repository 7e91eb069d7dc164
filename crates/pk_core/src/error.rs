use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("vault is locked")]
    Locked,

    #[error("vault already initialised; unlock instead")]
    AlreadyInitialized,

    #[error("username is required")]
    MissingUser,

    #[error("website and username are required")]
    MissingSiteOrUser,

    #[error("password cannot be empty")]
    EmptyPassword,

    #[error("master password does not meet the vault policy")]
    PolicyReject,

    #[error("user presence check failed")]
    PresenceDenied,

    #[error("unlock failed")]
    UnlockFailed,

    #[error("credential entry not found")]
    NotFound,

    #[error("credential entry already exists for this site and username")]
    Conflict,

    #[error(transparent)]
    Crypto(#[from] pk_crypto::CryptoError),

    #[error(transparent)]
    Store(pk_store::StoreError),
}

impl From<pk_store::StoreError> for ServiceError {
    fn from(err: pk_store::StoreError) -> Self {
        match err {
            pk_store::StoreError::EntryNotFound => ServiceError::NotFound,
            pk_store::StoreError::Conflict => ServiceError::Conflict,
            other => ServiceError::Store(other),
        }
    }
}
