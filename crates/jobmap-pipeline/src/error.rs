use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode value for key {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no session credential available; sign in and reload the page")]
    MissingCredential,
}
