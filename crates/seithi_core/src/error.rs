use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A single-entity lookup matched zero rows.
    #[error("{0} not found")]
    NotFound(String),

    /// Caller input was rejected before reaching the store.
    #[error("{0}")]
    Validation(String),

    /// Any query, connection or row-decoding failure.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
