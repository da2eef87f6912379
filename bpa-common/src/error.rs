//! Error type shared by the BPA crates

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Storage failure (wraps sqlx::Error)
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Bootstrap config could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Stored analysis document could not be encoded or decoded
    #[error("Analysis document error: {0}")]
    Document(#[from] serde_json::Error),
}
