//! Error types for Syndicate

use thiserror::Error;

use crate::types::Platform;

pub type Result<T> = std::result::Result<T, SyndicateError>;

#[derive(Error, Debug)]
pub enum SyndicateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Credential error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl SyndicateError {
    /// Returns the appropriate exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SyndicateError::Validation(_) => 3,
            SyndicateError::NotFound(_) => 4,
            SyndicateError::Platform(PlatformError::InvalidCredential { .. }) => 2,
            SyndicateError::Crypto(_) => 2,
            SyndicateError::Platform(_) => 1,
            SyndicateError::Config(_) => 1,
            SyndicateError::Database(_) => 1,
        }
    }

    /// Returns the HTTP status code used when this error crosses the HTTP boundary
    pub fn http_status(&self) -> u16 {
        match self {
            SyndicateError::Validation(_) => 400,
            SyndicateError::NotFound(_) => 404,
            SyndicateError::Platform(PlatformError::InvalidCredential { .. }) => 400,
            SyndicateError::Platform(PlatformError::Unavailable { .. }) => 502,
            SyndicateError::Crypto(_) => 400,
            SyndicateError::Config(_) => 500,
            SyndicateError::Database(_) => 500,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database operation failed: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// Failures reported by a platform publisher
///
/// Cloneable so that a single outcome can be both recorded in an aggregate
/// response and emitted as an event.
#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    #[error("{platform} rejected the API key: {message}. Please re-enter your {platform} API key in settings.")]
    InvalidCredential { platform: Platform, message: String },

    #[error("{platform} is unavailable{}: {message}", .status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Unavailable {
        platform: Platform,
        status: Option<u16>,
        message: String,
    },
}

/// Codec failures. Neither is retryable: the stored key has to be re-entered.
#[derive(Error, Debug, Clone)]
pub enum CryptoError {
    #[error("Failed to encrypt API key: {0}")]
    Encryption(String),

    #[error("Failed to decrypt API key: {0}. Please re-enter your API key.")]
    Decryption(String),

    #[error("Encryption key must not be empty")]
    InvalidKey,
}
