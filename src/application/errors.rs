//! Application layer errors

use thiserror::Error;

/// Errors raised by entity constructors and transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::Validation(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        DomainError::InvalidOperation(msg.into())
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Lock poisoned: {0}")]
    Lock(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}

/// Outbound chat transport errors
#[derive(Error, Debug)]
pub enum MessagingError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Email delivery errors
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("Customer has no email address")]
    MissingRecipient,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Email API error ({code}): {description}")]
    Api { code: u16, description: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Anything that can abort a single conversation turn
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Messaging error: {0}")]
    Messaging(#[from] MessagingError),
}
