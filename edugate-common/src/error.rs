// ================================================================
// File: edugate-common/src/error.rs
// ================================================================

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A single failed input check, reported back to the caller per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Why a write was refused by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictCause {
    /// The transaction lost a race (serialization failure, deadlock). Retryable.
    WriteConflict,
    /// A pool with at least one used code cannot be deleted.
    PoolHasUsedCodes,
    /// A freshly generated code value already exists somewhere.
    CodeCollision,
}

impl fmt::Display for ConflictCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictCause::WriteConflict => write!(f, "transaction write conflict"),
            ConflictCause::PoolHasUsedCodes => write!(f, "codes group has used codes"),
            ConflictCause::CodeCollision => write!(f, "generated code collided with an existing one"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Validation error: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    #[error("Code already used")]
    CodeAlreadyUsed,

    #[error("Codes group has expired")]
    PoolExpired,

    #[error("Already redeemed a code from this group")]
    DuplicateRedemptionInPool,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(ConflictCause),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Address parse error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("Key derivation error: {0}")]
    KeyDerivation(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),
}

impl Error {
    /// Shorthand for a validation failure on one field.
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Error::Validation(vec![FieldError::new(field, message)])
    }

    /// True for failures a client may simply resubmit.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Conflict(ConflictCause::WriteConflict))
    }
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}
