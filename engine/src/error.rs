//! Error handling for the Distribution Ledger Platform
//!
//! Every service returns [`AppResult`]. Transactional failures roll back
//! fully; callers that need a machine-readable class use [`AppError::code`].

use thiserror::Error;

use shared::LedgerRuleError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors: rejected before any write
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("No price available for metric {0}")]
    NoPriceAvailable(uuid::Uuid),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error")]
    InternalError(#[from] anyhow::Error),
}

/// Result alias used throughout the engine
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Machine-readable error code for boundary callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
            AppError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            AppError::NoPriceAvailable(_) => "NO_PRICE_AVAILABLE",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            AppError::Internal(_) | AppError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<LedgerRuleError> for AppError {
    fn from(err: LedgerRuleError) -> Self {
        match err {
            LedgerRuleError::NonPositiveAmount => AppError::validation("amount", err.to_string()),
            LedgerRuleError::InsufficientStock { .. } => {
                AppError::InsufficientStock(err.to_string())
            }
        }
    }
}
