//! # Core Error Types
//!
//! Centralized error definitions for the autopay engine.
//! All errors implement `std::error::Error` and `std::fmt::Display`.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Errors returned to the request-handling layer.
///
/// Ledger failures are never returned here; they end up in the recorded
/// submission outcome.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Config(ConfigError),

    #[error(transparent)]
    Wallet(WalletError),
}

impl From<ConfigError> for CoreError {
    fn from(e: ConfigError) -> Self {
        CoreError::Config(e)
    }
}

impl From<WalletError> for CoreError {
    fn from(e: WalletError) -> Self {
        CoreError::Wallet(e)
    }
}

/// Configuration-related errors, including rejected send configurations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: '{field}'")]
    MissingField { field: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub fn missing(field: &str) -> Self {
        ConfigError::MissingField {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the offending field.
    pub fn field(&self) -> &str {
        match self {
            ConfigError::MissingField { field } | ConfigError::InvalidValue { field, .. } => field,
        }
    }
}

/// Wallet and key derivation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("Invalid mnemonic phrase: {reason}")]
    InvalidPhrase { reason: String },

    #[error("Invalid key material: {reason}")]
    InvalidKey { reason: String },

    #[error("Key derivation failed: {reason}")]
    DerivationFailed { reason: String },

    #[error("No wallet loaded")]
    NotLoaded,
}

/// Network and ledger transport errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Request timeout after {timeout_ms}ms to {endpoint}")]
    Timeout { timeout_ms: u64, endpoint: String },

    #[error("Rate limited by {endpoint}: retry after {retry_after}s")]
    RateLimited { endpoint: String, retry_after: u64 },

    #[error("Connection refused to {endpoint}: {reason}")]
    ConnectionRefused { endpoint: String, reason: String },

    #[error("HTTP error {status_code} from {endpoint}")]
    HttpError { status_code: u16, endpoint: String },

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },
}

/// Errors raised by a Ledger Gateway while building, signing or submitting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Signing failed: {reason}")]
    Signing { reason: String },

    #[error("Rejected by ledger: {reason}")]
    Rejected { reason: String },
}

impl LedgerError {
    pub fn validation(reason: impl Into<String>) -> Self {
        LedgerError::Validation {
            reason: reason.into(),
        }
    }

    pub fn signing(reason: impl Into<String>) -> Self {
        LedgerError::Signing {
            reason: reason.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        LedgerError::Rejected {
            reason: reason.into(),
        }
    }

    /// Classification recorded in the wallet's last result.
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::Network(_) => ErrorKind::NetworkError,
            LedgerError::Validation { .. } => ErrorKind::ValidationError,
            LedgerError::Signing { .. } => ErrorKind::SigningError,
            LedgerError::Rejected { .. } => ErrorKind::RejectedError,
        }
    }

    /// Only transport failures are worth repeating; the ledger's verdict is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, LedgerError::Network(_))
    }
}

/// Failure classes of a submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    ValidationError,
    SigningError,
    NetworkError,
    RejectedError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::SigningError => "SigningError",
            ErrorKind::NetworkError => "NetworkError",
            ErrorKind::RejectedError => "RejectedError",
        };
        f.write_str(name)
    }
}
