//! # Terminal Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Checkout                           │
//! │                                                                         │
//! │  validate_checkout ── ValidationError ──┐                              │
//! │  numbering / record_response ─ CoreError ┤                              │
//! │  gateway.submit ─── SubmissionError ─────┼──► CheckoutError ──► CLI     │
//! │  history read ───── StoreError ──────────┤                              │
//! │  store document ─── StoreError ──────────┘    PersistenceFailed         │
//! │                                               carries the document      │
//! │                                                                         │
//! │  identity lookup / messaging ─── IntegrationError                      │
//! │        never reaches the checkout: callers fall back to manual entry    │
//! │        or the click-to-chat link                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejection by the authority is not an error: the checkout returns the
//! finalized document with status `Rejected`.

use cajero_core::{CoreError, Document, ValidationError};
use cajero_db::DbError;
use cajero_sunat::SubmissionError;
use thiserror::Error;

// =============================================================================
// Store Errors
// =============================================================================

/// Failures of a [`RecordStore`](crate::store::RecordStore).
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record with the same key already exists.
    #[error("Duplicate {what}: {value}")]
    Duplicate { what: String, value: String },

    /// The backing database failed.
    #[error("Database error: {0}")]
    Database(DbError),
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::UniqueViolation { field, value } => StoreError::Duplicate { what: field, value },
            other => StoreError::Database(other),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Checkout Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Preconditions unmet; nothing was changed.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),

    /// The authority could not be reached; no document was issued.
    #[error("Submission failed: {0}")]
    Submission(#[from] SubmissionError),

    /// The store failed before a number was assigned.
    #[error("Record store unavailable: {0}")]
    Store(#[from] StoreError),

    /// The document was submitted and finalized but could not be stored.
    ///
    /// The caller owns the only copy and must keep it.
    #[error("Document {} was issued but could not be saved: {source}", .document.number())]
    PersistenceFailed {
        document: Box<Document>,
        source: StoreError,
    },
}

impl CheckoutError {
    /// The finalized document, when the failure happened after submission.
    pub fn document(&self) -> Option<&Document> {
        match self {
            CheckoutError::PersistenceFailed { document, .. } => Some(document),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CheckoutError::Validation(_))
    }
}

// =============================================================================
// Integration Errors
// =============================================================================

/// Identity lookup and messaging failures.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// A credential or endpoint is missing from the company profile/config.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    /// The provider has no endpoint for this document type.
    #[error("Lookup is not available for {0}")]
    UnsupportedDocument(&'static str),

    #[error("No recipient phone number")]
    MissingRecipient,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider answered with status {0}")]
    Status(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

pub type IntegrationResult<T> = Result<T, IntegrationError>;

// =============================================================================
// Config Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Gateway(#[from] SubmissionError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
