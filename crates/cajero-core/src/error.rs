//! # Error Types
//!
//! Domain-specific error types for cajero-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  cajero-core errors (this file)                                        │
//! │  ├── CoreError        - Domain and rendering failures                  │
//! │  └── ValidationError  - Checkout preconditions / input validation      │
//! │                                                                         │
//! │  cajero-db errors          └── DbError                                 │
//! │  cajero-sunat errors       └── SubmissionError                         │
//! │  terminal errors           ├── CheckoutError                           │
//! │                            ├── IntegrationError                        │
//! │                            └── ConfigError                             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CheckoutError → CLI               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::{AuthorityStatus, DocumentKind};

// =============================================================================
// Core Error
// =============================================================================

/// Core fiscal logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested operation is not defined for this kind of document.
    ///
    /// ## When This Occurs
    /// - Rendering a sale note as UBL (sale notes never reach the authority)
    /// - Rendering or issuing a credit note (requires a referenced document)
    #[error("{operation} is not supported for {kind}")]
    UnsupportedKind {
        kind: DocumentKind,
        operation: &'static str,
    },

    /// The authority outcome of a document was already recorded.
    ///
    /// The authority record changes exactly once, from `Pending`.
    #[error("Document {number} already has authority status {status:?}")]
    AuthorityAlreadyRecorded {
        number: String,
        status: AuthorityStatus,
    },

    /// A code read back from storage or a payload is not in its catalogue.
    #[error("Unknown {catalogue} code: {code}")]
    UnknownCode {
        catalogue: &'static str,
        code: String,
    },

    /// A summary payload could not be parsed.
    #[error("Malformed summary payload: {0}")]
    MalformedSummary(String),

    /// Writing the XML buffer failed.
    #[error("Failed to render document: {0}")]
    Render(#[from] std::io::Error),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any state changes: a failed checkout validation leaves the
/// cart, the history and the numbering untouched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. an 11-digit RUC with letters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The cart has no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// The selected client cannot receive this kind of document.
    ///
    /// ## Example
    /// ```text
    /// Factura + client with DNI ──► "Factura requires a client identified by RUC"
    /// ```
    #[error("{kind} requires a client identified by {required}")]
    ClientDocumentMismatch { kind: String, required: String },

    /// The operator must explicitly confirm before continuing.
    #[error("Confirmation required: {reason}")]
    ConfirmationRequired { reason: String },

    /// The document kind cannot be issued from a cart.
    #[error("{kind} cannot be issued from a cart")]
    KindNotIssuable { kind: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
