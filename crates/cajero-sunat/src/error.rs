//! # Submission Error Types
//!
//! A rejection by the authority is NOT an error: it comes back as an
//! `AuthorityResponse` with `success = false`. These variants cover the
//! cases where no response could be produced at all.

use cajero_core::CoreError;
use thiserror::Error;

/// Result type alias for submission operations.
pub type SubmissionResult<T> = Result<T, SubmissionError>;

#[derive(Debug, Error)]
pub enum SubmissionError {
    /// The document could not be rendered (e.g. a credit note).
    #[error("Cannot build the submission: {0}")]
    Render(#[from] CoreError),

    /// Invalid gateway configuration.
    #[error("Invalid gateway configuration: {0}")]
    InvalidConfig(String),

    /// Unknown environment name.
    #[error("Unknown authority environment: '{0}'. Valid options: beta, production")]
    UnknownEnvironment(String),
}

impl SubmissionError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            SubmissionError::InvalidConfig(_) | SubmissionError::UnknownEnvironment(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cajero_core::DocumentKind;

    #[test]
    fn test_error_display() {
        let err = SubmissionError::from(CoreError::UnsupportedKind {
            kind: DocumentKind::CreditNote,
            operation: "render",
        });
        assert!(err.to_string().starts_with("Cannot build the submission"));
        assert!(!err.is_config_error());
        assert!(SubmissionError::UnknownEnvironment("staging".into()).is_config_error());
    }
}
