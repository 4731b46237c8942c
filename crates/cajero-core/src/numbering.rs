//! # Document Numbering
//!
//! Assigns `series-correlative` identifiers.
//!
//! ```text
//! history: B001-1, B001-2, B001-5, F001-1
//!
//! next_correlative(history, Receipt) = 6
//! next_correlative(history, Invoice) = 2
//! next_correlative(history, SaleNote) = 1
//! ```
//!
//! There is no stored counter: the next number is always recomputed from the
//! authoritative document history. Callers serialize assignment per series
//! (see the terminal's checkout locks) so two checkouts never read the same
//! maximum.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{CompanyProfile, Document, DocumentKind};

/// Series used by every sale note, regardless of the company profile.
pub const SALE_NOTE_SERIES: &str = "NV01";

/// Zero-padded width of the correlative in the document number.
pub const CORRELATIVE_WIDTH: usize = 8;

/// A series plus its correlative, e.g. `F001-00000012`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesNumber {
    pub series: String,
    pub correlative: u32,
}

impl SeriesNumber {
    pub fn new(series: impl Into<String>, correlative: u32) -> Self {
        SeriesNumber {
            series: series.into(),
            correlative,
        }
    }

    /// Correlative zero-padded to eight digits.
    pub fn padded_correlative(&self) -> String {
        format!("{:0width$}", self.correlative, width = CORRELATIVE_WIDTH)
    }
}

impl fmt::Display for SeriesNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.series, self.padded_correlative())
    }
}

/// Highest correlative among documents of `kind`, plus one; 1 when none.
pub fn next_correlative(history: &[Document], kind: DocumentKind) -> u32 {
    history
        .iter()
        .filter(|doc| doc.kind == kind)
        .map(|doc| doc.correlative)
        .max()
        .map_or(1, |max| max + 1)
}

/// Series configured for `kind`.
pub fn series_for(kind: DocumentKind, profile: &CompanyProfile) -> &str {
    match kind {
        DocumentKind::Invoice => &profile.invoice_series,
        DocumentKind::Receipt => &profile.receipt_series,
        DocumentKind::CreditNote => &profile.credit_note_series,
        DocumentKind::SaleNote => SALE_NOTE_SERIES,
    }
}

/// Series and next correlative for a new document of `kind`.
pub fn assign(history: &[Document], kind: DocumentKind, profile: &CompanyProfile) -> SeriesNumber {
    SeriesNumber::new(series_for(kind, profile), next_correlative(history, kind))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tax::TaxBreakdown;
    use crate::types::{Client, PaymentTerm};

    fn doc(kind: DocumentKind, series: &str, correlative: u32) -> Document {
        let profile = CompanyProfile::demo();
        Document::issue(
            kind,
            SeriesNumber::new(series, correlative),
            profile.local_now(),
            Client::anonymous(),
            PaymentTerm::Cash,
            Vec::new(),
            TaxBreakdown::default(),
        )
    }

    #[test]
    fn test_empty_history_starts_at_one() {
        assert_eq!(next_correlative(&[], DocumentKind::Receipt), 1);
    }

    #[test]
    fn test_gaps_are_not_filled() {
        let history = vec![
            doc(DocumentKind::Receipt, "B001", 1),
            doc(DocumentKind::Receipt, "B001", 2),
            doc(DocumentKind::Receipt, "B001", 5),
        ];
        assert_eq!(next_correlative(&history, DocumentKind::Receipt), 6);
    }

    #[test]
    fn test_other_kinds_are_ignored() {
        let history = vec![
            doc(DocumentKind::Invoice, "F001", 40),
            doc(DocumentKind::SaleNote, SALE_NOTE_SERIES, 7),
            doc(DocumentKind::Receipt, "B001", 3),
        ];
        assert_eq!(next_correlative(&history, DocumentKind::Receipt), 4);
        assert_eq!(next_correlative(&history, DocumentKind::CreditNote), 1);
    }

    #[test]
    fn test_series_for_each_kind() {
        let profile = CompanyProfile::demo();
        assert_eq!(series_for(DocumentKind::Invoice, &profile), "F001");
        assert_eq!(series_for(DocumentKind::Receipt, &profile), "B001");
        assert_eq!(series_for(DocumentKind::CreditNote, &profile), "FC01");
        assert_eq!(series_for(DocumentKind::SaleNote, &profile), "NV01");
    }

    #[test]
    fn test_assign_and_display() {
        let profile = CompanyProfile::demo();
        let history = vec![doc(DocumentKind::Invoice, "F001", 9)];
        let number = assign(&history, DocumentKind::Invoice, &profile);
        assert_eq!(number, SeriesNumber::new("F001", 10));
        assert_eq!(number.to_string(), "F001-00000010");
    }
}
