//! # Summary Payload
//!
//! The pipe-delimited string printed as the document's QR code:
//!
//! ```text
//! RUC|KIND|SERIES|NNNNNNNN|TAX|TOTAL|YYYY-MM-DD|CLIENT_DOC_TYPE|CLIENT_DOC_NUMBER|DIGEST|
//! 20123456789|03|B001|00000007|18.00|118.00|2024-05-10|DNI|44556677|q1w2...=|
//! ```
//!
//! The client document type is written as its label (`DNI`, `RUC`, `-`),
//! the kind as its authority code.
//!
//! Built twice during checkout: once before submission (empty digest) and
//! once after, with the digest returned by the authority.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::CoreError;
use crate::money::format_amount;
use crate::numbering::SeriesNumber;
use crate::types::{CompanyProfile, Document, DocumentKind, IdentityDocType};

/// Parsed summary payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryPayload {
    pub ruc: String,
    pub kind: DocumentKind,
    pub number: SeriesNumber,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,
    pub issue_date: String,
    pub client_doc_type: IdentityDocType,
    pub client_doc_number: String,
    pub digest: String,
}

impl SummaryPayload {
    /// Payload of `doc`, using its recorded digest (empty when none).
    pub fn for_document(doc: &Document, issuer: &CompanyProfile) -> Self {
        let totals = doc.totals.rounded();
        SummaryPayload {
            ruc: issuer.ruc.clone(),
            kind: doc.kind,
            number: SeriesNumber::new(doc.series.clone(), doc.correlative),
            tax_amount: totals.tax_amount,
            grand_total: totals.grand_total,
            issue_date: doc.issue_date(),
            client_doc_type: doc.client.doc_type,
            client_doc_number: doc.client.doc_number.clone(),
            digest: doc.authority.digest.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for SummaryPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|",
            self.ruc,
            self.kind.code(),
            self.number.series,
            self.number.padded_correlative(),
            format_amount(self.tax_amount),
            format_amount(self.grand_total),
            self.issue_date,
            self.client_doc_type.label(),
            self.client_doc_number,
            self.digest,
        )
    }
}

impl FromStr for SummaryPayload {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split('|').collect();
        // Ten fields plus the empty one after the trailing pipe
        if fields.len() != 11 || !fields[10].is_empty() {
            return Err(CoreError::MalformedSummary(format!(
                "expected 10 fields, got {}",
                fields.len().saturating_sub(1)
            )));
        }

        let correlative = fields[3]
            .parse::<u32>()
            .map_err(|_| CoreError::MalformedSummary(format!("bad correlative {}", fields[3])))?;
        let amount = |text: &str| {
            text.parse::<Decimal>()
                .map_err(|_| CoreError::MalformedSummary(format!("bad amount {}", text)))
        };

        Ok(SummaryPayload {
            ruc: fields[0].to_string(),
            kind: DocumentKind::from_code(fields[1])?,
            number: SeriesNumber::new(fields[2], correlative),
            tax_amount: amount(fields[4])?,
            grand_total: amount(fields[5])?,
            issue_date: fields[6].to_string(),
            client_doc_type: fields[7].parse()?,
            client_doc_number: fields[8].to_string(),
            digest: fields[9].to_string(),
        })
    }
}

/// Summary payload text for `doc`.
pub fn build_summary(doc: &Document, issuer: &CompanyProfile) -> String {
    SummaryPayload::for_document(doc, issuer).to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::tax::compute_totals;
    use crate::types::{Client, LineItem, PaymentTerm, TaxCategory, UnitCode};
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal_macros::dec;

    fn receipt() -> Document {
        let items = vec![
            LineItem {
                product_id: "p-1".to_string(),
                description: "Aceite".to_string(),
                unit_price: Money::from_cents(1999),
                quantity: 3,
                tax_category: TaxCategory::Taxed,
                unit_code: UnitCode::Ltr,
            },
            LineItem {
                product_id: "p-2".to_string(),
                description: "Pan".to_string(),
                unit_price: Money::from_cents(45),
                quantity: 7,
                tax_category: TaxCategory::Exempt,
                unit_code: UnitCode::Niu,
            },
        ];
        let client = Client {
            id: None,
            doc_type: IdentityDocType::Dni,
            doc_number: "44556677".to_string(),
            name: "Ana Quispe".to_string(),
            address: String::new(),
            phone: None,
            email: None,
        };
        let issued_at = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 5, 10, 23, 59, 0)
            .unwrap();
        let totals = compute_totals(&items);
        Document::issue(
            DocumentKind::Receipt,
            SeriesNumber::new("B001", 7),
            issued_at,
            client,
            PaymentTerm::Cash,
            items,
            totals,
        )
    }

    #[test]
    fn test_payload_before_submission_has_empty_digest() {
        let doc = receipt();
        let payload = build_summary(&doc, &CompanyProfile::demo());
        assert_eq!(
            payload,
            "20123456789|03|B001|00000007|9.15|63.12|2024-05-10|DNI|44556677||"
        );
    }

    #[test]
    fn test_payload_carries_digest() {
        let mut doc = receipt();
        doc.authority.digest = Some("q1w2=".to_string());
        let payload = build_summary(&doc, &CompanyProfile::demo());
        assert!(payload.ends_with("|44556677|q1w2=|"));
    }

    #[test]
    fn test_total_matches_breakdown() {
        let doc = receipt();
        let parsed: SummaryPayload = build_summary(&doc, &CompanyProfile::demo()).parse().unwrap();
        assert_eq!(parsed.grand_total, doc.totals.rounded().grand_total);
        assert_eq!(parsed.grand_total, dec!(63.12));
        assert_eq!(parsed.number.correlative, 7);
        assert_eq!(parsed.client_doc_type, IdentityDocType::Dni);
    }

    #[test]
    fn test_undocumented_client_uses_dash() {
        let mut doc = receipt();
        doc.client = Client::anonymous();
        let payload = build_summary(&doc, &CompanyProfile::demo());
        assert!(payload.contains("|2024-05-10|-|"));

        let parsed: SummaryPayload = payload.parse().unwrap();
        assert_eq!(parsed.client_doc_type, IdentityDocType::None);
    }

    #[test]
    fn test_malformed_payload() {
        assert!("a|b|c".parse::<SummaryPayload>().is_err());
        assert!("20123456789|03|B001|x|1.00|2.00|2024-01-01|DNI|1||"
            .parse::<SummaryPayload>()
            .is_err());
    }
}
