//! # Authority Gateway
//!
//! Submits finished documents to the tax authority and returns its verdict.
//!
//! ## Simulated sendBill Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleNote ──► sleep(sale_note_delay) ──► success, "internal use",       │
//! │                                          no XML, no digest              │
//! │                                                                         │
//! │  Invoice / Receipt                                                      │
//! │     │                                                                   │
//! │     ├─► ubl::render(doc, issuer)                                        │
//! │     ├─► file name  RUC-TYPE-SERIES-NNNNNNNN.zip                         │
//! │     ├─► SOAP envelope (debug log only, password masked)                 │
//! │     ├─► sleep(latency)                                                  │
//! │     └─► decider.accepts(doc)?                                           │
//! │            ├─ yes ─► success, signed XML, DigestValue, CDR reference    │
//! │            └─ no  ─► failure 0156, unsigned XML kept for audit          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is sent over the network and nothing is really signed.

use std::sync::Arc;

use async_trait::async_trait;
use cajero_core::numbering::CORRELATIVE_WIDTH;
use cajero_core::ubl::{self, extract_digest, placeholder_digest};
use cajero_core::{AuthorityResponse, CompanyProfile, Document, DocumentKind};
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::decider::{AcceptanceDecider, RandomDecider};
use crate::error::SubmissionResult;

/// Description returned for sale notes.
pub const SALE_NOTE_DESCRIPTION: &str = "Nota de Venta generada. Uso interno, no se envía a SUNAT.";

/// Description returned for every simulated rejection.
pub const REJECTION_DESCRIPTION: &str =
    "Error 0156: El archivo ZIP esta corrupto o no contiene el XML esperado (Simulación de error SUNAT).";

/// The seam between checkout and the tax authority.
#[async_trait]
pub trait AuthorityGateway: Send + Sync {
    /// Submits `doc` on behalf of `issuer`.
    ///
    /// A rejection is returned as `Ok` with `success = false`.
    async fn submit(
        &self,
        doc: &Document,
        issuer: &CompanyProfile,
    ) -> SubmissionResult<AuthorityResponse>;
}

/// In-process stand-in for the authority's `billService`.
pub struct SimulatedGateway {
    config: GatewayConfig,
    decider: Arc<dyn AcceptanceDecider>,
}

impl SimulatedGateway {
    /// Gateway deciding with a [`RandomDecider`] built from `config`.
    pub fn new(config: GatewayConfig) -> SubmissionResult<Self> {
        config.validate()?;
        let decider = RandomDecider::new(config.success_rate, config.seed);
        Ok(Self::with_decider(config, Arc::new(decider)))
    }

    pub fn with_decider(config: GatewayConfig, decider: Arc<dyn AcceptanceDecider>) -> Self {
        SimulatedGateway { config, decider }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn submit_sale_note(&self, doc: &Document) -> AuthorityResponse {
        debug!(number = %doc.number(), "Registering sale note locally");
        sleep(self.config.sale_note_delay()).await;

        AuthorityResponse {
            success: true,
            description: SALE_NOTE_DESCRIPTION.to_string(),
            signed_xml: String::new(),
            digest: None,
            cdr_reference: None,
            ticket: None,
        }
    }

    async fn send_bill(
        &self,
        doc: &Document,
        issuer: &CompanyProfile,
    ) -> SubmissionResult<AuthorityResponse> {
        let xml = ubl::render(doc, issuer)?;
        let file_name = bill_file_name(doc, issuer);

        debug!(
            endpoint = self.config.environment.endpoint(),
            file = %file_name,
            sol_user = %issuer.sol_user,
            "Sending bill (simulated)"
        );
        debug!(envelope = %soap_envelope(&file_name, issuer), "SOAP envelope");
        debug!(bytes = xml.len(), "UBL document rendered");

        sleep(self.config.latency()).await;

        if !self.decider.accepts(doc) {
            warn!(number = %doc.number(), "Authority rejected the document");
            return Ok(AuthorityResponse {
                success: false,
                description: REJECTION_DESCRIPTION.to_string(),
                signed_xml: xml,
                digest: None,
                cdr_reference: None,
                ticket: None,
            });
        }

        let digest = extract_digest(&xml)
            .map(str::to_string)
            .unwrap_or_else(|| placeholder_digest(doc, issuer));

        info!(number = %doc.number(), kind = %doc.kind, "Authority accepted the document");

        Ok(AuthorityResponse {
            success: true,
            description: format!(
                "La {} número {}-{} ha sido ACEPTADA en el entorno de {}.",
                doc.kind.label(),
                doc.series,
                doc.correlative,
                self.config.environment.label()
            ),
            signed_xml: xml,
            digest: Some(digest),
            cdr_reference: Some(format!("R-{file_name}")),
            ticket: None,
        })
    }
}

#[async_trait]
impl AuthorityGateway for SimulatedGateway {
    async fn submit(
        &self,
        doc: &Document,
        issuer: &CompanyProfile,
    ) -> SubmissionResult<AuthorityResponse> {
        match doc.kind {
            DocumentKind::SaleNote => Ok(self.submit_sale_note(doc).await),
            _ => self.send_bill(doc, issuer).await,
        }
    }
}

/// `sendBill` archive name: `RUC-TYPE-SERIES-NNNNNNNN.zip`.
pub fn bill_file_name(doc: &Document, issuer: &CompanyProfile) -> String {
    format!(
        "{}-{}-{}-{:0width$}.zip",
        issuer.ruc,
        doc.kind.code(),
        doc.series,
        doc.correlative,
        width = CORRELATIVE_WIDTH
    )
}

// The envelope is only ever logged, so the password is never written into it.
fn soap_envelope(file_name: &str, issuer: &CompanyProfile) -> String {
    format!(
        r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/" xmlns:ser="http://service.sunat.gob.pe" xmlns:wsse="http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd">
    <soapenv:Header>
        <wsse:Security>
            <wsse:UsernameToken>
                <wsse:Username>{}{}</wsse:Username>
                <wsse:Password>***</wsse:Password>
            </wsse:UsernameToken>
        </wsse:Security>
    </soapenv:Header>
    <soapenv:Body>
        <ser:sendBill>
            <fileName>{}</fileName>
            <contentFile>BASE64_ZIP</contentFile>
        </ser:sendBill>
    </soapenv:Body>
</soapenv:Envelope>"#,
        issuer.ruc, issuer.sol_user, file_name
    )
}

async fn sleep(duration: std::time::Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decider::FixedDecider;
    use cajero_core::{
        compute_totals, Client, IdentityDocType, LineItem, Money, PaymentTerm, SeriesNumber,
        TaxCategory, UnitCode,
    };
    use std::time::Duration;

    fn document(kind: DocumentKind, series: &str, correlative: u32) -> Document {
        let items = vec![LineItem {
            product_id: "P0001".to_string(),
            description: "Arroz Costeño 5kg".to_string(),
            unit_price: Money::from_cents(11800),
            quantity: 1,
            tax_category: TaxCategory::Taxed,
            unit_code: UnitCode::Niu,
        }];
        let totals = compute_totals(&items);
        let client = Client {
            id: None,
            doc_type: IdentityDocType::Ruc,
            doc_number: "20100070970".to_string(),
            name: "SUPERMERCADOS PERUANOS S.A.".to_string(),
            address: String::new(),
            phone: None,
            email: None,
        };
        Document::issue(
            kind,
            SeriesNumber::new(series, correlative),
            CompanyProfile::demo().local_now(),
            client,
            PaymentTerm::Cash,
            items,
            totals,
        )
    }

    fn gateway(accept: bool) -> SimulatedGateway {
        SimulatedGateway::with_decider(GatewayConfig::instant(), Arc::new(FixedDecider(accept)))
    }

    #[test]
    fn test_bill_file_name() {
        let doc = document(DocumentKind::Invoice, "F001", 12);
        assert_eq!(
            bill_file_name(&doc, &CompanyProfile::demo()),
            "20123456789-01-F001-00000012.zip"
        );
    }

    #[test]
    fn test_envelope_masks_password() {
        let mut issuer = CompanyProfile::demo();
        issuer.sol_password = "s3cret-pass".to_string();
        let envelope = soap_envelope("x.zip", &issuer);
        assert!(envelope.contains("<wsse:Username>20123456789MODDATOS</wsse:Username>"));
        assert!(!envelope.contains("s3cret-pass"));
    }

    #[tokio::test]
    async fn test_accepted_invoice() {
        let issuer = CompanyProfile::demo();
        let doc = document(DocumentKind::Invoice, "F001", 3);
        let response = gateway(true).submit(&doc, &issuer).await.unwrap();

        assert!(response.success);
        assert_eq!(
            response.description,
            "La Factura número F001-3 ha sido ACEPTADA en el entorno de PRUEBAS (BETA)."
        );
        assert!(response.signed_xml.contains("<cbc:ID>F001-00000003</cbc:ID>"));
        assert_eq!(
            response.digest.as_deref(),
            extract_digest(&response.signed_xml)
        );
        assert_eq!(
            response.cdr_reference.as_deref(),
            Some("R-20123456789-01-F001-00000003.zip")
        );
    }

    #[tokio::test]
    async fn test_rejected_receipt_keeps_unsigned_xml() {
        let issuer = CompanyProfile::demo();
        let doc = document(DocumentKind::Receipt, "B001", 9);
        let response = gateway(false).submit(&doc, &issuer).await.unwrap();

        assert!(!response.success);
        assert!(response.description.starts_with("Error 0156"));
        assert_eq!(response.signed_xml, ubl::render(&doc, &issuer).unwrap());
        assert!(response.digest.is_none());
    }

    #[tokio::test]
    async fn test_sale_note_ignores_decider() {
        let issuer = CompanyProfile::demo();
        let doc = document(DocumentKind::SaleNote, "NV01", 1);

        for accept in [true, false] {
            let response = gateway(accept).submit(&doc, &issuer).await.unwrap();
            assert!(response.success);
            assert!(response.signed_xml.is_empty());
            assert!(response.digest.is_none());
        }
    }

    #[tokio::test]
    async fn test_credit_note_is_not_submittable() {
        let issuer = CompanyProfile::demo();
        let doc = document(DocumentKind::CreditNote, "FC01", 1);
        assert!(gateway(true).submit(&doc, &issuer).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_is_simulated() {
        let config = GatewayConfig {
            latency_ms: 2000,
            ..GatewayConfig::instant()
        };
        let gateway = SimulatedGateway::with_decider(config, Arc::new(FixedDecider::accept()));
        let doc = document(DocumentKind::Receipt, "B001", 1);

        let start = tokio::time::Instant::now();
        gateway.submit(&doc, &CompanyProfile::demo()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(2000));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = GatewayConfig {
            success_rate: 2.0,
            ..GatewayConfig::instant()
        };
        assert!(SimulatedGateway::new(config).is_err());
    }
}
