//! Sending documents to the customer by chat message.
//!
//! ```text
//! deliver_document()
//!   ├─► dispatcher.send() ── Ok ──► Delivery::Sent
//!   └─────────────────────── Err ─► Delivery::Fallback(wa.me link)
//! ```

use async_trait::async_trait;
use cajero_core::money::format_amount;
use cajero_core::numbering::CORRELATIVE_WIDTH;
use cajero_core::{CompanyProfile, Document};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use super::MessageDispatcher;
use crate::config::IntegrationSettings;
use crate::error::{IntegrationError, IntegrationResult};

fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

fn grand_total(doc: &Document) -> String {
    format_amount(doc.totals.grand_total)
}

/// Full receipt message: issuer, number, date, client, total and lines.
pub fn compose_document_message(doc: &Document, profile: &CompanyProfile) -> String {
    let mut message = format!("*{}*\nRUC: {}\n\n", profile.legal_name, profile.ruc);
    message.push_str("Hola, adjuntamos su comprobante electrónico.\n\n");
    message.push_str(&format!(
        "📄 *{}*: {}-{:0width$}\n",
        doc.kind.label(),
        doc.series,
        doc.correlative,
        width = CORRELATIVE_WIDTH
    ));
    message.push_str(&format!("📅 *Fecha*: {}\n", doc.issued_at.format("%d/%m/%Y")));
    message.push_str(&format!("👤 *Cliente*: {}\n", doc.client.name));
    message.push_str(&format!("💰 *TOTAL*: S/ {}\n\n", grand_total(doc)));
    message.push_str("*Detalle:*\n");

    for item in &doc.items {
        message.push_str(&format!(
            "- {} x {} (S/ {})\n",
            item.quantity,
            item.description,
            item.line_total()
        ));
    }

    message.push_str("\nGracias por su preferencia.");
    message
}

/// Click-to-chat link used when the gateway cannot be reached.
pub fn click_to_chat_link(
    doc: &Document,
    profile: &CompanyProfile,
    phone: &str,
) -> IntegrationResult<String> {
    let digits = phone_digits(phone);
    if digits.is_empty() {
        return Err(IntegrationError::MissingRecipient);
    }

    let text = format!(
        "Hola, le escribo de *{}*. Aquí su comprobante *{} {}-{}* por el monto de *S/ {}*.",
        profile.legal_name,
        doc.kind.label(),
        doc.series,
        doc.correlative,
        grand_total(doc)
    );
    let url = Url::parse_with_params(&format!("https://wa.me/{digits}"), &[("text", text)])?;
    Ok(url.into())
}

/// Send endpoint for a messaging instance: a full URL or a provider id.
pub fn send_endpoint(instance: &str, messaging_base_url: &str) -> String {
    if instance.starts_with("http") {
        format!("{}/send-message", instance.trim_end_matches('/'))
    } else {
        format!(
            "{}/instance{}/sendMessage",
            messaging_base_url.trim_end_matches('/'),
            instance
        )
    }
}

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    phone: String,
    message: String,
    token: &'a str,
}

/// Dispatcher posting to the messaging gateway configured in the profile.
pub struct HttpMessageDispatcher {
    client: Client,
    base_url: String,
}

impl HttpMessageDispatcher {
    pub fn new(settings: &IntegrationSettings) -> IntegrationResult<Self> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(HttpMessageDispatcher {
            client,
            base_url: settings.messaging_base_url.clone(),
        })
    }
}

#[async_trait]
impl MessageDispatcher for HttpMessageDispatcher {
    async fn send(
        &self,
        doc: &Document,
        profile: &CompanyProfile,
        recipient: &str,
    ) -> IntegrationResult<()> {
        let instance = profile
            .messaging_instance
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(IntegrationError::NotConfigured("messaging instance"))?;
        let token = profile
            .messaging_token
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(IntegrationError::NotConfigured("messaging token"))?;

        let phone = phone_digits(recipient);
        if phone.is_empty() {
            return Err(IntegrationError::MissingRecipient);
        }

        let endpoint = Url::parse(&send_endpoint(instance, &self.base_url))?;
        debug!(endpoint = %endpoint, number = %doc.number(), "Sending document message");

        let payload = SendMessagePayload {
            phone,
            message: compose_document_message(doc, profile),
            token,
        };
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IntegrationError::Status(response.status().as_u16()));
        }
        info!(number = %doc.number(), "Document message sent");
        Ok(())
    }
}

/// Outcome of [`deliver_document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The gateway failed; the operator can open this link instead.
    Fallback(String),
}

/// Sends `doc` through `dispatcher`, falling back to a click-to-chat link.
pub async fn deliver_document(
    dispatcher: &dyn MessageDispatcher,
    doc: &Document,
    profile: &CompanyProfile,
    recipient: &str,
) -> IntegrationResult<Delivery> {
    match dispatcher.send(doc, profile, recipient).await {
        Ok(()) => Ok(Delivery::Sent),
        Err(IntegrationError::MissingRecipient) => Err(IntegrationError::MissingRecipient),
        Err(e) => {
            warn!(error = %e, number = %doc.number(), "Messaging failed, offering click-to-chat link");
            Ok(Delivery::Fallback(click_to_chat_link(doc, profile, recipient)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cajero_core::{
        compute_totals, Client, DocumentKind, LineItem, Money, PaymentTerm, SeriesNumber,
        TaxCategory, UnitCode,
    };
    use chrono::{FixedOffset, TimeZone};

    fn receipt() -> Document {
        let items = vec![
            LineItem {
                product_id: "P0001".to_string(),
                description: "Arroz Costeño 5kg".to_string(),
                unit_price: Money::from_cents(2450),
                quantity: 2,
                tax_category: TaxCategory::Taxed,
                unit_code: UnitCode::Niu,
            },
            LineItem {
                product_id: "P0002".to_string(),
                description: "Manzana Delicia".to_string(),
                unit_price: Money::from_cents(520),
                quantity: 1,
                tax_category: TaxCategory::Exempt,
                unit_code: UnitCode::Kgm,
            },
        ];
        let totals = compute_totals(&items);
        let issued_at = FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 5, 10, 30, 0)
            .unwrap();
        Document::issue(
            DocumentKind::Receipt,
            SeriesNumber::new("B001", 42),
            issued_at,
            Client {
                name: "ANA TORRES".to_string(),
                ..Client::anonymous()
            },
            PaymentTerm::Cash,
            items,
            totals,
        )
    }

    #[test]
    fn test_compose_document_message() {
        let message = compose_document_message(&receipt(), &CompanyProfile::demo());
        let expected = "*MI EMPRESA DEMO S.A.C.*\nRUC: 20123456789\n\n\
            Hola, adjuntamos su comprobante electrónico.\n\n\
            📄 *Boleta*: B001-00000042\n\
            📅 *Fecha*: 05/03/2026\n\
            👤 *Cliente*: ANA TORRES\n\
            💰 *TOTAL*: S/ 54.20\n\n\
            *Detalle:*\n\
            - 2 x Arroz Costeño 5kg (S/ 49.00)\n\
            - 1 x Manzana Delicia (S/ 5.20)\n\
            \nGracias por su preferencia.";
        assert_eq!(message, expected);
    }

    #[test]
    fn test_click_to_chat_link() {
        let link = click_to_chat_link(&receipt(), &CompanyProfile::demo(), "+51 987-654-321").unwrap();
        assert!(link.starts_with("https://wa.me/51987654321?text="));

        let url = Url::parse(&link).unwrap();
        let (_, text) = url.query_pairs().next().unwrap();
        assert_eq!(
            text,
            "Hola, le escribo de *MI EMPRESA DEMO S.A.C.*. Aquí su comprobante *Boleta B001-42* por el monto de *S/ 54.20*."
        );

        assert!(matches!(
            click_to_chat_link(&receipt(), &CompanyProfile::demo(), "n/a"),
            Err(IntegrationError::MissingRecipient)
        ));
    }

    #[test]
    fn test_send_endpoint() {
        assert_eq!(
            send_endpoint("https://gw.example.com/", "https://api.whatsapp-provider.com"),
            "https://gw.example.com/send-message"
        );
        assert_eq!(
            send_endpoint("1234", "https://api.whatsapp-provider.com"),
            "https://api.whatsapp-provider.com/instance1234/sendMessage"
        );
    }

    struct Unreachable;

    #[async_trait]
    impl MessageDispatcher for Unreachable {
        async fn send(&self, _: &Document, _: &CompanyProfile, _: &str) -> IntegrationResult<()> {
            Err(IntegrationError::Status(503))
        }
    }

    #[tokio::test]
    async fn test_delivery_falls_back_to_link() {
        let delivery = deliver_document(&Unreachable, &receipt(), &CompanyProfile::demo(), "987654321")
            .await
            .unwrap();
        assert!(matches!(delivery, Delivery::Fallback(link) if link.starts_with("https://wa.me/987654321")));
    }

    #[tokio::test]
    async fn test_unconfigured_profile_falls_back() {
        let dispatcher = HttpMessageDispatcher::new(&IntegrationSettings::default()).unwrap();
        let delivery = deliver_document(&dispatcher, &receipt(), &CompanyProfile::demo(), "987654321")
            .await
            .unwrap();
        assert!(matches!(delivery, Delivery::Fallback(_)));
    }
}
