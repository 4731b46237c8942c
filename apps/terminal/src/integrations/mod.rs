//! # External Integrations
//!
//! Optional conveniences around the checkout. None of them can block a sale.
//!
//! ```text
//! ┌──────────────────────┐   bearer token   ┌──────────────────────────┐
//! │ IdentityLookup        │ ───────────────► │ DNI/RUC lookup provider  │
//! │  (add-client)         │ ◄─── JSON ────── │ {base}/reniec/dni        │
//! └──────────────────────┘                   │ {base}/sunat/ruc         │
//!        failure ──► manual entry            └──────────────────────────┘
//!
//! ┌──────────────────────┐   bearer token   ┌──────────────────────────┐
//! │ MessageDispatcher     │ ───────────────► │ messaging gateway        │
//! │  (send)               │                  │ instance endpoint        │
//! └──────────────────────┘                   └──────────────────────────┘
//!        failure ──► click-to-chat link
//! ```

pub mod identity;
pub mod messaging;

use async_trait::async_trait;
use cajero_core::{Client, CompanyProfile, Document, IdentityDocType};
use serde::{Deserialize, Serialize};

use crate::error::IntegrationResult;

pub use identity::{normalize_lookup_response, HttpIdentityLookup};
pub use messaging::{
    click_to_chat_link, compose_document_message, deliver_document, Delivery,
    HttpMessageDispatcher,
};

/// Name and address found for an identity document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub doc_type: IdentityDocType,
    pub doc_number: String,
    pub name: String,
    pub address: String,
}

impl IdentityRecord {
    /// A new, not yet stored client with these details.
    pub fn into_client(self) -> Client {
        Client {
            id: None,
            doc_type: self.doc_type,
            doc_number: self.doc_number,
            name: self.name,
            address: self.address,
            phone: None,
            email: None,
        }
    }
}

#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// `Ok(None)` when the provider does not know the number.
    async fn lookup(
        &self,
        doc_type: IdentityDocType,
        number: &str,
    ) -> IntegrationResult<Option<IdentityRecord>>;
}

#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    async fn send(
        &self,
        doc: &Document,
        profile: &CompanyProfile,
        recipient: &str,
    ) -> IntegrationResult<()>;
}
