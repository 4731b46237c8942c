//! # Checkout Orchestrator
//!
//! Turns the cart into a finalized, submitted and stored document.
//!
//! ## Checkout State Machine
//! ```text
//!   CartOpen ──► Validating ──► Submitting ──► Finalized
//!                    │
//!                    └────────► Aborted   (nothing changed)
//! ```
//!
//! ## Pipeline
//! ```text
//! snapshot cart lines
//!   │
//! validate_checkout ─────────── Err ──► Aborted, cart untouched
//!   │
//! compute_totals
//!   │
//! ┌─ series lock ────────────────────────────────────────────────┐
//! │ history = store.documents_of_kind(kind)                      │
//! │ number  = numbering::assign(history, kind, profile)          │
//! │ doc     = Document::issue(..), summary                       │
//! │ gateway.submit(doc) ──► record_response ──► summary again    │
//! │ clear cart                                                   │
//! │ store.create_document(doc) ── Err ──► PersistenceFailed(doc) │
//! └──────────────────────────────────────────────────────────────┘
//!   │
//! Finalized
//! ```
//!
//! A rejected submission is still `Finalized`: the document is stored with
//! status `Rejected`. Nothing is retried.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cajero_core::summary::build_summary;
use cajero_core::validation::validate_checkout;
use cajero_core::{
    compute_totals, numbering, AuthorityStatus, Client, CompanyProfile, Document, DocumentKind,
    PaymentTerm,
};
use cajero_sunat::AuthorityGateway;
use tracing::{debug, error, info, warn};

use crate::error::CheckoutError;
use crate::state::CartState;
use crate::store::RecordStore;

/// Where a checkout is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    CartOpen,
    Validating,
    Submitting,
    Finalized,
    Aborted,
}

impl CheckoutState {
    pub fn can_transition_to(self, next: CheckoutState) -> bool {
        use CheckoutState::*;
        matches!(
            (self, next),
            (CartOpen, Validating)
                | (Validating, Submitting)
                | (Validating, Aborted)
                | (Submitting, Finalized)
        )
    }
}

/// What the cashier asked for.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub kind: DocumentKind,
    pub client: Option<Client>,
    pub payment_term: PaymentTerm,
    /// Operator confirmed a receipt for a client without identity document.
    pub confirm_undocumented: bool,
}

impl CheckoutRequest {
    pub fn new(kind: DocumentKind, client: Client) -> Self {
        CheckoutRequest {
            kind,
            client: Some(client),
            payment_term: PaymentTerm::Cash,
            confirm_undocumented: false,
        }
    }
}

/// One async lock per series, held from the history read through persistence.
#[derive(Debug, Default)]
pub struct SeriesLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SeriesLocks {
    pub fn lock_for(&self, series: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(series.to_string()).or_default().clone()
    }
}

pub struct Orchestrator {
    store: Arc<dyn RecordStore>,
    gateway: Arc<dyn AuthorityGateway>,
    locks: SeriesLocks,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn RecordStore>, gateway: Arc<dyn AuthorityGateway>) -> Self {
        Orchestrator {
            store,
            gateway,
            locks: SeriesLocks::default(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Runs one checkout of `cart` for `profile`.
    ///
    /// Returns the finalized document whether the authority accepted or
    /// rejected it; inspect `authority.status`.
    pub async fn checkout(
        &self,
        cart: &CartState,
        profile: &CompanyProfile,
        request: CheckoutRequest,
    ) -> Result<Document, CheckoutError> {
        let mut state = CheckoutState::CartOpen;
        let lines = cart.with_cart(|c| c.lines());
        advance(&mut state, CheckoutState::Validating);

        if let Err(e) = validate_checkout(
            request.kind,
            request.client.as_ref(),
            &lines,
            request.confirm_undocumented,
        ) {
            advance(&mut state, CheckoutState::Aborted);
            debug!(kind = %request.kind, error = %e, "Checkout aborted");
            return Err(e.into());
        }
        let client = request.client.unwrap_or_else(Client::anonymous);

        let totals = compute_totals(&lines);

        let series = numbering::series_for(request.kind, profile).to_string();
        let lock = self.locks.lock_for(&series);
        let _guard = lock.lock().await;

        let history = self.store.documents_of_kind(request.kind).await?;
        let number = numbering::assign(&history, request.kind, profile);
        debug!(kind = %request.kind, number = %number, "Number assigned");

        let mut doc = Document::issue(
            request.kind,
            number,
            profile.local_now(),
            client,
            request.payment_term,
            lines,
            totals,
        );
        doc.summary = build_summary(&doc, profile);

        advance(&mut state, CheckoutState::Submitting);
        let response = self.gateway.submit(&doc, profile).await?;
        doc.record_response(&response)?;
        doc.summary = build_summary(&doc, profile);

        if doc.authority.status == AuthorityStatus::Rejected {
            warn!(
                number = %doc.number(),
                description = %doc.authority.description,
                "Document rejected by the authority"
            );
        }

        cart.with_cart_mut(|c| c.clear());

        if let Err(source) = self.store.create_document(&doc).await {
            error!(
                number = %doc.number(),
                error = %source,
                "Document was submitted but could not be saved"
            );
            return Err(CheckoutError::PersistenceFailed {
                document: Box::new(doc),
                source,
            });
        }

        advance(&mut state, CheckoutState::Finalized);
        info!(
            number = %doc.number(),
            status = ?doc.authority.status,
            total = %doc.totals.rounded().grand_total,
            "Checkout finalized"
        );
        Ok(doc)
    }
}

fn advance(state: &mut CheckoutState, next: CheckoutState) {
    debug_assert!(state.can_transition_to(next), "{state:?} -> {next:?}");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use cajero_core::{IdentityDocType, Product, TaxCategory, UnitCode, ValidationError};
    use cajero_sunat::{FixedDecider, GatewayConfig, SimulatedGateway};
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Producto {id}"),
            category: "Abarrotes".to_string(),
            description: None,
            price_cents,
            stock: 50,
            tax_category: TaxCategory::Taxed,
            unit_code: UnitCode::Niu,
        }
    }

    fn client(doc_type: IdentityDocType, doc_number: &str) -> Client {
        Client {
            id: Some("c-1".to_string()),
            doc_type,
            doc_number: doc_number.to_string(),
            name: "MARIA QUISPE".to_string(),
            address: String::new(),
            phone: None,
            email: None,
        }
    }

    fn orchestrator(store: Arc<dyn RecordStore>, accept: bool) -> Orchestrator {
        let gateway =
            SimulatedGateway::with_decider(GatewayConfig::instant(), Arc::new(FixedDecider(accept)));
        Orchestrator::new(store, Arc::new(gateway))
    }

    fn cart_with(price_cents: i64, quantity: i64) -> CartState {
        let cart = CartState::new();
        cart.with_cart_mut(|c| c.add_item(&product("P0001", price_cents), quantity))
            .unwrap();
        cart
    }

    async fn seed_receipts(store: &MemoryStore, correlatives: &[u32]) {
        let profile = CompanyProfile::demo();
        for &n in correlatives {
            let items = vec![product("P0009", 100).to_line(1)];
            let totals = compute_totals(&items);
            let doc = Document::issue(
                DocumentKind::Receipt,
                cajero_core::SeriesNumber::new("B001", n),
                profile.local_now(),
                Client::anonymous(),
                PaymentTerm::Cash,
                items,
                totals,
            );
            store.create_document(&doc).await.unwrap();
        }
    }

    #[test]
    fn test_state_transitions() {
        use CheckoutState::*;
        assert!(CartOpen.can_transition_to(Validating));
        assert!(Validating.can_transition_to(Aborted));
        assert!(Submitting.can_transition_to(Finalized));
        assert!(!CartOpen.can_transition_to(Submitting));
        assert!(!Aborted.can_transition_to(Validating));
        assert!(!Finalized.can_transition_to(CartOpen));
    }

    #[tokio::test]
    async fn test_receipt_for_dni_client() {
        let store = Arc::new(MemoryStore::new());
        seed_receipts(&store, &[1, 2, 5]).await;
        let orchestrator = orchestrator(store.clone(), true);
        let cart = cart_with(11800, 1);

        let doc = orchestrator
            .checkout(
                &cart,
                &CompanyProfile::demo(),
                CheckoutRequest::new(DocumentKind::Receipt, client(IdentityDocType::Dni, "44556677")),
            )
            .await
            .unwrap();

        assert_eq!(doc.number(), "B001-00000006");
        let totals = doc.totals.rounded();
        assert_eq!(totals.taxed_base, dec!(100.00));
        assert_eq!(totals.tax_amount, dec!(18.00));
        assert_eq!(totals.grand_total, dec!(118.00));
        assert_eq!(doc.authority.status, AuthorityStatus::Accepted);
        assert!(doc.summary.starts_with("20123456789|03|B001|00000006|18.00|118.00|"));
        assert!(doc.summary.contains("|DNI|44556677|"));

        assert!(cart.with_cart(|c| c.is_empty()));
        assert_eq!(store.list_documents().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(store.clone(), true);

        let err = orchestrator
            .checkout(
                &CartState::new(),
                &CompanyProfile::demo(),
                CheckoutRequest::new(DocumentKind::Receipt, Client::anonymous()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Validation(ValidationError::EmptyCart)));
        assert!(store.list_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invoice_requires_ruc_client() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(store.clone(), true);
        let cart = cart_with(500, 2);

        let err = orchestrator
            .checkout(
                &cart,
                &CompanyProfile::demo(),
                CheckoutRequest::new(DocumentKind::Invoice, client(IdentityDocType::Dni, "44556677")),
            )
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(err.to_string().contains("RUC"));
        assert_eq!(cart.with_cart(|c| c.total_quantity()), 2);
        assert!(store.list_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undocumented_receipt_needs_confirmation() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(store.clone(), true);
        let cart = cart_with(500, 1);
        let profile = CompanyProfile::demo();

        let err = orchestrator
            .checkout(
                &cart,
                &profile,
                CheckoutRequest::new(DocumentKind::Receipt, Client::anonymous()),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::Validation(ValidationError::ConfirmationRequired { .. })
        ));

        let request = CheckoutRequest {
            confirm_undocumented: true,
            ..CheckoutRequest::new(DocumentKind::Receipt, Client::anonymous())
        };
        let doc = orchestrator.checkout(&cart, &profile, request).await.unwrap();
        assert_eq!(doc.correlative, 1);
    }

    #[tokio::test]
    async fn test_sale_note_is_internal_either_way() {
        for accept in [true, false] {
            let store = Arc::new(MemoryStore::new());
            let orchestrator = orchestrator(store.clone(), accept);
            let cart = cart_with(250, 4);

            let doc = orchestrator
                .checkout(
                    &cart,
                    &CompanyProfile::demo(),
                    CheckoutRequest::new(DocumentKind::SaleNote, Client::anonymous()),
                )
                .await
                .unwrap();

            assert_eq!(doc.series, "NV01");
            assert_eq!(doc.authority.status, AuthorityStatus::Internal);
            assert_eq!(doc.authority.signed_xml.as_deref(), Some(""));
        }
    }

    #[tokio::test]
    async fn test_rejected_document_is_stored() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(store.clone(), false);
        let cart = cart_with(11800, 1);

        let doc = orchestrator
            .checkout(
                &cart,
                &CompanyProfile::demo(),
                CheckoutRequest::new(
                    DocumentKind::Invoice,
                    client(IdentityDocType::Ruc, "20100070970"),
                ),
            )
            .await
            .unwrap();

        assert_eq!(doc.authority.status, AuthorityStatus::Rejected);
        assert!(doc.summary.ends_with("||"));
        let stored = store.find_document("F001", 1).await.unwrap().unwrap();
        assert_eq!(stored.authority.status, AuthorityStatus::Rejected);
    }

    struct FailingStore(MemoryStore);

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn list_clients(&self) -> StoreResult<Vec<Client>> {
            self.0.list_clients().await
        }
        async fn create_client(&self, client: &Client) -> StoreResult<Client> {
            self.0.create_client(client).await
        }
        async fn list_products(&self) -> StoreResult<Vec<Product>> {
            self.0.list_products().await
        }
        async fn create_product(&self, product: &Product) -> StoreResult<Product> {
            self.0.create_product(product).await
        }
        async fn list_documents(&self) -> StoreResult<Vec<Document>> {
            self.0.list_documents().await
        }
        async fn create_document(&self, doc: &Document) -> StoreResult<()> {
            Err(StoreError::Duplicate {
                what: "document number".to_string(),
                value: doc.number(),
            })
        }
        async fn load_profile(&self) -> StoreResult<Option<CompanyProfile>> {
            self.0.load_profile().await
        }
        async fn save_profile(&self, profile: &CompanyProfile) -> StoreResult<()> {
            self.0.save_profile(profile).await
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_carries_document() {
        let orchestrator = orchestrator(Arc::new(FailingStore(MemoryStore::new())), true);
        let cart = cart_with(11800, 1);

        let err = orchestrator
            .checkout(
                &cart,
                &CompanyProfile::demo(),
                CheckoutRequest::new(DocumentKind::Receipt, client(IdentityDocType::Dni, "44556677")),
            )
            .await
            .unwrap_err();

        let doc = err.document().expect("finalized document");
        assert_eq!(doc.authority.status, AuthorityStatus::Accepted);
        assert!(matches!(err, CheckoutError::PersistenceFailed { .. }));
        assert!(cart.with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_get_unique_numbers() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = Arc::new(orchestrator(store.clone(), true));
        let profile = CompanyProfile::demo();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let orchestrator = orchestrator.clone();
            let profile = profile.clone();
            handles.push(tokio::spawn(async move {
                let cart = cart_with(1000, 1);
                orchestrator
                    .checkout(
                        &cart,
                        &profile,
                        CheckoutRequest::new(
                            DocumentKind::Receipt,
                            client(IdentityDocType::Dni, "44556677"),
                        ),
                    )
                    .await
                    .unwrap()
                    .correlative
            }));
        }

        let mut numbers = HashSet::new();
        for handle in handles {
            numbers.insert(handle.await.unwrap());
        }
        assert_eq!(numbers, (1..=8).collect::<HashSet<u32>>());
    }
}
