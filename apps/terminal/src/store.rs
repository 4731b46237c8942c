//! # Record Store
//!
//! The persistence seam used by the orchestrator and the CLI.
//!
//! ```text
//! ┌──────────────────┐        ┌─────────────────────────────┐
//! │   Orchestrator   │        │  impl RecordStore            │
//! │   ClientsState   │ ─────► │   cajero_db::Database (SQL)  │
//! │   CLI commands   │        │   MemoryStore (tests, demo)  │
//! └──────────────────┘        └─────────────────────────────┘
//! ```
//!
//! Both implementations reject a second document with the same
//! `(kind, series, correlative)` as [`StoreError::Duplicate`].

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use cajero_core::{Client, CompanyProfile, Document, DocumentKind, Product};
use cajero_db::Database;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_clients(&self) -> StoreResult<Vec<Client>>;

    /// Persists `client` and returns it with the store-assigned id.
    async fn create_client(&self, client: &Client) -> StoreResult<Client>;

    async fn list_products(&self) -> StoreResult<Vec<Product>>;

    async fn create_product(&self, product: &Product) -> StoreResult<Product>;

    /// All documents, newest first.
    async fn list_documents(&self) -> StoreResult<Vec<Document>>;

    async fn create_document(&self, doc: &Document) -> StoreResult<()>;

    async fn load_profile(&self) -> StoreResult<Option<CompanyProfile>>;

    async fn save_profile(&self, profile: &CompanyProfile) -> StoreResult<()>;

    /// Documents of one kind; the numbering history.
    async fn documents_of_kind(&self, kind: DocumentKind) -> StoreResult<Vec<Document>> {
        Ok(self
            .list_documents()
            .await?
            .into_iter()
            .filter(|d| d.kind == kind)
            .collect())
    }

    async fn find_document(&self, series: &str, correlative: u32) -> StoreResult<Option<Document>> {
        Ok(self
            .list_documents()
            .await?
            .into_iter()
            .find(|d| d.series == series && d.correlative == correlative))
    }
}

// =============================================================================
// SQLite
// =============================================================================

#[async_trait]
impl RecordStore for Database {
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        Ok(self.clients().list().await?)
    }

    async fn create_client(&self, client: &Client) -> StoreResult<Client> {
        Ok(self.clients().create(client).await?)
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        Ok(self.products().list().await?)
    }

    async fn create_product(&self, product: &Product) -> StoreResult<Product> {
        Ok(self.products().create(product).await?)
    }

    async fn list_documents(&self) -> StoreResult<Vec<Document>> {
        Ok(self.documents().list().await?)
    }

    async fn create_document(&self, doc: &Document) -> StoreResult<()> {
        Ok(self.documents().create(doc).await?)
    }

    async fn load_profile(&self) -> StoreResult<Option<CompanyProfile>> {
        Ok(self.company().load().await?)
    }

    async fn save_profile(&self, profile: &CompanyProfile) -> StoreResult<()> {
        Ok(self.company().save(profile).await?)
    }

    async fn documents_of_kind(&self, kind: DocumentKind) -> StoreResult<Vec<Document>> {
        Ok(self.documents().list_by_kind(kind).await?)
    }

    async fn find_document(&self, series: &str, correlative: u32) -> StoreResult<Option<Document>> {
        Ok(self.documents().find_by_number(series, correlative).await?)
    }
}

// =============================================================================
// In-memory
// =============================================================================

#[derive(Debug, Default)]
struct Records {
    clients: Vec<Client>,
    products: Vec<Product>,
    documents: Vec<Document>,
    profile: Option<CompanyProfile>,
}

/// Volatile store for tests and demo runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Records>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with a company profile.
    pub fn with_profile(profile: CompanyProfile) -> Self {
        let store = Self::new();
        store.lock().profile = Some(profile);
        store
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_clients(&self) -> StoreResult<Vec<Client>> {
        let mut clients = self.lock().clients.clone();
        clients.sort_by_key(|c| c.name.to_lowercase());
        Ok(clients)
    }

    async fn create_client(&self, client: &Client) -> StoreResult<Client> {
        let stored = Client {
            id: Some(Uuid::new_v4().to_string()),
            ..client.clone()
        };
        self.lock().clients.push(stored.clone());
        Ok(stored)
    }

    async fn list_products(&self) -> StoreResult<Vec<Product>> {
        let mut products = self.lock().products.clone();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn create_product(&self, product: &Product) -> StoreResult<Product> {
        let mut records = self.lock();
        if records.products.iter().any(|p| p.id == product.id) {
            return Err(StoreError::Duplicate {
                what: "product id".to_string(),
                value: product.id.clone(),
            });
        }
        records.products.push(product.clone());
        Ok(product.clone())
    }

    async fn list_documents(&self) -> StoreResult<Vec<Document>> {
        let mut documents = self.lock().documents.clone();
        documents.sort_by(|a, b| {
            b.issued_at
                .cmp(&a.issued_at)
                .then(b.correlative.cmp(&a.correlative))
        });
        Ok(documents)
    }

    async fn create_document(&self, doc: &Document) -> StoreResult<()> {
        let mut records = self.lock();
        let taken = records.documents.iter().any(|d| {
            d.kind == doc.kind && d.series == doc.series && d.correlative == doc.correlative
        });
        if taken {
            return Err(StoreError::Duplicate {
                what: "document number".to_string(),
                value: doc.number(),
            });
        }

        debug!(number = %doc.number(), "Document stored in memory");
        records.documents.push(doc.clone());
        Ok(())
    }

    async fn load_profile(&self) -> StoreResult<Option<CompanyProfile>> {
        Ok(self.lock().profile.clone())
    }

    async fn save_profile(&self, profile: &CompanyProfile) -> StoreResult<()> {
        self.lock().profile = Some(profile.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cajero_core::{
        compute_totals, IdentityDocType, LineItem, Money, PaymentTerm, SeriesNumber, TaxCategory,
        UnitCode,
    };
    use cajero_db::DbConfig;

    fn document(kind: DocumentKind, series: &str, correlative: u32) -> Document {
        let items = vec![LineItem {
            product_id: "P0001".to_string(),
            description: "Gaseosa 1.5L".to_string(),
            unit_price: Money::from_cents(650),
            quantity: 2,
            tax_category: TaxCategory::Taxed,
            unit_code: UnitCode::Niu,
        }];
        let totals = compute_totals(&items);
        Document::issue(
            kind,
            SeriesNumber::new(series, correlative),
            CompanyProfile::demo().local_now(),
            Client::anonymous(),
            PaymentTerm::Cash,
            items,
            totals,
        )
    }

    async fn exercise(store: &dyn RecordStore) {
        store
            .create_document(&document(DocumentKind::Receipt, "B001", 1))
            .await
            .unwrap();
        store
            .create_document(&document(DocumentKind::SaleNote, "NV01", 1))
            .await
            .unwrap();

        let dup = store
            .create_document(&document(DocumentKind::Receipt, "B001", 1))
            .await;
        assert!(matches!(dup, Err(StoreError::Duplicate { ref value, .. }) if value == "B001-00000001"));

        let receipts = store.documents_of_kind(DocumentKind::Receipt).await.unwrap();
        assert_eq!(receipts.len(), 1);
        assert!(store.find_document("NV01", 1).await.unwrap().is_some());
        assert!(store.find_document("NV01", 2).await.unwrap().is_none());

        assert!(store.load_profile().await.unwrap().is_none());
        store.save_profile(&CompanyProfile::demo()).await.unwrap();
        assert_eq!(store.load_profile().await.unwrap(), Some(CompanyProfile::demo()));

        let created = store
            .create_client(&Client {
                id: Some("provisional".to_string()),
                doc_type: IdentityDocType::Dni,
                doc_number: "44556677".to_string(),
                name: "ANA TORRES".to_string(),
                address: String::new(),
                phone: None,
                email: None,
            })
            .await
            .unwrap();
        assert_ne!(created.id.as_deref(), Some("provisional"));
        assert_eq!(store.list_clients().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryStore::new()).await;
    }

    #[tokio::test]
    async fn test_database_store() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        exercise(&db).await;
    }
}
