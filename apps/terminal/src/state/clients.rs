//! # Client Directory
//!
//! In-memory client list shown at checkout, kept in sync with the store.
//!
//! ## Optimistic Create
//! ```text
//! register()
//!   │
//!   ├─► insert with provisional id (UUID) ──► visible immediately
//!   │
//!   ├─► store.create_client()
//!   │      ├─ Ok(stored)  ──► provisional id replaced by the store id
//!   │      └─ Err(e)      ──► provisional entry removed, error returned
//!   ▼
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use cajero_core::{Client, IdentityDocType};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreResult;
use crate::store::RecordStore;

/// Shared client directory.
#[derive(Debug, Clone, Default)]
pub struct ClientsState {
    clients: Arc<Mutex<Vec<Client>>>,
}

impl ClientsState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Client>> {
        self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces the directory with the store's contents.
    pub fn replace_all(&self, clients: Vec<Client>) {
        *self.lock() = clients;
    }

    pub fn list(&self) -> Vec<Client> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn find_by_document(&self, doc_type: IdentityDocType, doc_number: &str) -> Option<Client> {
        self.lock()
            .iter()
            .find(|c| c.doc_type == doc_type && c.doc_number == doc_number)
            .cloned()
    }

    /// Adds `client` under a fresh provisional id and returns that id.
    pub fn insert_provisional(&self, client: Client) -> String {
        let provisional_id = Uuid::new_v4().to_string();
        self.lock().push(Client {
            id: Some(provisional_id.clone()),
            ..client
        });
        provisional_id
    }

    /// Swaps the provisional entry for the stored one.
    ///
    /// Returns `false` if the provisional entry is gone; the stored client is
    /// added anyway.
    pub fn confirm(&self, provisional_id: &str, stored: Client) -> bool {
        let mut clients = self.lock();
        match clients
            .iter_mut()
            .find(|c| c.id.as_deref() == Some(provisional_id))
        {
            Some(entry) => {
                *entry = stored;
                true
            }
            None => {
                clients.push(stored);
                false
            }
        }
    }

    /// Removes a provisional entry after a failed create.
    pub fn discard(&self, provisional_id: &str) {
        self.lock().retain(|c| c.id.as_deref() != Some(provisional_id));
    }

    /// Optimistically adds `client` and persists it.
    pub async fn register(&self, store: &dyn RecordStore, client: Client) -> StoreResult<Client> {
        let provisional_id = self.insert_provisional(client.clone());
        debug!(provisional_id = %provisional_id, "Client added provisionally");

        match store.create_client(&client).await {
            Ok(stored) => {
                if !self.confirm(&provisional_id, stored.clone()) {
                    warn!(provisional_id = %provisional_id, "Provisional client vanished before confirmation");
                }
                Ok(stored)
            }
            Err(e) => {
                warn!(error = %e, "Client could not be stored, rolling back");
                self.discard(&provisional_id);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn client(doc_number: &str) -> Client {
        Client {
            id: None,
            doc_type: IdentityDocType::Dni,
            doc_number: doc_number.to_string(),
            name: "JUAN PEREZ".to_string(),
            address: String::new(),
            phone: Some("987654321".to_string()),
            email: None,
        }
    }

    #[test]
    fn test_provisional_id_is_replaced() {
        let state = ClientsState::new();
        let provisional = state.insert_provisional(client("44556677"));
        assert!(Uuid::parse_str(&provisional).is_ok());

        let stored = Client {
            id: Some("store-1".to_string()),
            ..client("44556677")
        };
        assert!(state.confirm(&provisional, stored));

        let clients = state.list();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].id.as_deref(), Some("store-1"));
    }

    #[test]
    fn test_discard_removes_only_provisional_entry() {
        let state = ClientsState::new();
        state.replace_all(vec![Client {
            id: Some("existing".to_string()),
            ..client("11111111")
        }]);
        let provisional = state.insert_provisional(client("22222222"));

        state.discard(&provisional);
        assert_eq!(state.len(), 1);
        assert!(state.find_by_document(IdentityDocType::Dni, "11111111").is_some());
    }

    #[tokio::test]
    async fn test_register_uses_store_id() {
        let store = MemoryStore::new();
        let state = ClientsState::new();

        let stored = state.register(&store, client("44556677")).await.unwrap();
        let listed = state.find_by_document(IdentityDocType::Dni, "44556677").unwrap();

        assert_eq!(listed.id, stored.id);
        assert_eq!(store.list_clients().await.unwrap(), vec![stored]);
    }
}
