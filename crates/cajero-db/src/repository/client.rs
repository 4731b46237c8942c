//! # Client Repository
//!
//! Database operations for clients.
//!
//! ## Store-Assigned Ids
//! ```text
//! Terminal creates client ──► provisional id (UUID, shown immediately)
//!                                  │
//!                                  ▼
//!                     ClientRepository::create()
//!                                  │
//!                                  ▼
//!                     returned Client carries the store id;
//!                     the caller replaces the provisional one
//! ```

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::now_timestamp;
use cajero_core::{Client, IdentityDocType};

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: String,
    doc_type: IdentityDocType,
    doc_number: String,
    name: String,
    address: String,
    phone: Option<String>,
    email: Option<String>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: Some(row.id),
            doc_type: row.doc_type,
            doc_number: row.doc_number,
            name: row.name,
            address: row.address,
            phone: row.phone,
            email: row.email,
        }
    }
}

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Lists all clients, alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let rows: Vec<ClientRow> = sqlx::query_as(
            r#"
            SELECT id, doc_type, doc_number, name, address, phone, email
            FROM clients
            ORDER BY name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    /// Inserts a client and returns it with the store-assigned id.
    ///
    /// Any id already on `client` is provisional and is not stored.
    pub async fn create(&self, client: &Client) -> DbResult<Client> {
        let id = Uuid::new_v4().to_string();
        debug!(id = %id, provisional = ?client.id, "Creating client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, doc_type, doc_number, name, address, phone, email, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&id)
        .bind(client.doc_type)
        .bind(&client.doc_number)
        .bind(&client.name)
        .bind(&client.address)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(Client {
            id: Some(id),
            ..client.clone()
        })
    }

    /// Finds a client by identity document.
    pub async fn find_by_document(
        &self,
        doc_type: IdentityDocType,
        doc_number: &str,
    ) -> DbResult<Option<Client>> {
        let row: Option<ClientRow> = sqlx::query_as(
            r#"
            SELECT id, doc_type, doc_number, name, address, phone, email
            FROM clients
            WHERE doc_type = ?1 AND doc_number = ?2
            LIMIT 1
            "#,
        )
        .bind(doc_type)
        .bind(doc_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    /// Total number of clients.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
