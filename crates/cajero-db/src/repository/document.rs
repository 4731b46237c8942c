//! # Document Repository
//!
//! Database operations for issued documents and their lines.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  documents                                                              │
//! │  ├── kind, series, correlative   UNIQUE together                        │
//! │  ├── issued_at                   RFC 3339 with the issuer's offset      │
//! │  ├── client_json                 by-value client snapshot               │
//! │  ├── taxed_base … grand_total    exact decimals as text                 │
//! │  └── authority_*                 status, description, xml, digest, …    │
//! │                                                                         │
//! │  document_items (document_id, position)                                 │
//! │  └── one row per line, written in the same transaction                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use chrono::DateTime;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::now_timestamp;
use cajero_core::{
    AuthorityRecord, AuthorityStatus, Document, DocumentKind, LineItem, Money, PaymentTerm,
    TaxBreakdown, TaxCategory, UnitCode,
};

const DOCUMENT_COLUMNS: &str = r#"
    id, kind, series, correlative, issued_at, client_json, payment_term,
    taxed_base, exempt_base, unaffected_base, tax_amount, grand_total,
    summary, authority_status, authority_description,
    signed_xml, digest, ticket, cdr_reference
"#;

#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    kind: DocumentKind,
    series: String,
    correlative: i64,
    issued_at: String,
    client_json: String,
    payment_term: PaymentTerm,
    taxed_base: String,
    exempt_base: String,
    unaffected_base: String,
    tax_amount: String,
    grand_total: String,
    summary: String,
    authority_status: AuthorityStatus,
    authority_description: String,
    signed_xml: Option<String>,
    digest: Option<String>,
    ticket: Option<String>,
    cdr_reference: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    document_id: String,
    product_id: String,
    description: String,
    unit_price_cents: i64,
    quantity: i64,
    tax_category: TaxCategory,
    unit_code: UnitCode,
}

impl From<ItemRow> for LineItem {
    fn from(row: ItemRow) -> Self {
        LineItem {
            product_id: row.product_id,
            description: row.description,
            unit_price: Money::from_cents(row.unit_price_cents),
            quantity: row.quantity,
            tax_category: row.tax_category,
            unit_code: row.unit_code,
        }
    }
}

fn parse_decimal(column: &str, text: &str) -> DbResult<Decimal> {
    Decimal::from_str(text)
        .map_err(|e| DbError::invalid_data(format!("{column} '{text}': {e}")))
}

impl DocumentRow {
    fn into_document(self, items: Vec<LineItem>) -> DbResult<Document> {
        let issued_at = DateTime::parse_from_rfc3339(&self.issued_at)
            .map_err(|e| DbError::invalid_data(format!("issued_at '{}': {e}", self.issued_at)))?;
        let correlative = u32::try_from(self.correlative)
            .map_err(|_| DbError::invalid_data(format!("correlative {}", self.correlative)))?;

        let totals = TaxBreakdown {
            taxed_base: parse_decimal("taxed_base", &self.taxed_base)?,
            exempt_base: parse_decimal("exempt_base", &self.exempt_base)?,
            unaffected_base: parse_decimal("unaffected_base", &self.unaffected_base)?,
            tax_amount: parse_decimal("tax_amount", &self.tax_amount)?,
            grand_total: parse_decimal("grand_total", &self.grand_total)?,
        };

        Ok(Document {
            id: self.id,
            kind: self.kind,
            series: self.series,
            correlative,
            issued_at,
            client: serde_json::from_str(&self.client_json)?,
            payment_term: self.payment_term,
            items,
            totals,
            summary: self.summary,
            authority: AuthorityRecord {
                status: self.authority_status,
                description: self.authority_description,
                signed_xml: self.signed_xml,
                digest: self.digest,
                ticket: self.ticket,
                cdr_reference: self.cdr_reference,
            },
        })
    }
}

/// Repository for document database operations.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    /// Creates a new DocumentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DocumentRepository { pool }
    }

    /// Inserts a document and its lines in one transaction.
    ///
    /// ## Errors
    /// `DbError::UniqueViolation` when `(kind, series, correlative)` is
    /// already taken; nothing is written in that case.
    pub async fn create(&self, doc: &Document) -> DbResult<()> {
        debug!(id = %doc.id, number = %doc.number(), items = doc.items.len(), "Inserting document");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let client_json = serde_json::to_string(&doc.client)?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO documents (
                id, kind, series, correlative, issued_at, client_json, payment_term,
                taxed_base, exempt_base, unaffected_base, tax_amount, grand_total,
                summary, authority_status, authority_description,
                signed_xml, digest, ticket, cdr_reference, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11, ?12,
                ?13, ?14, ?15,
                ?16, ?17, ?18, ?19, ?20
            )
            "#,
        )
        .bind(&doc.id)
        .bind(doc.kind)
        .bind(&doc.series)
        .bind(i64::from(doc.correlative))
        .bind(doc.issued_at.to_rfc3339())
        .bind(client_json)
        .bind(doc.payment_term)
        .bind(doc.totals.taxed_base.to_string())
        .bind(doc.totals.exempt_base.to_string())
        .bind(doc.totals.unaffected_base.to_string())
        .bind(doc.totals.tax_amount.to_string())
        .bind(doc.totals.grand_total.to_string())
        .bind(&doc.summary)
        .bind(doc.authority.status)
        .bind(&doc.authority.description)
        .bind(&doc.authority.signed_xml)
        .bind(&doc.authority.digest)
        .bind(&doc.authority.ticket)
        .bind(&doc.authority.cdr_reference)
        .bind(now_timestamp())
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            return Err(match DbError::from(err) {
                DbError::UniqueViolation { .. } => DbError::duplicate("document number", doc.number()),
                other => other,
            });
        }

        for (position, item) in doc.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO document_items (
                    document_id, position, product_id, description,
                    unit_price_cents, quantity, tax_category, unit_code
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&doc.id)
            .bind(position as i64)
            .bind(&item.product_id)
            .bind(&item.description)
            .bind(item.unit_price.cents())
            .bind(item.quantity)
            .bind(item.tax_category)
            .bind(item.unit_code)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        Ok(())
    }

    /// Lists every document, newest first.
    pub async fn list(&self) -> DbResult<Vec<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY issued_at DESC, correlative DESC"
        );
        let rows: Vec<DocumentRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        self.attach_items(rows).await
    }

    /// Lists documents of one kind, newest first.
    pub async fn list_by_kind(&self, kind: DocumentKind) -> DbResult<Vec<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE kind = ?1 ORDER BY correlative DESC"
        );
        let rows: Vec<DocumentRow> = sqlx::query_as(&sql)
            .bind(kind)
            .fetch_all(&self.pool)
            .await?;
        self.attach_items(rows).await
    }

    /// Highest correlative issued for `kind`, if any.
    pub async fn max_correlative(&self, kind: DocumentKind) -> DbResult<Option<u32>> {
        let max: Option<i64> =
            sqlx::query_scalar("SELECT MAX(correlative) FROM documents WHERE kind = ?1")
                .bind(kind)
                .fetch_one(&self.pool)
                .await?;

        max.map(|value| {
            u32::try_from(value).map_err(|_| DbError::invalid_data(format!("correlative {value}")))
        })
        .transpose()
    }

    /// Finds a document by its series and correlative.
    pub async fn find_by_number(
        &self,
        series: &str,
        correlative: u32,
    ) -> DbResult<Option<Document>> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE series = ?1 AND correlative = ?2"
        );
        let rows: Vec<DocumentRow> = sqlx::query_as(&sql)
            .bind(series)
            .bind(i64::from(correlative))
            .fetch_all(&self.pool)
            .await?;

        Ok(self.attach_items(rows).await?.into_iter().next())
    }

    /// Loads the lines of `rows` with a single query and builds documents.
    async fn attach_items(&self, rows: Vec<DocumentRow>) -> DbResult<Vec<Document>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let items: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT document_id, product_id, description, unit_price_cents,
                   quantity, tax_category, unit_code
            FROM document_items
            ORDER BY document_id, position
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_document: HashMap<String, Vec<LineItem>> = HashMap::new();
        for item in items {
            by_document
                .entry(item.document_id.clone())
                .or_default()
                .push(LineItem::from(item));
        }

        rows.into_iter()
            .map(|row| {
                let items = by_document.remove(&row.id).unwrap_or_default();
                row.into_document(items)
            })
            .collect()
    }
}
