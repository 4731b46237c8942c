//! # Product Repository
//!
//! Database operations for the product catalogue.
//!
//! Prices are stored as integer céntimos, tax-inclusive, exactly as the
//! cashier sees them. The tax category decides how checkout apportions them.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::repository::now_timestamp;
use cajero_core::Product;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists the catalogue, alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products: Vec<Product> = sqlx::query_as(
            r#"
            SELECT id, name, category, description, price_cents, stock, tax_category, unit_code
            FROM products
            ORDER BY name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let product: Option<Product> = sqlx::query_as(
            r#"
            SELECT id, name, category, description, price_cents, stock, tax_category, unit_code
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a product. A blank id is replaced by a new UUID.
    pub async fn create(&self, product: &Product) -> DbResult<Product> {
        let mut product = product.clone();
        if product.id.trim().is_empty() {
            product.id = Uuid::new_v4().to_string();
        }

        debug!(id = %product.id, name = %product.name, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, description, price_cents, stock,
                tax_category, unit_code, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.tax_category)
        .bind(product.unit_code)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Total number of products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, DbError};
    use cajero_core::{Product, TaxCategory, UnitCode};

    fn rice() -> Product {
        Product {
            id: String::new(),
            name: "Arroz Costeño 5kg".to_string(),
            category: "Abarrotes".to_string(),
            description: None,
            price_cents: 2450,
            stock: 40,
            tax_category: TaxCategory::Taxed,
            unit_code: UnitCode::Niu,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let saved = db.products().create(&rice()).await.unwrap();
        assert!(!saved.id.is_empty());

        let loaded = db.products().get(&saved.id).await.unwrap();
        assert_eq!(loaded, Some(saved));
        assert!(db.products().get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_keeps_tax_category_and_unit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut book = rice();
        book.name = "Libro de texto".to_string();
        book.tax_category = TaxCategory::Exempt;
        book.unit_code = UnitCode::Bx;
        db.products().create(&book).await.unwrap();
        db.products().create(&rice()).await.unwrap();

        let products = db.products().list().await.unwrap();
        assert_eq!(products.len(), 2);
        assert_eq!(products[1].tax_category, TaxCategory::Exempt);
        assert_eq!(products[1].unit_code, UnitCode::Bx);
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut product = rice();
        product.id = "p-1".to_string();
        db.products().create(&product).await.unwrap();

        let err = db.products().create(&product).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
