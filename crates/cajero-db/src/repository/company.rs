//! # Company Profile Repository
//!
//! The issuing company is a single row (`id = 1`). Saving always upserts it.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::now_timestamp;
use cajero_core::CompanyProfile;

#[derive(Debug, sqlx::FromRow)]
struct CompanyRow {
    ruc: String,
    legal_name: String,
    address: String,
    ubigeo: String,
    sol_user: String,
    sol_password: String,
    invoice_series: String,
    receipt_series: String,
    credit_note_series: String,
    logo_url: Option<String>,
    lookup_token: Option<String>,
    messaging_instance: Option<String>,
    messaging_token: Option<String>,
    utc_offset_minutes: i32,
}

impl From<CompanyRow> for CompanyProfile {
    fn from(row: CompanyRow) -> Self {
        CompanyProfile {
            ruc: row.ruc,
            legal_name: row.legal_name,
            address: row.address,
            ubigeo: row.ubigeo,
            sol_user: row.sol_user,
            sol_password: row.sol_password,
            invoice_series: row.invoice_series,
            receipt_series: row.receipt_series,
            credit_note_series: row.credit_note_series,
            logo_url: row.logo_url,
            lookup_token: row.lookup_token,
            messaging_instance: row.messaging_instance,
            messaging_token: row.messaging_token,
            utc_offset_minutes: row.utc_offset_minutes,
        }
    }
}

/// Repository for the company profile singleton.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    pool: SqlitePool,
}

impl CompanyRepository {
    /// Creates a new CompanyRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CompanyRepository { pool }
    }

    /// Loads the profile, or `None` before the first save.
    pub async fn load(&self) -> DbResult<Option<CompanyProfile>> {
        let row: Option<CompanyRow> = sqlx::query_as(
            r#"
            SELECT ruc, legal_name, address, ubigeo, sol_user, sol_password,
                   invoice_series, receipt_series, credit_note_series,
                   logo_url, lookup_token, messaging_instance, messaging_token,
                   utc_offset_minutes
            FROM company_profile
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        debug!(found = row.is_some(), "Loaded company profile");
        Ok(row.map(CompanyProfile::from))
    }

    /// Stores the profile, replacing any previous one.
    pub async fn save(&self, profile: &CompanyProfile) -> DbResult<()> {
        info!(ruc = %profile.ruc, "Saving company profile");

        sqlx::query(
            r#"
            INSERT INTO company_profile (
                id, ruc, legal_name, address, ubigeo, sol_user, sol_password,
                invoice_series, receipt_series, credit_note_series,
                logo_url, lookup_token, messaging_instance, messaging_token,
                utc_offset_minutes, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(id) DO UPDATE SET
                ruc = excluded.ruc,
                legal_name = excluded.legal_name,
                address = excluded.address,
                ubigeo = excluded.ubigeo,
                sol_user = excluded.sol_user,
                sol_password = excluded.sol_password,
                invoice_series = excluded.invoice_series,
                receipt_series = excluded.receipt_series,
                credit_note_series = excluded.credit_note_series,
                logo_url = excluded.logo_url,
                lookup_token = excluded.lookup_token,
                messaging_instance = excluded.messaging_instance,
                messaging_token = excluded.messaging_token,
                utc_offset_minutes = excluded.utc_offset_minutes,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&profile.ruc)
        .bind(&profile.legal_name)
        .bind(&profile.address)
        .bind(&profile.ubigeo)
        .bind(&profile.sol_user)
        .bind(&profile.sol_password)
        .bind(&profile.invoice_series)
        .bind(&profile.receipt_series)
        .bind(&profile.credit_note_series)
        .bind(&profile.logo_url)
        .bind(&profile.lookup_token)
        .bind(&profile.messaging_instance)
        .bind(&profile.messaging_token)
        .bind(profile.utc_offset_minutes)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};
    use cajero_core::CompanyProfile;

    #[tokio::test]
    async fn test_load_before_save_is_none() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.company().load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_upserts_single_row() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut profile = CompanyProfile::demo();
        db.company().save(&profile).await.unwrap();

        profile.legal_name = "BODEGA SAN MARTIN E.I.R.L.".to_string();
        profile.messaging_token = Some("tok".to_string());
        db.company().save(&profile).await.unwrap();

        let loaded = db.company().load().await.unwrap();
        assert_eq!(loaded, Some(profile));

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM company_profile")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(rows, 1);
    }
}
