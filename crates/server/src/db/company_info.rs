//! Company info repository.
//!
//! The table holds a single row with `id = 1`; writes upsert that row and
//! `COALESCE` keeps any field the caller did not supply.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::RepositoryError;
use crate::models::CompanyInfo;

/// Internal row type for company info queries.
#[derive(Debug, sqlx::FromRow)]
struct CompanyInfoRow {
    name: String,
    ruc: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    website: Option<String>,
    logo_path: Option<String>,
    logo_remote_id: Option<String>,
    logo_mime_type: Option<String>,
    updated_at: DateTime<Utc>,
}

impl From<CompanyInfoRow> for CompanyInfo {
    fn from(row: CompanyInfoRow) -> Self {
        Self {
            name: row.name,
            ruc: row.ruc,
            address: row.address,
            phone: row.phone,
            email: row.email,
            website: row.website,
            logo_path: row.logo_path,
            logo_remote_id: row.logo_remote_id,
            logo_mime_type: row.logo_mime_type,
            updated_at: row.updated_at,
        }
    }
}

/// Partial update applied to the singleton; `None` leaves the stored value.
#[derive(Debug, Clone, Default)]
pub struct CompanyInfoUpdate {
    pub name: Option<String>,
    pub ruc: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub logo_path: Option<String>,
    pub logo_remote_id: Option<String>,
    pub logo_mime_type: Option<String>,
}

/// Repository for the company info singleton.
pub struct CompanyInfoRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CompanyInfoRepository<'a> {
    /// Create a new company info repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the singleton row, if one has ever been written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self) -> Result<Option<CompanyInfo>, RepositoryError> {
        let row = sqlx::query_as::<_, CompanyInfoRow>(
            "SELECT name, ruc, address, phone, email, website,
                    logo_path, logo_remote_id, logo_mime_type, updated_at
             FROM company_info WHERE id = 1",
        )
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Upsert the singleton, keeping stored values for absent fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert fails.
    pub async fn upsert(&self, update: &CompanyInfoUpdate) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO company_info (id, name, ruc, address, phone, email, website,
                                       logo_path, logo_remote_id, logo_mime_type, updated_at)
             VALUES (1, COALESCE(?1, 'Mi Empresa'), ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT (id) DO UPDATE SET
                 name = COALESCE(?1, name),
                 ruc = COALESCE(?2, ruc),
                 address = COALESCE(?3, address),
                 phone = COALESCE(?4, phone),
                 email = COALESCE(?5, email),
                 website = COALESCE(?6, website),
                 logo_path = COALESCE(?7, logo_path),
                 logo_remote_id = COALESCE(?8, logo_remote_id),
                 logo_mime_type = COALESCE(?9, logo_mime_type),
                 updated_at = ?10",
        )
        .bind(&update.name)
        .bind(&update.ruc)
        .bind(&update.address)
        .bind(&update.phone)
        .bind(&update.email)
        .bind(&update.website)
        .bind(&update.logo_path)
        .bind(&update.logo_remote_id)
        .bind(&update.logo_mime_type)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        Ok(())
    }
}
