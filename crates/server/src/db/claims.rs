//! Claim repository for database operations.

use chrono::{DateTime, Datelike, Duration, Utc};
use libro_reclamaciones_core::{
    ClaimId, ClaimNumber, ClaimStatus, ClaimType, Currency, DocumentType, Email,
    ProductServiceType, StorageKind,
};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::RepositoryError;
use crate::models::{Claim, NewClaim};

const CLAIM_COLUMNS: &str = "id, claim_number, consumer_name, consumer_lastname_p, \
     consumer_lastname_m, document_type, document_number, phone, email, address, \
     department, province, district, is_minor, relationship_with_company, \
     product_service_type, amount, currency, \
     detail, request, claim_type, reason, communication_medium, ip_address, user_agent, \
     status, pdf_generated, pdf_path, pdf_remote_id, pdf_storage, email_sent, \
     created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for claim queries.
#[derive(Debug, sqlx::FromRow)]
struct ClaimRow {
    id: i64,
    claim_number: String,
    consumer_name: String,
    consumer_lastname_p: String,
    consumer_lastname_m: Option<String>,
    document_type: String,
    document_number: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
    department: Option<String>,
    province: Option<String>,
    district: Option<String>,
    is_minor: bool,
    relationship_with_company: Option<String>,
    product_service_type: Option<String>,
    amount: Option<f64>,
    currency: String,
    detail: String,
    request: Option<String>,
    claim_type: String,
    reason: Option<String>,
    communication_medium: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    status: String,
    pdf_generated: bool,
    pdf_path: Option<String>,
    pdf_remote_id: Option<String>,
    pdf_storage: Option<String>,
    email_sent: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn corrupt(field: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::DataCorruption(format!("invalid {field} in database: {err}"))
}

impl TryFrom<ClaimRow> for Claim {
    type Error = RepositoryError;

    fn try_from(row: ClaimRow) -> Result<Self, Self::Error> {
        let claim_number =
            ClaimNumber::parse(&row.claim_number).map_err(|e| corrupt("claim_number", e))?;
        let document_type = row
            .document_type
            .parse::<DocumentType>()
            .map_err(|e| corrupt("document_type", e))?;
        let email = row
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(|e| corrupt("email", e))?;
        let product_service_type = row
            .product_service_type
            .as_deref()
            .map(str::parse::<ProductServiceType>)
            .transpose()
            .map_err(|e| corrupt("product_service_type", e))?;
        let currency = row
            .currency
            .parse::<Currency>()
            .map_err(|e| corrupt("currency", e))?;
        let claim_type = row
            .claim_type
            .parse::<ClaimType>()
            .map_err(|e| corrupt("claim_type", e))?;
        let status = row
            .status
            .parse::<ClaimStatus>()
            .map_err(|e| corrupt("status", e))?;
        let pdf_storage = row
            .pdf_storage
            .as_deref()
            .map(str::parse::<StorageKind>)
            .transpose()
            .map_err(|e| corrupt("pdf_storage", e))?;

        Ok(Self {
            id: ClaimId::new(row.id),
            claim_number,
            consumer_name: row.consumer_name,
            consumer_lastname_p: row.consumer_lastname_p,
            consumer_lastname_m: row.consumer_lastname_m,
            document_type,
            document_number: row.document_number,
            phone: row.phone,
            email,
            address: row.address,
            department: row.department,
            province: row.province,
            district: row.district,
            is_minor: row.is_minor,
            relationship_with_company: row.relationship_with_company,
            product_service_type,
            amount: row.amount,
            currency,
            detail: row.detail,
            request: row.request,
            claim_type,
            reason: row.reason,
            communication_medium: row.communication_medium,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            status,
            pdf_generated: row.pdf_generated,
            pdf_path: row.pdf_path,
            pdf_remote_id: row.pdf_remote_id,
            pdf_storage,
            email_sent: row.email_sent,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// =============================================================================
// Filters and Aggregates
// =============================================================================

/// Filter predicates shared by the admin list, the CSV export, and their
/// count queries.
#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    pub status: Option<ClaimStatus>,
    pub claim_type: Option<ClaimType>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub search: Option<String>,
}

impl ClaimFilter {
    fn push_predicates(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(status) = self.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(claim_type) = self.claim_type {
            qb.push(" AND claim_type = ").push_bind(claim_type.as_str());
        }
        if let Some(from) = self.date_from {
            qb.push(" AND created_at >= ").push_bind(from);
        }
        if let Some(to) = self.date_to {
            qb.push(" AND created_at <= ").push_bind(to);
        }
        if let Some(search) = &self.search {
            let pattern = format!("%{search}%");
            qb.push(" AND (claim_number LIKE ")
                .push_bind(pattern.clone())
                .push(" OR consumer_name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR consumer_lastname_p LIKE ")
                .push_bind(pattern.clone())
                .push(" OR consumer_lastname_m LIKE ")
                .push_bind(pattern.clone())
                .push(" OR document_number LIKE ")
                .push_bind(pattern.clone())
                .push(" OR email LIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }
}

/// Aggregate counters for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub total: i64,
    pub pendiente: i64,
    pub en_revision: i64,
    pub respondido: i64,
    pub cerrado: i64,
    pub reclamos: i64,
    pub quejas: i64,
    pub today: i64,
    pub this_week: i64,
    pub this_month: i64,
    pub monthly_trend: Vec<MonthlyCount>,
}

/// One point of the 12-month submission trend.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MonthlyCount {
    pub month: String,
    pub count: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct StatsRow {
    total: i64,
    pendiente: i64,
    en_revision: i64,
    respondido: i64,
    cerrado: i64,
    reclamos: i64,
    quejas: i64,
    today: i64,
    this_week: i64,
    this_month: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for claim database operations.
pub struct ClaimRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ClaimRepository<'a> {
    /// Create a new claim repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new claim, assigning its claim number atomically.
    ///
    /// The per-year counter is advanced inside the same transaction as the
    /// insert, so two concurrent submissions can never obtain the same
    /// number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create(&self, new: &NewClaim) -> Result<Claim, RepositoryError> {
        let now = Utc::now();
        let year = now.year();
        let reason = new.derived_reason();

        let mut tx = self.pool.begin().await?;

        let seq: i64 = sqlx::query_scalar(
            "INSERT INTO claim_sequences (year, seq) VALUES (?, 1)
             ON CONFLICT (year) DO UPDATE SET seq = seq + 1
             RETURNING seq",
        )
        .bind(year)
        .fetch_one(&mut *tx)
        .await?;

        let claim_number = ClaimNumber::new(year, seq);

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO claims (
                claim_number, consumer_name, consumer_lastname_p, consumer_lastname_m,
                document_type, document_number, phone, email, address, department,
                province, district, is_minor, relationship_with_company,
                product_service_type, amount, currency,
                detail, request, claim_type, reason, communication_medium, ip_address,
                user_agent, status, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(claim_number.as_str())
        .bind(&new.consumer_name)
        .bind(&new.consumer_lastname_p)
        .bind(&new.consumer_lastname_m)
        .bind(new.document_type.as_str())
        .bind(&new.document_number)
        .bind(&new.phone)
        .bind(new.email.as_ref().map(Email::as_str))
        .bind(&new.address)
        .bind(&new.department)
        .bind(&new.province)
        .bind(&new.district)
        .bind(new.is_minor)
        .bind(&new.relationship_with_company)
        .bind(new.product_service_type.map(ProductServiceType::as_str))
        .bind(new.amount)
        .bind(new.currency.as_str())
        .bind(&new.detail)
        .bind(&new.request)
        .bind(new.claim_type.as_str())
        .bind(reason)
        .bind(&new.communication_medium)
        .bind(&new.ip_address)
        .bind(&new.user_agent)
        .bind(ClaimStatus::Pendiente.as_str())
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get(ClaimId::new(id))
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Get a claim by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: ClaimId) -> Result<Option<Claim>, RepositoryError> {
        let row = sqlx::query_as::<_, ClaimRow>(&format!(
            "SELECT {CLAIM_COLUMNS} FROM claims WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List claims matching the filter, newest first, with a total count.
    ///
    /// `page` is 1-based; `limit` is the page size.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ClaimFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Claim>, i64), RepositoryError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM claims");
        filter.push_predicates(&mut count_qb);

        let offset = i64::from(page.saturating_sub(1)) * i64::from(limit);
        let mut qb = QueryBuilder::new(format!("SELECT {CLAIM_COLUMNS} FROM claims"));
        filter.push_predicates(&mut qb);
        qb.push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(offset);

        let (total, rows) = tokio::try_join!(
            count_qb.build_query_scalar::<i64>().fetch_one(self.pool),
            qb.build_query_as::<ClaimRow>().fetch_all(self.pool),
        )?;
        let claims = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<Claim>, _>>()?;

        Ok((claims, total))
    }

    /// All claims matching the filter, unpaginated, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self, filter: &ClaimFilter) -> Result<Vec<Claim>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("SELECT {CLAIM_COLUMNS} FROM claims"));
        filter.push_predicates(&mut qb);
        qb.push(" ORDER BY created_at DESC");

        let rows: Vec<ClaimRow> = qb.build_query_as().fetch_all(self.pool).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Set the claim's lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the claim does not exist.
    pub async fn update_status(
        &self,
        id: ClaimId,
        status: ClaimStatus,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE claims SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(Utc::now())
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record where the generated PDF receipt ended up.
    ///
    /// `pdf_generated` is only raised here, after storage has been
    /// confirmed by the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the claim does not exist.
    pub async fn set_pdf_metadata(
        &self,
        id: ClaimId,
        storage: StorageKind,
        path: Option<&str>,
        remote_id: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE claims
             SET pdf_generated = 1, pdf_storage = ?, pdf_path = ?, pdf_remote_id = ?,
                 updated_at = ?
             WHERE id = ?",
        )
        .bind(storage.as_str())
        .bind(path)
        .bind(remote_id)
        .bind(Utc::now())
        .bind(id.as_i64())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Mark the confirmation email as dispatched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the claim does not exist.
    pub async fn mark_email_sent(&self, id: ClaimId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE claims SET email_sent = 1, updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Aggregate counters and a 12-month trend for the dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError> {
        let now = Utc::now();
        let today_start = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc();
        let week_start = now - Duration::days(7);
        let month_start = now - Duration::days(30);
        let trend_start = now - Duration::days(365);

        let totals = sqlx::query_as::<_, StatsRow>(
            "SELECT
                COUNT(*) AS total,
                COALESCE(SUM(status = 'pendiente'), 0) AS pendiente,
                COALESCE(SUM(status = 'en_revision'), 0) AS en_revision,
                COALESCE(SUM(status = 'respondido'), 0) AS respondido,
                COALESCE(SUM(status = 'cerrado'), 0) AS cerrado,
                COALESCE(SUM(claim_type = 'reclamo'), 0) AS reclamos,
                COALESCE(SUM(claim_type = 'queja'), 0) AS quejas,
                COALESCE(SUM(created_at >= ?1), 0) AS today,
                COALESCE(SUM(created_at >= ?2), 0) AS this_week,
                COALESCE(SUM(created_at >= ?3), 0) AS this_month
             FROM claims",
        )
        .bind(today_start)
        .bind(week_start)
        .bind(month_start)
        .fetch_one(self.pool)
        .await?;

        let monthly_trend = sqlx::query_as::<_, MonthlyCount>(
            "SELECT strftime('%Y-%m', created_at) AS month, COUNT(*) AS count
             FROM claims
             WHERE created_at >= ?
             GROUP BY month
             ORDER BY month",
        )
        .bind(trend_start)
        .fetch_all(self.pool)
        .await?;

        Ok(DashboardStats {
            total: totals.total,
            pendiente: totals.pendiente,
            en_revision: totals.en_revision,
            respondido: totals.respondido,
            cerrado: totals.cerrado,
            reclamos: totals.reclamos,
            quejas: totals.quejas,
            today: totals.today,
            this_week: totals.this_week,
            this_month: totals.this_month,
            monthly_trend,
        })
    }
}
