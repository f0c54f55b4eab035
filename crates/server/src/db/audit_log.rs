//! Audit log repository.
//!
//! The audit log is append-only: rows are inserted and listed, never
//! updated or deleted.

use chrono::{DateTime, Utc};
use libro_reclamaciones_core::{AdminUserId, AuditLogId, ClaimId};
use sqlx::SqlitePool;

use super::RepositoryError;
use crate::models::{AuditAction, AuditEntry};

/// Internal row type for audit log queries (joined with the acting admin's
/// username where the account still exists).
#[derive(Debug, sqlx::FromRow)]
struct AuditEntryRow {
    id: i64,
    claim_id: i64,
    admin_user_id: Option<i64>,
    username: Option<String>,
    action: String,
    details: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditEntryRow> for AuditEntry {
    type Error = RepositoryError;

    fn try_from(row: AuditEntryRow) -> Result<Self, Self::Error> {
        let details = row
            .details
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid audit details in database: {e}"))
            })?;

        Ok(Self {
            id: AuditLogId::new(row.id),
            claim_id: ClaimId::new(row.claim_id),
            admin_user_id: row.admin_user_id.map(AdminUserId::new),
            username: row.username,
            action: row.action,
            details,
            created_at: row.created_at,
        })
    }
}

/// Repository for audit log database operations.
pub struct AuditLogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AuditLogRepository<'a> {
    /// Create a new audit log repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Append one audit entry.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn append(
        &self,
        claim_id: ClaimId,
        admin_user_id: Option<AdminUserId>,
        action: AuditAction,
        details: Option<&serde_json::Value>,
    ) -> Result<AuditLogId, RepositoryError> {
        let details_json = details.map(serde_json::Value::to_string);

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO audit_log (claim_id, admin_user_id, action, details, created_at)
             VALUES (?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(claim_id.as_i64())
        .bind(admin_user_id.map(|id| id.as_i64()))
        .bind(action.as_str())
        .bind(details_json)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(AuditLogId::new(id))
    }

    /// List a claim's history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_for_claim(&self, claim_id: ClaimId) -> Result<Vec<AuditEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, AuditEntryRow>(
            "SELECT a.id, a.claim_id, a.admin_user_id, u.username, a.action, a.details,
                    a.created_at
             FROM audit_log a
             LEFT JOIN admin_users u ON u.id = a.admin_user_id
             WHERE a.claim_id = ?
             ORDER BY a.created_at DESC, a.id DESC",
        )
        .bind(claim_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Number of audit entries for a claim.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_for_claim(&self, claim_id: ClaimId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM audit_log WHERE claim_id = ?")
            .bind(claim_id.as_i64())
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
