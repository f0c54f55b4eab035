//! Append-only change history attached to a claim.

use chrono::{DateTime, Utc};
use libro_reclamaciones_core::{AdminUserId, AuditLogId, ClaimId};
use serde::Serialize;

/// What happened to a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Claim was filed.
    Created,
    /// An admin changed the lifecycle status.
    StatusChanged,
    /// An admin sent a written response by email.
    EmailResponseSent,
}

impl AuditAction {
    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::StatusChanged => "status_changed",
            Self::EmailResponseSent => "email_response_sent",
        }
    }
}

/// One audit log row, with the acting admin's username resolved when the
/// account still exists.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: AuditLogId,
    pub claim_id: ClaimId,
    pub admin_user_id: Option<AdminUserId>,
    pub username: Option<String>,
    pub action: String,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
