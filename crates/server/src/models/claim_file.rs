//! Attachments uploaded with a claim or with an admin response.

use chrono::{DateTime, Utc};
use libro_reclamaciones_core::{ClaimFileId, ClaimId, StorageKind, UploadType};
use serde::Serialize;

/// A stored attachment row.
#[derive(Debug, Clone, Serialize)]
pub struct ClaimFile {
    pub id: ClaimFileId,
    pub claim_id: ClaimId,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage: StorageKind,
    #[serde(skip)]
    pub storage_path: Option<String>,
    #[serde(skip)]
    pub remote_file_id: Option<String>,
    pub remote_view_url: Option<String>,
    pub upload_type: UploadType,
    pub created_at: DateTime<Utc>,
}

/// A persisted object awaiting its database row.
#[derive(Debug, Clone)]
pub struct NewClaimFile {
    pub claim_id: ClaimId,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub storage: StorageKind,
    pub storage_path: Option<String>,
    pub remote_file_id: Option<String>,
    pub remote_view_url: Option<String>,
    pub upload_type: UploadType,
}
