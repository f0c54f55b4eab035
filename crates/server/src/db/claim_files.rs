//! Claim attachment repository.

use chrono::{DateTime, Utc};
use libro_reclamaciones_core::{ClaimFileId, ClaimId, StorageKind, UploadType};
use sqlx::SqlitePool;

use super::RepositoryError;
use crate::models::{ClaimFile, NewClaimFile};

const FILE_COLUMNS: &str = "id, claim_id, filename, original_name, mime_type, size_bytes, \
     storage, storage_path, remote_file_id, remote_view_url, upload_type, created_at";

/// Internal row type for claim file queries.
#[derive(Debug, sqlx::FromRow)]
struct ClaimFileRow {
    id: i64,
    claim_id: i64,
    filename: String,
    original_name: String,
    mime_type: String,
    size_bytes: i64,
    storage: String,
    storage_path: Option<String>,
    remote_file_id: Option<String>,
    remote_view_url: Option<String>,
    upload_type: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ClaimFileRow> for ClaimFile {
    type Error = RepositoryError;

    fn try_from(row: ClaimFileRow) -> Result<Self, Self::Error> {
        let storage = row.storage.parse::<StorageKind>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid storage in database: {e}"))
        })?;
        let upload_type = row.upload_type.parse::<UploadType>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid upload_type in database: {e}"))
        })?;

        Ok(Self {
            id: ClaimFileId::new(row.id),
            claim_id: ClaimId::new(row.claim_id),
            filename: row.filename,
            original_name: row.original_name,
            mime_type: row.mime_type,
            size_bytes: row.size_bytes,
            storage,
            storage_path: row.storage_path,
            remote_file_id: row.remote_file_id,
            remote_view_url: row.remote_view_url,
            upload_type,
            created_at: row.created_at,
        })
    }
}

/// Repository for claim attachment database operations.
pub struct ClaimFileRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ClaimFileRepository<'a> {
    /// Create a new claim file repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a stored attachment row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewClaimFile) -> Result<ClaimFileId, RepositoryError> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO claim_files (
                claim_id, filename, original_name, mime_type, size_bytes,
                storage, storage_path, remote_file_id, remote_view_url,
                upload_type, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(new.claim_id.as_i64())
        .bind(&new.filename)
        .bind(&new.original_name)
        .bind(&new.mime_type)
        .bind(new.size_bytes)
        .bind(new.storage.as_str())
        .bind(&new.storage_path)
        .bind(&new.remote_file_id)
        .bind(&new.remote_view_url)
        .bind(new.upload_type.as_str())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await?;

        Ok(ClaimFileId::new(id))
    }

    /// Get a single attachment by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get(&self, id: ClaimFileId) -> Result<Option<ClaimFile>, RepositoryError> {
        let row = sqlx::query_as::<_, ClaimFileRow>(&format!(
            "SELECT {FILE_COLUMNS} FROM claim_files WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List all attachments belonging to a claim, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_for_claim(&self, claim_id: ClaimId) -> Result<Vec<ClaimFile>, RepositoryError> {
        let rows = sqlx::query_as::<_, ClaimFileRow>(&format!(
            "SELECT {FILE_COLUMNS} FROM claim_files WHERE claim_id = ? ORDER BY created_at ASC"
        ))
        .bind(claim_id.as_i64())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
