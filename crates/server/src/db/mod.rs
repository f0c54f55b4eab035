//! Database operations for the complaint book `SQLite` store.
//!
//! ## Tables
//!
//! - `claims` - The claim aggregate
//! - `claim_sequences` - Per-year atomic counter for claim numbers
//! - `claim_files` - Uploaded attachments and response attachments
//! - `audit_log` - Append-only change history per claim
//! - `admin_users` - Admin panel accounts
//! - `company_info` - Company identity singleton (id = 1)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p libro-reclamaciones-cli -- migrate
//! ```
//!
//! Queries use the runtime sqlx API; enum and timestamp columns are stored
//! as TEXT and parsed into domain types at the row boundary.

pub mod admin_users;
pub mod audit_log;
pub mod claim_files;
pub mod claims;
pub mod company_info;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use thiserror::Error;

pub use admin_users::AdminUserRepository;
pub use audit_log::AuditLogRepository;
pub use claim_files::ClaimFileRepository;
pub use claims::{ClaimFilter, ClaimRepository, DashboardStats, MonthlyCount};
pub use company_info::{CompanyInfoRepository, CompanyInfoUpdate};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `SQLite` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Run embedded migrations against the given pool.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
