//! Admin user repository for database operations.

use chrono::{DateTime, Utc};
use libro_reclamaciones_core::{AdminRole, AdminUserId, Email};
use sqlx::SqlitePool;

use super::RepositoryError;
use crate::models::AdminUser;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, full_name, role, is_active, last_login, created_at";

/// Internal row type for admin user queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    full_name: Option<String>,
    role: String,
    is_active: bool,
    last_login: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row.role.parse::<AdminRole>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(Self {
            id: AdminUserId::new(row.id),
            username: row.username,
            email,
            password_hash: row.password_hash,
            full_name: row.full_name,
            role,
            is_active: row.is_active,
            last_login: row.last_login,
            created_at: row.created_at,
        })
    }
}

/// Repository for admin user database operations.
pub struct AdminUserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AdminUserRepository<'a> {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Get an admin user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM admin_users WHERE id = ?"
        ))
        .bind(id.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get an admin user by username or email address (login accepts both).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_login(&self, login: &str) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM admin_users WHERE username = ?1 OR email = ?1"
        ))
        .bind(login)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Create an admin user with an already-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email is taken.
    pub async fn create(
        &self,
        username: &str,
        email: &Email,
        password_hash: &str,
        full_name: Option<&str>,
        role: AdminRole,
    ) -> Result<AdminUserId, RepositoryError> {
        let result = sqlx::query_scalar::<_, i64>(
            "INSERT INTO admin_users (username, email, password_hash, full_name, role,
                                      is_active, created_at)
             VALUES (?, ?, ?, ?, ?, 1, ?)
             RETURNING id",
        )
        .bind(username)
        .bind(email.as_str())
        .bind(password_hash)
        .bind(full_name)
        .bind(role.as_str())
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await;

        match result {
            Ok(id) => Ok(AdminUserId::new(id)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                RepositoryError::Conflict("username or email already in use".to_string()),
            ),
            Err(e) => Err(e.into()),
        }
    }

    /// Record a successful login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn touch_last_login(&self, id: AdminUserId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE admin_users SET last_login = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(id.as_i64())
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
