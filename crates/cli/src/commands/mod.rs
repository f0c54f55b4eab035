//! CLI subcommands.

pub mod admin;
pub mod migrate;

use secrecy::SecretString;
use sqlx::SqlitePool;

/// Connect to the database named by `DATABASE_URL`, with the same default
/// the server uses.
pub async fn connect() -> Result<SqlitePool, Box<dyn std::error::Error>> {
    let url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/claims.db?mode=rwc".to_string());
    let pool = libro_reclamaciones_server::db::create_pool(&SecretString::from(url)).await?;
    Ok(pool)
}
