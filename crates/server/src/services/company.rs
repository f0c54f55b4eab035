//! Cached access to the company info singleton.
//!
//! Reads go through a TTL cache; every write invalidates the cache
//! synchronously before returning, so admins see their own update
//! immediately.

use std::time::Duration;

use moka::future::Cache;
use sqlx::SqlitePool;

use crate::db::{CompanyInfoRepository, CompanyInfoUpdate, RepositoryError};
use crate::models::CompanyInfo;

/// Read-through cache over the `company_info` table.
#[derive(Clone)]
pub struct CompanyService {
    pool: SqlitePool,
    cache: Cache<(), CompanyInfo>,
}

impl CompanyService {
    #[must_use]
    pub fn new(pool: SqlitePool, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { pool, cache }
    }

    /// The current company info. Falls back to [`CompanyInfo::default`]
    /// when the table is empty or unreadable, so receipts always render.
    pub async fn get(&self) -> CompanyInfo {
        let pool = self.pool.clone();
        let result = self
            .cache
            .try_get_with((), async move {
                CompanyInfoRepository::new(&pool)
                    .get()
                    .await
                    .map(Option::unwrap_or_default)
            })
            .await;

        match result {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(error = %e, "Company info lookup failed, using defaults");
                CompanyInfo::default()
            }
        }
    }

    /// Apply a partial update and invalidate the cache.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the upsert fails; the cache is left
    /// untouched in that case.
    pub async fn update(&self, update: &CompanyInfoUpdate) -> Result<CompanyInfo, RepositoryError> {
        CompanyInfoRepository::new(&self.pool).upsert(update).await?;
        self.cache.invalidate(&()).await;
        Ok(self.get().await)
    }
}
