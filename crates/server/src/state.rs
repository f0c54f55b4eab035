//! Shared application state.

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::config::ServerConfig;
use crate::services::company::CompanyService;
use crate::services::email::{EmailError, EmailService};
use crate::services::pdf::PdfRenderer;
use crate::services::storage::{AttachmentStore, LocalDisk, RemoteDrive};

struct AppStateInner {
    pool: SqlitePool,
    config: ServerConfig,
    store: AttachmentStore,
    pdf: PdfRenderer,
    email: EmailService,
    company: CompanyService,
}

/// Cheaply cloneable handle to everything request handlers need.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

impl AppState {
    /// Wire up all services from configuration.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the SMTP relay configuration is invalid.
    pub fn new(pool: SqlitePool, config: ServerConfig) -> Result<Self, EmailError> {
        let local = LocalDisk::new(config.upload_dir.clone());
        let remote = config
            .drive
            .as_ref()
            .map(|drive| RemoteDrive::new(reqwest::Client::new(), drive));
        let store = AttachmentStore::new(local, remote);
        let pdf = PdfRenderer::new(&config.pdf);
        let email = EmailService::from_config(config.email.as_ref())?;
        let company = CompanyService::new(pool.clone(), config.company_cache_ttl);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                pool,
                config,
                store,
                pdf,
                email,
                company,
            }),
        })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &AttachmentStore {
        &self.inner.store
    }

    #[must_use]
    pub fn pdf(&self) -> &PdfRenderer {
        &self.inner.pdf
    }

    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    #[must_use]
    pub fn company(&self) -> &CompanyService {
        &self.inner.company
    }
}
