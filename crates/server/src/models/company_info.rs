//! Company identity printed on receipts and emails.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The company info singleton.
///
/// When the table has never been populated, [`CompanyInfo::default`]
/// supplies a neutral placeholder so receipts can still render.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyInfo {
    pub name: String,
    pub ruc: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    #[serde(skip)]
    pub logo_path: Option<String>,
    #[serde(skip)]
    pub logo_remote_id: Option<String>,
    #[serde(skip)]
    pub logo_mime_type: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: "Mi Empresa".to_string(),
            ruc: None,
            address: None,
            phone: None,
            email: None,
            website: None,
            logo_path: None,
            logo_remote_id: None,
            logo_mime_type: None,
            updated_at: Utc::now(),
        }
    }
}
