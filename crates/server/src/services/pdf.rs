//! PDF receipt rendering.
//!
//! The receipt is an HTML template rendered to PDF by a headless chromium
//! subprocess. Rendering is best-effort from the submission pipeline's
//! point of view: a missing browser binary or a timeout degrades to a
//! claim without a receipt, never to a failed submission.

use std::path::PathBuf;
use std::time::Duration;

use askama::Template;
use chrono::Utc;
use thiserror::Error;

use crate::config::PdfConfig;
use crate::models::{Claim, CompanyInfo};

/// Errors from PDF rendering.
#[derive(Debug, Error)]
pub enum PdfError {
    /// Template rendering failed.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// Filesystem or subprocess error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The browser did not finish within the configured timeout.
    #[error("render timed out after {0:?}")]
    Timeout(Duration),

    /// The browser exited unsuccessfully.
    #[error("renderer failed: {0}")]
    Renderer(String),
}

#[derive(Template)]
#[template(path = "pdf/claim_receipt.html")]
struct ClaimReceiptTemplate {
    company_name: String,
    company_ruc: String,
    company_address: String,
    claim_number: String,
    filed_at: String,
    full_name: String,
    document: String,
    phone: String,
    email: String,
    address: String,
    claim_type_label: String,
    reason: String,
    amount: String,
    detail: String,
    request: String,
}

impl ClaimReceiptTemplate {
    fn build(claim: &Claim, company: &CompanyInfo) -> Self {
        Self {
            company_name: company.name.clone(),
            company_ruc: company.ruc.clone().unwrap_or_default(),
            company_address: company.address.clone().unwrap_or_default(),
            claim_number: claim.claim_number.to_string(),
            filed_at: claim.created_at.format("%d/%m/%Y %H:%M").to_string(),
            full_name: claim.full_name(),
            document: format!("{} {}", claim.document_type, claim.document_number),
            phone: claim.phone.clone(),
            email: claim
                .email
                .as_ref()
                .map_or_else(|| "No registrado".to_string(), ToString::to_string),
            address: claim.address.clone().unwrap_or_default(),
            claim_type_label: claim.claim_type.label().to_string(),
            reason: claim.reason.clone().unwrap_or_default(),
            amount: claim.formatted_amount(),
            detail: claim.detail.clone(),
            request: claim.request.clone().unwrap_or_default(),
        }
    }
}

/// Headless-browser PDF renderer.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    chromium_path: PathBuf,
    timeout: Duration,
}

impl PdfRenderer {
    #[must_use]
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            chromium_path: config.chromium_path.clone(),
            timeout: config.timeout,
        }
    }

    /// Name under which a claim's receipt is stored.
    #[must_use]
    pub fn receipt_filename(claim: &Claim) -> String {
        format!(
            "reclamo_{}_{}.pdf",
            claim.claim_number,
            Utc::now().timestamp()
        )
    }

    /// Render the receipt for a claim.
    ///
    /// # Errors
    ///
    /// Returns `PdfError` if templating, the browser subprocess, or the
    /// timeout fails. Callers in the submission pipeline log and continue.
    pub async fn render_claim_receipt(
        &self,
        claim: &Claim,
        company: &CompanyInfo,
    ) -> Result<Vec<u8>, PdfError> {
        let html = ClaimReceiptTemplate::build(claim, company).render()?;
        self.render_html(&html).await
    }

    async fn render_html(&self, html: &str) -> Result<Vec<u8>, PdfError> {
        let token = uuid::Uuid::new_v4();
        let html_path = std::env::temp_dir().join(format!("claim-receipt-{token}.html"));
        let pdf_path = std::env::temp_dir().join(format!("claim-receipt-{token}.pdf"));

        tokio::fs::write(&html_path, html).await?;

        let result = self.run_browser(&html_path, &pdf_path).await;

        // Transient files are removed regardless of the render outcome
        let _ = tokio::fs::remove_file(&html_path).await;
        let pdf = match result {
            Ok(()) => tokio::fs::read(&pdf_path).await.map_err(PdfError::from),
            Err(e) => Err(e),
        };
        let _ = tokio::fs::remove_file(&pdf_path).await;

        pdf
    }

    async fn run_browser(&self, html_path: &PathBuf, pdf_path: &PathBuf) -> Result<(), PdfError> {
        let mut command = tokio::process::Command::new(&self.chromium_path);
        command
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg(format!("--print-to-pdf={}", pdf_path.display()))
            .arg(format!("file://{}", html_path.display()))
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| PdfError::Timeout(self.timeout))??;

        if !output.status.success() {
            return Err(PdfError::Renderer(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use libro_reclamaciones_core::{
        ClaimId, ClaimNumber, ClaimStatus, ClaimType, Currency, DocumentType,
    };

    fn sample_claim() -> Claim {
        Claim {
            id: ClaimId::new(1),
            claim_number: ClaimNumber::new(2026, 7),
            consumer_name: "Juan".to_string(),
            consumer_lastname_p: "Pérez".to_string(),
            consumer_lastname_m: None,
            document_type: DocumentType::Dni,
            document_number: "12345678".to_string(),
            phone: "987654321".to_string(),
            email: None,
            address: None,
            department: None,
            province: None,
            district: None,
            is_minor: false,
            relationship_with_company: None,
            product_service_type: None,
            amount: None,
            currency: Currency::Pen,
            detail: "Producto defectuoso, mínimo diez caracteres".to_string(),
            request: None,
            claim_type: ClaimType::Reclamo,
            reason: Some("Reclamo por disconformidad con un servicio".to_string()),
            communication_medium: None,
            ip_address: None,
            user_agent: None,
            status: ClaimStatus::Pendiente,
            pdf_generated: false,
            pdf_path: None,
            pdf_remote_id: None,
            pdf_storage: None,
            email_sent: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_receipt_template_renders_missing_amount_as_unspecified() {
        let html = ClaimReceiptTemplate::build(&sample_claim(), &CompanyInfo::default())
            .render()
            .unwrap();
        assert!(html.contains("2026-000007"));
        assert!(html.contains("No especificado"));
        assert!(!html.contains("NaN"));
    }

    #[test]
    fn test_receipt_filename_embeds_claim_number() {
        let name = PdfRenderer::receipt_filename(&sample_claim());
        assert!(name.starts_with("reclamo_2026-000007_"));
        assert!(name.ends_with(".pdf"));
    }
}
