//! The claim submission pipeline.
//!
//! Only the initial insert may fail the request. Every later step (file
//! persistence, PDF render and store, confirmation email, admin
//! notification, audit entry) is best-effort: failures are logged and the
//! consumer still receives their claim number.

use libro_reclamaciones_core::UploadType;
use serde_json::json;

use crate::db::{AuditLogRepository, ClaimFileRepository, ClaimRepository};
use crate::error::AppError;
use crate::models::{AuditAction, Claim, NewClaim, NewClaimFile};
use crate::services::pdf::PdfRenderer;
use crate::state::AppState;
use crate::validation::{UploadedFile, sanitize_filename};

/// What the pipeline produced.
#[derive(Debug)]
pub struct SubmissionOutcome {
    pub claim: Claim,
    pub email_sent: bool,
}

/// Run the full submission pipeline for an already-validated claim.
///
/// # Errors
///
/// Returns `AppError::Database` only if the initial insert fails.
pub async fn submit_claim(
    state: &AppState,
    new: NewClaim,
    files: Vec<UploadedFile>,
) -> Result<SubmissionOutcome, AppError> {
    let claims = ClaimRepository::new(state.pool());
    let claim = claims.create(&new).await?;
    tracing::info!(
        claim_number = %claim.claim_number,
        claim_type = %claim.claim_type,
        "Claim registered"
    );

    persist_files(state, &claim, files).await;
    let pdf = generate_receipt(state, &claim).await;
    let email_sent = send_confirmation(state, &claim, pdf.as_deref()).await;
    notify_admin(state, &claim).await;
    record_creation(state, &claim).await;

    // Re-read so the response reflects the flags set along the way
    let claim = claims.get(claim.id).await?.unwrap_or(claim);
    Ok(SubmissionOutcome { claim, email_sent })
}

async fn persist_files(state: &AppState, claim: &Claim, files: Vec<UploadedFile>) {
    let repo = ClaimFileRepository::new(state.pool());
    let namespace = claim.claim_number.to_string();

    for file in files {
        let filename = format!(
            "{}_{}",
            uuid::Uuid::new_v4(),
            sanitize_filename(&file.original_name)
        );
        let stored = match state
            .store()
            .save(&namespace, &filename, &file.mime_type, &file.bytes)
            .await
        {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    claim_number = %claim.claim_number,
                    original_name = %file.original_name,
                    "Attachment storage failed, skipping file"
                );
                continue;
            }
        };

        #[allow(clippy::cast_possible_wrap)]
        let size_bytes = file.bytes.len() as i64;
        let row = NewClaimFile {
            claim_id: claim.id,
            filename,
            original_name: file.original_name,
            mime_type: file.mime_type,
            size_bytes,
            storage: stored.storage,
            storage_path: stored.path,
            remote_file_id: stored.remote_file_id,
            remote_view_url: stored.remote_view_url,
            upload_type: UploadType::Original,
        };
        if let Err(e) = repo.create(&row).await {
            tracing::warn!(
                error = %e,
                claim_number = %claim.claim_number,
                "Attachment row insert failed"
            );
        }
    }
}

/// Render and store the PDF receipt. `pdf_generated` is raised only after
/// the bytes are confirmed stored.
async fn generate_receipt(state: &AppState, claim: &Claim) -> Option<Vec<u8>> {
    let company = state.company().get().await;
    let pdf = match state.pdf().render_claim_receipt(claim, &company).await {
        Ok(pdf) => pdf,
        Err(e) => {
            tracing::warn!(
                error = %e,
                claim_number = %claim.claim_number,
                "PDF render failed, claim filed without receipt"
            );
            return None;
        }
    };

    let filename = PdfRenderer::receipt_filename(claim);
    let stored = match state
        .store()
        .save("pdfs", &filename, "application/pdf", &pdf)
        .await
    {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(
                error = %e,
                claim_number = %claim.claim_number,
                "PDF storage failed, claim filed without receipt"
            );
            return Some(pdf);
        }
    };

    let result = ClaimRepository::new(state.pool())
        .set_pdf_metadata(
            claim.id,
            stored.storage,
            stored.path.as_deref(),
            stored.remote_file_id.as_deref(),
        )
        .await;
    if let Err(e) = result {
        tracing::warn!(
            error = %e,
            claim_number = %claim.claim_number,
            "PDF metadata update failed"
        );
    }

    Some(pdf)
}

async fn send_confirmation(state: &AppState, claim: &Claim, pdf: Option<&[u8]>) -> bool {
    if claim.email.is_none() {
        return false;
    }

    let company = state.company().get().await;
    match state
        .email()
        .send_claim_confirmation(claim, &company, pdf)
        .await
    {
        Ok(outcome) => {
            tracing::debug!(
                claim_number = %claim.claim_number,
                ?outcome,
                "Confirmation email resolved"
            );
            if let Err(e) = ClaimRepository::new(state.pool())
                .mark_email_sent(claim.id)
                .await
            {
                tracing::warn!(error = %e, "email_sent flag update failed");
            }
            true
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                claim_number = %claim.claim_number,
                "Confirmation email failed"
            );
            false
        }
    }
}

async fn notify_admin(state: &AppState, claim: &Claim) {
    let Some(admin_email) = state.config().admin_email.as_deref() else {
        return;
    };

    if let Err(e) = state.email().send_admin_notification(claim, admin_email).await {
        tracing::warn!(
            error = %e,
            claim_number = %claim.claim_number,
            "Admin notification failed"
        );
    }
}

async fn record_creation(state: &AppState, claim: &Claim) {
    let details = json!({ "claim_number": claim.claim_number });
    let result = AuditLogRepository::new(state.pool())
        .append(claim.id, None, AuditAction::Created, Some(&details))
        .await;
    if let Err(e) = result {
        tracing::warn!(
            error = %e,
            claim_number = %claim.claim_number,
            "Audit entry insert failed"
        );
    }
}
