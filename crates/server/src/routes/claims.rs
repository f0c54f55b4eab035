//! Public claim submission and retrieval.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use libro_reclamaciones_core::{ClaimId, StorageKind};
use serde::Serialize;

use crate::db::ClaimRepository;
use crate::error::AppError;
use crate::models::PublicClaim;
use crate::services::submission::submit_claim;
use crate::state::AppState;
use crate::validation::{
    MAX_SUBMISSION_FILES, RawSubmission, UploadedFile, validate_files, validate_submission,
};

#[derive(Debug, Serialize)]
struct SubmitResponse {
    claim_number: String,
    id: i64,
    pdf_url: String,
    email_sent: bool,
}

/// Collected multipart form content.
pub(crate) struct ParsedForm {
    pub fields: Vec<(String, String)>,
    pub files: Vec<UploadedFile>,
}

/// Split a multipart body into text fields and file uploads.
pub(crate) async fn parse_multipart(mut multipart: Multipart) -> Result<ParsedForm, AppError> {
    let mut fields = Vec::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Formulario inválido: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name() {
            let original_name = file_name.to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Archivo inválido: {e}")))?;
            files.push(UploadedFile {
                original_name,
                mime_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Campo inválido: {e}")))?;
            fields.push((name, value));
        }
    }

    Ok(ParsedForm { fields, files })
}

fn raw_from_fields(fields: Vec<(String, String)>) -> RawSubmission {
    let mut raw = RawSubmission::default();
    for (name, value) in fields {
        match name.as_str() {
            "consumer_name" => raw.consumer_name = Some(value),
            "consumer_lastname_p" => raw.consumer_lastname_p = Some(value),
            "consumer_lastname_m" => raw.consumer_lastname_m = Some(value),
            "document_type" => raw.document_type = Some(value),
            "document_number" => raw.document_number = Some(value),
            "phone" => raw.phone = Some(value),
            "email" => raw.email = Some(value),
            "address" => raw.address = Some(value),
            "department" => raw.department = Some(value),
            "province" => raw.province = Some(value),
            "district" => raw.district = Some(value),
            "is_minor" => raw.is_minor = Some(value),
            "relationship_with_company" => raw.relationship_with_company = Some(value),
            "product_service_type" => raw.product_service_type = Some(value),
            "amount" => raw.amount = Some(value),
            "currency" => raw.currency = Some(value),
            "detail" => raw.detail = Some(value),
            "request" => raw.request = Some(value),
            "claim_type" => raw.claim_type = Some(value),
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }
    raw
}

/// `POST /claims` - file a new claim.
pub async fn submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = parse_multipart(multipart).await?;

    validate_files(&form.files, MAX_SUBMISSION_FILES, state.config().max_file_size)
        .map_err(AppError::Validation)?;
    let mut new = validate_submission(&raw_from_fields(form.fields)).map_err(AppError::Validation)?;

    new.communication_medium = Some("Correo electrónico".to_string());
    new.ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string());
    new.user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string);

    let outcome = submit_claim(&state, new, form.files).await?;
    let claim = outcome.claim;

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            claim_number: claim.claim_number.to_string(),
            id: claim.id.as_i64(),
            pdf_url: format!("/claims/{}/pdf", claim.id),
            email_sent: outcome.email_sent,
        }),
    ))
}

/// `GET /claims/{id}` - public subset of a claim's fields.
pub async fn get_claim(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicClaim>, AppError> {
    let claim = ClaimRepository::new(state.pool())
        .get(ClaimId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Reclamo no encontrado".to_string()))?;

    Ok(Json(PublicClaim::from(&claim)))
}

/// `GET /claims/{id}/pdf` - stream the receipt or redirect to its remote
/// location.
pub async fn get_pdf(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let claim = ClaimRepository::new(state.pool())
        .get(ClaimId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Reclamo no encontrado".to_string()))?;

    if !claim.pdf_generated {
        return Err(AppError::NotFound("El PDF aún no está disponible".to_string()));
    }

    match claim.pdf_storage {
        Some(StorageKind::Remote) => {
            let file_id = claim
                .pdf_remote_id
                .as_deref()
                .ok_or_else(|| AppError::Internal("pdf_remote_id missing".to_string()))?;
            let url = state
                .store()
                .remote_download_url(file_id)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok(Redirect::temporary(&url).into_response())
        }
        Some(StorageKind::Local) => {
            let path = claim
                .pdf_path
                .as_deref()
                .ok_or_else(|| AppError::Internal("pdf_path missing".to_string()))?;
            let bytes = state
                .store()
                .read_local(path)
                .await
                .map_err(|_| AppError::NotFound("El PDF aún no está disponible".to_string()))?;
            Ok((
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("inline; filename=\"reclamo_{}.pdf\"", claim.claim_number),
                    ),
                ],
                bytes,
            )
                .into_response())
        }
        None => Err(AppError::NotFound("El PDF aún no está disponible".to_string())),
    }
}
