//! Admin panel API: authentication, claim triage, responses, export, and
//! dashboard statistics.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{NaiveDate, Utc};
use libro_reclamaciones_core::{ClaimFileId, ClaimId, ClaimStatus, ClaimType, StorageKind, UploadType};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::{
    AdminUserRepository, AuditLogRepository, ClaimFileRepository, ClaimFilter, ClaimRepository,
    DashboardStats,
};
use crate::error::AppError;
use crate::middleware::auth::issue_token;
use crate::middleware::{Authenticated, RequireAdmin};
use crate::models::{AdminUser, AuditAction, AuditEntry, Claim, ClaimFile, NewClaimFile};
use crate::routes::claims::parse_multipart;
use crate::state::AppState;
use crate::validation::{
    MAX_RESPONSE_FILES, MAX_RESPONSE_MESSAGE, sanitize_filename, validate_files,
};

// =============================================================================
// Authentication
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email address.
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    token: String,
    #[serde(rename = "csrfToken")]
    csrf_token: String,
    user: AdminUser,
}

/// `POST /admin/login`
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Credenciales inválidas".to_string());

    let repo = AdminUserRepository::new(state.pool());
    let user = repo
        .get_by_login(body.username.trim())
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(invalid)?;

    let verified = bcrypt::verify(&body.password, &user.password_hash).unwrap_or(false);
    if !verified {
        tracing::warn!(username = %user.username, "Failed login attempt");
        return Err(invalid());
    }

    let token = issue_token(&state.config().jwt_secret, &user)?;
    repo.touch_last_login(user.id).await?;

    let mut csrf_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut csrf_bytes);

    tracing::info!(username = %user.username, "Admin logged in");
    Ok(Json(LoginResponse {
        token,
        csrf_token: hex::encode(csrf_bytes),
        user,
    }))
}

/// `POST /admin/logout` - tokens are stateless; the client discards it.
pub async fn logout(Authenticated(user): Authenticated) -> Json<serde_json::Value> {
    tracing::info!(username = %user.username, "Admin logged out");
    Json(json!({ "message": "Sesión cerrada" }))
}

/// `GET /admin/profile`
pub async fn profile(Authenticated(user): Authenticated) -> Json<AdminUser> {
    Json(user)
}

// =============================================================================
// Claim listing
// =============================================================================

const DEFAULT_PAGE_SIZE: u32 = 20;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub claim_type: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    fn filter(&self) -> Result<ClaimFilter, AppError> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<ClaimStatus>)
            .transpose()
            .map_err(|_| AppError::validation("Estado de filtro inválido"))?;
        let claim_type = self
            .claim_type
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<ClaimType>)
            .transpose()
            .map_err(|_| AppError::validation("Tipo de filtro inválido"))?;

        let date_from = self
            .date_from
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<NaiveDate>()
                    .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
            })
            .transpose()
            .map_err(|_| AppError::validation("Fecha inicial inválida (use AAAA-MM-DD)"))?;
        let date_to = self
            .date_to
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<NaiveDate>()
                    .map(|d| d.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc())
            })
            .transpose()
            .map_err(|_| AppError::validation("Fecha final inválida (use AAAA-MM-DD)"))?;

        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);

        Ok(ClaimFilter {
            status,
            claim_type,
            date_from,
            date_to,
            search,
        })
    }

    fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Serialize)]
struct Pagination {
    current_page: u32,
    total_pages: i64,
    total_items: i64,
    items_per_page: u32,
    has_next: bool,
    has_prev: bool,
}

impl Pagination {
    fn new(page: u32, limit: u32, total: i64) -> Self {
        let total_pages = (total + i64::from(limit) - 1) / i64::from(limit);
        Self {
            current_page: page,
            total_pages,
            total_items: total,
            items_per_page: limit,
            has_next: i64::from(page) * i64::from(limit) < total,
            has_prev: page > 1,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    claims: Vec<Claim>,
    pagination: Pagination,
}

/// `GET /admin/claims`
pub async fn list_claims(
    State(state): State<AppState>,
    Authenticated(_user): Authenticated,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, AppError> {
    let filter = query.filter()?;
    let (page, limit) = (query.page(), query.limit());

    let (claims, total) = ClaimRepository::new(state.pool())
        .list(&filter, page, limit)
        .await?;

    Ok(Json(ListResponse {
        claims,
        pagination: Pagination::new(page, limit, total),
    }))
}

// =============================================================================
// Claim detail and mutations
// =============================================================================

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    claim: Claim,
    files: Vec<FileView>,
    audit_log: Vec<AuditEntry>,
}

/// A claim file with its download location resolved.
#[derive(Debug, Serialize)]
struct FileView {
    #[serde(flatten)]
    file: ClaimFile,
    download_url: String,
}

impl From<ClaimFile> for FileView {
    fn from(file: ClaimFile) -> Self {
        let download_url = format!("/admin/files/{}/download", file.id);
        Self { file, download_url }
    }
}

async fn load_claim(state: &AppState, id: i64) -> Result<Claim, AppError> {
    ClaimRepository::new(state.pool())
        .get(ClaimId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Reclamo no encontrado".to_string()))
}

/// `GET /admin/claims/{id}`
pub async fn claim_detail(
    State(state): State<AppState>,
    Authenticated(_user): Authenticated,
    Path(id): Path<i64>,
) -> Result<Json<DetailResponse>, AppError> {
    let claim = load_claim(&state, id).await?;
    let file_repo = ClaimFileRepository::new(state.pool());
    let audit_repo = AuditLogRepository::new(state.pool());
    let (files, audit_log) = tokio::try_join!(
        file_repo.list_for_claim(claim.id),
        audit_repo.list_for_claim(claim.id),
    )?;

    Ok(Json(DetailResponse {
        claim,
        files: files.into_iter().map(Into::into).collect(),
        audit_log,
    }))
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
    pub notes: Option<String>,
}

/// `PATCH /admin/claims/{id}/status`
///
/// Transitions are unrestricted; the audit log keeps the history.
pub async fn change_status(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<i64>,
    Json(body): Json<StatusChangeRequest>,
) -> Result<Json<Claim>, AppError> {
    let new_status = body
        .status
        .parse::<ClaimStatus>()
        .map_err(|_| AppError::validation("Estado inválido"))?;
    if let Some(notes) = &body.notes {
        if notes.chars().count() > 500 {
            return Err(AppError::validation(
                "Las notas deben tener como máximo 500 caracteres",
            ));
        }
    }

    let claim = load_claim(&state, id).await?;
    let repo = ClaimRepository::new(state.pool());
    repo.update_status(claim.id, new_status).await?;

    let details = json!({
        "old_status": claim.status,
        "new_status": new_status,
        "notes": body.notes,
    });
    AuditLogRepository::new(state.pool())
        .append(
            claim.id,
            Some(user.id),
            AuditAction::StatusChanged,
            Some(&details),
        )
        .await?;

    tracing::info!(
        claim_number = %claim.claim_number,
        old_status = %claim.status,
        new_status = %new_status,
        admin = %user.username,
        "Claim status changed"
    );

    let updated = load_claim(&state, id).await?;
    Ok(Json(updated))
}

/// `POST /admin/claims/{id}/respond` (multipart)
///
/// Sends the written response to the consumer's email, stores any
/// response attachments, and moves the claim to `respondido`.
pub async fn respond(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let claim = load_claim(&state, id).await?;
    if claim.email.is_none() {
        return Err(AppError::BadRequest(
            "El reclamo no tiene un email registrado".to_string(),
        ));
    }

    let form = parse_multipart(multipart).await?;
    validate_files(
        &form.files,
        MAX_RESPONSE_FILES,
        state.config().max_response_file_size,
    )
    .map_err(AppError::Validation)?;

    let mut message = None;
    let mut notes = None;
    for (name, value) in form.fields {
        match name.as_str() {
            "message" => message = Some(value),
            "notes" => notes = Some(value),
            _ => {}
        }
    }
    let message = message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::validation("El mensaje de respuesta es requerido"))?;
    if message.chars().count() > MAX_RESPONSE_MESSAGE {
        return Err(AppError::validation(
            "El mensaje debe tener como máximo 2000 caracteres",
        ));
    }

    // Store response attachments; a failed upload is skipped, not fatal
    let file_repo = ClaimFileRepository::new(state.pool());
    let namespace = claim.claim_number.to_string();
    let mut email_attachments = Vec::new();
    for file in form.files {
        let filename = format!(
            "{}_{}",
            uuid::Uuid::new_v4(),
            sanitize_filename(&file.original_name)
        );
        match state
            .store()
            .save(&namespace, &filename, &file.mime_type, &file.bytes)
            .await
        {
            Ok(stored) => {
                #[allow(clippy::cast_possible_wrap)]
                let size_bytes = file.bytes.len() as i64;
                let row = NewClaimFile {
                    claim_id: claim.id,
                    filename,
                    original_name: file.original_name.clone(),
                    mime_type: file.mime_type.clone(),
                    size_bytes,
                    storage: stored.storage,
                    storage_path: stored.path,
                    remote_file_id: stored.remote_file_id,
                    remote_view_url: stored.remote_view_url,
                    upload_type: UploadType::EmailResponse,
                };
                if let Err(e) = file_repo.create(&row).await {
                    tracing::warn!(error = %e, "Response attachment row insert failed");
                }
                email_attachments.push((file.original_name, file.mime_type, file.bytes));
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    original_name = %file.original_name,
                    "Response attachment storage failed, skipping"
                );
            }
        }
    }

    // The email is the point of this operation; its failure fails the call
    let company = state.company().get().await;
    state
        .email()
        .send_claim_response(&claim, &company, &message, &email_attachments)
        .await
        .map_err(|e| AppError::Internal(format!("response email failed: {e}")))?;

    let repo = ClaimRepository::new(state.pool());
    repo.update_status(claim.id, ClaimStatus::Respondido).await?;

    let details = json!({
        "message_length": message.chars().count(),
        "attachments": email_attachments.len(),
        "notes": notes,
    });
    AuditLogRepository::new(state.pool())
        .append(
            claim.id,
            Some(user.id),
            AuditAction::EmailResponseSent,
            Some(&details),
        )
        .await?;

    tracing::info!(
        claim_number = %claim.claim_number,
        admin = %user.username,
        "Response sent"
    );
    Ok(Json(json!({ "message": "Respuesta enviada" })))
}

// =============================================================================
// File download
// =============================================================================

/// `GET /admin/files/{id}/download`
pub async fn download_file(
    State(state): State<AppState>,
    Authenticated(_user): Authenticated,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let file = ClaimFileRepository::new(state.pool())
        .get(ClaimFileId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("Archivo no encontrado".to_string()))?;

    match file.storage {
        StorageKind::Remote => {
            let file_id = file
                .remote_file_id
                .as_deref()
                .ok_or_else(|| AppError::Internal("remote_file_id missing".to_string()))?;
            let url = state
                .store()
                .remote_download_url(file_id)
                .await
                .map_err(|e| AppError::Internal(e.to_string()))?;
            Ok(Redirect::temporary(&url).into_response())
        }
        StorageKind::Local => {
            let path = file
                .storage_path
                .as_deref()
                .ok_or_else(|| AppError::Internal("storage_path missing".to_string()))?;
            let bytes = state
                .store()
                .read_local(path)
                .await
                .map_err(|_| AppError::NotFound("Archivo no encontrado".to_string()))?;
            Ok((
                [
                    (header::CONTENT_TYPE, file.mime_type.clone()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", file.original_name),
                    ),
                ],
                bytes,
            )
                .into_response())
        }
    }
}

// =============================================================================
// CSV export
// =============================================================================

const CSV_HEADERS: [&str; 16] = [
    "Número de Reclamo",
    "Fecha de Creación",
    "Estado",
    "Tipo",
    "Nombres",
    "Apellido Paterno",
    "Apellido Materno",
    "Tipo de Documento",
    "Número de Documento",
    "Teléfono",
    "Email",
    "Motivo",
    "Monto",
    "Moneda",
    "Detalle",
    "Pedido",
];

fn csv_internal(e: impl std::fmt::Display) -> AppError {
    AppError::Internal(format!("csv export failed: {e}"))
}

/// `GET /admin/claims/export/csv` - unpaginated export honoring the same
/// filters as the list.
pub async fn export_csv(
    State(state): State<AppState>,
    Authenticated(_user): Authenticated,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    let filter = query.filter()?;
    let claims = ClaimRepository::new(state.pool()).list_all(&filter).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS).map_err(csv_internal)?;
    for claim in &claims {
        writer
            .write_record([
                claim.claim_number.as_str(),
                &claim.created_at.format("%d/%m/%Y %H:%M").to_string(),
                claim.status.label(),
                claim.claim_type.label(),
                &claim.consumer_name,
                &claim.consumer_lastname_p,
                claim.consumer_lastname_m.as_deref().unwrap_or(""),
                claim.document_type.as_str(),
                &claim.document_number,
                &claim.phone,
                claim.email.as_ref().map_or("", |e| e.as_str()),
                claim.reason.as_deref().unwrap_or(""),
                &claim.amount.map_or(String::new(), |a| format!("{a:.2}")),
                claim.currency.as_str(),
                &claim.detail,
                claim.request.as_deref().unwrap_or(""),
            ])
            .map_err(csv_internal)?;
    }

    let data = writer
        .into_inner()
        .map_err(|e| csv_internal(e.to_string()))?;
    let filename = format!("reclamos_{}.csv", Utc::now().format("%Y%m%d"));

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        data,
    )
        .into_response())
}

// =============================================================================
// Dashboard
// =============================================================================

/// `GET /admin/dashboard/stats`
pub async fn dashboard_stats(
    State(state): State<AppState>,
    Authenticated(_user): Authenticated,
) -> Result<Json<DashboardStats>, AppError> {
    let stats = ClaimRepository::new(state.pool()).dashboard_stats().await?;
    Ok(Json(stats))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_boundaries() {
        // 12 items, 5 per page
        let p1 = Pagination::new(1, 5, 12);
        assert_eq!(p1.total_pages, 3);
        assert!(p1.has_next);
        assert!(!p1.has_prev);

        let p2 = Pagination::new(2, 5, 12);
        assert!(p2.has_next);
        assert!(p2.has_prev);

        let p3 = Pagination::new(3, 5, 12);
        assert!(!p3.has_next);
        assert!(p3.has_prev);
    }

    #[test]
    fn test_pagination_empty() {
        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
        assert!(!p.has_next);
        assert!(!p.has_prev);
    }

    #[test]
    fn test_list_query_defaults_and_clamps() {
        let q = ListQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 20);

        let q = ListQuery {
            page: Some(0),
            limit: Some(500),
            ..ListQuery::default()
        };
        assert_eq!(q.page(), 1);
        assert_eq!(q.limit(), 100);
    }

    #[test]
    fn test_list_query_filter_parses_dates() {
        let q = ListQuery {
            date_from: Some("2026-01-01".to_string()),
            date_to: Some("2026-01-31".to_string()),
            status: Some("pendiente".to_string()),
            ..ListQuery::default()
        };
        let filter = q.filter().unwrap();
        assert_eq!(filter.status, Some(ClaimStatus::Pendiente));
        assert!(filter.date_from.unwrap() < filter.date_to.unwrap());
    }

    #[test]
    fn test_list_query_filter_rejects_bad_status() {
        let q = ListQuery {
            status: Some("archivado".to_string()),
            ..ListQuery::default()
        };
        assert!(q.filter().is_err());
    }
}
