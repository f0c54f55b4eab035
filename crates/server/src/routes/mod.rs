//! HTTP route handlers and router assembly.

pub mod admin;
pub mod claims;
pub mod company;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::validation::MAX_SUBMISSION_FILES;

/// Headroom for text fields and multipart framing on top of the attachment
/// payload.
const BODY_OVERHEAD_BYTES: usize = 2 * 1024 * 1024;

/// Total request body ceiling: a full set of maximum-size submission
/// attachments plus overhead.
fn max_body_bytes(state: &AppState) -> usize {
    state
        .config()
        .max_file_size
        .saturating_mul(MAX_SUBMISSION_FILES)
        .saturating_add(BODY_OVERHEAD_BYTES)
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let body_limit = max_body_bytes(&state);
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        // Public surface
        .route("/claims", post(claims::submit))
        .route("/claims/{id}", get(claims::get_claim))
        .route("/claims/{id}/pdf", get(claims::get_pdf))
        // Admin surface
        .route("/admin/login", post(admin::login))
        .route("/admin/logout", post(admin::logout))
        .route("/admin/profile", get(admin::profile))
        .route("/admin/claims", get(admin::list_claims))
        .route("/admin/claims/export/csv", get(admin::export_csv))
        .route("/admin/claims/{id}", get(admin::claim_detail))
        .route("/admin/claims/{id}/status", patch(admin::change_status))
        .route("/admin/claims/{id}/respond", post(admin::respond))
        .route("/admin/files/{id}/download", get(admin::download_file))
        .route("/admin/dashboard/stats", get(admin::dashboard_stats))
        // Company settings
        .route(
            "/company-info",
            get(company::get_info).put(company::update_info),
        )
        .route("/company-info/logo", get(company::get_logo))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Readiness probe: verifies the database answers.
async fn ready(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<serde_json::Value>, crate::error::AppError> {
    sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(state.pool())
        .await
        .map_err(|e| crate::error::AppError::Internal(format!("database not ready: {e}")))?;
    Ok(Json(serde_json::json!({ "status": "ready" })))
}
