//! Company settings: the identity block printed on receipts, plus the logo.

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::db::CompanyInfoUpdate;
use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::models::CompanyInfo;
use crate::routes::claims::parse_multipart;
use crate::state::AppState;
use crate::validation::sanitize_filename;

/// `GET /company-info`
pub async fn get_info(State(state): State<AppState>) -> Json<CompanyInfo> {
    Json(state.company().get().await)
}

/// `GET /company-info/logo`
pub async fn get_logo(State(state): State<AppState>) -> Result<Response, AppError> {
    let info = state.company().get().await;
    let mime_type = info
        .logo_mime_type
        .clone()
        .unwrap_or_else(|| "image/png".to_string());

    if let Some(remote_id) = &info.logo_remote_id {
        let bytes = state
            .store()
            .fetch_remote(remote_id)
            .await
            .map_err(|_| AppError::NotFound("Logo no encontrado".to_string()))?;
        return Ok(([(header::CONTENT_TYPE, mime_type)], bytes).into_response());
    }

    if let Some(path) = &info.logo_path {
        let bytes = state
            .store()
            .read_local(path)
            .await
            .map_err(|_| AppError::NotFound("Logo no encontrado".to_string()))?;
        return Ok(([(header::CONTENT_TYPE, mime_type)], bytes).into_response());
    }

    Err(AppError::NotFound("Logo no encontrado".to_string()))
}

const ALLOWED_LOGO_TYPES: &[&str] = &["image/jpeg", "image/png", "image/svg+xml", "image/webp"];

fn is_valid_ruc(s: &str) -> bool {
    s.len() == 11 && s.chars().all(|c| c.is_ascii_digit())
}

/// `PUT /company-info` (multipart) - partial update, optionally with a new
/// logo file.
pub async fn update_info(
    State(state): State<AppState>,
    RequireAdmin(user): RequireAdmin,
    multipart: Multipart,
) -> Result<Json<CompanyInfo>, AppError> {
    let form = parse_multipart(multipart).await?;

    let mut update = CompanyInfoUpdate::default();
    for (name, value) in form.fields {
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match name.as_str() {
            "name" => {
                let count = value.chars().count();
                if !(2..=100).contains(&count) {
                    return Err(AppError::validation(
                        "El nombre debe tener entre 2 y 100 caracteres",
                    ));
                }
                update.name = Some(value);
            }
            "ruc" => {
                if !is_valid_ruc(&value) {
                    return Err(AppError::validation("El RUC debe tener 11 dígitos"));
                }
                update.ruc = Some(value);
            }
            "address" => update.address = Some(value),
            "phone" => update.phone = Some(value),
            "email" => update.email = Some(value),
            "website" => update.website = Some(value),
            _ => {}
        }
    }

    if let Some(logo) = form.files.into_iter().next() {
        if !ALLOWED_LOGO_TYPES.contains(&logo.mime_type.as_str()) {
            return Err(AppError::validation(
                "El logo debe ser una imagen (JPEG, PNG, SVG o WebP)",
            ));
        }
        let filename = format!(
            "logo_{}_{}",
            uuid::Uuid::new_v4(),
            sanitize_filename(&logo.original_name)
        );
        let stored = state
            .store()
            .save("company", &filename, &logo.mime_type, &logo.bytes)
            .await
            .map_err(|e| AppError::Internal(format!("logo storage failed: {e}")))?;

        update.logo_path = stored.path;
        update.logo_remote_id = stored.remote_file_id;
        update.logo_mime_type = Some(logo.mime_type);
    }

    let info = state.company().update(&update).await?;
    tracing::info!(admin = %user.username, "Company info updated");
    Ok(Json(info))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ruc_validation() {
        assert!(is_valid_ruc("20872828607"));
        assert!(!is_valid_ruc("2087282860"));
        assert!(!is_valid_ruc("20872828607a"));
        assert!(!is_valid_ruc("2087282860a"));
    }
}
