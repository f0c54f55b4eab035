//! Unified error handling for the HTTP layer.

use std::sync::OnceLock;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;

/// Application-level error type.
///
/// User-visible messages are in Spanish; internal detail is logged but only
/// exposed to clients outside production.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request payload failed field validation.
    #[error("Datos inválidos")]
    Validation(Vec<String>),

    /// Request is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated user lacks permission.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness or state conflict.
    #[error("{0}")]
    Conflict(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Client exceeded a request limit.
    #[error("Demasiadas solicitudes, intente más tarde")]
    LimitExceeded,

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Convenience constructor for a single-message validation failure.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(vec![msg.into()])
    }
}

/// Whether error responses may carry internal detail. Read once from
/// `APP_ENV` so `IntoResponse` does not need access to application state.
fn expose_details() -> bool {
    static EXPOSE: OnceLock<bool> = OnceLock::new();
    *EXPOSE.get_or_init(|| {
        std::env::var("APP_ENV").map_or(true, |env| env != "production")
    })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            tracing::error!(error = %self, "Request error");
        }

        let status = match &self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::LimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            Self::Database(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Don't expose internal error detail to clients
        let message = match &self {
            Self::Database(RepositoryError::NotFound) => "Recurso no encontrado".to_string(),
            Self::Database(_) | Self::Internal(_) => "Error interno del servidor".to_string(),
            _ => self.to_string(),
        };

        let mut body = json!({ "error": message });
        if expose_details() {
            if let Self::Validation(details) = &self {
                body["details"] = json!(details);
            }
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Reclamo no encontrado".to_string());
        assert_eq!(err.to_string(), "Reclamo no encontrado");

        let err = AppError::Validation(vec!["El teléfono es requerido".to_string()]);
        assert_eq!(err.to_string(), "Datos inválidos");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::validation("x")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Conflict("x".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::LimitExceeded),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }
}
