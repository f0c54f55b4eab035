//! Bearer-token authentication for the admin API.
//!
//! Tokens are signed JWTs valid for eight hours, carrying the user id,
//! username, and role. Every request re-checks the account against the
//! database so a deactivated admin is locked out immediately, not at
//! token expiry.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use libro_reclamaciones_core::{AdminRole, AdminUserId};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::db::AdminUserRepository;
use crate::error::AppError;
use crate::models::AdminUser;
use crate::state::AppState;

/// How long an issued token stays valid.
pub const TOKEN_VALIDITY_HOURS: i64 = 8;

/// JWT claims carried by an admin token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Admin user id.
    pub sub: i64,
    pub username: String,
    pub role: AdminRole,
    /// Expiry as a unix timestamp.
    pub exp: i64,
}

/// Sign a token for a freshly authenticated admin.
///
/// # Errors
///
/// Returns `AppError::Internal` if signing fails.
pub fn issue_token(secret: &SecretString, user: &AdminUser) -> Result<String, AppError> {
    let claims = TokenClaims {
        sub: user.id.as_i64(),
        username: user.username.clone(),
        role: user.role,
        exp: (Utc::now() + Duration::hours(TOKEN_VALIDITY_HOURS)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

/// Verify a token's signature and expiry.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for an invalid or expired token.
pub fn decode_token(secret: &SecretString, token: &str) -> Result<TokenClaims, AppError> {
    decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Forbidden("Token inválido o expirado".to_string()))
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("Token de acceso requerido".to_string()))
}

/// Extractor for any authenticated admin account, regardless of role.
pub struct Authenticated(pub AdminUser);

impl<S> FromRequestParts<S> for Authenticated
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer_token(parts)?;
        let claims = decode_token(&state.config().jwt_secret, token)?;

        let user = AdminUserRepository::new(state.pool())
            .get_by_id(AdminUserId::new(claims.sub))
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| AppError::Unauthorized("Usuario no autorizado".to_string()))?;

        Ok(Self(user))
    }
}

/// Extractor that additionally requires the `admin` or `super_admin` role.
pub struct RequireAdmin(pub AdminUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Authenticated(user) = Authenticated::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::Forbidden(
                "Permisos insuficientes para esta operación".to_string(),
            ));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use libro_reclamaciones_core::Email;

    fn sample_user() -> AdminUser {
        AdminUser {
            id: AdminUserId::new(7),
            username: "maria".to_string(),
            email: Email::parse("maria@example.com").unwrap(),
            password_hash: String::new(),
            full_name: None,
            role: AdminRole::Admin,
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_token_roundtrip() {
        let secret = SecretString::from("kR9#vT2$mN8@wQ5!xZ3&jL6*pB4^yH1c");
        let token = issue_token(&secret, &sample_user()).unwrap();
        let claims = decode_token(&secret, &token).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.username, "maria");
        assert_eq!(claims.role, AdminRole::Admin);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let secret = SecretString::from("kR9#vT2$mN8@wQ5!xZ3&jL6*pB4^yH1c");
        let other = SecretString::from("aF4$gD7!hS2@kJ9#lM5&nP8*qR3^tV6w");
        let token = issue_token(&secret, &sample_user()).unwrap();
        assert!(matches!(
            decode_token(&other, &token),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let secret = SecretString::from("kR9#vT2$mN8@wQ5!xZ3&jL6*pB4^yH1c");
        assert!(decode_token(&secret, "not.a.token").is_err());
    }
}
