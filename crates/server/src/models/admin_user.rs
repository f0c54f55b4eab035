//! Admin panel accounts.

use chrono::{DateTime, Utc};
use libro_reclamaciones_core::{AdminRole, AdminUserId, Email};
use serde::Serialize;

/// An admin panel account.
///
/// The password hash never leaves the server; it is skipped during
/// serialization.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub username: String,
    pub email: Email,
    #[serde(skip)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: AdminRole,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_not_serialized() {
        let user = AdminUser {
            id: AdminUserId::new(1),
            username: "maria".to_string(),
            email: Email::parse("maria@example.com").unwrap(),
            password_hash: "$2b$12$abcdefghijklmnopqrstuv".to_string(),
            full_name: None,
            role: AdminRole::Admin,
            is_active: true,
            last_login: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$"));
        assert!(json.contains("\"username\":\"maria\""));
    }
}
