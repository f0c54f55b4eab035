//! Status and classification enums of the complaint book domain.
//!
//! Every enum here is stored in SQLite as its lowercase string form and
//! serialized the same way over JSON, so the wire, the database, and the
//! Rust side all agree on one spelling.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an enum from an unknown string value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct InvalidEnumValue {
    kind: &'static str,
    value: String,
}

impl InvalidEnumValue {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Lifecycle state of a claim.
///
/// New claims start as `Pendiente`. Transitions between states are
/// unrestricted; the audit log records every change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Just filed, nobody has looked at it yet.
    Pendiente,
    /// An administrator is working on it.
    EnRevision,
    /// A written response was sent to the consumer.
    Respondido,
    /// Closed, no further action expected.
    Cerrado,
}

impl ClaimStatus {
    /// All states, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Pendiente,
        Self::EnRevision,
        Self::Respondido,
        Self::Cerrado,
    ];

    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pendiente => "pendiente",
            Self::EnRevision => "en_revision",
            Self::Respondido => "respondido",
            Self::Cerrado => "cerrado",
        }
    }

    /// Spanish label shown in exports and emails.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pendiente => "Pendiente",
            Self::EnRevision => "En revisión",
            Self::Respondido => "Respondido",
            Self::Cerrado => "Cerrado",
        }
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClaimStatus {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pendiente" => Ok(Self::Pendiente),
            "en_revision" => Ok(Self::EnRevision),
            "respondido" => Ok(Self::Respondido),
            "cerrado" => Ok(Self::Cerrado),
            other => Err(InvalidEnumValue::new("claim status", other)),
        }
    }
}

/// Legal classification of a submission.
///
/// A `Reclamo` disputes the product or service itself; a `Queja` complains
/// about the attention received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    Reclamo,
    Queja,
}

impl ClaimType {
    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reclamo => "reclamo",
            Self::Queja => "queja",
        }
    }

    /// Spanish label shown in exports and emails.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Reclamo => "Reclamo",
            Self::Queja => "Queja",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClaimType {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reclamo" => Ok(Self::Reclamo),
            "queja" => Ok(Self::Queja),
            other => Err(InvalidEnumValue::new("claim type", other)),
        }
    }
}

/// Whether the claim concerns a product or a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum ProductServiceType {
    Producto,
    Servicio,
}

impl ProductServiceType {
    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Producto => "producto",
            Self::Servicio => "servicio",
        }
    }

    /// Spanish label, lowercase, used inside derived sentences.
    #[must_use]
    pub const fn label(self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ProductServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductServiceType {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "producto" => Ok(Self::Producto),
            "servicio" => Ok(Self::Servicio),
            other => Err(InvalidEnumValue::new("product/service type", other)),
        }
    }
}

/// Currency of the disputed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Peruvian sol.
    Pen,
    /// US dollar.
    Usd,
}

impl Currency {
    /// The stored string form (ISO 4217 code).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pen => "PEN",
            Self::Usd => "USD",
        }
    }

    /// Symbol used when rendering amounts.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Pen => "S/",
            Self::Usd => "$",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Currency {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PEN" => Ok(Self::Pen),
            "USD" => Ok(Self::Usd),
            other => Err(InvalidEnumValue::new("currency", other)),
        }
    }
}

/// Identity document types accepted on the public form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    /// Documento Nacional de Identidad.
    Dni,
    /// Carné de extranjería.
    Ce,
    /// Passport.
    Pasaporte,
}

impl DocumentType {
    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dni => "DNI",
            Self::Ce => "CE",
            Self::Pasaporte => "PASAPORTE",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DNI" => Ok(Self::Dni),
            "CE" => Ok(Self::Ce),
            "PASAPORTE" => Ok(Self::Pasaporte),
            other => Err(InvalidEnumValue::new("document type", other)),
        }
    }
}

/// Role assigned to an admin panel account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Full access, including user management.
    SuperAdmin,
    /// Full access to claims.
    Admin,
    /// Read-only access.
    Viewer,
}

impl AdminRole {
    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }

    /// Whether this role may mutate claims and send responses.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "super_admin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "viewer" => Ok(Self::Viewer),
            other => Err(InvalidEnumValue::new("admin role", other)),
        }
    }
}

/// How an attachment entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum UploadType {
    /// Uploaded by the consumer with the original submission.
    Original,
    /// Attached by an administrator to an emailed response.
    EmailResponse,
}

impl UploadType {
    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::EmailResponse => "email_response",
        }
    }
}

impl fmt::Display for UploadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UploadType {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(Self::Original),
            "email_response" => Ok(Self::EmailResponse),
            other => Err(InvalidEnumValue::new("upload type", other)),
        }
    }
}

/// Which backend holds a stored object (uploaded attachment or generated
/// PDF receipt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlite", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlite", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// Stored on the server's local disk.
    Local,
    /// Stored in the remote drive.
    Remote,
}

impl StorageKind {
    /// The stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Remote => "remote",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StorageKind {
    type Err = InvalidEnumValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "remote" => Ok(Self::Remote),
            other => Err(InvalidEnumValue::new("storage kind", other)),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_claim_status_string_forms() {
        for status in ClaimStatus::ALL {
            assert_eq!(ClaimStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(ClaimStatus::from_str("archivado").is_err());
    }

    #[test]
    fn test_claim_status_serde_matches_display() {
        let json = serde_json::to_string(&ClaimStatus::EnRevision).unwrap();
        assert_eq!(json, "\"en_revision\"");
    }

    #[test]
    fn test_claim_type_parse() {
        assert_eq!(ClaimType::from_str("queja").unwrap(), ClaimType::Queja);
        assert!(ClaimType::from_str("Reclamo").is_err());
    }

    #[test]
    fn test_currency_uppercase() {
        assert_eq!(
            serde_json::to_string(&Currency::Pen).unwrap(),
            "\"PEN\""
        );
        assert_eq!(Currency::from_str("USD").unwrap(), Currency::Usd);
        assert_eq!(Currency::Pen.symbol(), "S/");
    }

    #[test]
    fn test_document_type_parse() {
        assert_eq!(DocumentType::from_str("DNI").unwrap(), DocumentType::Dni);
        assert!(DocumentType::from_str("dni").is_err());
    }

    #[test]
    fn test_admin_role_permissions() {
        assert!(AdminRole::SuperAdmin.is_admin());
        assert!(AdminRole::Admin.is_admin());
        assert!(!AdminRole::Viewer.is_admin());
    }

    #[test]
    fn test_upload_type_serde() {
        assert_eq!(
            serde_json::to_string(&UploadType::EmailResponse).unwrap(),
            "\"email_response\""
        );
    }
}
