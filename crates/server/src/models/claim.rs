//! The claim aggregate.

use chrono::{DateTime, Utc};
use libro_reclamaciones_core::{
    ClaimId, ClaimNumber, ClaimStatus, ClaimType, Currency, DocumentType, Email,
    ProductServiceType, StorageKind,
};
use serde::Serialize;

/// A consumer-filed complaint, as stored.
#[derive(Debug, Clone, Serialize)]
pub struct Claim {
    pub id: ClaimId,
    pub claim_number: ClaimNumber,

    pub consumer_name: String,
    pub consumer_lastname_p: String,
    pub consumer_lastname_m: Option<String>,
    pub document_type: DocumentType,
    pub document_number: String,
    pub phone: String,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub department: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub is_minor: bool,
    pub relationship_with_company: Option<String>,

    pub product_service_type: Option<ProductServiceType>,
    pub amount: Option<f64>,
    pub currency: Currency,
    pub detail: String,
    pub request: Option<String>,
    pub claim_type: ClaimType,
    pub reason: Option<String>,

    pub communication_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    pub status: ClaimStatus,
    pub pdf_generated: bool,
    #[serde(skip)]
    pub pdf_path: Option<String>,
    #[serde(skip)]
    pub pdf_remote_id: Option<String>,
    pub pdf_storage: Option<StorageKind>,
    pub email_sent: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Claim {
    /// Consumer's full name as printed on receipts and emails.
    #[must_use]
    pub fn full_name(&self) -> String {
        match &self.consumer_lastname_m {
            Some(m) if !m.is_empty() => format!(
                "{} {} {}",
                self.consumer_name, self.consumer_lastname_p, m
            ),
            _ => format!("{} {}", self.consumer_name, self.consumer_lastname_p),
        }
    }

    /// Disputed amount rendered for receipts. A missing amount is never
    /// shown as zero.
    #[must_use]
    pub fn formatted_amount(&self) -> String {
        match self.amount {
            Some(amount) => format!("{} {amount:.2}", self.currency.symbol()),
            None => "No especificado".to_string(),
        }
    }
}

/// Subset of claim fields safe to return without authentication.
#[derive(Debug, Clone, Serialize)]
pub struct PublicClaim {
    pub claim_number: ClaimNumber,
    pub claim_type: ClaimType,
    pub status: ClaimStatus,
    pub pdf_generated: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Claim> for PublicClaim {
    fn from(claim: &Claim) -> Self {
        Self {
            claim_number: claim.claim_number.clone(),
            claim_type: claim.claim_type,
            status: claim.status,
            pdf_generated: claim.pdf_generated,
            created_at: claim.created_at,
        }
    }
}

/// A validated submission, ready to insert.
#[derive(Debug, Clone)]
pub struct NewClaim {
    pub consumer_name: String,
    pub consumer_lastname_p: String,
    pub consumer_lastname_m: Option<String>,
    pub document_type: DocumentType,
    pub document_number: String,
    pub phone: String,
    pub email: Option<Email>,
    pub address: Option<String>,
    pub department: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub is_minor: bool,
    pub relationship_with_company: Option<String>,
    pub product_service_type: Option<ProductServiceType>,
    pub amount: Option<f64>,
    pub currency: Currency,
    pub detail: String,
    pub request: Option<String>,
    pub claim_type: ClaimType,
    pub communication_medium: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl NewClaim {
    /// Standard reason line derived from the claim classification.
    #[must_use]
    pub fn derived_reason(&self) -> String {
        let kind = match self.claim_type {
            ClaimType::Reclamo => "Reclamo",
            ClaimType::Queja => "Queja",
        };
        let subject = self
            .product_service_type
            .unwrap_or(ProductServiceType::Servicio);
        format!("{kind} por disconformidad con un {}", subject.label())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_new_claim() -> NewClaim {
        NewClaim {
            consumer_name: "Juan".to_string(),
            consumer_lastname_p: "Pérez".to_string(),
            consumer_lastname_m: Some("García".to_string()),
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
            product_service_type: Some(ProductServiceType::Producto),
            amount: None,
            currency: Currency::Pen,
            detail: "Producto defectuoso, mínimo diez caracteres".to_string(),
            request: None,
            claim_type: ClaimType::Reclamo,
            communication_medium: None,
            ip_address: None,
            user_agent: None,
        }
    }

    #[test]
    fn test_derived_reason() {
        let claim = sample_new_claim();
        assert_eq!(
            claim.derived_reason(),
            "Reclamo por disconformidad con un producto"
        );
    }

    #[test]
    fn test_derived_reason_defaults_to_servicio() {
        let mut claim = sample_new_claim();
        claim.claim_type = ClaimType::Queja;
        claim.product_service_type = None;
        assert_eq!(
            claim.derived_reason(),
            "Queja por disconformidad con un servicio"
        );
    }
}
