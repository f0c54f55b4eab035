//! Outgoing email.
//!
//! The service is built once at startup. Without SMTP credentials it
//! becomes a no-op sentinel: sends resolve successfully with
//! [`EmailOutcome::Disabled`] so callers (and the `email_sent` flag) behave
//! identically with and without a mail server.

use askama::Template;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::{Claim, CompanyInfo};

/// Errors from sending an email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// Template rendering failed.
    #[error("template error: {0}")]
    Template(#[from] askama::Error),

    /// An address could not be parsed.
    #[error("invalid address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Message construction failed.
    #[error("message build error: {0}")]
    Build(#[from] lettre::error::Error),

    /// SMTP transport error.
    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// The claim has no email address to send to.
    #[error("claim has no email address")]
    NoRecipient,
}

/// How a send resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailOutcome {
    /// Handed to the SMTP server.
    Sent,
    /// No transport configured; treated as success.
    Disabled,
}

#[derive(Template)]
#[template(path = "email/claim_confirmation.html")]
struct ClaimConfirmationTemplate {
    company_name: String,
    full_name: String,
    claim_number: String,
    claim_type_label: String,
    filed_at: String,
}

#[derive(Template)]
#[template(path = "email/admin_notification.html")]
struct AdminNotificationTemplate {
    claim_number: String,
    claim_type_label: String,
    full_name: String,
    phone: String,
    detail: String,
    filed_at: String,
}

#[derive(Template)]
#[template(path = "email/claim_response.html")]
struct ClaimResponseTemplate {
    company_name: String,
    full_name: String,
    claim_number: String,
    message: String,
}

#[derive(Clone)]
struct Transport {
    smtp: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

/// Outgoing email service.
#[derive(Clone)]
pub struct EmailService {
    transport: Option<Transport>,
}

impl EmailService {
    /// Build the service from optional SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the configured relay or sender address is
    /// invalid.
    pub fn from_config(config: Option<&EmailConfig>) -> Result<Self, EmailError> {
        let Some(config) = config else {
            tracing::info!("SMTP not configured; outgoing email disabled");
            return Ok(Self::disabled());
        };

        let smtp = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.expose_secret().to_string(),
            ))
            .build();
        let from = config.from_address.parse::<Mailbox>()?;

        Ok(Self {
            transport: Some(Transport { smtp, from }),
        })
    }

    /// A service that resolves every send as [`EmailOutcome::Disabled`].
    #[must_use]
    pub const fn disabled() -> Self {
        Self { transport: None }
    }

    /// Whether a real SMTP transport is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Confirmation sent to the consumer after filing, with the PDF receipt
    /// attached when one was generated.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::NoRecipient` if the claim carries no email.
    pub async fn send_claim_confirmation(
        &self,
        claim: &Claim,
        company: &CompanyInfo,
        pdf: Option<&[u8]>,
    ) -> Result<EmailOutcome, EmailError> {
        let recipient = claim.email.as_ref().ok_or(EmailError::NoRecipient)?;

        let html = ClaimConfirmationTemplate {
            company_name: company.name.clone(),
            full_name: claim.full_name(),
            claim_number: claim.claim_number.to_string(),
            claim_type_label: claim.claim_type.label().to_string(),
            filed_at: claim.created_at.format("%d/%m/%Y %H:%M").to_string(),
        }
        .render()?;

        let subject = format!(
            "Confirmación de registro - {} {}",
            claim.claim_type.label(),
            claim.claim_number
        );

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(html));
        if let Some(pdf) = pdf {
            body = body.singlepart(
                Attachment::new(format!("reclamo_{}.pdf", claim.claim_number)).body(
                    pdf.to_vec(),
                    ContentType::parse("application/pdf").unwrap_or(ContentType::TEXT_PLAIN),
                ),
            );
        }

        self.send(recipient.as_str(), &subject, body).await
    }

    /// Heads-up to the configured admin inbox about a new claim.
    ///
    /// # Errors
    ///
    /// Returns `EmailError` if the message cannot be built or sent.
    pub async fn send_admin_notification(
        &self,
        claim: &Claim,
        admin_email: &str,
    ) -> Result<EmailOutcome, EmailError> {
        let html = AdminNotificationTemplate {
            claim_number: claim.claim_number.to_string(),
            claim_type_label: claim.claim_type.label().to_string(),
            full_name: claim.full_name(),
            phone: claim.phone.clone(),
            detail: claim.detail.clone(),
            filed_at: claim.created_at.format("%d/%m/%Y %H:%M").to_string(),
        }
        .render()?;

        let subject = format!(
            "Nuevo {} registrado - {}",
            claim.claim_type.label(),
            claim.claim_number
        );
        let body = MultiPart::mixed().singlepart(SinglePart::html(html));

        self.send(admin_email, &subject, body).await
    }

    /// Written response from an admin, with any response attachments.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::NoRecipient` if the claim carries no email.
    pub async fn send_claim_response(
        &self,
        claim: &Claim,
        company: &CompanyInfo,
        message: &str,
        attachments: &[(String, String, Vec<u8>)],
    ) -> Result<EmailOutcome, EmailError> {
        let recipient = claim.email.as_ref().ok_or(EmailError::NoRecipient)?;

        let html = ClaimResponseTemplate {
            company_name: company.name.clone(),
            full_name: claim.full_name(),
            claim_number: claim.claim_number.to_string(),
            message: message.to_string(),
        }
        .render()?;

        let subject = format!(
            "Respuesta a su {} {}",
            claim.claim_type.label(),
            claim.claim_number
        );

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(html));
        for (filename, mime_type, bytes) in attachments {
            body = body.singlepart(Attachment::new(filename.clone()).body(
                bytes.clone(),
                ContentType::parse(mime_type).unwrap_or(ContentType::TEXT_PLAIN),
            ));
        }

        self.send(recipient.as_str(), &subject, body).await
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        body: MultiPart,
    ) -> Result<EmailOutcome, EmailError> {
        let Some(transport) = &self.transport else {
            tracing::debug!(to, subject, "Email disabled, skipping send");
            return Ok(EmailOutcome::Disabled);
        };

        let message = Message::builder()
            .from(transport.from.clone())
            .to(to.parse::<Mailbox>()?)
            .subject(subject)
            .multipart(body)?;

        transport.smtp.send(message).await?;
        tracing::info!(to, subject, "Email sent");
        Ok(EmailOutcome::Sent)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use libro_reclamaciones_core::{
        ClaimId, ClaimNumber, ClaimStatus, ClaimType, Currency, DocumentType, Email,
    };

    fn sample_claim(email: Option<&str>) -> Claim {
        Claim {
            id: ClaimId::new(1),
            claim_number: ClaimNumber::new(2026, 3),
            consumer_name: "Ana".to_string(),
            consumer_lastname_p: "Quispe".to_string(),
            consumer_lastname_m: None,
            document_type: DocumentType::Dni,
            document_number: "87654321".to_string(),
            phone: "912345678".to_string(),
            email: email.map(|e| Email::parse(e).unwrap()),
            address: None,
            department: None,
            province: None,
            district: None,
            is_minor: false,
            relationship_with_company: None,
            product_service_type: None,
            amount: None,
            currency: Currency::Pen,
            detail: "Servicio no prestado según lo acordado".to_string(),
            request: None,
            claim_type: ClaimType::Queja,
            reason: None,
            communication_medium: None,
            ip_address: None,
            user_agent: None,
            status: ClaimStatus::Pendiente,
            pdf_generated: false,
            pdf_path: None,
            pdf_remote_id: None,
            pdf_storage: None,
            email_sent: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_disabled_service_resolves_as_disabled() {
        let service = EmailService::disabled();
        let outcome = service
            .send_claim_confirmation(
                &sample_claim(Some("ana@example.com")),
                &CompanyInfo::default(),
                None,
            )
            .await
            .unwrap();
        assert_eq!(outcome, EmailOutcome::Disabled);
        assert!(!service.is_enabled());
    }

    #[tokio::test]
    async fn test_confirmation_requires_recipient() {
        let service = EmailService::disabled();
        let result = service
            .send_claim_confirmation(&sample_claim(None), &CompanyInfo::default(), None)
            .await;
        assert!(matches!(result, Err(EmailError::NoRecipient)));
    }

    #[tokio::test]
    async fn test_response_requires_recipient() {
        let service = EmailService::disabled();
        let result = service
            .send_claim_response(&sample_claim(None), &CompanyInfo::default(), "Hola", &[])
            .await;
        assert!(matches!(result, Err(EmailError::NoRecipient)));
    }
}
