//! Field validation for the public submission form and admin inputs.
//!
//! Validation runs before anything is persisted and collects every
//! problem, so the consumer can fix the whole form in one pass. Messages
//! are user-facing and in Spanish.

use libro_reclamaciones_core::{
    ClaimType, Currency, DocumentType, Email, ProductServiceType,
};

use crate::models::NewClaim;

/// Maximum number of files on a public submission.
pub const MAX_SUBMISSION_FILES: usize = 3;
/// Maximum number of files on an admin response.
pub const MAX_RESPONSE_FILES: usize = 5;
/// Upper bound on the disputed amount.
pub const MAX_AMOUNT: f64 = 999_999.99;
/// Maximum length of an admin response message.
pub const MAX_RESPONSE_MESSAGE: usize = 2000;

/// MIME types accepted for uploads.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Raw submission fields as received from the multipart form, before any
/// validation.
#[derive(Debug, Default, Clone)]
pub struct RawSubmission {
    pub consumer_name: Option<String>,
    pub consumer_lastname_p: Option<String>,
    pub consumer_lastname_m: Option<String>,
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub department: Option<String>,
    pub province: Option<String>,
    pub district: Option<String>,
    pub is_minor: Option<String>,
    pub relationship_with_company: Option<String>,
    pub product_service_type: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub detail: Option<String>,
    pub request: Option<String>,
    pub claim_type: Option<String>,
}

/// A file received with a submission or a response.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub original_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).map(str::trim).filter(|s| !s.is_empty())
}

fn check_required(
    errors: &mut Vec<String>,
    value: Option<&str>,
    label: &str,
    min: usize,
    max: usize,
) -> Option<String> {
    match value {
        None => {
            errors.push(format!("El campo {label} es requerido"));
            None
        }
        Some(s) if s.chars().count() < min || s.chars().count() > max => {
            errors.push(format!(
                "El campo {label} debe tener entre {min} y {max} caracteres"
            ));
            None
        }
        Some(s) => Some(s.to_string()),
    }
}

fn check_optional(
    errors: &mut Vec<String>,
    value: Option<&str>,
    label: &str,
    min: usize,
    max: usize,
) -> Option<String> {
    match value {
        None => None,
        Some(s) if s.chars().count() < min || s.chars().count() > max => {
            errors.push(format!(
                "El campo {label} debe tener entre {min} y {max} caracteres"
            ));
            None
        }
        Some(s) => Some(s.to_string()),
    }
}

fn is_valid_phone(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'))
}

fn is_valid_document_number(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Validate a raw submission into a [`NewClaim`].
///
/// # Errors
///
/// Returns every validation message at once when any field fails.
#[allow(clippy::too_many_lines)]
pub fn validate_submission(raw: &RawSubmission) -> Result<NewClaim, Vec<String>> {
    let mut errors = Vec::new();

    let consumer_name = check_required(
        &mut errors,
        non_empty(raw.consumer_name.as_ref()),
        "nombres",
        2,
        100,
    );
    let consumer_lastname_p = check_required(
        &mut errors,
        non_empty(raw.consumer_lastname_p.as_ref()),
        "apellido paterno",
        2,
        50,
    );
    let consumer_lastname_m = check_optional(
        &mut errors,
        non_empty(raw.consumer_lastname_m.as_ref()),
        "apellido materno",
        1,
        50,
    );

    let document_type = match non_empty(raw.document_type.as_ref()) {
        None => Some(DocumentType::Dni),
        Some(s) => match s.parse::<DocumentType>() {
            Ok(t) => Some(t),
            Err(_) => {
                errors.push("El tipo de documento debe ser DNI, CE o PASAPORTE".to_string());
                None
            }
        },
    };

    let document_number = check_required(
        &mut errors,
        non_empty(raw.document_number.as_ref()),
        "número de documento",
        8,
        20,
    )
    .filter(|s| {
        if is_valid_document_number(s) {
            true
        } else {
            errors.push("El número de documento contiene caracteres inválidos".to_string());
            false
        }
    });

    let phone = check_required(
        &mut errors,
        non_empty(raw.phone.as_ref()),
        "teléfono",
        7,
        15,
    )
    .filter(|s| {
        if is_valid_phone(s) {
            true
        } else {
            errors.push("El teléfono contiene caracteres inválidos".to_string());
            false
        }
    });

    let email = match non_empty(raw.email.as_ref()) {
        None => None,
        Some(s) => match Email::parse(s) {
            Ok(email) => Some(email),
            Err(_) => {
                errors.push("El email no es válido".to_string());
                None
            }
        },
    };

    let address = check_optional(
        &mut errors,
        non_empty(raw.address.as_ref()),
        "dirección",
        5,
        200,
    );
    let department = check_optional(
        &mut errors,
        non_empty(raw.department.as_ref()),
        "departamento",
        2,
        50,
    );
    let province = check_optional(
        &mut errors,
        non_empty(raw.province.as_ref()),
        "provincia",
        2,
        50,
    );
    let district = check_optional(
        &mut errors,
        non_empty(raw.district.as_ref()),
        "distrito",
        2,
        50,
    );

    let is_minor = matches!(
        non_empty(raw.is_minor.as_ref()),
        Some("true" | "1" | "si" | "sí")
    );

    let relationship_with_company = check_optional(
        &mut errors,
        non_empty(raw.relationship_with_company.as_ref()),
        "relación con la empresa",
        2,
        100,
    );

    let product_service_type = match non_empty(raw.product_service_type.as_ref()) {
        None => None,
        Some(s) => match s.parse::<ProductServiceType>() {
            Ok(t) => Some(t),
            Err(_) => {
                errors.push("El tipo debe ser producto o servicio".to_string());
                None
            }
        },
    };

    let amount = match non_empty(raw.amount.as_ref()) {
        None => None,
        Some(s) => match s.parse::<f64>() {
            Ok(v) if v.is_finite() && (0.0..=MAX_AMOUNT).contains(&v) => Some(v),
            _ => {
                errors.push(format!(
                    "El monto debe ser un número entre 0 y {MAX_AMOUNT}"
                ));
                None
            }
        },
    };

    let currency = match non_empty(raw.currency.as_ref()) {
        None => Currency::Pen,
        Some(s) => s.parse::<Currency>().unwrap_or_else(|_| {
            errors.push("La moneda debe ser PEN o USD".to_string());
            Currency::Pen
        }),
    };

    let detail = check_required(
        &mut errors,
        non_empty(raw.detail.as_ref()),
        "detalle",
        10,
        2000,
    );
    let request = check_optional(
        &mut errors,
        non_empty(raw.request.as_ref()),
        "pedido",
        10,
        1000,
    );

    let claim_type = match non_empty(raw.claim_type.as_ref()) {
        None => {
            errors.push("El tipo de reclamo es requerido".to_string());
            None
        }
        Some(s) => match s.parse::<ClaimType>() {
            Ok(t) => Some(t),
            Err(_) => {
                errors.push("El tipo de reclamo debe ser reclamo o queja".to_string());
                None
            }
        },
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    // All required fields are present once errors is empty
    match (
        consumer_name,
        consumer_lastname_p,
        document_type,
        document_number,
        phone,
        detail,
        claim_type,
    ) {
        (
            Some(consumer_name),
            Some(consumer_lastname_p),
            Some(document_type),
            Some(document_number),
            Some(phone),
            Some(detail),
            Some(claim_type),
        ) => Ok(NewClaim {
            consumer_name,
            consumer_lastname_p,
            consumer_lastname_m,
            document_type,
            document_number,
            phone,
            email,
            address,
            department,
            province,
            district,
            is_minor,
            relationship_with_company,
            product_service_type,
            amount,
            currency,
            detail,
            request,
            claim_type,
            communication_medium: None,
            ip_address: None,
            user_agent: None,
        }),
        _ => Err(vec!["Datos incompletos".to_string()]),
    }
}

/// Validate uploaded files against the count, size, and MIME allowlist.
///
/// The per-file ceiling comes from configuration; submissions and admin
/// responses carry different limits.
///
/// # Errors
///
/// Returns one message per offending file (or the count violation).
pub fn validate_files(
    files: &[UploadedFile],
    max_files: usize,
    max_bytes: usize,
) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if files.len() > max_files {
        errors.push(format!("Se permiten como máximo {max_files} archivos"));
    }

    for file in files {
        if !ALLOWED_MIME_TYPES.contains(&file.mime_type.as_str()) {
            errors.push(format!(
                "El archivo {} tiene un tipo no permitido ({})",
                file.original_name, file.mime_type
            ));
        }
        if file.bytes.len() > max_bytes {
            errors.push(format!(
                "El archivo {} supera el tamaño máximo de {} MB",
                file.original_name,
                max_bytes / (1024 * 1024)
            ));
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Keep only characters safe for a stored filename.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "archivo".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid_raw() -> RawSubmission {
        RawSubmission {
            consumer_name: Some("Juan".to_string()),
            consumer_lastname_p: Some("Pérez".to_string()),
            consumer_lastname_m: Some("García".to_string()),
            document_number: Some("12345678".to_string()),
            phone: Some("987654321".to_string()),
            claim_type: Some("reclamo".to_string()),
            detail: Some("Producto defectuoso, mínimo diez caracteres".to_string()),
            ..RawSubmission::default()
        }
    }

    #[test]
    fn test_minimal_valid_submission() {
        let claim = validate_submission(&valid_raw()).unwrap();
        assert_eq!(claim.consumer_name, "Juan");
        assert_eq!(claim.document_type, DocumentType::Dni);
        assert_eq!(claim.currency, Currency::Pen);
        assert!(claim.email.is_none());
        assert!(claim.amount.is_none());
    }

    #[test]
    fn test_missing_required_fields_collects_all_errors() {
        let raw = RawSubmission::default();
        let errors = validate_submission(&raw).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("nombres")));
        assert!(errors.iter().any(|e| e.contains("teléfono")));
        assert!(errors.iter().any(|e| e.contains("detalle")));
        assert!(errors.iter().any(|e| e.contains("tipo de reclamo")));
    }

    #[test]
    fn test_detail_too_short() {
        let mut raw = valid_raw();
        raw.detail = Some("corto".to_string());
        let errors = validate_submission(&raw).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("detalle")));
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut raw = valid_raw();
        raw.email = Some("not-an-email".to_string());
        let errors = validate_submission(&raw).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("email")));
    }

    #[test]
    fn test_amount_bounds() {
        let mut raw = valid_raw();
        raw.amount = Some("1500.50".to_string());
        assert_eq!(validate_submission(&raw).unwrap().amount, Some(1500.50));

        raw.amount = Some("-1".to_string());
        assert!(validate_submission(&raw).is_err());

        raw.amount = Some("1000000".to_string());
        assert!(validate_submission(&raw).is_err());

        raw.amount = Some("NaN".to_string());
        assert!(validate_submission(&raw).is_err());
    }

    #[test]
    fn test_phone_pattern() {
        let mut raw = valid_raw();
        raw.phone = Some("+51 987-654".to_string());
        assert!(validate_submission(&raw).is_ok());

        raw.phone = Some("abc1234".to_string());
        assert!(validate_submission(&raw).is_err());
    }

    const TEST_MAX_BYTES: usize = 1024 * 1024;

    #[test]
    fn test_file_count_limit() {
        let file = UploadedFile {
            original_name: "a.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0; 10],
        };
        let four = vec![file.clone(), file.clone(), file.clone(), file];
        let errors = validate_files(&four, MAX_SUBMISSION_FILES, TEST_MAX_BYTES).unwrap_err();
        assert!(errors[0].contains("máximo 3"));
    }

    #[test]
    fn test_file_mime_allowlist() {
        let file = UploadedFile {
            original_name: "run.exe".to_string(),
            mime_type: "application/x-msdownload".to_string(),
            bytes: vec![0; 10],
        };
        let errors = validate_files(&[file], MAX_SUBMISSION_FILES, TEST_MAX_BYTES).unwrap_err();
        assert!(errors[0].contains("tipo no permitido"));
    }

    #[test]
    fn test_file_mime_allowlist_excludes_gif() {
        let file = UploadedFile {
            original_name: "anim.gif".to_string(),
            mime_type: "image/gif".to_string(),
            bytes: vec![0; 10],
        };
        let errors = validate_files(&[file], MAX_SUBMISSION_FILES, TEST_MAX_BYTES).unwrap_err();
        assert!(errors[0].contains("tipo no permitido"));
    }

    #[test]
    fn test_file_size_limit_is_configurable() {
        let file = UploadedFile {
            original_name: "big.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0; TEST_MAX_BYTES + 1],
        };
        let errors =
            validate_files(std::slice::from_ref(&file), MAX_SUBMISSION_FILES, TEST_MAX_BYTES)
                .unwrap_err();
        assert!(errors[0].contains("tamaño máximo de 1 MB"));

        // The same file passes under a larger configured ceiling
        assert!(validate_files(&[file], MAX_SUBMISSION_FILES, 2 * TEST_MAX_BYTES).is_ok());
    }

    #[test]
    fn test_default_limit_accepts_large_pdf() {
        let file = UploadedFile {
            original_name: "informe.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            bytes: vec![0; 10 * 1024 * 1024],
        };
        let result = validate_files(
            &[file],
            MAX_SUBMISSION_FILES,
            crate::config::DEFAULT_MAX_FILE_SIZE,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("mi foto (1).png"), "mi_foto__1_.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename(""), "archivo");
    }
}
