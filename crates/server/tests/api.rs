//! End-to-end API tests against an in-memory database.
//!
//! Email is disabled and the PDF renderer points at a binary that does
//! not exist, so submissions exercise the degraded paths: the claim is
//! still filed and numbered even when the receipt or the confirmation
//! email cannot be produced.

#![allow(clippy::unwrap_used)]

use std::path::PathBuf;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::{Datelike, Utc};
use http_body_util::BodyExt;
use libro_reclamaciones_core::{AdminRole, Email};
use libro_reclamaciones_server::config::{Environment, PdfConfig, ServerConfig};
use libro_reclamaciones_server::db::{self, AdminUserRepository};
use libro_reclamaciones_server::middleware::auth::issue_token;
use libro_reclamaciones_server::models::AdminUser;
use libro_reclamaciones_server::routes::router;
use libro_reclamaciones_server::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

const JWT_SECRET: &str = "tG5#kW8$pR2@nM9!vX4&qZ7*jC3^bL6d";
const BOUNDARY: &str = "xYzTestFormBoundary7318";

// =============================================================================
// Harness
// =============================================================================

fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        base_url: "http://localhost:3000".to_string(),
        environment: Environment::Development,
        jwt_secret: SecretString::from(JWT_SECRET),
        upload_dir,
        max_file_size: 50 * 1024 * 1024,
        max_response_file_size: 10 * 1024 * 1024,
        pdf: PdfConfig {
            chromium_path: PathBuf::from("/nonexistent/chromium"),
            timeout: Duration::from_secs(5),
        },
        email: None,
        admin_email: None,
        drive: None,
        company_cache_ttl: Duration::from_secs(600),
    }
}

/// A router over a fresh in-memory database. One connection so every
/// query sees the same store.
async fn test_app() -> (Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();

    let upload_dir = std::env::temp_dir().join(format!("claims-test-{}", uuid::Uuid::new_v4()));
    let state = AppState::new(pool.clone(), test_config(upload_dir)).unwrap();
    (router(state), pool)
}

async fn seed_admin(pool: &SqlitePool, username: &str, password: &str, role: AdminRole) -> AdminUser {
    // Low bcrypt cost to keep the suite fast
    let hash = bcrypt::hash(password, 4).unwrap();
    let email = Email::parse(&format!("{username}@example.com")).unwrap();
    let repo = AdminUserRepository::new(pool);
    let id = repo
        .create(username, &email, &hash, None, role)
        .await
        .unwrap();
    repo.get_by_id(id).await.unwrap().unwrap()
}

fn token_for(user: &AdminUser) -> String {
    issue_token(&SecretString::from(JWT_SECRET), user).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

// =============================================================================
// Multipart form construction
// =============================================================================

#[derive(Default)]
struct FormData {
    body: Vec<u8>,
}

impl FormData {
    fn new() -> Self {
        Self::default()
    }

    fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    fn file(mut self, name: &str, filename: &str, mime: &str, content: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; \
                 filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn request(mut self, method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        let mut builder = Request::builder().method(method).uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}

/// A form with every required field filled in.
fn valid_claim_form() -> FormData {
    FormData::new()
        .text("consumer_name", "María")
        .text("consumer_lastname_p", "Quispe")
        .text("document_number", "12345678")
        .text("phone", "987654321")
        .text("detail", "El producto llegó dañado y nadie responde mis llamadas.")
        .text("claim_type", "reclamo")
}

async fn submit_claim(app: &Router, form: FormData) -> (StatusCode, Value) {
    send(app, form.request("POST", "/claims", None)).await
}

// =============================================================================
// Public surface
// =============================================================================

#[tokio::test]
async fn health_responds_ok() {
    let (app, _pool) = test_app().await;
    let (status, body) = send(&app, get_request("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn submit_minimal_claim_is_filed() {
    let (app, _pool) = test_app().await;
    let (status, body) = submit_claim(&app, valid_claim_form()).await;

    assert_eq!(status, StatusCode::CREATED);
    let number = body["claim_number"].as_str().unwrap();
    let year = Utc::now().year();
    assert_eq!(number, format!("{year}-000001"));
    // No email on the form, so no confirmation was attempted
    assert_eq!(body["email_sent"], false);

    let id = body["id"].as_i64().unwrap();
    assert_eq!(body["pdf_url"], format!("/claims/{id}/pdf"));

    let (status, public) = send(&app, get_request(&format!("/claims/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["claim_number"], number);
    assert_eq!(public["status"], "pendiente");
    assert_eq!(public["claim_type"], "reclamo");
    // Renderer binary does not exist in the test environment
    assert_eq!(public["pdf_generated"], false);

    let (status, body) = send(&app, get_request(&format!("/claims/{id}/pdf"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "El PDF aún no está disponible");
}

#[tokio::test]
async fn submit_with_email_resolves_confirmation() {
    let (app, _pool) = test_app().await;
    let form = valid_claim_form().text("email", "maria@example.com");
    let (status, body) = submit_claim(&app, form).await;

    assert_eq!(status, StatusCode::CREATED);
    // Email delivery is disabled but resolves cleanly, so the claim is
    // marked as notified
    assert_eq!(body["email_sent"], true);
}

#[tokio::test]
async fn submit_collects_all_validation_errors() {
    let (app, _pool) = test_app().await;
    let form = FormData::new()
        .text("consumer_name", "M")
        .text("phone", "abc");
    let (status, body) = submit_claim(&app, form).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Datos inválidos");
    let details = body["details"].as_array().unwrap();
    // Short name, bad phone, plus the missing required fields
    assert!(details.len() >= 4, "expected several errors, got {details:?}");
}

#[tokio::test]
async fn submit_rejects_fourth_attachment() {
    let (app, _pool) = test_app().await;
    let mut form = valid_claim_form();
    for i in 0..4 {
        form = form.file(
            "files",
            &format!("foto_{i}.jpg"),
            "image/jpeg",
            b"not-really-a-jpeg",
        );
    }
    let (status, body) = submit_claim(&app, form).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Datos inválidos");
}

#[tokio::test]
async fn submit_rejects_disallowed_file_type() {
    let (app, _pool) = test_app().await;
    let form = valid_claim_form().file(
        "files",
        "virus.exe",
        "application/x-msdownload",
        b"MZ\x90\x00",
    );
    let (status, _body) = submit_claim(&app, form).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn submit_stores_attachments() {
    let (app, pool) = test_app().await;
    let form = valid_claim_form()
        .file("files", "boleta.pdf", "application/pdf", b"%PDF-1.4 fake")
        .file("files", "evidencia.png", "image/png", b"\x89PNG fake");
    let (status, body) = submit_claim(&app, form).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);
    let (status, detail) = send(
        &app,
        get_request(&format!("/admin/claims/{id}"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let files = detail["files"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["original_name"], "boleta.pdf");
    assert!(
        files[0]["download_url"]
            .as_str()
            .unwrap()
            .starts_with("/admin/files/")
    );
}

#[tokio::test]
async fn claim_numbers_increment_within_year() {
    let (app, _pool) = test_app().await;
    let year = Utc::now().year();
    for seq in 1..=3 {
        let (status, body) = submit_claim(&app, valid_claim_form()).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            body["claim_number"],
            format!("{year}-{seq:06}"),
            "claim {seq} got the wrong number"
        );
    }
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn login_accepts_valid_credentials_only() {
    let (app, pool) = test_app().await;
    seed_admin(&pool, "carlos", "correct-horse-battery", AdminRole::Admin).await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/admin/login",
            &json!({ "username": "carlos", "password": "correct-horse-battery" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(body["csrfToken"].as_str().unwrap().len(), 64);
    assert_eq!(body["user"]["username"], "carlos");
    assert!(body["user"].get("password_hash").is_none());

    let (status, profile) = send(&app, get_request("/admin/profile", Some(token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "carlos");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/admin/login",
            &json!({ "username": "carlos", "password": "wrong" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Credenciales inválidas");
}

#[tokio::test]
async fn admin_routes_require_a_token() {
    let (app, _pool) = test_app().await;

    let (status, body) = send(&app, get_request("/admin/claims", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token de acceso requerido");

    let (status, body) = send(&app, get_request("/admin/claims", Some("not.a.token"))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Token inválido o expirado");
}

#[tokio::test]
async fn viewer_can_read_but_not_mutate() {
    let (app, pool) = test_app().await;
    let viewer = seed_admin(&pool, "lectora", "viewer-pass-123", AdminRole::Viewer).await;
    let token = token_for(&viewer);

    let (status, _body) = send(&app, get_request("/admin/claims", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    let (_status, created) = submit_claim(&app, valid_claim_form()).await;
    let id = created["id"].as_i64().unwrap();
    let (status, body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/admin/claims/{id}/status"),
            &json!({ "status": "en_revision" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Permisos insuficientes para esta operación");
}

// =============================================================================
// Triage
// =============================================================================

#[tokio::test]
async fn status_change_is_audited() {
    let (app, pool) = test_app().await;
    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);

    let (_status, created) = submit_claim(&app, valid_claim_form()).await;
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/admin/claims/{id}/status"),
            &json!({ "status": "en_revision", "notes": "Derivado a legal" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "en_revision");

    let (_status, detail) = send(
        &app,
        get_request(&format!("/admin/claims/{id}"), Some(&token)),
    )
    .await;
    let audit = detail["audit_log"].as_array().unwrap();
    // Newest first: the status change on top, the filing below it
    assert_eq!(audit.len(), 2);
    assert_eq!(audit[0]["action"], "status_changed");
    assert_eq!(audit[0]["username"], "ana");
    assert_eq!(audit[0]["details"]["new_status"], "en_revision");
    assert_eq!(audit[1]["action"], "created");
}

#[tokio::test]
async fn status_change_rejects_unknown_status() {
    let (app, pool) = test_app().await;
    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);

    let (_status, created) = submit_claim(&app, valid_claim_form()).await;
    let id = created["id"].as_i64().unwrap();

    let (status, _body) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/admin/claims/{id}/status"),
            &json!({ "status": "archivado" }),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_paginates_and_filters() {
    let (app, pool) = test_app().await;
    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);

    for _ in 0..12 {
        let (status, _body) = submit_claim(&app, valid_claim_form()).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        get_request("/admin/claims?limit=5&page=2", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claims"].as_array().unwrap().len(), 5);
    let pagination = &body["pagination"];
    assert_eq!(pagination["current_page"], 2);
    assert_eq!(pagination["total_items"], 12);
    assert_eq!(pagination["total_pages"], 3);
    assert_eq!(pagination["has_next"], true);
    assert_eq!(pagination["has_prev"], true);

    // Nothing has been moved out of pendiente yet
    let (status, body) = send(
        &app,
        get_request("/admin/claims?status=respondido", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total_items"], 0);
}

#[tokio::test]
async fn listing_searches_by_maternal_surname() {
    let (app, pool) = test_app().await;
    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);

    submit_claim(&app, valid_claim_form()).await;
    let form = valid_claim_form().text("consumer_lastname_m", "Mendizábal");
    let (status, _body) = submit_claim(&app, form).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        get_request("/admin/claims?search=Mendiz%C3%A1bal", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let claims = body["claims"].as_array().unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0]["consumer_lastname_m"], "Mendizábal");
}

#[tokio::test]
async fn respond_requires_consumer_email() {
    let (app, pool) = test_app().await;
    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);

    let (_status, created) = submit_claim(&app, valid_claim_form()).await;
    let id = created["id"].as_i64().unwrap();

    let form = FormData::new().text("message", "Lamentamos el inconveniente.");
    let (status, body) = send(
        &app,
        form.request("POST", &format!("/admin/claims/{id}/respond"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "El reclamo no tiene un email registrado");
}

#[tokio::test]
async fn respond_moves_claim_to_respondido() {
    let (app, pool) = test_app().await;
    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);

    let form = valid_claim_form().text("email", "maria@example.com");
    let (_status, created) = submit_claim(&app, form).await;
    let id = created["id"].as_i64().unwrap();

    let form = FormData::new()
        .text("message", "Hemos procesado la devolución de su compra.")
        .file("files", "nota_credito.pdf", "application/pdf", b"%PDF fake");
    let (status, body) = send(
        &app,
        form.request("POST", &format!("/admin/claims/{id}/respond"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Respuesta enviada");

    let (_status, detail) = send(
        &app,
        get_request(&format!("/admin/claims/{id}"), Some(&token)),
    )
    .await;
    assert_eq!(detail["claim"]["status"], "respondido");
    let audit = detail["audit_log"].as_array().unwrap();
    assert_eq!(audit[0]["action"], "email_response_sent");
    assert_eq!(audit[0]["details"]["attachments"], 1);
}

#[tokio::test]
async fn respond_rejects_empty_message() {
    let (app, pool) = test_app().await;
    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);

    let form = valid_claim_form().text("email", "maria@example.com");
    let (_status, created) = submit_claim(&app, form).await;
    let id = created["id"].as_i64().unwrap();

    let form = FormData::new().text("message", "   ");
    let (status, _body) = send(
        &app,
        form.request("POST", &format!("/admin/claims/{id}/respond"), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Export and dashboard
// =============================================================================

#[tokio::test]
async fn csv_export_streams_all_claims() {
    let (app, pool) = test_app().await;
    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);

    submit_claim(&app, valid_claim_form()).await;
    submit_claim(&app, valid_claim_form().text("claim_type", "queja")).await;

    let response = app
        .clone()
        .oneshot(get_request("/admin/claims/export/csv", Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv")
    );
    assert!(
        response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .contains("reclamos_")
    );

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.starts_with("Número de Reclamo"));
    // Header plus one line per claim
    assert_eq!(text.lines().count(), 3);
}

#[tokio::test]
async fn dashboard_counts_by_status_and_type() {
    let (app, pool) = test_app().await;
    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);

    submit_claim(&app, valid_claim_form()).await;
    submit_claim(&app, valid_claim_form()).await;
    submit_claim(&app, valid_claim_form().text("claim_type", "queja")).await;

    let (status, stats) = send(&app, get_request("/admin/dashboard/stats", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 3);
    assert_eq!(stats["pendiente"], 3);
    assert_eq!(stats["respondido"], 0);
    assert_eq!(stats["reclamos"], 2);
    assert_eq!(stats["quejas"], 1);
    assert_eq!(stats["today"], 3);
    assert!(stats["monthly_trend"].is_array());
}

// =============================================================================
// Company info
// =============================================================================

#[tokio::test]
async fn company_info_defaults_until_configured() {
    let (app, pool) = test_app().await;

    let (status, body) = send(&app, get_request("/company-info", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Mi Empresa");

    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);
    let form = FormData::new()
        .text("name", "Panadería San José S.A.C.")
        .text("ruc", "20123456789")
        .text("address", "Av. Los Olivos 123, Lima");
    let (status, updated) = send(
        &app,
        form.request("PUT", "/company-info", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Panadería San José S.A.C.");
    assert_eq!(updated["ruc"], "20123456789");

    // Cache was invalidated by the update
    let (_status, body) = send(&app, get_request("/company-info", None)).await;
    assert_eq!(body["name"], "Panadería San José S.A.C.");
}

#[tokio::test]
async fn company_info_rejects_malformed_ruc() {
    let (app, pool) = test_app().await;
    let admin = seed_admin(&pool, "ana", "s3cure-pass", AdminRole::Admin).await;
    let token = token_for(&admin);

    let form = FormData::new().text("name", "Empresa").text("ruc", "123");
    let (status, _body) = send(
        &app,
        form.request("PUT", "/company-info", Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
