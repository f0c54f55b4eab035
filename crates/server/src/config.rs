//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `DATABASE_URL` - `SQLite` connection string (default: sqlite://data/claims.db?mode=rwc)
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `BASE_URL` - Public URL of the API (default: http://localhost:3000)
//! - `APP_ENV` - `development` or `production` (default: development)
//! - `UPLOAD_DIR` - Root directory for local file storage (default: uploads)
//! - `MAX_FILE_SIZE` - Per-file upload ceiling in bytes for public submissions (default: 50 MB)
//! - `MAX_RESPONSE_FILE_SIZE` - Per-file ceiling in bytes for admin response attachments (default: 10 MB)
//! - `CHROMIUM_PATH` - Headless browser binary for PDF rendering (default: /usr/bin/chromium-browser)
//! - `PDF_TIMEOUT_SECS` - Render timeout in seconds (default: 30)
//! - `COMPANY_CACHE_TTL_SECS` - Company info cache TTL (default: 600)
//! - `ADMIN_EMAIL` - Recipient for new-claim notifications
//!
//! ## Optional (SMTP - enables outgoing email)
//! - `EMAIL_USER` - SMTP authentication username
//! - `EMAIL_PASS` - SMTP authentication password
//! - `SMTP_HOST` - SMTP server hostname (default: smtp.gmail.com)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `EMAIL_FROM` - Sender address (default: `EMAIL_USER`)
//!
//! ## Optional (remote drive - enables remote attachment storage)
//! - `DRIVE_API_BASE` - Base URL of the drive HTTP API
//! - `DRIVE_API_TOKEN` - Bearer token for the drive API
//! - `DRIVE_FOLDER_ID` - Root folder that claim namespaces are created under

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Default per-file upload ceiling for public submissions.
pub const DEFAULT_MAX_FILE_SIZE: usize = 50 * 1024 * 1024;
/// Default per-file ceiling for admin response attachments.
pub const DEFAULT_MAX_RESPONSE_FILE_SIZE: usize = 10 * 1024 * 1024;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Deployment environment. Controls how much detail error responses carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `SQLite` connection string
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the API
    pub base_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// Token signing secret
    pub jwt_secret: SecretString,
    /// Root directory for local file storage
    pub upload_dir: PathBuf,
    /// Per-file size ceiling for public submission uploads, in bytes
    pub max_file_size: usize,
    /// Per-file size ceiling for admin response attachments, in bytes
    pub max_response_file_size: usize,
    /// PDF rendering configuration
    pub pdf: PdfConfig,
    /// SMTP configuration (None disables outgoing email)
    pub email: Option<EmailConfig>,
    /// Recipient for new-claim notifications
    pub admin_email: Option<String>,
    /// Remote drive configuration (None keeps all storage local)
    pub drive: Option<DriveConfig>,
    /// TTL for the cached company info singleton
    pub company_cache_ttl: Duration,
}

/// Headless-browser PDF rendering configuration.
#[derive(Debug, Clone)]
pub struct PdfConfig {
    /// Path to the chromium binary
    pub chromium_path: PathBuf,
    /// Hard timeout for one render
    pub timeout: Duration,
}

/// Email (SMTP) configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP server hostname
    pub smtp_host: String,
    /// SMTP server port
    pub smtp_port: u16,
    /// SMTP authentication username
    pub smtp_username: String,
    /// SMTP authentication password
    pub smtp_password: SecretString,
    /// Email sender address (From header)
    pub from_address: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// Remote drive API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct DriveConfig {
    /// Base URL of the drive HTTP API
    pub api_base: String,
    /// Bearer token for the drive API
    pub api_token: SecretString,
    /// Root folder that claim namespaces are created under
    pub folder_id: String,
}

impl std::fmt::Debug for DriveConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveConfig")
            .field("api_base", &self.api_base)
            .field("api_token", &"[REDACTED]")
            .field("folder_id", &self.folder_id)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_env_or_default(
            "DATABASE_URL",
            "sqlite://data/claims.db?mode=rwc",
        ));
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;
        let base_url = get_env_or_default("BASE_URL", "http://localhost:3000");
        let environment = match get_env_or_default("APP_ENV", "development").as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };

        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "JWT_SECRET")?;

        let upload_dir = PathBuf::from(get_env_or_default("UPLOAD_DIR", "uploads"));
        let max_file_size = get_parsed_env("MAX_FILE_SIZE", DEFAULT_MAX_FILE_SIZE)?;
        let max_response_file_size =
            get_parsed_env("MAX_RESPONSE_FILE_SIZE", DEFAULT_MAX_RESPONSE_FILE_SIZE)?;
        let pdf = PdfConfig::from_env()?;
        let email = EmailConfig::from_env()?;
        let admin_email = get_optional_env("ADMIN_EMAIL");
        let drive = DriveConfig::from_env()?;
        let company_cache_ttl = Duration::from_secs(
            get_env_or_default("COMPANY_CACHE_TTL_SECS", "600")
                .parse::<u64>()
                .map_err(|e| {
                    ConfigError::InvalidEnvVar("COMPANY_CACHE_TTL_SECS".to_string(), e.to_string())
                })?,
        );

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            environment,
            jwt_secret,
            upload_dir,
            max_file_size,
            max_response_file_size,
            pdf,
            email,
            admin_email,
            drive,
            company_cache_ttl,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl PdfConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = get_env_or_default("PDF_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("PDF_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        Ok(Self {
            chromium_path: PathBuf::from(get_env_or_default(
                "CHROMIUM_PATH",
                "/usr/bin/chromium-browser",
            )),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl EmailConfig {
    /// Load SMTP configuration from environment.
    ///
    /// Returns `None` if `EMAIL_USER`/`EMAIL_PASS` are not set, which
    /// disables outgoing email entirely.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let username = get_optional_env("EMAIL_USER");
        let password = get_optional_env("EMAIL_PASS");

        match (username, password) {
            (Some(username), Some(password)) => {
                let smtp_port = get_env_or_default("SMTP_PORT", "587")
                    .parse::<u16>()
                    .map_err(|e| {
                        ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string())
                    })?;
                let from_address = get_env_or_default("EMAIL_FROM", &username);

                Ok(Some(Self {
                    smtp_host: get_env_or_default("SMTP_HOST", "smtp.gmail.com"),
                    smtp_port,
                    smtp_username: username,
                    smtp_password: SecretString::from(password),
                    from_address,
                }))
            }
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "EMAIL_*".to_string(),
                "Both EMAIL_USER and EMAIL_PASS must be set together".to_string(),
            )),
        }
    }
}

impl DriveConfig {
    /// Load remote drive configuration from environment.
    ///
    /// Returns `None` if the drive variables are not set, which keeps all
    /// attachment storage on local disk.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let api_base = get_optional_env("DRIVE_API_BASE");
        let api_token = get_optional_env("DRIVE_API_TOKEN");
        let folder_id = get_optional_env("DRIVE_FOLDER_ID");

        match (api_base, api_token, folder_id) {
            (Some(api_base), Some(api_token), Some(folder_id)) => {
                if let Err(e) = validate_secret_strength(&api_token, "DRIVE_API_TOKEN") {
                    tracing::warn!("DRIVE_API_TOKEN validation warning: {e}");
                }
                Ok(Some(Self {
                    api_base,
                    api_token: SecretString::from(api_token),
                    folder_id,
                }))
            }
            (None, None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "DRIVE_*".to_string(),
                "DRIVE_API_BASE, DRIVE_API_TOKEN and DRIVE_FOLDER_ID must be set together"
                    .to_string(),
            )),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Get an environment variable parsed into `T`, falling back to a default
/// when the variable is absent.
fn get_parsed_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        // All same character = 0 entropy
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        // Random-looking string should have high entropy
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-jwt-key-here", "TEST_VAR");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        // High-entropy random string
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_secret_length_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_secret_length(&secret, "TEST_JWT").is_err());
    }

    #[test]
    fn test_validate_secret_length_valid() {
        let secret = SecretString::from("a".repeat(32));
        assert!(validate_secret_length(&secret, "TEST_JWT").is_ok());
    }

    #[test]
    fn test_environment_is_production() {
        assert!(Environment::Production.is_production());
        assert!(!Environment::Development.is_production());
    }
}
