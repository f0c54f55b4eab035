//! Dual-backend attachment storage.
//!
//! Stored objects live either on local disk or in a remote drive reached
//! over HTTP. The backend is picked per write: when a remote drive is
//! configured it is tried first and local disk is the fallback, so a drive
//! outage never loses an upload. Reads go to whichever backend the row
//! says holds the object, with no fallback.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use libro_reclamaciones_core::StorageKind;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use crate::config::DriveConfig;

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Local filesystem error.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error talking to the remote drive.
    #[error("drive transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote drive answered with an error.
    #[error("drive error: {0}")]
    Remote(String),

    /// No remote drive is configured.
    #[error("remote storage not configured")]
    Unavailable,

    /// The requested object does not exist.
    #[error("object not found")]
    NotFound,

    /// The path escapes the storage root.
    #[error("invalid storage path: {0}")]
    InvalidPath(String),
}

/// Where a stored object ended up.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub storage: StorageKind,
    /// Path relative to the local storage root (local backend only).
    pub path: Option<String>,
    /// Remote file ID (remote backend only).
    pub remote_file_id: Option<String>,
    /// Browser-viewable URL (remote backend only).
    pub remote_view_url: Option<String>,
}

/// One storage backend. Objects are grouped by namespace so everything
/// belonging to a claim is retrievable together.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Persist an object and report where it landed.
    async fn put(
        &self,
        namespace: &str,
        filename: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, StorageError>;
}

// =============================================================================
// Local disk backend
// =============================================================================

/// Local filesystem backend. Namespaces are subdirectories of the root.
#[derive(Debug, Clone)]
pub struct LocalDisk {
    root: PathBuf,
}

impl LocalDisk {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a stored relative path, rejecting anything that escapes the
    /// root.
    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let path = Path::new(relative);
        if path.is_absolute()
            || path
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(path))
    }

    /// Read a stored object back.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the file is missing.
    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(relative)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ObjectStore for LocalDisk {
    async fn put(
        &self,
        namespace: &str,
        filename: &str,
        _mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, StorageError> {
        let relative = format!("{namespace}/{filename}");
        let path = self.resolve(&relative)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        Ok(StoredObject {
            storage: StorageKind::Local,
            path: Some(relative),
            remote_file_id: None,
            remote_view_url: None,
        })
    }
}

// =============================================================================
// Remote drive backend
// =============================================================================

#[derive(Debug, Deserialize)]
struct DriveFolder {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    view_url: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

/// Token-authenticated HTTP drive backend.
#[derive(Clone)]
pub struct RemoteDrive {
    http: reqwest::Client,
    api_base: String,
    api_token: SecretString,
    root_folder: String,
}

impl RemoteDrive {
    #[must_use]
    pub fn new(http: reqwest::Client, config: &DriveConfig) -> Self {
        Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            root_folder: config.folder_id.clone(),
        }
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.bearer_auth(self.api_token.expose_secret())
    }

    /// Find or create the drive folder backing a namespace.
    async fn ensure_namespace(&self, namespace: &str) -> Result<String, StorageError> {
        let url = format!("{}/folders", self.api_base);
        let response = self
            .auth(self.http.post(&url))
            .json(&serde_json::json!({
                "name": namespace,
                "parent_id": self.root_folder,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Remote(format!(
                "folder create failed ({status}): {body}"
            )));
        }

        let folder: DriveFolder = response.json().await?;
        Ok(folder.id)
    }

    /// Ask the drive for a short-lived download URL.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the drive no longer has the file.
    pub async fn download_url(&self, file_id: &str) -> Result<String, StorageError> {
        let url = format!("{}/files/{file_id}", self.api_base);
        let response = self.auth(self.http.get(&url)).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound);
        }
        if !response.status().is_success() {
            return Err(StorageError::Remote(format!(
                "file lookup failed ({})",
                response.status()
            )));
        }

        let file: DriveFile = response.json().await?;
        file.download_url
            .ok_or_else(|| StorageError::Remote("file has no download url".to_string()))
    }

    /// Download a stored file's bytes through the drive API.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the drive no longer has the file.
    pub async fn fetch(&self, file_id: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.download_url(file_id).await?;
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(StorageError::Remote(format!(
                "file download failed ({})",
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ObjectStore for RemoteDrive {
    async fn put(
        &self,
        namespace: &str,
        filename: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, StorageError> {
        let folder_id = self.ensure_namespace(namespace).await?;

        let part = reqwest::multipart::Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| StorageError::Remote(format!("invalid mime type: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("folder_id", folder_id)
            .part("file", part);

        let url = format!("{}/files", self.api_base);
        let response = self.auth(self.http.post(&url)).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Remote(format!(
                "upload failed ({status}): {body}"
            )));
        }

        let file: DriveFile = response.json().await?;
        Ok(StoredObject {
            storage: StorageKind::Remote,
            path: None,
            remote_file_id: Some(file.id),
            remote_view_url: file.view_url,
        })
    }
}

// =============================================================================
// Facade
// =============================================================================

/// The attachment store used by the rest of the server.
///
/// Writes prefer the remote drive when configured and fall back to local
/// disk on any drive failure.
#[derive(Clone)]
pub struct AttachmentStore {
    local: LocalDisk,
    remote: Option<RemoteDrive>,
}

impl AttachmentStore {
    #[must_use]
    pub const fn new(local: LocalDisk, remote: Option<RemoteDrive>) -> Self {
        Self { local, remote }
    }

    /// Persist an object, remote-first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the local fallback also fails.
    pub async fn save(
        &self,
        namespace: &str,
        filename: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<StoredObject, StorageError> {
        if let Some(remote) = &self.remote {
            match remote.put(namespace, filename, mime_type, bytes).await {
                Ok(stored) => return Ok(stored),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        namespace,
                        filename,
                        "Remote drive upload failed, falling back to local disk"
                    );
                }
            }
        }
        self.local.put(namespace, filename, mime_type, bytes).await
    }

    /// Read a locally stored object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the file is missing.
    pub async fn read_local(&self, relative: &str) -> Result<Vec<u8>, StorageError> {
        self.local.read(relative).await
    }

    /// Resolve a download URL for a remotely stored object.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if no drive is configured.
    pub async fn remote_download_url(&self, file_id: &str) -> Result<String, StorageError> {
        let remote = self.remote.as_ref().ok_or(StorageError::Unavailable)?;
        remote.download_url(file_id).await
    }

    /// Fetch a remotely stored object's bytes.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` if no drive is configured.
    pub async fn fetch_remote(&self, file_id: &str) -> Result<Vec<u8>, StorageError> {
        let remote = self.remote.as_ref().ok_or(StorageError::Unavailable)?;
        remote.fetch(file_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_put_and_read() {
        let dir = std::env::temp_dir().join(format!("claims-test-{}", uuid::Uuid::new_v4()));
        let disk = LocalDisk::new(&dir);

        let stored = disk
            .put("2026-000001", "evidencia.pdf", "application/pdf", b"%PDF-1.4")
            .await
            .unwrap();
        assert_eq!(stored.storage, StorageKind::Local);
        let path = stored.path.unwrap();
        assert_eq!(path, "2026-000001/evidencia.pdf");

        let bytes = disk.read(&path).await.unwrap();
        assert_eq!(bytes, b"%PDF-1.4");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_local_read_missing_is_not_found() {
        let disk = LocalDisk::new(std::env::temp_dir().join("claims-test-missing"));
        assert!(matches!(
            disk.read("nope/nothing.pdf").await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_local_rejects_path_traversal() {
        let disk = LocalDisk::new(std::env::temp_dir());
        assert!(matches!(
            disk.read("../etc/passwd").await,
            Err(StorageError::InvalidPath(_))
        ));
        assert!(matches!(
            disk.read("/etc/passwd").await,
            Err(StorageError::InvalidPath(_))
        ));
    }

    #[tokio::test]
    async fn test_facade_without_remote_is_unavailable() {
        let store = AttachmentStore::new(
            LocalDisk::new(std::env::temp_dir().join("claims-test-facade")),
            None,
        );
        assert!(matches!(
            store.remote_download_url("abc").await,
            Err(StorageError::Unavailable)
        ));
    }
}
