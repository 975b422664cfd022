//! Publishing targets for audit documents.
//!
//! # Responsibilities
//! - Upload JSON to a content-addressed pinning service
//! - Write one local backup file per document version
//!
//! Backups are never overwritten: each version gets a fresh file name and is
//! opened with `create_new`.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::blockchain::types::{LedgerError, LedgerResult};
use crate::config::AuditConfig;

/// Environment variable holding the pinning service token.
pub const STORAGE_JWT_ENV_VAR: &str = "LEDGER_STORAGE_JWT";

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Where an uploaded document can be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub content_hash: String,
    pub url: String,
}

/// Content-addressed document store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn put_json(&self, name: &str, document: &Value) -> LedgerResult<StoredObject>;
}

/// Pinata `pinJSONToIPFS` client.
pub struct PinataStore {
    client: reqwest::Client,
    api_url: String,
    gateway_url: String,
    jwt: String,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

impl PinataStore {
    pub fn new(config: &AuditConfig, jwt: impl Into<String>) -> LedgerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|e| LedgerError::Storage(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: config.storage_api_url.clone(),
            gateway_url: config.gateway_url.trim_end_matches('/').to_string(),
            jwt: jwt.into(),
        })
    }

    /// Build from configuration and `LEDGER_STORAGE_JWT`; `None` when uploads are off or no token is set.
    pub fn from_env(config: &AuditConfig) -> Option<Self> {
        if !config.upload_enabled {
            return None;
        }
        let jwt = match std::env::var(STORAGE_JWT_ENV_VAR) {
            Ok(jwt) if !jwt.trim().is_empty() => jwt,
            _ => {
                tracing::warn!(
                    "{} not set; audit documents will only be backed up locally",
                    STORAGE_JWT_ENV_VAR
                );
                return None;
            }
        };
        match Self::new(config, jwt.trim()) {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::error!(error = %e, "Content store disabled");
                None
            }
        }
    }
}

impl std::fmt::Debug for PinataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinataStore")
            .field("api_url", &self.api_url)
            .field("gateway_url", &self.gateway_url)
            .finish()
    }
}

#[async_trait]
impl ContentStore for PinataStore {
    async fn put_json(&self, name: &str, document: &Value) -> LedgerResult<StoredObject> {
        let body = json!({
            "pinataContent": document,
            "pinataMetadata": { "name": name },
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.jwt)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Storage(format!("upload failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LedgerError::Storage(format!(
                "pinning service returned {}: {}",
                status, text
            )));
        }

        let pinned: PinResponse = response
            .json()
            .await
            .map_err(|e| LedgerError::Storage(format!("unexpected pinning response: {}", e)))?;

        Ok(StoredObject {
            url: format!("{}/{}", self.gateway_url, pinned.ipfs_hash),
            content_hash: pinned.ipfs_hash,
        })
    }
}

/// Map a subject id to a directory name: anything outside `[A-Za-z0-9_-]` becomes `_`.
pub fn safe_subject(subject_id: &str) -> String {
    let safe: String = subject_id
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    if safe.is_empty() {
        "_".to_string()
    } else {
        safe
    }
}

/// Local directory of versioned audit backups.
#[derive(Debug, Clone)]
pub struct BackupWriter {
    root: PathBuf,
}

impl BackupWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Write `<root>/<safe_subject>/audit-<unix_millis>-<short_hash>.json`.
    pub async fn write(
        &self,
        subject_id: &str,
        unix_millis: i64,
        short_hash: &str,
        bytes: &[u8],
    ) -> LedgerResult<PathBuf> {
        let dir = self.root.join(safe_subject(subject_id));
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| LedgerError::Storage(format!("cannot create {}: {}", dir.display(), e)))?;

        let path = dir.join(format!("audit-{}-{}.json", unix_millis, short_hash));
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| LedgerError::Storage(format!("cannot create {}: {}", path.display(), e)))?;
        persist(&path, file, bytes).await?;

        Ok(path)
    }
}

/// Write `bytes` through `sink`, removing `path` if the write does not complete.
async fn persist<W>(path: &Path, mut sink: W, bytes: &[u8]) -> LedgerResult<()>
where
    W: AsyncWrite + Unpin,
{
    let written = match sink.write_all(bytes).await {
        Ok(()) => sink.flush().await,
        Err(e) => Err(e),
    };
    drop(sink);

    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %cleanup, "Failed to remove partial backup");
        }
        return Err(LedgerError::Storage(format!(
            "cannot write {}: {}",
            path.display(),
            e
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_subject() {
        assert_eq!(safe_subject("+91-555-0100"), "_91-555-0100");
        assert_eq!(safe_subject("user@example.com"), "user_example_com");
        assert_eq!(safe_subject("../etc/passwd"), "___etc_passwd");
        assert_eq!(safe_subject("   "), "_");
    }

    #[tokio::test]
    async fn test_backup_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let writer = BackupWriter::new(dir.path());

        let first = writer.write("+91-555-0100", 1, "abcd1234", b"{}").await.unwrap();
        assert!(first.starts_with(dir.path().join("_91-555-0100")));
        assert_eq!(first.file_name().unwrap(), "audit-1-abcd1234.json");

        let again = writer.write("+91-555-0100", 1, "abcd1234", b"{\"x\":1}").await;
        assert!(matches!(again, Err(LedgerError::Storage(_))));
        assert_eq!(std::fs::read(&first).unwrap(), b"{}");
    }

    struct FullDisk;

    impl AsyncWrite for FullDisk {
        fn poll_write(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &[u8],
        ) -> std::task::Poll<std::io::Result<usize>> {
            std::task::Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no space left on device",
            )))
        }

        fn poll_flush(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn poll_shutdown(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Ready(Ok(()))
        }
    }

    #[tokio::test]
    async fn test_failed_write_leaves_no_partial_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit-1-abcd1234.json");
        std::fs::write(&path, b"{\"trunc").unwrap();

        let result = persist(&path, FullDisk, b"{}").await;

        assert!(matches!(result, Err(LedgerError::Storage(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_store_disabled_without_upload() {
        let config = AuditConfig {
            upload_enabled: false,
            ..AuditConfig::default()
        };
        assert!(PinataStore::from_env(&config).is_none());
    }
}
