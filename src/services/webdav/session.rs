use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use std::path::Path;
use tracing::{debug, info};

use super::config::{RetryConfig, WebDAVConfig};
use super::connection::{extension_method, Credentials, WebDAVConnection};
use crate::errors::DavError;

const PROPFIND_EXISTENCE_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
            <D:propfind xmlns:D="DAV:">
                <D:prop>
                    <D:resourcetype/>
                </D:prop>
            </D:propfind>"#;

/// The WebDAV capability consumed by batch commands.
///
/// One implementation talks to a real server; tests substitute their own to
/// observe call sequences.
#[async_trait]
pub trait DavSession: Send + Sync {
    async fn copy(&self, source: &str, destination: &str, overwrite: bool)
        -> Result<(), DavError>;

    async fn move_resource(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<(), DavError>;

    async fn delete(&self, target: &str) -> Result<(), DavError>;

    /// Never fails for an absent resource; that is the `false` result.
    async fn exists(&self, target: &str) -> Result<bool, DavError>;

    async fn create_directory(&self, path: &str) -> Result<(), DavError>;

    async fn put(&self, local_source: &Path, remote_target: &str) -> Result<(), DavError>;
}

/// How the session's credentials were bound at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialMode {
    Anonymous,
    Basic,
    Scoped,
}

/// Authenticated handle to a remote WebDAV endpoint.
///
/// Exactly one session exists per batch run. The factory selects the
/// credential path, applies cookie handling and the preemptive-auth host, and
/// performs no network I/O; the session is immutable once created.
pub struct WebDAVSession {
    connection: WebDAVConnection,
}

impl WebDAVSession {
    /// Creates a session with the default retry policy
    pub fn create(config: WebDAVConfig) -> Result<Self, DavError> {
        Self::create_with_retry(config, RetryConfig::default())
    }

    /// Creates a session with a custom retry policy.
    ///
    /// Plain username/password goes through the single-step basic path. If a
    /// domain or workstation is present, the connection is built anonymously
    /// first and the scoped credentials are attached afterwards, before any
    /// request is issued.
    pub fn create_with_retry(
        config: WebDAVConfig,
        retry_config: RetryConfig,
    ) -> Result<Self, DavError> {
        let connection = if !config.uses_scoped_credentials() {
            let credentials = match (&config.username, &config.password) {
                (Some(username), password) => Credentials::Basic {
                    username: username.clone(),
                    password: password.clone().unwrap_or_default(),
                },
                (None, _) => Credentials::None,
            };
            WebDAVConnection::with_credentials(config, retry_config, credentials)?
        } else {
            let mut connection = WebDAVConnection::new(config.clone(), retry_config)?;
            connection.attach_credentials(Credentials::Scoped {
                username: config.username.clone().unwrap_or_default(),
                password: config.password.clone().unwrap_or_default(),
                domain: config.domain.clone(),
                workstation: config.workstation.clone(),
            });
            connection
        };

        info!(
            "🔑 WebDAV session ready for {} ({:?} credentials)",
            connection.config().webdav_url(),
            session_mode(connection.credentials()),
        );

        Ok(Self { connection })
    }

    pub fn credential_mode(&self) -> CredentialMode {
        session_mode(self.connection.credentials())
    }

    pub fn config(&self) -> &WebDAVConfig {
        self.connection.config()
    }

    /// Maps a non-success status to the operation error taxonomy
    async fn interpret(&self, response: Response, path: &str) -> Result<StatusCode, DavError> {
        let status = response.status();
        if status.is_success() || status.as_u16() == 207 {
            return Ok(status);
        }

        let url = response.url().to_string();
        match status.as_u16() {
            404 => Err(DavError::ResourceNotFound {
                path: path.to_string(),
            }),
            401 | 403 => Err(DavError::Unauthorized {
                url,
                status: status.as_u16(),
            }),
            409 | 412 => Err(DavError::PreconditionFailed {
                path: path.to_string(),
                status: status.as_u16(),
            }),
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(DavError::ServerError {
                    url,
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    async fn transfer(
        &self,
        method_token: &str,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<(), DavError> {
        let url = self.connection.url_for_path(source);
        let destination_url = self.connection.url_for_path(destination);
        let headers = [
            ("Destination", destination_url),
            ("Overwrite", overwrite_flag(overwrite)),
        ];

        let response = self
            .connection
            .request(extension_method(method_token)?, &url, None, &headers)
            .await?;
        self.interpret(response, source).await.map(|_| ())
    }
}

fn session_mode(credentials: &Credentials) -> CredentialMode {
    match credentials {
        Credentials::None => CredentialMode::Anonymous,
        Credentials::Basic { .. } => CredentialMode::Basic,
        Credentials::Scoped { .. } => CredentialMode::Scoped,
    }
}

fn overwrite_flag(overwrite: bool) -> String {
    if overwrite { "T" } else { "F" }.to_string()
}

#[async_trait]
impl DavSession for WebDAVSession {
    async fn copy(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<(), DavError> {
        self.transfer("COPY", source, destination, overwrite).await
    }

    async fn move_resource(
        &self,
        source: &str,
        destination: &str,
        overwrite: bool,
    ) -> Result<(), DavError> {
        self.transfer("MOVE", source, destination, overwrite).await
    }

    async fn delete(&self, target: &str) -> Result<(), DavError> {
        let url = self.connection.url_for_path(target);
        let response = self
            .connection
            .request(Method::DELETE, &url, None, &[])
            .await?;
        self.interpret(response, target).await.map(|_| ())
    }

    async fn exists(&self, target: &str) -> Result<bool, DavError> {
        debug!("🔍 Checking existence of {}", target);
        let url = self.connection.url_for_path(target);
        let headers = [
            ("Depth", "0".to_string()),
            ("Content-Type", "application/xml".to_string()),
        ];

        let response = self
            .connection
            .request(
                extension_method("PROPFIND")?,
                &url,
                Some(PROPFIND_EXISTENCE_BODY.as_bytes().to_vec()),
                &headers,
            )
            .await?;

        if response.status().as_u16() == 404 {
            return Ok(false);
        }
        self.interpret(response, target).await.map(|_| true)
    }

    async fn create_directory(&self, path: &str) -> Result<(), DavError> {
        let url = self.connection.url_for_path(path);
        let response = self
            .connection
            .request(extension_method("MKCOL")?, &url, None, &[])
            .await?;
        self.interpret(response, path).await.map(|_| ())
    }

    async fn put(&self, local_source: &Path, remote_target: &str) -> Result<(), DavError> {
        let content = tokio::fs::read(local_source)
            .await
            .map_err(|e| DavError::LocalFile {
                path: local_source.display().to_string(),
                source: e,
            })?;

        debug!(
            "⬆️ Uploading {} bytes from {} to {}",
            content.len(),
            local_source.display(),
            remote_target
        );

        let url = self.connection.url_for_path(remote_target);
        let response = self
            .connection
            .request(Method::PUT, &url, Some(content), &[])
            .await?;
        self.interpret(response, remote_target).await.map(|_| ())
    }
}
