use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use super::config::{RetryConfig, WebDAVConfig};
use crate::errors::DavError;

/// Credentials carried by a connection.
///
/// `Scoped` is the domain/workstation-bound form attached in a second step
/// after the connection is built; `Basic` is attached at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    None,
    Basic {
        username: String,
        password: String,
    },
    Scoped {
        username: String,
        password: String,
        domain: Option<String>,
        workstation: Option<String>,
    },
}

impl Credentials {
    /// Login/password pair as sent on the wire. Scoped credentials are
    /// transported as `DOMAIN\user`; the workstation rides along on the
    /// session only.
    pub fn transport_identity(&self) -> Option<(String, String)> {
        match self {
            Credentials::None => None,
            Credentials::Basic { username, password } => {
                Some((username.clone(), password.clone()))
            }
            Credentials::Scoped {
                username,
                password,
                domain,
                ..
            } => {
                let login = match domain {
                    Some(domain) => format!("{}\\{}", domain, username),
                    None => username.clone(),
                };
                Some((login, password.clone()))
            }
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Credentials::None)
    }
}

/// HTTP plumbing shared by all operations of one session: client construction,
/// authentication flow (preemptive vs. challenge), retry with backoff, and
/// resource URL building.
pub struct WebDAVConnection {
    client: Client,
    config: WebDAVConfig,
    retry_config: RetryConfig,
    credentials: Credentials,
}

impl WebDAVConnection {
    /// Builds an anonymous connection. Credentials can be attached afterwards
    /// with `attach_credentials`, before the first request goes out.
    pub fn new(config: WebDAVConfig, retry_config: RetryConfig) -> Result<Self, DavError> {
        config
            .validate()
            .map_err(|e| DavError::configuration(e.to_string()))?;

        let mut builder = Client::builder().timeout(config.timeout());
        if !config.ignore_cookies {
            builder = builder.cookie_store(true);
        }
        let client = builder.build().map_err(|e| {
            DavError::configuration(format!("failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            config,
            retry_config,
            credentials: Credentials::None,
        })
    }

    /// Builds a connection with credentials in a single step
    pub fn with_credentials(
        config: WebDAVConfig,
        retry_config: RetryConfig,
        credentials: Credentials,
    ) -> Result<Self, DavError> {
        let mut connection = Self::new(config, retry_config)?;
        connection.credentials = credentials;
        Ok(connection)
    }

    /// Attaches credentials to a connection created anonymously. Must happen
    /// before the first request; the connection is not mutated afterwards.
    pub fn attach_credentials(&mut self, credentials: Credentials) {
        self.credentials = credentials;
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn config(&self) -> &WebDAVConfig {
        &self.config
    }

    /// Whether requests to `url` should carry credentials without waiting for
    /// a challenge
    pub fn applies_preemptive(&self, url: &str) -> bool {
        let host = match self.config.preemptive_authentication_host.as_deref() {
            Some(host) if !host.is_empty() => host,
            _ => return false,
        };

        match Url::parse(url) {
            Ok(parsed) => parsed
                .host_str()
                .map(|h| h.eq_ignore_ascii_case(host))
                .unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Sends one WebDAV request and returns the final response.
    ///
    /// Requests to the preemptive host carry credentials immediately; all
    /// others go out unauthenticated and are retried once with credentials on
    /// a 401 challenge. Transport failures and server errors are retried with
    /// exponential backoff, 429 responses back off on their own schedule, and
    /// other client errors are returned to the caller for interpretation.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<Vec<u8>>,
        headers: &[(&str, String)],
    ) -> Result<Response, DavError> {
        let mut authenticate = self.applies_preemptive(url);
        let mut attempt = 0;
        let mut delay = self.retry_config.initial_delay_ms;

        loop {
            let mut request = self.client.request(method.clone(), url);

            if authenticate {
                if let Some((login, password)) = self.credentials.transport_identity() {
                    request = request.basic_auth(login, Some(password));
                }
            }

            if let Some(ref content) = body {
                request = request.body(content.clone());
            }

            for (key, value) in headers {
                request = request.header(*key, value.clone());
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::UNAUTHORIZED
                        && !authenticate
                        && !self.credentials.is_anonymous()
                    {
                        debug!("401 challenge from {}, retrying with credentials", url);
                        authenticate = true;
                        continue;
                    }

                    if status.as_u16() == 429 {
                        warn!(
                            "Rate limited, backing off for {}ms",
                            self.retry_config.rate_limit_backoff_ms
                        );
                        sleep(Duration::from_millis(self.retry_config.rate_limit_backoff_ms))
                            .await;
                        continue;
                    }

                    if status.is_server_error() && attempt < self.retry_config.max_retries {
                        warn!(
                            "Server error {}, retrying in {}ms (attempt {}/{})",
                            status,
                            delay,
                            attempt + 1,
                            self.retry_config.max_retries
                        );
                        sleep(Duration::from_millis(delay)).await;
                        delay = std::cmp::min(
                            (delay as f64 * self.retry_config.backoff_multiplier) as u64,
                            self.retry_config.max_delay_ms,
                        );
                        attempt += 1;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if attempt < self.retry_config.max_retries {
                        warn!(
                            "Request error: {}, retrying in {}ms (attempt {}/{})",
                            e,
                            delay,
                            attempt + 1,
                            self.retry_config.max_retries
                        );
                        sleep(Duration::from_millis(delay)).await;
                        delay = std::cmp::min(
                            (delay as f64 * self.retry_config.backoff_multiplier) as u64,
                            self.retry_config.max_delay_ms,
                        );
                        attempt += 1;
                        continue;
                    }

                    return Err(DavError::Transport {
                        url: url.to_string(),
                        source: e,
                    });
                }
            }
        }
    }

    /// Gets the full URL for a resource path, with each segment percent-encoded
    pub fn url_for_path(&self, path: &str) -> String {
        let base_url = self.config.webdav_url();
        let encoded: Vec<String> = path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();

        if encoded.is_empty() {
            base_url
        } else {
            format!("{}/{}", base_url.trim_end_matches('/'), encoded.join("/"))
        }
    }
}

/// Resolves a WebDAV extension method token (COPY, MOVE, MKCOL, PROPFIND)
pub(crate) fn extension_method(name: &str) -> Result<Method, DavError> {
    Method::from_bytes(name.as_bytes())
        .map_err(|_| DavError::configuration(format!("invalid HTTP method token: {}", name)))
}
