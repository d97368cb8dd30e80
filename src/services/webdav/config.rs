
/// WebDAV session configuration for a single batch run
#[derive(Debug, Clone)]
pub struct WebDAVConfig {
    pub server_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub domain: Option<String>,
    pub workstation: Option<String>,
    pub ignore_cookies: bool,
    pub preemptive_authentication_host: Option<String>,
    pub timeout_seconds: u64,
}

/// Retry configuration for WebDAV requests
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
    pub rate_limit_backoff_ms: u64, // Additional backoff for 429 responses
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000, // 1 second
            max_delay_ms: 30000,    // 30 seconds
            backoff_multiplier: 2.0,
            rate_limit_backoff_ms: 5000, // 5 seconds
        }
    }
}

impl WebDAVConfig {
    /// Creates a configuration with plain credentials and defaults for the rest
    pub fn new(server_url: String, username: Option<String>, password: Option<String>) -> Self {
        Self {
            server_url,
            username,
            password,
            domain: None,
            workstation: None,
            ignore_cookies: false,
            preemptive_authentication_host: None,
            timeout_seconds: 30,
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server_url.is_empty() {
            return Err(anyhow::anyhow!("Server URL cannot be empty"));
        }

        if !self.server_url.starts_with("http://") && !self.server_url.starts_with("https://") {
            return Err(anyhow::anyhow!("Server URL must start with http:// or https://"));
        }

        if self.uses_scoped_credentials() && self.username.is_none() {
            return Err(anyhow::anyhow!(
                "Domain/workstation credentials require a username"
            ));
        }

        if self.password.is_some() && self.username.is_none() {
            return Err(anyhow::anyhow!("Password provided without a username"));
        }

        Ok(())
    }

    /// Whether domain or workstation is present, which selects the
    /// scoped credential-binding path instead of plain basic credentials
    pub fn uses_scoped_credentials(&self) -> bool {
        self.domain.is_some() || self.workstation.is_some()
    }

    /// Returns the base URL for WebDAV operations
    pub fn webdav_url(&self) -> String {
        self.server_url.trim_end_matches('/').to_string()
    }

    /// Gets the timeout duration
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds)
    }
}
