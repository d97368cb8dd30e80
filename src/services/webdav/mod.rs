// WebDAV session modules organized by functionality

pub mod config;
pub mod connection;
pub mod session;

// Re-export main types for convenience
pub use config::{RetryConfig, WebDAVConfig};
pub use connection::{Credentials, WebDAVConnection};
pub use session::{CredentialMode, DavSession, WebDAVSession};
