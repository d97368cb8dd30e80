use thiserror::Error;

/// Errors surfaced by WebDAV session operations.
///
/// Not-found is its own variant so callers can tell an absent resource apart
/// from transport or authentication trouble.
#[derive(Error, Debug)]
pub enum DavError {
    #[error("invalid WebDAV configuration: {details}")]
    Configuration { details: String },

    #[error("authentication rejected for '{url}' (HTTP {status})")]
    Unauthorized { url: String, status: u16 },

    #[error("resource not found: {path}")]
    ResourceNotFound { path: String },

    #[error("precondition failed for '{path}' (HTTP {status})")]
    PreconditionFailed { path: String, status: u16 },

    #[error("server error from '{url}' (HTTP {status}): {body}")]
    ServerError { url: String, status: u16, body: String },

    #[error("transport failure for '{url}': {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot read local file '{path}': {source}")]
    LocalFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl DavError {
    pub fn configuration<S: Into<String>>(details: S) -> Self {
        Self::Configuration { details: details.into() }
    }
}
