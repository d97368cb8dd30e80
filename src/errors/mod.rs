use thiserror::Error;

pub mod dav;

pub use dav::DavError;

/// Batch-level failures surfaced to the caller.
///
/// Configuration and session-creation errors are fatal and happen before any
/// command runs; the aggregate variants consolidate per-command failures into
/// one error carrying the original cause message.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("invalid batch configuration: {details}")]
    Configuration { details: String },

    #[error("failed to create WebDAV session: {source}")]
    SessionCreation {
        #[source]
        source: DavError,
    },

    #[error("batch aborted at command {index} ({description}): {cause}")]
    Aborted {
        index: usize,
        description: String,
        cause: String,
    },

    #[error("{failed} of {attempted} commands failed; first failure: {cause}")]
    CommandsFailed {
        failed: usize,
        attempted: usize,
        cause: String,
    },
}

impl BatchError {
    pub fn configuration<S: Into<String>>(details: S) -> Self {
        Self::Configuration { details: details.into() }
    }
}
