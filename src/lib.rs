pub mod batch;
pub mod config;
pub mod errors;
pub mod models;
pub mod services;

pub use batch::{BatchRunner, Command, CommandOutcome, RunReport, RunState};
pub use errors::{BatchError, DavError};
pub use models::{BatchConfig, CommandSpec};
pub use services::webdav::{DavSession, WebDAVConfig, WebDAVSession};
