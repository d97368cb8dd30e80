use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A declared batch: one authenticated session plus an ordered command list.
///
/// Deserialized from the JSON batch file. The command list order is the
/// execution order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub server_url: String,
    #[serde(default)]
    pub fail_on_error: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub workstation: Option<String>,
    #[serde(default)]
    pub ignore_cookies: bool,
    #[serde(default)]
    pub preemptive_authentication_host: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    pub commands: Vec<CommandSpec>,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_overwrite() -> bool {
    true
}

/// One declared operation, tagged by `operation` in the batch file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum CommandSpec {
    Copy {
        source: String,
        destination: String,
        #[serde(default = "default_overwrite")]
        overwrite: bool,
    },
    Move {
        source: String,
        destination: String,
        #[serde(default = "default_overwrite")]
        overwrite: bool,
    },
    Delete {
        target: String,
    },
    Exists {
        target: String,
    },
    CreateDirectory {
        path: String,
    },
    Put {
        local_source: PathBuf,
        remote_target: String,
    },
}
