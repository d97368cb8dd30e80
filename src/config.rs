use anyhow::{Context, Result};
use std::env;
use std::path::Path;

use crate::models::BatchConfig;

pub const USERNAME_ENV: &str = "DAVRUN_USERNAME";
pub const PASSWORD_ENV: &str = "DAVRUN_PASSWORD";

/// Loads a batch declaration from disk.
///
/// Credentials omitted from the file are filled from `DAVRUN_USERNAME` /
/// `DAVRUN_PASSWORD` so batch files can be committed without secrets.
pub fn load_batch(path: &Path) -> Result<BatchConfig> {
    dotenvy::dotenv().ok();

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read batch file '{}'", path.display()))?;
    let mut batch: BatchConfig = serde_json::from_str(&raw)
        .with_context(|| format!("invalid batch file '{}'", path.display()))?;

    apply_env_credentials(&mut batch);
    Ok(batch)
}

fn apply_env_credentials(batch: &mut BatchConfig) {
    if batch.username.is_none() {
        batch.username = env::var(USERNAME_ENV).ok().filter(|v| !v.is_empty());
    }
    if batch.password.is_none() {
        batch.password = env::var(PASSWORD_ENV).ok().filter(|v| !v.is_empty());
    }
}
