use tracing::{error, info, warn};

use super::command::Command;
use super::report::{RunReport, RunState};
use crate::errors::BatchError;
use crate::models::BatchConfig;
use crate::services::webdav::{DavSession, WebDAVConfig, WebDAVSession};

/// Runs a declared command list against one shared WebDAV session.
///
/// Lifecycle: Unstarted -> SessionReady -> Running -> Completed or Aborted.
/// The session is created exactly once, before the first command; commands
/// run strictly in declaration order. A runner is consumed by `run` and never
/// reused.
pub struct BatchRunner {
    config: WebDAVConfig,
    fail_on_error: bool,
    commands: Vec<Command>,
}

impl BatchRunner {
    pub fn new(config: WebDAVConfig, fail_on_error: bool, commands: Vec<Command>) -> Self {
        Self {
            config,
            fail_on_error,
            commands,
        }
    }

    /// Builds a runner from a parsed batch declaration
    pub fn from_batch(batch: BatchConfig) -> Result<Self, BatchError> {
        if batch.commands.is_empty() {
            return Err(BatchError::configuration("batch declares no commands"));
        }

        let BatchConfig {
            server_url,
            fail_on_error,
            username,
            password,
            domain,
            workstation,
            ignore_cookies,
            preemptive_authentication_host,
            timeout_seconds,
            commands,
        } = batch;

        let config = WebDAVConfig {
            server_url,
            username,
            password,
            domain,
            workstation,
            ignore_cookies,
            preemptive_authentication_host,
            timeout_seconds,
        };
        config
            .validate()
            .map_err(|e| BatchError::configuration(e.to_string()))?;

        let commands = commands.into_iter().map(Command::from).collect();
        Ok(Self::new(config, fail_on_error, commands))
    }

    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Creates the session and executes the batch.
    ///
    /// A session-construction failure is fatal: no command runs and the error
    /// is surfaced verbatim as a configuration-class failure.
    pub async fn run(self) -> Result<RunReport, BatchError> {
        info!(
            "Starting WebDAV batch: {} commands against {}",
            self.commands.len(),
            self.config.webdav_url()
        );

        let session = WebDAVSession::create(self.config.clone())
            .map_err(|source| BatchError::SessionCreation { source })?;

        self.run_with_session(&session).await
    }

    /// Executes the batch against an already-created session.
    ///
    /// Split from `run` so the sequencing logic can be driven by any
    /// `DavSession` implementation.
    pub async fn run_with_session(self, session: &dyn DavSession) -> Result<RunReport, BatchError> {
        let mut report = RunReport::begin(self.fail_on_error);
        report.mark(RunState::SessionReady);
        report.mark(RunState::Running);

        let total = self.commands.len();
        for (index, command) in self.commands.iter().enumerate() {
            let outcome = command.execute(session).await;
            let failed = outcome.is_failure();
            if let Some(cause) = outcome.error() {
                if self.fail_on_error {
                    error!("❌ Command {} of {} failed: {}", index + 1, total, cause);
                } else {
                    warn!(
                        "Command {} of {} failed, continuing: {}",
                        index + 1,
                        total,
                        cause
                    );
                }
            }
            report.record(index, command.describe(), outcome);

            if failed && self.fail_on_error {
                let skipped = total - index - 1;
                info!("Aborting batch, {} remaining commands skipped", skipped);
                report.finish(RunState::Aborted, skipped);
                return Ok(report);
            }
        }

        report.finish(RunState::Completed, 0);
        info!(
            "✅ Batch completed: {} commands, {} failed",
            total,
            report.failure_count()
        );
        Ok(report)
    }
}
