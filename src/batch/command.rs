use std::path::PathBuf;
use tracing::info;

use super::report::CommandOutcome;
use crate::models::CommandSpec;
use crate::services::webdav::DavSession;

/// An executable unit of work over the shared session.
///
/// Built from a `CommandSpec` declaration; executed at most once, in
/// declaration order. Outcome interpretation (fail-policy) belongs to the
/// runner, not the command.
#[derive(Debug, Clone)]
pub enum Command {
    Copy {
        source: String,
        destination: String,
        overwrite: bool,
    },
    Move {
        source: String,
        destination: String,
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

impl Command {
    /// Short human-readable form used in logs and run records
    pub fn describe(&self) -> String {
        match self {
            Command::Copy {
                source,
                destination,
                ..
            } => format!("copy '{}' to '{}'", source, destination),
            Command::Move {
                source,
                destination,
                ..
            } => format!("move '{}' to '{}'", source, destination),
            Command::Delete { target } => format!("delete '{}'", target),
            Command::Exists { target } => format!("check existence of '{}'", target),
            Command::CreateDirectory { path } => format!("create directory '{}'", path),
            Command::Put {
                local_source,
                remote_target,
            } => format!("put '{}' to '{}'", local_source.display(), remote_target),
        }
    }

    /// Runs the operation against the shared session and classifies the
    /// result. An absent resource reported by `Exists` is the expected
    /// negative, never a failure.
    pub async fn execute(&self, session: &dyn DavSession) -> CommandOutcome {
        info!("▶️  {}", self.describe());

        match self {
            Command::Copy {
                source,
                destination,
                overwrite,
            } => outcome_of(session.copy(source, destination, *overwrite).await),
            Command::Move {
                source,
                destination,
                overwrite,
            } => outcome_of(session.move_resource(source, destination, *overwrite).await),
            Command::Delete { target } => outcome_of(session.delete(target).await),
            Command::CreateDirectory { path } => outcome_of(session.create_directory(path).await),
            Command::Put {
                local_source,
                remote_target,
            } => outcome_of(session.put(local_source, remote_target).await),
            Command::Exists { target } => match session.exists(target).await {
                Ok(true) => CommandOutcome::Succeeded {
                    detail: Some(format!("'{}' is present", target)),
                },
                Ok(false) => CommandOutcome::NegativeConfirmed {
                    detail: format!("'{}' is absent", target),
                },
                Err(error) => CommandOutcome::Failed { error },
            },
        }
    }
}

fn outcome_of(result: Result<(), crate::errors::DavError>) -> CommandOutcome {
    match result {
        Ok(()) => CommandOutcome::Succeeded { detail: None },
        Err(error) => CommandOutcome::Failed { error },
    }
}

impl From<CommandSpec> for Command {
    fn from(spec: CommandSpec) -> Self {
        match spec {
            CommandSpec::Copy {
                source,
                destination,
                overwrite,
            } => Command::Copy {
                source,
                destination,
                overwrite,
            },
            CommandSpec::Move {
                source,
                destination,
                overwrite,
            } => Command::Move {
                source,
                destination,
                overwrite,
            },
            CommandSpec::Delete { target } => Command::Delete { target },
            CommandSpec::Exists { target } => Command::Exists { target },
            CommandSpec::CreateDirectory { path } => Command::CreateDirectory { path },
            CommandSpec::Put {
                local_source,
                remote_target,
            } => Command::Put {
                local_source,
                remote_target,
            },
        }
    }
}
