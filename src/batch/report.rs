use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::errors::{BatchError, DavError};

/// Orchestration lifecycle of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Unstarted,
    SessionReady,
    Running,
    Completed,
    Aborted,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Unstarted => write!(f, "unstarted"),
            RunState::SessionReady => write!(f, "session_ready"),
            RunState::Running => write!(f, "running"),
            RunState::Completed => write!(f, "completed"),
            RunState::Aborted => write!(f, "aborted"),
        }
    }
}

/// Classified result of a single command.
///
/// `NegativeConfirmed` is the expected negative (an `exists` probe that found
/// nothing); it counts as success for fail-policy purposes.
#[derive(Debug)]
pub enum CommandOutcome {
    Succeeded { detail: Option<String> },
    NegativeConfirmed { detail: String },
    Failed { error: DavError },
}

impl CommandOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CommandOutcome::Failed { .. })
    }

    pub fn error(&self) -> Option<&DavError> {
        match self {
            CommandOutcome::Failed { error } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for CommandOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandOutcome::Succeeded { detail: None } => write!(f, "ok"),
            CommandOutcome::Succeeded { detail: Some(detail) } => write!(f, "ok ({})", detail),
            CommandOutcome::NegativeConfirmed { detail } => write!(f, "negative ({})", detail),
            CommandOutcome::Failed { error } => write!(f, "failed: {}", error),
        }
    }
}

/// One recorded command execution, in declaration order
#[derive(Debug)]
pub struct CommandRecord {
    pub index: usize,
    pub description: String,
    pub outcome: CommandOutcome,
}

/// Accumulated outcomes of one run plus its terminal state.
///
/// Records cover every attempted command, up to and including the failing one
/// when the run aborts; commands skipped by an abort are counted but never
/// recorded.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub state: RunState,
    pub fail_on_error: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records: Vec<CommandRecord>,
    pub skipped: usize,
}

impl RunReport {
    pub(crate) fn begin(fail_on_error: bool) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            state: RunState::Unstarted,
            fail_on_error,
            started_at: Utc::now(),
            finished_at: None,
            records: Vec::new(),
            skipped: 0,
        }
    }

    pub(crate) fn mark(&mut self, state: RunState) {
        self.state = state;
    }

    pub(crate) fn record(&mut self, index: usize, description: String, outcome: CommandOutcome) {
        self.records.push(CommandRecord {
            index,
            description,
            outcome,
        });
    }

    pub(crate) fn finish(&mut self, state: RunState, skipped: usize) {
        self.state = state;
        self.skipped = skipped;
        self.finished_at = Some(Utc::now());
    }

    /// Number of commands actually attempted
    pub fn attempted(&self) -> usize {
        self.records.len()
    }

    pub fn failure_count(&self) -> usize {
        self.records
            .iter()
            .filter(|record| record.outcome.is_failure())
            .count()
    }

    pub fn first_failure(&self) -> Option<&CommandRecord> {
        self.records
            .iter()
            .find(|record| record.outcome.is_failure())
    }

    pub fn is_success(&self) -> bool {
        self.state == RunState::Completed && self.failure_count() == 0
    }

    /// Consolidates recorded failures into one error for the caller.
    ///
    /// An aborted run reports the command it stopped at; a completed run with
    /// failures reports the aggregate. A clean run returns `None`.
    pub fn aggregate_failure(&self) -> Option<BatchError> {
        let first = self.first_failure()?;
        let cause = first
            .outcome
            .error()
            .map(|error| error.to_string())
            .unwrap_or_else(|| "unknown cause".to_string());

        Some(match self.state {
            RunState::Aborted => BatchError::Aborted {
                index: first.index,
                description: first.description.clone(),
                cause,
            },
            _ => BatchError::CommandsFailed {
                failed: self.failure_count(),
                attempted: self.attempted(),
                cause,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed_outcome() -> CommandOutcome {
        CommandOutcome::Failed {
            error: DavError::ResourceNotFound {
                path: "/missing".to_string(),
            },
        }
    }

    #[test]
    fn test_clean_run_has_no_aggregate_failure() {
        let mut report = RunReport::begin(false);
        report.record(0, "delete '/a'".to_string(), CommandOutcome::Succeeded { detail: None });
        report.record(
            1,
            "check existence of '/b'".to_string(),
            CommandOutcome::NegativeConfirmed {
                detail: "'/b' is absent".to_string(),
            },
        );
        report.finish(RunState::Completed, 0);

        assert!(report.is_success());
        assert_eq!(report.failure_count(), 0);
        assert!(report.aggregate_failure().is_none());
    }

    #[test]
    fn test_aborted_run_reports_first_fatal() {
        let mut report = RunReport::begin(true);
        report.record(0, "delete '/a'".to_string(), failed_outcome());
        report.finish(RunState::Aborted, 2);

        assert!(!report.is_success());
        let failure = report.aggregate_failure().expect("failure expected");
        match failure {
            BatchError::Aborted { index, description, cause } => {
                assert_eq!(index, 0);
                assert_eq!(description, "delete '/a'");
                assert!(cause.contains("/missing"));
            }
            other => panic!("expected abort, got {:?}", other),
        }
    }

    #[test]
    fn test_completed_run_with_failures_aggregates() {
        let mut report = RunReport::begin(false);
        report.record(0, "delete '/a'".to_string(), failed_outcome());
        report.record(1, "delete '/b'".to_string(), CommandOutcome::Succeeded { detail: None });
        report.record(2, "delete '/c'".to_string(), failed_outcome());
        report.finish(RunState::Completed, 0);

        assert!(!report.is_success());
        match report.aggregate_failure().expect("failure expected") {
            BatchError::CommandsFailed { failed, attempted, .. } => {
                assert_eq!(failed, 2);
                assert_eq!(attempted, 3);
            }
            other => panic!("expected aggregate, got {:?}", other),
        }
    }
}
