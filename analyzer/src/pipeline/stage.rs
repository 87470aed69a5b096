//! Built-in stage identifiers and the deadline-aware stage runner.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::time::{Duration, Instant};

use doc_commands_core::IssueKind;
use serde::{Deserialize, Serialize};

/// Name used for the parse step in issues and reports.
pub const PARSE_STAGE: &str = "parse";

/// The built-in analysis stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinStage {
    Metadata,
    Languages,
    EnvVars,
    Commands,
    Dependencies,
}

impl BuiltinStage {
    /// Every built-in stage, in report order.
    pub const ALL: [BuiltinStage; 5] = [
        BuiltinStage::Metadata,
        BuiltinStage::Languages,
        BuiltinStage::EnvVars,
        BuiltinStage::Commands,
        BuiltinStage::Dependencies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Metadata => "metadata",
            Self::Languages => "languages",
            Self::EnvVars => "env_vars",
            Self::Commands => "commands",
            Self::Dependencies => "dependencies",
        }
    }
}

impl fmt::Display for BuiltinStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltinStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuiltinStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s.trim())
            .ok_or_else(|| format!("unknown stage '{s}'"))
    }
}

/// Why a stage body gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageError {
    pub kind: IssueKind,
    pub message: String,
}

impl StageError {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Outcome of one stage.
#[derive(Debug)]
pub enum StageRun<T> {
    Done {
        value: T,
        confidence: f64,
        elapsed: Duration,
    },
    Failed {
        error: StageError,
        elapsed: Duration,
    },
    /// Finished, or would have started, after the deadline.
    TimedOut { elapsed: Duration },
}

impl<T> StageRun<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            StageRun::Done { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            StageRun::Done { elapsed, .. }
            | StageRun::Failed { elapsed, .. }
            | StageRun::TimedOut { elapsed } => *elapsed,
        }
    }
}

/// Returns `true` once `deadline` has been reached.
pub fn past_deadline(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|limit| Instant::now() >= limit)
}

/// Runs `body` under `deadline`, converting a panic into a failure.
///
/// The body is not started when the deadline has already passed, and its
/// output is discarded when it completes after the deadline.
pub fn run_stage<T, F>(deadline: Option<Instant>, body: F) -> StageRun<T>
where
    F: FnOnce() -> Result<(T, f64), StageError>,
{
    if past_deadline(deadline) {
        return StageRun::TimedOut {
            elapsed: Duration::ZERO,
        };
    }

    let started = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(body));
    let elapsed = started.elapsed();

    if past_deadline(deadline) {
        return StageRun::TimedOut { elapsed };
    }

    match outcome {
        Ok(Ok((value, confidence))) => StageRun::Done {
            value,
            confidence,
            elapsed,
        },
        Ok(Err(error)) => StageRun::Failed { error, elapsed },
        Err(payload) => StageRun::Failed {
            error: StageError::new(
                IssueKind::StageFailure,
                format!("stage panicked: {}", panic_message(payload.as_ref())),
            ),
            elapsed,
        },
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_run_stage_reports_success() {
        let run = run_stage(None, || Ok((7, 0.5)));
        assert!(matches!(run, StageRun::Done { value: 7, confidence, .. } if confidence == 0.5));
    }

    #[test]
    fn test_run_stage_does_not_start_after_deadline() {
        let mut started = false;
        let run: StageRun<()> = run_stage(Some(Instant::now()), || {
            started = true;
            Ok(((), 1.0))
        });
        assert!(matches!(run, StageRun::TimedOut { .. }));
        assert!(!started);
    }

    #[test]
    fn test_run_stage_discards_late_output() {
        let deadline = Instant::now() + Duration::from_millis(10);
        let run = run_stage(Some(deadline), || {
            thread::sleep(Duration::from_millis(40));
            Ok(("late", 1.0))
        });
        assert!(matches!(run, StageRun::TimedOut { elapsed } if elapsed >= Duration::from_millis(40)));
        assert!(run.value().is_none());
    }

    #[test]
    fn test_run_stage_converts_panic() {
        let run: StageRun<()> = run_stage(None, || panic!("boom"));
        match run {
            StageRun::Failed { error, .. } => {
                assert_eq!(error.kind, IssueKind::StageFailure);
                assert!(error.message.contains("boom"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_builtin_stage_names_round_trip() {
        for stage in BuiltinStage::ALL {
            assert_eq!(stage.as_str().parse::<BuiltinStage>().unwrap(), stage);
        }
        assert!("telemetry".parse::<BuiltinStage>().is_err());
    }
}
