//! Outcome records for a scaffold run.

use std::fmt;

use serde::Serialize;

use crate::domain::StepKind;

/// What happened to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Created,
    Overwritten,
    /// `CreateIfAbsent` found an existing file.
    Skipped,
    Injected { line: usize },
    Fetched { bytes: usize },
    Ran { exit_code: i32 },
    /// Dry-run: nothing was performed.
    Planned,
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::Overwritten => f.write_str("overwritten"),
            Self::Skipped => f.write_str("skipped"),
            Self::Injected { line } => write!(f, "injected at line {line}"),
            Self::Fetched { bytes } => write!(f, "fetched {bytes} bytes"),
            Self::Ran { exit_code } => write!(f, "exit {exit_code}"),
            Self::Planned => f.write_str("planned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    /// 1-based position in the pipeline.
    pub index: usize,
    pub kind: StepKind,
    pub description: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Summary of a completed scaffold run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    pub steps: Vec<StepRecord>,
}

impl RunReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            steps: Vec::new(),
        }
    }

    pub fn count(&self, pred: impl Fn(&StepOutcome) -> bool) -> usize {
        self.steps.iter().filter(|r| pred(&r.outcome)).count()
    }
}
