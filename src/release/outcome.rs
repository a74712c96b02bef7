//! Result of a release run

use super::saga::CompensationReport;
use super::stage::Stage;
use crate::core::error::{ReleaseError, ReleaseResult};
use std::fmt;
use std::path::PathBuf;

/// A released project: (project, tag)
pub type ReleasedTag = (String, String);

/// Why and where a run stopped, and what was undone
#[derive(Debug)]
pub struct PipelineFailure {
  pub failed_stage: Stage,
  /// Project being processed when the stage failed, for per-project stages
  pub project: Option<String>,
  /// The error that stopped the run
  pub reason: ReleaseError,
  pub compensations: CompensationReport,
  /// `.bkp` files left for manual recovery
  pub kept_backups: Vec<PathBuf>,
}

impl PipelineFailure {
  /// True when some side effect may still be live
  pub fn is_partial(&self) -> bool {
    !self.compensations.is_complete()
  }
}

impl fmt::Display for PipelineFailure {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "Release failed at stage '{}'", self.failed_stage)?;
    if let Some(project) = &self.project {
      write!(f, " for {}", project)?;
    }
    write!(f, ": {}", self.reason)?;

    if !self.compensations.applied.is_empty() || !self.compensations.failed.is_empty() {
      write!(f, "\n{}", self.compensations.summary())?;
    }
    for (label, error) in &self.compensations.failed {
      write!(f, "\n  - {}: {}", label, error)?;
    }
    if !self.kept_backups.is_empty() {
      write!(f, "\nManifest backups kept:")?;
      for path in &self.kept_backups {
        write!(f, "\n  - {}", path.display())?;
      }
    }
    Ok(())
  }
}

#[derive(Debug)]
pub enum PipelineOutcome {
  Success { tags: Vec<ReleasedTag> },
  Failure(Box<PipelineFailure>),
}

impl PipelineOutcome {
  pub fn into_result(self) -> ReleaseResult<Vec<ReleasedTag>> {
    match self {
      PipelineOutcome::Success { tags } => Ok(tags),
      PipelineOutcome::Failure(failure) => Err(ReleaseError::Pipeline(failure)),
    }
  }
}
