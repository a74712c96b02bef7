//! Collaborator traits used by the release pipeline
//!
//! The orchestrator only talks to these traits, so tests can drive it with
//! in-memory fakes while the CLI wires in git, dotnet/command publishers and
//! the GitHub CLI.

use crate::core::error::{ReleaseError, ReleaseResult};
use crate::core::vcs::SystemGit;
use crate::version::SemVer;
use std::path::{Path, PathBuf};

/// Reason carried by [`ReleaseError::CommitFailed`] when the index is clean
pub const NOTHING_TO_COMMIT: &str = "nothing to commit";

/// Version control operations
pub trait VersionControl {
  /// True when the tag exists locally or (when remote access is on) on the remote
  fn tag_exists(&mut self, tag: &str) -> ReleaseResult<bool>;

  /// Stage `paths` and commit them
  ///
  /// Fails with [`ReleaseError::CommitFailed`] when nothing changed.
  fn commit(&mut self, paths: &[PathBuf], message: &str) -> ReleaseResult<()>;

  fn create_tag(&mut self, name: &str, message: &str) -> ReleaseResult<()>;

  /// Delete a tag everywhere it was created; a missing tag is not an error
  fn delete_tag(&mut self, name: &str) -> ReleaseResult<()>;

  fn push(&mut self, refspec: &str) -> ReleaseResult<()>;
}

/// Package registry
pub trait PackagePublisher {
  fn publish(&mut self, project: &str, manifest: &Path, version: SemVer) -> ReleaseResult<()>;

  fn unpublish(&mut self, project: &str, manifest: &Path, version: SemVer) -> ReleaseResult<()>;
}

/// Release host (GitHub releases)
pub trait ReleaseHost {
  fn create_release(&mut self, tag: &str, title: &str, notes: &str) -> ReleaseResult<()>;

  fn delete_release(&mut self, tag: &str) -> ReleaseResult<()>;
}

/// [`VersionControl`] over the system git binary
#[derive(Debug, Clone)]
pub struct GitVcs {
  git: SystemGit,
  remote: String,
  use_remote: bool,
}

impl GitVcs {
  /// `use_remote` controls remote tag lookups and remote tag deletion
  pub fn new(git: SystemGit, remote: impl Into<String>, use_remote: bool) -> Self {
    Self {
      git,
      remote: remote.into(),
      use_remote,
    }
  }
}

impl VersionControl for GitVcs {
  fn tag_exists(&mut self, tag: &str) -> ReleaseResult<bool> {
    if self.git.local_tag_exists(tag)? {
      return Ok(true);
    }
    if self.use_remote {
      return self.git.remote_tag_exists(&self.remote, tag);
    }
    Ok(false)
  }

  fn commit(&mut self, paths: &[PathBuf], message: &str) -> ReleaseResult<()> {
    self.git.add_paths(paths)?;
    if !self.git.has_staged_changes()? {
      return Err(ReleaseError::CommitFailed {
        reason: NOTHING_TO_COMMIT.to_string(),
      });
    }
    let sha = self.git.commit(message).map_err(|e| ReleaseError::CommitFailed { reason: e.to_string() })?;
    tracing::info!(commit = %sha, "committed");
    Ok(())
  }

  fn create_tag(&mut self, name: &str, message: &str) -> ReleaseResult<()> {
    self.git.create_annotated_tag(name, message)
  }

  fn delete_tag(&mut self, name: &str) -> ReleaseResult<()> {
    self.git.delete_local_tag(name)?;
    if self.use_remote {
      self.git.delete_remote_tag(&self.remote, name)?;
    }
    Ok(())
  }

  fn push(&mut self, refspec: &str) -> ReleaseResult<()> {
    self.git.push(&self.remote, refspec)
  }
}

/// Whether an error is the clean-index commit failure
pub fn is_nothing_to_commit(err: &ReleaseError) -> bool {
  matches!(err, ReleaseError::CommitFailed { reason } if reason == NOTHING_TO_COMMIT)
}
