//! Release operations for SystemGit (staging, commits, tags, pushes)

use super::system_git::SystemGit;
use crate::core::error::{GitError, ReleaseError, ReleaseResult};
use crate::utils::display_relative;
use std::path::PathBuf;

impl SystemGit {
  /// Stage the given paths
  ///
  /// Paths under the repository directory are passed relative to it.
  pub fn add_paths(&self, paths: &[PathBuf]) -> ReleaseResult<()> {
    let formatted: Vec<String> = paths.iter().map(|p| display_relative(p, &self.repo_path)).collect();
    let mut args = vec!["add", "--"];
    args.extend(formatted.iter().map(String::as_str));
    self.run(&args)?;
    Ok(())
  }

  /// Whether the index differs from HEAD
  pub fn has_staged_changes(&self) -> ReleaseResult<bool> {
    let output = self.output(&["diff", "--cached", "--quiet"])?;
    match output.status.code() {
      Some(0) => Ok(false),
      Some(1) => Ok(true),
      _ => Err(ReleaseError::Git(GitError::CommandFailed {
        command: "git diff --cached --quiet".to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      })),
    }
  }

  /// Commit the index
  pub fn commit(&self, message: &str) -> ReleaseResult<String> {
    self.run(&["commit", "--no-verify", "-m", message])?;
    self.head_commit()
  }

  /// Create an annotated tag at HEAD
  pub fn create_annotated_tag(&self, name: &str, message: &str) -> ReleaseResult<()> {
    self.run(&["tag", "-a", name, "-m", message])?;
    Ok(())
  }

  pub fn local_tag_exists(&self, name: &str) -> ReleaseResult<bool> {
    let reference = format!("refs/tags/{}", name);
    let output = self.output(&["rev-parse", "-q", "--verify", &reference])?;
    Ok(output.status.success())
  }

  pub fn remote_tag_exists(&self, remote: &str, name: &str) -> ReleaseResult<bool> {
    let reference = format!("refs/tags/{}", name);
    let output = self.run(&["ls-remote", "--tags", remote, &reference])?;
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
  }

  /// Delete a local tag; an absent tag is not an error
  pub fn delete_local_tag(&self, name: &str) -> ReleaseResult<()> {
    if !self.local_tag_exists(name)? {
      return Ok(());
    }
    self.run(&["tag", "-d", name])?;
    Ok(())
  }

  /// Push a ref to a remote
  pub fn push(&self, remote: &str, refspec: &str) -> ReleaseResult<()> {
    let output = self.output(&["push", remote, refspec])?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ReleaseError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        refspec: refspec.to_string(),
        reason: stderr.trim().to_string(),
      }));
    }

    tracing::info!(remote, refspec, "pushed");
    Ok(())
  }

  /// Delete a tag on the remote; an absent remote tag is not an error
  pub fn delete_remote_tag(&self, remote: &str, name: &str) -> ReleaseResult<()> {
    let reference = format!("refs/tags/{}", name);
    let output = self.output(&["push", remote, "--delete", &reference])?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("remote ref does not exist") || stderr.contains("unable to delete") {
        return Ok(());
      }
      return Err(ReleaseError::Git(GitError::PushFailed {
        remote: remote.to_string(),
        refspec: format!(":{}", reference),
        reason: stderr.trim().to_string(),
      }));
    }

    Ok(())
  }
}
