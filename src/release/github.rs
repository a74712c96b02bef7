//! GitHub releases through the `gh` CLI

use super::ports::ReleaseHost;
use crate::core::error::{CommandError, ReleaseResult};
use crate::core::process;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// [`ReleaseHost`] backed by `gh release`
///
/// Authentication is left to `gh` itself (`GH_TOKEN` / `GITHUB_TOKEN`).
#[derive(Debug, Clone)]
pub struct GhCliHost {
  gh: String,
  repo_root: PathBuf,
  timeout: Duration,
}

impl GhCliHost {
  pub fn new(gh: impl Into<String>, repo_root: &Path, timeout: Duration) -> Self {
    Self {
      gh: gh.into(),
      repo_root: repo_root.to_path_buf(),
      timeout,
    }
  }

  fn command(&self, args: &[&str]) -> (Command, String) {
    let mut cmd = Command::new(&self.gh);
    cmd.args(args).current_dir(&self.repo_root);
    let shown: Vec<&str> = args.iter().take(3).copied().collect();
    (cmd, format!("{} {}", self.gh, shown.join(" ")))
  }
}

impl ReleaseHost for GhCliHost {
  fn create_release(&mut self, tag: &str, title: &str, notes: &str) -> ReleaseResult<()> {
    let (cmd, label) = self.command(&["release", "create", tag, "--title", title, "--notes", notes]);
    process::run_checked(cmd, self.timeout, &label)?;
    tracing::info!(tag, "created GitHub release");
    Ok(())
  }

  fn delete_release(&mut self, tag: &str) -> ReleaseResult<()> {
    let (cmd, label) = self.command(&["release", "delete", tag, "--yes"]);
    let output = process::run(cmd, self.timeout, &label)?;
    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      if stderr.contains("release not found") {
        tracing::debug!(tag, "no GitHub release to delete");
        return Ok(());
      }
      return Err(
        CommandError::Failed {
          command: label,
          status: output.status.code(),
          stderr,
        }
        .into(),
      );
    }
    tracing::info!(tag, "deleted GitHub release");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::core::error::ReleaseError;

  #[test]
  fn test_missing_binary_is_spawn_error() {
    let mut host = GhCliHost::new("monorel-no-such-gh", Path::new("."), Duration::from_secs(5));
    let err = host.create_release("Core_1.0.0", "Core_1.0.0", "- notes").unwrap_err();
    assert!(matches!(err, ReleaseError::Command(CommandError::Spawn { .. })));
  }
}
