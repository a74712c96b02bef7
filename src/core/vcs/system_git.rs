//! System git backend
//!
//! Shells out to the `git` binary with an isolated environment:
//! - Working directory pinned with `-C`
//! - Environment cleared, only PATH/HOME and SSH agent variables whitelisted
//! - Safe configuration overrides, plus an optional commit identity
//! - Every call bounded by the run's timeout

use crate::core::error::{GitError, ReleaseError, ReleaseResult, ResultExt};
use crate::core::process;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Environment variables passed through to git
const ENV_WHITELIST: &[&str] = &["PATH", "HOME", "SSH_AUTH_SOCK", "GIT_SSH_COMMAND"];

/// Name and email used for commits and annotated tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitIdentity {
  pub name: String,
  pub email: String,
}

/// Git backend using system git (zero crate dependencies)
#[derive(Debug, Clone)]
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,

  identity: Option<GitIdentity>,

  timeout: Duration,
}

impl SystemGit {
  /// Open a git repository
  pub fn open(path: &Path) -> ReleaseResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ReleaseError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ReleaseError::message(format!("Failed to open git repository: {}", stderr)));
    }

    Ok(Self {
      repo_path: path.to_path_buf(),
      identity: None,
      timeout: DEFAULT_TIMEOUT,
    })
  }

  /// Commit and tag as this identity instead of the ambient git config
  pub fn with_identity(mut self, identity: Option<GitIdentity>) -> Self {
    self.identity = identity;
    self
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> ReleaseResult<String> {
    let output = self.run(&["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Run git and return its output regardless of exit status
  pub(crate) fn output(&self, args: &[&str]) -> ReleaseResult<Output> {
    let mut cmd = self.git_cmd();
    cmd.args(args);
    let label = format!("git {}", args.join(" "));
    process::run(cmd, self.timeout, &label)
  }

  /// Run git, turning a failure status into [`GitError::CommandFailed`]
  pub(crate) fn run(&self, args: &[&str]) -> ReleaseResult<Output> {
    let output = self.output(args)?;
    if !output.status.success() {
      return Err(ReleaseError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }));
    }
    Ok(output)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists PATH, HOME and the SSH agent variables
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    // Set working directory
    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    for key in ENV_WHITELIST {
      if let Ok(value) = std::env::var(key) {
        cmd.env(key, value);
      }
    }
    // Never block on a credential prompt in CI
    cmd.env("GIT_TERMINAL_PROMPT", "0");

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII
    cmd.arg("-c").arg("tag.gpgSign=false");

    if let Some(identity) = &self.identity {
      cmd.arg("-c").arg(format!("user.name={}", identity.name));
      cmd.arg("-c").arg(format!("user.email={}", identity.email));
    }

    cmd
  }
}
