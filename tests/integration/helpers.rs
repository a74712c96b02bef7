//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Environment variables the CLI reads as fallbacks; cleared so the host CI
/// environment cannot leak into a test
const CLI_ENV: &[&str] = &[
  "PR_TITLE",
  "PR_BODY",
  "LIB_PATH",
  "GITHUB_HEAD_REF",
  "BOT_NAME",
  "BOT_MAIL",
  "NUGET_REGISTRY",
  "RUST_LOG",
];

/// Config used by most tests: no registry, no GitHub
pub const LOCAL_ONLY_CONFIG: &str = r#"[github]
enabled = false
"#;

/// A clone with a bare `origin` next to it
pub struct TestRepo {
  _root: TempDir,
  pub path: PathBuf,
  pub origin: PathBuf,
}

impl TestRepo {
  /// Create a repository with an initial commit pushed to origin/main
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let origin = root.path().join("origin.git");
    let path = root.path().join("work");
    std::fs::create_dir_all(&origin)?;
    std::fs::create_dir_all(&path)?;

    git(&origin, &["init", "--bare", "--initial-branch=main"])?;
    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["remote", "add", "origin", &origin.to_string_lossy()])?;

    std::fs::write(path.join("README.md"), "# test monorepo\n")?;
    std::fs::write(path.join("monorel.toml"), LOCAL_ONLY_CONFIG)?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial commit"])?;
    git(&path, &["push", "-u", "origin", "main"])?;

    Ok(Self {
      _root: root,
      path,
      origin,
    })
  }

  /// Add `src/<name>/<name>.csproj`, optionally with a `Version`
  pub fn add_project(&self, name: &str, version: Option<&str>) -> Result<PathBuf> {
    let dir = self.path.join("src").join(name);
    std::fs::create_dir_all(&dir)?;

    let version_line = version
      .map(|v| format!("    <Version>{}</Version>\n", v))
      .unwrap_or_default();
    let manifest = format!(
      r#"<Project Sdk="Microsoft.NET.Sdk">

  <PropertyGroup>
    <TargetFramework>net8.0</TargetFramework>
    <!-- keep nullable on -->
    <Nullable>enable</Nullable>
{}  </PropertyGroup>

</Project>
"#,
      version_line
    );
    let path = dir.join(format!("{}.csproj", name));
    std::fs::write(&path, manifest)?;
    Ok(path)
  }

  pub fn write_config(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("monorel.toml"), content)?;
    Ok(())
  }

  /// Commit everything and push to origin
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;
    git(&self.path, &["push", "origin", "main"])?;
    self.head()
  }

  pub fn head(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Subject of the latest commit on origin/main
  pub fn origin_head_subject(&self) -> Result<String> {
    let output = git(&self.origin, &["log", "-1", "--format=%s", "main"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Get git log subjects, newest first
  pub fn git_log(&self, n: usize) -> Result<Vec<String>> {
    let output = git(&self.path, &["log", &format!("-{}", n), "--format=%s"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  pub fn local_tag_exists(&self, tag: &str) -> Result<bool> {
    let output = git(&self.path, &["tag", "--list", tag])?;
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
  }

  pub fn remote_tag_exists(&self, tag: &str) -> Result<bool> {
    let output = git(&self.origin, &["tag", "--list", tag])?;
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
  }

  /// Check if a file exists
  pub fn file_exists(&self, path: &str) -> bool {
    self.path.join(path).exists()
  }

  /// Read a file
  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run monorel and return its output whatever the exit status
pub fn monorel(cwd: &Path, args: &[&str]) -> Result<Output> {
  let mut cmd = Command::new(env!("CARGO_BIN_EXE_monorel"));
  cmd.current_dir(cwd).args(args);
  for var in CLI_ENV {
    cmd.env_remove(var);
  }
  cmd.output().context("Failed to run monorel")
}

/// Run monorel CLI command, failing on a non-zero exit
pub fn run_monorel(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = monorel(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "monorel command failed: monorel {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}
