//! Package publishers
//!
//! - [`NugetPublisher`]: `dotnet pack` then `dotnet nuget push`, undone with
//!   `dotnet nuget delete`
//! - [`CommandPublisher`]: user-supplied argv templates

use super::ports::PackagePublisher;
use crate::core::config::{PublishConfig, PublishKind};
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult};
use crate::core::process;
use crate::plan::tag_name;
use crate::version::SemVer;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

/// Build the publisher selected by the configuration
///
/// Secrets are resolved here, so a missing API key fails before the pipeline
/// touches anything.
pub fn from_config(
  config: &PublishConfig,
  repo_root: &Path,
  timeout: Duration,
) -> ReleaseResult<Option<Box<dyn PackagePublisher>>> {
  match config.kind {
    PublishKind::None => Ok(None),
    PublishKind::Nuget => {
      let api_key = std::env::var(&config.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingSecret {
          env: config.api_key_env.clone(),
        })?;
      Ok(Some(Box::new(NugetPublisher {
        repo_root: repo_root.to_path_buf(),
        output_dir: repo_root.join(&config.output_dir),
        source: config.source.clone(),
        api_key,
        timeout,
      })))
    }
    PublishKind::Command => Ok(Some(Box::new(CommandPublisher {
      repo_root: repo_root.to_path_buf(),
      publish: config.command.clone(),
      unpublish: config.unpublish_command.clone(),
      timeout,
    }))),
  }
}

/// Publishes with the dotnet CLI
#[derive(Clone)]
pub struct NugetPublisher {
  repo_root: PathBuf,
  output_dir: PathBuf,
  source: String,
  api_key: String,
  timeout: Duration,
}

impl std::fmt::Debug for NugetPublisher {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("NugetPublisher")
      .field("output_dir", &self.output_dir)
      .field("source", &self.source)
      .finish_non_exhaustive()
  }
}

impl NugetPublisher {
  /// `<output>/<project>.<version>.nupkg`
  pub fn package_path(&self, project: &str, version: SemVer) -> PathBuf {
    self.output_dir.join(format!("{}.{}.nupkg", project, version))
  }

  fn dotnet(&self, args: &[&str]) -> ReleaseResult<()> {
    let mut cmd = Command::new("dotnet");
    cmd.args(args).current_dir(&self.repo_root);
    let label = process::describe(&cmd, &[&self.api_key]);
    println!("   $ {}", label);
    process::run_checked(cmd, self.timeout, &label)?;
    Ok(())
  }
}

impl PackagePublisher for NugetPublisher {
  fn publish(&mut self, project: &str, manifest: &Path, version: SemVer) -> ReleaseResult<()> {
    let manifest = manifest.to_string_lossy();
    let output_dir = self.output_dir.to_string_lossy().into_owned();
    self.dotnet(&["pack", &manifest, "-o", &output_dir])?;

    let package = self.package_path(project, version);
    if !package.is_file() {
      return Err(ReleaseError::with_help(
        format!("dotnet pack did not produce {}", package.display()),
        "Check that the package id matches the project directory name",
      ));
    }
    let package = package.to_string_lossy().into_owned();
    self.dotnet(&["nuget", "push", &package, "-k", &self.api_key, "-s", &self.source])
  }

  fn unpublish(&mut self, project: &str, _manifest: &Path, version: SemVer) -> ReleaseResult<()> {
    let version = version.to_string();
    self.dotnet(&[
      "nuget",
      "delete",
      project,
      &version,
      "-k",
      &self.api_key,
      "-s",
      &self.source,
      "--non-interactive",
    ])
  }
}

/// Runs configured argv templates
///
/// Placeholders: `{project}`, `{version}`, `{manifest}`, `{tag}`.
#[derive(Debug, Clone)]
pub struct CommandPublisher {
  repo_root: PathBuf,
  publish: Vec<String>,
  unpublish: Vec<String>,
  timeout: Duration,
}

impl CommandPublisher {
  pub fn new(repo_root: &Path, publish: Vec<String>, unpublish: Vec<String>, timeout: Duration) -> Self {
    Self {
      repo_root: repo_root.to_path_buf(),
      publish,
      unpublish,
      timeout,
    }
  }

  fn execute(&self, template: &[String], project: &str, manifest: &Path, version: SemVer) -> ReleaseResult<()> {
    let argv = expand(template, project, manifest, version);
    let Some((program, args)) = argv.split_first() else {
      return Err(ConfigError::MissingField {
        field: "publish.command".to_string(),
      }
      .into());
    };

    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(&self.repo_root);
    let label = process::describe(&cmd, &[]);
    println!("   $ {}", label);
    process::run_checked(cmd, self.timeout, &label)?;
    Ok(())
  }
}

impl PackagePublisher for CommandPublisher {
  fn publish(&mut self, project: &str, manifest: &Path, version: SemVer) -> ReleaseResult<()> {
    self.execute(&self.publish, project, manifest, version)
  }

  fn unpublish(&mut self, project: &str, manifest: &Path, version: SemVer) -> ReleaseResult<()> {
    if self.unpublish.is_empty() {
      return Err(ReleaseError::with_help(
        format!("Cannot unpublish {} {}: no unpublish command configured", project, version),
        "Remove the package from the registry by hand, or set publish.unpublish_command",
      ));
    }
    self.execute(&self.unpublish, project, manifest, version)
  }
}

/// Substitute placeholders in every argument
fn expand(template: &[String], project: &str, manifest: &Path, version: SemVer) -> Vec<String> {
  let version_text = version.to_string();
  let manifest_text = manifest.to_string_lossy();
  let tag = tag_name(project, version);
  template
    .iter()
    .map(|arg| {
      arg
        .replace("{project}", project)
        .replace("{version}", &version_text)
        .replace("{manifest}", &manifest_text)
        .replace("{tag}", &tag)
    })
    .collect()
}
