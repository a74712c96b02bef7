//! Mapping from project ids to files on disk

use crate::core::config::{PROJECT_PLACEHOLDER, WorkspaceConfig};
use crate::core::error::{ConfigError, ReleaseResult, ResultExt};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Resolves manifest and README paths for projects under one root
#[derive(Debug, Clone)]
pub struct ProjectLayout {
  projects_root: PathBuf,
  manifest_pattern: String,
  readme_name: String,
}

impl ProjectLayout {
  /// `projects_root` is taken relative to `repo_root` unless absolute
  pub fn new(repo_root: &Path, config: &WorkspaceConfig) -> Self {
    Self {
      projects_root: repo_root.join(&config.projects_root),
      manifest_pattern: config.manifest.clone(),
      readme_name: config.readme.clone(),
    }
  }

  pub fn projects_root(&self) -> &Path {
    &self.projects_root
  }

  pub fn manifest_path(&self, project: &str) -> PathBuf {
    self
      .projects_root
      .join(self.manifest_pattern.replace(PROJECT_PLACEHOLDER, project))
  }

  /// README next to the project's manifest
  pub fn readme_path(&self, project: &str) -> PathBuf {
    let manifest = self.manifest_path(project);
    match manifest.parent() {
      Some(dir) => dir.join(&self.readme_name),
      None => PathBuf::from(&self.readme_name),
    }
  }

  /// README file name as referenced from inside the manifest
  pub fn readme_name(&self) -> &str {
    &self.readme_name
  }

  /// Every project id whose manifest exists
  ///
  /// Candidates are the entries of the projects root: directory names, plus
  /// file names matching a flat pattern such as `{project}.csproj`.
  pub fn discover_projects(&self) -> ReleaseResult<BTreeSet<String>> {
    if !self.projects_root.is_dir() {
      return Err(
        ConfigError::Invalid {
          reason: format!("projects root {} is not a directory", self.projects_root.display()),
        }
        .into(),
      );
    }

    let entries = std::fs::read_dir(&self.projects_root)
      .with_context(|| format!("Failed to list {}", self.projects_root.display()))?;

    let mut projects = BTreeSet::new();
    for entry in entries {
      let entry = entry?;
      let Some(name) = entry.file_name().to_str().map(str::to_string) else {
        continue;
      };
      let candidate = if entry.file_type()?.is_dir() {
        Some(name)
      } else {
        self.project_from_file_name(&name)
      };
      if let Some(project) = candidate
        && self.manifest_path(&project).is_file()
      {
        projects.insert(project);
      }
    }

    tracing::debug!(count = projects.len(), root = %self.projects_root.display(), "discovered projects");
    Ok(projects)
  }

  fn project_from_file_name(&self, name: &str) -> Option<String> {
    if self.manifest_pattern.contains('/') {
      return None;
    }
    let (prefix, suffix) = self.manifest_pattern.split_once(PROJECT_PLACEHOLDER)?;
    name
      .strip_prefix(prefix)?
      .strip_suffix(suffix)
      .filter(|p| !p.is_empty())
      .map(str::to_string)
  }
}
