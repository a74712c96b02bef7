//! Resolution of plan entries against their manifests

use super::{ProjectRelease, ReleasePlan};
use crate::core::config::ManifestConfig;
use crate::core::error::{ReleaseResult, ResultExt};
use crate::core::layout::ProjectLayout;
use crate::manifest::{self, ManifestPatch, ReadVersionError, notes};
use crate::version::{BumpKind, SemVer};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Tag marking a project release: `<project>_<version>`
pub fn tag_name(project: &str, version: SemVer) -> String {
  format!("{}_{}", project, version)
}

/// One project's unit of work for a release run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseTarget {
  pub project: String,
  pub manifest_path: PathBuf,
  pub bump: BumpKind,
  pub old_version: SemVer,
  pub new_version: SemVer,
  pub changelog: Vec<String>,
  pub patch: ManifestPatch,
  pub tag: String,
}

impl ReleaseTarget {
  /// Read the manifest and compute the new version, notes and tag
  ///
  /// Reads only; a manifest without a `Version` starts from 0.0.0.
  pub fn resolve(release: &ProjectRelease, layout: &ProjectLayout, config: &ManifestConfig) -> ReleaseResult<Self> {
    let project = release.project();
    let manifest_path = layout.manifest_path(project);
    let (_, doc) = manifest::load(&manifest_path)?;

    let old_version = match manifest::read_version(&doc) {
      Ok(version) => version.unwrap_or_default(),
      Err(ReadVersionError::Manifest(e)) => return Err(e.at(&manifest_path).into()),
      Err(ReadVersionError::Version(e)) => return Err(e.in_manifest(&manifest_path).into()),
    };
    let new_version = old_version
      .bump(release.bump())
      .map_err(|e| e.in_manifest(&manifest_path))?;

    let readme_path = layout.readme_path(project);
    let has_readme = readme_path.is_file();
    let readme_content = if has_readme && config.append_readme_to_notes {
      Some(
        std::fs::read_to_string(&readme_path)
          .with_context(|| format!("Failed to read {}", readme_path.display()))?,
      )
    } else {
      None
    };

    let release_notes = notes::render_notes(
      new_version,
      release.changelog(),
      config.notes_header.as_deref(),
      readme_content.as_deref(),
    );

    Ok(Self {
      project: project.to_string(),
      bump: release.bump(),
      old_version,
      new_version,
      changelog: release.changelog().to_vec(),
      patch: ManifestPatch {
        project: project.to_string(),
        new_version,
        release_notes,
        readme_path: has_readme.then(|| layout.readme_name().to_string()),
      },
      tag: tag_name(project, new_version),
      manifest_path,
    })
  }
}

/// Resolve every plan entry, in plan order
pub fn resolve_targets(
  plan: &ReleasePlan,
  layout: &ProjectLayout,
  config: &ManifestConfig,
) -> ReleaseResult<Vec<ReleaseTarget>> {
  plan
    .iter()
    .map(|release| ReleaseTarget::resolve(release, layout, config))
    .collect()
}
