//! Release plans parsed from pull-request text
//!
//! A [`ReleasePlan`] is built once per PR event and is read-only afterwards.
//! Parsing is pure: the set of projects that have a manifest is passed in, so
//! nothing here touches the filesystem.
//!
//! - **title**: `<project> <bump>` pairs
//! - **body**: per-project changelog blocks
//! - **target**: a plan entry resolved against its manifest
//! - **artifact**: the JSON document handed to later stages and to `rollback`

mod artifact;
mod body;
mod target;
mod title;

pub use artifact::{ArtifactTarget, PlanArtifact, PlanId};
pub use target::{ReleaseTarget, resolve_targets, tag_name};

use crate::core::error::ParseError;
use crate::version::BumpKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Per-project release intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRelease {
  project: String,
  bump: BumpKind,
  changelog: Vec<String>,
}

impl ProjectRelease {
  pub fn new(project: impl Into<String>, bump: BumpKind, changelog: Vec<String>) -> Self {
    Self {
      project: project.into(),
      bump,
      changelog,
    }
  }

  pub fn project(&self) -> &str {
    &self.project
  }

  pub fn bump(&self) -> BumpKind {
    self.bump
  }

  pub fn changelog(&self) -> &[String] {
    &self.changelog
  }
}

/// Ordered, validated set of project releases
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ReleasePlan {
  releases: Vec<ProjectRelease>,
}

impl ReleasePlan {
  /// Build a plan, rejecting duplicate project ids
  pub fn new(releases: Vec<ProjectRelease>) -> Result<Self, ParseError> {
    let mut seen = HashSet::new();
    for release in &releases {
      if release.project.is_empty() {
        return Err(ParseError::InvalidTitlePair { segment: String::new() });
      }
      if !seen.insert(release.project.as_str()) {
        return Err(ParseError::DuplicateProject {
          project: release.project.clone(),
        });
      }
    }
    Ok(Self { releases })
  }

  pub fn releases(&self) -> &[ProjectRelease] {
    &self.releases
  }

  pub fn iter(&self) -> impl Iterator<Item = &ProjectRelease> {
    self.releases.iter()
  }

  pub fn len(&self) -> usize {
    self.releases.len()
  }

  pub fn is_empty(&self) -> bool {
    self.releases.is_empty()
  }

  pub fn get(&self, project: &str) -> Option<&ProjectRelease> {
    self.releases.iter().find(|r| r.project == project)
  }
}

/// Title conventions that vary between repositories
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions<'a> {
  /// Stripped from the start of the title (e.g. `nuget:`)
  pub title_prefix: Option<&'a str>,
  /// Project used when the title is a lone bump word
  pub default_project: Option<&'a str>,
}

/// Parse PR title and body into a validated plan
///
/// `known_projects` is the set of project ids that have a manifest on disk.
pub fn parse(
  title: &str,
  body: &str,
  known_projects: &BTreeSet<String>,
  options: &ParseOptions<'_>,
) -> Result<ReleasePlan, ParseError> {
  let entries = title::parse_title(title, options.title_prefix, options.default_project)?;
  let skeleton = ReleasePlan::new(
    entries
      .iter()
      .map(|e| ProjectRelease::new(e.project.clone(), e.bump, Vec::new()))
      .collect(),
  )?;

  let projects: Vec<&str> = skeleton.iter().map(ProjectRelease::project).collect();
  let mut changelog = body::parse_body(body, &projects)?;

  if !changelog.orphans.is_empty() {
    if let [only] = projects.as_slice() {
      let block = changelog.blocks.entry(only.to_string()).or_default();
      let mut merged = std::mem::take(&mut changelog.orphans);
      merged.append(block);
      *block = merged;
    } else {
      tracing::warn!(
        count = changelog.orphans.len(),
        "ignoring changelog entries that precede any project header"
      );
    }
  }

  let mut releases = Vec::with_capacity(skeleton.len());
  for release in skeleton.releases {
    if !known_projects.contains(&release.project) {
      return Err(ParseError::ManifestNotFound {
        project: release.project,
      });
    }
    let lines = changelog.blocks.remove(&release.project).unwrap_or_default();
    releases.push(ProjectRelease::new(release.project, release.bump, lines));
  }

  ReleasePlan::new(releases)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn known(projects: &[&str]) -> BTreeSet<String> {
    projects.iter().map(|p| p.to_string()).collect()
  }

  #[test]
  fn test_two_projects_in_title_order() {
    let body = "projB\n- fixed parser\nprojA\n- breaking: new API\n- removed old API\n";
    let plan = parse("projA major, projB patch", body, &known(&["projA", "projB"]), &ParseOptions::default()).unwrap();

    assert_eq!(plan.len(), 2);
    let a = &plan.releases()[0];
    let b = &plan.releases()[1];
    assert_eq!((a.project(), a.bump()), ("projA", BumpKind::Major));
    assert_eq!(a.changelog(), ["breaking: new API", "removed old API"]);
    assert_eq!((b.project(), b.bump()), ("projB", BumpKind::Patch));
    assert_eq!(b.changelog(), ["fixed parser"]);
  }

  #[test]
  fn test_title_only_project_gets_empty_changelog() {
    let plan = parse("projA minor, projB patch", "projA\n- one", &known(&["projA", "projB"]), &ParseOptions::default()).unwrap();
    assert!(plan.get("projB").unwrap().changelog().is_empty());
  }

  #[test]
  fn test_body_project_missing_from_title() {
    let err = parse("projA minor", "projC\n- nope", &known(&["projA", "projC"]), &ParseOptions::default()).unwrap_err();
    assert_eq!(
      err,
      ParseError::UnknownProjectInBody {
        project: "projC".to_string()
      }
    );
  }

  #[test]
  fn test_duplicate_project() {
    let err = parse("projA minor, projA patch", "", &known(&["projA"]), &ParseOptions::default()).unwrap_err();
    assert_eq!(
      err,
      ParseError::DuplicateProject {
        project: "projA".to_string()
      }
    );
  }

  #[test]
  fn test_missing_manifest() {
    let err = parse("projA minor, ghost patch", "", &known(&["projA"]), &ParseOptions::default()).unwrap_err();
    assert_eq!(
      err,
      ParseError::ManifestNotFound {
        project: "ghost".to_string()
      }
    );
  }

  #[test]
  fn test_single_project_body_is_a_plain_list() {
    let options = ParseOptions {
      title_prefix: Some("app:"),
      default_project: Some("Lionk.App"),
    };
    let plan = parse("app: patch", "- first\n- second\n", &known(&["Lionk.App"]), &options).unwrap();
    assert_eq!(plan.releases()[0].changelog(), ["first", "second"]);
  }

  #[test]
  fn test_orphans_precede_block_entries_for_single_project() {
    let plan = parse("projA minor", "- loose\nprojA\n- grouped", &known(&["projA"]), &ParseOptions::default()).unwrap();
    assert_eq!(plan.releases()[0].changelog(), ["loose", "grouped"]);
  }

  #[test]
  fn test_orphans_ignored_for_multi_project() {
    let plan = parse("projA minor, projB patch", "- loose\nprojB\n- b", &known(&["projA", "projB"]), &ParseOptions::default()).unwrap();
    assert!(plan.get("projA").unwrap().changelog().is_empty());
    assert_eq!(plan.get("projB").unwrap().changelog(), ["b"]);
  }

  #[test]
  fn test_plan_serializes_as_list() {
    let plan = ReleasePlan::new(vec![ProjectRelease::new("Core", BumpKind::Minor, vec!["x".into()])]).unwrap();
    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json, serde_json::json!([{ "project": "Core", "bump": "minor", "changelog": ["x"] }]));
  }
}
