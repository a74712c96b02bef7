//! Plan artifact persisted for later stages and manual recovery

use super::ReleaseTarget;
use crate::core::error::{ReleaseResult, ResultExt};
use crate::utils::display_relative;
use crate::version::{BumpKind, SemVer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::Path;

/// Plan identifier (SHA256 of the PR title and body)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
  /// Create a plan ID from plan contents
  pub fn from_contents(contents: &[u8]) -> Self {
    let mut hasher = Sha256::new();
    hasher.update(contents);
    let result = hasher.finalize();
    Self(format!("{:x}", result))
  }

  /// Identify a plan by the PR text it came from
  pub fn from_pr(title: &str, body: &str) -> Self {
    let mut contents = Vec::with_capacity(title.len() + body.len() + 1);
    contents.extend_from_slice(title.as_bytes());
    contents.push(0);
    contents.extend_from_slice(body.as_bytes());
    Self::from_contents(&contents)
  }

  /// Get the short ID (first 12 characters)
  pub fn short(&self) -> &str {
    &self.0[..12.min(self.0.len())]
  }
}

impl fmt::Display for PlanId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.short())
  }
}

/// Summary of one resolved target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactTarget {
  pub project: String,
  /// Manifest path relative to the repository root
  pub manifest: String,
  pub bump: BumpKind,
  pub old_version: SemVer,
  pub new_version: SemVer,
  pub tag: String,
  pub changelog: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanArtifact {
  pub plan_id: PlanId,
  pub created_at: DateTime<Utc>,
  pub targets: Vec<ArtifactTarget>,
}

impl PlanArtifact {
  pub fn new(plan_id: PlanId, targets: &[ReleaseTarget], repo_root: &Path) -> Self {
    Self {
      plan_id,
      created_at: Utc::now(),
      targets: targets
        .iter()
        .map(|t| ArtifactTarget {
          project: t.project.clone(),
          manifest: display_relative(&t.manifest_path, repo_root),
          bump: t.bump,
          old_version: t.old_version,
          new_version: t.new_version,
          tag: t.tag.clone(),
          changelog: t.changelog.clone(),
        })
        .collect(),
    }
  }

  pub fn to_json(&self) -> ReleaseResult<String> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  pub fn write(&self, path: &Path) -> ReleaseResult<()> {
    let json = self.to_json()?;
    std::fs::write(path, json + "\n").with_context(|| format!("Failed to write plan artifact {}", path.display()))?;
    tracing::info!(path = %path.display(), plan = %self.plan_id, "wrote plan artifact");
    Ok(())
  }

  pub fn read(path: &Path) -> ReleaseResult<Self> {
    let content =
      std::fs::read_to_string(path).with_context(|| format!("Failed to read plan artifact {}", path.display()))?;
    let artifact = serde_json::from_str(&content)
      .with_context(|| format!("Failed to parse plan artifact {}", path.display()))?;
    Ok(artifact)
  }
}
