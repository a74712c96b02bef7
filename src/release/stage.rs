//! Pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stages of a release run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
  /// Side-effect-free checks (existing tags)
  Preflight,
  BackupManifests,
  ApplyPatches,
  CommitChanges,
  CreateTag,
  PublishPackage,
  PublishGithubRelease,
  Done,
}

impl Stage {
  /// Get the stage name as a string.
  pub fn name(&self) -> &'static str {
    match self {
      Stage::Preflight => "preflight",
      Stage::BackupManifests => "backup_manifests",
      Stage::ApplyPatches => "apply_patches",
      Stage::CommitChanges => "commit_changes",
      Stage::CreateTag => "create_tag",
      Stage::PublishPackage => "publish_package",
      Stage::PublishGithubRelease => "publish_github_release",
      Stage::Done => "done",
    }
  }
}

impl fmt::Display for Stage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_names_match_serde() {
    for stage in [Stage::BackupManifests, Stage::PublishGithubRelease, Stage::Done] {
      let json = serde_json::to_string(&stage).unwrap();
      assert_eq!(json, format!("\"{}\"", stage.name()));
    }
  }

  #[test]
  fn test_order_follows_pipeline() {
    assert!(Stage::Preflight < Stage::BackupManifests);
    assert!(Stage::CommitChanges < Stage::CreateTag);
    assert!(Stage::PublishPackage < Stage::PublishGithubRelease);
  }
}
