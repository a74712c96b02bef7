//! Integration tests for `monorel rollback`

use crate::helpers::{TestRepo, git, monorel, run_monorel};
use anyhow::Result;

#[test]
fn test_rollback_after_interrupted_run() -> Result<()> {
  let repo = TestRepo::new()?;
  let manifest = repo.add_project("Core", Some("1.2.3"))?;
  repo.commit("Add Core")?;
  let original = std::fs::read(&manifest)?;

  run_monorel(&repo.path, &["plan", "--title", "Core minor", "--output", "plan.json"])?;

  // What a run killed after tagging leaves behind
  std::fs::write(repo.path.join("src/Core/Core.csproj.bkp"), &original)?;
  let bumped = String::from_utf8(original.clone())?.replace("1.2.3", "1.3.0");
  std::fs::write(&manifest, bumped)?;
  git(&repo.path, &["add", "src/Core/Core.csproj"])?;
  git(&repo.path, &["commit", "-m", "Update project versions"])?;
  git(&repo.path, &["push", "origin", "main"])?;
  git(&repo.path, &["tag", "-a", "Core_1.3.0", "-m", "Release Core_1.3.0"])?;
  git(&repo.path, &["push", "origin", "refs/tags/Core_1.3.0"])?;

  let output = run_monorel(&repo.path, &["rollback", "--plan", "plan.json"])?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("Rolled back"));

  assert!(!repo.local_tag_exists("Core_1.3.0")?);
  assert!(!repo.remote_tag_exists("Core_1.3.0")?);
  assert_eq!(std::fs::read(&manifest)?, original);
  assert_eq!(repo.git_log(1)?, ["Restore project versions"]);
  assert_eq!(repo.origin_head_subject()?, "Restore project versions");
  assert!(!repo.file_exists("src/Core/Core.csproj.bkp"));
  Ok(())
}

#[test]
fn test_rollback_without_backups_only_deletes_tags() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.2.3"))?;
  repo.commit("Add Core")?;

  run_monorel(&repo.path, &["release", "--title", "Core patch"])?;
  assert!(repo.remote_tag_exists("Core_1.2.4")?);
  let head = repo.head()?;

  run_monorel(&repo.path, &["rollback"])?;

  assert!(!repo.local_tag_exists("Core_1.2.4")?);
  assert!(!repo.remote_tag_exists("Core_1.2.4")?);
  assert_eq!(repo.head()?, head, "nothing to restore without backups");
  Ok(())
}

#[test]
fn test_rollback_missing_artifact() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.2.3"))?;
  repo.commit("Add Core")?;

  let output = monorel(&repo.path, &["rollback", "--plan", "nope.json"])?;
  assert!(!output.status.success());
  assert!(String::from_utf8_lossy(&output.stderr).contains("nope.json"));
  Ok(())
}
