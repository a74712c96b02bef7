//! Integration tests for `monorel release`

use crate::helpers::{TestRepo, monorel, run_monorel};
use anyhow::Result;

#[test]
fn test_release_dry_run_changes_nothing() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.2.3"))?;
  let head = repo.commit("Add Core")?;
  let before = repo.read_file("src/Core/Core.csproj")?;

  let output = run_monorel(
    &repo.path,
    &["release", "--title", "Core minor", "--body", "Core\n- Added parser", "--dry-run"],
  )?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("Dry-run mode"));
  assert!(stdout.contains("Core_1.3.0"));

  assert_eq!(repo.read_file("src/Core/Core.csproj")?, before);
  assert_eq!(repo.head()?, head);
  assert!(!repo.local_tag_exists("Core_1.3.0")?);
  assert!(!repo.file_exists("release-plan.json"));
  Ok(())
}

#[test]
fn test_release_commits_tags_and_pushes() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", None)?;
  repo.add_project("Utils", Some("2.0.0"))?;
  repo.commit("Add projects")?;

  run_monorel(
    &repo.path,
    &[
      "release",
      "--title",
      "Core minor, Utils patch",
      "--body",
      "Core\n- first release\nUtils\n- fixed rounding",
    ],
  )?;

  let core = repo.read_file("src/Core/Core.csproj")?;
  assert!(core.contains("<Version>0.1.0</Version>"));
  assert!(core.contains("<PackageReleaseNotes>- first release</PackageReleaseNotes>"));
  assert!(core.contains("<!-- keep nullable on -->"), "unrelated content survives");

  let utils = repo.read_file("src/Utils/Utils.csproj")?;
  assert!(utils.contains("<Version>2.0.1</Version>"));
  assert!(!utils.contains("2.0.0"));

  for tag in ["Core_0.1.0", "Utils_2.0.1"] {
    assert!(repo.local_tag_exists(tag)?, "{tag} missing locally");
    assert!(repo.remote_tag_exists(tag)?, "{tag} missing on origin");
  }

  assert_eq!(repo.git_log(1)?, ["Update project versions"]);
  assert_eq!(repo.origin_head_subject()?, "Update project versions");
  assert!(repo.file_exists("release-plan.json"));
  assert!(!repo.file_exists("src/Core/Core.csproj.bkp"));
  assert!(!repo.file_exists("src/Utils/Utils.csproj.bkp"));
  Ok(())
}

#[test]
fn test_release_uses_bot_identity() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.0.0"))?;
  repo.commit("Add Core")?;

  run_monorel(
    &repo.path,
    &[
      "release",
      "--title",
      "Core patch",
      "--bot-name",
      "release-bot",
      "--bot-email",
      "bot@example.com",
      "--no-artifact",
    ],
  )?;

  let output = crate::helpers::git(&repo.path, &["log", "-1", "--format=%an <%ae>"])?;
  assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "release-bot <bot@example.com>");
  assert!(!repo.file_exists("release-plan.json"));
  Ok(())
}

#[test]
fn test_release_publish_failure_compensates() -> Result<()> {
  let repo = TestRepo::new()?;
  let manifest = repo.add_project("Core", None)?;
  repo.write_config(
    r#"[publish]
kind = "command"
command = ["false"]

[github]
enabled = false
"#,
  )?;
  repo.commit("Add Core")?;
  let original = std::fs::read(&manifest)?;

  let output = monorel(
    &repo.path,
    &["release", "--title", "Core minor", "--body", "Core\n- first release"],
  )?;

  assert_eq!(output.status.code(), Some(2), "publish failure is a system error");
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Release failed at stage 'publish_package' for Core"));

  assert!(!repo.local_tag_exists("Core_0.1.0")?);
  assert!(!repo.remote_tag_exists("Core_0.1.0")?);
  assert_eq!(std::fs::read(&manifest)?, original, "manifest bytes restored");
  assert_eq!(repo.git_log(2)?, ["Restore project versions", "Update project versions"]);
  assert_eq!(repo.origin_head_subject()?, "Restore project versions");
  assert!(!repo.file_exists("src/Core/Core.csproj.bkp"));
  Ok(())
}

#[test]
fn test_release_publish_command_placeholders() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.2.3"))?;
  repo.write_config(
    r#"[publish]
kind = "command"
command = ["sh", "-c", "echo \"$0 $1 $2\" > published.txt", "{project}", "{version}", "{tag}"]

[github]
enabled = false
"#,
  )?;
  repo.commit("Add Core")?;

  run_monorel(&repo.path, &["release", "--title", "Core minor"])?;

  assert_eq!(repo.read_file("published.txt")?, "Core 1.3.0 Core_1.3.0\n");
  assert!(repo.remote_tag_exists("Core_1.3.0")?);
  Ok(())
}

#[test]
fn test_release_existing_tag_fails_fast() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.2.3"))?;
  let head = repo.commit("Add Core")?;
  crate::helpers::git(&repo.path, &["tag", "Core_1.3.0"])?;
  let before = repo.read_file("src/Core/Core.csproj")?;

  let output = monorel(&repo.path, &["release", "--title", "Core minor"])?;

  assert_eq!(output.status.code(), Some(3));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Tag 'Core_1.3.0' already exists"));
  assert_eq!(repo.read_file("src/Core/Core.csproj")?, before);
  assert_eq!(repo.head()?, head);
  assert!(!repo.file_exists("src/Core/Core.csproj.bkp"));
  Ok(())
}

#[test]
fn test_release_remote_tag_fails_fast() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.2.3"))?;
  let head = repo.commit("Add Core")?;
  crate::helpers::git(&repo.path, &["tag", "Core_1.2.4"])?;
  crate::helpers::git(&repo.path, &["push", "origin", "Core_1.2.4"])?;
  crate::helpers::git(&repo.path, &["tag", "-d", "Core_1.2.4"])?;

  let output = monorel(&repo.path, &["release", "--title", "Core patch"])?;

  assert_eq!(output.status.code(), Some(3));
  assert_eq!(repo.head()?, head);
  Ok(())
}

#[test]
fn test_release_missing_api_key_fails_before_mutation() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.0.0"))?;
  repo.write_config(
    r#"[publish]
kind = "nuget"
api_key_env = "MONOREL_IT_KEY_THAT_IS_NEVER_SET"

[github]
enabled = false
"#,
  )?;
  let head = repo.commit("Add Core")?;

  let output = monorel(&repo.path, &["release", "--title", "Core patch"])?;

  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("MONOREL_IT_KEY_THAT_IS_NEVER_SET"));
  assert_eq!(repo.head()?, head);
  assert!(!repo.local_tag_exists("Core_1.0.1")?);
  Ok(())
}

#[test]
fn test_release_refuses_to_overwrite_leftover_backup() -> Result<()> {
  let repo = TestRepo::new()?;
  let manifest = repo.add_project("Core", Some("1.2.3"))?;
  let head = repo.commit("Add Core")?;
  std::fs::write(repo.path.join("src/Core/Core.csproj.bkp"), "pre-release bytes")?;
  let before = std::fs::read(&manifest)?;

  let output = monorel(&repo.path, &["release", "--title", "Core minor"])?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Leftover backup"));
  assert!(stderr.contains("monorel rollback"));
  assert_eq!(repo.read_file("src/Core/Core.csproj.bkp")?, "pre-release bytes");
  assert_eq!(std::fs::read(&manifest)?, before);
  assert_eq!(repo.head()?, head);
  assert!(!repo.local_tag_exists("Core_1.3.0")?);
  Ok(())
}
