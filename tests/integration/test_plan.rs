//! Integration tests for `monorel plan`

use crate::helpers::{TestRepo, monorel, run_monorel};
use anyhow::Result;

#[test]
fn test_plan_json_output() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.2.3"))?;
  repo.add_project("Utils", None)?;
  repo.commit("Add projects")?;

  let output = run_monorel(
    &repo.path,
    &[
      "plan",
      "--title",
      "Core minor, Utils patch",
      "--body",
      "Utils\n- first cut\nCore\n- Added parser\n- Fixed typo",
      "--json",
    ],
  )?;

  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  let targets = json["targets"].as_array().expect("targets array");
  assert_eq!(targets.len(), 2);

  assert_eq!(targets[0]["project"], "Core");
  assert_eq!(targets[0]["old_version"], "1.2.3");
  assert_eq!(targets[0]["new_version"], "1.3.0");
  assert_eq!(targets[0]["tag"], "Core_1.3.0");
  assert_eq!(targets[0]["manifest"], "src/Core/Core.csproj");
  assert_eq!(targets[0]["changelog"], serde_json::json!(["Added parser", "Fixed typo"]));

  assert_eq!(targets[1]["project"], "Utils");
  assert_eq!(targets[1]["old_version"], "0.0.0");
  assert_eq!(targets[1]["new_version"], "0.0.1");

  Ok(())
}

#[test]
fn test_plan_is_read_only() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.2.3"))?;
  repo.commit("Add Core")?;
  let before = repo.read_file("src/Core/Core.csproj")?;

  run_monorel(&repo.path, &["plan", "--title", "Core major"])?;

  assert_eq!(repo.read_file("src/Core/Core.csproj")?, before);
  assert!(!repo.local_tag_exists("Core_2.0.0")?);
  Ok(())
}

#[test]
fn test_plan_writes_artifact() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("0.9.0"))?;
  repo.commit("Add Core")?;

  let output = run_monorel(
    &repo.path,
    &["plan", "--title", "Core major", "--output", "plan.json"],
  )?;
  assert!(String::from_utf8_lossy(&output.stdout).contains("Core_1.0.0"));

  let artifact: serde_json::Value = serde_json::from_str(&repo.read_file("plan.json")?)?;
  assert_eq!(artifact["targets"][0]["tag"], "Core_1.0.0");
  assert!(artifact["plan_id"].as_str().is_some_and(|id| id.len() == 64));
  Ok(())
}

#[test]
fn test_plan_unknown_body_project_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.0.0"))?;
  repo.commit("Add Core")?;

  let output = monorel(
    &repo.path,
    &["plan", "--title", "Core patch", "--body", "Utils\n- sneaky change"],
  )?;

  assert_eq!(output.status.code(), Some(1));
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Project 'Utils' from the pull request body is not in the title"));
  assert!(stderr.contains("💡 Help:"));
  Ok(())
}

#[test]
fn test_plan_missing_manifest_fails() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.0.0"))?;
  repo.commit("Add Core")?;

  let output = monorel(&repo.path, &["plan", "--title", "Ghost minor"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("Project file not found for 'Ghost'"));
  Ok(())
}

#[test]
fn test_plan_title_prefix_and_default_project() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.2.3"))?;
  repo.write_config(
    r#"[pr]
title_prefix = "nuget:"
default_project = "Core"

[github]
enabled = false
"#,
  )?;
  repo.commit("Configure monorel")?;

  let output = run_monorel(
    &repo.path,
    &["plan", "--title", "NuGet: minor", "--body", "- tidy up", "--json"],
  )?;
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(json["targets"][0]["project"], "Core");
  assert_eq!(json["targets"][0]["new_version"], "1.3.0");
  assert_eq!(json["targets"][0]["changelog"], serde_json::json!(["tidy up"]));
  Ok(())
}

#[test]
fn test_plan_reads_environment() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.add_project("Core", Some("1.0.0"))?;
  repo.commit("Add Core")?;

  let output = std::process::Command::new(env!("CARGO_BIN_EXE_monorel"))
    .current_dir(&repo.path)
    .args(["plan", "--json"])
    .env("PR_TITLE", "Core patch")
    .env("PR_BODY", "Core\n- from env")
    .env_remove("LIB_PATH")
    .output()?;

  assert!(output.status.success());
  let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(json["targets"][0]["new_version"], "1.0.1");
  assert_eq!(json["targets"][0]["changelog"], serde_json::json!(["from env"]));
  Ok(())
}
