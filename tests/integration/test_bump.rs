//! Integration tests for `monorel bump`

use crate::helpers::{monorel, run_monorel};
use anyhow::Result;

#[test]
fn test_bump_prints_next_version() -> Result<()> {
  let dir = tempfile::TempDir::new()?;

  let output = run_monorel(dir.path(), &["bump", "1.2.3", "minor"])?;
  assert_eq!(String::from_utf8_lossy(&output.stdout), "1.3.0\n");

  let output = run_monorel(dir.path(), &["bump", "1.2.3", "MAJOR"])?;
  assert_eq!(String::from_utf8_lossy(&output.stdout), "2.0.0\n");

  Ok(())
}

#[test]
fn test_bump_rejects_bad_input() -> Result<()> {
  let dir = tempfile::TempDir::new()?;

  let output = monorel(dir.path(), &["bump", "1.2", "patch"])?;
  assert_eq!(output.status.code(), Some(3), "malformed version is a validation error");

  let output = monorel(dir.path(), &["bump", "18446744073709551615.0.0", "major"])?;
  assert_eq!(output.status.code(), Some(3), "overflowing bump is a validation error");

  let output = monorel(dir.path(), &["bump", "1.2.3", "huge"])?;
  assert_eq!(output.status.code(), Some(1), "bad bump word is a user error");
  assert!(String::from_utf8_lossy(&output.stderr).contains("huge"));

  Ok(())
}
