//! `monorel bump`

use crate::core::error::ReleaseResult;
use crate::version::{BumpKind, SemVer};

/// Print `version` bumped by `kind`
pub fn run_bump(version: &str, kind: &str) -> ReleaseResult<()> {
  let version: SemVer = version.parse()?;
  let kind: BumpKind = kind.parse()?;
  println!("{}", version.bump(kind)?);
  Ok(())
}
