//! Semantic version engine
//!
//! Strict `major.minor.patch` parsing and the three bump operations. No I/O:
//! callers read the old version out of a manifest and hand it in here.

use crate::core::error::{ParseError, VersionError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `major.minor.patch` version
///
/// Ordering is the lexicographic comparison of the triple, which the derived
/// `Ord` gives us from field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SemVer {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
}

impl SemVer {
  pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
    Self { major, minor, patch }
  }

  /// Apply a bump, resetting every lower component to zero
  ///
  /// Fails when the bumped component would overflow.
  pub fn bump(self, kind: BumpKind) -> Result<Self, VersionError> {
    let next = |n: u64| {
      n.checked_add(1).ok_or_else(|| VersionError::Malformed {
        value: self.to_string(),
      })
    };
    Ok(match kind {
      BumpKind::Major => Self::new(next(self.major)?, 0, 0),
      BumpKind::Minor => Self::new(self.major, next(self.minor)?, 0),
      BumpKind::Patch => Self::new(self.major, self.minor, next(self.patch)?),
    })
  }
}

/// Free-function form of [`SemVer::bump`]
pub fn bump(old: SemVer, kind: BumpKind) -> Result<SemVer, VersionError> {
  old.bump(kind)
}

impl FromStr for SemVer {
  type Err = VersionError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let malformed = || VersionError::Malformed { value: s.to_string() };
    let trimmed = s.trim();

    let mut parts = trimmed.split('.');
    let mut next = || -> Result<u64, VersionError> {
      let part = parts.next().ok_or_else(malformed)?;
      // u64::from_str accepts a leading '+', which is not a version digit
      if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
      }
      part.parse().map_err(|_| malformed())
    };

    let version = SemVer::new(next()?, next()?, next()?);
    if parts.next().is_some() {
      return Err(malformed());
    }
    Ok(version)
  }
}

impl fmt::Display for SemVer {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
  }
}

impl Serialize for SemVer {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for SemVer {
  fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
  }
}

/// Semantic-version increment category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpKind {
  Major,
  Minor,
  Patch,
}

impl BumpKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      BumpKind::Major => "major",
      BumpKind::Minor => "minor",
      BumpKind::Patch => "patch",
    }
  }
}

impl FromStr for BumpKind {
  type Err = ParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "major" => Ok(BumpKind::Major),
      "minor" => Ok(BumpKind::Minor),
      "patch" => Ok(BumpKind::Patch),
      _ => Err(ParseError::InvalidBumpKind { word: s.to_string() }),
    }
  }
}

impl fmt::Display for BumpKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}
