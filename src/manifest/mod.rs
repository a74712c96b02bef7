//! Project manifest handling (MSBuild project files)
//!
//! - **document**: lossless XML tree with byte-exact round trip
//! - **update**: idempotent version / release-notes / readme edits
//! - **notes**: changelog rendering

pub mod document;
pub mod notes;
pub mod update;

pub use document::Document;
pub use update::{ManifestOptions, ManifestPatch, ReadVersionError, apply, read_version};

use crate::core::error::{ManifestError, ReleaseResult, ResultExt};
use std::path::Path;

/// Read and parse a manifest from disk
pub fn load(path: &Path) -> ReleaseResult<(Vec<u8>, Document)> {
  let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
  let doc = Document::from_bytes(&bytes).map_err(|e| e.at(path))?;
  Ok((bytes, doc))
}

/// Serialize a document, attaching the manifest path to any failure
pub fn render(doc: &Document, path: &Path) -> ReleaseResult<Vec<u8>> {
  doc.to_bytes().map_err(|e| match e {
    ManifestError::Serialize { reason } => ManifestError::Serialize {
      reason: format!("{}: {}", path.display(), reason),
    }
    .into(),
    other => other.at(path).into(),
  })
}
