//! Idempotent manifest mutation
//!
//! Every field is located by element name and either updated in place or
//! created. Applying the same patch twice yields the same bytes as applying it
//! once.

use super::document::{Document, Element, IndentStyle};
use crate::core::config::ManifestConfig;
use crate::core::error::{ManifestError, VersionError};
use crate::version::SemVer;
use serde::{Deserialize, Serialize};

const CONTAINER: &str = "PropertyGroup";
const ITEMS_CONTAINER: &str = "ItemGroup";
const VERSION_FIELD: &str = "Version";
const PACKAGING_ELEMENT: &str = "None";

/// Field values to write into one project manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestPatch {
  pub project: String,
  pub new_version: SemVer,
  pub release_notes: String,
  /// README path relative to the manifest, when the project has one
  pub readme_path: Option<String>,
}

/// Which fields the updater writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestOptions {
  pub notes_fields: Vec<String>,
  pub readme_field: String,
  pub pack_readme: bool,
}

impl Default for ManifestOptions {
  fn default() -> Self {
    Self {
      notes_fields: vec!["PackageReleaseNotes".to_string()],
      readme_field: "PackageReadmeFile".to_string(),
      pack_readme: true,
    }
  }
}

impl From<&ManifestConfig> for ManifestOptions {
  fn from(config: &ManifestConfig) -> Self {
    Self {
      notes_fields: config.notes_fields.clone(),
      readme_field: config.readme_field.clone(),
      pack_readme: config.pack_readme,
    }
  }
}

/// Version currently declared by the manifest
///
/// `Ok(None)` when no `Version` element exists anywhere in a root-level
/// `PropertyGroup` (first release). A present but blank or malformed value is
/// an error.
pub fn read_version(doc: &Document) -> Result<Option<SemVer>, ReadVersionError> {
  let Some(version) = doc
    .root()
    .into_iter()
    .flat_map(Element::child_elements)
    .filter(|el| el.name() == CONTAINER)
    .find_map(|group| group.find_child(VERSION_FIELD))
  else {
    return Ok(None);
  };

  let text = version.text().map_err(ReadVersionError::Manifest)?;
  text.parse().map(Some).map_err(ReadVersionError::Version)
}

/// Failure to read the current version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadVersionError {
  Manifest(ManifestError),
  Version(VersionError),
}

/// Apply a patch, returning the updated document
pub fn apply(mut doc: Document, patch: &ManifestPatch, options: &ManifestOptions) -> Result<Document, ManifestError> {
  let style = doc.indent_style();
  let root = doc.root_mut().ok_or_else(|| ManifestError::Unparseable {
    path: None,
    reason: "document has no root element".to_string(),
  })?;

  let index = match container_index(root) {
    Some(index) => index,
    None => root.append_child(Element::open(CONTAINER), 0, &style),
  };
  let container = root.element_at_mut(index).ok_or_else(|| ManifestError::Serialize {
    reason: format!("lost track of <{}> while editing", CONTAINER),
  })?;

  set_field(container, VERSION_FIELD, &patch.new_version.to_string(), &style)?;
  let notes = with_newlines(&patch.release_notes, style.newline);
  for field in &options.notes_fields {
    set_field(container, field, &notes, &style)?;
  }

  if let Some(readme) = &patch.readme_path {
    set_field(container, &options.readme_field, readme, &style)?;
    if options.pack_readme {
      ensure_packaging_entry(root, readme, &style);
    }
  }

  Ok(doc)
}

/// Rewrite line breaks in `text` to the document's own
fn with_newlines(text: &str, newline: &str) -> String {
  let unix = text.replace("\r\n", "\n");
  if newline == "\n" { unix } else { unix.replace('\n', newline) }
}

/// The first root-level `PropertyGroup` holding a `Version`, else the first one
fn container_index(root: &Element) -> Option<usize> {
  let groups = root.positions_of(CONTAINER);
  groups
    .iter()
    .copied()
    .find(|&index| {
      root
        .element_at(index)
        .is_some_and(|group| group.find_child(VERSION_FIELD).is_some())
    })
    .or_else(|| groups.first().copied())
}

fn set_field(container: &mut Element, name: &str, value: &str, style: &IndentStyle) -> Result<(), ManifestError> {
  match container.find_child_mut(name) {
    Some(field) => field.set_text(value),
    None => {
      container.append_child(Element::with_text(name, value), 1, style);
      Ok(())
    }
  }
}

/// Ensure some root-level `ItemGroup` packs the README
///
/// Any element whose `Include` equals the readme path counts. A new entry goes
/// into the first `ItemGroup` that already holds `None` items, else into a new
/// `ItemGroup` appended to the root.
fn ensure_packaging_entry(root: &mut Element, readme: &str, style: &IndentStyle) {
  let groups = root.positions_of(ITEMS_CONTAINER);

  let already_packed = groups
    .iter()
    .filter_map(|&index| root.element_at(index))
    .flat_map(Element::child_elements)
    .any(|item| item.attribute("Include").as_deref() == Some(readme));
  if already_packed {
    return;
  }

  let target = groups.iter().copied().find(|&index| {
    root
      .element_at(index)
      .is_some_and(|group| group.find_child(PACKAGING_ELEMENT).is_some())
  });
  let index = match target {
    Some(index) => index,
    None => root.append_child(Element::open(ITEMS_CONTAINER), 0, style),
  };

  let entry = Element::empty_with_attributes(
    PACKAGING_ELEMENT,
    &[("Include", readme), ("Pack", "true"), ("PackagePath", "\\")],
  );
  if let Some(group) = root.element_at_mut(index) {
    group.append_child(entry, 1, style);
  }
}
