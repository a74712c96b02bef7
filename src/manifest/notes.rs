//! Release-notes rendering

use crate::version::SemVer;

/// Render changelog entries as `- <entry>` lines
pub fn render_entries(entries: &[String]) -> String {
  entries
    .iter()
    .map(|entry| format!("- {}", entry))
    .collect::<Vec<_>>()
    .join("\n")
}

/// Full release-notes text for one project
///
/// The optional header (with `{version}` substituted) comes first, directly
/// above the entries. README content, when given, follows after a blank line.
pub fn render_notes(version: SemVer, entries: &[String], header: Option<&str>, readme: Option<&str>) -> String {
  let mut head = Vec::new();
  if let Some(header) = header {
    head.push(header.replace("{version}", &version.to_string()));
  }
  if !entries.is_empty() {
    head.push(render_entries(entries));
  }

  let mut sections = Vec::new();
  if !head.is_empty() {
    sections.push(head.join("\n"));
  }
  if let Some(readme) = readme.map(str::trim).filter(|r| !r.is_empty()) {
    sections.push(readme.to_string());
  }
  sections.join("\n\n")
}
