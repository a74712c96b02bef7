//! PR body grammar
//!
//! The body is a line-oriented mini-language. Each line is classified by
//! [`tokenize`] and fed through a two-state machine:
//!
//! ```text
//! ExpectProjectOrChangelog --Header(p)--> InChangelogBlock(p)
//! InChangelogBlock(p)      --Header(q)--> InChangelogBlock(q)
//! InChangelogBlock(p)      --Entry(e)---> InChangelogBlock(p)   (e appended to p)
//! ExpectProjectOrChangelog --Entry(e)---> ExpectProjectOrChangelog (e is an orphan)
//! ```
//!
//! Blank and `//` comment lines never change state.

use crate::core::error::ParseError;
use std::collections::BTreeMap;

const COMMENT_MARKER: &str = "//";

/// Classification of a single body line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BodyLine<'a> {
  Blank,
  Comment,
  /// Changelog entry with the leading `-` and whitespace removed (may be empty)
  Entry(&'a str),
  /// Block header naming a project, all whitespace removed
  Header(String),
}

pub(crate) fn tokenize(line: &str) -> BodyLine<'_> {
  let trimmed = line.trim();
  if trimmed.is_empty() {
    BodyLine::Blank
  } else if trimmed.starts_with(COMMENT_MARKER) {
    BodyLine::Comment
  } else if trimmed.starts_with('-') {
    BodyLine::Entry(trimmed.trim_start_matches(|c: char| c == '-' || c.is_whitespace()))
  } else {
    BodyLine::Header(trimmed.chars().filter(|c| !c.is_whitespace()).collect())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
  ExpectProjectOrChangelog,
  InChangelogBlock { project: String },
}

/// Changelog lines collected from the body
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct BodyChangelog {
  /// Entries per project, in body order
  pub blocks: BTreeMap<String, Vec<String>>,
  /// Entries that appeared before any block header
  pub orphans: Vec<String>,
}

/// Run the body through the state machine
///
/// Every header must name one of `title_projects`; the first one that does not
/// fails with [`ParseError::UnknownProjectInBody`].
pub(crate) fn parse_body(body: &str, title_projects: &[&str]) -> Result<BodyChangelog, ParseError> {
  let mut changelog = BodyChangelog::default();
  let mut state = State::ExpectProjectOrChangelog;

  for line in body.lines() {
    match tokenize(line) {
      BodyLine::Blank | BodyLine::Comment => {}
      BodyLine::Header(project) => {
        if !title_projects.contains(&project.as_str()) {
          return Err(ParseError::UnknownProjectInBody { project });
        }
        changelog.blocks.entry(project.clone()).or_default();
        state = State::InChangelogBlock { project };
      }
      BodyLine::Entry("") => {}
      BodyLine::Entry(entry) => match &state {
        State::InChangelogBlock { project } => {
          changelog.blocks.entry(project.clone()).or_default().push(entry.to_string());
        }
        State::ExpectProjectOrChangelog => changelog.orphans.push(entry.to_string()),
      },
    }
  }

  Ok(changelog)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_tokenize_classifies_lines() {
    assert_eq!(tokenize("   "), BodyLine::Blank);
    assert_eq!(tokenize("// reviewers: ignore"), BodyLine::Comment);
    assert_eq!(tokenize("  - Fixed the thing "), BodyLine::Entry("Fixed the thing"));
    assert_eq!(tokenize("-- - nested dash"), BodyLine::Entry("nested dash"));
    assert_eq!(tokenize("-"), BodyLine::Entry(""));
    assert_eq!(tokenize(" Lionk. Core "), BodyLine::Header("Lionk.Core".to_string()));
  }

  #[test]
  fn test_entries_follow_their_header() {
    let body = "projA\n- one\n- two\n\nprojB\n- three\n";
    let changelog = parse_body(body, &["projA", "projB"]).unwrap();
    assert_eq!(changelog.blocks["projA"], ["one", "two"]);
    assert_eq!(changelog.blocks["projB"], ["three"]);
    assert!(changelog.orphans.is_empty());
  }

  #[test]
  fn test_comments_and_blank_lines_keep_state() {
    let body = "projA\n\n// hidden\n- kept\n";
    let changelog = parse_body(body, &["projA"]).unwrap();
    assert_eq!(changelog.blocks["projA"], ["kept"]);
  }

  #[test]
  fn test_unknown_project_fails() {
    let err = parse_body("projA\n- ok\nGhost\n- nope", &["projA"]).unwrap_err();
    assert_eq!(
      err,
      ParseError::UnknownProjectInBody {
        project: "Ghost".to_string()
      }
    );
  }

  #[test]
  fn test_empty_block_is_recorded() {
    let changelog = parse_body("projA\n// nothing yet\n", &["projA"]).unwrap();
    assert_eq!(changelog.blocks["projA"], Vec::<String>::new());
  }

  #[test]
  fn test_repeated_header_appends() {
    let changelog = parse_body("projA\n- one\nprojB\n- two\nprojA\n- three", &["projA", "projB"]).unwrap();
    assert_eq!(changelog.blocks["projA"], ["one", "three"]);
  }

  #[test]
  fn test_entries_before_header_are_orphans() {
    let changelog = parse_body("- early\n-\nprojA\n- late", &["projA"]).unwrap();
    assert_eq!(changelog.orphans, ["early"]);
    assert_eq!(changelog.blocks["projA"], ["late"]);
  }

  #[test]
  fn test_windows_line_endings() {
    let changelog = parse_body("projA\r\n- one\r\n", &["projA"]).unwrap();
    assert_eq!(changelog.blocks["projA"], ["one"]);
  }
}
