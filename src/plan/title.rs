//! PR title grammar: `<project> <bump>[, <project> <bump>]*`

use crate::core::error::ParseError;
use crate::version::BumpKind;

/// One `<project> <bump>` pair from the title, in title order
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TitleEntry {
  pub project: String,
  pub bump: BumpKind,
}

/// Parse the title into its ordered `(project, bump)` pairs
///
/// `prefix` (e.g. `nuget:`) is stripped case-insensitively from the start of the
/// title. When `default_project` is set, a title that is nothing but a bump word
/// becomes a one-project plan for that project.
pub(crate) fn parse_title(
  title: &str,
  prefix: Option<&str>,
  default_project: Option<&str>,
) -> Result<Vec<TitleEntry>, ParseError> {
  let title = strip_prefix(title.trim(), prefix).trim();

  if let Some(project) = default_project
    && !title.contains(',')
    && title.split_whitespace().count() == 1
  {
    let bump = title.parse::<BumpKind>()?;
    return Ok(vec![TitleEntry {
      project: project.to_string(),
      bump,
    }]);
  }

  title.split(',').map(parse_segment).collect()
}

fn parse_segment(segment: &str) -> Result<TitleEntry, ParseError> {
  let trimmed = segment.trim();
  let tokens: Vec<&str> = trimmed.split_whitespace().collect();
  let [project, word] = tokens.as_slice() else {
    return Err(ParseError::InvalidTitlePair {
      segment: trimmed.to_string(),
    });
  };

  Ok(TitleEntry {
    project: project.to_string(),
    bump: word.parse()?,
  })
}

fn strip_prefix<'a>(title: &'a str, prefix: Option<&str>) -> &'a str {
  let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) else {
    return title;
  };
  match title.get(..prefix.len()) {
    Some(head) if head.eq_ignore_ascii_case(prefix) => &title[prefix.len()..],
    _ => title,
  }
}
