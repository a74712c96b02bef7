//! Error types for monorel with contextual messages and exit codes
//!
//! One error type covers the whole release pipeline. Every variant knows its
//! exit code and, where it helps, carries a suggestion for the PR author or the
//! CI maintainer.
//!
//! Parse, version and manifest errors are raised before anything is mutated.
//! Stage failures are wrapped in [`ReleaseError::Pipeline`] only after the
//! compensating actions have run, so the root cause is always what surfaces.

use crate::release::outcome::PipelineFailure;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for monorel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (PR text, config, invalid args)
  User = 1,
  /// System error (git, network, external commands, I/O)
  System = 2,
  /// Validation failure (malformed manifests or versions, existing tags)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for monorel
#[derive(Debug)]
pub enum ReleaseError {
  /// Malformed PR title or body
  Parse(ParseError),

  /// Malformed version string
  Version(VersionError),

  /// Manifest could not be parsed or written
  Manifest(ManifestError),

  /// Configuration errors
  Config(ConfigError),

  /// Git operation errors
  Git(GitError),

  /// External command (dotnet, gh, custom publisher) failed
  Command(CommandError),

  /// A release tag is already present locally or on the remote
  TagAlreadyExists { tag: String },

  /// Nothing to commit, or the commit itself failed
  CommitFailed { reason: String },

  /// A pipeline stage failed; compensation has already run
  Pipeline(Box<PipelineFailure>),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(err) => ReleaseError::Message {
        message: format!("{}: {}", ctx_str, err),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Parse(_) => ExitCode::User,
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Version(_) => ExitCode::Validation,
      ReleaseError::Manifest(_) => ExitCode::Validation,
      ReleaseError::TagAlreadyExists { .. } => ExitCode::Validation,
      ReleaseError::Git(_) => ExitCode::System,
      ReleaseError::Command(_) => ExitCode::System,
      ReleaseError::CommitFailed { .. } => ExitCode::System,
      ReleaseError::Pipeline(failure) => failure.reason.exit_code(),
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Parse(e) => e.help_message(),
      ReleaseError::Version(e) => e.help_message(),
      ReleaseError::Manifest(e) => e.help_message(),
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Command(e) => e.help_message(),
      ReleaseError::TagAlreadyExists { tag } => Some(format!(
        "A previous run already released '{}'. If it was left half-done, run `monorel rollback --plan release-plan.json` first; otherwise bump again.",
        tag
      )),
      ReleaseError::CommitFailed { .. } => {
        Some("Check that the manifests actually changed and that the checkout is not in a detached or dirty state.".to_string())
      }
      ReleaseError::Pipeline(failure) => failure.reason.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Parse(e) => write!(f, "{}", e),
      ReleaseError::Version(e) => write!(f, "{}", e),
      ReleaseError::Manifest(e) => write!(f, "{}", e),
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Command(e) => write!(f, "{}", e),
      ReleaseError::TagAlreadyExists { tag } => write!(f, "Tag '{}' already exists", tag),
      ReleaseError::CommitFailed { reason } => write!(f, "Commit failed: {}", reason),
      ReleaseError::Pipeline(failure) => write!(f, "{}", failure),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<String> for ReleaseError {
  fn from(msg: String) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<&str> for ReleaseError {
  fn from(msg: &str) -> Self {
    ReleaseError::message(msg)
  }
}

impl From<ParseError> for ReleaseError {
  fn from(err: ParseError) -> Self {
    ReleaseError::Parse(err)
  }
}

impl From<VersionError> for ReleaseError {
  fn from(err: VersionError) -> Self {
    ReleaseError::Version(err)
  }
}

impl From<ManifestError> for ReleaseError {
  fn from(err: ManifestError) -> Self {
    ReleaseError::Manifest(err)
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<GitError> for ReleaseError {
  fn from(err: GitError) -> Self {
    ReleaseError::Git(err)
  }
}

impl From<CommandError> for ReleaseError {
  fn from(err: CommandError) -> Self {
    ReleaseError::Command(err)
  }
}

impl From<quick_xml::Error> for ReleaseError {
  fn from(err: quick_xml::Error) -> Self {
    ReleaseError::Manifest(ManifestError::Unparseable {
      path: None,
      reason: err.to_string(),
    })
  }
}

impl From<toml_edit::de::Error> for ReleaseError {
  fn from(err: toml_edit::de::Error) -> Self {
    ReleaseError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for ReleaseError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    ReleaseError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Errors in the PR title or body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  /// A title segment does not split into `<project> <bump>`
  InvalidTitlePair { segment: String },

  /// The bump word is not major, minor or patch
  InvalidBumpKind { word: String },

  /// The same project appears twice in the title
  DuplicateProject { project: String },

  /// A body block names a project that is not in the title
  UnknownProjectInBody { project: String },

  /// No manifest exists for a project named in the title
  ManifestNotFound { project: String },
}

impl ParseError {
  fn help_message(&self) -> Option<String> {
    match self {
      ParseError::InvalidTitlePair { .. } => {
        Some("PR titles list `<project> <bump>` pairs separated by commas, e.g. `Lionk.Core minor, Lionk.Auth patch`.".to_string())
      }
      ParseError::InvalidBumpKind { .. } => Some("The bump must be one of: major, minor, patch.".to_string()),
      ParseError::DuplicateProject { project } => Some(format!("List '{}' only once in the PR title.", project)),
      ParseError::UnknownProjectInBody { project } => Some(format!(
        "Add '{} <bump>' to the PR title, or fix the project name in the PR body.",
        project
      )),
      ParseError::ManifestNotFound { .. } => {
        Some("Check the project name and the `[workspace]` section of monorel.toml (projects_root, manifest).".to_string())
      }
    }
  }
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParseError::InvalidTitlePair { segment } => {
        write!(f, "Invalid part of pull request title: '{}'", segment)
      }
      ParseError::InvalidBumpKind { word } => write!(f, "Invalid version bump: '{}'", word),
      ParseError::DuplicateProject { project } => {
        write!(f, "Project '{}' appears more than once in the pull request title", project)
      }
      ParseError::UnknownProjectInBody { project } => {
        write!(f, "Project '{}' from the pull request body is not in the title", project)
      }
      ParseError::ManifestNotFound { project } => write!(f, "Project file not found for '{}'", project),
    }
  }
}

/// Version parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
  /// Not exactly three dot-separated non-negative integers
  Malformed { value: String },

  /// A manifest holds a malformed version
  MalformedInManifest { value: String, path: PathBuf },
}

impl VersionError {
  /// Attach the manifest the version was read from
  pub fn in_manifest(self, path: impl Into<PathBuf>) -> Self {
    match self {
      VersionError::Malformed { value } => VersionError::MalformedInManifest {
        value,
        path: path.into(),
      },
      other => other,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      VersionError::Malformed { .. } => Some("Versions must look like `1.4.2`.".to_string()),
      VersionError::MalformedInManifest { path, .. } => Some(format!(
        "Fix the <Version> element in {} by hand (expected `major.minor.patch`).",
        path.display()
      )),
    }
  }
}

impl fmt::Display for VersionError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VersionError::Malformed { value } => write!(f, "Malformed version: '{}'", value),
      VersionError::MalformedInManifest { value, path } => {
        write!(f, "Malformed version '{}' in {}", value, path.display())
      }
    }
  }
}

/// Manifest errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestError {
  /// The manifest is not well-formed XML
  Unparseable { path: Option<PathBuf>, reason: String },

  /// The updated document could not be written out
  Serialize { reason: String },
}

impl ManifestError {
  /// Attach the manifest path to a parse error
  pub fn at(self, manifest: impl Into<PathBuf>) -> Self {
    match self {
      ManifestError::Unparseable { path: None, reason } => ManifestError::Unparseable {
        path: Some(manifest.into()),
        reason,
      },
      other => other,
    }
  }

  fn help_message(&self) -> Option<String> {
    match self {
      ManifestError::Unparseable { .. } => {
        Some("The project file must be well-formed XML; fix it before releasing.".to_string())
      }
      ManifestError::Serialize { .. } => None,
    }
  }
}

impl fmt::Display for ManifestError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestError::Unparseable { path: Some(path), reason } => {
        write!(f, "Manifest {} is unparseable: {}", path.display(), reason)
      }
      ManifestError::Unparseable { path: None, reason } => write!(f, "Manifest is unparseable: {}", reason),
      ManifestError::Serialize { reason } => write!(f, "Failed to serialize manifest: {}", reason),
    }
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// An explicitly requested config file does not exist
  NotFound { path: PathBuf },

  /// A config value is invalid
  Invalid { reason: String },

  /// Missing required field
  MissingField { field: String },

  /// A credential expected in the environment is not set
  MissingSecret { env: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Create monorel.toml at the repository root or drop the --config flag to use defaults.".to_string())
      }
      ConfigError::MissingSecret { env } => Some(format!("Export {} in the workflow environment.", env)),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => write!(f, "Config file not found: {}", path.display()),
      ConfigError::Invalid { reason } => write!(f, "Invalid configuration: {}", reason),
      ConfigError::MissingField { field } => write!(f, "Missing required field in config: {}", field),
      ConfigError::MissingSecret { env } => write!(f, "Environment variable {} is not set", env),
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Push failed
  PushFailed {
    remote: String,
    refspec: String,
    reason: String,
  },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::PushFailed { reason, .. } => {
        if reason.contains("non-fast-forward") || reason.contains("rejected") {
          Some("The remote branch moved during the run. Re-run the workflow on the latest head.".to_string())
        } else if reason.contains("permission denied") || reason.contains("403") {
          Some("The workflow token lacks write access to the repository (contents: write).".to_string())
        } else {
          None
        }
      }
      GitError::RepoNotFound { path } => Some(format!(
        "Run monorel from inside a git checkout (looked at {}).",
        path.display()
      )),
      GitError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
      GitError::PushFailed { remote, refspec, reason } => {
        write!(f, "Push of {} to {} failed: {}", refspec, remote, reason)
      }
    }
  }
}

/// External process errors
#[derive(Debug)]
pub enum CommandError {
  /// The program could not be started
  Spawn { command: String, reason: String },

  /// The program exited with a failure status
  Failed {
    command: String,
    status: Option<i32>,
    stderr: String,
  },

  /// The program did not finish before its deadline and was killed
  TimedOut { command: String, secs: u64 },
}

impl CommandError {
  fn help_message(&self) -> Option<String> {
    match self {
      CommandError::Spawn { command, .. } => Some(format!(
        "Make sure `{}` is installed and on PATH.",
        command.split_whitespace().next().unwrap_or(command)
      )),
      CommandError::TimedOut { .. } => Some("Raise `timeout_secs` in monorel.toml if the registry is slow.".to_string()),
      CommandError::Failed { .. } => None,
    }
  }
}

impl fmt::Display for CommandError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CommandError::Spawn { command, reason } => write!(f, "Failed to run `{}`: {}", command, reason),
      CommandError::Failed {
        command,
        status: Some(code),
        stderr,
      } => write!(f, "`{}` exited with status {}\n{}", command, code, stderr),
      CommandError::Failed {
        command,
        status: None,
        stderr,
      } => write!(f, "`{}` was terminated by a signal\n{}", command, stderr),
      CommandError::TimedOut { command, secs } => write!(f, "`{}` timed out after {}s", command, secs),
    }
  }
}

/// Result type alias for monorel
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

impl From<anyhow::Error> for ReleaseError {
  fn from(err: anyhow::Error) -> Self {
    ReleaseError::message(err.to_string())
  }
}
