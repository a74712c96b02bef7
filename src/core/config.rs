use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder for the project id in path and command templates
pub const PROJECT_PLACEHOLDER: &str = "{project}";

/// Configuration for monorel
/// Searched in order: monorel.toml, .monorel.toml, .github/monorel.toml, .config/monorel.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MonorelConfig {
  #[serde(default)]
  pub workspace: WorkspaceConfig,
  #[serde(default)]
  pub pr: PrConfig,
  #[serde(default)]
  pub manifest: ManifestConfig,
  #[serde(default)]
  pub git: GitConfig,
  #[serde(default)]
  pub publish: PublishConfig,
  #[serde(default)]
  pub github: GithubConfig,
  #[serde(default)]
  pub backup: BackupConfig,
  /// Deadline for every external command, in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

/// Where projects and their manifests live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
  /// Directory holding one sub-directory per project (default: "src")
  #[serde(default = "default_projects_root")]
  pub projects_root: PathBuf,

  /// Manifest path relative to projects_root (default: "{project}/{project}.csproj")
  #[serde(default = "default_manifest_pattern")]
  pub manifest: String,

  /// README file name next to the manifest (default: "README.md")
  #[serde(default = "default_readme")]
  pub readme: String,
}

fn default_projects_root() -> PathBuf {
  PathBuf::from("src")
}

fn default_manifest_pattern() -> String {
  "{project}/{project}.csproj".to_string()
}

fn default_readme() -> String {
  "README.md".to_string()
}

impl Default for WorkspaceConfig {
  fn default() -> Self {
    Self {
      projects_root: default_projects_root(),
      manifest: default_manifest_pattern(),
      readme: default_readme(),
    }
  }
}

/// PR title conventions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrConfig {
  /// Stripped from the start of the title (e.g. "nuget:")
  #[serde(default)]
  pub title_prefix: Option<String>,

  /// Enables single-project titles such as "app: minor"
  #[serde(default)]
  pub default_project: Option<String>,
}

/// Manifest fields written on release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
  /// Fields receiving the rendered changelog (default: ["PackageReleaseNotes"])
  #[serde(default = "default_notes_fields")]
  pub notes_fields: Vec<String>,

  /// Line above the changelog entries; "{version}" is substituted
  #[serde(default)]
  pub notes_header: Option<String>,

  /// Append the project README after the changelog entries
  #[serde(default)]
  pub append_readme_to_notes: bool,

  /// Field pointing at the packed README (default: "PackageReadmeFile")
  #[serde(default = "default_readme_field")]
  pub readme_field: String,

  /// Add a `<None Include=... Pack="true" />` entry for the README (default: true)
  #[serde(default = "default_true")]
  pub pack_readme: bool,
}

fn default_notes_fields() -> Vec<String> {
  vec!["PackageReleaseNotes".to_string()]
}

fn default_readme_field() -> String {
  "PackageReadmeFile".to_string()
}

fn default_true() -> bool {
  true
}

impl Default for ManifestConfig {
  fn default() -> Self {
    Self {
      notes_fields: default_notes_fields(),
      notes_header: None,
      append_readme_to_notes: false,
      readme_field: default_readme_field(),
      pack_readme: true,
    }
  }
}

/// Commit, tag and push settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitConfig {
  /// Remote that receives commits and tags (default: "origin")
  #[serde(default = "default_remote")]
  pub remote: String,

  /// Branch to push the version commit to (default: current HEAD)
  #[serde(default)]
  pub branch: Option<String>,

  #[serde(default = "default_commit_message")]
  pub commit_message: String,

  /// Message of the commit that undoes the version commit
  #[serde(default = "default_restore_message")]
  pub restore_message: String,

  #[serde(default)]
  pub bot_name: Option<String>,

  #[serde(default)]
  pub bot_email: Option<String>,

  /// Push commits and tags (default: true)
  #[serde(default = "default_true")]
  pub push: bool,
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_commit_message() -> String {
  "Update project versions".to_string()
}

fn default_restore_message() -> String {
  "Restore project versions".to_string()
}

impl Default for GitConfig {
  fn default() -> Self {
    Self {
      remote: default_remote(),
      branch: None,
      commit_message: default_commit_message(),
      restore_message: default_restore_message(),
      bot_name: None,
      bot_email: None,
      push: true,
    }
  }
}

/// Package publisher selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishKind {
  /// Skip the publish stage
  #[default]
  None,
  /// `dotnet pack` + `dotnet nuget push`
  Nuget,
  /// Run `publish.command`
  Command,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
  #[serde(default)]
  pub kind: PublishKind,

  /// NuGet feed (default: nuget.org v3 index)
  #[serde(default = "default_source")]
  pub source: String,

  /// Environment variable holding the feed API key (default: "NUGET_API_KEY")
  #[serde(default = "default_api_key_env")]
  pub api_key_env: String,

  /// Directory receiving packed .nupkg files (default: "output")
  #[serde(default = "default_output_dir")]
  pub output_dir: PathBuf,

  /// argv template for kind = "command"; supports {project} {version} {manifest} {tag}
  #[serde(default)]
  pub command: Vec<String>,

  /// argv template used to undo a publish
  #[serde(default)]
  pub unpublish_command: Vec<String>,
}

fn default_source() -> String {
  "https://api.nuget.org/v3/index.json".to_string()
}

fn default_api_key_env() -> String {
  "NUGET_API_KEY".to_string()
}

fn default_output_dir() -> PathBuf {
  PathBuf::from("output")
}

impl Default for PublishConfig {
  fn default() -> Self {
    Self {
      kind: PublishKind::None,
      source: default_source(),
      api_key_env: default_api_key_env(),
      output_dir: default_output_dir(),
      command: Vec::new(),
      unpublish_command: Vec::new(),
    }
  }
}

/// GitHub release creation via the `gh` CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
  #[serde(default = "default_true")]
  pub enabled: bool,

  #[serde(default = "default_gh")]
  pub gh: String,
}

fn default_gh() -> String {
  "gh".to_string()
}

impl Default for GithubConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      gh: default_gh(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
  /// Write `<manifest>.bkp` next to each manifest during a run (default: true)
  #[serde(default = "default_true")]
  pub persist: bool,
}

impl Default for BackupConfig {
  fn default() -> Self {
    Self { persist: true }
  }
}

fn default_timeout_secs() -> u64 {
  600
}

impl Default for MonorelConfig {
  fn default() -> Self {
    Self {
      workspace: WorkspaceConfig::default(),
      pr: PrConfig::default(),
      manifest: ManifestConfig::default(),
      git: GitConfig::default(),
      publish: PublishConfig::default(),
      github: GithubConfig::default(),
      backup: BackupConfig::default(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

/// Values supplied on the command line or through the CI environment
///
/// Each one, when set and non-empty, wins over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
  pub projects_root: Option<PathBuf>,
  pub branch: Option<String>,
  pub bot_name: Option<String>,
  pub bot_email: Option<String>,
  pub source: Option<String>,
}

impl MonorelConfig {
  /// Find config file in search order: monorel.toml, .monorel.toml, .github/monorel.toml, .config/monorel.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("monorel.toml"),
      path.join(".monorel.toml"),
      path.join(".github").join("monorel.toml"),
      path.join(".config").join("monorel.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config for a repository
  ///
  /// An explicit path must exist. Without one the search order above is used
  /// and a missing file means all defaults.
  pub fn load(repo_root: &Path, explicit: Option<&Path>) -> ReleaseResult<Self> {
    let config_path = match explicit {
      Some(path) if !path.exists() => {
        return Err(ReleaseError::Config(ConfigError::NotFound {
          path: path.to_path_buf(),
        }));
      }
      Some(path) => Some(path.to_path_buf()),
      None => Self::find_config_path(repo_root),
    };

    let Some(config_path) = config_path else {
      tracing::debug!(root = %repo_root.display(), "no monorel.toml found, using defaults");
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::from_toml(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;
    tracing::debug!(path = %config_path.display(), "loaded config");

    Ok(config)
  }

  pub fn from_toml(content: &str) -> ReleaseResult<Self> {
    let config: MonorelConfig = toml_edit::de::from_str(content)?;
    Ok(config)
  }

  /// Layer CLI / environment values over the file
  pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
    fn non_empty(value: &Option<String>) -> Option<String> {
      value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
    }

    if let Some(root) = overrides.projects_root.as_ref().filter(|p| !p.as_os_str().is_empty()) {
      self.workspace.projects_root = root.clone();
    }
    if let Some(branch) = non_empty(&overrides.branch) {
      self.git.branch = Some(branch);
    }
    if let Some(name) = non_empty(&overrides.bot_name) {
      self.git.bot_name = Some(name);
    }
    if let Some(email) = non_empty(&overrides.bot_email) {
      self.git.bot_email = Some(email);
    }
    if let Some(source) = non_empty(&overrides.source) {
      self.publish.source = source;
    }
  }

  /// Validate the configuration
  pub fn validate(&self) -> ReleaseResult<()> {
    if !self.workspace.manifest.contains(PROJECT_PLACEHOLDER) {
      return Err(ReleaseError::with_help(
        format!(
          "Invalid manifest pattern '{}': it must contain {}",
          self.workspace.manifest, PROJECT_PLACEHOLDER
        ),
        "Use something like manifest = \"{project}/{project}.csproj\" under [workspace]",
      ));
    }

    if self.manifest.notes_fields.is_empty() || self.manifest.notes_fields.iter().any(|f| f.trim().is_empty()) {
      return Err(ReleaseError::Config(ConfigError::Invalid {
        reason: "manifest.notes_fields must list at least one non-empty field name".to_string(),
      }));
    }

    if self.publish.kind == PublishKind::Command && self.publish.command.is_empty() {
      return Err(ReleaseError::Config(ConfigError::MissingField {
        field: "publish.command (required when publish.kind = \"command\")".to_string(),
      }));
    }

    if self.timeout_secs == 0 {
      return Err(ReleaseError::Config(ConfigError::Invalid {
        reason: "timeout_secs must be greater than zero".to_string(),
      }));
    }

    if self.git.remote.trim().is_empty() {
      return Err(ReleaseError::Config(ConfigError::MissingField {
        field: "git.remote".to_string(),
      }));
    }

    Ok(())
  }

  pub fn timeout(&self) -> std::time::Duration {
    std::time::Duration::from_secs(self.timeout_secs)
  }
}
