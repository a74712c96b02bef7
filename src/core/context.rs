//! Release context: repository root, config and project layout, built once
//! in main.rs and passed by reference to every command.

use crate::core::config::{ConfigOverrides, MonorelConfig};
use crate::core::error::ReleaseResult;
use crate::core::layout::ProjectLayout;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ReleaseContext {
  /// Repository root (absolute path)
  pub root: PathBuf,

  /// Effective configuration (file, then environment, then CLI)
  pub config: MonorelConfig,

  pub layout: ProjectLayout,
}

impl ReleaseContext {
  /// Load and validate config, then derive the layout
  pub fn build(root: &Path, config_path: Option<&Path>, overrides: &ConfigOverrides) -> ReleaseResult<Self> {
    let mut config = MonorelConfig::load(root, config_path)?;
    config.apply_overrides(overrides);
    config.validate()?;

    let layout = ProjectLayout::new(root, &config.workspace);
    Ok(Self {
      root: root.to_path_buf(),
      config,
      layout,
    })
  }
}
