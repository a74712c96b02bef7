//! Manifest backups for one release run
//!
//! Snapshots are held in memory and, when persistence is on, also written to
//! `<manifest>.bkp` so an operator (or `monorel rollback`) can recover after
//! the process itself died.

use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const BACKUP_EXTENSION: &str = "bkp";

/// `<manifest>.bkp`
pub fn backup_path(manifest: &Path) -> PathBuf {
  let mut name = manifest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
  name.push(".");
  name.push(BACKUP_EXTENSION);
  manifest.with_file_name(name)
}

#[derive(Debug, Clone)]
struct Backup {
  manifest: PathBuf,
  bytes: Vec<u8>,
  file: Option<PathBuf>,
}

/// Raw manifest snapshots keyed by project id
#[derive(Debug, Clone, Default)]
pub struct BackupStore {
  entries: BTreeMap<String, Backup>,
  persist: bool,
}

impl BackupStore {
  pub fn new(persist: bool) -> Self {
    Self {
      entries: BTreeMap::new(),
      persist,
    }
  }

  /// Snapshot a manifest before it is touched
  pub fn snapshot(&mut self, project: &str, manifest: &Path) -> ReleaseResult<()> {
    let bytes = fs::read(manifest).with_context(|| format!("Failed to back up {}", manifest.display()))?;
    self.insert(project, manifest, bytes)
  }

  /// Record bytes already read by the caller
  fn insert(&mut self, project: &str, manifest: &Path, bytes: Vec<u8>) -> ReleaseResult<()> {
    let file = if self.persist {
      let path = backup_path(manifest);
      if path.exists() {
        return Err(ReleaseError::with_help(
          format!("Leftover backup {} from an earlier run", path.display()),
          "Run `monorel rollback` first, or delete the .bkp file if the manifest is already correct",
        ));
      }
      fs::write(&path, &bytes).with_context(|| format!("Failed to write backup {}", path.display()))?;
      Some(path)
    } else {
      None
    };

    tracing::debug!(project, manifest = %manifest.display(), persisted = file.is_some(), "backed up manifest");
    self.entries.insert(
      project.to_string(),
      Backup {
        manifest: manifest.to_path_buf(),
        bytes,
        file,
      },
    );
    Ok(())
  }

  /// Adopt a `.bkp` file left behind by an earlier run
  ///
  /// Returns false when no backup file exists for the manifest.
  pub fn adopt_persisted(&mut self, project: &str, manifest: &Path) -> ReleaseResult<bool> {
    let path = backup_path(manifest);
    if !path.is_file() {
      return Ok(false);
    }
    let bytes = fs::read(&path).with_context(|| format!("Failed to read backup {}", path.display()))?;
    self.entries.insert(
      project.to_string(),
      Backup {
        manifest: manifest.to_path_buf(),
        bytes,
        file: Some(path),
      },
    );
    Ok(true)
  }

  pub fn bytes(&self, project: &str) -> Option<&[u8]> {
    self.entries.get(project).map(|b| b.bytes.as_slice())
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Manifest paths under backup
  pub fn manifests(&self) -> Vec<PathBuf> {
    self.entries.values().map(|b| b.manifest.clone()).collect()
  }

  /// Write one project's snapshot back to its manifest
  pub fn restore(&self, project: &str) -> ReleaseResult<()> {
    let backup = self
      .entries
      .get(project)
      .ok_or_else(|| ReleaseError::message(format!("No backup recorded for '{}'", project)))?;
    fs::write(&backup.manifest, &backup.bytes)
      .with_context(|| format!("Failed to restore {}", backup.manifest.display()))?;
    Ok(())
  }

  /// Restore every manifest, returning their paths
  pub fn restore_all(&self) -> ReleaseResult<Vec<PathBuf>> {
    for project in self.entries.keys() {
      self.restore(project)?;
    }
    Ok(self.manifests())
  }

  /// Drop the snapshots and delete any `.bkp` files
  pub fn discard(self) -> ReleaseResult<()> {
    for backup in self.entries.into_values() {
      if let Some(file) = backup.file
        && file.exists()
      {
        fs::remove_file(&file).with_context(|| format!("Failed to remove backup {}", file.display()))?;
      }
    }
    Ok(())
  }

  /// Keep the `.bkp` files for manual recovery, returning their paths
  pub fn keep(self) -> Vec<PathBuf> {
    self.entries.into_values().filter_map(|b| b.file).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_backup_path_appends_extension() {
    assert_eq!(
      backup_path(Path::new("src/Core/Core.csproj")),
      PathBuf::from("src/Core/Core.csproj.bkp")
    );
  }

  #[test]
  fn test_snapshot_restore_discard() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("Core.csproj");
    fs::write(&manifest, "<Project>old</Project>").unwrap();

    let mut store = BackupStore::new(true);
    store.snapshot("Core", &manifest).unwrap();
    assert!(backup_path(&manifest).is_file());

    fs::write(&manifest, "<Project>new</Project>").unwrap();
    store.restore("Core").unwrap();
    assert_eq!(fs::read_to_string(&manifest).unwrap(), "<Project>old</Project>");

    store.discard().unwrap();
    assert!(!backup_path(&manifest).exists());
  }

  #[test]
  fn test_in_memory_only() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("Core.csproj");
    fs::write(&manifest, "x").unwrap();

    let mut store = BackupStore::new(false);
    store.snapshot("Core", &manifest).unwrap();
    assert!(!backup_path(&manifest).exists());
    assert!(store.keep().is_empty());
  }

  #[test]
  fn test_adopt_persisted() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("Core.csproj");
    fs::write(&manifest, "changed").unwrap();

    let mut store = BackupStore::new(true);
    assert!(!store.adopt_persisted("Core", &manifest).unwrap());

    fs::write(backup_path(&manifest), "original").unwrap();
    assert!(store.adopt_persisted("Core", &manifest).unwrap());
    assert_eq!(store.restore_all().unwrap(), [manifest.clone()]);
    assert_eq!(fs::read_to_string(&manifest).unwrap(), "original");
  }

  #[test]
  fn test_snapshot_keeps_leftover_backup() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("Core.csproj");
    fs::write(&manifest, "bumped").unwrap();
    fs::write(backup_path(&manifest), "original").unwrap();

    let mut store = BackupStore::new(true);
    let err = store.snapshot("Core", &manifest).unwrap_err();
    assert!(err.to_string().contains("Leftover backup"));
    assert!(err.help_message().is_some_and(|h| h.contains("monorel rollback")));
    assert_eq!(fs::read_to_string(backup_path(&manifest)).unwrap(), "original");
    assert!(store.is_empty());
  }

  #[test]
  fn test_leftover_ignored_without_persistence() {
    let dir = TempDir::new().unwrap();
    let manifest = dir.path().join("Core.csproj");
    fs::write(&manifest, "bumped").unwrap();
    fs::write(backup_path(&manifest), "original").unwrap();

    let mut store = BackupStore::new(false);
    store.snapshot("Core", &manifest).unwrap();
    assert_eq!(fs::read_to_string(backup_path(&manifest)).unwrap(), "original");
  }

  #[test]
  fn test_restore_unknown_project() {
    let store = BackupStore::new(false);
    assert!(store.restore("Ghost").is_err());
  }
}
