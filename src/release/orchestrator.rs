//! Release pipeline
//!
//! Runs the stages in order for every resolved target:
//!
//! 1. Preflight: fail fast when a tag already exists
//! 2. Back up manifests
//! 3. Apply manifest patches
//! 4. Commit (and push) the version bump
//! 5. Create (and push) one tag per project
//! 6. Publish packages
//! 7. Create GitHub releases
//!
//! Each successful mutation registers its undo action. The first failure
//! unwinds everything registered so far and is reported as a
//! [`PipelineFailure`] that keeps the original error.

use super::backup::BackupStore;
use super::outcome::{PipelineFailure, PipelineOutcome, ReleasedTag};
use super::ports::{PackagePublisher, ReleaseHost, VersionControl, is_nothing_to_commit};
use super::saga::{CompensationReport, Saga};
use super::stage::Stage;
use crate::core::config::MonorelConfig;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::manifest::{self, Document, ManifestOptions};
use crate::plan::ReleaseTarget;
use crate::version::SemVer;
use std::fs;
use std::path::PathBuf;

/// Undo actions registered by the forward stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
  /// Write the backed-up bytes back to one manifest
  RestoreManifest { project: String },
  /// Restore every manifest, commit with the restore message and push
  RevertCommit,
  DeleteTag { tag: String },
  Unpublish {
    project: String,
    manifest: PathBuf,
    version: SemVer,
  },
  DeleteRelease { tag: String },
}

/// Settings for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
  pub commit_message: String,
  pub restore_message: String,
  /// Branch to push; `None` pushes `HEAD` to its upstream name
  pub branch: Option<String>,
  pub push: bool,
  pub persist_backups: bool,
  pub manifest: ManifestOptions,
}

impl PipelineOptions {
  pub fn from_config(config: &MonorelConfig) -> Self {
    Self {
      commit_message: config.git.commit_message.clone(),
      restore_message: config.git.restore_message.clone(),
      branch: config.git.branch.clone(),
      push: config.git.push,
      persist_backups: config.backup.persist,
      manifest: ManifestOptions::from(&config.manifest),
    }
  }

  /// Refspec used when pushing commits
  pub fn branch_refspec(&self) -> String {
    match &self.branch {
      Some(branch) => format!("HEAD:refs/heads/{}", branch),
      None => "HEAD".to_string(),
    }
  }
}

/// External systems the pipeline talks to
pub struct Collaborators<'a> {
  pub vcs: &'a mut dyn VersionControl,
  /// `None` skips the publish stage
  pub publisher: Option<&'a mut dyn PackagePublisher>,
  /// `None` skips GitHub releases
  pub host: Option<&'a mut dyn ReleaseHost>,
}

/// Minimal target description for recovering from a plan artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryTarget {
  pub project: String,
  pub manifest_path: PathBuf,
  pub tag: String,
}

struct RunState<'a> {
  collaborators: Collaborators<'a>,
  backups: BackupStore,
}

/// Where the run currently is, for failure reports
struct Cursor {
  stage: Stage,
  project: Option<String>,
}

impl Cursor {
  fn enter(&mut self, stage: Stage) {
    tracing::debug!(stage = %stage, "entering stage");
    self.stage = stage;
    self.project = None;
  }

  fn focus(&mut self, project: &str) {
    self.project = Some(project.to_string());
  }
}

pub struct Orchestrator {
  options: PipelineOptions,
}

impl Orchestrator {
  pub fn new(options: PipelineOptions) -> Self {
    Self { options }
  }

  /// Check that no target tag exists yet
  pub fn preflight(&self, targets: &[ReleaseTarget], vcs: &mut dyn VersionControl) -> ReleaseResult<()> {
    for target in targets {
      if vcs.tag_exists(&target.tag)? {
        return Err(ReleaseError::TagAlreadyExists {
          tag: target.tag.clone(),
        });
      }
    }
    Ok(())
  }

  /// Run the whole pipeline
  pub fn run(&self, targets: &[ReleaseTarget], collaborators: Collaborators<'_>) -> PipelineOutcome {
    let mut state = RunState {
      collaborators,
      backups: BackupStore::new(self.options.persist_backups),
    };
    let mut saga = Saga::new();
    let mut cursor = Cursor {
      stage: Stage::Preflight,
      project: None,
    };

    match self.forward(targets, &mut state, &mut saga, &mut cursor) {
      Ok(tags) => {
        if let Err(e) = state.backups.discard() {
          tracing::warn!(error = %e, "could not remove manifest backups");
        }
        tracing::info!(released = tags.len(), "release complete");
        PipelineOutcome::Success { tags }
      }
      Err(reason) => self.fail(state, saga, cursor, reason),
    }
  }

  fn forward(
    &self,
    targets: &[ReleaseTarget],
    state: &mut RunState<'_>,
    saga: &mut Saga<Compensation>,
    cursor: &mut Cursor,
  ) -> ReleaseResult<Vec<ReleasedTag>> {
    cursor.enter(Stage::Preflight);
    println!("🔍 Checking tags...");
    self.preflight(targets, &mut *state.collaborators.vcs)?;

    cursor.enter(Stage::BackupManifests);
    for target in targets {
      cursor.focus(&target.project);
      state.backups.snapshot(&target.project, &target.manifest_path)?;
    }

    cursor.enter(Stage::ApplyPatches);
    println!("📝 Updating manifests...");
    for target in targets {
      cursor.focus(&target.project);
      let original = state
        .backups
        .bytes(&target.project)
        .ok_or_else(|| ReleaseError::message(format!("No backup recorded for '{}'", target.project)))?;
      let doc = Document::from_bytes(original).map_err(|e| e.at(&target.manifest_path))?;
      let updated = manifest::apply(doc, &target.patch, &self.options.manifest).map_err(|e| e.at(&target.manifest_path))?;
      let bytes = manifest::render(&updated, &target.manifest_path)?;

      saga.push(
        Stage::ApplyPatches,
        format!("restore {}", target.manifest_path.display()),
        Compensation::RestoreManifest {
          project: target.project.clone(),
        },
      );
      fs::write(&target.manifest_path, bytes)
        .with_context(|| format!("Failed to write {}", target.manifest_path.display()))?;
      println!("   {} {} → {}", target.project, target.old_version, target.new_version);
    }

    cursor.enter(Stage::CommitChanges);
    let manifests: Vec<PathBuf> = targets.iter().map(|t| t.manifest_path.clone()).collect();
    state.collaborators.vcs.commit(&manifests, &self.options.commit_message)?;
    saga.push(Stage::CommitChanges, "revert version commit", Compensation::RevertCommit);
    println!("✅ Committed: {}", self.options.commit_message);
    if self.options.push {
      state.collaborators.vcs.push(&self.options.branch_refspec())?;
    }

    cursor.enter(Stage::CreateTag);
    for target in targets {
      cursor.focus(&target.project);
      if state.collaborators.vcs.tag_exists(&target.tag)? {
        return Err(ReleaseError::TagAlreadyExists {
          tag: target.tag.clone(),
        });
      }
      let message = format!("Release {}", target.tag);
      state.collaborators.vcs.create_tag(&target.tag, &message)?;
      saga.push(
        Stage::CreateTag,
        format!("delete tag {}", target.tag),
        Compensation::DeleteTag {
          tag: target.tag.clone(),
        },
      );
      if self.options.push {
        state.collaborators.vcs.push(&format!("refs/tags/{}", target.tag))?;
      }
      println!("🏷️  Tagged {}", target.tag);
    }

    cursor.enter(Stage::PublishPackage);
    if let Some(publisher) = state.collaborators.publisher.as_deref_mut() {
      println!("📦 Publishing packages...");
      for target in targets {
        cursor.focus(&target.project);
        publisher.publish(&target.project, &target.manifest_path, target.new_version)?;
        saga.push(
          Stage::PublishPackage,
          format!("unpublish {} {}", target.project, target.new_version),
          Compensation::Unpublish {
            project: target.project.clone(),
            manifest: target.manifest_path.clone(),
            version: target.new_version,
          },
        );
      }
    } else {
      tracing::info!("package publishing disabled");
    }

    cursor.enter(Stage::PublishGithubRelease);
    if let Some(host) = state.collaborators.host.as_deref_mut() {
      for target in targets {
        cursor.focus(&target.project);
        host.create_release(&target.tag, &target.tag, &target.patch.release_notes)?;
        saga.push(
          Stage::PublishGithubRelease,
          format!("delete release {}", target.tag),
          Compensation::DeleteRelease {
            tag: target.tag.clone(),
          },
        );
        println!("🚀 Released {}", target.tag);
      }
    } else {
      tracing::info!("GitHub releases disabled");
    }

    cursor.enter(Stage::Done);
    Ok(targets.iter().map(|t| (t.project.clone(), t.tag.clone())).collect())
  }

  fn fail(
    &self,
    mut state: RunState<'_>,
    saga: Saga<Compensation>,
    cursor: Cursor,
    reason: ReleaseError,
  ) -> PipelineOutcome {
    tracing::error!(
      stage = %cursor.stage,
      project = cursor.project.as_deref().unwrap_or("-"),
      error = %reason,
      "release stage failed"
    );
    if !saga.is_empty() {
      println!("\n↩️  Undoing {} step(s)...", saga.len());
    }

    let report = saga.unwind(|action| self.compensate(action, &mut state));
    let kept_backups = if report.is_complete() {
      if let Err(e) = state.backups.discard() {
        tracing::warn!(error = %e, "could not remove manifest backups");
      }
      Vec::new()
    } else {
      state.backups.keep()
    };

    PipelineOutcome::Failure(Box::new(PipelineFailure {
      failed_stage: cursor.stage,
      project: cursor.project,
      reason,
      compensations: report,
      kept_backups,
    }))
  }

  fn compensate(&self, action: &Compensation, state: &mut RunState<'_>) -> ReleaseResult<()> {
    match action {
      Compensation::RestoreManifest { project } => state.backups.restore(project),
      Compensation::RevertCommit => {
        let manifests = state.backups.restore_all()?;
        match state.collaborators.vcs.commit(&manifests, &self.options.restore_message) {
          Ok(()) => {}
          Err(e) if is_nothing_to_commit(&e) => {
            tracing::info!("manifests already match HEAD");
            return Ok(());
          }
          Err(e) => return Err(e),
        }
        if self.options.push {
          state.collaborators.vcs.push(&self.options.branch_refspec())?;
        }
        Ok(())
      }
      Compensation::DeleteTag { tag } => state.collaborators.vcs.delete_tag(tag),
      Compensation::Unpublish {
        project,
        manifest,
        version,
      } => match state.collaborators.publisher.as_deref_mut() {
        Some(publisher) => publisher.unpublish(project, manifest, *version),
        None => Ok(()),
      },
      Compensation::DeleteRelease { tag } => match state.collaborators.host.as_deref_mut() {
        Some(host) => host.delete_release(tag),
        None => Ok(()),
      },
    }
  }

  /// Best-effort cleanup after a run that died without compensating
  ///
  /// Deletes GitHub releases and tags, then restores manifests from any
  /// `.bkp` files and commits the restore. Backup files are removed only
  /// when every step succeeded.
  pub fn rollback(
    &self,
    targets: &[RecoveryTarget],
    collaborators: Collaborators<'_>,
  ) -> ReleaseResult<CompensationReport> {
    let mut state = RunState {
      collaborators,
      backups: BackupStore::new(true),
    };
    let mut saga = Saga::new();

    for target in targets {
      if state.backups.adopt_persisted(&target.project, &target.manifest_path)? {
        tracing::info!(project = %target.project, "found manifest backup");
      }
    }
    if !state.backups.is_empty() {
      saga.push(Stage::CommitChanges, "restore manifests from backups", Compensation::RevertCommit);
    }
    for target in targets {
      saga.push(
        Stage::CreateTag,
        format!("delete tag {}", target.tag),
        Compensation::DeleteTag {
          tag: target.tag.clone(),
        },
      );
    }
    if state.collaborators.host.is_some() {
      for target in targets {
        saga.push(
          Stage::PublishGithubRelease,
          format!("delete release {}", target.tag),
          Compensation::DeleteRelease {
            tag: target.tag.clone(),
          },
        );
      }
    }

    let report = saga.unwind(|action| self.compensate(action, &mut state));
    if report.is_complete() {
      state.backups.discard()?;
    }
    Ok(report)
  }
}
