//! `monorel rollback`
//!
//! Manual recovery for a run that died before it could compensate. Every
//! step is attempted; the command fails if any of them did.

use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult};
use crate::plan::PlanArtifact;
use crate::release::github::GhCliHost;
use crate::release::{Collaborators, Orchestrator, PipelineOptions, RecoveryTarget, ReleaseHost};
use std::path::Path;

/// Run the rollback command
pub fn run_rollback(ctx: &ReleaseContext, plan: &Path) -> ReleaseResult<()> {
  let artifact = PlanArtifact::read(&ctx.root.join(plan))?;
  println!(
    "↩️  Rolling back plan {} ({} project(s))",
    artifact.plan_id,
    artifact.targets.len()
  );

  let targets: Vec<RecoveryTarget> = artifact
    .targets
    .iter()
    .map(|t| RecoveryTarget {
      project: t.project.clone(),
      manifest_path: ctx.root.join(&t.manifest),
      tag: t.tag.clone(),
    })
    .collect();

  let mut vcs = super::open_vcs(ctx)?;
  let mut host = ctx
    .config
    .github
    .enabled
    .then(|| GhCliHost::new(ctx.config.github.gh.clone(), &ctx.root, ctx.config.timeout()));

  let report = Orchestrator::new(PipelineOptions::from_config(&ctx.config)).rollback(
    &targets,
    Collaborators {
      vcs: &mut vcs,
      publisher: None,
      host: host.as_mut().map(|h| h as &mut dyn ReleaseHost),
    },
  )?;

  if report.is_complete() {
    println!("✅ {}", report.summary());
    return Ok(());
  }

  let mut message = report.summary();
  for (label, error) in &report.failed {
    message.push_str(&format!("\n  - {}: {}", label, error));
  }
  Err(ReleaseError::with_help(
    message,
    "Finish the failed steps by hand; manifest backups (.bkp) were left in place",
  ))
}
