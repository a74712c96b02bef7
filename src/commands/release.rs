//! `monorel release`

use super::{ARTIFACT_FILE, PrInput};
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::plan::{PlanArtifact, PlanId};
use crate::release::github::GhCliHost;
use crate::release::{Collaborators, Orchestrator, PackagePublisher, PipelineOptions, ReleaseHost, publish};

/// Run the release command
pub fn run_release(ctx: &ReleaseContext, pr: &PrInput, dry_run: bool, no_artifact: bool) -> ReleaseResult<()> {
  let targets = super::resolve(ctx, pr)?;
  let artifact = PlanArtifact::new(PlanId::from_pr(&pr.title, &pr.body), &targets, &ctx.root);
  super::plan::print_plan(&artifact);

  let mut vcs = super::open_vcs(ctx)?;
  let orchestrator = Orchestrator::new(PipelineOptions::from_config(&ctx.config));

  if dry_run {
    orchestrator.preflight(&targets, &mut vcs)?;
    let tags: Vec<&str> = targets.iter().map(|t| t.tag.as_str()).collect();
    println!("🔍 Dry-run mode (no changes applied)");
    println!("   Would commit: {}", ctx.config.git.commit_message);
    println!("   Would tag:    {}", tags.join(", "));
    return Ok(());
  }

  // Collaborators are built before anything is mutated so missing secrets fail early
  let timeout = ctx.config.timeout();
  let mut publisher = publish::from_config(&ctx.config.publish, &ctx.root, timeout)?;
  let mut host = ctx
    .config
    .github
    .enabled
    .then(|| GhCliHost::new(ctx.config.github.gh.clone(), &ctx.root, timeout));

  if !no_artifact {
    artifact.write(&ctx.root.join(ARTIFACT_FILE))?;
  }

  let outcome = orchestrator.run(
    &targets,
    Collaborators {
      vcs: &mut vcs,
      publisher: publisher.as_mut().map(|p| &mut **p as &mut dyn PackagePublisher),
      host: host.as_mut().map(|h| h as &mut dyn ReleaseHost),
    },
  );

  let tags = outcome.into_result()?;
  println!();
  println!("✅ Released {} project(s)", tags.len());
  for (project, tag) in &tags {
    println!("   {} → {}", project, tag);
  }
  Ok(())
}
