//! `monorel plan`

use super::PrInput;
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::plan::{PlanArtifact, PlanId};
use std::path::Path;

/// Run the plan command
pub fn run_plan(ctx: &ReleaseContext, pr: &PrInput, json: bool, output: Option<&Path>) -> ReleaseResult<()> {
  let targets = super::resolve(ctx, pr)?;
  let artifact = PlanArtifact::new(PlanId::from_pr(&pr.title, &pr.body), &targets, &ctx.root);

  if json {
    println!("{}", artifact.to_json()?);
  } else {
    print_plan(&artifact);
  }

  if let Some(path) = output {
    artifact.write(&ctx.root.join(path))?;
    if !json {
      println!("💾 Plan written to {}", path.display());
    }
  }

  Ok(())
}

pub(crate) fn print_plan(artifact: &PlanArtifact) {
  println!("📦 Release plan {}", artifact.plan_id);
  println!();
  for target in &artifact.targets {
    println!(
      "  {}  {} → {} ({})",
      target.project, target.old_version, target.new_version, target.bump
    );
    println!("    manifest: {}", target.manifest);
    println!("    tag:      {}", target.tag);
    if target.changelog.is_empty() {
      println!("    (no changelog entries)");
    } else {
      for line in &target.changelog {
        println!("    - {}", line);
      }
    }
  }
  println!();
}
