//! CLI commands for monorel
//!
//! - **plan**: parse the PR and show (or save) the release plan
//! - **release**: run the full pipeline
//! - **bump**: apply a bump to a version string
//! - **rollback**: clean up after an interrupted run, from a plan artifact
//!
//! Commands that touch the repository take `&ReleaseContext` so config and
//! layout are loaded once.

pub mod bump;
pub mod plan;
pub mod release;
pub mod rollback;

pub use bump::run_bump;
pub use plan::run_plan;
pub use release::run_release;
pub use rollback::run_rollback;

use crate::core::config::GitConfig;
use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::core::vcs::{GitIdentity, SystemGit};
use crate::plan::{ParseOptions, ReleaseTarget, resolve_targets};
use crate::release::GitVcs;

/// Default location of the plan artifact written by `release`
pub const ARTIFACT_FILE: &str = "release-plan.json";

/// PR text, from flags or the CI environment
#[derive(Debug, Clone)]
pub struct PrInput {
  pub title: String,
  pub body: String,
}

/// Parse the PR and resolve every target against its manifest
///
/// Reads only; nothing is written.
pub(crate) fn resolve(ctx: &ReleaseContext, pr: &PrInput) -> ReleaseResult<Vec<ReleaseTarget>> {
  let known = ctx.layout.discover_projects()?;
  let options = ParseOptions {
    title_prefix: ctx.config.pr.title_prefix.as_deref(),
    default_project: ctx.config.pr.default_project.as_deref(),
  };
  let plan = crate::plan::parse(&pr.title, &pr.body, &known, &options)?;
  tracing::info!(projects = plan.len(), "parsed release plan");
  resolve_targets(&plan, &ctx.layout, &ctx.config.manifest)
}

/// Git adapter configured from the context
pub(crate) fn open_vcs(ctx: &ReleaseContext) -> ReleaseResult<GitVcs> {
  let git = SystemGit::open(&ctx.root)?
    .with_identity(identity(&ctx.config.git))
    .with_timeout(ctx.config.timeout());
  Ok(GitVcs::new(git, ctx.config.git.remote.clone(), ctx.config.git.push))
}

fn identity(config: &GitConfig) -> Option<GitIdentity> {
  match (&config.bot_name, &config.bot_email) {
    (Some(name), Some(email)) => Some(GitIdentity {
      name: name.clone(),
      email: email.clone(),
    }),
    (None, None) => None,
    _ => {
      tracing::warn!("bot name and email must be set together; using the ambient git identity");
      None
    }
  }
}
