mod commands;
mod core;
mod manifest;
mod plan;
mod release;
mod telemetry;
mod utils;
mod version;

use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::PrInput;
use core::config::ConfigOverrides;
use core::context::ReleaseContext;
use core::error::{ReleaseError, print_error};
use std::path::PathBuf;

/// Release projects of a monorepo from pull request text
#[derive(Parser)]
#[command(name = "monorel")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  /// Path to monorel.toml (default: searched from the current directory)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  verbose: u8,

  /// Diagnostic log format
  #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
  log_format: LogFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
  Text,
  Json,
}

#[derive(Subcommand)]
enum Commands {
  /// Parse the PR and show the release plan
  Plan {
    #[command(flatten)]
    pr: PrArgs,
    #[command(flatten)]
    overrides: OverrideArgs,
    /// Output the plan in JSON format
    #[arg(long)]
    json: bool,
    /// Also write the plan artifact to this file
    #[arg(long)]
    output: Option<PathBuf>,
  },

  /// Bump, commit, tag, publish and create GitHub releases
  Release {
    #[command(flatten)]
    pr: PrArgs,
    #[command(flatten)]
    overrides: OverrideArgs,
    /// Show what would happen without making changes
    #[arg(long)]
    dry_run: bool,
    /// Do not write release-plan.json
    #[arg(long)]
    no_artifact: bool,
  },

  /// Print a version bumped by major, minor or patch
  Bump {
    /// Current version (MAJOR.MINOR.PATCH)
    #[arg(value_name = "VERSION")]
    current: String,
    /// Bump kind: major, minor or patch
    kind: String,
  },

  /// Undo an interrupted release using its plan artifact
  Rollback {
    /// Plan artifact written by `monorel release`
    #[arg(long, default_value = commands::ARTIFACT_FILE)]
    plan: PathBuf,
    #[command(flatten)]
    overrides: OverrideArgs,
  },
}

#[derive(Args)]
struct PrArgs {
  /// Pull request title, e.g. "Core minor, Utils patch"
  #[arg(long, env = "PR_TITLE", allow_hyphen_values = true)]
  title: String,
  /// Pull request body with per-project changelog blocks
  #[arg(long, env = "PR_BODY", default_value = "", allow_hyphen_values = true)]
  body: String,
}

#[derive(Args)]
struct OverrideArgs {
  /// Directory holding the projects
  #[arg(long, env = "LIB_PATH")]
  root: Option<PathBuf>,
  /// Branch to push the version commit to
  #[arg(long, env = "GITHUB_HEAD_REF")]
  branch: Option<String>,
  /// Commit author name
  #[arg(long, env = "BOT_NAME")]
  bot_name: Option<String>,
  /// Commit author email
  #[arg(long, env = "BOT_MAIL")]
  bot_email: Option<String>,
  /// Package source URL
  #[arg(long, env = "NUGET_REGISTRY")]
  source: Option<String>,
}

impl From<OverrideArgs> for ConfigOverrides {
  fn from(args: OverrideArgs) -> Self {
    Self {
      projects_root: args.root,
      branch: args.branch,
      bot_name: args.bot_name,
      bot_email: args.bot_email,
      source: args.source,
    }
  }
}

impl From<PrArgs> for PrInput {
  fn from(args: PrArgs) -> Self {
    Self {
      title: args.title,
      body: args.body,
    }
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  telemetry::init_tracing(
    cli.log_format == LogFormat::Json,
    telemetry::level_for_verbosity(cli.verbose),
  );

  if let Err(err) = run(cli) {
    handle_error(err);
  }
}

fn run(cli: Cli) -> Result<(), ReleaseError> {
  let config_path = cli.config;
  match cli.command {
    Commands::Bump { current, kind } => commands::run_bump(&current, &kind),
    Commands::Plan {
      pr,
      overrides,
      json,
      output,
    } => {
      let ctx = build_context(config_path, overrides)?;
      commands::run_plan(&ctx, &pr.into(), json, output.as_deref())
    }
    Commands::Release {
      pr,
      overrides,
      dry_run,
      no_artifact,
    } => {
      let ctx = build_context(config_path, overrides)?;
      commands::run_release(&ctx, &pr.into(), dry_run, no_artifact)
    }
    Commands::Rollback { plan, overrides } => {
      let ctx = build_context(config_path, overrides)?;
      commands::run_rollback(&ctx, &plan)
    }
  }
}

/// Build the release context once for the repository in the current directory
fn build_context(config_path: Option<PathBuf>, overrides: OverrideArgs) -> Result<ReleaseContext, ReleaseError> {
  let root = std::env::current_dir()?;
  ReleaseContext::build(&root, config_path.as_deref(), &overrides.into())
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
