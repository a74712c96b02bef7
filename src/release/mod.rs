//! Release execution
//!
//! - **orchestrator**: the staged pipeline and artifact-driven rollback
//! - **saga**: compensation stack unwound on failure
//! - **backup**: manifest snapshots (`.bkp`)
//! - **ports**: collaborator traits plus the git adapter
//! - **publish** / **github**: package registry and GitHub release adapters

pub mod backup;
pub mod github;
pub mod orchestrator;
pub mod outcome;
pub mod ports;
pub mod publish;
pub mod saga;
pub mod stage;

pub use orchestrator::{Collaborators, Orchestrator, PipelineOptions, RecoveryTarget};
pub use outcome::{PipelineFailure, PipelineOutcome};
pub use ports::{GitVcs, PackagePublisher, ReleaseHost, VersionControl};
pub use stage::Stage;
