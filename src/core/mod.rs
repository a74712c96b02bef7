//! Core building blocks shared by every command
//!
//! - **config**: monorel.toml parsing, defaults, overrides and validation
//! - **context**: repository root, config and layout built once per run
//! - **error**: error types with contextual help messages and exit codes
//! - **layout**: project id to manifest / README path mapping
//! - **process**: external commands with deadlines
//! - **vcs**: Git operations (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod layout;
pub mod process;
pub mod vcs;
