//! Compensation stack
//!
//! Each forward step that succeeds pushes the action that undoes it. On
//! failure the stack is unwound newest-first. Every compensation is attempted
//! even when an earlier one fails; failures are collected in the report and
//! never replace the error that triggered the unwind.

use super::stage::Stage;
use crate::core::error::ReleaseResult;

/// A registered compensation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaEntry<A> {
  pub stage: Stage,
  pub label: String,
  pub action: A,
}

/// Stack of compensations for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Saga<A> {
  entries: Vec<SagaEntry<A>>,
}

impl<A> Default for Saga<A> {
  fn default() -> Self {
    Self::new()
  }
}

impl<A> Saga<A> {
  pub fn new() -> Self {
    Self { entries: Vec::new() }
  }

  /// Register the compensation for a step that just succeeded
  pub fn push(&mut self, stage: Stage, label: impl Into<String>, action: A) {
    let label = label.into();
    tracing::debug!(stage = %stage, action = %label, "registered compensation");
    self.entries.push(SagaEntry { stage, label, action });
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Run every compensation, newest first
  pub fn unwind<F>(mut self, mut compensate: F) -> CompensationReport
  where
    F: FnMut(&A) -> ReleaseResult<()>,
  {
    let mut report = CompensationReport::new();
    while let Some(entry) = self.entries.pop() {
      match compensate(&entry.action) {
        Ok(()) => {
          tracing::info!(stage = %entry.stage, action = %entry.label, "compensation applied");
          println!("   ↩️  {}", entry.label);
          report.record_success(entry.label);
        }
        Err(e) => {
          tracing::error!(stage = %entry.stage, action = %entry.label, error = %e, "compensation failed");
          println!("   ⚠️  {} failed: {}", entry.label, e);
          report.record_failure(entry.label, e.to_string());
        }
      }
    }
    report
  }
}

/// Result of unwinding a saga
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompensationReport {
  /// Compensations that succeeded, in the order they ran
  pub applied: Vec<String>,
  /// Compensations that failed, with their error text
  pub failed: Vec<(String, String)>,
}

impl CompensationReport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record_success(&mut self, label: String) {
    self.applied.push(label);
  }

  pub fn record_failure(&mut self, label: String, error: String) {
    self.failed.push((label, error));
  }

  /// True when nothing failed
  pub fn is_complete(&self) -> bool {
    self.failed.is_empty()
  }

  /// Get a summary string for display.
  pub fn summary(&self) -> String {
    if self.is_complete() {
      format!("Rolled back {} step(s) successfully", self.applied.len())
    } else {
      format!(
        "Partial rollback: {} succeeded, {} failed",
        self.applied.len(),
        self.failed.len()
      )
    }
  }
}
