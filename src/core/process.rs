//! External process execution with a deadline
//!
//! Every collaborator (git, dotnet, gh, custom publish commands) runs through
//! [`run`] or [`run_checked`]. Output pipes are drained on helper threads so a
//! chatty child cannot block on a full pipe while we wait for it. A child that
//! outlives its deadline is killed and reported as [`CommandError::TimedOut`].

use crate::core::error::{CommandError, ReleaseResult};
use std::io::Read;
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);
const REDACTED: &str = "******";

/// Render a command line for logs and error messages
///
/// Any argument containing one of `secrets` is replaced wholesale.
pub fn describe(cmd: &Command, secrets: &[&str]) -> String {
  std::iter::once(cmd.get_program())
    .chain(cmd.get_args())
    .map(|part| {
      let part = part.to_string_lossy();
      if secrets.iter().any(|s| !s.is_empty() && part.contains(s)) {
        REDACTED.to_string()
      } else {
        part.into_owned()
      }
    })
    .collect::<Vec<_>>()
    .join(" ")
}

/// Run to completion and capture output, whatever the exit status
///
/// `label` is the already-redacted command line used in errors.
pub fn run(mut cmd: Command, timeout: Duration, label: &str) -> ReleaseResult<Output> {
  cmd.stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());

  tracing::debug!(command = %label, timeout_secs = timeout.as_secs(), "spawning");
  let mut child = cmd.spawn().map_err(|e| CommandError::Spawn {
    command: label.to_string(),
    reason: e.to_string(),
  })?;

  let stdout = child.stdout.take();
  let stderr = child.stderr.take();
  let stdout_reader = thread::spawn(move || drain(stdout));
  let stderr_reader = thread::spawn(move || drain(stderr));

  let deadline = Instant::now() + timeout;
  let status = loop {
    if let Some(status) = child.try_wait()? {
      break status;
    }
    if Instant::now() >= deadline {
      let _ = child.kill();
      let _ = child.wait();
      tracing::warn!(command = %label, "killed after timeout");
      return Err(
        CommandError::TimedOut {
          command: label.to_string(),
          secs: timeout.as_secs(),
        }
        .into(),
      );
    }
    thread::sleep(POLL_INTERVAL);
  };

  Ok(Output {
    status,
    stdout: stdout_reader.join().unwrap_or_default(),
    stderr: stderr_reader.join().unwrap_or_default(),
  })
}

/// Like [`run`], but a non-zero exit becomes [`CommandError::Failed`]
pub fn run_checked(cmd: Command, timeout: Duration, label: &str) -> ReleaseResult<Output> {
  let output = run(cmd, timeout, label)?;
  if !output.status.success() {
    return Err(
      CommandError::Failed {
        command: label.to_string(),
        status: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      }
      .into(),
    );
  }
  Ok(output)
}

fn drain<R: Read>(pipe: Option<R>) -> Vec<u8> {
  let mut buf = Vec::new();
  if let Some(mut pipe) = pipe {
    let _ = pipe.read_to_end(&mut buf);
  }
  buf
}
