//! Tracing initialisation
//!
//! Diagnostics go to stderr so that stdout stays reserved for the progress
//! lines and the `--json` plan output.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Map `-v` occurrences to a default level
pub fn level_for_verbosity(verbose: u8) -> Level {
  match verbose {
    0 => Level::WARN,
    1 => Level::INFO,
    2 => Level::DEBUG,
    _ => Level::TRACE,
  }
}

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` wins over `level` when set. Only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
  let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

  if json {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(fmt::layer().with_target(false).with_writer(std::io::stderr).json())
      .try_init()
      .ok();
  } else {
    tracing_subscriber::registry()
      .with(env_filter)
      .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
      .try_init()
      .ok();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_verbosity_levels() {
    assert_eq!(level_for_verbosity(0), Level::WARN);
    assert_eq!(level_for_verbosity(1), Level::INFO);
    assert_eq!(level_for_verbosity(2), Level::DEBUG);
    assert_eq!(level_for_verbosity(9), Level::TRACE);
  }

  #[test]
  fn test_init_twice_is_harmless() {
    init_tracing(false, Level::WARN);
    init_tracing(true, Level::DEBUG);
  }
}
