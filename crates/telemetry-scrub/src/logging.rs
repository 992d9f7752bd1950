//! Logging setup for the `tscrub` binary and tests.
//!
//! Library code only emits `tracing` events. Log lines never carry the
//! content being redacted, only field names, pattern names and counts.

use std::io::IsTerminal;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Environment variable with a filter directive for scrubber logs. Takes
/// precedence over `RUST_LOG`.
pub const LOG_ENV: &str = "TELEMETRY_SCRUB_LOG";

/// Targets the verbosity default applies to.
const TARGETS: &[&str] = &["telemetry_scrub", "tscrub"];

/// Verbosity level for logging output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Warnings and above, which includes scrub faults.
    #[default]
    Normal,
    /// Debug output: one line per field or step that changed.
    Verbose,
    /// Trace output: every filtered key and pattern hit.
    Trace,
}

impl Verbosity {
    /// Map the CLI's `-v` count and `-q` flag. `-q` wins.
    #[must_use]
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// Most verbose level emitted.
    #[must_use]
    pub fn level(self) -> LevelFilter {
        match self {
            Self::Quiet => LevelFilter::ERROR,
            Self::Normal => LevelFilter::WARN,
            Self::Verbose => LevelFilter::DEBUG,
            Self::Trace => LevelFilter::TRACE,
        }
    }

    /// Filter directives for the library and the binary at this level.
    #[must_use]
    pub fn directives(self) -> String {
        let level = self.level();
        TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn env_filter(verbosity: Verbosity) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()))
}

/// Install the global subscriber.
///
/// Logs go to stderr so scrubbed JSON on stdout stays machine-readable.
/// Filter precedence: `TELEMETRY_SCRUB_LOG`, then `RUST_LOG`, then
/// `verbosity`. Returns `false` if a subscriber was already installed.
///
/// # Examples
///
/// ```no_run
/// use telemetry_scrub::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::from_flags(1, false));
/// ```
pub fn init_logging(verbosity: Verbosity) -> bool {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter(verbosity))
        .with(layer)
        .try_init()
        .is_ok()
}

/// Initialize logging for tests.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("telemetry_scrub=trace")
        .with_test_writer()
        .try_init();
}
