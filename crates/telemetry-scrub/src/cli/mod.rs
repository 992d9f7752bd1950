//! Command-line interface for telemetry-scrub.
//!
//! This module provides the CLI structure for the `tscrub` binary, which
//! runs captured telemetry payloads through the same hooks the SDK uses.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, OutputFormat, ScrubCommand, TextCommand};

/// tscrub - Scrub telemetry payloads before they leave the device
///
/// Reads an event or breadcrumb as JSON, applies the privacy hooks, and
/// prints what would be sent to the telemetry backend.
#[derive(Debug, Parser)]
#[command(name = "tscrub")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Scrub an event
    Event(ScrubCommand),

    /// Scrub a breadcrumb
    Breadcrumb(ScrubCommand),

    /// Scrub free text
    Text(TextCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Config(ConfigCommand::Path),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "tscrub");
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_event_from_file() {
        let cli = Cli::try_parse_from(["tscrub", "event", "event.json", "--format", "pretty"])
            .unwrap();
        match cli.command {
            Command::Event(cmd) => {
                assert_eq!(cmd.file, Some(PathBuf::from("event.json")));
                assert_eq!(cmd.format, OutputFormat::Pretty);
            }
            other => panic!("Expected event command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_breadcrumb_from_stdin() {
        let cli = Cli::try_parse_from(["tscrub", "breadcrumb"]).unwrap();
        match cli.command {
            Command::Breadcrumb(cmd) => {
                assert!(cmd.file.is_none());
                assert_eq!(cmd.format, OutputFormat::Compact);
            }
            other => panic!("Expected breadcrumb command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_text() {
        let cli = Cli::try_parse_from(["tscrub", "text", "--exception", "hi a@b.io"]).unwrap();
        match cli.command {
            Command::Text(cmd) => {
                assert_eq!(cmd.text, "hi a@b.io");
                assert!(cmd.exception);
            }
            other => panic!("Expected text command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_validate() {
        let cli = Cli::try_parse_from(["tscrub", "config", "validate", "-f", "scrub.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { file: Some(_) })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["tscrub", "-c", "/custom/config.toml", "config", "path"])
            .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(["tscrub", "-vv", "text", "x"]).unwrap();
        assert_eq!(cli.verbose, 2);

        let cli = Cli::try_parse_from(["tscrub", "-q", "text", "x"]).unwrap();
        assert!(cli.quiet);
    }
}
