//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::io::Read;
use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::error::Result;
use crate::value::Value;

/// Arguments shared by the `event` and `breadcrumb` commands.
#[derive(Debug, Args)]
pub struct ScrubCommand {
    /// JSON file to read (reads stdin when omitted or `-`)
    pub file: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "compact")]
    pub format: OutputFormat,
}

impl ScrubCommand {
    /// The input file, or `None` for stdin.
    #[must_use]
    pub fn input_path(&self) -> Option<&PathBuf> {
        self.file.as_ref().filter(|p| p.as_os_str() != "-")
    }

    /// Read and parse the input payload.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Io`] if the input cannot be read and
    /// [`crate::Error::Json`] if it is not valid JSON.
    pub fn read_value(&self) -> Result<Value> {
        let text = match self.input_path() {
            Some(path) => std::fs::read_to_string(path)?,
            None => {
                let mut buffer = String::new();
                std::io::stdin().read_to_string(&mut buffer)?;
                buffer
            }
        };
        Ok(serde_json::from_str(&text)?)
    }
}

/// Text command arguments.
#[derive(Debug, Args)]
pub struct TextCommand {
    /// The text to scrub
    pub text: String,

    /// Treat the text as an exception value (also redacts quoted content)
    #[arg(short, long)]
    pub exception: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for scrubbed JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Single-line JSON
    #[default]
    Compact,
    /// Indented JSON
    Pretty,
}

impl OutputFormat {
    /// Render a hook result, `null` when the payload was dropped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Json`] if serialization fails.
    pub fn render(self, output: Option<&Value>) -> Result<String> {
        let rendered = match self {
            Self::Compact => serde_json::to_string(&output)?,
            Self::Pretty => serde_json::to_string_pretty(&output)?,
        };
        Ok(rendered)
    }
}
