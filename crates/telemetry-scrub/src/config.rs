//! Configuration management for telemetry-scrub.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::redact::{
    builtin_patterns, email_regex, FilterPattern, DEFAULT_MAX_DEPTH, EMAIL_PLACEHOLDER,
    FILTERED_PLACEHOLDER,
};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "telemetry-scrub";

/// Environment variable prefix.
const ENV_PREFIX: &str = "TELEMETRY_SCRUB_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TELEMETRY_SCRUB_`, sections
///    separated by `__`, e.g. `TELEMETRY_SCRUB_SCRUB__MAX_DEPTH`)
/// 2. TOML config file at `~/.config/telemetry-scrub/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scrubbing configuration.
    pub scrub: ScrubConfig,
}

/// What a hook returns when a scrub step fails internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultPolicy {
    /// Return the value with every step that succeeded applied.
    #[default]
    BestEffort,
    /// Drop the event or breadcrumb.
    Suppress,
}

/// Scrubbing configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubConfig {
    /// Whether scrubbing is enabled. When disabled the hooks pass values
    /// through unchanged.
    pub enabled: bool,
    /// Behavior when a scrub step fails.
    pub fault_policy: FaultPolicy,
    /// Nesting depth past which containers are replaced outright.
    pub max_depth: usize,
    /// Sentinel for filtered fields, secrets and quoted text.
    pub filtered_placeholder: String,
    /// Sentinel for email addresses.
    pub email_placeholder: String,
    /// Additional key names to filter (exact, case-sensitive).
    pub extra_sensitive_keys: Vec<String>,
    /// Additional key fragments to filter (substring, case-sensitive).
    pub extra_sensitive_fragments: Vec<String>,
    /// Apply built-in secret patterns to free text.
    pub use_builtin_patterns: bool,
    /// Custom regex patterns applied to free text.
    pub custom_patterns: Vec<String>,
    /// Replace quoted text inside exception values.
    pub redact_quoted_exception_text: bool,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fault_policy: FaultPolicy::BestEffort,
            max_depth: DEFAULT_MAX_DEPTH,
            filtered_placeholder: FILTERED_PLACEHOLDER.to_string(),
            email_placeholder: EMAIL_PLACEHOLDER.to_string(),
            extra_sensitive_keys: Vec::new(),
            extra_sensitive_fragments: Vec::new(),
            use_builtin_patterns: true,
            custom_patterns: Vec::new(),
            redact_quoted_exception_text: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `TELEMETRY_SCRUB_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.scrub.validate()
    }
}

impl ScrubConfig {
    /// Validate the scrubbing configuration.
    ///
    /// Placeholders must be non-empty and must not be matched by any text
    /// rule, so scrubbing an already scrubbed value changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.max_depth == 0 {
            return Err(Error::config_validation("max_depth must be greater than 0"));
        }

        let mut patterns = if self.use_builtin_patterns {
            builtin_patterns()
        } else {
            Vec::new()
        };
        for (i, pattern) in self.custom_patterns.iter().enumerate() {
            let compiled = FilterPattern::custom(format!("custom_{i}"), pattern).map_err(|e| {
                Error::config_validation(format!("invalid regex pattern: {pattern} ({e})"))
            })?;
            patterns.push(compiled);
        }

        for (field, placeholder) in [
            ("filtered_placeholder", &self.filtered_placeholder),
            ("email_placeholder", &self.email_placeholder),
        ] {
            if placeholder.is_empty() {
                return Err(Error::config_validation(format!("{field} must not be empty")));
            }
            if email_regex().is_match(placeholder) {
                return Err(Error::config_validation(format!(
                    "{field} '{placeholder}' looks like an email address"
                )));
            }
            if let Some(pattern) = patterns.iter().find(|p| p.matches(placeholder)) {
                return Err(Error::config_validation(format!(
                    "{field} '{placeholder}' is matched by pattern {}",
                    pattern.name
                )));
            }
        }

        Ok(())
    }
}
