//! `tscrub` - CLI for telemetry-scrub
//!
//! This binary runs captured telemetry payloads through the privacy hooks and
//! prints the result, so the effect of a configuration can be checked
//! before it ships.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use clap::Parser;

use telemetry_scrub::cli::{Cli, Command, ConfigCommand, ScrubCommand, TextCommand};
use telemetry_scrub::{init_logging, Config, Scrubber, Value};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;
    let scrubber = Scrubber::with_config(config.scrub.clone());

    match cli.command {
        Command::Event(cmd) => handle_scrub(&cmd, |v| scrubber.before_send(v))?,
        Command::Breadcrumb(cmd) => handle_scrub(&cmd, |v| scrubber.before_breadcrumb(v))?,
        Command::Text(cmd) => handle_text(&scrubber, &cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd)?,
    }
    Ok(())
}

fn handle_scrub(
    cmd: &ScrubCommand,
    hook: impl Fn(&Value) -> Option<Value>,
) -> telemetry_scrub::Result<()> {
    let input = cmd.read_value()?;
    let output = hook(&input);
    println!("{}", cmd.format.render(output.as_ref())?);
    Ok(())
}

fn handle_text(scrubber: &Scrubber, cmd: &TextCommand) {
    let text = scrubber.engine().text();
    let scrubbed = if cmd.exception {
        text.redact_exception(&cmd.text)
    } else {
        text.redact(&cmd.text)
    };
    println!("{scrubbed}");
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> telemetry_scrub::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                let scrub = &config.scrub;
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Scrub]");
                println!("  Enabled:              {}", scrub.enabled);
                println!("  Fault policy:         {:?}", scrub.fault_policy);
                println!("  Max depth:            {}", scrub.max_depth);
                println!("  Filtered placeholder: {}", scrub.filtered_placeholder);
                println!("  Email placeholder:    {}", scrub.email_placeholder);
                println!("  Extra keys:           {}", scrub.extra_sensitive_keys.len());
                println!(
                    "  Extra key fragments:  {}",
                    scrub.extra_sensitive_fragments.len()
                );
                println!("  Built-in patterns:    {}", scrub.use_builtin_patterns);
                println!("  Custom patterns:      {}", scrub.custom_patterns.len());
                println!(
                    "  Quoted exceptions:    {}",
                    scrub.redact_quoted_exception_text
                );
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
