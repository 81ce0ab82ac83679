//! Configuration inspection commands.

use clap::{Args, Subcommand};

use sealshare_core::config::AppConfig;
use sealshare_core::error::AppError;
use sealshare_database::connection::redact_url;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration (secrets omitted)
    Show,
    /// Validate the configuration and summarize it
    Validate,
}

/// Execute config commands.
///
/// The configuration was already loaded and validated at startup.
pub fn execute(
    args: &ConfigArgs,
    config_path: &str,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match args.command {
        ConfigCommand::Show => {
            let mut shown = config.clone();
            shown.database.url = redact_url(&shown.database.url);
            output::print_item(&shown, format);
        }
        ConfigCommand::Validate => {
            config.validate()?;
            output::print_success(&format!("Configuration '{config_path}' is valid"));
            output::print_kv("Store backend", &config.store.backend.to_string());
            output::print_kv("Database", &redact_url(&config.database.url));
            output::print_kv(
                "PBKDF2 iterations",
                &config.crypto.pbkdf2_iterations.to_string(),
            );
            output::print_kv(
                "Token entropy",
                &format!("{} bits", config.share.token_bytes * 8),
            );
            output::print_kv(
                "Default expiry",
                &format!("{} days", config.share.default_expiry_days),
            );
            if config.crypto.payload_secret
                == sealshare_core::config::crypto::PLACEHOLDER_PAYLOAD_SECRET
            {
                output::print_warning("crypto.payload_secret still has its placeholder value");
            }
        }
    }
    Ok(())
}
