//! CLI command definitions and dispatch.

pub mod config;
pub mod crypto;
pub mod migrate;
pub mod share;

use clap::{Parser, Subcommand};

use sealshare_core::config::AppConfig;
use sealshare_core::error::AppError;

use crate::output::OutputFormat;

/// SealShare: restricted share links for encrypted artifacts
#[derive(Debug, Parser)]
#[command(name = "sealshare", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Environment overlay loaded from the config directory (e.g. "production")
    #[arg(short, long)]
    pub env: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Generate share link tokens
    Token(crypto::TokenArgs),
    /// Hash a share password with Argon2id
    HashPassword(crypto::HashPasswordArgs),
    /// Derive a key from a password with PBKDF2-HMAC-SHA256
    DeriveKey(crypto::DeriveKeyArgs),
    /// Encrypt a file into a password envelope
    Encrypt(crypto::EncryptArgs),
    /// Decrypt a password envelope
    Decrypt(crypto::DecryptArgs),
    /// Print the SHA-256 checksum of a file
    Checksum(crypto::ChecksumArgs),
    /// Verify a file against an expected SHA-256 checksum
    VerifyChecksum(crypto::VerifyChecksumArgs),
    /// Configuration inspection
    Config(config::ConfigArgs),
    /// Apply database migrations
    Migrate,
    /// Share administration
    Share(share::ShareArgs),
}

impl Cli {
    /// Execute the selected command.
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Token(args) => crypto::token(args, config, self.format),
            Commands::HashPassword(args) => crypto::hash_password(args),
            Commands::DeriveKey(args) => crypto::derive_key(args, config, self.format),
            Commands::Encrypt(args) => crypto::encrypt(args, config).await,
            Commands::Decrypt(args) => crypto::decrypt(args).await,
            Commands::Checksum(args) => crypto::checksum(args).await,
            Commands::VerifyChecksum(args) => crypto::verify_checksum(args).await,
            Commands::Config(args) => config::execute(args, &self.config, config, self.format),
            Commands::Migrate => migrate::execute(config).await,
            Commands::Share(args) => share::execute(args, config, self.format).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_share_access() {
        let cli = Cli::try_parse_from([
            "sealshare", "share", "access", "tok", "--country", "FR", "--lat", "-33.9", "--lng",
            "151.2",
        ])
        .unwrap();
        match cli.command {
            Commands::Share(share::ShareArgs {
                command: share::ShareCommand::Access { lat, country, .. },
            }) => {
                assert_eq!(lat, Some(-33.9));
                assert_eq!(country.as_deref(), Some("FR"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_share_create_restrictions() {
        let cli = Cli::try_parse_from([
            "sealshare",
            "share",
            "create",
            "7f1c2a4e-0d5b-4c8e-9a3f-2b6d8e1f4a70",
            "--user",
            "0b9e5d3c-6a1f-4e27-8c4d-3f5a7b9c1e20",
            "--cities",
            "Paris,Lyon",
            "--unlock-in-minutes",
            "30",
            "--center-lat",
            "-33.9",
            "--center-lng",
            "151.2",
            "--radius-km",
            "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Share(share::ShareArgs {
                command:
                    share::ShareCommand::Create {
                        cities,
                        unlock_in_minutes,
                        center_lat,
                        center_lng,
                        radius_km,
                        ..
                    },
            }) => {
                assert_eq!(cities, ["Paris", "Lyon"]);
                assert_eq!(unlock_in_minutes, Some(30));
                assert_eq!(center_lat, Some(-33.9));
                assert_eq!(center_lng, Some(151.2));
                assert_eq!(radius_km, Some(5.0));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_bad_share_id() {
        assert!(Cli::try_parse_from(["sealshare", "share", "revoke", "not-a-uuid"]).is_err());
    }
}
