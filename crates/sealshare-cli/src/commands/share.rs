//! Share administration commands.

use chrono::{DateTime, TimeDelta, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;
use uuid::Uuid;

use sealshare_core::config::{AppConfig, StoreBackend};
use sealshare_core::error::AppError;
use sealshare_core::types::{ArtifactId, ShareId, UserId};
use sealshare_entity::share::{CallerLocation, ShareSummary};
use sealshare_service::{
    AccessCredentials, AccessOutcome, CreateShareRequest, RequestContext, ShareServices,
};

use crate::output::{self, OutputFormat};

/// Arguments for share commands
#[derive(Debug, Args)]
pub struct ShareArgs {
    /// Share subcommand
    #[command(subcommand)]
    pub command: ShareCommand,
}

/// Share subcommands
#[derive(Debug, Subcommand)]
pub enum ShareCommand {
    /// Create a share for an artifact
    Create {
        /// Artifact ID
        artifact: ArtifactId,
        /// Owning user ID
        #[arg(short, long)]
        user: UserId,
        /// Require this password
        #[arg(short, long)]
        password: Option<String>,
        /// Deactivate after the first download
        #[arg(long)]
        one_time: bool,
        /// Days until expiry (defaults to share.default_expiry_days)
        #[arg(long)]
        expires_in_days: Option<i64>,
        /// Download limit
        #[arg(long)]
        max_downloads: Option<i32>,
        /// Bind to a device fingerprint
        #[arg(long)]
        device: Option<String>,
        /// Allowed country codes
        #[arg(long, value_delimiter = ',')]
        countries: Vec<String>,
        /// Allowed city names
        #[arg(long, value_delimiter = ',')]
        cities: Vec<String>,
        /// Minutes until the share unlocks
        #[arg(long)]
        unlock_in_minutes: Option<i64>,
        /// Geofence center latitude
        #[arg(long, allow_hyphen_values = true)]
        center_lat: Option<f64>,
        /// Geofence center longitude
        #[arg(long, allow_hyphen_values = true)]
        center_lng: Option<f64>,
        /// Geofence radius in kilometers
        #[arg(long)]
        radius_km: Option<f64>,
    },
    /// Attempt an access as a recipient would
    Access {
        /// Link token
        token: String,
        /// Share password
        #[arg(short, long)]
        password: Option<String>,
        /// Device fingerprint
        #[arg(long)]
        device: Option<String>,
        /// Caller country code
        #[arg(long)]
        country: Option<String>,
        /// Caller city
        #[arg(long)]
        city: Option<String>,
        /// Caller latitude
        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,
        /// Caller longitude
        #[arg(long, allow_hyphen_values = true)]
        lng: Option<f64>,
    },
    /// List a user's shares
    List {
        /// Owning user ID
        user: UserId,
        /// Hide revoked and expired shares
        #[arg(long)]
        active_only: bool,
    },
    /// Revoke a share
    Revoke {
        /// Share ID
        id: ShareId,
    },
    /// Extend a share's expiry
    Extend {
        /// Share ID
        id: ShareId,
        /// Days to add (defaults to share.default_extension_days)
        #[arg(short, long)]
        days: Option<i64>,
    },
    /// Show a user's share statistics
    Stats {
        /// Owning user ID
        user: UserId,
    },
}

/// Share display row for table output
#[derive(Debug, Serialize, Tabled)]
struct ShareRow {
    /// Share ID
    id: String,
    /// Token prefix
    token: String,
    /// Status
    status: String,
    /// Downloads
    downloads: String,
    /// Protections
    protections: String,
    /// Expires at
    expires_at: String,
}

impl From<&ShareSummary> for ShareRow {
    fn from(s: &ShareSummary) -> Self {
        let status = if !s.is_active {
            "revoked"
        } else if s.is_expired {
            "expired"
        } else if s.is_time_locked {
            "locked"
        } else {
            "active"
        };

        let downloads = match s.max_downloads {
            Some(max) => format!("{}/{max}", s.download_count),
            None => s.download_count.to_string(),
        };

        let protections: Vec<&str> = [
            (s.password_protected, "password"),
            (s.device_bound, "device"),
            (s.geofenced, "geo"),
            (s.is_one_time, "one-time"),
        ]
        .into_iter()
        .filter_map(|(on, label)| on.then_some(label))
        .collect();

        Self {
            id: s.id.to_string(),
            token: s.token.chars().take(8).collect(),
            status: status.to_string(),
            downloads,
            protections: protections.join(","),
            expires_at: s.expires_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Resolve a relative CLI offset to an instant.
fn from_now(offset: Option<TimeDelta>, flag: &str) -> Result<DateTime<Utc>, AppError> {
    offset
        .and_then(|d| Utc::now().checked_add_signed(d))
        .ok_or_else(|| AppError::validation(format!("--{flag} is out of range")))
}

/// Execute share commands
pub async fn execute(
    args: &ShareArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    if config.store.backend == StoreBackend::Memory {
        tracing::warn!("store.backend is memory; shares live only for this command");
    }
    let services = ShareServices::open(config).await?;
    let operator = RequestContext::admin(UserId::from_uuid(Uuid::nil()));

    match &args.command {
        ShareCommand::Create {
            artifact,
            user,
            password,
            one_time,
            expires_in_days,
            max_downloads,
            device,
            countries,
            cities,
            unlock_in_minutes,
            center_lat,
            center_lng,
            radius_km,
        } => {
            let expires_at = expires_in_days
                .map(|days| from_now(TimeDelta::try_days(days), "expires-in-days"))
                .transpose()?;
            let unlock_time = unlock_in_minutes
                .map(|mins| from_now(TimeDelta::try_minutes(mins), "unlock-in-minutes"))
                .transpose()?;
            let request = CreateShareRequest {
                artifact_id: *artifact,
                password: password.clone(),
                is_one_time: *one_time,
                expires_at,
                unlock_time,
                max_downloads: *max_downloads,
                device_fingerprint: device.clone(),
                allowed_countries: countries.clone(),
                allowed_cities: cities.clone(),
                center_lat: *center_lat,
                center_lng: *center_lng,
                radius_km: *radius_km,
                ..Default::default()
            };
            let summary = services
                .shares
                .create_share(&RequestContext::member(*user), request)
                .await?;

            match format {
                OutputFormat::Table => {
                    output::print_success("Share created");
                    output::print_kv("ID", &summary.id.to_string());
                    output::print_kv("Token", &summary.token);
                    output::print_kv("Expires at", &summary.expires_at.to_rfc3339());
                }
                OutputFormat::Json => output::print_item(&summary, format),
            }
        }
        ShareCommand::Access {
            token,
            password,
            device,
            country,
            city,
            lat,
            lng,
        } => {
            let creds = AccessCredentials {
                password: password.clone(),
                device_fingerprint: device.clone(),
                location: CallerLocation {
                    country: country.clone(),
                    city: city.clone(),
                    latitude: *lat,
                    longitude: *lng,
                },
            };
            let outcome = services.access.access(token, &creds).await?;

            match (format, &outcome) {
                (OutputFormat::Json, _) => output::print_item(&outcome, format),
                (OutputFormat::Table, AccessOutcome::Granted(grant)) => {
                    output::print_success("Access granted");
                    output::print_kv("Artifact", &grant.artifact_id.to_string());
                    output::print_kv("Downloads", &grant.download_count.to_string());
                    output::print_kv(
                        "Remaining",
                        &grant
                            .downloads_remaining
                            .map_or_else(|| "unlimited".to_string(), |n| n.to_string()),
                    );
                    if let Some(payload) = &grant.payload {
                        output::print_kv("Filename", &payload.filename);
                        output::print_kv("Checksum", &payload.checksum);
                    }
                }
                (OutputFormat::Table, AccessOutcome::Denied(denial)) => {
                    output::print_error(&format!(
                        "Access denied ({}): {}",
                        outcome.response_class().status_code(),
                        denial.message()
                    ));
                }
            }
        }
        ShareCommand::List { user, active_only } => {
            let shares = services
                .shares
                .list_shares(&RequestContext::member(*user), *active_only)
                .await?;
            match format {
                OutputFormat::Table => {
                    let rows: Vec<ShareRow> = shares.iter().map(ShareRow::from).collect();
                    output::print_list(&rows, format);
                }
                OutputFormat::Json => output::print_item(&shares, format),
            }
        }
        ShareCommand::Revoke { id } => {
            services.shares.revoke_share(&operator, *id).await?;
            output::print_success(&format!("Share '{id}' revoked"));
        }
        ShareCommand::Extend { id, days } => {
            let expires_at = services.shares.extend_share(&operator, *id, *days).await?;
            output::print_success(&format!(
                "Share '{id}' now expires at {}",
                expires_at.to_rfc3339()
            ));
        }
        ShareCommand::Stats { user } => {
            let stats = services
                .shares
                .share_stats(&RequestContext::member(*user))
                .await?;
            match format {
                OutputFormat::Table => {
                    output::print_kv("Total shares", &stats.total_shares.to_string());
                    output::print_kv("Active shares", &stats.active_shares.to_string());
                    output::print_kv("Total downloads", &stats.total_downloads.to_string());
                    let rows: Vec<ShareRow> =
                        stats.recent_shares.iter().map(ShareRow::from).collect();
                    output::print_list(&rows, format);
                }
                OutputFormat::Json => output::print_item(&stats, format),
            }
        }
    }

    Ok(())
}
