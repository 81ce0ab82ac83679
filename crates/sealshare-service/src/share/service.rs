//! Sharing workflow: create, inspect, revoke, and extend shares.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidationError};

use sealshare_core::config::ShareConfig;
use sealshare_core::error::AppError;
use sealshare_core::events::ShareEvent;
use sealshare_core::result::AppResult;
use sealshare_core::types::{ArtifactId, ShareId, UserId};
use sealshare_crypto::PasswordHasher;
use sealshare_database::ShareStore;
use sealshare_entity::share::{AccessPayload, GeoPoint, Geofence, ShareRecord, ShareSummary};

use super::link::LinkService;
use super::payload::PayloadKeyring;
use crate::context::RequestContext;
use crate::events::EventBus;

/// Longest single expiry extension, in days.
pub const MAX_EXTENSION_DAYS: i64 = 365;

/// Furthest a new share's expiry may lie in the future, in days.
pub const MAX_SHARE_LIFETIME_DAYS: i64 = 3650;

/// Number of shares listed in [`ShareStats::recent_shares`].
pub const RECENT_SHARES: usize = 5;

/// Request to create a share.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_constraints"))]
pub struct CreateShareRequest {
    /// Artifact to share.
    pub artifact_id: ArtifactId,
    /// Designated recipient.
    pub recipient_id: Option<UserId>,
    /// Optional share password, stored only as a hash.
    #[validate(length(min = 1, max = 1024))]
    pub password: Option<String>,
    /// Self-revoke after the first successful access.
    #[serde(default)]
    pub is_one_time: bool,
    /// Expiry; defaults to now plus the configured number of days.
    pub expires_at: Option<DateTime<Utc>>,
    /// Earliest time the share can be used.
    pub unlock_time: Option<DateTime<Utc>>,
    /// Maximum successful accesses; unlimited when absent.
    #[validate(range(min = 1))]
    pub max_downloads: Option<i32>,
    /// Device the share is bound to.
    #[validate(length(min = 1, max = 512))]
    pub device_fingerprint: Option<String>,
    /// Allowed country codes.
    #[serde(default)]
    pub allowed_countries: Vec<String>,
    /// Allowed city names.
    #[serde(default)]
    pub allowed_cities: Vec<String>,
    /// Radius center latitude.
    pub center_lat: Option<f64>,
    /// Radius center longitude.
    pub center_lng: Option<f64>,
    /// Radius in kilometers.
    pub radius_km: Option<f64>,
    /// Artifact metadata to hand out on a granted access.
    pub payload: Option<AccessPayload>,
}

fn validate_constraints(req: &CreateShareRequest) -> Result<(), ValidationError> {
    let center = match (req.center_lat, req.center_lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        (None, None) => None,
        _ => return Err(invalid("center_incomplete", "center_lat and center_lng go together")),
    };
    if center.is_some_and(|c| !c.is_valid()) {
        return Err(invalid(
            "center_out_of_range",
            "latitude must be within [-90, 90] and longitude within [-180, 180]",
        ));
    }
    match req.radius_km {
        Some(radius) if !(radius.is_finite() && radius > 0.0) => {
            return Err(invalid("radius_not_positive", "radius_km must be positive"));
        }
        Some(_) if center.is_none() => {
            return Err(invalid("radius_without_center", "radius_km requires a center"));
        }
        _ => {}
    }
    if req
        .allowed_countries
        .iter()
        .chain(&req.allowed_cities)
        .any(|entry| entry.trim().is_empty())
    {
        return Err(invalid("blank_location", "allow-list entries must not be blank"));
    }
    Ok(())
}

fn days_after(at: DateTime<Utc>, days: i64) -> Option<DateTime<Utc>> {
    TimeDelta::try_days(days).and_then(|delta| at.checked_add_signed(delta))
}

fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

/// Aggregate numbers over one sharer's shares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareStats {
    /// All shares ever created.
    pub total_shares: usize,
    /// Active and unexpired shares.
    pub active_shares: usize,
    /// Successful accesses across all shares.
    pub total_downloads: i64,
    /// Newest shares first.
    pub recent_shares: Vec<ShareSummary>,
}

/// Manages share creation, listing, revocation, and extension.
#[derive(Debug, Clone)]
pub struct ShareService {
    store: Arc<dyn ShareStore>,
    links: LinkService,
    hasher: Arc<PasswordHasher>,
    keyring: Arc<PayloadKeyring>,
    events: EventBus,
    config: ShareConfig,
}

impl ShareService {
    /// Creates a share service.
    pub fn new(
        store: Arc<dyn ShareStore>,
        hasher: Arc<PasswordHasher>,
        keyring: Arc<PayloadKeyring>,
        events: EventBus,
        config: ShareConfig,
    ) -> Self {
        Self {
            links: LinkService::from_config(&config),
            store,
            hasher,
            keyring,
            events,
            config,
        }
    }

    /// Creates a share owned by the caller.
    pub async fn create_share(
        &self,
        ctx: &RequestContext,
        req: CreateShareRequest,
    ) -> AppResult<ShareSummary> {
        req.validate()
            .map_err(|e| AppError::validation(format!("Invalid share request: {e}")))?;

        let now = Utc::now();
        let expires_at = match req.expires_at {
            Some(expires_at) => expires_at,
            None => days_after(now, self.config.default_expiry_days).ok_or_else(|| {
                AppError::configuration("share.default_expiry_days is out of range")
            })?,
        };
        if expires_at <= now {
            return Err(AppError::validation("expires_at must be in the future"));
        }
        let latest =
            days_after(now, MAX_SHARE_LIFETIME_DAYS).unwrap_or(DateTime::<Utc>::MAX_UTC);
        if expires_at > latest {
            return Err(AppError::validation(format!(
                "expires_at must be within {MAX_SHARE_LIFETIME_DAYS} days"
            )));
        }
        if req.unlock_time.is_some_and(|unlock| unlock > expires_at) {
            return Err(AppError::validation("unlock_time must not be after expires_at"));
        }
        if let Some(payload) = &req.payload {
            if payload.artifact_id != req.artifact_id {
                return Err(AppError::validation(
                    "payload artifact_id does not match the shared artifact",
                ));
            }
        }

        let password_hash = req
            .password
            .as_deref()
            .map(|password| self.hasher.hash_password(password))
            .transpose()?;

        let mut record = ShareRecord {
            id: ShareId::new(),
            token: self.links.generate_token(),
            artifact_id: req.artifact_id,
            sharer_id: ctx.user_id,
            recipient_id: req.recipient_id,
            is_active: true,
            is_one_time: req.is_one_time,
            expires_at,
            unlock_time: req.unlock_time,
            max_downloads: req.max_downloads,
            download_count: 0,
            last_accessed: None,
            password_hash,
            device_fingerprint: req.device_fingerprint,
            geofence: Geofence {
                allowed_countries: req.allowed_countries,
                allowed_cities: req.allowed_cities,
                center_lat: req.center_lat,
                center_lng: req.center_lng,
                radius_km: req.radius_km,
            },
            sealed_payload: None,
            created_at: now,
        };
        if let Some(payload) = &req.payload {
            record.attach_payload(self.keyring.seal(payload)?);
        }

        let share = self.store.insert(record).await?;

        info!(
            user_id = %ctx.user_id,
            share_id = %share.id,
            artifact_id = %share.artifact_id,
            is_one_time = share.is_one_time,
            max_downloads = ?share.max_downloads,
            expires_at = %share.expires_at,
            "Share created"
        );
        self.events.publish(
            Some(ctx.user_id),
            ShareEvent::Created {
                share_id: share.id,
                artifact_id: share.artifact_id,
                is_one_time: share.is_one_time,
            },
        );

        Ok(share.summary(now))
    }

    /// Loads a share the caller may manage.
    ///
    /// Shares owned by someone else look the same as missing ones.
    pub async fn get_share(&self, ctx: &RequestContext, share_id: ShareId) -> AppResult<ShareRecord> {
        match self.store.find_by_id(share_id).await? {
            Some(share) if ctx.can_manage(share.sharer_id) => Ok(share),
            _ => Err(AppError::not_found("Share not found or access denied")),
        }
    }

    /// Revokes a share. Revocation is permanent.
    pub async fn revoke_share(&self, ctx: &RequestContext, share_id: ShareId) -> AppResult<()> {
        let share = self.get_share(ctx, share_id).await?;

        if self.store.deactivate(share.id).await? {
            info!(user_id = %ctx.user_id, share_id = %share_id, "Share revoked");
            self.events.publish(
                Some(ctx.user_id),
                ShareEvent::Revoked {
                    share_id,
                    automatic: false,
                },
            );
        }

        Ok(())
    }

    /// Pushes a share's expiry back by `days` (default from configuration).
    pub async fn extend_share(
        &self,
        ctx: &RequestContext,
        share_id: ShareId,
        days: Option<i64>,
    ) -> AppResult<DateTime<Utc>> {
        let days = days.unwrap_or(self.config.default_extension_days);
        if !(1..=MAX_EXTENSION_DAYS).contains(&days) {
            return Err(AppError::validation(format!(
                "Extension must be between 1 and {MAX_EXTENSION_DAYS} days"
            )));
        }

        let by = TimeDelta::try_days(days)
            .ok_or_else(|| AppError::validation("Extension is out of range"))?;

        let share = self.get_share(ctx, share_id).await?;
        if !share.is_active {
            return Err(AppError::conflict("Revoked shares cannot be extended"));
        }

        // Shares are never deleted, so `None` here means a revoke won the race.
        let updated = self
            .store
            .extend_expiry(share_id, by)
            .await?
            .ok_or_else(|| AppError::conflict("Revoked shares cannot be extended"))?;

        info!(
            user_id = %ctx.user_id,
            share_id = %share_id,
            days,
            expires_at = %updated.expires_at,
            "Share expiry extended"
        );
        self.events.publish(
            Some(ctx.user_id),
            ShareEvent::Extended {
                share_id,
                expires_at: updated.expires_at,
            },
        );

        Ok(updated.expires_at)
    }

    /// The caller's shares, newest first.
    ///
    /// With `active_only`, revoked and expired shares are left out.
    pub async fn list_shares(
        &self,
        ctx: &RequestContext,
        active_only: bool,
    ) -> AppResult<Vec<ShareSummary>> {
        let now = Utc::now();
        let shares = self.store.find_by_sharer(ctx.user_id).await?;
        Ok(shares
            .iter()
            .filter(|share| !active_only || (share.is_active && !share.is_expired_at(now)))
            .map(|share| share.summary(now))
            .collect())
    }

    /// Totals over the caller's shares.
    pub async fn share_stats(&self, ctx: &RequestContext) -> AppResult<ShareStats> {
        let now = Utc::now();
        let shares = self.store.find_by_sharer(ctx.user_id).await?;

        Ok(ShareStats {
            total_shares: shares.len(),
            active_shares: shares
                .iter()
                .filter(|share| share.is_active && !share.is_expired_at(now))
                .count(),
            total_downloads: shares
                .iter()
                .map(|share| i64::from(share.download_count))
                .sum(),
            recent_shares: shares
                .iter()
                .take(RECENT_SHARES)
                .map(|share| share.summary(now))
                .collect(),
        })
    }
}
