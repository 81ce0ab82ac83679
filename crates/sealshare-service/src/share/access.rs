//! Share access control: decides each access attempt and records granted
//! uses exactly once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use sealshare_core::error::AppError;
use sealshare_core::events::ShareEvent;
use sealshare_core::result::AppResult;
use sealshare_crypto::PasswordHasher;
use sealshare_database::ShareStore;
use sealshare_entity::share::{ConsumeDenial, ConsumeResult, ShareRecord};

use super::device::DeviceGate;
use super::geofence::GeofenceEvaluator;
use super::outcome::{AccessCredentials, AccessDenial, AccessGrant, AccessOutcome};
use super::payload::PayloadKeyring;
use super::usage::UsageAccount;
use crate::events::EventBus;

/// Runs the fixed access pipeline for share links.
///
/// Order: lookup, revoked, expired, time lock, password, geofence, device,
/// then the atomic usage step. Everything before the usage step only reads.
#[derive(Debug, Clone)]
pub struct ShareAccessController {
    store: Arc<dyn ShareStore>,
    usage: UsageAccount,
    hasher: Arc<PasswordHasher>,
    keyring: Arc<PayloadKeyring>,
    geofence: GeofenceEvaluator,
    device: DeviceGate,
    events: EventBus,
}

impl ShareAccessController {
    /// Creates a controller.
    pub fn new(
        store: Arc<dyn ShareStore>,
        hasher: Arc<PasswordHasher>,
        keyring: Arc<PayloadKeyring>,
        events: EventBus,
    ) -> Self {
        Self {
            usage: UsageAccount::new(Arc::clone(&store)),
            store,
            hasher,
            keyring,
            geofence: GeofenceEvaluator::new(),
            device: DeviceGate::new(),
            events,
        }
    }

    /// Decide an access attempt for `token` now.
    pub async fn access(
        &self,
        token: &str,
        credentials: &AccessCredentials,
    ) -> AppResult<AccessOutcome> {
        self.access_at(token, credentials, Utc::now()).await
    }

    /// Decide an access attempt for `token` as of `now`.
    ///
    /// Denials are returned as [`AccessOutcome::Denied`]. `Err` means the
    /// attempt could not be decided and nothing was recorded.
    pub async fn access_at(
        &self,
        token: &str,
        credentials: &AccessCredentials,
        now: DateTime<Utc>,
    ) -> AppResult<AccessOutcome> {
        let Some(share) = self.store.find_by_token(token).await? else {
            debug!(token_prefix = %prefix(token), "Share token not found");
            return Ok(AccessOutcome::Denied(AccessDenial::NotFound));
        };

        if let Some(violation) = share.usage_invariant_violation() {
            error!(share_id = %share.id, violation = %violation, "Share usage invariant violated");
            return Err(AppError::internal(format!(
                "Share {} is in an inconsistent state",
                share.id
            )));
        }

        if let Some(denial) = self.check_static(&share, credentials, now)? {
            return Ok(self.deny(&share, denial));
        }

        // Opened before consuming so a broken payload never burns a use.
        let payload = match share.payload() {
            Some(sealed) => Some(self.keyring.open(sealed).inspect_err(|e| {
                error!(share_id = %share.id, error = %e, "Share payload unreadable");
            })?),
            None => None,
        };

        let snapshot = match self.usage.try_consume(share.id, now).await? {
            ConsumeResult::Granted(snapshot) => snapshot,
            ConsumeResult::Denied(denial) => {
                let denial = match denial {
                    ConsumeDenial::Revoked => AccessDenial::Revoked,
                    ConsumeDenial::Expired => AccessDenial::Expired,
                    ConsumeDenial::LimitExceeded => AccessDenial::LimitExceeded,
                };
                return Ok(self.deny(&share, denial));
            }
        };

        info!(
            share_id = %share.id,
            artifact_id = %share.artifact_id,
            download_count = snapshot.download_count,
            max_downloads = ?snapshot.max_downloads,
            "Share access granted"
        );
        self.events.publish(
            None,
            ShareEvent::Downloaded {
                share_id: share.id,
                download_count: snapshot.download_count,
                max_downloads: snapshot.max_downloads,
            },
        );
        if snapshot.deactivated {
            self.events.publish(
                None,
                ShareEvent::Revoked {
                    share_id: share.id,
                    automatic: true,
                },
            );
        }

        Ok(AccessOutcome::Granted(AccessGrant {
            share_id: share.id,
            artifact_id: share.artifact_id,
            payload,
            download_count: snapshot.download_count,
            downloads_remaining: snapshot.downloads_remaining(),
            share_deactivated: snapshot.deactivated,
        }))
    }

    /// Steps 2 to 7. Returns the first denial, if any.
    fn check_static(
        &self,
        share: &ShareRecord,
        credentials: &AccessCredentials,
        now: DateTime<Utc>,
    ) -> AppResult<Option<AccessDenial>> {
        if !share.is_active {
            return Ok(Some(AccessDenial::Revoked));
        }

        if share.is_expired_at(now) {
            return Ok(Some(AccessDenial::Expired));
        }

        if let Some(unlock_time) = share.unlock_time.filter(|unlock| now < *unlock) {
            return Ok(Some(AccessDenial::TimeLocked {
                unlock_time,
                time_until_unlock_secs: share.time_until_unlock(now).num_seconds(),
            }));
        }

        if let Some(hash) = share.password_hash.as_deref() {
            let matches = match credentials.password.as_deref() {
                Some(password) => self.hasher.verify_password(password, hash)?,
                None => false,
            };
            if !matches {
                return Ok(Some(AccessDenial::InvalidPassword));
            }
        }

        let location = self.geofence.evaluate(&share.geofence, &credentials.location);
        if !location.allowed {
            return Ok(Some(AccessDenial::LocationDenied {
                detail: location.reason,
            }));
        }

        let device = self.device.evaluate(
            share.device_fingerprint.as_deref(),
            credentials.device_fingerprint.as_deref(),
        );
        if !device.allowed {
            return Ok(Some(AccessDenial::DeviceDenied {
                detail: device.reason,
            }));
        }

        Ok(None)
    }

    fn deny(&self, share: &ShareRecord, denial: AccessDenial) -> AccessOutcome {
        debug!(
            share_id = %share.id,
            token_prefix = %share.token_prefix(),
            denial = ?denial,
            "Share access denied"
        );
        if let Some(reason) = denial.kind() {
            self.events.publish(
                None,
                ShareEvent::Denied {
                    share_id: share.id,
                    reason,
                },
            );
        }
        AccessOutcome::Denied(denial)
    }
}

fn prefix(token: &str) -> &str {
    let end = token.char_indices().nth(8).map_or(token.len(), |(i, _)| i);
    &token[..end]
}
