//! Share entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use sealshare_core::types::{ArtifactId, ShareId, UserId};

use super::geofence::Geofence;
use super::payload::SealedPayload;

/// A share link granting restricted access to one artifact.
///
/// All constraints are fixed at creation. Only `is_active`,
/// `download_count`, `last_accessed`, and `expires_at` change afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ShareRecord {
    /// Unique share identifier.
    pub id: ShareId,
    /// Opaque URL-safe link token.
    pub token: String,
    /// The shared artifact.
    pub artifact_id: ArtifactId,
    /// Principal who created the share.
    pub sharer_id: UserId,
    /// Designated recipient, if the share targets one principal.
    pub recipient_id: Option<UserId>,
    /// Cleared by revocation or one-time consumption; never set again.
    pub is_active: bool,
    /// Whether the share self-revokes after its first successful use.
    pub is_one_time: bool,
    /// Access is denied strictly after this instant.
    pub expires_at: DateTime<Utc>,
    /// Access is denied strictly before this instant.
    pub unlock_time: Option<DateTime<Utc>>,
    /// Maximum successful accesses (`None` = unlimited).
    pub max_downloads: Option<i32>,
    /// Successful accesses so far.
    pub download_count: i32,
    /// Time of the last successful access (advisory).
    pub last_accessed: Option<DateTime<Utc>>,
    /// Argon2id hash of the share password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Device fingerprint the share is bound to.
    pub device_fingerprint: Option<String>,
    /// Location restrictions.
    #[sqlx(flatten)]
    #[serde(default)]
    pub geofence: Geofence,
    /// Sealed artifact metadata handed out on success.
    #[serde(skip_serializing)]
    pub sealed_payload: Option<Json<SealedPayload>>,
    /// When the share was created.
    pub created_at: DateTime<Utc>,
}

impl ShareRecord {
    /// Whether the share is past its expiry at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether the time lock still holds at `now`.
    pub fn is_time_locked_at(&self, now: DateTime<Utc>) -> bool {
        self.unlock_time.is_some_and(|unlock| now < unlock)
    }

    /// Remaining wait before the time lock opens (zero when unlocked).
    pub fn time_until_unlock(&self, now: DateTime<Utc>) -> chrono::Duration {
        match self.unlock_time {
            Some(unlock) if now < unlock => unlock - now,
            _ => chrono::Duration::zero(),
        }
    }

    /// Whether a password is required.
    pub fn has_password(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Remaining successful accesses (`None` = unlimited).
    pub fn downloads_remaining(&self) -> Option<i32> {
        self.max_downloads
            .map(|max| (max - self.download_count).max(0))
    }

    /// Whether the download budget is used up.
    pub fn limit_reached(&self) -> bool {
        self.max_downloads
            .is_some_and(|max| self.download_count >= max)
    }

    /// Whether the share could be consumed right now, ignoring credentials.
    pub fn can_download_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now) && !self.limit_reached()
    }

    /// Returns a description of the broken invariant, if any.
    ///
    /// A count above the limit can only come from a non-atomic writer.
    pub fn usage_invariant_violation(&self) -> Option<String> {
        if self.download_count < 0 {
            return Some(format!("negative download_count {}", self.download_count));
        }
        match self.max_downloads {
            Some(max) if self.download_count > max => Some(format!(
                "download_count {} exceeds max_downloads {max}",
                self.download_count
            )),
            _ => None,
        }
    }

    /// Short token prefix that is safe to log.
    pub fn token_prefix(&self) -> &str {
        let end = self
            .token
            .char_indices()
            .nth(8)
            .map_or(self.token.len(), |(i, _)| i);
        &self.token[..end]
    }

    /// Sealed payload, if one was attached at creation.
    pub fn payload(&self) -> Option<&SealedPayload> {
        self.sealed_payload.as_ref().map(|json| &json.0)
    }

    /// Attach the sealed access payload.
    pub fn attach_payload(&mut self, sealed: SealedPayload) {
        self.sealed_payload = Some(Json(sealed));
    }

    /// Caller-facing view of the share at `now`.
    pub fn summary(&self, now: DateTime<Utc>) -> ShareSummary {
        ShareSummary {
            id: self.id,
            token: self.token.clone(),
            artifact_id: self.artifact_id,
            is_active: self.is_active,
            is_one_time: self.is_one_time,
            expires_at: self.expires_at,
            is_expired: self.is_expired_at(now),
            unlock_time: self.unlock_time,
            is_time_locked: self.is_time_locked_at(now),
            time_until_unlock_secs: self.time_until_unlock(now).num_seconds(),
            max_downloads: self.max_downloads,
            download_count: self.download_count,
            downloads_remaining: self.downloads_remaining(),
            can_download: self.can_download_at(now),
            password_protected: self.has_password(),
            device_bound: self.device_fingerprint.is_some(),
            geofenced: self.geofence.is_restricted(),
            created_at: self.created_at,
            last_accessed: self.last_accessed,
        }
    }
}

/// Read-only view of a share for its sharer. Never carries secrets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareSummary {
    /// Share ID.
    pub id: ShareId,
    /// Link token.
    pub token: String,
    /// Shared artifact.
    pub artifact_id: ArtifactId,
    /// Whether the share is still active.
    pub is_active: bool,
    /// Whether it is a one-time share.
    pub is_one_time: bool,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Whether it has expired.
    pub is_expired: bool,
    /// Unlock instant.
    pub unlock_time: Option<DateTime<Utc>>,
    /// Whether the time lock still holds.
    pub is_time_locked: bool,
    /// Seconds until unlock (zero when unlocked).
    pub time_until_unlock_secs: i64,
    /// Download limit.
    pub max_downloads: Option<i32>,
    /// Downloads so far.
    pub download_count: i32,
    /// Downloads left (`None` = unlimited).
    pub downloads_remaining: Option<i32>,
    /// Whether a download is currently possible.
    pub can_download: bool,
    /// Whether a password is required.
    pub password_protected: bool,
    /// Whether the share is bound to a device.
    pub device_bound: bool,
    /// Whether location restrictions apply.
    pub geofenced: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last successful access.
    pub last_accessed: Option<DateTime<Utc>>,
}


#[cfg(test)]
mod tests {
    use super::fixtures::share;
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let mut record = share(now);
        record.expires_at = now;
        assert!(!record.is_expired_at(now));
        assert!(record.is_expired_at(now + Duration::milliseconds(1)));
    }

    #[test]
    fn test_time_lock() {
        let now = Utc::now();
        let mut record = share(now);
        record.unlock_time = Some(now + Duration::hours(1));
        assert!(record.is_time_locked_at(now));
        assert_eq!(record.time_until_unlock(now).num_seconds(), 3600);
        assert!(!record.is_time_locked_at(now + Duration::hours(1)));
        assert_eq!(
            record.time_until_unlock(now + Duration::hours(2)),
            Duration::zero()
        );
    }

    #[test]
    fn test_downloads_remaining() {
        let now = Utc::now();
        let mut record = share(now);
        assert_eq!(record.downloads_remaining(), None);
        record.max_downloads = Some(3);
        record.download_count = 1;
        assert_eq!(record.downloads_remaining(), Some(2));
        record.download_count = 3;
        assert_eq!(record.downloads_remaining(), Some(0));
        assert!(record.limit_reached());
    }

    #[test]
    fn test_invariant_violation_detected() {
        let now = Utc::now();
        let mut record = share(now);
        record.max_downloads = Some(1);
        record.download_count = 1;
        assert!(record.usage_invariant_violation().is_none());
        record.download_count = 2;
        assert!(record.usage_invariant_violation().is_some());
    }

    #[test]
    fn test_serialization_hides_secrets() {
        let now = Utc::now();
        let mut record = share(now);
        record.password_hash = Some("$argon2id$v=19$secret".into());
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("sealed_payload").is_none());
    }

    #[test]
    fn test_token_prefix() {
        let record = share(Utc::now());
        assert_eq!(record.token_prefix(), "abcdefgh");
    }
}
