//! Inputs and terminal states of an access attempt.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sealshare_core::events::DenialKind;
use sealshare_core::types::{ArtifactId, ShareId};
use sealshare_entity::share::{AccessPayload, CallerLocation};

/// What the caller presents alongside a link token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessCredentials {
    /// Share password, if the caller has one.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    /// Fingerprint of the caller's device.
    #[serde(default)]
    pub device_fingerprint: Option<String>,
    /// Where the caller claims to be.
    #[serde(default)]
    pub location: CallerLocation,
}

impl AccessCredentials {
    /// Credentials carrying only a password.
    pub fn with_password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            ..Default::default()
        }
    }
}

/// Successful access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessGrant {
    /// The consumed share.
    pub share_id: ShareId,
    /// The shared artifact.
    pub artifact_id: ArtifactId,
    /// Decrypted artifact metadata, when the share carries one.
    pub payload: Option<AccessPayload>,
    /// Download count after this access.
    pub download_count: i32,
    /// Remaining accesses (`None` = unlimited).
    pub downloads_remaining: Option<i32>,
    /// Whether this access used up a one-time share.
    pub share_deactivated: bool,
}

/// Why access was refused. None of these carry secrets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AccessDenial {
    /// No share matches the token.
    NotFound,
    /// The share was revoked.
    Revoked,
    /// The share expired.
    Expired,
    /// The share is not unlocked yet.
    TimeLocked {
        /// When the share unlocks.
        unlock_time: DateTime<Utc>,
        /// Seconds left until then.
        time_until_unlock_secs: i64,
    },
    /// The password was missing or wrong.
    InvalidPassword,
    /// The caller location is outside the geofence.
    LocationDenied {
        /// Which check failed.
        detail: String,
    },
    /// The caller device is not the bound one.
    DeviceDenied {
        /// Which check failed.
        detail: String,
    },
    /// The share has no uses left.
    LimitExceeded,
}

impl AccessDenial {
    /// End-user message for this denial.
    pub fn message(&self) -> String {
        match self {
            Self::NotFound => "Share link not found".to_string(),
            Self::Revoked => "Share link has been revoked".to_string(),
            Self::Expired => "Share link has expired".to_string(),
            Self::TimeLocked {
                time_until_unlock_secs,
                ..
            } => format!("Share link unlocks in {time_until_unlock_secs} seconds"),
            Self::InvalidPassword => "Invalid share password".to_string(),
            Self::LocationDenied { detail } | Self::DeviceDenied { detail } => detail.clone(),
            Self::LimitExceeded => "Share link has reached its download limit".to_string(),
        }
    }

    /// Event classification. `None` for unknown tokens, which have no share.
    pub fn kind(&self) -> Option<DenialKind> {
        match self {
            Self::NotFound => None,
            Self::Revoked => Some(DenialKind::Revoked),
            Self::Expired => Some(DenialKind::Expired),
            Self::TimeLocked { .. } => Some(DenialKind::TimeLocked),
            Self::InvalidPassword => Some(DenialKind::InvalidPassword),
            Self::LocationDenied { .. } => Some(DenialKind::LocationDenied),
            Self::DeviceDenied { .. } => Some(DenialKind::DeviceDenied),
            Self::LimitExceeded => Some(DenialKind::LimitExceeded),
        }
    }

    /// Caller-facing response class.
    pub fn response_class(&self) -> ResponseClass {
        match self {
            Self::NotFound | Self::Revoked | Self::Expired => ResponseClass::Gone,
            Self::TimeLocked { .. } => ResponseClass::NotYet,
            Self::InvalidPassword | Self::LocationDenied { .. } | Self::DeviceDenied { .. } => {
                ResponseClass::Forbidden
            }
            Self::LimitExceeded => ResponseClass::TooManyRequests,
        }
    }
}

/// Terminal state of [`ShareAccessController::access`](super::ShareAccessController::access).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum AccessOutcome {
    /// Access granted and one use recorded.
    Granted(AccessGrant),
    /// Access refused; nothing was recorded.
    Denied(AccessDenial),
}

impl AccessOutcome {
    /// Whether access was granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }

    /// The denial, if any.
    pub fn denial(&self) -> Option<&AccessDenial> {
        match self {
            Self::Granted(_) => None,
            Self::Denied(denial) => Some(denial),
        }
    }

    /// Caller-facing response class.
    pub fn response_class(&self) -> ResponseClass {
        match self {
            Self::Granted(_) => ResponseClass::Success,
            Self::Denied(denial) => denial.response_class(),
        }
    }
}

/// Response family the caller-facing layer maps an outcome to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseClass {
    /// Granted.
    Success,
    /// Not found, revoked, or expired.
    Gone,
    /// Time-locked.
    NotYet,
    /// Wrong password, location, or device.
    Forbidden,
    /// Usage budget exhausted.
    TooManyRequests,
}

impl ResponseClass {
    /// HTTP status code for this class.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::Gone => 410,
            Self::NotYet => 423,
            Self::Forbidden => 403,
            Self::TooManyRequests => 429,
        }
    }
}
