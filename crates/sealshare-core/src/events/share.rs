//! Share-related domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ArtifactId, ShareId};

/// Coarse reason attached to a [`ShareEvent::Denied`] event.
///
/// Carries no caller-supplied data so that audit sinks never see secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The share has been revoked.
    Revoked,
    /// The share is past its expiry.
    Expired,
    /// The share is not yet unlocked.
    TimeLocked,
    /// The presented password did not match.
    InvalidPassword,
    /// The caller location is outside the geofence.
    LocationDenied,
    /// The caller device does not match the bound fingerprint.
    DeviceDenied,
    /// The download budget is exhausted.
    LimitExceeded,
}

/// Events related to sharing operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShareEvent {
    /// A share was created.
    Created {
        /// The share ID.
        share_id: ShareId,
        /// The shared artifact.
        artifact_id: ArtifactId,
        /// Whether the share self-revokes after one use.
        is_one_time: bool,
    },
    /// A share passed every check and consumed one use.
    Downloaded {
        /// The share ID.
        share_id: ShareId,
        /// Download count after this consumption.
        download_count: i32,
        /// Maximum downloads allowed (if set).
        max_downloads: Option<i32>,
    },
    /// An access attempt was denied.
    Denied {
        /// The share ID.
        share_id: ShareId,
        /// Why it was denied.
        reason: DenialKind,
    },
    /// A share was revoked, explicitly or by one-time consumption.
    Revoked {
        /// The share ID.
        share_id: ShareId,
        /// Whether the revocation came from a one-time consumption.
        automatic: bool,
    },
    /// A share's expiry was pushed back.
    Extended {
        /// The share ID.
        share_id: ShareId,
        /// The new expiry.
        expires_at: DateTime<Utc>,
    },
}

impl ShareEvent {
    /// The share this event concerns.
    pub fn share_id(&self) -> ShareId {
        match self {
            Self::Created { share_id, .. }
            | Self::Downloaded { share_id, .. }
            | Self::Denied { share_id, .. }
            | Self::Revoked { share_id, .. }
            | Self::Extended { share_id, .. } => *share_id,
        }
    }
}
