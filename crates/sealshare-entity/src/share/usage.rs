//! Usage accounting decision for a single share.
//!
//! Stores call [`ShareRecord::try_consume`] while holding exclusive access
//! to the record, so the check and the increment happen as one step.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::model::ShareRecord;

/// Why a consumption attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumeDenial {
    /// The share was deactivated.
    Revoked,
    /// The share expired.
    Expired,
    /// The download budget is spent.
    LimitExceeded,
}

/// Counter state right after a successful consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Download count including this consumption.
    pub download_count: i32,
    /// Configured limit.
    pub max_downloads: Option<i32>,
    /// Whether the share is still active afterwards.
    pub is_active: bool,
    /// Whether this consumption deactivated the share.
    pub deactivated: bool,
    /// Time of this consumption.
    pub last_accessed: DateTime<Utc>,
}

impl UsageSnapshot {
    /// Remaining downloads (`None` = unlimited).
    pub fn downloads_remaining(&self) -> Option<i32> {
        self.max_downloads
            .map(|max| (max - self.download_count).max(0))
    }
}

/// Outcome of an atomic consumption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeResult {
    /// One use was recorded.
    Granted(UsageSnapshot),
    /// Nothing changed.
    Denied(ConsumeDenial),
}

impl ConsumeResult {
    /// Whether the attempt consumed a use.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

impl ShareRecord {
    /// Check the share is consumable at `now` and, if so, record one use.
    ///
    /// Refusals leave the record untouched. A granted one-time share is
    /// deactivated in the same step.
    pub fn try_consume(&mut self, now: DateTime<Utc>) -> ConsumeResult {
        if !self.is_active {
            return ConsumeResult::Denied(ConsumeDenial::Revoked);
        }
        if self.is_expired_at(now) {
            return ConsumeResult::Denied(ConsumeDenial::Expired);
        }
        if self.limit_reached() {
            return ConsumeResult::Denied(ConsumeDenial::LimitExceeded);
        }

        self.download_count += 1;
        self.last_accessed = Some(now);
        let deactivated = self.is_one_time;
        if deactivated {
            self.is_active = false;
        }

        ConsumeResult::Granted(UsageSnapshot {
            download_count: self.download_count,
            max_downloads: self.max_downloads,
            is_active: self.is_active,
            deactivated,
            last_accessed: now,
        })
    }

    /// Classify why a consumption would be refused right now, if it would.
    ///
    /// Used by stores that consume with a conditional write and need to
    /// explain a write that matched nothing.
    pub fn consume_denial_at(&self, now: DateTime<Utc>) -> Option<ConsumeDenial> {
        if !self.is_active {
            Some(ConsumeDenial::Revoked)
        } else if self.is_expired_at(now) {
            Some(ConsumeDenial::Expired)
        } else if self.limit_reached() {
            Some(ConsumeDenial::LimitExceeded)
        } else {
            None
        }
    }
}
