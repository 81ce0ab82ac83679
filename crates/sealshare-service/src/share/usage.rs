//! Usage accounting over the share store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use sealshare_core::result::AppResult;
use sealshare_core::types::ShareId;
use sealshare_database::ShareStore;
use sealshare_entity::share::ConsumeResult;

/// The only path that increments a share's download count or deactivates
/// it through consumption.
///
/// Atomicity comes from [`ShareStore::try_consume`]: the revocation, expiry,
/// and limit checks are repeated inside the store's indivisible step rather
/// than trusted from an earlier read.
#[derive(Debug, Clone)]
pub struct UsageAccount {
    store: Arc<dyn ShareStore>,
}

impl UsageAccount {
    /// Creates an account over `store`.
    pub fn new(store: Arc<dyn ShareStore>) -> Self {
        Self { store }
    }

    /// Attempt to consume one use of `share_id` at `now`.
    pub async fn try_consume(&self, share_id: ShareId, now: DateTime<Utc>) -> AppResult<ConsumeResult> {
        let result = self.store.try_consume(share_id, now).await?;
        match &result {
            ConsumeResult::Granted(snapshot) => {
                if snapshot.deactivated {
                    info!(share_id = %share_id, "One-time share consumed and deactivated");
                }
                debug!(
                    share_id = %share_id,
                    download_count = snapshot.download_count,
                    "Share use recorded"
                );
            }
            ConsumeResult::Denied(denial) => {
                debug!(share_id = %share_id, denial = ?denial, "Share use refused");
            }
        }
        Ok(result)
    }
}
