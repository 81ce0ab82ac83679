//! In-memory share store for single-node deployments and tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;
use tracing::{debug, error};

use sealshare_core::error::AppError;
use sealshare_core::types::{ShareId, UserId};
use sealshare_entity::share::{ConsumeResult, ShareRecord};

use crate::store::{ShareStore, check_invariant, expiry_out_of_range};

/// Share store backed by concurrent hash maps.
///
/// Each record sits behind its own Tokio mutex, so consuming one share never
/// waits on another.
#[derive(Debug, Clone, Default)]
pub struct MemoryShareStore {
    shares: Arc<DashMap<ShareId, Arc<Mutex<ShareRecord>>>>,
    tokens: Arc<DashMap<String, ShareId>>,
}

impl MemoryShareStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored shares.
    pub fn len(&self) -> usize {
        self.shares.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    fn slot(&self, id: ShareId) -> Option<Arc<Mutex<ShareRecord>>> {
        // Clone the Arc so no map guard is held across an await.
        self.shares.get(&id).map(|entry| Arc::clone(entry.value()))
    }
}

#[async_trait]
impl ShareStore for MemoryShareStore {
    async fn insert(&self, record: ShareRecord) -> Result<ShareRecord, AppError> {
        match self.tokens.entry(record.token.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::conflict("Share token already exists"));
            }
            Entry::Vacant(slot) => {
                if self.shares.contains_key(&record.id) {
                    return Err(AppError::conflict(format!(
                        "Share {} already exists",
                        record.id
                    )));
                }
                self.shares
                    .insert(record.id, Arc::new(Mutex::new(record.clone())));
                slot.insert(record.id);
            }
        }
        debug!(share_id = %record.id, "Share stored in memory");
        Ok(record)
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ShareRecord>, AppError> {
        let Some(id) = self.tokens.get(token).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: ShareId) -> Result<Option<ShareRecord>, AppError> {
        match self.slot(id) {
            Some(slot) => Ok(Some(slot.lock().await.clone())),
            None => Ok(None),
        }
    }

    async fn find_by_sharer(&self, sharer_id: UserId) -> Result<Vec<ShareRecord>, AppError> {
        let slots: Vec<_> = self
            .shares
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut found = Vec::new();
        for slot in slots {
            let record = slot.lock().await;
            if record.sharer_id == sharer_id {
                found.push(record.clone());
            }
        }
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn try_consume(
        &self,
        id: ShareId,
        now: DateTime<Utc>,
    ) -> Result<ConsumeResult, AppError> {
        let slot = self
            .slot(id)
            .ok_or_else(|| AppError::not_found(format!("Share {id} not found")))?;

        let mut record = slot.lock().await;
        let outcome = record.try_consume(now);
        if outcome.is_granted() {
            if let Err(e) = check_invariant(&record) {
                error!(share_id = %id, error = %e, "Usage counter corrupted");
                return Err(e);
            }
        }
        Ok(outcome)
    }

    async fn deactivate(&self, id: ShareId) -> Result<bool, AppError> {
        let Some(slot) = self.slot(id) else {
            return Ok(false);
        };
        let mut record = slot.lock().await;
        let was_active = record.is_active;
        record.is_active = false;
        Ok(was_active)
    }

    async fn extend_expiry(
        &self,
        id: ShareId,
        by: TimeDelta,
    ) -> Result<Option<ShareRecord>, AppError> {
        let Some(slot) = self.slot(id) else {
            return Ok(None);
        };
        let mut record = slot.lock().await;
        if !record.is_active {
            return Ok(None);
        }
        record.expires_at = record
            .expires_at
            .checked_add_signed(by)
            .ok_or_else(|| expiry_out_of_range(id))?;
        Ok(Some(record.clone()))
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sealshare_core::error::ErrorKind;
    use sealshare_core::types::ArtifactId;
    use sealshare_entity::share::{ConsumeDenial, Geofence};

    fn record(token: &str, max_downloads: Option<i32>, is_one_time: bool) -> ShareRecord {
        let now = Utc::now();
        ShareRecord {
            id: ShareId::new(),
            token: token.to_string(),
            artifact_id: ArtifactId::new(),
            sharer_id: UserId::new(),
            recipient_id: None,
            is_active: true,
            is_one_time,
            expires_at: now + Duration::days(7),
            unlock_time: None,
            max_downloads,
            download_count: 0,
            last_accessed: None,
            password_hash: None,
            device_fingerprint: None,
            geofence: Geofence::default(),
            sealed_payload: None,
            created_at: now,
        }
    }

    async fn race(store: &MemoryShareStore, id: ShareId, attempts: usize) -> usize {
        let handles: Vec<_> = (0..attempts)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.try_consume(id, Utc::now()).await })
            })
            .collect();

        let mut granted = 0;
        for result in futures::future::join_all(handles).await {
            if result.unwrap().unwrap().is_granted() {
                granted += 1;
            }
        }
        granted
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let store = MemoryShareStore::new();
        let share = store.insert(record("tok-a", None, false)).await.unwrap();

        let by_token = store.find_by_token("tok-a").await.unwrap().unwrap();
        assert_eq!(by_token.id, share.id);
        assert!(store.find_by_token("missing").await.unwrap().is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_token_conflicts() {
        let store = MemoryShareStore::new();
        store.insert(record("dup", None, false)).await.unwrap();
        let err = store.insert(record("dup", None, false)).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_consume_unknown_is_not_found() {
        let store = MemoryShareStore::new();
        let err = store
            .try_consume(ShareId::new(), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_revoked_share_still_found_by_token() {
        let store = MemoryShareStore::new();
        let share = store.insert(record("rev", None, false)).await.unwrap();
        assert!(store.deactivate(share.id).await.unwrap());
        assert!(!store.deactivate(share.id).await.unwrap());

        let found = store.find_by_token("rev").await.unwrap().unwrap();
        assert!(!found.is_active);
        assert_eq!(
            store.try_consume(share.id, Utc::now()).await.unwrap(),
            ConsumeResult::Denied(ConsumeDenial::Revoked)
        );
    }

    #[tokio::test]
    async fn test_sharer_listing_is_newest_first() {
        let store = MemoryShareStore::new();
        let sharer = UserId::new();
        for (i, token) in ["old", "mid", "new"].into_iter().enumerate() {
            let mut share = record(token, None, false);
            share.sharer_id = sharer;
            share.created_at = Utc::now() + Duration::seconds(i as i64);
            store.insert(share).await.unwrap();
        }
        store.insert(record("other", None, false)).await.unwrap();

        let tokens: Vec<_> = store
            .find_by_sharer(sharer)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect();
        assert_eq!(tokens, vec!["new", "mid", "old"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_consumption_respects_limit() {
        let store = MemoryShareStore::new();
        let share = store.insert(record("lim", Some(5), false)).await.unwrap();

        let granted = race(&store, share.id, 64).await;
        assert_eq!(granted, 5);

        let after = store.find_by_id(share.id).await.unwrap().unwrap();
        assert_eq!(after.download_count, 5);
        assert!(after.is_active);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_one_time_grants_once() {
        let store = MemoryShareStore::new();
        let share = store.insert(record("once", None, true)).await.unwrap();

        let granted = race(&store, share.id, 32).await;
        assert_eq!(granted, 1);

        let after = store.find_by_id(share.id).await.unwrap().unwrap();
        assert_eq!(after.download_count, 1);
        assert!(!after.is_active);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_expired_share_never_consumed() {
        let store = MemoryShareStore::new();
        let mut expired = record("exp", None, false);
        expired.expires_at = Utc::now() - Duration::seconds(1);
        let share = store.insert(expired).await.unwrap();

        assert_eq!(race(&store, share.id, 16).await, 0);
        let after = store.find_by_id(share.id).await.unwrap().unwrap();
        assert_eq!(after.download_count, 0);
    }

    #[tokio::test]
    async fn test_extend_adds_to_current_expiry() {
        let store = MemoryShareStore::new();
        let share = store.insert(record("ext", None, false)).await.unwrap();
        let updated = store
            .extend_expiry(share.id, Duration::days(7))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.expires_at, share.expires_at + Duration::days(7));
        assert!(
            store
                .extend_expiry(ShareId::new(), Duration::days(7))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_extensions_all_apply() {
        let store = MemoryShareStore::new();
        let share = store.insert(record("ext-race", None, false)).await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.extend_expiry(share.id, Duration::days(1)).await })
            })
            .collect();
        for result in futures::future::join_all(handles).await {
            assert!(result.unwrap().unwrap().is_some());
        }

        let after = store.find_by_id(share.id).await.unwrap().unwrap();
        assert_eq!(after.expires_at, share.expires_at + Duration::days(16));
    }

    #[tokio::test]
    async fn test_revoked_share_is_not_extended() {
        let store = MemoryShareStore::new();
        let share = store.insert(record("ext-rev", None, false)).await.unwrap();
        store.deactivate(share.id).await.unwrap();

        assert!(
            store
                .extend_expiry(share.id, Duration::days(1))
                .await
                .unwrap()
                .is_none()
        );
        let after = store.find_by_id(share.id).await.unwrap().unwrap();
        assert_eq!(after.expires_at, share.expires_at);
    }

    #[tokio::test]
    async fn test_extend_past_representable_range_is_rejected() {
        let store = MemoryShareStore::new();
        let mut far = record("ext-max", None, false);
        far.expires_at = DateTime::<Utc>::MAX_UTC;
        let share = store.insert(far).await.unwrap();

        let err = store
            .extend_expiry(share.id, Duration::days(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        let after = store.find_by_id(share.id).await.unwrap().unwrap();
        assert_eq!(after.expires_at, DateTime::<Utc>::MAX_UTC);
    }
}
