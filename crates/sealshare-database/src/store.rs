//! Share store abstraction.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use sealshare_core::config::{AppConfig, StoreBackend};
use sealshare_core::error::AppError;
use sealshare_core::types::{ShareId, UserId};
use sealshare_entity::share::{ConsumeResult, ShareRecord};

use crate::connection::DatabasePool;
use crate::memory::MemoryShareStore;
use crate::repositories::ShareRepository;

/// Persistent home of share records.
///
/// Implementations must be safe under concurrent access. In particular
/// [`try_consume`](ShareStore::try_consume) must decide and record a use in
/// one indivisible step per share, and must not serialize unrelated shares
/// behind a single lock.
#[async_trait]
pub trait ShareStore: Send + Sync + std::fmt::Debug {
    /// Persist a new share. Fails with `Conflict` on a duplicate id or token.
    async fn insert(&self, record: ShareRecord) -> Result<ShareRecord, AppError>;

    /// Look up a share by token, including inactive ones.
    async fn find_by_token(&self, token: &str) -> Result<Option<ShareRecord>, AppError>;

    /// Look up a share by id.
    async fn find_by_id(&self, id: ShareId) -> Result<Option<ShareRecord>, AppError>;

    /// Every share created by `sharer_id`, newest first.
    async fn find_by_sharer(&self, sharer_id: UserId) -> Result<Vec<ShareRecord>, AppError>;

    /// Atomically check consumability at `now` and record one use.
    ///
    /// Fails with `NotFound` when the share does not exist and with
    /// `Internal` when the stored counters break their invariant.
    async fn try_consume(&self, id: ShareId, now: DateTime<Utc>)
    -> Result<ConsumeResult, AppError>;

    /// Clear `is_active`. Returns whether the share was active before.
    async fn deactivate(&self, id: ShareId) -> Result<bool, AppError>;

    /// Push the expiry of an active share back by `by` in one step.
    ///
    /// Returns `None` when the share is missing or revoked. Fails with
    /// `Validation` when the new expiry would be out of range.
    async fn extend_expiry(
        &self,
        id: ShareId,
        by: TimeDelta,
    ) -> Result<Option<ShareRecord>, AppError>;

    /// Whether the backend is reachable.
    async fn health_check(&self) -> Result<bool, AppError>;
}

/// Build the store selected by `[store] backend`.
///
/// The PostgreSQL backend connects and applies migrations first.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn ShareStore>, AppError> {
    info!(backend = %config.store.backend, "Opening share store");
    match config.store.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryShareStore::new())),
        StoreBackend::Postgres => {
            let db = DatabasePool::connect(&config.database).await?;
            crate::migration::run_migrations(db.pool()).await?;
            Ok(Arc::new(ShareRepository::new(db.pool().clone())))
        }
    }
}

pub(crate) fn expiry_out_of_range(id: ShareId) -> AppError {
    AppError::validation(format!("Extended expiry of share {id} is out of range"))
}

/// Reject a post-consume state that breaks the counter invariant.
pub(crate) fn check_invariant(record: &ShareRecord) -> Result<(), AppError> {
    match record.usage_invariant_violation() {
        Some(violation) => Err(AppError::internal(format!(
            "Share {} usage invariant violated: {violation}",
            record.id
        ))),
        None => Ok(()),
    }
}
