//! PostgreSQL share repository.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;
use tracing::{error, warn};

use sealshare_core::error::{AppError, ErrorKind};
use sealshare_core::types::{ShareId, UserId};
use sealshare_entity::share::{ConsumeDenial, ConsumeResult, ShareRecord, UsageSnapshot};

use crate::store::{ShareStore, check_invariant, expiry_out_of_range};

/// Consumes one use only if the share is active, unexpired, and under its
/// limit. Row-level locking makes concurrent calls on one share serialize.
const CONSUME_SQL: &str = "\
    UPDATE shares SET \
        download_count = download_count + 1, \
        last_accessed = $2, \
        is_active = CASE WHEN is_one_time THEN FALSE ELSE is_active END \
    WHERE id = $1 \
      AND is_active \
      AND expires_at >= $2 \
      AND (max_downloads IS NULL OR download_count < max_downloads) \
    RETURNING *";

/// Pushes the expiry of an active share back in place. `$3` caps the result
/// at the latest instant a `DateTime<Utc>` can hold.
const EXTEND_SQL: &str = "\
    UPDATE shares SET expires_at = expires_at + $2 \
    WHERE id = $1 \
      AND is_active \
      AND expires_at + $2 <= $3 \
    RETURNING *";

const INSERT_SQL: &str = "\
    INSERT INTO shares (\
        id, token, artifact_id, sharer_id, recipient_id, is_active, is_one_time, \
        expires_at, unlock_time, max_downloads, download_count, last_accessed, \
        password_hash, device_fingerprint, allowed_countries, allowed_cities, \
        center_lat, center_lng, radius_km, sealed_payload, created_at) \
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
            $17, $18, $19, $20, $21) \
    RETURNING *";

/// Share store on top of the `shares` table.
#[derive(Debug, Clone)]
pub struct ShareRepository {
    pool: PgPool,
}

impl ShareRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        if let sqlx::Error::Database(db) = &e {
            if db.is_unique_violation() {
                return AppError::with_source(
                    ErrorKind::Conflict,
                    "Share id or token already exists",
                    e,
                );
            }
        }
        AppError::with_source(ErrorKind::Database, context, e)
    }
}

#[async_trait]
impl ShareStore for ShareRepository {
    async fn insert(&self, record: ShareRecord) -> Result<ShareRecord, AppError> {
        sqlx::query_as::<_, ShareRecord>(INSERT_SQL)
            .bind(record.id)
            .bind(&record.token)
            .bind(record.artifact_id)
            .bind(record.sharer_id)
            .bind(record.recipient_id)
            .bind(record.is_active)
            .bind(record.is_one_time)
            .bind(record.expires_at)
            .bind(record.unlock_time)
            .bind(record.max_downloads)
            .bind(record.download_count)
            .bind(record.last_accessed)
            .bind(&record.password_hash)
            .bind(&record.device_fingerprint)
            .bind(&record.geofence.allowed_countries)
            .bind(&record.geofence.allowed_cities)
            .bind(record.geofence.center_lat)
            .bind(record.geofence.center_lng)
            .bind(record.geofence.radius_km)
            .bind(&record.sealed_payload)
            .bind(record.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to insert share"))
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<ShareRecord>, AppError> {
        sqlx::query_as::<_, ShareRecord>("SELECT * FROM shares WHERE token = $1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find share by token"))
    }

    async fn find_by_id(&self, id: ShareId) -> Result<Option<ShareRecord>, AppError> {
        sqlx::query_as::<_, ShareRecord>("SELECT * FROM shares WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find share"))
    }

    async fn find_by_sharer(&self, sharer_id: UserId) -> Result<Vec<ShareRecord>, AppError> {
        sqlx::query_as::<_, ShareRecord>(
            "SELECT * FROM shares WHERE sharer_id = $1 ORDER BY created_at DESC",
        )
        .bind(sharer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list shares"))
    }

    async fn try_consume(
        &self,
        id: ShareId,
        now: DateTime<Utc>,
    ) -> Result<ConsumeResult, AppError> {
        let consumed = sqlx::query_as::<_, ShareRecord>(CONSUME_SQL)
            .bind(id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to record share download"))?;

        if let Some(record) = consumed {
            if let Err(e) = check_invariant(&record) {
                error!(share_id = %id, error = %e, "Usage counter corrupted");
                return Err(e);
            }
            return Ok(ConsumeResult::Granted(UsageSnapshot {
                download_count: record.download_count,
                max_downloads: record.max_downloads,
                is_active: record.is_active,
                deactivated: record.is_one_time,
                last_accessed: now,
            }));
        }

        // Nothing matched; read back to say why.
        let current = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Share {id} not found")))?;

        let denial = current.consume_denial_at(now).unwrap_or_else(|| {
            warn!(share_id = %id, "Conditional consume matched no row but share looks consumable");
            ConsumeDenial::LimitExceeded
        });
        Ok(ConsumeResult::Denied(denial))
    }

    async fn deactivate(&self, id: ShareId) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE shares SET is_active = FALSE WHERE id = $1 AND is_active")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to deactivate share"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn extend_expiry(
        &self,
        id: ShareId,
        by: TimeDelta,
    ) -> Result<Option<ShareRecord>, AppError> {
        let extended = sqlx::query_as::<_, ShareRecord>(EXTEND_SQL)
            .bind(id)
            .bind(by)
            .bind(DateTime::<Utc>::MAX_UTC)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to extend share"))?;
        if extended.is_some() {
            return Ok(extended);
        }

        match self.find_by_id(id).await? {
            Some(current) if current.is_active => Err(expiry_out_of_range(id)),
            _ => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<bool, AppError> {
        let one: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Share store health check failed"))?;
        Ok(one == 1)
    }
}
