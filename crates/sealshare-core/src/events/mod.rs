//! Domain events emitted by share operations.
//!
//! Events are published on a broadcast channel by the service layer and
//! consumed by whichever audit or notification collaborator subscribes.

pub mod share;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use share::{DenialKind, ShareEvent};

use crate::types::UserId;

/// Wrapper for a share event with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The principal who caused the event (if known).
    pub actor_id: Option<UserId>,
    /// The event payload.
    pub payload: ShareEvent,
}

impl DomainEvent {
    /// Create a new domain event stamped with the current time.
    pub fn new(actor_id: Option<UserId>, payload: ShareEvent) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp: Utc::now(),
            actor_id,
            payload,
        }
    }
}
