//! Wiring of the share services from configuration.

use std::sync::Arc;

use tracing::info;

use sealshare_core::config::AppConfig;
use sealshare_core::result::AppResult;
use sealshare_crypto::PasswordHasher;
use sealshare_database::{ShareStore, open_store};

use crate::events::EventBus;
use crate::share::{PayloadKeyring, ShareAccessController, ShareService};

/// Every share service, sharing one store, hasher, keyring, and event bus.
#[derive(Debug, Clone)]
pub struct ShareServices {
    /// The backing store.
    pub store: Arc<dyn ShareStore>,
    /// Event bus the services publish to.
    pub events: EventBus,
    /// Sharing workflow.
    pub shares: ShareService,
    /// Access controller.
    pub access: ShareAccessController,
}

impl ShareServices {
    /// Wire the services over an existing store.
    pub fn new(config: &AppConfig, store: Arc<dyn ShareStore>) -> Self {
        let hasher = Arc::new(PasswordHasher::new());
        let keyring = Arc::new(PayloadKeyring::from_config(&config.crypto));
        let events = EventBus::default();

        let shares = ShareService::new(
            Arc::clone(&store),
            Arc::clone(&hasher),
            Arc::clone(&keyring),
            events.clone(),
            config.share.clone(),
        );
        let access =
            ShareAccessController::new(Arc::clone(&store), hasher, keyring, events.clone());

        Self {
            store,
            events,
            shares,
            access,
        }
    }

    /// Open the configured store and wire the services over it.
    pub async fn open(config: &AppConfig) -> AppResult<Self> {
        let store = open_store(config).await?;
        info!(backend = %config.store.backend, "Share services ready");
        Ok(Self::new(config, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealshare_core::types::{ArtifactId, UserId};

    use crate::context::RequestContext;
    use crate::share::{AccessCredentials, CreateShareRequest};

    #[tokio::test]
    async fn test_memory_wiring_round_trip() {
        let mut config = AppConfig::default();
        config.crypto.pbkdf2_iterations = 10;
        let services = ShareServices::open(&config).await.unwrap();

        let ctx = RequestContext::member(UserId::new());
        let summary = services
            .shares
            .create_share(
                &ctx,
                CreateShareRequest {
                    artifact_id: ArtifactId::new(),
                    is_one_time: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let outcome = services
            .access
            .access(&summary.token, &AccessCredentials::default())
            .await
            .unwrap();
        assert!(outcome.is_granted());
        assert!(services.store.health_check().await.unwrap());
    }
}
