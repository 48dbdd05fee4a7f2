//! Cached doer profiles and the background task that keeps them current.
//!
//! [`ProfileRefresher`] listens on the event bus and reloads a doer's
//! profile when `doer.activated` arrives, so the next profile read shows
//! the unlocked status without waiting for an expiry.

use std::collections::HashMap;
use std::sync::Arc;

use doer_activation::{ActivationStore, StoreResult};
use doer_core::types::DbId;
use doer_db::models::doer::Doer;
use doer_events::bus::{PlatformEvent, DOER_ACTIVATED};
use tokio::sync::{broadcast, RwLock};

/// In-memory doer profiles keyed by id.
#[derive(Default)]
pub struct ProfileCache {
    profiles: RwLock<HashMap<DbId, Doer>>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, doer_id: DbId) -> Option<Doer> {
        self.profiles.read().await.get(&doer_id).cloned()
    }

    /// Return the cached profile, loading it from the store on a miss.
    pub async fn get_or_load(
        &self,
        store: &dyn ActivationStore,
        doer_id: DbId,
    ) -> StoreResult<Option<Doer>> {
        if let Some(doer) = self.get(doer_id).await {
            return Ok(Some(doer));
        }
        self.reload(store, doer_id).await
    }

    /// Replace the cached profile with the stored one.
    pub async fn reload(
        &self,
        store: &dyn ActivationStore,
        doer_id: DbId,
    ) -> StoreResult<Option<Doer>> {
        let doer = store.get_doer(doer_id).await?;
        let mut profiles = self.profiles.write().await;
        match &doer {
            Some(doer) => {
                profiles.insert(doer_id, doer.clone());
            }
            None => {
                profiles.remove(&doer_id);
            }
        }
        Ok(doer)
    }

    pub async fn is_empty(&self) -> bool {
        self.profiles.read().await.is_empty()
    }
}

/// Background service that refreshes cached profiles on activation.
pub struct ProfileRefresher {
    cache: Arc<ProfileCache>,
    store: Arc<dyn ActivationStore>,
}

impl ProfileRefresher {
    pub fn new(cache: Arc<ProfileCache>, store: Arc<dyn ActivationStore>) -> Self {
        Self { cache, store }
    }

    /// Run the refresh loop until the channel closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.handle(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Profile refresher lagged, some events were missed");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, profile refresher shutting down");
                    break;
                }
            }
        }
    }

    async fn handle(&self, event: &PlatformEvent) {
        if event.event_type != DOER_ACTIVATED {
            return;
        }
        let Some(doer_id) = event.doer_id else {
            return;
        };

        match self.cache.reload(self.store.as_ref(), doer_id).await {
            Ok(Some(doer)) => {
                tracing::info!(doer_id, is_activated = doer.is_activated, "Doer profile refreshed");
            }
            Ok(None) => {
                tracing::warn!(doer_id, "Activated doer has no profile");
            }
            Err(e) => {
                tracing::error!(doer_id, error = %e, "Failed to refresh doer profile");
            }
        }
    }
}
