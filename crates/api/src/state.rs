use std::sync::Arc;

use doer_activation::{ActivationServices, ActivationTracker};
use doer_core::types::DbId;
use doer_events::bus::EventBus;

use crate::config::ServerConfig;
use crate::profile::ProfileCache;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Store, bus, and policy shared by every activation tracker.
    pub activation: ActivationServices,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Event bus for activation events.
    pub event_bus: Arc<EventBus>,
    /// Doer profiles, refreshed when a doer activates.
    pub profiles: Arc<ProfileCache>,
}

impl AppState {
    /// A request-scoped tracker for the authenticated doer.
    pub fn tracker(&self, doer_id: DbId) -> ActivationTracker {
        self.activation.tracker(Some(doer_id))
    }
}
