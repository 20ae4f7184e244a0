use std::sync::Arc;

use cadence_db::{NotificationStore, ReviewStore, UserDirectory};
use cadence_events::{DeliveryRegistry, Notifier};
use cadence_review::ReviewService;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; everything inside is behind `Arc` or already `Clone`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (JWT settings, heartbeat interval).
    pub config: Arc<ServerConfig>,
    /// Identity resolution for authenticated callers.
    pub users: Arc<dyn UserDirectory>,
    /// Approval, comment and history persistence (also used for health).
    pub review_store: Arc<dyn ReviewStore>,
    /// Per-user notification rows.
    pub notifications: Arc<dyn NotificationStore>,
    /// Live channels for connected viewers.
    pub registry: DeliveryRegistry,
    /// The approval workflow.
    pub review: ReviewService,
}

impl AppState {
    /// Wire the workflow over a store that implements every port, with a
    /// fresh in-process delivery registry.
    pub fn new<S>(config: ServerConfig, store: Arc<S>) -> Self
    where
        S: ReviewStore + NotificationStore + 'static,
    {
        let registry = DeliveryRegistry::new();
        let notifier = Notifier::new(store.clone(), Arc::new(registry.clone()));
        let review = ReviewService::new(store.clone(), store.clone(), notifier);

        Self {
            config: Arc::new(config),
            users: store.clone(),
            review_store: store.clone(),
            notifications: store,
            registry,
            review,
        }
    }
}
