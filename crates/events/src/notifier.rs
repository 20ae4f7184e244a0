//! Persist-then-publish delivery of notification intents.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use cadence_core::error::CoreError;
use cadence_core::types::DbId;
use cadence_db::models::notification::Notification;
use cadence_db::{NotificationStore, UserDirectory};

use crate::intent::NotificationIntent;
use crate::registry::{DeliveryError, DeliveryRegistry};

/// Where stored notifications go for live delivery.
///
/// [`DeliveryRegistry`] is the in-process implementation. A deployment
/// running several API instances would put a broker-backed implementation
/// here instead (one topic per user).
#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Push an already-persisted notification to its owner's live viewers.
    /// Returns how many viewers it reached.
    async fn publish(&self, notification: &Notification) -> Result<usize, DeliveryError>;
}

#[async_trait]
impl NotificationPublisher for DeliveryRegistry {
    async fn publish(&self, notification: &Notification) -> Result<usize, DeliveryError> {
        DeliveryRegistry::publish(self, notification.user_id, notification)
    }
}

type RecipientLock = Arc<tokio::sync::Mutex<()>>;

/// Turns [`NotificationIntent`]s into stored rows and live pushes.
///
/// Insert and publish for one recipient run under that recipient's lock,
/// so live delivery follows commit order. Different recipients proceed
/// in parallel.
#[derive(Clone)]
pub struct Notifier {
    store: Arc<dyn NotificationStore>,
    publisher: Arc<dyn NotificationPublisher>,
    recipients: Arc<Mutex<HashMap<DbId, RecipientLock>>>,
}

impl Notifier {
    pub fn new(store: Arc<dyn NotificationStore>, publisher: Arc<dyn NotificationPublisher>) -> Self {
        Self {
            store,
            publisher,
            recipients: Arc::default(),
        }
    }

    fn recipient_lock(&self, user_id: DbId) -> RecipientLock {
        let mut locks = self.recipients.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(user_id).or_default())
    }

    /// Forget `user_id`'s lock once no other `notify` holds or awaits it.
    fn release_recipient(&self, user_id: DbId, lock: RecipientLock) {
        let mut locks = self.recipients.lock().unwrap_or_else(PoisonError::into_inner);
        // One reference in the map, one here.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(&user_id);
        }
    }

    /// Number of recipients with a `notify` in flight.
    pub fn in_flight_recipients(&self) -> usize {
        self.recipients
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Persist the intent, then publish the stored row.
    ///
    /// A store failure (including an unresolvable recipient) is returned and
    /// nothing is published. A publish failure is logged and swallowed: the
    /// row is already durable and the viewer can re-read it.
    pub async fn notify(&self, intent: NotificationIntent) -> Result<Notification, CoreError> {
        let user_id = self
            .store
            .resolve_user(&intent.recipient)
            .await?
            .ok_or_else(|| intent.recipient.not_found())?;

        let lock = self.recipient_lock(user_id);
        let result = {
            let _ordered = lock.lock().await;
            self.persist_and_publish(user_id, &intent).await
        };
        self.release_recipient(user_id, lock);
        result
    }

    async fn persist_and_publish(
        &self,
        user_id: DbId,
        intent: &NotificationIntent,
    ) -> Result<Notification, CoreError> {
        let notification = self
            .store
            .insert_notification(user_id, &intent.to_create())
            .await?;

        tracing::info!(
            notification_id = notification.id,
            user_id = notification.user_id,
            notification_type = %notification.notification_type,
            approval_id = ?notification.approval_id,
            actor_user_id = ?intent.actor_user_id,
            "Notification created"
        );

        match self.publisher.publish(&notification).await {
            Ok(viewers) => {
                tracing::debug!(
                    notification_id = notification.id,
                    viewers,
                    "Notification published"
                );
            }
            Err(e) => {
                tracing::warn!(
                    notification_id = notification.id,
                    user_id = notification.user_id,
                    error = %e,
                    "Live publish failed; notification is stored"
                );
            }
        }

        Ok(notification)
    }
}
