use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use cadence_core::error::CoreError;
use cadence_core::notification::NotificationType;
use cadence_core::types::DbId;
use cadence_db::models::notification::{CreateNotification, Notification};
use cadence_db::models::user::User;
use cadence_db::{MemoryStore, NotificationStore, StoreResult, UserDirectory};
use cadence_events::{
    DeliveryCallback, DeliveryError, DeliveryRegistry, NotificationIntent, NotificationPublisher,
    Notifier,
};

/// Publisher whose transport is always down.
struct BrokenPublisher;

#[async_trait]
impl NotificationPublisher for BrokenPublisher {
    async fn publish(&self, _notification: &Notification) -> Result<usize, DeliveryError> {
        Err(DeliveryError::Transport("broker unreachable".into()))
    }
}

/// Store whose first insert commits immediately but is acknowledged late,
/// so a second insert can commit and return while the first is in flight.
struct SlowFirstAck {
    inner: MemoryStore,
    first: AtomicBool,
}

impl SlowFirstAck {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            first: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl UserDirectory for SlowFirstAck {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_external_id(external_id).await
    }
}

#[async_trait]
impl NotificationStore for SlowFirstAck {
    async fn insert_notification(
        &self,
        user_id: DbId,
        input: &CreateNotification,
    ) -> StoreResult<Notification> {
        let row = self.inner.insert_notification(user_id, input).await?;
        if self.first.swap(false, Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        Ok(row)
    }

    async fn list_notifications(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        self.inner
            .list_notifications(user_id, unread_only, limit, offset)
            .await
    }

    async fn unread_count(&self, user_id: DbId) -> StoreResult<i64> {
        self.inner.unread_count(user_id).await
    }

    async fn mark_read(
        &self,
        notification_id: DbId,
        user_id: DbId,
    ) -> StoreResult<Option<Notification>> {
        self.inner.mark_read(notification_id, user_id).await
    }

    async fn mark_all_read(&self, user_id: DbId) -> StoreResult<u64> {
        self.inner.mark_all_read(user_id).await
    }
}

fn recorder() -> (DeliveryCallback, Arc<Mutex<Vec<Notification>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let cb: DeliveryCallback = Arc::new(move |n: &Notification| {
        sink.lock().unwrap().push(n.clone());
        Ok(())
    });
    (cb, seen)
}

#[tokio::test]
async fn notify_persists_then_pushes_to_live_viewer() {
    let store = Arc::new(MemoryStore::new());
    let registry = DeliveryRegistry::new();
    let notifier = Notifier::new(store.clone(), Arc::new(registry.clone()));

    let user = store.insert_user(Some("idp|reviewer"), "Reviewer");
    let (cb, seen) = recorder();
    let _sub = registry.subscribe(user.id, cb);

    let stored = notifier
        .notify(
            NotificationIntent::new("idp|reviewer", NotificationType::ReviewAssigned, "review me")
                .with_approval(99),
        )
        .await
        .unwrap();

    assert_eq!(stored.user_id, user.id);
    assert!(!stored.is_read);
    assert_eq!(*seen.lock().unwrap(), vec![stored.clone()]);

    let rows = store.list_notifications(user.id, true, 50, 0).await.unwrap();
    assert_eq!(rows, vec![stored]);
}

#[tokio::test]
async fn unresolvable_recipient_publishes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let registry = DeliveryRegistry::new();
    let notifier = Notifier::new(store.clone(), Arc::new(registry.clone()));

    let (cb, seen) = recorder();
    let _sub = registry.subscribe(1, cb);

    let err = notifier
        .notify(NotificationIntent::new("ghost", NotificationType::StatusChanged, "x"))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::NotFoundByKey { entity: "User", .. });
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_store_write_publishes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let registry = DeliveryRegistry::new();
    let notifier = Notifier::new(store.clone(), Arc::new(registry.clone()));

    let user = store.insert_user(None, "Creator");
    let (cb, seen) = recorder();
    let _sub = registry.subscribe(user.id, cb);
    store.fail_notification_writes(true);

    let err = notifier
        .notify(NotificationIntent::new(user.id, NotificationType::StatusChanged, "x"))
        .await
        .unwrap_err();

    assert_matches!(err, CoreError::Internal(_));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_publish_still_returns_the_stored_row() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Notifier::new(store.clone(), Arc::new(BrokenPublisher));
    let user = store.insert_user(None, "Creator");

    let stored = notifier
        .notify(NotificationIntent::new(user.id, NotificationType::ContentPublished, "live"))
        .await
        .unwrap();

    assert_eq!(store.unread_count(user.id).await.unwrap(), 1);
    assert_eq!(stored.notification_type, NotificationType::ContentPublished);
}

#[tokio::test]
async fn concurrent_notifications_reach_viewer_in_commit_order() {
    let store = Arc::new(SlowFirstAck::new());
    let registry = DeliveryRegistry::new();
    let notifier = Notifier::new(store.clone(), Arc::new(registry.clone()));

    let user = store.inner.insert_user(None, "Creator");
    let (cb, seen) = recorder();
    let _sub = registry.subscribe(user.id, cb);

    let (first, second) = tokio::join!(
        notifier.notify(NotificationIntent::new(user.id, NotificationType::StatusChanged, "one")),
        notifier.notify(NotificationIntent::new(user.id, NotificationType::StatusChanged, "two")),
    );
    first.unwrap();
    second.unwrap();

    let mut committed: Vec<DbId> = store
        .list_notifications(user.id, false, 50, 0)
        .await
        .unwrap()
        .iter()
        .map(|n| n.id)
        .collect();
    committed.reverse();

    let delivered: Vec<DbId> = seen.lock().unwrap().iter().map(|n| n.id).collect();
    assert_eq!(delivered, committed);
    assert_eq!(notifier.in_flight_recipients(), 0);
}

#[tokio::test]
async fn slow_recipient_does_not_hold_up_others() {
    let store = Arc::new(SlowFirstAck::new());
    let registry = DeliveryRegistry::new();
    let notifier = Notifier::new(store.clone(), Arc::new(registry.clone()));

    let slow = store.inner.insert_user(None, "Slow");
    let fast = store.inner.insert_user(None, "Fast");
    let (cb, seen) = recorder();
    let _slow_sub = registry.subscribe(slow.id, Arc::clone(&cb));
    let _fast_sub = registry.subscribe(fast.id, cb);

    let (a, b) = tokio::join!(
        notifier.notify(NotificationIntent::new(slow.id, NotificationType::StatusChanged, "slow")),
        notifier.notify(NotificationIntent::new(fast.id, NotificationType::StatusChanged, "fast")),
    );
    a.unwrap();
    b.unwrap();

    let owners: Vec<DbId> = seen.lock().unwrap().iter().map(|n| n.user_id).collect();
    assert_eq!(owners, vec![fast.id, slow.id]);
}
