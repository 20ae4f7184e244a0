//! In-process fan-out of notifications to live viewers.
//!
//! [`DeliveryRegistry`] keeps at most one live channel per user. The first
//! [`subscribe`](DeliveryRegistry::subscribe) for a user opens it, further
//! subscriptions join it, and it is torn down when the last
//! [`Subscription`] goes away or when any viewer's callback reports a
//! transport error. Torn-down channels are never reopened automatically:
//! viewers observe [`Subscription::closed`] and must subscribe again.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use cadence_core::types::DbId;
use cadence_db::models::notification::Notification;
use tokio_util::sync::CancellationToken;

/// Callback invoked for every notification published to a user.
///
/// Runs synchronously on the publisher's task, outside the registry lock.
/// Returning an error closes the whole channel for that user.
pub type DeliveryCallback = Arc<dyn Fn(&Notification) -> Result<(), DeliveryError> + Send + Sync>;

/// Errors raised while pushing a notification to live viewers.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The viewer on the other end has gone away.
    #[error("Viewer disconnected")]
    Disconnected,

    /// The notification could not be encoded or written to the transport.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A callback failed and the user's live channel was torn down.
    #[error("Live channel {channel_id} for user {user_id} closed: {reason}")]
    ChannelClosed {
        user_id: DbId,
        channel_id: u64,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Channel state
// ---------------------------------------------------------------------------

struct UserChannel {
    channel_id: u64,
    token: CancellationToken,
    callbacks: HashMap<u64, DeliveryCallback>,
}

#[derive(Default)]
struct Inner {
    channels: Mutex<HashMap<DbId, UserChannel>>,
    next_channel_id: AtomicU64,
    next_callback_id: AtomicU64,
}

impl Inner {
    fn channels(&self) -> MutexGuard<'_, HashMap<DbId, UserChannel>> {
        self.channels.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove `user_id`'s channel if it is still `channel_id`, cancelling
    /// its token. Returns whether anything was removed.
    fn close_channel(&self, user_id: DbId, channel_id: u64) -> bool {
        let removed = {
            let mut channels = self.channels();
            match channels.get(&user_id) {
                Some(ch) if ch.channel_id == channel_id => channels.remove(&user_id),
                _ => None,
            }
        };
        match removed {
            Some(ch) => {
                ch.token.cancel();
                true
            }
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryRegistry
// ---------------------------------------------------------------------------

/// Process-wide map of user id to live channel.
///
/// Cheap to clone; clones share the same channels.
#[derive(Clone, Default)]
pub struct DeliveryRegistry {
    inner: Arc<Inner>,
}

impl DeliveryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a viewer callback for `user_id`.
    ///
    /// Opens the user's live channel if this is the first viewer; otherwise
    /// joins the existing one.
    pub fn subscribe(&self, user_id: DbId, callback: DeliveryCallback) -> Subscription {
        let callback_id = self.inner.next_callback_id.fetch_add(1, Ordering::Relaxed);

        let mut channels = self.inner.channels();
        let channel = channels.entry(user_id).or_insert_with(|| {
            let channel_id = self.inner.next_channel_id.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(user_id, channel_id, "Opened live channel");
            UserChannel {
                channel_id,
                token: CancellationToken::new(),
                callbacks: HashMap::new(),
            }
        });
        channel.callbacks.insert(callback_id, callback);

        tracing::debug!(
            user_id,
            channel_id = channel.channel_id,
            viewers = channel.callbacks.len(),
            "Viewer subscribed"
        );

        Subscription {
            inner: Arc::clone(&self.inner),
            user_id,
            channel_id: channel.channel_id,
            callback_id,
            token: channel.token.clone(),
        }
    }

    /// Push `notification` to every live viewer of `user_id`.
    ///
    /// Returns the number of callbacks invoked; `0` when the user has no
    /// live channel. If any callback fails the channel is torn down, the
    /// remaining callbacks are skipped and
    /// [`DeliveryError::ChannelClosed`] is returned.
    pub fn publish(&self, user_id: DbId, notification: &Notification) -> Result<usize, DeliveryError> {
        let (channel_id, callbacks) = {
            let channels = self.inner.channels();
            match channels.get(&user_id) {
                Some(ch) => (
                    ch.channel_id,
                    ch.callbacks.values().cloned().collect::<Vec<_>>(),
                ),
                None => return Ok(0),
            }
        };

        for callback in &callbacks {
            if let Err(err) = callback(notification) {
                self.inner.close_channel(user_id, channel_id);
                tracing::warn!(
                    user_id,
                    channel_id,
                    error = %err,
                    "Live delivery failed, channel closed"
                );
                return Err(DeliveryError::ChannelClosed {
                    user_id,
                    channel_id,
                    reason: err.to_string(),
                });
            }
        }

        Ok(callbacks.len())
    }

    /// Close every live channel. Viewers observe [`Subscription::closed`].
    pub fn shutdown(&self) {
        let drained: Vec<UserChannel> = self.inner.channels().drain().map(|(_, ch)| ch).collect();
        let count = drained.len();
        for ch in drained {
            ch.token.cancel();
        }
        tracing::info!(count, "Closed all live channels");
    }

    /// Number of users with an open live channel.
    pub fn channel_count(&self) -> usize {
        self.inner.channels().len()
    }

    /// Number of viewers attached to `user_id`'s channel.
    pub fn subscriber_count(&self, user_id: DbId) -> usize {
        self.inner
            .channels()
            .get(&user_id)
            .map_or(0, |ch| ch.callbacks.len())
    }

    /// Identifier of `user_id`'s current channel, if one is open.
    pub fn channel_id(&self, user_id: DbId) -> Option<u64> {
        self.inner.channels().get(&user_id).map(|ch| ch.channel_id)
    }
}

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// One viewer's registration on a user's live channel.
///
/// Dropping the subscription removes the callback; the channel is torn
/// down once its last subscription is gone.
pub struct Subscription {
    inner: Arc<Inner>,
    user_id: DbId,
    channel_id: u64,
    callback_id: u64,
    token: CancellationToken,
}

impl Subscription {
    pub fn user_id(&self) -> DbId {
        self.user_id
    }

    pub fn channel_id(&self) -> u64 {
        self.channel_id
    }

    /// Resolves once the channel has been torn down, for whatever reason.
    pub async fn closed(&self) {
        self.token.cancelled().await;
    }

    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Explicitly remove this viewer. Equivalent to dropping it.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let emptied = {
            let mut channels = self.inner.channels();
            let Some(ch) = channels.get_mut(&self.user_id) else {
                return;
            };
            if ch.channel_id != self.channel_id {
                return;
            }
            ch.callbacks.remove(&self.callback_id);
            ch.callbacks.is_empty()
        };

        if emptied && self.inner.close_channel(self.user_id, self.channel_id) {
            tracing::debug!(
                user_id = self.user_id,
                channel_id = self.channel_id,
                "Last viewer left, channel closed"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use cadence_core::notification::NotificationType;
    use chrono::Utc;

    use super::*;

    fn notification(id: DbId, user_id: DbId) -> Notification {
        Notification {
            id,
            user_id,
            notification_type: NotificationType::StatusChanged,
            message: format!("notification {id}"),
            approval_id: None,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        }
    }

    fn counting() -> (DeliveryCallback, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&hits);
        let cb: DeliveryCallback = Arc::new(move |_n: &Notification| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (cb, hits)
    }

    #[test]
    fn publish_without_viewers_is_a_noop() {
        let registry = DeliveryRegistry::new();
        assert_eq!(registry.publish(1, &notification(1, 1)).unwrap(), 0);
        assert_eq!(registry.channel_count(), 0);
    }

    #[test]
    fn subscriber_receives_each_publish_once() {
        let registry = DeliveryRegistry::new();
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let _sub = registry.subscribe(
            5,
            Arc::new(move |n: &Notification| {
                sink.lock().unwrap().push(n.id);
                Ok(())
            }),
        );

        assert_eq!(registry.publish(5, &notification(10, 5)).unwrap(), 1);
        assert_eq!(*received.lock().unwrap(), vec![10]);
    }

    #[test]
    fn publish_is_scoped_to_the_target_user() {
        let registry = DeliveryRegistry::new();
        let (cb, hits) = counting();
        let _sub = registry.subscribe(1, cb);

        assert_eq!(registry.publish(2, &notification(1, 2)).unwrap(), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribed_callback_is_never_invoked() {
        let registry = DeliveryRegistry::new();
        let (cb, hits) = counting();
        let sub = registry.subscribe(1, cb);

        sub.unsubscribe();
        registry.publish(1, &notification(1, 1)).unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(registry.channel_count(), 0);
    }

    #[test]
    fn viewers_of_one_user_share_a_channel() {
        let registry = DeliveryRegistry::new();
        let (cb1, hits1) = counting();
        let (cb2, hits2) = counting();

        let first = registry.subscribe(1, cb1);
        let second = registry.subscribe(1, cb2);
        assert_eq!(first.channel_id(), second.channel_id());
        assert_eq!(registry.channel_count(), 1);
        assert_eq!(registry.subscriber_count(1), 2);

        drop(first);
        assert_eq!(registry.subscriber_count(1), 1);
        assert!(!second.is_closed());
        assert_eq!(registry.publish(1, &notification(1, 1)).unwrap(), 1);
        assert_eq!(hits1.load(Ordering::SeqCst), 0);
        assert_eq!(hits2.load(Ordering::SeqCst), 1);

        drop(second);
        assert_eq!(registry.channel_count(), 0);
        assert_eq!(registry.channel_id(1), None);
    }

    #[test]
    fn resubscribing_after_teardown_opens_a_new_channel() {
        let registry = DeliveryRegistry::new();
        let (cb, _) = counting();

        let first = registry.subscribe(1, Arc::clone(&cb));
        let old_channel = first.channel_id();
        drop(first);

        let second = registry.subscribe(1, cb);
        assert_ne!(second.channel_id(), old_channel);
    }

    #[tokio::test]
    async fn failing_callback_closes_the_whole_channel() {
        let registry = DeliveryRegistry::new();
        let (healthy, _) = counting();
        let broken: DeliveryCallback = Arc::new(|_n: &Notification| Err(DeliveryError::Disconnected));

        let good = registry.subscribe(1, healthy);
        let bad = registry.subscribe(1, broken);

        let err = registry.publish(1, &notification(1, 1)).unwrap_err();
        assert_matches!(err, DeliveryError::ChannelClosed { user_id: 1, .. });
        assert_eq!(registry.channel_count(), 0);

        tokio::time::timeout(Duration::from_secs(1), good.closed())
            .await
            .expect("healthy viewer should observe the teardown");
        assert!(bad.is_closed());

        // No automatic retry: later publishes reach nobody.
        assert_eq!(registry.publish(1, &notification(2, 1)).unwrap(), 0);
    }

    #[test]
    fn stale_subscription_drop_leaves_new_channel_alone() {
        let registry = DeliveryRegistry::new();
        let broken: DeliveryCallback = Arc::new(|_n: &Notification| Err(DeliveryError::Disconnected));
        let stale = registry.subscribe(1, broken);
        let _ = registry.publish(1, &notification(1, 1));

        let (cb, _) = counting();
        let fresh = registry.subscribe(1, cb);
        drop(stale);

        assert_eq!(registry.channel_id(1), Some(fresh.channel_id()));
        assert_eq!(registry.subscriber_count(1), 1);
    }

    #[tokio::test]
    async fn shutdown_closes_every_channel() {
        let registry = DeliveryRegistry::new();
        let (a, _) = counting();
        let (b, _) = counting();
        let sub_a = registry.subscribe(1, a);
        let sub_b = registry.subscribe(2, b);

        registry.shutdown();

        assert_eq!(registry.channel_count(), 0);
        sub_a.closed().await;
        sub_b.closed().await;
    }
}
