//! The notification envelope the workflow emits.

use cadence_core::identity::UserRef;
use cadence_core::notification::NotificationType;
use cadence_core::types::{DbId, Timestamp};
use cadence_db::models::notification::CreateNotification;
use chrono::Utc;
use serde::Serialize;

// ---------------------------------------------------------------------------
// NotificationIntent
// ---------------------------------------------------------------------------

/// A request to notify one user about something that happened to an
/// approval.
///
/// Constructed via [`NotificationIntent::new`] and enriched with
/// [`with_approval`](NotificationIntent::with_approval) and
/// [`with_actor`](NotificationIntent::with_actor). The recipient is an
/// unresolved [`UserRef`]; the notification store resolves it when the
/// intent is persisted.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationIntent {
    /// Who should receive the notification.
    pub recipient: UserRef,

    pub notification_type: NotificationType,

    /// Human-readable message stored on the notification row.
    pub message: String,

    /// The approval that caused the notification, if any.
    pub approval_id: Option<DbId>,

    /// The user whose action triggered the notification.
    pub actor_user_id: Option<DbId>,

    /// When the intent was created (UTC).
    pub timestamp: Timestamp,
}

impl NotificationIntent {
    pub fn new(
        recipient: impl Into<UserRef>,
        notification_type: NotificationType,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            notification_type,
            message: message.into(),
            approval_id: None,
            actor_user_id: None,
            timestamp: Utc::now(),
        }
    }

    /// Link the notification back to an approval.
    pub fn with_approval(mut self, approval_id: DbId) -> Self {
        self.approval_id = Some(approval_id);
        self
    }

    /// Record the acting user.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// The insert DTO for the notification store.
    pub fn to_create(&self) -> CreateNotification {
        CreateNotification {
            notification_type: self.notification_type,
            message: self.message.clone(),
            approval_id: self.approval_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
