//! Notification entity models and DTOs.

use cadence_core::notification::NotificationType;
use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `notifications` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Notification {
    pub id: DbId,
    pub user_id: DbId,
    #[sqlx(try_from = "String")]
    pub notification_type: NotificationType,
    pub message: String,
    pub approval_id: Option<DbId>,
    pub is_read: bool,
    pub read_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for inserting a notification for an already-resolved user.
#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub notification_type: NotificationType,
    pub message: String,
    pub approval_id: Option<DbId>,
}
