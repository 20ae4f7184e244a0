//! Store ports the review workflow and notification pipeline depend on.
//!
//! Every method is a single-row (or single-statement) operation; nothing
//! here spans entities in a transaction. [`PgStore`](crate::PgStore) and
//! [`MemoryStore`](crate::MemoryStore) both implement all three traits.

use async_trait::async_trait;
use cadence_core::approval::ApprovalStatus;
use cadence_core::error::CoreError;
use cadence_core::identity::UserRef;
use cadence_core::types::DbId;

use crate::error::StoreResult;
use crate::models::approval::{Approval, UpsertApproval};
use crate::models::comment::{Comment, CreateComment};
use crate::models::content::ContentItem;
use crate::models::history::{CreateHistoryEntry, HistoryEntry};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::user::User;

/* --------------------------------------------------------------------------
Users
-------------------------------------------------------------------------- */

/// User lookups and dual-identity resolution.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>>;

    async fn find_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>>;

    /// Resolve a user reference to an internal id.
    ///
    /// Tries, in order: the reference as an internal id, then the reference
    /// as an identity-provider subject id. `None` when neither matches.
    async fn resolve_user(&self, user: &UserRef) -> StoreResult<Option<DbId>> {
        if let Some(id) = user.internal_candidate() {
            if let Some(found) = self.find_user_by_id(id).await? {
                return Ok(Some(found.id));
            }
        }

        let found = self
            .find_user_by_external_id(&user.external_candidate())
            .await?;
        Ok(found.map(|u| u.id))
    }
}

/* --------------------------------------------------------------------------
Approvals, comments, history
-------------------------------------------------------------------------- */

/// Persistence for approvals, their comment threads and their audit history,
/// plus the content-item reads the workflow needs.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn find_content(&self, content_id: DbId) -> StoreResult<Option<ContentItem>>;

    /// Mirror an approval status onto the content item. Returns `false` if
    /// the content item does not exist.
    async fn update_content_status(&self, content_id: DbId, status: &str) -> StoreResult<bool>;

    async fn find_approval(&self, approval_id: DbId) -> StoreResult<Option<Approval>>;

    async fn find_approval_by_content(&self, content_id: DbId) -> StoreResult<Option<Approval>>;

    /// Create the approval or overwrite its status, step and assignee.
    async fn upsert_approval(&self, input: &UpsertApproval) -> StoreResult<Approval>;

    async fn update_approval_status(
        &self,
        approval_id: DbId,
        status: ApprovalStatus,
    ) -> StoreResult<Option<Approval>>;

    async fn create_comment(&self, input: &CreateComment) -> StoreResult<Comment>;

    async fn find_comment(&self, comment_id: DbId) -> StoreResult<Option<Comment>>;

    /// All comments of an approval, oldest first.
    async fn list_comments(&self, approval_id: DbId) -> StoreResult<Vec<Comment>>;

    async fn update_comment(&self, comment_id: DbId, content: &str)
        -> StoreResult<Option<Comment>>;

    /// Delete a comment; its replies stay with `parent_id` cleared.
    async fn delete_comment(&self, comment_id: DbId) -> StoreResult<bool>;

    async fn append_history(&self, input: &CreateHistoryEntry) -> StoreResult<HistoryEntry>;

    /// Full history of an approval, oldest first.
    async fn list_history(&self, approval_id: DbId) -> StoreResult<Vec<HistoryEntry>>;

    /// Whether the backing store is reachable.
    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/* --------------------------------------------------------------------------
Notifications
-------------------------------------------------------------------------- */

/// Durable per-user notification rows.
#[async_trait]
pub trait NotificationStore: UserDirectory {
    async fn insert_notification(
        &self,
        user_id: DbId,
        input: &CreateNotification,
    ) -> StoreResult<Notification>;

    /// Notifications for a user, newest first.
    async fn list_notifications(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>>;

    async fn unread_count(&self, user_id: DbId) -> StoreResult<i64>;

    /// Flip `is_read`; a no-op for rows that are already read. `None` if the
    /// row does not exist for `user_id`.
    async fn mark_read(&self, notification_id: DbId, user_id: DbId)
        -> StoreResult<Option<Notification>>;

    /// Returns the number of rows flipped.
    async fn mark_all_read(&self, user_id: DbId) -> StoreResult<u64>;

    /// Resolve `user` and persist an unread notification for them.
    ///
    /// The returned row carries the resolved internal id in `user_id`.
    async fn create(
        &self,
        user: &UserRef,
        input: &CreateNotification,
    ) -> Result<Notification, CoreError> {
        let user_id = self
            .resolve_user(user)
            .await?
            .ok_or_else(|| user.not_found())?;
        Ok(self.insert_notification(user_id, input).await?)
    }
}
