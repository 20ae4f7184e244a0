//! PostgreSQL implementation of the store ports.
//!
//! A thin adapter: every method delegates to the matching repository.

use async_trait::async_trait;
use cadence_core::approval::ApprovalStatus;
use cadence_core::types::DbId;

use crate::error::StoreResult;
use crate::models::approval::{Approval, UpsertApproval};
use crate::models::comment::{Comment, CreateComment};
use crate::models::content::ContentItem;
use crate::models::history::{CreateHistoryEntry, HistoryEntry};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::user::User;
use crate::repositories::{
    ApprovalRepo, CommentRepo, ContentRepo, HistoryRepo, NotificationRepo, UserRepo,
};
use crate::store::{NotificationStore, ReviewStore, UserDirectory};
use crate::DbPool;

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_external_id(&self.pool, external_id).await?)
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn find_content(&self, content_id: DbId) -> StoreResult<Option<ContentItem>> {
        Ok(ContentRepo::find_by_id(&self.pool, content_id).await?)
    }

    async fn update_content_status(&self, content_id: DbId, status: &str) -> StoreResult<bool> {
        Ok(ContentRepo::update_status(&self.pool, content_id, status).await?)
    }

    async fn find_approval(&self, approval_id: DbId) -> StoreResult<Option<Approval>> {
        Ok(ApprovalRepo::find_by_id(&self.pool, approval_id).await?)
    }

    async fn find_approval_by_content(&self, content_id: DbId) -> StoreResult<Option<Approval>> {
        Ok(ApprovalRepo::find_by_content(&self.pool, content_id).await?)
    }

    async fn upsert_approval(&self, input: &UpsertApproval) -> StoreResult<Approval> {
        Ok(ApprovalRepo::upsert(&self.pool, input).await?)
    }

    async fn update_approval_status(
        &self,
        approval_id: DbId,
        status: ApprovalStatus,
    ) -> StoreResult<Option<Approval>> {
        Ok(ApprovalRepo::update_status(&self.pool, approval_id, status).await?)
    }

    async fn create_comment(&self, input: &CreateComment) -> StoreResult<Comment> {
        Ok(CommentRepo::create(&self.pool, input).await?)
    }

    async fn find_comment(&self, comment_id: DbId) -> StoreResult<Option<Comment>> {
        Ok(CommentRepo::find_by_id(&self.pool, comment_id).await?)
    }

    async fn list_comments(&self, approval_id: DbId) -> StoreResult<Vec<Comment>> {
        Ok(CommentRepo::list_for_approval(&self.pool, approval_id).await?)
    }

    async fn update_comment(
        &self,
        comment_id: DbId,
        content: &str,
    ) -> StoreResult<Option<Comment>> {
        Ok(CommentRepo::update_content(&self.pool, comment_id, content).await?)
    }

    async fn delete_comment(&self, comment_id: DbId) -> StoreResult<bool> {
        Ok(CommentRepo::delete(&self.pool, comment_id).await?)
    }

    async fn append_history(&self, input: &CreateHistoryEntry) -> StoreResult<HistoryEntry> {
        Ok(HistoryRepo::append(&self.pool, input).await?)
    }

    async fn list_history(&self, approval_id: DbId) -> StoreResult<Vec<HistoryEntry>> {
        Ok(HistoryRepo::list_for_approval(&self.pool, approval_id).await?)
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(
        &self,
        user_id: DbId,
        input: &CreateNotification,
    ) -> StoreResult<Notification> {
        Ok(NotificationRepo::create(&self.pool, user_id, input).await?)
    }

    async fn list_notifications(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        Ok(NotificationRepo::list_for_user(&self.pool, user_id, unread_only, limit, offset).await?)
    }

    async fn unread_count(&self, user_id: DbId) -> StoreResult<i64> {
        Ok(NotificationRepo::unread_count(&self.pool, user_id).await?)
    }

    async fn mark_read(
        &self,
        notification_id: DbId,
        user_id: DbId,
    ) -> StoreResult<Option<Notification>> {
        Ok(NotificationRepo::mark_read(&self.pool, notification_id, user_id).await?)
    }

    async fn mark_all_read(&self, user_id: DbId) -> StoreResult<u64> {
        Ok(NotificationRepo::mark_all_read(&self.pool, user_id).await?)
    }
}
