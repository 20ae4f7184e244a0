//! In-process implementation of the store ports.
//!
//! Mirrors the PostgreSQL schema's behaviour (unique approval per content
//! item, `ON DELETE SET NULL` for comment parents, newest-first notification
//! ordering) so the workflow can run without a database. Fail points let
//! callers simulate a store that refuses specific writes.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use cadence_core::approval::ApprovalStatus;
use cadence_core::types::DbId;
use chrono::Utc;

use crate::error::{StoreError, StoreResult};
use crate::models::approval::{Approval, UpsertApproval};
use crate::models::comment::{Comment, CreateComment};
use crate::models::content::ContentItem;
use crate::models::history::{CreateHistoryEntry, HistoryEntry};
use crate::models::notification::{CreateNotification, Notification};
use crate::models::user::User;
use crate::store::{NotificationStore, ReviewStore, UserDirectory};

#[derive(Default)]
struct Tables {
    next_id: DbId,
    users: BTreeMap<DbId, User>,
    content: BTreeMap<DbId, ContentItem>,
    approvals: BTreeMap<DbId, Approval>,
    comments: BTreeMap<DbId, Comment>,
    history: Vec<HistoryEntry>,
    notifications: BTreeMap<DbId, Notification>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.next_id += 1;
        self.next_id
    }
}

/// Which writes the store should refuse.
#[derive(Default)]
struct FailPoints {
    approval_writes: AtomicBool,
    notification_writes: AtomicBool,
    content_status_writes: AtomicBool,
}

/// In-memory store. Ids come from one shared sequence across all tables.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail: FailPoints,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        // A panic while holding the lock cannot leave a table half-written.
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn check(flag: &AtomicBool, what: &str) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{what} writes are failing")));
        }
        Ok(())
    }

    /// Register a user, as the identity subsystem would.
    pub fn insert_user(&self, external_id: Option<&str>, display_name: &str) -> User {
        let mut t = self.tables();
        let user = User {
            id: t.next_id(),
            external_id: external_id.map(str::to_string),
            display_name: display_name.to_string(),
            created_at: Utc::now(),
        };
        t.users.insert(user.id, user.clone());
        user
    }

    /// Register a content item, as the content subsystem would.
    pub fn insert_content(&self, author_id: DbId, title: &str) -> ContentItem {
        let mut t = self.tables();
        let now = Utc::now();
        let item = ContentItem {
            id: t.next_id(),
            author_id,
            title: title.to_string(),
            status: None,
            created_at: now,
            updated_at: now,
        };
        t.content.insert(item.id, item.clone());
        item
    }

    /// Make approval upserts and status updates fail.
    pub fn fail_approval_writes(&self, fail: bool) {
        self.fail.approval_writes.store(fail, Ordering::SeqCst);
    }

    /// Make notification inserts fail.
    pub fn fail_notification_writes(&self, fail: bool) {
        self.fail.notification_writes.store(fail, Ordering::SeqCst);
    }

    /// Make the content status mirror write fail.
    pub fn fail_content_status_writes(&self, fail: bool) {
        self.fail.content_status_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn find_user_by_id(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn find_user_by_external_id(&self, external_id: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.external_id.as_deref() == Some(external_id))
            .cloned())
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn find_content(&self, content_id: DbId) -> StoreResult<Option<ContentItem>> {
        Ok(self.tables().content.get(&content_id).cloned())
    }

    async fn update_content_status(&self, content_id: DbId, status: &str) -> StoreResult<bool> {
        Self::check(&self.fail.content_status_writes, "content status")?;
        let mut t = self.tables();
        match t.content.get_mut(&content_id) {
            Some(item) => {
                item.status = Some(status.to_string());
                item.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_approval(&self, approval_id: DbId) -> StoreResult<Option<Approval>> {
        Ok(self.tables().approvals.get(&approval_id).cloned())
    }

    async fn find_approval_by_content(&self, content_id: DbId) -> StoreResult<Option<Approval>> {
        Ok(self
            .tables()
            .approvals
            .values()
            .find(|a| a.content_id == content_id)
            .cloned())
    }

    async fn upsert_approval(&self, input: &UpsertApproval) -> StoreResult<Approval> {
        Self::check(&self.fail.approval_writes, "approval")?;
        let mut t = self.tables();
        let now = Utc::now();

        if let Some(existing) = t
            .approvals
            .values_mut()
            .find(|a| a.content_id == input.content_id)
        {
            existing.status = input.status;
            existing.current_step = input.status.step();
            existing.assigned_to = input.assigned_to;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let approval = Approval {
            id: t.next_id(),
            content_id: input.content_id,
            status: input.status,
            current_step: input.status.step(),
            created_by: input.created_by,
            assigned_to: input.assigned_to,
            created_at: now,
            updated_at: now,
        };
        t.approvals.insert(approval.id, approval.clone());
        Ok(approval)
    }

    async fn update_approval_status(
        &self,
        approval_id: DbId,
        status: ApprovalStatus,
    ) -> StoreResult<Option<Approval>> {
        Self::check(&self.fail.approval_writes, "approval")?;
        let mut t = self.tables();
        Ok(t.approvals.get_mut(&approval_id).map(|a| {
            a.status = status;
            a.current_step = status.step();
            a.updated_at = Utc::now();
            a.clone()
        }))
    }

    async fn create_comment(&self, input: &CreateComment) -> StoreResult<Comment> {
        let mut t = self.tables();
        let now = Utc::now();
        let comment = Comment {
            id: t.next_id(),
            approval_id: input.approval_id,
            author_id: input.author_id,
            parent_id: input.parent_id,
            content: input.content.clone(),
            created_at: now,
            updated_at: now,
        };
        t.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find_comment(&self, comment_id: DbId) -> StoreResult<Option<Comment>> {
        Ok(self.tables().comments.get(&comment_id).cloned())
    }

    async fn list_comments(&self, approval_id: DbId) -> StoreResult<Vec<Comment>> {
        // BTreeMap iteration is id order, which is insertion order.
        Ok(self
            .tables()
            .comments
            .values()
            .filter(|c| c.approval_id == approval_id)
            .cloned()
            .collect())
    }

    async fn update_comment(
        &self,
        comment_id: DbId,
        content: &str,
    ) -> StoreResult<Option<Comment>> {
        let mut t = self.tables();
        Ok(t.comments.get_mut(&comment_id).map(|c| {
            c.content = content.to_string();
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete_comment(&self, comment_id: DbId) -> StoreResult<bool> {
        let mut t = self.tables();
        if t.comments.remove(&comment_id).is_none() {
            return Ok(false);
        }
        for reply in t.comments.values_mut() {
            if reply.parent_id == Some(comment_id) {
                reply.parent_id = None;
            }
        }
        Ok(true)
    }

    async fn append_history(&self, input: &CreateHistoryEntry) -> StoreResult<HistoryEntry> {
        let mut t = self.tables();
        let entry = HistoryEntry {
            id: t.next_id(),
            approval_id: input.approval_id,
            status: input.status,
            step: input.status.step(),
            comment: input.comment.clone(),
            author_id: input.author_id,
            created_at: Utc::now(),
        };
        t.history.push(entry.clone());
        Ok(entry)
    }

    async fn list_history(&self, approval_id: DbId) -> StoreResult<Vec<HistoryEntry>> {
        Ok(self
            .tables()
            .history
            .iter()
            .filter(|h| h.approval_id == approval_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(
        &self,
        user_id: DbId,
        input: &CreateNotification,
    ) -> StoreResult<Notification> {
        Self::check(&self.fail.notification_writes, "notification")?;
        let mut t = self.tables();
        let notification = Notification {
            id: t.next_id(),
            user_id,
            notification_type: input.notification_type,
            message: input.message.clone(),
            approval_id: input.approval_id,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        t.notifications.insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_notifications(
        &self,
        user_id: DbId,
        unread_only: bool,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<Notification>> {
        let t = self.tables();
        let mut rows: Vec<Notification> = t
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.is_read))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let offset = usize::try_from(offset.max(0)).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit.max(0)).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn unread_count(&self, user_id: DbId) -> StoreResult<i64> {
        let count = self
            .tables()
            .notifications
            .values()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn mark_read(
        &self,
        notification_id: DbId,
        user_id: DbId,
    ) -> StoreResult<Option<Notification>> {
        let mut t = self.tables();
        Ok(t
            .notifications
            .get_mut(&notification_id)
            .filter(|n| n.user_id == user_id)
            .map(|n| {
                if !n.is_read {
                    n.is_read = true;
                    n.read_at = Some(Utc::now());
                }
                n.clone()
            }))
    }

    async fn mark_all_read(&self, user_id: DbId) -> StoreResult<u64> {
        let mut t = self.tables();
        let now = Utc::now();
        let mut count = 0;
        for n in t.notifications.values_mut() {
            if n.user_id == user_id && !n.is_read {
                n.is_read = true;
                n.read_at = Some(now);
                count += 1;
            }
        }
        Ok(count)
    }
}

/* --------------------------------------------------------------------------
Tests
-------------------------------------------------------------------------- */
