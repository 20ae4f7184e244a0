//! The approval state machine and its comment/audit operations.
//!
//! All validation and authorization happens before the first write. Writes
//! are individually atomic; there is no transaction across entities, so a
//! store failure part-way leaves the earlier writes in place and returns
//! the error.

use std::sync::Arc;

use cadence_core::approval::{validate_step, ApprovalStatus, WorkflowStep};
use cadence_core::error::CoreError;
use cadence_core::identity::UserRef;
use cadence_core::notification::{
    comment_added_message, comment_reply_message, review_assigned_message, status_change_message,
    NotificationType,
};
use cadence_core::review::{normalize_comment, normalize_optional_comment};
use cadence_core::types::DbId;
use cadence_db::models::approval::{Approval, UpsertApproval};
use cadence_db::models::comment::{Comment, CreateComment};
use cadence_db::models::history::{CreateHistoryEntry, HistoryEntry};
use cadence_db::{ReviewStore, UserDirectory};
use cadence_events::{NotificationIntent, Notifier};
use serde::Serialize;

use crate::thread::{build_thread, CommentNode};

/// Input for submitting (or re-submitting) content for review.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    pub status: ApprovalStatus,
    /// Must match the step derived from `status` when given.
    pub step: Option<WorkflowStep>,
    pub comment: Option<String>,
    pub assignee: Option<UserRef>,
}

/// An approval with its comment tree and full history.
#[derive(Debug, Clone, Serialize)]
pub struct ApprovalView {
    pub approval: Approval,
    pub comments: Vec<CommentNode>,
    pub history: Vec<HistoryEntry>,
}

/// Entry point for every approval, comment and history operation.
#[derive(Clone)]
pub struct ReviewService {
    store: Arc<dyn ReviewStore>,
    users: Arc<dyn UserDirectory>,
    notifier: Notifier,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        users: Arc<dyn UserDirectory>,
        notifier: Notifier,
    ) -> Self {
        Self {
            store,
            users,
            notifier,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create or re-submit the approval for a content item.
    ///
    /// Only the content's author may do this. Appends one history entry,
    /// a comment when one is given, and notifies the assignee.
    pub async fn request_review(
        &self,
        content_id: DbId,
        acting_user: DbId,
        request: ReviewRequest,
    ) -> Result<Approval, CoreError> {
        let content = self
            .store
            .find_content(content_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "ContentItem",
                id: content_id,
            })?;

        if content.author_id != acting_user {
            return Err(CoreError::Forbidden(
                "Only the content's author can request a review".into(),
            ));
        }

        validate_step(request.status, request.step)?;

        if let Some(existing) = self.store.find_approval_by_content(content_id).await? {
            existing.status.validate_transition(request.status)?;
        }

        let comment = normalize_optional_comment(request.comment.as_deref())?;

        let assignee = match &request.assignee {
            Some(user) => Some(
                self.users
                    .resolve_user(user)
                    .await?
                    .ok_or_else(|| user.not_found())?,
            ),
            None => None,
        };

        let approval = self
            .store
            .upsert_approval(&UpsertApproval {
                content_id,
                status: request.status,
                created_by: acting_user,
                assigned_to: assignee,
            })
            .await?;

        self.write_history(approval.id, approval.status, comment.clone(), acting_user)
            .await?;

        if let Some(text) = comment {
            self.store
                .create_comment(&CreateComment {
                    approval_id: approval.id,
                    author_id: acting_user,
                    parent_id: None,
                    content: text,
                })
                .await?;
        }

        self.mirror_content_status(content_id, approval.status).await;

        tracing::info!(
            approval_id = approval.id,
            content_id,
            user_id = acting_user,
            status = %approval.status,
            assigned_to = ?approval.assigned_to,
            "Review requested"
        );

        if let Some(assignee) = assignee {
            self.notifier
                .notify(
                    NotificationIntent::new(
                        assignee,
                        NotificationType::ReviewAssigned,
                        review_assigned_message(content_id),
                    )
                    .with_approval(approval.id)
                    .with_actor(acting_user),
                )
                .await?;
        }

        Ok(approval)
    }

    /// Move an approval to `new_status` and notify its creator.
    ///
    /// Any authenticated user may change the status.
    pub async fn change_status(
        &self,
        approval_id: DbId,
        acting_user: DbId,
        new_status: ApprovalStatus,
        comment: Option<&str>,
    ) -> Result<Approval, CoreError> {
        let current = self.require_approval(approval_id).await?;
        current.status.validate_transition(new_status)?;
        let comment = normalize_optional_comment(comment)?;

        let approval = self
            .store
            .update_approval_status(approval_id, new_status)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Approval",
                id: approval_id,
            })?;

        self.write_history(approval_id, new_status, comment.clone(), acting_user)
            .await?;
        self.mirror_content_status(approval.content_id, new_status)
            .await;

        tracing::info!(
            approval_id,
            user_id = acting_user,
            from = %current.status,
            to = %new_status,
            "Approval status changed"
        );

        self.notifier
            .notify(
                NotificationIntent::new(
                    approval.created_by,
                    NotificationType::for_status(new_status),
                    status_change_message(new_status, approval.content_id, comment.as_deref()),
                )
                .with_approval(approval_id)
                .with_actor(acting_user),
            )
            .await?;

        Ok(approval)
    }

    /// The approval of a content item with its thread and history.
    pub async fn get_approval(&self, content_id: DbId) -> Result<ApprovalView, CoreError> {
        let approval = self
            .store
            .find_approval_by_content(content_id)
            .await?
            .ok_or(CoreError::NotFoundByKey {
                entity: "Approval",
                key: format!("content_id={content_id}"),
            })?;
        self.view(approval).await
    }

    pub async fn get_approval_by_id(&self, approval_id: DbId) -> Result<ApprovalView, CoreError> {
        let approval = self.require_approval(approval_id).await?;
        self.view(approval).await
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Add a comment, or a reply when `parent_id` is given.
    ///
    /// Notifies the approval's creator and, for replies, the parent's
    /// author. Nobody is notified about their own comment, and nobody is
    /// notified twice.
    pub async fn add_comment(
        &self,
        approval_id: DbId,
        acting_user: DbId,
        content: &str,
        parent_id: Option<DbId>,
    ) -> Result<Comment, CoreError> {
        let approval = self.require_approval(approval_id).await?;
        let content = normalize_comment(content)?;

        let parent = match parent_id {
            Some(id) => Some(
                self.store
                    .find_comment(id)
                    .await?
                    .filter(|c| c.approval_id == approval_id)
                    .ok_or(CoreError::NotFound {
                        entity: "Comment",
                        id,
                    })?,
            ),
            None => None,
        };

        let comment = self
            .store
            .create_comment(&CreateComment {
                approval_id,
                author_id: acting_user,
                parent_id,
                content,
            })
            .await?;

        tracing::info!(
            comment_id = comment.id,
            approval_id,
            user_id = acting_user,
            parent_id = ?parent_id,
            "Comment added"
        );

        let replied_to = parent
            .map(|p| p.author_id)
            .filter(|&author| author != acting_user);

        if let Some(author) = replied_to {
            self.notifier
                .notify(
                    NotificationIntent::new(
                        author,
                        NotificationType::CommentReply,
                        comment_reply_message(approval.content_id),
                    )
                    .with_approval(approval_id)
                    .with_actor(acting_user),
                )
                .await?;
        }

        if approval.created_by != acting_user && replied_to != Some(approval.created_by) {
            self.notifier
                .notify(
                    NotificationIntent::new(
                        approval.created_by,
                        NotificationType::CommentAdded,
                        comment_added_message(approval.content_id),
                    )
                    .with_approval(approval_id)
                    .with_actor(acting_user),
                )
                .await?;
        }

        Ok(comment)
    }

    /// Flat comment list, oldest first.
    pub async fn list_comments(&self, approval_id: DbId) -> Result<Vec<Comment>, CoreError> {
        self.require_approval(approval_id).await?;
        Ok(self.store.list_comments(approval_id).await?)
    }

    pub async fn edit_comment(
        &self,
        comment_id: DbId,
        acting_user: DbId,
        content: &str,
    ) -> Result<Comment, CoreError> {
        self.require_own_comment(comment_id, acting_user).await?;
        let content = normalize_comment(content)?;

        let comment = self
            .store
            .update_comment(comment_id, &content)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Comment",
                id: comment_id,
            })?;

        tracing::info!(comment_id, user_id = acting_user, "Comment edited");
        Ok(comment)
    }

    /// Delete a comment. Its replies stay, promoted to top level.
    pub async fn delete_comment(&self, comment_id: DbId, acting_user: DbId) -> Result<(), CoreError> {
        self.require_own_comment(comment_id, acting_user).await?;

        if !self.store.delete_comment(comment_id).await? {
            return Err(CoreError::NotFound {
                entity: "Comment",
                id: comment_id,
            });
        }

        tracing::info!(comment_id, user_id = acting_user, "Comment deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    /// Append an audit entry recording `status` for an existing approval.
    pub async fn append_history(
        &self,
        approval_id: DbId,
        author_id: DbId,
        status: ApprovalStatus,
        comment: Option<&str>,
    ) -> Result<HistoryEntry, CoreError> {
        self.require_approval(approval_id).await?;
        let comment = normalize_optional_comment(comment)?;
        self.write_history(approval_id, status, comment, author_id)
            .await
    }

    /// Audit trail of an approval, oldest first.
    pub async fn list_history(&self, approval_id: DbId) -> Result<Vec<HistoryEntry>, CoreError> {
        self.require_approval(approval_id).await?;
        Ok(self.store.list_history(approval_id).await?)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn require_approval(&self, approval_id: DbId) -> Result<Approval, CoreError> {
        self.store
            .find_approval(approval_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Approval",
                id: approval_id,
            })
    }

    async fn require_own_comment(
        &self,
        comment_id: DbId,
        acting_user: DbId,
    ) -> Result<Comment, CoreError> {
        let comment = self
            .store
            .find_comment(comment_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Comment",
                id: comment_id,
            })?;

        if comment.author_id != acting_user {
            return Err(CoreError::Forbidden(
                "Only the comment's author can modify it".into(),
            ));
        }
        Ok(comment)
    }

    async fn write_history(
        &self,
        approval_id: DbId,
        status: ApprovalStatus,
        comment: Option<String>,
        author_id: DbId,
    ) -> Result<HistoryEntry, CoreError> {
        Ok(self
            .store
            .append_history(&CreateHistoryEntry {
                approval_id,
                status,
                comment,
                author_id,
            })
            .await?)
    }

    async fn view(&self, approval: Approval) -> Result<ApprovalView, CoreError> {
        let comments = self.store.list_comments(approval.id).await?;
        let history = self.store.list_history(approval.id).await?;
        Ok(ApprovalView {
            approval,
            comments: build_thread(comments),
            history,
        })
    }

    /// Copy the approval status onto the content item. Failures are logged
    /// and otherwise ignored.
    async fn mirror_content_status(&self, content_id: DbId, status: ApprovalStatus) {
        match self
            .store
            .update_content_status(content_id, status.as_str())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(content_id, status = %status, "Content item gone; status not mirrored");
            }
            Err(e) => {
                tracing::warn!(content_id, status = %status, error = %e, "Failed to mirror content status");
            }
        }
    }
}
