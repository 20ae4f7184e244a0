//! Notification types and the messages attached to them.
//!
//! The type a status change produces is decided by
//! [`NotificationType::for_status`], which matches every status explicitly
//! so a new status cannot silently fall into the generic bucket.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::approval::ApprovalStatus;
use crate::error::CoreError;
use crate::types::DbId;

/// Kind of event a notification row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    ReviewAssigned,
    FeedbackProvided,
    ApprovalRejected,
    ContentPublished,
    StatusChanged,
    CommentAdded,
    CommentReply,
}

impl NotificationType {
    pub const ALL: [NotificationType; 7] = [
        NotificationType::ReviewAssigned,
        NotificationType::FeedbackProvided,
        NotificationType::ApprovalRejected,
        NotificationType::ContentPublished,
        NotificationType::StatusChanged,
        NotificationType::CommentAdded,
        NotificationType::CommentReply,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::ReviewAssigned => "REVIEW_ASSIGNED",
            NotificationType::FeedbackProvided => "FEEDBACK_PROVIDED",
            NotificationType::ApprovalRejected => "APPROVAL_REJECTED",
            NotificationType::ContentPublished => "CONTENT_PUBLISHED",
            NotificationType::StatusChanged => "STATUS_CHANGED",
            NotificationType::CommentAdded => "COMMENT_ADDED",
            NotificationType::CommentReply => "COMMENT_REPLY",
        }
    }

    /// The notification sent to an approval's creator when its status
    /// becomes `status`.
    pub fn for_status(status: ApprovalStatus) -> NotificationType {
        match status {
            ApprovalStatus::ChangesRequested => NotificationType::FeedbackProvided,
            ApprovalStatus::Rejected => NotificationType::ApprovalRejected,
            ApprovalStatus::Published => NotificationType::ContentPublished,
            ApprovalStatus::Draft
            | ApprovalStatus::PendingReview
            | ApprovalStatus::InReview
            | ApprovalStatus::Approved
            | ApprovalStatus::Archived => NotificationType::StatusChanged,
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid notification type '{s}'")))
    }
}

impl TryFrom<String> for NotificationType {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/* --------------------------------------------------------------------------
Messages
-------------------------------------------------------------------------- */

/// Message for the reviewer a piece of content was assigned to.
pub fn review_assigned_message(content_id: DbId) -> String {
    format!("You have been assigned to review content #{content_id}")
}

/// Message for the creator when the approval moves to `status`.
///
/// A reviewer comment, when present, is appended after the headline.
pub fn status_change_message(
    status: ApprovalStatus,
    content_id: DbId,
    comment: Option<&str>,
) -> String {
    let headline = match NotificationType::for_status(status) {
        NotificationType::FeedbackProvided => {
            format!("Changes were requested on content #{content_id}")
        }
        NotificationType::ApprovalRejected => format!("Content #{content_id} was rejected"),
        NotificationType::ContentPublished => format!("Content #{content_id} has been published"),
        _ => format!("Content #{content_id} moved to {status}"),
    };

    match comment {
        Some(comment) => format!("{headline}: {comment}"),
        None => headline,
    }
}

/// Message for the approval creator when someone comments on it.
pub fn comment_added_message(content_id: DbId) -> String {
    format!("New comment on content #{content_id}")
}

/// Message for a comment author when someone replies to them.
pub fn comment_reply_message(content_id: DbId) -> String {
    format!("Someone replied to your comment on content #{content_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_table_maps_the_three_special_statuses() {
        assert_eq!(
            NotificationType::for_status(ApprovalStatus::ChangesRequested),
            NotificationType::FeedbackProvided
        );
        assert_eq!(
            NotificationType::for_status(ApprovalStatus::Rejected),
            NotificationType::ApprovalRejected
        );
        assert_eq!(
            NotificationType::for_status(ApprovalStatus::Published),
            NotificationType::ContentPublished
        );
    }

    #[test]
    fn remaining_statuses_are_generic_status_changes() {
        for status in [
            ApprovalStatus::Draft,
            ApprovalStatus::PendingReview,
            ApprovalStatus::InReview,
            ApprovalStatus::Approved,
            ApprovalStatus::Archived,
        ] {
            assert_eq!(
                NotificationType::for_status(status),
                NotificationType::StatusChanged,
                "{status}"
            );
        }
    }

    #[test]
    fn generic_message_carries_the_new_status() {
        let msg = status_change_message(ApprovalStatus::Approved, 3, None);
        assert_eq!(msg, "Content #3 moved to APPROVED");
    }

    #[test]
    fn feedback_message_appends_comment() {
        let msg = status_change_message(
            ApprovalStatus::ChangesRequested,
            3,
            Some("needs more detail"),
        );
        assert_eq!(msg, "Changes were requested on content #3: needs more detail");
    }

    #[test]
    fn type_text_round_trips() {
        for t in NotificationType::ALL {
            assert_eq!(t.as_str().parse::<NotificationType>().unwrap(), t);
        }
        assert!("EMAIL_SENT".parse::<NotificationType>().is_err());
    }
}
