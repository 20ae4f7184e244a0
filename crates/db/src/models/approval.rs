//! Approval entity model and DTOs.

use cadence_core::approval::{ApprovalStatus, WorkflowStep};
use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `approvals` table.
///
/// `current_step` is written from `status` on every write; it is never set
/// on its own.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Approval {
    pub id: DbId,
    pub content_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: ApprovalStatus,
    #[sqlx(try_from = "String")]
    pub current_step: WorkflowStep,
    pub created_by: DbId,
    pub assigned_to: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Input for creating or re-submitting the approval of a content item.
///
/// On re-submission `status` and `assigned_to` overwrite the stored values;
/// `created_by` is only used when the row is first created.
#[derive(Debug, Clone)]
pub struct UpsertApproval {
    pub content_id: DbId,
    pub status: ApprovalStatus,
    pub created_by: DbId,
    pub assigned_to: Option<DbId>,
}
