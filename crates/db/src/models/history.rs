//! Approval history (audit trail) model and DTOs.

use cadence_core::approval::{ApprovalStatus, WorkflowStep};
use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the append-only `approval_history` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct HistoryEntry {
    pub id: DbId,
    pub approval_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: ApprovalStatus,
    #[sqlx(try_from = "String")]
    pub step: WorkflowStep,
    pub comment: Option<String>,
    pub author_id: DbId,
    pub created_at: Timestamp,
}

/// DTO for appending a history entry. The step is derived from `status`.
#[derive(Debug, Clone)]
pub struct CreateHistoryEntry {
    pub approval_id: DbId,
    pub status: ApprovalStatus,
    pub comment: Option<String>,
    pub author_id: DbId,
}
