//! Repository for the `approvals` table.

use cadence_core::approval::ApprovalStatus;
use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::approval::{Approval, UpsertApproval};

/// Column list for approvals queries.
const COLUMNS: &str = "id, content_id, status, current_step, created_by, assigned_to, \
    created_at, updated_at";

/// Provides CRUD operations for approvals.
pub struct ApprovalRepo;

impl ApprovalRepo {
    /// Find an approval by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Approval>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM approvals WHERE id = $1");
        sqlx::query_as::<_, Approval>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the approval attached to a content item.
    pub async fn find_by_content(
        pool: &PgPool,
        content_id: DbId,
    ) -> Result<Option<Approval>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM approvals WHERE content_id = $1");
        sqlx::query_as::<_, Approval>(&query)
            .bind(content_id)
            .fetch_optional(pool)
            .await
    }

    /// Create the approval for a content item, or overwrite status, step and
    /// assignee if one already exists.
    pub async fn upsert(pool: &PgPool, input: &UpsertApproval) -> Result<Approval, sqlx::Error> {
        let query = format!(
            "INSERT INTO approvals (content_id, status, current_step, created_by, assigned_to)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT ON CONSTRAINT uq_approvals_content_id DO UPDATE SET
                status = EXCLUDED.status,
                current_step = EXCLUDED.current_step,
                assigned_to = EXCLUDED.assigned_to,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Approval>(&query)
            .bind(input.content_id)
            .bind(input.status.as_str())
            .bind(input.status.step().as_str())
            .bind(input.created_by)
            .bind(input.assigned_to)
            .fetch_one(pool)
            .await
    }

    /// Set a new status (and its derived step).
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: ApprovalStatus,
    ) -> Result<Option<Approval>, sqlx::Error> {
        let query = format!(
            "UPDATE approvals SET status = $2, current_step = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Approval>(&query)
            .bind(id)
            .bind(status.as_str())
            .bind(status.step().as_str())
            .fetch_optional(pool)
            .await
    }
}
