//! Repository for the append-only `approval_history` table.
//!
//! There is deliberately no update or delete here.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::history::{CreateHistoryEntry, HistoryEntry};

/// Column list for approval_history queries.
const COLUMNS: &str = "id, approval_id, status, step, comment, author_id, created_at";

/// Provides append and read operations for approval history.
pub struct HistoryRepo;

impl HistoryRepo {
    /// Append a history entry, returning the created row.
    pub async fn append(
        pool: &PgPool,
        input: &CreateHistoryEntry,
    ) -> Result<HistoryEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO approval_history (approval_id, status, step, comment, author_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(input.approval_id)
            .bind(input.status.as_str())
            .bind(input.status.step().as_str())
            .bind(&input.comment)
            .bind(input.author_id)
            .fetch_one(pool)
            .await
    }

    /// List the history of an approval, oldest first.
    pub async fn list_for_approval(
        pool: &PgPool,
        approval_id: DbId,
    ) -> Result<Vec<HistoryEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM approval_history
             WHERE approval_id = $1
             ORDER BY created_at ASC, id ASC"
        );
        sqlx::query_as::<_, HistoryEntry>(&query)
            .bind(approval_id)
            .fetch_all(pool)
            .await
    }
}
