//! Repository for the `content_items` table.

use cadence_core::types::DbId;
use sqlx::PgPool;

use crate::models::content::ContentItem;

/// Column list for content_items queries.
const COLUMNS: &str = "id, author_id, title, status, created_at, updated_at";

/// Provides the content-item reads and the status mirror write.
pub struct ContentRepo;

impl ContentRepo {
    /// Find a content item by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ContentItem>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM content_items WHERE id = $1");
        sqlx::query_as::<_, ContentItem>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Overwrite the mirrored status column.
    ///
    /// Returns `true` if the content item exists.
    pub async fn update_status(pool: &PgPool, id: DbId, status: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE content_items SET status = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
