//! Content item model (owned by the content subsystem; read-mostly here).

use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `content_items` table.
///
/// `status` mirrors the approval status on a best-effort basis.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContentItem {
    pub id: DbId,
    pub author_id: DbId,
    pub title: String,
    pub status: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
