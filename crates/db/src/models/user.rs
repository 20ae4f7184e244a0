//! User model, reduced to what identity resolution needs.

use cadence_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    /// Subject id assigned by the identity provider, if the user has one.
    pub external_id: Option<String>,
    pub display_name: String,
    pub created_at: Timestamp,
}
