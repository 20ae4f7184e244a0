//! Route definitions for approvals.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{approval, comment};
use crate::state::AppState;

/// Routes mounted at `/content`.
///
/// ```text
/// GET    /{content_id}/approval        -> get_approval
/// PUT    /{content_id}/approval        -> request_review
/// ```
pub fn content_router() -> Router<AppState> {
    Router::new().route(
        "/{content_id}/approval",
        get(approval::get_approval).put(approval::request_review),
    )
}

/// Routes mounted at `/approvals`.
///
/// ```text
/// GET    /{approval_id}                -> get_approval_by_id
/// POST   /{approval_id}/status         -> change_status
/// GET    /{approval_id}/comments       -> list_comments
/// POST   /{approval_id}/comments       -> add_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{approval_id}", get(approval::get_approval_by_id))
        .route("/{approval_id}/status", post(approval::change_status))
        .route(
            "/{approval_id}/comments",
            get(comment::list_comments).post(comment::add_comment),
        )
}
