use axum::routing::put;
use axum::Router;

use crate::handlers::comment;
use crate::state::AppState;

/// Routes mounted at `/comments`.
///
/// ```text
/// PUT    /{comment_id}                 -> edit_comment
/// DELETE /{comment_id}                 -> delete_comment
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{comment_id}",
        put(comment::edit_comment).delete(comment::delete_comment),
    )
}
