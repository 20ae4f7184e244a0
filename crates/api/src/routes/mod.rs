pub mod approval;
pub mod comment;
pub mod health;
pub mod notification;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /content/{content_id}/approval                   get, request review (PUT)
///
/// /approvals/{approval_id}                         get
/// /approvals/{approval_id}/status                  change status (POST)
/// /approvals/{approval_id}/comments                list, add (POST)
///
/// /comments/{comment_id}                           edit (PUT), delete
///
/// /notifications                                   list (?unread_only&limit&offset)
/// /notifications/unread-count                      unread count
/// /notifications/read-all                          mark all read (POST)
/// /notifications/{id}/read                         mark read (POST)
/// /notifications/live                              WebSocket live channel
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/content", approval::content_router())
        .nest("/approvals", approval::router())
        .nest("/comments", comment::router())
        .nest("/notifications", notification::router())
}
