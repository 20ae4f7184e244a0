//! Handlers for approval comment threads.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use cadence_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for adding a comment; `parent_id` makes it a reply.
#[derive(Debug, Deserialize)]
pub struct AddCommentBody {
    pub content: String,
    pub parent_id: Option<DbId>,
}

#[derive(Debug, Deserialize)]
pub struct EditCommentBody {
    pub content: String,
}

/// GET /api/v1/approvals/{approval_id}/comments
///
/// Flat list, oldest first. The nested tree is part of the approval view.
pub async fn list_comments(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(approval_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let comments = state.review.list_comments(approval_id).await?;
    Ok(Json(DataResponse { data: comments }))
}

/// POST /api/v1/approvals/{approval_id}/comments
pub async fn add_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(approval_id): Path<DbId>,
    body: Result<Json<AddCommentBody>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = body?;
    let comment = state
        .review
        .add_comment(approval_id, auth.user_id, &body.content, body.parent_id)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: comment })))
}

/// PUT /api/v1/comments/{comment_id}
pub async fn edit_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
    body: Result<Json<EditCommentBody>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = body?;
    let comment = state
        .review
        .edit_comment(comment_id, auth.user_id, &body.content)
        .await?;

    Ok(Json(DataResponse { data: comment }))
}

/// DELETE /api/v1/comments/{comment_id}
///
/// Replies to the deleted comment are kept and become top-level.
pub async fn delete_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.review.delete_comment(comment_id, auth.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
