//! Handlers for approvals: submission, status changes and the full view.
//!
//! All endpoints require authentication via [`AuthUser`].

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use cadence_core::approval::{ApprovalStatus, WorkflowStep};
use cadence_core::identity::UserRef;
use cadence_core::types::DbId;
use cadence_review::ReviewRequest;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body for `PUT /content/{content_id}/approval`.
#[derive(Debug, Deserialize)]
pub struct RequestReviewBody {
    pub status: String,
    pub step: Option<String>,
    pub comment: Option<String>,
    /// Internal id (number) or identity-provider id (string).
    pub assignee: Option<UserRef>,
}

/// Body for `POST /approvals/{approval_id}/status`.
#[derive(Debug, Deserialize)]
pub struct ChangeStatusBody {
    pub status: String,
    pub comment: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/content/{content_id}/approval
pub async fn get_approval(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = state.review.get_approval(content_id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/content/{content_id}/approval
///
/// Submit or re-submit a content item for review. Only its author may.
pub async fn request_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(content_id): Path<DbId>,
    body: Result<Json<RequestReviewBody>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = body?;
    let status: ApprovalStatus = body.status.parse()?;
    let step = body
        .step
        .as_deref()
        .map(str::parse::<WorkflowStep>)
        .transpose()?;

    let approval = state
        .review
        .request_review(
            content_id,
            auth.user_id,
            ReviewRequest {
                status,
                step,
                comment: body.comment,
                assignee: body.assignee,
            },
        )
        .await?;

    Ok(Json(DataResponse { data: approval }))
}

/// GET /api/v1/approvals/{approval_id}
pub async fn get_approval_by_id(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(approval_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let view = state.review.get_approval_by_id(approval_id).await?;
    Ok(Json(DataResponse { data: view }))
}

/// POST /api/v1/approvals/{approval_id}/status
pub async fn change_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(approval_id): Path<DbId>,
    body: Result<Json<ChangeStatusBody>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(body) = body?;
    let status: ApprovalStatus = body.status.parse()?;

    let approval = state
        .review
        .change_status(approval_id, auth.user_id, status, body.comment.as_deref())
        .await?;

    Ok(Json(DataResponse { data: approval }))
}
