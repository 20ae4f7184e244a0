//! JWT-based authentication extractors for Axum handlers.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use cadence_core::error::CoreError;
use cadence_core::types::DbId;
use cadence_db::UserDirectory;
use serde::Deserialize;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
///
/// The token subject is resolved as an identity-provider subject id first,
/// and only then as an internal id, so a numeric provider subject never
/// authenticates as the user who happens to own that internal id.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id.
    pub user_id: DbId,
    /// The raw `sub` claim the token carried.
    pub subject: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;
        authenticate(state, token).await
    }
}

/// [`AuthUser`] for the live channel.
///
/// Browsers cannot set headers on a WebSocket handshake, so the token may
/// also arrive as the `token` query parameter. The header wins when both
/// are present.
#[derive(Debug, Clone)]
pub struct LiveAuthUser(pub AuthUser);

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<AppState> for LiveAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(parts)? {
            return Ok(LiveAuthUser(authenticate(state, token).await?));
        }

        let query = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let token = query.0.token.ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing token: send an Authorization header or a token query parameter".into(),
            ))
        })?;

        Ok(LiveAuthUser(authenticate(state, &token).await?))
    }
}

/// The token from a `Bearer` Authorization header, if the header is present.
fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(header) = parts.headers.get("authorization") else {
        return Ok(None);
    };

    let token = header
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;
    Ok(Some(token))
}

/// Verify `token` and resolve its subject to a known user.
pub async fn authenticate(state: &AppState, token: &str) -> Result<AuthUser, AppError> {
    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| AppError::Core(CoreError::Unauthorized("Invalid or expired token".into())))?;

    let user_id = resolve_subject(state.users.as_ref(), &claims.sub)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;

    Ok(AuthUser {
        user_id,
        subject: claims.sub,
    })
}

/// Provider subject first, internal id second.
async fn resolve_subject(
    users: &dyn UserDirectory,
    subject: &str,
) -> Result<Option<DbId>, AppError> {
    if let Some(user) = users.find_user_by_external_id(subject).await? {
        return Ok(Some(user.id));
    }
    match subject.parse::<DbId>() {
        Ok(id) => Ok(users.find_user_by_id(id).await?.map(|u| u.id)),
        Err(_) => Ok(None),
    }
}
