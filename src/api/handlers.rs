use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::errors::ConsoleAuthError;
use crate::models::context::RequestContext;
use crate::models::token::{ConsoleGrant, ConsoleToken};

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Deserialize)]
pub struct AuthorizeConsoleRequest {
    /// Caller-chosen token; a UUID is generated when absent.
    pub token: Option<String>,
    #[serde(flatten)]
    pub grant: ConsoleGrant,
}

#[derive(Serialize)]
pub struct AuthorizeConsoleResponse {
    pub token: String,
}

// ── Handlers ─────────────────────────────────────────────────

/// POST /v1/console-tokens — authorize a console token
pub async fn authorize_console(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<AuthorizeConsoleRequest>,
) -> Result<(StatusCode, Json<AuthorizeConsoleResponse>), ConsoleAuthError> {
    let ctx = RequestContext::from_headers(&headers);
    let token = match payload.token {
        Some(token) if token.is_empty() => {
            return Err(ConsoleAuthError::InvalidInput("token must not be empty".into()))
        }
        Some(token) => {
            state.manager.authorize_console(&ctx, &token, payload.grant).await?;
            token
        }
        None => state.manager.issue_console(&ctx, payload.grant).await?,
    };

    Ok((StatusCode::CREATED, Json(AuthorizeConsoleResponse { token })))
}

/// GET /v1/console-tokens/:token — connect info for a valid token
pub async fn check_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(token): Path<String>,
) -> Result<Json<ConsoleToken>, ConsoleAuthError> {
    let ctx = RequestContext::from_headers(&headers);
    state
        .manager
        .connect_info(&ctx, &token)
        .await
        .map(Json)
        .ok_or(ConsoleAuthError::TokenNotFound)
}

/// GET /v1/instances/:instance_uuid/console-tokens — indexed token ids, in issue order
pub async fn list_instance_tokens(
    State(state): State<Arc<AppState>>,
    Path(instance_uuid): Path<String>,
) -> Result<Json<Vec<String>>, ConsoleAuthError> {
    let tokens = state.manager.tokens_for_instance(&instance_uuid).await?;
    Ok(Json(tokens))
}

/// DELETE /v1/instances/:instance_uuid/console-tokens — revoke all tokens
pub async fn delete_instance_tokens(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(instance_uuid): Path<String>,
) -> Result<StatusCode, ConsoleAuthError> {
    let ctx = RequestContext::from_headers(&headers);
    state
        .manager
        .delete_tokens_for_instance(&ctx, &instance_uuid)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
