//! Authentication endpoints and the access gate for protected routes.

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{ApiError, ApiJson, ApiResponse, AppState, MessageResponse};
use crate::services::{AuthError, SessionToken, UserInfo};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DuplicateEmail => Self::Conflict(err.to_string()),
            AuthError::InvalidCredentials => Self::Unauthorized(err.to_string()),
            AuthError::Unauthenticated => Self::invalid_token(),
            AuthError::UserNotFound => Self::NotFound(err.to_string()),
            AuthError::Validation(msg) => Self::validation(msg),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// The authenticated caller, placed in request extensions by
/// [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    /// Raw bearer token, kept so logout can revoke exactly this session.
    pub token: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(ApiError::invalid_token)
    }
}

/// Rejects the request with 401 unless it carries
/// `Authorization: Bearer <token>` that verifies and is not revoked.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer(request.headers()).map(str::to_string) else {
        metrics::counter!("auth_rejections_total", "reason" => "missing_header").increment(1);
        return Err(ApiError::Unauthorized(
            "Missing or malformed Authorization header".to_string(),
        ));
    };

    let user_id = state.auth_service().verify(&token).await?;

    tracing::Span::current().record("user_id", tracing::field::display(user_id));
    request.extensions_mut().insert(CurrentUser { id: user_id, token });

    Ok(next.run(request).await)
}

/// Token part of an `Authorization: Bearer <token>` header, if well formed.
fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();

    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }

    Some(token)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account and return a session token for it
pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SessionToken>>), ApiError> {
    let token = state
        .auth_service()
        .register(&payload.username, &payload.email, &payload.password)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(token))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<ApiResponse<SessionToken>>, ApiError> {
    let token = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(token)))
}

/// POST /auth/logout
/// Revoke the token used for this request; other sessions stay valid
pub async fn logout(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.auth_service().logout(&user.token).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out successfully".to_string(),
    })))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<ApiResponse<UserInfo>>, ApiError> {
    let info = state.auth_service().current_user(user.id).await?;
    Ok(Json(ApiResponse::success(info)))
}
