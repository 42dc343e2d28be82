use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::CurrentUser;
use crate::services::AuthService;
use crate::AppState;

/// Authentication middleware
/// Extracts and validates JWT from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        AppError::Unauthorized("Missing or invalid Authorization header".to_string())
    })?;

    // Validate token
    let claims = AuthService::validate_token(&token, &state.config)?;

    // The account may have been deleted since the token was issued
    let (email,): (String,) = sqlx::query_as("SELECT email FROM users WHERE id = ?")
        .bind(&claims.sub)
        .fetch_optional(state.db.pool())
        .await
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

    let current_user = CurrentUser {
        id: claims.sub,
        email,
    };

    request.extensions_mut().insert(current_user);

    Ok(next.run(request).await)
}

/// Best-effort identity for routes that serve anonymous callers too.
/// Any missing or invalid credential yields None, never an error.
pub async fn optional_current_user(state: &AppState, headers: &HeaderMap) -> Option<CurrentUser> {
    let token = bearer_token(headers)?;
    let claims = AuthService::validate_token(&token, &state.config).ok()?;

    let row: Option<(String,)> = sqlx::query_as("SELECT email FROM users WHERE id = ?")
        .bind(&claims.sub)
        .fetch_optional(state.db.pool())
        .await
        .ok()?;

    row.map(|(email,)| CurrentUser {
        id: claims.sub,
        email,
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get("Authorization")?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}
