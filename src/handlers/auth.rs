use axum::{extract::State, Json};

use crate::error::{ApiResponse, Result};
use crate::models::{AuthResponse, LoginRequest, RegisterRequest};
use crate::services::AuthService;
use crate::AppState;

/// Register a new user
/// POST /api/v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    let auth = AuthService::register(&state.db, &state.config, req).await?;
    Ok(Json(ApiResponse::success(auth)))
}

/// Log in
/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    let auth = AuthService::login(&state.db, &state.config, req).await?;
    Ok(Json(ApiResponse::success(auth)))
}
