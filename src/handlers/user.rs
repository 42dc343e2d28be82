use axum::{extract::State, Extension, Json};

use crate::error::{ApiResponse, Result};
use crate::models::{CurrentUser, UpdateProfileRequest, UserResponse};
use crate::services::UserService;
use crate::AppState;

/// Get the current user's profile
/// GET /api/v1/user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let profile = UserService::get_profile(&state.db, &current_user.id).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// Update the current user's profile
/// PUT /api/v1/user/profile
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>> {
    let profile = UserService::update_profile(&state.db, &current_user.id, req).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// Delete the current user's account
/// DELETE /api/v1/user
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<()>>> {
    UserService::delete_user(&state.db, &current_user.id).await?;
    Ok(Json(ApiResponse::<()>::success_message("Account deleted")))
}
