use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Extension, Json,
};

use crate::error::{ApiResponse, AppError, Result};
use crate::middleware::auth::optional_current_user;
use crate::models::{
    AddFavoriteRequest, CurrentUser, FavoriteStatus, MoviePage, PaginationQuery,
    SharedListResponse, ShareTokenResponse,
};
use crate::services::FavoriteService;
use crate::AppState;

const LIST_DEFAULT_LIMIT: u32 = 20;
const SHARED_DEFAULT_LIMIT: u32 = 10;

fn ensure_positive_movie_id(movie_id: i64) -> Result<()> {
    if movie_id <= 0 {
        return Err(AppError::BadRequest(
            "tmdbMovieId must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

/// List the current user's favorites
/// GET /api/v1/favorites
pub async fn list_favorites(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<MoviePage>>> {
    let (page, limit) = pagination.resolve(LIST_DEFAULT_LIMIT);
    let result = FavoriteService::list_favorites(
        &state.db,
        state.catalog.as_ref(),
        &current_user.id,
        page,
        limit,
    )
    .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Add a movie to the favorites
/// POST /api/v1/favorites
pub async fn add_favorite(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Json(req): Json<AddFavoriteRequest>,
) -> Result<Json<ApiResponse<()>>> {
    ensure_positive_movie_id(req.tmdb_movie_id)?;
    FavoriteService::add_favorite(&state.db, &current_user.id, req.tmdb_movie_id).await?;
    Ok(Json(ApiResponse::<()>::success_message(
        "Movie added to favorites",
    )))
}

/// Remove a movie from the favorites
/// DELETE /api/v1/favorites/:movie_id
pub async fn remove_favorite(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
    Path(movie_id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    ensure_positive_movie_id(movie_id)?;
    FavoriteService::remove_favorite(&state.db, &current_user.id, movie_id).await?;
    Ok(Json(ApiResponse::<()>::success_message(
        "Movie removed from favorites",
    )))
}

/// Check whether a movie is in the caller's favorites. Anonymous callers
/// get `false`, not an authentication error.
/// GET /api/v1/favorites/check/:movie_id
pub async fn check_favorite(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(movie_id): Path<i64>,
) -> Result<Json<ApiResponse<FavoriteStatus>>> {
    ensure_positive_movie_id(movie_id)?;

    let is_favorite = match optional_current_user(&state, &headers).await {
        Some(user) => FavoriteService::check_favorite(&state.db, &user.id, movie_id).await?,
        None => false,
    };

    Ok(Json(ApiResponse::success(FavoriteStatus { is_favorite })))
}

/// View a publicly shared list by its token (no auth)
/// GET /api/v1/favorites/share/:token
pub async fn get_shared_list(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(pagination): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<SharedListResponse>>> {
    let (page, limit) = pagination.resolve(SHARED_DEFAULT_LIMIT);
    let result =
        FavoriteService::shared_list(&state.db, state.catalog.as_ref(), &token, page, limit)
            .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Rotate the share token, invalidating previously distributed links
/// POST /api/v1/favorites/share-token
pub async fn rotate_share_token(
    State(state): State<AppState>,
    Extension(current_user): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ShareTokenResponse>>> {
    let share_token = FavoriteService::rotate_share_token(&state.db, &current_user.id).await?;
    Ok(Json(ApiResponse::success(ShareTokenResponse { share_token })))
}
