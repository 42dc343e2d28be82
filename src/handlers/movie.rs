use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{ApiResponse, AppError, Result};
use crate::models::{MovieDetails, MoviePage};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    pub page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Search the catalog by title
/// GET /api/v1/movies/search
pub async fn search_movies(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<Json<ApiResponse<MoviePage>>> {
    if q.query.trim().is_empty() {
        return Err(AppError::BadRequest("query is required".to_string()));
    }
    let page = q.page.unwrap_or(1).max(1);
    let result = state.catalog.search(&q.query, page).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// List popular movies
/// GET /api/v1/movies/popular
pub async fn popular_movies(
    State(state): State<AppState>,
    Query(q): Query<PageQuery>,
) -> Result<Json<ApiResponse<MoviePage>>> {
    let page = q.page.unwrap_or(1).max(1);
    let result = state.catalog.popular(page).await?;
    Ok(Json(ApiResponse::success(result)))
}

/// Get extended details for one movie
/// GET /api/v1/movies/:id
pub async fn movie_details(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<MovieDetails>>> {
    if id <= 0 {
        return Err(AppError::BadRequest(
            "Movie id must be a positive integer".to_string(),
        ));
    }
    let details = state.catalog.fetch_details(id).await?;
    Ok(Json(ApiResponse::success(details)))
}
