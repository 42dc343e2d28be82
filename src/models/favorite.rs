use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::MoviePage;

/// Favorite list model (one per user)
#[derive(Debug, Clone, FromRow)]
pub struct FavoriteList {
    pub id: String,
    pub user_id: String,
    pub share_token: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Request to add a movie to the favorites
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    pub tmdb_movie_id: i64,
}

/// Favorite membership check result
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStatus {
    pub is_favorite: bool,
}

/// Freshly generated share token
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareTokenResponse {
    pub share_token: String,
}

/// Publicly shared list: owner name plus the usual page envelope
#[derive(Debug, Serialize)]
pub struct SharedListResponse {
    pub owner: String,
    #[serde(flatten)]
    pub page: MoviePage,
}

/// Pagination query parameters
#[derive(Debug, Default, Deserialize)]
pub struct PaginationQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PaginationQuery {
    /// Resolve page and limit against a per-route default limit,
    /// clamping both to at least 1
    pub fn resolve(&self, default_limit: u32) -> (u32, u32) {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(default_limit).max(1);
        (page, limit)
    }
}
