use crate::catalog::MovieSource;
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{MoviePage, SharedListResponse};
use crate::services::aggregation;
use crate::services::FavoriteStore;

/// Favorites service: the operations exposed to the boundary
pub struct FavoriteService;

impl FavoriteService {
    /// List the user's favorites as one page of catalog summaries.
    /// A user without a list yet simply gets an empty page.
    pub async fn list_favorites<S: MovieSource + ?Sized>(
        db: &Database,
        catalog: &S,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<MoviePage> {
        let Some(list) = FavoriteStore::find_by_user(db, user_id).await? else {
            return Ok(aggregation::page_envelope(Vec::new(), 0, page, limit));
        };

        let (ids, total) = FavoriteStore::list_entries(db, &list.id, page, limit).await?;
        let results = aggregation::fetch_summaries(catalog, &ids).await;

        Ok(aggregation::page_envelope(results, total, page, limit))
    }

    /// Add a movie to the user's favorites, creating the list on first use
    pub async fn add_favorite(db: &Database, user_id: &str, movie_id: i64) -> Result<()> {
        let list = FavoriteStore::get_or_create_list(db, user_id).await?;
        FavoriteStore::add_entry(db, &list.id, movie_id).await
    }

    /// Remove a movie from the user's favorites. Idempotent: removing a
    /// movie that was never added, or from a user without a list, succeeds.
    pub async fn remove_favorite(db: &Database, user_id: &str, movie_id: i64) -> Result<()> {
        match FavoriteStore::find_by_user(db, user_id).await? {
            Some(list) => FavoriteStore::remove_entry(db, &list.id, movie_id).await,
            None => Ok(()),
        }
    }

    /// Check whether a movie is in the user's favorites
    pub async fn check_favorite(db: &Database, user_id: &str, movie_id: i64) -> Result<bool> {
        match FavoriteStore::find_by_user(db, user_id).await? {
            Some(list) => FavoriteStore::entry_exists(db, &list.id, movie_id).await,
            None => Ok(false),
        }
    }

    /// Resolve a share token to the owner's name and a page of their
    /// favorites. Possession of the token is the only credential; there
    /// is no ownership check on this path.
    pub async fn shared_list<S: MovieSource + ?Sized>(
        db: &Database,
        catalog: &S,
        token: &str,
        page: u32,
        limit: u32,
    ) -> Result<SharedListResponse> {
        let Some((list, owner)) = FavoriteStore::find_by_token(db, token).await? else {
            return Err(AppError::NotFound("Shared list not found".to_string()));
        };

        let (ids, total) = FavoriteStore::list_entries(db, &list.id, page, limit).await?;
        let results = aggregation::fetch_summaries(catalog, &ids).await;

        Ok(SharedListResponse {
            owner,
            page: aggregation::page_envelope(results, total, page, limit),
        })
    }

    /// Issue a new share token, superseding the previous one immediately.
    /// A user without a list gets one created, with its fresh token.
    pub async fn rotate_share_token(db: &Database, user_id: &str) -> Result<String> {
        match FavoriteStore::find_by_user(db, user_id).await? {
            Some(list) => FavoriteStore::rotate_token(db, &list.id).await,
            None => {
                let list = FavoriteStore::get_or_create_list(db, user_id).await?;
                Ok(list.share_token)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogError, MovieSource};
    use crate::models::MovieSummary;
    use async_trait::async_trait;
    use std::collections::HashSet;

    /// Mock catalog that knows a fixed set of movies and fails the rest
    struct MockCatalog {
        known: HashSet<i64>,
    }

    impl MockCatalog {
        fn knowing(ids: &[i64]) -> Self {
            Self {
                known: ids.iter().copied().collect(),
            }
        }
    }

    #[async_trait]
    impl MovieSource for MockCatalog {
        async fn movie_summary(&self, id: i64) -> std::result::Result<MovieSummary, CatalogError> {
            if !self.known.contains(&id) {
                return Err(CatalogError::NotFound);
            }
            Ok(MovieSummary {
                id,
                title: format!("Movie {}", id),
                overview: None,
                poster_path: None,
                backdrop_path: None,
                release_date: None,
                vote_average: 0.0,
                vote_count: 0,
            })
        }
    }

    async fn test_db_with_user(user_id: &str, name: &str) -> Database {
        let db = Database::in_memory().await.unwrap();
        sqlx::query("INSERT INTO users (id, email, name, password_hash) VALUES (?, ?, ?, 'x')")
            .bind(user_id)
            .bind(format!("{}@example.com", user_id))
            .bind(name)
            .execute(db.pool())
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_user_without_list_gets_an_empty_page() {
        let db = test_db_with_user("u1", "Alice").await;
        let catalog = MockCatalog::knowing(&[]);

        let page = FavoriteService::list_favorites(&db, &catalog, "u1", 1, 20)
            .await
            .unwrap();

        assert!(page.results.is_empty());
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.total_results, 0);
        assert_eq!(page.page, 1);
    }

    #[tokio::test]
    async fn test_unreachable_movie_is_absent_but_still_counted() {
        // Entries added in order 550, 13, 680; the catalog cannot serve 13
        let db = test_db_with_user("u1", "Alice").await;
        let catalog = MockCatalog::knowing(&[550, 680]);

        for id in [550, 13, 680] {
            FavoriteService::add_favorite(&db, "u1", id).await.unwrap();
        }

        let page = FavoriteService::list_favorites(&db, &catalog, "u1", 1, 20)
            .await
            .unwrap();

        let ids: Vec<i64> = page.results.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![680, 550]);
        assert_eq!(page.total_results, 3);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_double_add_conflicts_and_check_reflects_membership() {
        let db = test_db_with_user("u1", "Alice").await;

        FavoriteService::add_favorite(&db, "u1", 550).await.unwrap();
        let err = FavoriteService::add_favorite(&db, "u1", 550)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert!(FavoriteService::check_favorite(&db, "u1", 550)
            .await
            .unwrap());
        assert!(!FavoriteService::check_favorite(&db, "u1", 13)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_remove_succeeds_without_a_list() {
        let db = test_db_with_user("u1", "Alice").await;
        FavoriteService::remove_favorite(&db, "u1", 550)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_check_without_a_list_is_false() {
        let db = test_db_with_user("u1", "Alice").await;
        assert!(!FavoriteService::check_favorite(&db, "u1", 550)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_shared_list_carries_the_owner_name() {
        let db = test_db_with_user("u1", "Alice").await;
        let catalog = MockCatalog::knowing(&[550]);

        FavoriteService::add_favorite(&db, "u1", 550).await.unwrap();
        let token = FavoriteService::rotate_share_token(&db, "u1")
            .await
            .unwrap();

        let shared = FavoriteService::shared_list(&db, &catalog, &token, 1, 10)
            .await
            .unwrap();

        assert_eq!(shared.owner, "Alice");
        assert_eq!(shared.page.results.len(), 1);
        assert_eq!(shared.page.total_results, 1);
    }

    #[tokio::test]
    async fn test_unknown_share_token_is_not_found() {
        let db = test_db_with_user("u1", "Alice").await;
        let catalog = MockCatalog::knowing(&[]);

        let err = FavoriteService::shared_list(&db, &catalog, "deadbeefdeadbeef", 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rotation_supersedes_the_distributed_token() {
        let db = test_db_with_user("u1", "Alice").await;
        let catalog = MockCatalog::knowing(&[]);

        let old = FavoriteService::rotate_share_token(&db, "u1")
            .await
            .unwrap();
        let new = FavoriteService::rotate_share_token(&db, "u1")
            .await
            .unwrap();
        assert_ne!(old, new);

        let err = FavoriteService::shared_list(&db, &catalog, &old, 1, 10)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let shared = FavoriteService::shared_list(&db, &catalog, &new, 1, 10)
            .await
            .unwrap();
        assert_eq!(shared.owner, "Alice");
    }
}
