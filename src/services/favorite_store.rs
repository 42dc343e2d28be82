use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::FavoriteList;

/// Storage adapter for favorite lists, their entries and share tokens
pub struct FavoriteStore;

impl FavoriteStore {
    /// Generate an opaque share token: 8 random bytes, hex-encoded
    pub fn generate_token() -> String {
        format!("{:016x}", rand::thread_rng().gen::<u64>())
    }

    /// Find a user's favorite list, if one exists
    pub async fn find_by_user(db: &Database, user_id: &str) -> Result<Option<FavoriteList>> {
        let list = sqlx::query_as("SELECT * FROM favorite_lists WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(db.pool())
            .await?;
        Ok(list)
    }

    /// Get the user's favorite list, creating it if absent. The insert is
    /// a single upsert, so concurrent first-time calls for the same user
    /// cannot create two lists.
    pub async fn get_or_create_list(db: &Database, user_id: &str) -> Result<FavoriteList> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO favorite_lists (id, user_id, share_token, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(Self::generate_token())
        .bind(&now)
        .bind(&now)
        .execute(db.pool())
        .await?;

        let list = sqlx::query_as("SELECT * FROM favorite_lists WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(db.pool())
            .await?;
        Ok(list)
    }

    /// One page of movie ids plus the total entry count. Ordering is
    /// most-recently-added first; a page past the end is empty, not an
    /// error.
    pub async fn list_entries(
        db: &Database,
        list_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<i64>, i64)> {
        let offset = (page as i64 - 1) * limit as i64;

        let rows: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT movie_id FROM favorite_entries
            WHERE list_id = ?
            ORDER BY added_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(list_id)
        .bind(limit as i64)
        .bind(offset)
        .fetch_all(db.pool())
        .await?;

        let (total,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM favorite_entries WHERE list_id = ?")
                .bind(list_id)
                .fetch_one(db.pool())
                .await?;

        Ok((rows.into_iter().map(|r| r.0).collect(), total))
    }

    /// Check membership of a movie in a list
    pub async fn entry_exists(db: &Database, list_id: &str, movie_id: i64) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM favorite_entries WHERE list_id = ? AND movie_id = ?")
                .bind(list_id)
                .bind(movie_id)
                .fetch_optional(db.pool())
                .await?;
        Ok(row.is_some())
    }

    /// Add a movie to a list. A duplicate (list, movie) pair is a conflict.
    pub async fn add_entry(db: &Database, list_id: &str, movie_id: i64) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO favorite_entries (id, list_id, movie_id, added_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(list_id)
        .bind(movie_id)
        .bind(Utc::now().to_rfc3339())
        .execute(db.pool())
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let is_duplicate = match &e {
                    sqlx::Error::Database(db_err) => db_err
                        .message()
                        .contains("UNIQUE constraint failed: favorite_entries"),
                    _ => false,
                };
                if is_duplicate {
                    Err(AppError::Conflict("Movie already in favorites".to_string()))
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Remove a movie from a list. Removing an absent entry is a no-op.
    pub async fn remove_entry(db: &Database, list_id: &str, movie_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM favorite_entries WHERE list_id = ? AND movie_id = ?")
            .bind(list_id)
            .bind(movie_id)
            .execute(db.pool())
            .await?;
        Ok(())
    }

    /// Replace the list's share token. The old token stops resolving as
    /// soon as the update lands.
    pub async fn rotate_token(db: &Database, list_id: &str) -> Result<String> {
        let token = Self::generate_token();
        sqlx::query("UPDATE favorite_lists SET share_token = ?, updated_at = ? WHERE id = ?")
            .bind(&token)
            .bind(Utc::now().to_rfc3339())
            .bind(list_id)
            .execute(db.pool())
            .await?;
        Ok(token)
    }

    /// Resolve a share token to its list and the owner's display name
    pub async fn find_by_token(
        db: &Database,
        token: &str,
    ) -> Result<Option<(FavoriteList, String)>> {
        let row: Option<(String, String, String, String, String, String)> = sqlx::query_as(
            r#"
            SELECT l.id, l.user_id, l.share_token, l.created_at, l.updated_at, u.name
            FROM favorite_lists l
            JOIN users u ON l.user_id = u.id
            WHERE l.share_token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(db.pool())
        .await?;

        Ok(row.map(
            |(id, user_id, share_token, created_at, updated_at, name)| {
                (
                    FavoriteList {
                        id,
                        user_id,
                        share_token,
                        created_at,
                        updated_at,
                    },
                    name,
                )
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db_with_user(user_id: &str) -> Database {
        let db = Database::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO users (id, email, name, password_hash) VALUES (?, ?, 'Test User', 'x')",
        )
        .bind(user_id)
        .bind(format!("{}@example.com", user_id))
        .execute(db.pool())
        .await
        .unwrap();
        db
    }

    #[test]
    fn test_generated_token_is_sixteen_hex_chars() {
        let token = FavoriteStore::generate_token();
        assert_eq!(token.len(), 16);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_get_or_create_list_is_idempotent() {
        let db = test_db_with_user("u1").await;

        let first = FavoriteStore::get_or_create_list(&db, "u1").await.unwrap();
        let second = FavoriteStore::get_or_create_list(&db, "u1").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.share_token, second.share_token);
    }

    #[tokio::test]
    async fn test_duplicate_add_is_a_conflict() {
        let db = test_db_with_user("u1").await;
        let list = FavoriteStore::get_or_create_list(&db, "u1").await.unwrap();

        FavoriteStore::add_entry(&db, &list.id, 550).await.unwrap();
        let err = FavoriteStore::add_entry(&db, &list.id, 550)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let db = test_db_with_user("u1").await;
        let list = FavoriteStore::get_or_create_list(&db, "u1").await.unwrap();

        FavoriteStore::add_entry(&db, &list.id, 550).await.unwrap();
        FavoriteStore::remove_entry(&db, &list.id, 550)
            .await
            .unwrap();
        // Second removal of the same entry still succeeds
        FavoriteStore::remove_entry(&db, &list.id, 550)
            .await
            .unwrap();

        assert!(!FavoriteStore::entry_exists(&db, &list.id, 550)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_entries_are_listed_most_recent_first() {
        let db = test_db_with_user("u1").await;
        let list = FavoriteStore::get_or_create_list(&db, "u1").await.unwrap();

        for id in [550, 13, 680] {
            FavoriteStore::add_entry(&db, &list.id, id).await.unwrap();
        }

        let (ids, total) = FavoriteStore::list_entries(&db, &list.id, 1, 20)
            .await
            .unwrap();
        assert_eq!(ids, vec![680, 13, 550]);
        assert_eq!(total, 3);
    }

    #[tokio::test]
    async fn test_page_past_the_end_is_empty() {
        let db = test_db_with_user("u1").await;
        let list = FavoriteStore::get_or_create_list(&db, "u1").await.unwrap();
        FavoriteStore::add_entry(&db, &list.id, 550).await.unwrap();

        let (ids, total) = FavoriteStore::list_entries(&db, &list.id, 5, 20)
            .await
            .unwrap();
        assert!(ids.is_empty());
        assert_eq!(total, 1);
    }

    #[tokio::test]
    async fn test_pagination_slices_by_offset() {
        let db = test_db_with_user("u1").await;
        let list = FavoriteStore::get_or_create_list(&db, "u1").await.unwrap();

        for id in 1..=5 {
            FavoriteStore::add_entry(&db, &list.id, id).await.unwrap();
        }

        let (page1, total) = FavoriteStore::list_entries(&db, &list.id, 1, 2)
            .await
            .unwrap();
        let (page2, _) = FavoriteStore::list_entries(&db, &list.id, 2, 2)
            .await
            .unwrap();
        let (page3, _) = FavoriteStore::list_entries(&db, &list.id, 3, 2)
            .await
            .unwrap();

        assert_eq!(total, 5);
        assert_eq!(page1, vec![5, 4]);
        assert_eq!(page2, vec![3, 2]);
        assert_eq!(page3, vec![1]);
    }

    #[tokio::test]
    async fn test_rotation_invalidates_the_old_token() {
        let db = test_db_with_user("u1").await;
        let list = FavoriteStore::get_or_create_list(&db, "u1").await.unwrap();
        let old_token = list.share_token.clone();

        let new_token = FavoriteStore::rotate_token(&db, &list.id).await.unwrap();
        assert_ne!(old_token, new_token);

        assert!(FavoriteStore::find_by_token(&db, &old_token)
            .await
            .unwrap()
            .is_none());

        let (resolved, owner) = FavoriteStore::find_by_token(&db, &new_token)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, list.id);
        assert_eq!(owner, "Test User");
    }

    #[tokio::test]
    async fn test_unknown_token_resolves_to_nothing() {
        let db = test_db_with_user("u1").await;
        FavoriteStore::get_or_create_list(&db, "u1").await.unwrap();

        assert!(FavoriteStore::find_by_token(&db, "deadbeefdeadbeef")
            .await
            .unwrap()
            .is_none());
    }
}
