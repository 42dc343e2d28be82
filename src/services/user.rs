use chrono::Utc;

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{UpdateProfileRequest, User, UserResponse};

/// User service
pub struct UserService;

impl UserService {
    /// Get user by ID
    pub async fn get_user(db: &Database, user_id: &str) -> Result<User> {
        let user: User = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(db.pool())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    /// Get user profile
    pub async fn get_profile(db: &Database, user_id: &str) -> Result<UserResponse> {
        let user = Self::get_user(db, user_id).await?;
        Ok(UserResponse::from(user))
    }

    /// Update user profile
    pub async fn update_profile(
        db: &Database,
        user_id: &str,
        req: UpdateProfileRequest,
    ) -> Result<UserResponse> {
        let now = Utc::now().to_rfc3339();

        if let Some(ref name) = req.name {
            if name.is_empty() || name.len() > 50 {
                return Err(AppError::BadRequest(
                    "Name must be between 1 and 50 characters".to_string(),
                ));
            }
        }

        // The new email must not belong to another user
        if let Some(ref email) = req.email {
            if !email.contains('@') {
                return Err(AppError::BadRequest("Invalid email format".to_string()));
            }

            let taken: Option<(String,)> =
                sqlx::query_as("SELECT id FROM users WHERE email = ? AND id != ?")
                    .bind(email)
                    .bind(user_id)
                    .fetch_optional(db.pool())
                    .await?;

            if taken.is_some() {
                return Err(AppError::Conflict("Email already in use".to_string()));
            }
        }

        if let Some(name) = req.name {
            sqlx::query("UPDATE users SET name = ?, updated_at = ? WHERE id = ?")
                .bind(&name)
                .bind(&now)
                .bind(user_id)
                .execute(db.pool())
                .await?;
        }

        if let Some(email) = req.email {
            sqlx::query("UPDATE users SET email = ?, updated_at = ? WHERE id = ?")
                .bind(&email)
                .bind(&now)
                .bind(user_id)
                .execute(db.pool())
                .await?;
        }

        let user = Self::get_user(db, user_id).await?;
        Ok(UserResponse::from(user))
    }

    /// Delete a user account. The favorite list and its entries go with it.
    pub async fn delete_user(db: &Database, user_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(db.pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::FavoriteStore;

    async fn seed_user(db: &Database, id: &str, email: &str) {
        sqlx::query("INSERT INTO users (id, email, name, password_hash) VALUES (?, ?, 'Alice', 'x')")
            .bind(id)
            .bind(email)
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_rejects_an_email_in_use() {
        let db = Database::in_memory().await.unwrap();
        seed_user(&db, "u1", "alice@example.com").await;
        seed_user(&db, "u2", "bob@example.com").await;

        let err = UserService::update_profile(
            &db,
            "u2",
            UpdateProfileRequest {
                name: None,
                email: Some("alice@example.com".to_string()),
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_the_favorite_list() {
        let db = Database::in_memory().await.unwrap();
        seed_user(&db, "u1", "alice@example.com").await;
        let list = FavoriteStore::get_or_create_list(&db, "u1").await.unwrap();
        FavoriteStore::add_entry(&db, &list.id, 550).await.unwrap();

        UserService::delete_user(&db, "u1").await.unwrap();

        assert!(FavoriteStore::find_by_user(&db, "u1")
            .await
            .unwrap()
            .is_none());
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM favorite_entries")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
