//! Notifications repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::notification::Notification,
};

#[async_trait]
pub trait NotificationsRepository: Send + Sync {
    async fn create(&self, user_id: i32, message: &str) -> AppResult<Notification>;
    async fn get_by_id(&self, id: i32) -> AppResult<Notification>;
    /// Newest first
    async fn for_user(&self, user_id: i32, unread_only: bool) -> AppResult<Vec<Notification>>;
    async fn count_unread(&self, user_id: i32) -> AppResult<i64>;
    async fn mark_read(&self, id: i32) -> AppResult<()>;
    /// Returns how many notifications changed
    async fn mark_all_read(&self, user_id: i32) -> AppResult<u64>;
}

#[derive(Clone)]
pub struct PgNotificationsRepository {
    pool: Pool<Postgres>,
}

impl PgNotificationsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationsRepository for PgNotificationsRepository {
    async fn create(&self, user_id: i32, message: &str) -> AppResult<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (user_id, message) VALUES ($1, $2) RETURNING *",
        )
        .bind(user_id)
        .bind(message)
        .fetch_one(&self.pool)
        .await?;
        Ok(notification)
    }

    async fn get_by_id(&self, id: i32) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification with id {} not found", id)))
    }

    async fn for_user(&self, user_id: i32, unread_only: bool) -> AppResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR NOT is_read)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_all(&self.pool)
        .await?;
        Ok(notifications)
    }

    async fn count_unread(&self, user_id: i32) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn mark_read(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Notification with id {} not found", id)));
        }
        Ok(())
    }

    async fn mark_all_read(&self, user_id: i32) -> AppResult<u64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = TRUE WHERE user_id = $1 AND NOT is_read")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected())
    }
}
