use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskComment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub parent_comment_id: Option<Uuid>,
    pub is_edited: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskComment {
    pub body: String,
    pub parent_comment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTaskComment {
    pub body: String,
}

const COMMENT_COLUMNS: &str =
    "id, task_id, author_id, body, parent_comment_id, is_edited, is_deleted, created_at, updated_at";

impl TaskComment {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTaskComment,
        id: Uuid,
        task_id: Uuid,
        author_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(&format!(
            "INSERT INTO task_comments (id, task_id, author_id, body, parent_comment_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(task_id)
        .bind(author_id)
        .bind(&data.body)
        .bind(data.parent_comment_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM task_comments WHERE id = $1 AND task_id = $2"
        ))
        .bind(id)
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    /// Visible (non-deleted) comments in thread order.
    pub async fn list(
        pool: &SqlitePool,
        task_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM task_comments
             WHERE task_id = $1 AND is_deleted = 0
             ORDER BY created_at ASC
             LIMIT $2 OFFSET $3"
        ))
        .bind(task_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool, task_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM task_comments WHERE task_id = $1 AND is_deleted = 0",
        )
        .bind(task_id)
        .fetch_one(pool)
        .await
    }

    /// Distinct authors of visible comments, for notification fan-out.
    pub async fn author_ids(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT DISTINCT author_id FROM task_comments WHERE task_id = $1 AND is_deleted = 0",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update_body(pool: &SqlitePool, id: Uuid, body: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskComment>(&format!(
            "UPDATE task_comments
             SET body = $2, is_edited = 1, updated_at = CURRENT_TIMESTAMP
             WHERE id = $1
             RETURNING {COMMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(body)
        .fetch_one(pool)
        .await
    }

    /// Soft delete; the row stays for thread integrity.
    pub async fn mark_deleted(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE task_comments SET is_deleted = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
