use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskAttachment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
    pub thumbnail_url: Option<String>,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskAttachment {
    pub file_name: String,
    pub file_url: String,
    pub file_type: String,
    pub file_size: i64,
    pub thumbnail_url: Option<String>,
}

const ATTACHMENT_COLUMNS: &str =
    "id, task_id, file_name, file_url, file_type, file_size, thumbnail_url, uploaded_by, created_at";

impl TaskAttachment {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTaskAttachment,
        id: Uuid,
        task_id: Uuid,
        uploaded_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskAttachment>(&format!(
            "INSERT INTO task_attachments (id, task_id, file_name, file_url, file_type, file_size, thumbnail_url, uploaded_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {ATTACHMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(task_id)
        .bind(&data.file_name)
        .bind(&data.file_url)
        .bind(&data.file_type)
        .bind(data.file_size)
        .bind(&data.thumbnail_url)
        .bind(uploaded_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskAttachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM task_attachments WHERE id = $1 AND task_id = $2"
        ))
        .bind(id)
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskAttachment>(&format!(
            "SELECT {ATTACHMENT_COLUMNS} FROM task_attachments
             WHERE task_id = $1
             ORDER BY created_at DESC"
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_attachments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
