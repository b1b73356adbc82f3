use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskActivityType {
    Created,
    Updated,
    StatusChanged,
    PriorityChanged,
    Assigned,
    Unassigned,
    DueDateSet,
    DueDateChanged,
    DueDateRemoved,
    CommentAdded,
    CommentEdited,
    CommentDeleted,
    AttachmentAdded,
    AttachmentRemoved,
}

/// Append-only audit record of a single task mutation. Rows are never updated
/// or deleted directly; they disappear only through the task cascade.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskActivity {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub activity_type: TaskActivityType,
    pub old_value: Option<Json<serde_json::Value>>,
    pub new_value: Option<Json<serde_json::Value>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

const ACTIVITY_COLUMNS: &str =
    "id, task_id, user_id, activity_type, old_value, new_value, description, created_at";

impl TaskActivity {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        task_id: Uuid,
        user_id: Uuid,
        activity_type: TaskActivityType,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
        description: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskActivity>(&format!(
            "INSERT INTO task_activities (id, task_id, user_id, activity_type, old_value, new_value, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(id)
        .bind(task_id)
        .bind(user_id)
        .bind(activity_type)
        .bind(old_value.map(Json))
        .bind(new_value.map(Json))
        .bind(description)
        .fetch_one(pool)
        .await
    }

    pub async fn list(
        pool: &SqlitePool,
        task_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskActivity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM task_activities
             WHERE task_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(task_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool, task_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM task_activities WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(pool)
            .await
    }

    pub async fn list_by_type(
        pool: &SqlitePool,
        task_id: Uuid,
        activity_type: TaskActivityType,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskActivity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM task_activities
             WHERE task_id = $1 AND activity_type = $2
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(task_id)
        .bind(activity_type)
        .fetch_all(pool)
        .await
    }
}
