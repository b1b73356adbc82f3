use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, types::Json};
use uuid::Uuid;

use super::task::{TaskPriority, TaskStatus};

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProjectTemplate {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub is_public: bool,
    pub created_by: Uuid,
    pub usage_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ProjectTemplateTask {
    pub id: Uuid,
    pub template_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub sort_order: i64,
    pub tags: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectTemplateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub sort_order: Option<i64>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectTemplate {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
    pub tasks: Option<Vec<CreateProjectTemplateTask>>,
}

const TEMPLATE_COLUMNS: &str = "id, organization_id, name, description, category, is_public, \
     created_by, usage_count, created_at, updated_at";
const TEMPLATE_TASK_COLUMNS: &str =
    "id, template_id, title, description, status, priority, sort_order, tags, created_at";

impl ProjectTemplate {
    pub async fn create<'e, E>(
        executor: E,
        data: &CreateProjectTemplate,
        id: Uuid,
        organization_id: Uuid,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ProjectTemplate>(&format!(
            "INSERT INTO project_templates (id, organization_id, name, description, category, is_public, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(id)
        .bind(organization_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.category.as_deref().unwrap_or("custom"))
        .bind(data.is_public.unwrap_or(false))
        .bind(created_by)
        .fetch_one(executor)
        .await
    }

    /// Visible to an organization: its own templates plus public ones.
    pub async fn find_visible(
        pool: &SqlitePool,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectTemplate>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM project_templates
             WHERE id = $1 AND (organization_id = $2 OR is_public = 1)"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_visible(
        pool: &SqlitePool,
        organization_id: Uuid,
        include_public: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectTemplate>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM project_templates
             WHERE organization_id = $1 OR ($2 AND is_public = 1)
             ORDER BY created_at DESC"
        ))
        .bind(organization_id)
        .bind(include_public)
        .fetch_all(pool)
        .await
    }

    pub async fn increment_usage<'e, E>(
        executor: E,
        id: Uuid,
    ) -> Result<(), sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query(
            "UPDATE project_templates
             SET usage_count = usage_count + 1, updated_at = CURRENT_TIMESTAMP
             WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    /// Delete is restricted to the creator within their organization.
    pub async fn delete_owned(
        pool: &SqlitePool,
        id: Uuid,
        organization_id: Uuid,
        created_by: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM project_templates
             WHERE id = $1 AND organization_id = $2 AND created_by = $3",
        )
        .bind(id)
        .bind(organization_id)
        .bind(created_by)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}

impl ProjectTemplateTask {
    pub async fn create<'e, E>(
        executor: E,
        data: &CreateProjectTemplateTask,
        id: Uuid,
        template_id: Uuid,
        default_sort_order: i64,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, ProjectTemplateTask>(&format!(
            "INSERT INTO project_template_tasks (id, template_id, title, description, status, priority, sort_order, tags)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {TEMPLATE_TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(template_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.status.unwrap_or(TaskStatus::Todo))
        .bind(data.priority.unwrap_or(TaskPriority::Medium))
        .bind(data.sort_order.unwrap_or(default_sort_order))
        .bind(Json(data.tags.clone().unwrap_or_default()))
        .fetch_one(executor)
        .await
    }

    pub async fn list(pool: &SqlitePool, template_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectTemplateTask>(&format!(
            "SELECT {TEMPLATE_TASK_COLUMNS} FROM project_template_tasks
             WHERE template_id = $1
             ORDER BY sort_order ASC, created_at ASC"
        ))
        .bind(template_id)
        .fetch_all(pool)
        .await
    }
}
