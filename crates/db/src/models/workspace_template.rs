use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WorkspaceTemplate {
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
pub struct WorkspaceTemplateProject {
    pub id: Uuid,
    pub template_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub project_template_id: Option<Uuid>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkspaceTemplateProject {
    pub name: String,
    pub description: Option<String>,
    pub project_template_id: Option<Uuid>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkspaceTemplate {
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_public: Option<bool>,
    pub projects: Option<Vec<CreateWorkspaceTemplateProject>>,
}

const TEMPLATE_COLUMNS: &str = "id, organization_id, name, description, category, is_public, \
     created_by, usage_count, created_at, updated_at";
const TEMPLATE_PROJECT_COLUMNS: &str =
    "id, template_id, name, description, project_template_id, sort_order, created_at";

impl WorkspaceTemplate {
    pub async fn create<'e, E>(
        executor: E,
        data: &CreateWorkspaceTemplate,
        id: Uuid,
        organization_id: Uuid,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, WorkspaceTemplate>(&format!(
            "INSERT INTO workspace_templates (id, organization_id, name, description, category, is_public, created_by)
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

    pub async fn find_visible(
        pool: &SqlitePool,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkspaceTemplate>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM workspace_templates
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
        sqlx::query_as::<_, WorkspaceTemplate>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM workspace_templates
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
            "UPDATE workspace_templates
             SET usage_count = usage_count + 1, updated_at = CURRENT_TIMESTAMP
             WHERE id = $1",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete_owned(
        pool: &SqlitePool,
        id: Uuid,
        organization_id: Uuid,
        created_by: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM workspace_templates
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

impl WorkspaceTemplateProject {
    pub async fn create<'e, E>(
        executor: E,
        data: &CreateWorkspaceTemplateProject,
        id: Uuid,
        template_id: Uuid,
        default_sort_order: i64,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, WorkspaceTemplateProject>(&format!(
            "INSERT INTO workspace_template_projects (id, template_id, name, description, project_template_id, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {TEMPLATE_PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(template_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.project_template_id)
        .bind(data.sort_order.unwrap_or(default_sort_order))
        .fetch_one(executor)
        .await
    }

    pub async fn list(pool: &SqlitePool, template_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, WorkspaceTemplateProject>(&format!(
            "SELECT {TEMPLATE_PROJECT_COLUMNS} FROM workspace_template_projects
             WHERE template_id = $1
             ORDER BY sort_order ASC, created_at ASC"
        ))
        .bind(template_id)
        .fetch_all(pool)
        .await
    }
}
