use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    Active,
    OnHold,
    Completed,
    Archived,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub workspace_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub created_by: Uuid,
    pub owner_id: Option<Uuid>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    pub workspace_id: Option<Uuid>,
    pub status: Option<ProjectStatus>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProject {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub owner_id: Option<Uuid>,
    pub sort_order: Option<i64>,
}

/// Per-project task totals for workspace-level reporting.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectTaskCounts {
    pub project_id: Uuid,
    pub project_name: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
}

const PROJECT_COLUMNS: &str = "id, organization_id, workspace_id, name, description, status, \
     created_by, owner_id, sort_order, created_at, updated_at";

impl Project {
    pub async fn create<'e, E>(
        executor: E,
        data: &CreateProject,
        id: Uuid,
        organization_id: Uuid,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Project>(&format!(
            "INSERT INTO projects (id, organization_id, workspace_id, name, description, status, created_by, owner_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(organization_id)
        .bind(data.workspace_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.status.unwrap_or(ProjectStatus::Planning))
        .bind(created_by)
        .bind(data.owner_id.unwrap_or(created_by))
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND organization_id = $2"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(
        pool: &SqlitePool,
        organization_id: Uuid,
        workspace_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE organization_id = $1 AND ($2 IS NULL OR workspace_id = $2)
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(organization_id)
        .bind(workspace_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(
        pool: &SqlitePool,
        organization_id: Uuid,
        workspace_id: Option<Uuid>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM projects
             WHERE organization_id = $1 AND ($2 IS NULL OR workspace_id = $2)",
        )
        .bind(organization_id)
        .bind(workspace_id)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_workspace(
        pool: &SqlitePool,
        organization_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE organization_id = $1 AND workspace_id = $2
             ORDER BY sort_order ASC, created_at DESC"
        ))
        .bind(organization_id)
        .bind(workspace_id)
        .fetch_all(pool)
        .await
    }

    pub async fn task_counts_for_workspace(
        pool: &SqlitePool,
        organization_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<ProjectTaskCounts>, sqlx::Error> {
        sqlx::query_as::<_, ProjectTaskCounts>(
            "SELECT p.id AS project_id, p.name AS project_name,
                    COUNT(t.id) AS total_tasks,
                    COALESCE(SUM(CASE WHEN t.status = 'done' THEN 1 ELSE 0 END), 0) AS completed_tasks
             FROM projects p
             LEFT JOIN tasks t ON t.project_id = p.id
             WHERE p.organization_id = $1 AND p.workspace_id = $2
             GROUP BY p.id, p.name
             ORDER BY p.created_at DESC",
        )
        .bind(organization_id)
        .bind(workspace_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        organization_id: Uuid,
        data: &UpdateProject,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Project>(&format!(
            "UPDATE projects
             SET name = COALESCE($3, name),
                 description = COALESCE($4, description),
                 status = COALESCE($5, status),
                 owner_id = COALESCE($6, owner_id),
                 sort_order = COALESCE($7, sort_order),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = $1 AND organization_id = $2
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(organization_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.status)
        .bind(data.owner_id)
        .bind(data.sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
