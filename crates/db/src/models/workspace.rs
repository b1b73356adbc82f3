use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Workspace {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub logo_url: Option<String>,
    pub created_by: Uuid,
    pub owner_id: Option<Uuid>,
    pub is_active: bool,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkspace {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub logo_url: Option<String>,
    pub owner_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkspace {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub logo_url: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<i64>,
}

const WORKSPACE_COLUMNS: &str = "id, organization_id, name, description, color, logo_url, \
     created_by, owner_id, is_active, sort_order, created_at, updated_at";

impl Workspace {
    /// Insert a workspace row. Takes an executor so workspace creation and the
    /// seed owner membership can share one transaction.
    pub async fn create<'e, E>(
        executor: E,
        data: &CreateWorkspace,
        id: Uuid,
        organization_id: Uuid,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Workspace>(&format!(
            "INSERT INTO workspaces (id, organization_id, name, description, color, logo_url, created_by, owner_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {WORKSPACE_COLUMNS}"
        ))
        .bind(id)
        .bind(organization_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.color)
        .bind(&data.logo_url)
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
        sqlx::query_as::<_, Workspace>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = $1 AND organization_id = $2"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await
    }

    /// Active workspaces the user is an active member of, newest first within
    /// explicit sort order.
    pub async fn list_for_member(
        pool: &SqlitePool,
        organization_id: Uuid,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Workspace>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces w
             WHERE w.organization_id = $1
               AND w.is_active = 1
               AND EXISTS (
                   SELECT 1 FROM workspace_members m
                   WHERE m.workspace_id = w.id AND m.user_id = $2 AND m.is_active = 1
               )
             ORDER BY w.sort_order ASC, w.created_at DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(organization_id)
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count_for_member(
        pool: &SqlitePool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM workspaces w
             WHERE w.organization_id = $1
               AND w.is_active = 1
               AND EXISTS (
                   SELECT 1 FROM workspace_members m
                   WHERE m.workspace_id = w.id AND m.user_id = $2 AND m.is_active = 1
               )",
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        organization_id: Uuid,
        data: &UpdateWorkspace,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Workspace>(&format!(
            "UPDATE workspaces
             SET name = COALESCE($3, name),
                 description = COALESCE($4, description),
                 color = COALESCE($5, color),
                 logo_url = COALESCE($6, logo_url),
                 is_active = COALESCE($7, is_active),
                 sort_order = COALESCE($8, sort_order),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = $1 AND organization_id = $2
             RETURNING {WORKSPACE_COLUMNS}"
        ))
        .bind(id)
        .bind(organization_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.color)
        .bind(&data.logo_url)
        .bind(data.is_active)
        .bind(data.sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workspaces WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
