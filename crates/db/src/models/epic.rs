use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EpicStatus {
    Planning,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Epic {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: EpicStatus,
    pub assignee_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub created_by: Uuid,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEpic {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<EpicStatus>,
    pub assignee_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEpic {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<EpicStatus>,
    pub assignee_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sort_order: Option<i64>,
}

const EPIC_COLUMNS: &str = "id, organization_id, project_id, name, description, status, \
     assignee_id, start_date, end_date, created_by, sort_order, created_at, updated_at";

impl Epic {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateEpic,
        id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Epic>(&format!(
            "INSERT INTO epics (id, organization_id, project_id, name, description, status, assignee_id, start_date, end_date, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING {EPIC_COLUMNS}"
        ))
        .bind(id)
        .bind(organization_id)
        .bind(project_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.status.unwrap_or(EpicStatus::Planning))
        .bind(data.assignee_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(created_by)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        project_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Epic>(&format!(
            "SELECT {EPIC_COLUMNS} FROM epics
             WHERE id = $1 AND project_id = $2 AND organization_id = $3"
        ))
        .bind(id)
        .bind(project_id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(
        pool: &SqlitePool,
        organization_id: Uuid,
        project_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Epic>(&format!(
            "SELECT {EPIC_COLUMNS} FROM epics
             WHERE organization_id = $1 AND project_id = $2
             ORDER BY sort_order ASC, created_at DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(organization_id)
        .bind(project_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(
        pool: &SqlitePool,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM epics WHERE organization_id = $1 AND project_id = $2",
        )
        .bind(organization_id)
        .bind(project_id)
        .fetch_one(pool)
        .await
    }

    pub async fn update(pool: &SqlitePool, id: Uuid, data: &UpdateEpic) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Epic>(&format!(
            "UPDATE epics
             SET name = COALESCE($2, name),
                 description = COALESCE($3, description),
                 status = COALESCE($4, status),
                 assignee_id = COALESCE($5, assignee_id),
                 start_date = COALESCE($6, start_date),
                 end_date = COALESCE($7, end_date),
                 sort_order = COALESCE($8, sort_order),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = $1
             RETURNING {EPIC_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.status)
        .bind(data.assignee_id)
        .bind(data.start_date)
        .bind(data.end_date)
        .bind(data.sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM epics WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
