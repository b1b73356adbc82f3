use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskTimeLog {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: Uuid,
    pub logged_date: NaiveDate,
    pub duration_minutes: i64,
    pub description: Option<String>,
    pub is_billable: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskTimeLog {
    pub logged_date: NaiveDate,
    pub duration_minutes: i64,
    pub description: Option<String>,
    pub is_billable: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskTimeLog {
    pub logged_date: Option<NaiveDate>,
    pub duration_minutes: Option<i64>,
    pub description: Option<String>,
    pub is_billable: Option<bool>,
}

/// Project-wide duration sums, computed in SQL.
#[derive(Debug, Clone, Copy, Default, FromRow, Serialize)]
pub struct TimeTotals {
    pub total_minutes: i64,
    pub billable_minutes: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserTimeRollup {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub total_minutes: i64,
    pub billable_minutes: i64,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TaskTimeRollup {
    pub task_id: Uuid,
    pub task_title: String,
    pub total_minutes: i64,
    pub billable_minutes: i64,
}

const TIME_LOG_COLUMNS: &str = "id, task_id, user_id, logged_date, duration_minutes, \
     description, is_billable, created_at, updated_at";

/// Shared WHERE tail joining logs to a project's tasks with an optional date range.
const PROJECT_LOG_SCOPE: &str = "t.project_id = $1 AND t.organization_id = $2
       AND ($3 IS NULL OR l.logged_date >= $3)
       AND ($4 IS NULL OR l.logged_date <= $4)";

impl TaskTimeLog {
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateTaskTimeLog,
        id: Uuid,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskTimeLog>(&format!(
            "INSERT INTO task_time_logs (id, task_id, user_id, logged_date, duration_minutes, description, is_billable)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {TIME_LOG_COLUMNS}"
        ))
        .bind(id)
        .bind(task_id)
        .bind(user_id)
        .bind(data.logged_date)
        .bind(data.duration_minutes)
        .bind(&data.description)
        .bind(data.is_billable.unwrap_or(false))
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskTimeLog>(&format!(
            "SELECT {TIME_LOG_COLUMNS} FROM task_time_logs WHERE id = $1 AND task_id = $2"
        ))
        .bind(id)
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(
        pool: &SqlitePool,
        task_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskTimeLog>(&format!(
            "SELECT {TIME_LOG_COLUMNS} FROM task_time_logs
             WHERE task_id = $1
             ORDER BY logged_date DESC, created_at DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(task_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &SqlitePool, task_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM task_time_logs WHERE task_id = $1")
            .bind(task_id)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateTaskTimeLog,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskTimeLog>(&format!(
            "UPDATE task_time_logs
             SET logged_date = COALESCE($2, logged_date),
                 duration_minutes = COALESCE($3, duration_minutes),
                 description = COALESCE($4, description),
                 is_billable = COALESCE($5, is_billable),
                 updated_at = CURRENT_TIMESTAMP
             WHERE id = $1
             RETURNING {TIME_LOG_COLUMNS}"
        ))
        .bind(id)
        .bind(data.logged_date)
        .bind(data.duration_minutes)
        .bind(&data.description)
        .bind(data.is_billable)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_time_logs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn project_totals(
        pool: &SqlitePool,
        project_id: Uuid,
        organization_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<TimeTotals, sqlx::Error> {
        sqlx::query_as::<_, TimeTotals>(&format!(
            "SELECT COALESCE(SUM(l.duration_minutes), 0) AS total_minutes,
                    COALESCE(SUM(CASE WHEN l.is_billable THEN l.duration_minutes ELSE 0 END), 0) AS billable_minutes
             FROM task_time_logs l
             JOIN tasks t ON t.id = l.task_id
             WHERE {PROJECT_LOG_SCOPE}"
        ))
        .bind(project_id)
        .bind(organization_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
    }

    pub async fn project_rollup_by_user(
        pool: &SqlitePool,
        project_id: Uuid,
        organization_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<UserTimeRollup>, sqlx::Error> {
        sqlx::query_as::<_, UserTimeRollup>(&format!(
            "SELECT l.user_id, u.first_name, u.last_name,
                    SUM(l.duration_minutes) AS total_minutes,
                    SUM(CASE WHEN l.is_billable THEN l.duration_minutes ELSE 0 END) AS billable_minutes
             FROM task_time_logs l
             JOIN tasks t ON t.id = l.task_id
             JOIN users u ON u.id = l.user_id
             WHERE {PROJECT_LOG_SCOPE}
             GROUP BY l.user_id, u.first_name, u.last_name
             ORDER BY total_minutes DESC"
        ))
        .bind(project_id)
        .bind(organization_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    pub async fn project_rollup_by_task(
        pool: &SqlitePool,
        project_id: Uuid,
        organization_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<TaskTimeRollup>, sqlx::Error> {
        sqlx::query_as::<_, TaskTimeRollup>(&format!(
            "SELECT l.task_id, t.title AS task_title,
                    SUM(l.duration_minutes) AS total_minutes,
                    SUM(CASE WHEN l.is_billable THEN l.duration_minutes ELSE 0 END) AS billable_minutes
             FROM task_time_logs l
             JOIN tasks t ON t.id = l.task_id
             WHERE {PROJECT_LOG_SCOPE}
             GROUP BY l.task_id, t.title
             ORDER BY total_minutes DESC"
        ))
        .bind(project_id)
        .bind(organization_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    /// Minutes logged per user across a set of workspace projects, for the
    /// productivity report.
    pub async fn minutes_by_user_for_workspace(
        pool: &SqlitePool,
        workspace_id: Uuid,
        organization_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<(Uuid, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (Uuid, i64)>(
            "SELECT l.user_id, SUM(l.duration_minutes)
             FROM task_time_logs l
             JOIN tasks t ON t.id = l.task_id
             JOIN projects p ON p.id = t.project_id
             WHERE p.workspace_id = $1 AND t.organization_id = $2
               AND ($3 IS NULL OR l.logged_date >= $3)
               AND ($4 IS NULL OR l.logged_date <= $4)
             GROUP BY l.user_id",
        )
        .bind(workspace_id)
        .bind(organization_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }

    pub async fn minutes_by_user_for_project(
        pool: &SqlitePool,
        project_id: Uuid,
        organization_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<(Uuid, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (Uuid, i64)>(&format!(
            "SELECT l.user_id, SUM(l.duration_minutes)
             FROM task_time_logs l
             JOIN tasks t ON t.id = l.task_id
             WHERE {PROJECT_LOG_SCOPE}
             GROUP BY l.user_id"
        ))
        .bind(project_id)
        .bind(organization_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await
    }
}
