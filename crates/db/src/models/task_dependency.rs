use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskDependencyType {
    Blocks,
    BlockedBy,
    Related,
}

/// Directed edge between two tasks. Unique per ordered pair.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskDependency {
    pub id: Uuid,
    pub task_id: Uuid,
    pub depends_on_task_id: Uuid,
    pub dependency_type: TaskDependencyType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTaskDependency {
    pub depends_on_task_id: Uuid,
    pub dependency_type: Option<TaskDependencyType>,
}

/// The edge set around a task, split the way the board renders it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyLinks {
    pub blocking: Vec<TaskDependency>,
    pub blocked_by: Vec<TaskDependency>,
    pub related: Vec<TaskDependency>,
}

const DEPENDENCY_COLUMNS: &str = "id, task_id, depends_on_task_id, dependency_type, created_at";

impl TaskDependency {
    pub async fn create(
        pool: &SqlitePool,
        id: Uuid,
        task_id: Uuid,
        depends_on_task_id: Uuid,
        dependency_type: TaskDependencyType,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskDependency>(&format!(
            "INSERT INTO task_dependencies (id, task_id, depends_on_task_id, dependency_type)
             VALUES ($1, $2, $3, $4)
             RETURNING {DEPENDENCY_COLUMNS}"
        ))
        .bind(id)
        .bind(task_id)
        .bind(depends_on_task_id)
        .bind(dependency_type)
        .fetch_one(pool)
        .await
    }

    pub async fn find_pair(
        pool: &SqlitePool,
        task_id: Uuid,
        depends_on_task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskDependency>(&format!(
            "SELECT {DEPENDENCY_COLUMNS} FROM task_dependencies
             WHERE task_id = $1 AND depends_on_task_id = $2"
        ))
        .bind(task_id)
        .bind(depends_on_task_id)
        .fetch_optional(pool)
        .await
    }

    /// Whether the dependency graph already contains a path from `from` to
    /// `to`. Adding the edge `to -> from` would then close a cycle. Walks the
    /// whole edge set, so cycles through intermediate tasks are caught, not
    /// just the two-node case.
    pub async fn path_exists(
        pool: &SqlitePool,
        from: Uuid,
        to: Uuid,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "WITH RECURSIVE reachable(id) AS (
                 SELECT depends_on_task_id FROM task_dependencies WHERE task_id = $1
                 UNION
                 SELECT d.depends_on_task_id
                 FROM task_dependencies d
                 JOIN reachable r ON d.task_id = r.id
             )
             SELECT EXISTS (SELECT 1 FROM reachable WHERE id = $2)",
        )
        .bind(from)
        .bind(to)
        .fetch_one(pool)
        .await
    }

    /// All edges touching the task, split into blocking / blocked_by / related.
    pub async fn links_for_task(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<DependencyLinks, sqlx::Error> {
        let edges = sqlx::query_as::<_, TaskDependency>(&format!(
            "SELECT {DEPENDENCY_COLUMNS} FROM task_dependencies
             WHERE task_id = $1 OR depends_on_task_id = $1
             ORDER BY created_at ASC"
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await?;

        let mut links = DependencyLinks::default();
        for edge in edges {
            match edge.dependency_type {
                TaskDependencyType::Related => links.related.push(edge),
                _ if edge.task_id == task_id => links.blocking.push(edge),
                _ => links.blocked_by.push(edge),
            }
        }
        Ok(links)
    }

    /// Delete by id from the task's side; falls back to the reverse direction
    /// so either endpoint of an edge may remove it.
    pub async fn delete_for_task(
        pool: &SqlitePool,
        id: Uuid,
        task_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_dependencies WHERE id = $1 AND task_id = $2")
            .bind(id)
            .bind(task_id)
            .execute(pool)
            .await?;
        if result.rows_affected() > 0 {
            return Ok(result.rows_affected());
        }

        let reverse =
            sqlx::query("DELETE FROM task_dependencies WHERE id = $1 AND depends_on_task_id = $2")
                .bind(id)
                .bind(task_id)
                .execute(pool)
                .await?;
        Ok(reverse.rows_affected())
    }
}
