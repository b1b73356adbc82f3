use chrono::{DateTime, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, SqlitePool, types::Json};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    InReview,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::InReview => "in_review",
            TaskStatus::Done => "done",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
            TaskPriority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub project_id: Option<Uuid>,
    pub epic_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_by: Uuid,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<i64>,
    pub actual_hours: Option<i64>,
    pub tags: Json<Vec<String>>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub epic_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub assignee_ids: Option<Vec<Uuid>>,
    pub due_date: Option<NaiveDate>,
    pub estimated_hours: Option<i64>,
    pub actual_hours: Option<i64>,
    pub tags: Option<Vec<String>>,
}

/// Distinguishes an omitted field from an explicit null, so updates can clear
/// the assignee or due date.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub epic_id: Option<Uuid>,
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
    pub assignee_ids: Option<Vec<Uuid>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
    pub estimated_hours: Option<i64>,
    pub actual_hours: Option<i64>,
    pub tags: Option<Vec<String>>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueDateFilter {
    Overdue,
    Today,
    ThisWeek,
    ThisMonth,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssigneeFilter {
    Unassigned,
    User(Uuid),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSortBy {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Status,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilters {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<AssigneeFilter>,
    pub search: Option<String>,
    pub due_date: Option<DueDateFilter>,
    pub tags: Vec<String>,
    pub sort_by: TaskSortBy,
    pub sort_order: SortOrder,
}

const TASK_COLUMNS: &str = "id, organization_id, project_id, epic_id, title, description, \
     status, priority, created_by, assignee_id, due_date, estimated_hours, actual_hours, \
     tags, sort_order, created_at, updated_at";

impl Task {
    pub async fn create<'e, E>(
        executor: E,
        data: &CreateTask,
        id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        created_by: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, organization_id, project_id, epic_id, title, description,
                                status, priority, created_by, assignee_id, due_date,
                                estimated_hours, actual_hours, tags)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(organization_id)
        .bind(project_id)
        .bind(data.epic_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.status.unwrap_or(TaskStatus::Todo))
        .bind(data.priority.unwrap_or(TaskPriority::Medium))
        .bind(created_by)
        .bind(data.assignee_id)
        .bind(data.due_date)
        .bind(data.estimated_hours)
        .bind(data.actual_hours)
        .bind(Json(data.tags.clone().unwrap_or_default()))
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(
        pool: &SqlitePool,
        id: Uuid,
        project_id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE id = $1 AND project_id = $2 AND organization_id = $3"
        ))
        .bind(id)
        .bind(project_id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await
    }

    /// Organization-scoped lookup, used when a dependency may point at a task
    /// in another project.
    pub async fn find_in_organization(
        pool: &SqlitePool,
        id: Uuid,
        organization_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND organization_id = $2"
        ))
        .bind(id)
        .bind(organization_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list(
        pool: &SqlitePool,
        organization_id: Uuid,
        project_id: Uuid,
        filters: &TaskFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
        push_filters(&mut qb, organization_id, project_id, filters);
        push_order(&mut qb, filters);
        qb.push(" LIMIT ").push_bind(limit);
        qb.push(" OFFSET ").push_bind(offset);
        qb.build_query_as::<Task>().fetch_all(pool).await
    }

    pub async fn count(
        pool: &SqlitePool,
        organization_id: Uuid,
        project_id: Uuid,
        filters: &TaskFilters,
    ) -> Result<i64, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM tasks");
        push_filters(&mut qb, organization_id, project_id, filters);
        let row: (i64,) = qb.build_query_as().fetch_one(pool).await?;
        Ok(row.0)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        title: String,
        description: Option<String>,
        status: TaskStatus,
        priority: TaskPriority,
        epic_id: Option<Uuid>,
        assignee_id: Option<Uuid>,
        due_date: Option<NaiveDate>,
        estimated_hours: Option<i64>,
        actual_hours: Option<i64>,
        tags: Vec<String>,
        sort_order: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = $2, description = $3, status = $4, priority = $5, epic_id = $6,
                 assignee_id = $7, due_date = $8, estimated_hours = $9, actual_hours = $10,
                 tags = $11, sort_order = $12, updated_at = CURRENT_TIMESTAMP
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(status)
        .bind(priority)
        .bind(epic_id)
        .bind(assignee_id)
        .bind(due_date)
        .bind(estimated_hours)
        .bind(actual_hours)
        .bind(Json(tags))
        .bind(sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn status_counts(
        pool: &SqlitePool,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<(TaskStatus, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (TaskStatus, i64)>(
            "SELECT status, COUNT(*) FROM tasks
             WHERE organization_id = $1 AND project_id = $2
             GROUP BY status",
        )
        .bind(organization_id)
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    pub async fn priority_counts(
        pool: &SqlitePool,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<(TaskPriority, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (TaskPriority, i64)>(
            "SELECT priority, COUNT(*) FROM tasks
             WHERE organization_id = $1 AND project_id = $2
             GROUP BY priority",
        )
        .bind(organization_id)
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// (assigned, completed) per assignee across one project.
    pub async fn per_assignee_counts_for_project(
        pool: &SqlitePool,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Vec<(Uuid, i64, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (Uuid, i64, i64)>(
            "SELECT assignee_id, COUNT(*),
                    SUM(CASE WHEN status = 'done' THEN 1 ELSE 0 END)
             FROM tasks
             WHERE organization_id = $1 AND project_id = $2 AND assignee_id IS NOT NULL
             GROUP BY assignee_id",
        )
        .bind(organization_id)
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// (assigned, completed) per assignee across every project of a workspace.
    pub async fn per_assignee_counts_for_workspace(
        pool: &SqlitePool,
        organization_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<(Uuid, i64, i64)>, sqlx::Error> {
        sqlx::query_as::<_, (Uuid, i64, i64)>(
            "SELECT t.assignee_id, COUNT(*),
                    SUM(CASE WHEN t.status = 'done' THEN 1 ELSE 0 END)
             FROM tasks t
             JOIN projects p ON p.id = t.project_id
             WHERE t.organization_id = $1 AND p.workspace_id = $2 AND t.assignee_id IS NOT NULL
             GROUP BY t.assignee_id",
        )
        .bind(organization_id)
        .bind(workspace_id)
        .fetch_all(pool)
        .await
    }

    /// (total, done) across every project of a workspace.
    pub async fn workspace_totals(
        pool: &SqlitePool,
        organization_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<(i64, i64), sqlx::Error> {
        sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN t.status = 'done' THEN 1 ELSE 0 END), 0)
             FROM tasks t
             JOIN projects p ON p.id = t.project_id
             WHERE t.organization_id = $1 AND p.workspace_id = $2",
        )
        .bind(organization_id)
        .bind(workspace_id)
        .fetch_one(pool)
        .await
    }

    /// Replace the many-to-many assignee set in a single transaction.
    pub async fn set_assignees(
        pool: &SqlitePool,
        task_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM task_assignees WHERE task_id = $1")
            .bind(task_id)
            .execute(&mut *tx)
            .await?;
        for user_id in user_ids {
            sqlx::query(
                "INSERT OR IGNORE INTO task_assignees (task_id, user_id) VALUES ($1, $2)",
            )
            .bind(task_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }

    pub async fn assignees(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM task_assignees WHERE task_id = $1")
            .bind(task_id)
            .fetch_all(pool)
            .await
    }
}

fn push_filters(
    qb: &mut QueryBuilder<'_, Sqlite>,
    organization_id: Uuid,
    project_id: Uuid,
    filters: &TaskFilters,
) {
    qb.push(" WHERE organization_id = ").push_bind(organization_id);
    qb.push(" AND project_id = ").push_bind(project_id);

    if let Some(status) = filters.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(priority) = filters.priority {
        qb.push(" AND priority = ").push_bind(priority);
    }
    match filters.assignee {
        Some(AssigneeFilter::Unassigned) => {
            qb.push(" AND assignee_id IS NULL");
        }
        Some(AssigneeFilter::User(user_id)) => {
            qb.push(" AND assignee_id = ").push_bind(user_id);
        }
        None => {}
    }
    if let Some(search) = &filters.search {
        let pattern = format!("%{}%", search.to_lowercase());
        qb.push(" AND (LOWER(title) LIKE ").push_bind(pattern.clone());
        qb.push(" OR LOWER(COALESCE(description, '')) LIKE ")
            .push_bind(pattern);
        qb.push(")");
    }
    if let Some(due) = filters.due_date {
        let today = Utc::now().date_naive();
        match due {
            DueDateFilter::Overdue => {
                qb.push(" AND due_date < ").push_bind(today);
            }
            DueDateFilter::Today => {
                push_due_window(qb, today, today + Days::new(1));
            }
            DueDateFilter::ThisWeek => {
                push_due_window(qb, today, today + Days::new(7));
            }
            DueDateFilter::ThisMonth => {
                push_due_window(qb, today, today + Months::new(1));
            }
            DueDateFilter::None => {
                qb.push(" AND due_date IS NULL");
            }
        }
    }
    if !filters.tags.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM json_each(tasks.tags) WHERE json_each.value IN (");
        let mut separated = qb.separated(", ");
        for tag in &filters.tags {
            separated.push_bind(tag.clone());
        }
        qb.push("))");
    }
}

fn push_due_window(qb: &mut QueryBuilder<'_, Sqlite>, start: NaiveDate, end: NaiveDate) {
    qb.push(" AND due_date >= ").push_bind(start);
    qb.push(" AND due_date < ").push_bind(end);
}

fn push_order(qb: &mut QueryBuilder<'_, Sqlite>, filters: &TaskFilters) {
    let direction = filters.sort_order.as_sql();
    match filters.sort_by {
        TaskSortBy::CreatedAt => {
            qb.push(format!(" ORDER BY created_at {direction}"));
        }
        TaskSortBy::UpdatedAt => {
            qb.push(format!(" ORDER BY updated_at {direction}, created_at DESC"));
        }
        TaskSortBy::DueDate => {
            qb.push(format!(" ORDER BY due_date {direction}, created_at DESC"));
        }
        TaskSortBy::Priority => {
            qb.push(format!(
                " ORDER BY CASE priority
                      WHEN 'low' THEN 1
                      WHEN 'medium' THEN 2
                      WHEN 'high' THEN 3
                      WHEN 'urgent' THEN 4
                  END {direction}, created_at DESC"
            ));
        }
        TaskSortBy::Status => {
            qb.push(format!(
                " ORDER BY CASE status
                      WHEN 'todo' THEN 1
                      WHEN 'in_progress' THEN 2
                      WHEN 'in_review' THEN 3
                      WHEN 'done' THEN 4
                  END {direction}, created_at DESC"
            ));
        }
    }
}
