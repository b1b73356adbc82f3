use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use chrono::NaiveDate;
use db::models::{
    task::{
        AssigneeFilter, CreateTask, DueDateFilter, SortOrder, Task, TaskFilters, TaskPriority,
        TaskSortBy, TaskStatus, UpdateTask,
    },
    task_activity::TaskActivity,
    task_attachment::{CreateTaskAttachment, TaskAttachment},
    task_comment::{CreateTaskComment, TaskComment, UpdateTaskComment},
    task_dependency::{CreateTaskDependency, DependencyLinks, TaskDependency},
    task_time_log::{CreateTaskTimeLog, TaskTimeLog, UpdateTaskTimeLog},
};
use serde::Deserialize;
use services::services::task::{ProjectTimeReport, TaskService};
use utils::response::{ApiResponse, Page, PageQuery};
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::Identity};

const CHILD_LIST_LIMIT: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<String>,
    pub search: Option<String>,
    pub due_date: Option<DueDateFilter>,
    pub tags: Option<String>,
    pub sort_by: Option<TaskSortBy>,
    pub sort_order: Option<SortOrder>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl TaskListQuery {
    fn filters(&self) -> TaskFilters {
        let assignee = self.assignee_id.as_deref().and_then(|raw| {
            if raw == "unassigned" {
                Some(AssigneeFilter::Unassigned)
            } else {
                Uuid::parse_str(raw).ok().map(AssigneeFilter::User)
            }
        });
        let tags = self
            .tags
            .as_deref()
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        TaskFilters {
            status: self.status,
            priority: self.priority,
            assignee,
            search: self.search.clone(),
            due_date: self.due_date,
            tags,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id)): Path<(String, Uuid)>,
    Json(payload): Json<CreateTask>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Task>>), ApiError> {
    let task = TaskService::new(state.pool().clone())
        .create_task(
            identity.user_id,
            identity.organization_id,
            project_id,
            &payload,
        )
        .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(task))))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id)): Path<(String, Uuid)>,
    Query(query): Query<TaskListQuery>,
) -> Result<ResponseJson<Page<Task>>, ApiError> {
    let (page, limit, offset) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(PageQuery::DEFAULT_LIMIT);
    let result = TaskService::new(state.pool().clone())
        .list_tasks(
            identity.user_id,
            identity.organization_id,
            project_id,
            &query.filters(),
            page,
            limit,
            offset,
        )
        .await?;
    Ok(ResponseJson(result))
}

pub async fn get_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = TaskService::new(state.pool().clone())
        .get_task(identity.user_id, identity.organization_id, project_id, task_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let task = TaskService::new(state.pool().clone())
        .update_task(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            &payload,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    TaskService::new(state.pool().clone())
        .delete_task(identity.user_id, identity.organization_id, project_id, task_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

// ---------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------

pub async fn add_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
    Json(payload): Json<CreateTaskComment>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<TaskComment>>), ApiError> {
    let comment = TaskService::new(state.pool().clone())
        .add_comment(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            &payload,
        )
        .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(comment))))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
    Query(query): Query<PageQuery>,
) -> Result<ResponseJson<Page<TaskComment>>, ApiError> {
    let (page, limit, offset) = query.resolve(CHILD_LIST_LIMIT);
    let result = TaskService::new(state.pool().clone())
        .list_comments(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            page,
            limit,
            offset,
        )
        .await?;
    Ok(ResponseJson(result))
}

pub async fn update_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id, comment_id)): Path<(String, Uuid, Uuid, Uuid)>,
    Json(payload): Json<UpdateTaskComment>,
) -> Result<ResponseJson<ApiResponse<TaskComment>>, ApiError> {
    let comment = TaskService::new(state.pool().clone())
        .update_comment(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            comment_id,
            &payload,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id, comment_id)): Path<(String, Uuid, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    TaskService::new(state.pool().clone())
        .delete_comment(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            comment_id,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

// ---------------------------------------------------------------------
// Attachments
// ---------------------------------------------------------------------

pub async fn add_attachment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
    Json(payload): Json<CreateTaskAttachment>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<TaskAttachment>>), ApiError> {
    let attachment = TaskService::new(state.pool().clone())
        .add_attachment(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            &payload,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(attachment)),
    ))
}

pub async fn list_attachments(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskAttachment>>>, ApiError> {
    let attachments = TaskService::new(state.pool().clone())
        .list_attachments(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(attachments)))
}

pub async fn delete_attachment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id, attachment_id)): Path<(String, Uuid, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    TaskService::new(state.pool().clone())
        .delete_attachment(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            attachment_id,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

// ---------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------

pub async fn list_activities(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
    Query(query): Query<PageQuery>,
) -> Result<ResponseJson<Page<TaskActivity>>, ApiError> {
    let (page, limit, offset) = query.resolve(CHILD_LIST_LIMIT);
    let result = TaskService::new(state.pool().clone())
        .list_activities(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            page,
            limit,
            offset,
        )
        .await?;
    Ok(ResponseJson(result))
}

// ---------------------------------------------------------------------
// Dependencies
// ---------------------------------------------------------------------

pub async fn add_dependency(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
    Json(payload): Json<CreateTaskDependency>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<TaskDependency>>), ApiError> {
    let dependency = TaskService::new(state.pool().clone())
        .add_dependency(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            &payload,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(dependency)),
    ))
}

pub async fn get_dependencies(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<DependencyLinks>>, ApiError> {
    let links = TaskService::new(state.pool().clone())
        .get_dependencies(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(links)))
}

pub async fn remove_dependency(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id, dependency_id)): Path<(String, Uuid, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    TaskService::new(state.pool().clone())
        .remove_dependency(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            dependency_id,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

// ---------------------------------------------------------------------
// Time tracking
// ---------------------------------------------------------------------

pub async fn log_time(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
    Json(payload): Json<CreateTaskTimeLog>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<TaskTimeLog>>), ApiError> {
    let time_log = TaskService::new(state.pool().clone())
        .log_time(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            &payload,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(time_log)),
    ))
}

pub async fn list_time_logs(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id)): Path<(String, Uuid, Uuid)>,
    Query(query): Query<PageQuery>,
) -> Result<ResponseJson<Page<TaskTimeLog>>, ApiError> {
    let (page, limit, offset) = query.resolve(CHILD_LIST_LIMIT);
    let result = TaskService::new(state.pool().clone())
        .list_time_logs(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            page,
            limit,
            offset,
        )
        .await?;
    Ok(ResponseJson(result))
}

pub async fn update_time_log(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id, time_log_id)): Path<(String, Uuid, Uuid, Uuid)>,
    Json(payload): Json<UpdateTaskTimeLog>,
) -> Result<ResponseJson<ApiResponse<TaskTimeLog>>, ApiError> {
    let time_log = TaskService::new(state.pool().clone())
        .update_time_log(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            time_log_id,
            &payload,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(time_log)))
}

pub async fn delete_time_log(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, task_id, time_log_id)): Path<(String, Uuid, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    TaskService::new(state.pool().clone())
        .delete_time_log(
            identity.user_id,
            identity.organization_id,
            project_id,
            task_id,
            time_log_id,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn time_report(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id)): Path<(String, Uuid)>,
    Query(query): Query<DateRangeQuery>,
) -> Result<ResponseJson<ApiResponse<ProjectTimeReport>>, ApiError> {
    let report = TaskService::new(state.pool().clone())
        .time_report(
            identity.user_id,
            identity.organization_id,
            project_id,
            query.start_date,
            query.end_date,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/tasks",
            get(list_tasks).post(create_task),
        )
        .route("/projects/{project_id}/tasks/time-report", get(time_report))
        .route(
            "/projects/{project_id}/tasks/{task_id}",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}/comments",
            get(list_comments).post(add_comment),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}/comments/{comment_id}",
            axum::routing::put(update_comment).delete(delete_comment),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}/attachments",
            get(list_attachments).post(add_attachment),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}/attachments/{attachment_id}",
            axum::routing::delete(delete_attachment),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}/activities",
            get(list_activities),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}/dependencies",
            get(get_dependencies).post(add_dependency),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}/dependencies/{dependency_id}",
            axum::routing::delete(remove_dependency),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}/time-logs",
            get(list_time_logs).post(log_time),
        )
        .route(
            "/projects/{project_id}/tasks/{task_id}/time-logs/{time_log_id}",
            axum::routing::put(update_time_log).delete(delete_time_log),
        )
}
