use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::project::{CreateProject, Project, UpdateProject};
use serde::Deserialize;
use services::services::project::ProjectService;
use utils::response::{ApiResponse, Page, PageQuery};
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::Identity};

#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub workspace_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn create_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateProject>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Project>>), ApiError> {
    let project = ProjectService::new(state.pool().clone())
        .create_project(identity.user_id, identity.organization_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(project))))
}

pub async fn list_projects(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ProjectListQuery>,
) -> Result<ResponseJson<Page<Project>>, ApiError> {
    let (page, limit, offset) = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .resolve(PageQuery::DEFAULT_LIMIT);
    let result = ProjectService::new(state.pool().clone())
        .list_projects(
            identity.user_id,
            identity.organization_id,
            query.workspace_id,
            page,
            limit,
            offset,
        )
        .await?;
    Ok(ResponseJson(result))
}

pub async fn get_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = ProjectService::new(state.pool().clone())
        .get_project(identity.user_id, identity.organization_id, project_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateProject>,
) -> Result<ResponseJson<ApiResponse<Project>>, ApiError> {
    let project = ProjectService::new(state.pool().clone())
        .update_project(
            identity.user_id,
            identity.organization_id,
            project_id,
            &payload,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(project)))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    ProjectService::new(state.pool().clone())
        .delete_project(identity.user_id, identity.organization_id, project_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/{project_id}",
            get(get_project).put(update_project).delete(delete_project),
        )
}
