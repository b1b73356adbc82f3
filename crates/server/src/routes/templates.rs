use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    project::Project, project_template::CreateProjectTemplate, workspace::Workspace,
    workspace_template::CreateWorkspaceTemplate,
};
use serde::Deserialize;
use services::services::{
    project_template::{ProjectTemplateDetail, ProjectTemplateService, UseProjectTemplate},
    workspace_template::{
        UseWorkspaceTemplate, WorkspaceTemplateDetail, WorkspaceTemplateService,
    },
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::Identity};

#[derive(Debug, Deserialize)]
pub struct TemplateListQuery {
    pub include_public: Option<bool>,
}

// ---------------------------------------------------------------------
// Project templates
// ---------------------------------------------------------------------

pub async fn create_project_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateProjectTemplate>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<ProjectTemplateDetail>>), ApiError> {
    let template = ProjectTemplateService::new(state.pool().clone())
        .create_template(identity.user_id, identity.organization_id, &payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(template)),
    ))
}

pub async fn list_project_templates(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<TemplateListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ProjectTemplateDetail>>>, ApiError> {
    let templates = ProjectTemplateService::new(state.pool().clone())
        .list_templates(
            identity.organization_id,
            query.include_public.unwrap_or(true),
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(templates)))
}

pub async fn get_project_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, template_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<ProjectTemplateDetail>>, ApiError> {
    let template = ProjectTemplateService::new(state.pool().clone())
        .get_template(identity.organization_id, template_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn use_project_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UseProjectTemplate>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Project>>), ApiError> {
    let project = ProjectTemplateService::new(state.pool().clone())
        .use_template(identity.user_id, identity.organization_id, &payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(project)),
    ))
}

pub async fn delete_project_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, template_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    ProjectTemplateService::new(state.pool().clone())
        .delete_template(identity.user_id, identity.organization_id, template_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

// ---------------------------------------------------------------------
// Workspace templates
// ---------------------------------------------------------------------

pub async fn create_workspace_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateWorkspaceTemplate>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<WorkspaceTemplateDetail>>), ApiError> {
    let template = WorkspaceTemplateService::new(state.pool().clone())
        .create_template(identity.user_id, identity.organization_id, &payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(template)),
    ))
}

pub async fn list_workspace_templates(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<TemplateListQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<WorkspaceTemplateDetail>>>, ApiError> {
    let templates = WorkspaceTemplateService::new(state.pool().clone())
        .list_templates(
            identity.organization_id,
            query.include_public.unwrap_or(true),
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(templates)))
}

pub async fn get_workspace_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, template_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<WorkspaceTemplateDetail>>, ApiError> {
    let template = WorkspaceTemplateService::new(state.pool().clone())
        .get_template(identity.organization_id, template_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(template)))
}

pub async fn use_workspace_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<UseWorkspaceTemplate>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Workspace>>), ApiError> {
    let workspace = WorkspaceTemplateService::new(state.pool().clone())
        .use_template(identity.user_id, identity.organization_id, &payload)
        .await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(workspace)),
    ))
}

pub async fn delete_workspace_template(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, template_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    WorkspaceTemplateService::new(state.pool().clone())
        .delete_template(identity.user_id, identity.organization_id, template_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/project-templates",
            get(list_project_templates).post(create_project_template),
        )
        .route("/project-templates/use", post(use_project_template))
        .route(
            "/project-templates/{template_id}",
            get(get_project_template).delete(delete_project_template),
        )
        .route(
            "/workspace-templates",
            get(list_workspace_templates).post(create_workspace_template),
        )
        .route("/workspace-templates/use", post(use_workspace_template))
        .route(
            "/workspace-templates/{template_id}",
            get(get_workspace_template).delete(delete_workspace_template),
        )
}
