use axum::{
    Extension, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use chrono::NaiveDate;
use serde::Deserialize;
use services::services::report::{
    ProductivityReport, ProductivityScope, ProjectReport, ReportService, WorkspaceReport,
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::Identity};

#[derive(Debug, Deserialize)]
pub struct ProductivityQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

pub async fn project_report(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<ProjectReport>>, ApiError> {
    let report = ReportService::new(state.pool().clone())
        .project_report(identity.organization_id, project_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub async fn workspace_report(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, workspace_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<WorkspaceReport>>, ApiError> {
    let report = ReportService::new(state.pool().clone())
        .workspace_report(identity.organization_id, workspace_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub async fn workspace_productivity(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, workspace_id)): Path<(String, Uuid)>,
    Query(query): Query<ProductivityQuery>,
) -> Result<ResponseJson<ApiResponse<ProductivityReport>>, ApiError> {
    let report = ReportService::new(state.pool().clone())
        .team_productivity(
            identity.organization_id,
            ProductivityScope::Workspace,
            workspace_id,
            query.start_date,
            query.end_date,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub async fn project_productivity(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id)): Path<(String, Uuid)>,
    Query(query): Query<ProductivityQuery>,
) -> Result<ResponseJson<ApiResponse<ProductivityReport>>, ApiError> {
    let report = ReportService::new(state.pool().clone())
        .team_productivity(
            identity.organization_id,
            ProductivityScope::Project,
            project_id,
            query.start_date,
            query.end_date,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects/{project_id}/report", get(project_report))
        .route(
            "/projects/{project_id}/productivity",
            get(project_productivity),
        )
        .route("/workspaces/{workspace_id}/report", get(workspace_report))
        .route(
            "/workspaces/{workspace_id}/productivity",
            get(workspace_productivity),
        )
}
