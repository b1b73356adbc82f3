use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    workspace::{CreateWorkspace, UpdateWorkspace, Workspace},
    workspace_member::{MemberWithUser, WorkspaceMember},
};
use services::services::workspace::{InviteMember, UpdateMemberRole, WorkspaceService};
use utils::response::{ApiResponse, Page, PageQuery};
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::Identity};

pub async fn create_workspace(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateWorkspace>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Workspace>>), ApiError> {
    let workspace = WorkspaceService::new(state.pool().clone())
        .create_workspace(identity.user_id, identity.organization_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(workspace))))
}

pub async fn list_workspaces(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<PageQuery>,
) -> Result<ResponseJson<Page<Workspace>>, ApiError> {
    let (page, limit, offset) = query.resolve(PageQuery::DEFAULT_LIMIT);
    let result = WorkspaceService::new(state.pool().clone())
        .list_workspaces(identity.user_id, identity.organization_id, page, limit, offset)
        .await?;
    Ok(ResponseJson(result))
}

pub async fn get_workspace(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, workspace_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Workspace>>, ApiError> {
    let workspace = WorkspaceService::new(state.pool().clone())
        .get_workspace(identity.user_id, identity.organization_id, workspace_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(workspace)))
}

pub async fn update_workspace(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, workspace_id)): Path<(String, Uuid)>,
    Json(payload): Json<UpdateWorkspace>,
) -> Result<ResponseJson<ApiResponse<Workspace>>, ApiError> {
    let workspace = WorkspaceService::new(state.pool().clone())
        .update_workspace(
            identity.user_id,
            identity.organization_id,
            workspace_id,
            &payload,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(workspace)))
}

pub async fn delete_workspace(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, workspace_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    WorkspaceService::new(state.pool().clone())
        .delete_workspace(identity.user_id, identity.organization_id, workspace_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn invite_member(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, workspace_id)): Path<(String, Uuid)>,
    Json(payload): Json<InviteMember>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<WorkspaceMember>>), ApiError> {
    let member = WorkspaceService::new(state.pool().clone())
        .invite_member(
            identity.user_id,
            identity.organization_id,
            workspace_id,
            &payload,
        )
        .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(member))))
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, workspace_id)): Path<(String, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Vec<MemberWithUser>>>, ApiError> {
    let members = WorkspaceService::new(state.pool().clone())
        .list_members(identity.user_id, workspace_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(members)))
}

pub async fn update_member_role(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, workspace_id, member_id)): Path<(String, Uuid, Uuid)>,
    Json(payload): Json<UpdateMemberRole>,
) -> Result<ResponseJson<ApiResponse<WorkspaceMember>>, ApiError> {
    let member = WorkspaceService::new(state.pool().clone())
        .update_member_role(identity.user_id, workspace_id, member_id, &payload)
        .await?;
    Ok(ResponseJson(ApiResponse::success(member)))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, workspace_id, member_id)): Path<(String, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    WorkspaceService::new(state.pool().clone())
        .remove_member(identity.user_id, workspace_id, member_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/workspaces",
            get(list_workspaces).post(create_workspace),
        )
        .route(
            "/workspaces/{workspace_id}",
            get(get_workspace)
                .put(update_workspace)
                .delete(delete_workspace),
        )
        .route(
            "/workspaces/{workspace_id}/members",
            get(list_members).post(invite_member),
        )
        .route(
            "/workspaces/{workspace_id}/members/{member_id}",
            axum::routing::put(update_member_role).delete(remove_member),
        )
}
