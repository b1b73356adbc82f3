use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::epic::{CreateEpic, Epic, UpdateEpic};
use services::services::epic::EpicService;
use utils::response::{ApiResponse, Page, PageQuery};
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::Identity};

pub async fn create_epic(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id)): Path<(String, Uuid)>,
    Json(payload): Json<CreateEpic>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<Epic>>), ApiError> {
    let epic = EpicService::new(state.pool().clone())
        .create_epic(
            identity.user_id,
            identity.organization_id,
            project_id,
            &payload,
        )
        .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(epic))))
}

pub async fn list_epics(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id)): Path<(String, Uuid)>,
    Query(query): Query<PageQuery>,
) -> Result<ResponseJson<Page<Epic>>, ApiError> {
    let (page, limit, offset) = query.resolve(PageQuery::DEFAULT_LIMIT);
    let result = EpicService::new(state.pool().clone())
        .list_epics(
            identity.user_id,
            identity.organization_id,
            project_id,
            page,
            limit,
            offset,
        )
        .await?;
    Ok(ResponseJson(result))
}

pub async fn get_epic(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, epic_id)): Path<(String, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Epic>>, ApiError> {
    let epic = EpicService::new(state.pool().clone())
        .get_epic(identity.user_id, identity.organization_id, project_id, epic_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(epic)))
}

pub async fn update_epic(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, epic_id)): Path<(String, Uuid, Uuid)>,
    Json(payload): Json<UpdateEpic>,
) -> Result<ResponseJson<ApiResponse<Epic>>, ApiError> {
    let epic = EpicService::new(state.pool().clone())
        .update_epic(
            identity.user_id,
            identity.organization_id,
            project_id,
            epic_id,
            &payload,
        )
        .await?;
    Ok(ResponseJson(ApiResponse::success(epic)))
}

pub async fn delete_epic(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path((_app_slug, project_id, epic_id)): Path<(String, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    EpicService::new(state.pool().clone())
        .delete_epic(identity.user_id, identity.organization_id, project_id, epic_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/epics",
            get(list_epics).post(create_epic),
        )
        .route(
            "/projects/{project_id}/epics/{epic_id}",
            get(get_epic).put(update_epic).delete(delete_epic),
        )
}
