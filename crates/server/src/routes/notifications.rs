use axum::{
    Extension, Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::notification::Notification;
use utils::response::{Page, PageQuery};

use crate::{AppState, error::ApiError, middleware::Identity};

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<PageQuery>,
) -> Result<ResponseJson<Page<Notification>>, ApiError> {
    let (page, limit, offset) = query.resolve(PageQuery::DEFAULT_LIMIT);
    let total =
        Notification::count_for_user(state.pool(), identity.user_id, identity.organization_id)
            .await?;
    let data = Notification::list_for_user(
        state.pool(),
        identity.user_id,
        identity.organization_id,
        limit,
        offset,
    )
    .await?;
    Ok(ResponseJson(Page::new(data, total, page, limit)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/notifications", get(list_notifications))
}
