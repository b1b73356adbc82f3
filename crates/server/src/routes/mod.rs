use axum::{Router, middleware::from_fn, routing::get};
use tower_http::cors::CorsLayer;

use crate::{AppState, middleware::require_identity};

mod epics;
mod notifications;
mod projects;
mod reports;
mod tasks;
mod templates;
mod workspaces;

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .merge(workspaces::router())
        .merge(projects::router())
        .merge(epics::router())
        .merge(tasks::router())
        .merge(reports::router())
        .merge(templates::router())
        .merge(notifications::router())
        .layer(from_fn(require_identity));

    Router::new()
        .route("/health", get(health))
        .nest("/apps/{app_slug}", api)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
