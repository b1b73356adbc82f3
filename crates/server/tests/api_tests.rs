//! End-to-end router tests: identity gating, envelope shapes and the main
//! error statuses.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use db::models::{
    organization::Organization,
    user::{CreateUser, User},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use server::{AppState, config::ServerConfig, routes};
use tower::ServiceExt;
use uuid::Uuid;

struct TestApp {
    router: Router,
    org: Uuid,
    user: User,
}

async fn spawn_app() -> TestApp {
    let pool = db::db::start_test_db().await.expect("test db");
    let org = Organization::create(&pool, Uuid::new_v4(), "Acme", "acme")
        .await
        .expect("org");
    let user = User::create(
        &pool,
        &CreateUser {
            email: "ada@acme.test".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .expect("user");

    let state = AppState::new(pool, ServerConfig::from_env());
    TestApp {
        router: routes::router(state),
        org: org.id,
        user,
    }
}

impl TestApp {
    fn request(&self, method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", self.user.id.to_string())
            .header("x-organization-id", self.org.to_string())
            .header(CONTENT_TYPE, "application/json");
        match body {
            Some(value) => builder.body(Body::from(value.to_string())).unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("response");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("body").to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}

#[tokio::test]
async fn health_is_open_but_the_api_requires_identity() {
    let app = spawn_app().await;

    let (status, _) = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(
            Request::builder()
                .uri("/apps/mero-board/workspaces")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn workspace_crud_round_trip() {
    let app = spawn_app().await;

    let (status, body) = app
        .send(app.request(
            "POST",
            "/apps/mero-board/workspaces",
            Some(json!({ "name": "Engineering" })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    let workspace_id = body["data"]["id"].as_str().expect("workspace id").to_string();

    let (status, body) = app
        .send(app.request("GET", "/apps/mero-board/workspaces", None))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], json!(1));
    assert_eq!(body["data"][0]["id"], json!(workspace_id));
    assert_eq!(body["meta"]["total_pages"], json!(1));
}

#[tokio::test]
async fn missing_project_maps_to_not_found() {
    let app = spawn_app().await;

    let uri = format!("/apps/mero-board/projects/{}", Uuid::new_v4());
    let (status, body) = app.send(app.request("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn dependency_conflicts_map_to_conflict_status() {
    let app = spawn_app().await;

    let (_, body) = app
        .send(app.request(
            "POST",
            "/apps/mero-board/projects",
            Some(json!({ "name": "Platform" })),
        ))
        .await;
    let project_id = body["data"]["id"].as_str().expect("project id").to_string();

    let tasks_uri = format!("/apps/mero-board/projects/{project_id}/tasks");
    let (_, body) = app
        .send(app.request("POST", &tasks_uri, Some(json!({ "title": "A" }))))
        .await;
    let task_a = body["data"]["id"].as_str().expect("task a").to_string();
    let (_, body) = app
        .send(app.request("POST", &tasks_uri, Some(json!({ "title": "B" }))))
        .await;
    let task_b = body["data"]["id"].as_str().expect("task b").to_string();

    let deps_uri = format!("{tasks_uri}/{task_a}/dependencies");
    let (status, _) = app
        .send(app.request(
            "POST",
            &deps_uri,
            Some(json!({ "depends_on_task_id": task_b })),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let reverse_uri = format!("{tasks_uri}/{task_b}/dependencies");
    let (status, body) = app
        .send(app.request(
            "POST",
            &reverse_uri,
            Some(json!({ "depends_on_task_id": task_a })),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn task_update_returns_the_updated_record() {
    let app = spawn_app().await;

    let (_, body) = app
        .send(app.request(
            "POST",
            "/apps/mero-board/projects",
            Some(json!({ "name": "Platform" })),
        ))
        .await;
    let project_id = body["data"]["id"].as_str().expect("project id").to_string();

    let tasks_uri = format!("/apps/mero-board/projects/{project_id}/tasks");
    let (_, body) = app
        .send(app.request("POST", &tasks_uri, Some(json!({ "title": "A" }))))
        .await;
    let task_id = body["data"]["id"].as_str().expect("task id").to_string();

    let task_uri = format!("{tasks_uri}/{task_id}");
    let (status, body) = app
        .send(app.request("PUT", &task_uri, Some(json!({ "priority": "high" }))))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["priority"], json!("high"));

    let activities_uri = format!("{task_uri}/activities");
    let (status, body) = app.send(app.request("GET", &activities_uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    let kinds: Vec<&str> = body["data"]
        .as_array()
        .expect("activities")
        .iter()
        .filter_map(|a| a["activity_type"].as_str())
        .collect();
    assert!(kinds.contains(&"priority_changed"));
}
