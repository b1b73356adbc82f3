//! Dependency graph rules: duplicate edges, self-loops, cycle detection and
//! removal from either endpoint.

use db::models::{
    organization::Organization,
    task::{CreateTask, Task},
    task_dependency::{CreateTaskDependency, TaskDependency, TaskDependencyType},
    user::{CreateUser, User},
    workspace::CreateWorkspace,
};
use services::services::{
    project::ProjectService,
    task::{TaskError, TaskService},
    workspace::WorkspaceService,
};
use sqlx::SqlitePool;
use uuid::Uuid;

struct Ctx {
    pool: SqlitePool,
    org: Uuid,
    user: User,
    project_id: Uuid,
}

async fn setup() -> Ctx {
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

    let workspace = WorkspaceService::new(pool.clone())
        .create_workspace(
            user.id,
            org.id,
            &CreateWorkspace {
                name: "Engineering".to_string(),
                description: None,
                color: None,
                logo_url: None,
                owner_id: None,
            },
        )
        .await
        .expect("workspace");

    let project = ProjectService::new(pool.clone())
        .create_project(
            user.id,
            org.id,
            &db::models::project::CreateProject {
                name: "Platform".to_string(),
                description: None,
                workspace_id: Some(workspace.id),
                status: None,
                owner_id: None,
            },
        )
        .await
        .expect("project");

    Ctx {
        pool,
        org: org.id,
        user,
        project_id: project.id,
    }
}

async fn create_task(ctx: &Ctx, title: &str) -> Task {
    TaskService::new(ctx.pool.clone())
        .create_task(
            ctx.user.id,
            ctx.org,
            ctx.project_id,
            &CreateTask {
                title: title.to_string(),
                description: None,
                status: None,
                priority: None,
                epic_id: None,
                assignee_id: None,
                assignee_ids: None,
                due_date: None,
                estimated_hours: None,
                actual_hours: None,
                tags: None,
            },
        )
        .await
        .expect("task")
}

fn depends_on(task_id: Uuid) -> CreateTaskDependency {
    CreateTaskDependency {
        depends_on_task_id: task_id,
        dependency_type: None,
    }
}

#[tokio::test]
async fn self_dependency_is_rejected() {
    let ctx = setup().await;
    let task = create_task(&ctx, "A").await;

    let err = TaskService::new(ctx.pool.clone())
        .add_dependency(ctx.user.id, ctx.org, ctx.project_id, task.id, &depends_on(task.id))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::Validation(_)));
}

#[tokio::test]
async fn duplicate_pair_is_rejected() {
    let ctx = setup().await;
    let a = create_task(&ctx, "A").await;
    let b = create_task(&ctx, "B").await;
    let service = TaskService::new(ctx.pool.clone());

    service
        .add_dependency(ctx.user.id, ctx.org, ctx.project_id, a.id, &depends_on(b.id))
        .await
        .expect("first edge");
    let err = service
        .add_dependency(ctx.user.id, ctx.org, ctx.project_id, a.id, &depends_on(b.id))
        .await
        .unwrap_err();
    match err {
        TaskError::Conflict(message) => assert!(message.contains("already exists")),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn reverse_pair_is_a_cycle() {
    let ctx = setup().await;
    let a = create_task(&ctx, "A").await;
    let b = create_task(&ctx, "B").await;
    let service = TaskService::new(ctx.pool.clone());

    service
        .add_dependency(ctx.user.id, ctx.org, ctx.project_id, a.id, &depends_on(b.id))
        .await
        .expect("forward edge");
    let err = service
        .add_dependency(ctx.user.id, ctx.org, ctx.project_id, b.id, &depends_on(a.id))
        .await
        .unwrap_err();
    match err {
        TaskError::Conflict(message) => assert!(message.contains("Circular")),
        other => panic!("expected circular conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn three_node_cycle_is_detected() {
    let ctx = setup().await;
    let a = create_task(&ctx, "A").await;
    let b = create_task(&ctx, "B").await;
    let c = create_task(&ctx, "C").await;
    let service = TaskService::new(ctx.pool.clone());

    service
        .add_dependency(ctx.user.id, ctx.org, ctx.project_id, a.id, &depends_on(b.id))
        .await
        .expect("a -> b");
    service
        .add_dependency(ctx.user.id, ctx.org, ctx.project_id, b.id, &depends_on(c.id))
        .await
        .expect("b -> c");
    let err = service
        .add_dependency(ctx.user.id, ctx.org, ctx.project_id, c.id, &depends_on(a.id))
        .await
        .unwrap_err();
    match err {
        TaskError::Conflict(message) => assert!(message.contains("Circular")),
        other => panic!("expected circular conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn dependency_links_are_split_by_direction() {
    let ctx = setup().await;
    let a = create_task(&ctx, "A").await;
    let b = create_task(&ctx, "B").await;
    let c = create_task(&ctx, "C").await;
    let service = TaskService::new(ctx.pool.clone());

    let edge = service
        .add_dependency(ctx.user.id, ctx.org, ctx.project_id, a.id, &depends_on(b.id))
        .await
        .expect("a -> b");
    service
        .add_dependency(
            ctx.user.id,
            ctx.org,
            ctx.project_id,
            c.id,
            &CreateTaskDependency {
                depends_on_task_id: a.id,
                dependency_type: Some(TaskDependencyType::Related),
            },
        )
        .await
        .expect("c related a");

    let links_a = service
        .get_dependencies(ctx.user.id, ctx.org, ctx.project_id, a.id)
        .await
        .expect("links for a");
    assert_eq!(links_a.blocking.len(), 1);
    assert_eq!(links_a.blocking[0].id, edge.id);
    assert!(links_a.blocked_by.is_empty());
    assert_eq!(links_a.related.len(), 1);

    let links_b = service
        .get_dependencies(ctx.user.id, ctx.org, ctx.project_id, b.id)
        .await
        .expect("links for b");
    assert!(links_b.blocking.is_empty());
    assert_eq!(links_b.blocked_by.len(), 1);
    assert_eq!(links_b.blocked_by[0].id, edge.id);
}

#[tokio::test]
async fn either_endpoint_may_remove_the_edge() {
    let ctx = setup().await;
    let a = create_task(&ctx, "A").await;
    let b = create_task(&ctx, "B").await;
    let service = TaskService::new(ctx.pool.clone());

    let edge = service
        .add_dependency(ctx.user.id, ctx.org, ctx.project_id, a.id, &depends_on(b.id))
        .await
        .expect("edge");

    // Removing through the dependent side hits the reverse-direction fallback.
    service
        .remove_dependency(ctx.user.id, ctx.org, ctx.project_id, b.id, edge.id)
        .await
        .expect("removed from reverse side");

    assert!(
        TaskDependency::find_pair(&ctx.pool, a.id, b.id)
            .await
            .expect("lookup")
            .is_none()
    );

    let err = service
        .remove_dependency(ctx.user.id, ctx.org, ctx.project_id, a.id, edge.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TaskError::DependencyNotFound));
}
