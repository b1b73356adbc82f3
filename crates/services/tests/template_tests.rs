//! Template instantiation: project templates copy their tasks, workspace
//! templates build a whole workspace with matched task sets.

use db::models::{
    organization::Organization,
    project::Project,
    project_template::{CreateProjectTemplate, CreateProjectTemplateTask, ProjectTemplate},
    task::{Task, TaskFilters, TaskPriority, TaskStatus},
    user::{CreateUser, User},
    workspace_member::{WorkspaceMember, WorkspaceRole},
    workspace_template::{CreateWorkspaceTemplate, CreateWorkspaceTemplateProject},
};
use services::services::{
    project_template::{ProjectTemplateService, TemplateError, UseProjectTemplate},
    workspace_template::{UseWorkspaceTemplate, WorkspaceTemplateService},
};
use sqlx::SqlitePool;
use uuid::Uuid;

struct Ctx {
    pool: SqlitePool,
    org: Uuid,
    user: User,
    other_user: User,
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
    let other_user = User::create(
        &pool,
        &CreateUser {
            email: "grace@acme.test".to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .expect("other user");
    Ctx {
        pool,
        org: org.id,
        user,
        other_user,
    }
}

fn backlog_template() -> CreateProjectTemplate {
    CreateProjectTemplate {
        name: "Product Backlog".to_string(),
        description: Some("Standard backlog".to_string()),
        category: Some("backlog".to_string()),
        is_public: Some(false),
        tasks: Some(vec![
            CreateProjectTemplateTask {
                title: "Groom backlog".to_string(),
                description: None,
                status: Some(TaskStatus::Todo),
                priority: Some(TaskPriority::High),
                sort_order: None,
                tags: Some(vec!["planning".to_string()]),
            },
            CreateProjectTemplateTask {
                title: "Estimate stories".to_string(),
                description: None,
                status: None,
                priority: None,
                sort_order: None,
                tags: None,
            },
        ]),
    }
}

#[tokio::test]
async fn using_a_project_template_copies_tasks_and_bumps_usage() {
    let ctx = setup().await;
    let service = ProjectTemplateService::new(ctx.pool.clone());
    let template = service
        .create_template(ctx.user.id, ctx.org, &backlog_template())
        .await
        .expect("template");
    assert_eq!(template.tasks.len(), 2);

    let project = service
        .use_template(
            ctx.user.id,
            ctx.org,
            &UseProjectTemplate {
                template_id: template.template.id,
                project_name: Some("Q4 Backlog".to_string()),
                workspace_id: None,
            },
        )
        .await
        .expect("use");
    assert_eq!(project.name, "Q4 Backlog");

    let tasks = Task::list(
        &ctx.pool,
        ctx.org,
        project.id,
        &TaskFilters::default(),
        50,
        0,
    )
    .await
    .expect("tasks");
    assert_eq!(tasks.len(), 2);
    let groom = tasks
        .iter()
        .find(|t| t.title == "Groom backlog")
        .expect("groom task");
    assert_eq!(groom.priority, TaskPriority::High);
    assert_eq!(groom.tags.0, vec!["planning".to_string()]);

    let refreshed = ProjectTemplate::find_visible(&ctx.pool, template.template.id, ctx.org)
        .await
        .expect("lookup")
        .expect("template");
    assert_eq!(refreshed.usage_count, 1);
}

#[tokio::test]
async fn templates_are_visible_to_owners_and_public_readers_only() {
    let ctx = setup().await;
    let service = ProjectTemplateService::new(ctx.pool.clone());
    let template = service
        .create_template(ctx.user.id, ctx.org, &backlog_template())
        .await
        .expect("template");

    let other_org = Organization::create(&ctx.pool, Uuid::new_v4(), "Globex", "globex")
        .await
        .expect("org");
    let err = service
        .get_template(other_org.id, template.template.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::TemplateNotFound));
}

#[tokio::test]
async fn only_the_creator_deletes_a_template() {
    let ctx = setup().await;
    let service = ProjectTemplateService::new(ctx.pool.clone());
    let template = service
        .create_template(ctx.user.id, ctx.org, &backlog_template())
        .await
        .expect("template");

    let err = service
        .delete_template(ctx.other_user.id, ctx.org, template.template.id)
        .await
        .unwrap_err();
    assert!(matches!(err, TemplateError::DeleteDenied));

    service
        .delete_template(ctx.user.id, ctx.org, template.template.id)
        .await
        .expect("delete");
}

#[tokio::test]
async fn workspace_template_instantiates_projects_and_owner_membership() {
    let ctx = setup().await;

    // A project template the first workspace project should match by name.
    ProjectTemplateService::new(ctx.pool.clone())
        .create_template(ctx.user.id, ctx.org, &backlog_template())
        .await
        .expect("project template");

    let service = WorkspaceTemplateService::new(ctx.pool.clone());
    let template = service
        .create_template(
            ctx.user.id,
            ctx.org,
            &CreateWorkspaceTemplate {
                name: "Scrum Starter".to_string(),
                description: None,
                category: Some("scrum".to_string()),
                is_public: Some(false),
                projects: Some(vec![
                    CreateWorkspaceTemplateProject {
                        name: "Product Backlog".to_string(),
                        description: None,
                        project_template_id: None,
                        sort_order: None,
                    },
                    CreateWorkspaceTemplateProject {
                        name: "Robotics Lab".to_string(),
                        description: None,
                        project_template_id: None,
                        sort_order: None,
                    },
                ]),
            },
        )
        .await
        .expect("workspace template");

    let workspace = service
        .use_template(
            ctx.user.id,
            ctx.org,
            &UseWorkspaceTemplate {
                template_id: template.template.id,
                workspace_name: Some("Delivery".to_string()),
            },
        )
        .await
        .expect("use");
    assert_eq!(workspace.name, "Delivery");

    let membership = WorkspaceMember::find_active(&ctx.pool, workspace.id, ctx.user.id)
        .await
        .expect("lookup")
        .expect("membership");
    assert_eq!(membership.role, WorkspaceRole::Owner);

    let projects = Project::list_by_workspace(&ctx.pool, ctx.org, workspace.id)
        .await
        .expect("projects");
    assert_eq!(projects.len(), 2);

    let backlog = projects
        .iter()
        .find(|p| p.name == "Product Backlog")
        .expect("backlog project");
    let backlog_tasks = Task::list(
        &ctx.pool,
        ctx.org,
        backlog.id,
        &TaskFilters::default(),
        50,
        0,
    )
    .await
    .expect("tasks");
    assert_eq!(backlog_tasks.len(), 2, "matched template seeds its tasks");

    // The scrum category mapping still pairs the unmatched name with the
    // backlog template, so it gets the same task set.
    let robotics = projects
        .iter()
        .find(|p| p.name == "Robotics Lab")
        .expect("robotics project");
    let robotics_tasks = Task::list(
        &ctx.pool,
        ctx.org,
        robotics.id,
        &TaskFilters::default(),
        50,
        0,
    )
    .await
    .expect("tasks");
    assert_eq!(robotics_tasks.len(), 2);
}

#[tokio::test]
async fn unmatched_projects_start_empty() {
    let ctx = setup().await;
    let service = WorkspaceTemplateService::new(ctx.pool.clone());
    let template = service
        .create_template(
            ctx.user.id,
            ctx.org,
            &CreateWorkspaceTemplate {
                name: "Freestyle".to_string(),
                description: None,
                category: Some("custom".to_string()),
                is_public: None,
                projects: Some(vec![CreateWorkspaceTemplateProject {
                    name: "Robotics".to_string(),
                    description: None,
                    project_template_id: None,
                    sort_order: None,
                }]),
            },
        )
        .await
        .expect("template");

    let workspace = service
        .use_template(
            ctx.user.id,
            ctx.org,
            &UseWorkspaceTemplate {
                template_id: template.template.id,
                workspace_name: None,
            },
        )
        .await
        .expect("use");
    assert_eq!(workspace.name, "Freestyle");

    let projects = Project::list_by_workspace(&ctx.pool, ctx.org, workspace.id)
        .await
        .expect("projects");
    assert_eq!(projects.len(), 1);

    let tasks = Task::list(
        &ctx.pool,
        ctx.org,
        projects[0].id,
        &TaskFilters::default(),
        50,
        0,
    )
    .await
    .expect("tasks");
    assert!(tasks.is_empty());
}
