//! Report aggregation: zero-task edge case, status/priority breakdowns and
//! minute-to-hour conversions.

use chrono::NaiveDate;
use db::models::{
    organization::Organization,
    task::{CreateTask, TaskPriority, TaskStatus},
    task_time_log::CreateTaskTimeLog,
    user::{CreateUser, User},
    workspace::CreateWorkspace,
    workspace_member::WorkspaceRole,
};
use services::services::{
    project::ProjectService,
    report::{ProductivityScope, ReportService},
    task::TaskService,
    workspace::{InviteMember, WorkspaceService},
};
use sqlx::SqlitePool;
use uuid::Uuid;

struct Ctx {
    pool: SqlitePool,
    org: Uuid,
    owner: User,
    member: User,
    workspace_id: Uuid,
    project_id: Uuid,
}

async fn setup() -> Ctx {
    let pool = db::db::start_test_db().await.expect("test db");
    let org = Organization::create(&pool, Uuid::new_v4(), "Acme", "acme")
        .await
        .expect("org");
    let owner = User::create(
        &pool,
        &CreateUser {
            email: "owner@acme.test".to_string(),
            first_name: "Olive".to_string(),
            last_name: "Owner".to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .expect("owner");
    let member = User::create(
        &pool,
        &CreateUser {
            email: "member@acme.test".to_string(),
            first_name: "Miles".to_string(),
            last_name: "Member".to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .expect("member");

    let workspaces = WorkspaceService::new(pool.clone());
    let workspace = workspaces
        .create_workspace(
            owner.id,
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
    workspaces
        .invite_member(
            owner.id,
            org.id,
            workspace.id,
            &InviteMember {
                email: member.email.clone(),
                role: WorkspaceRole::Member,
            },
        )
        .await
        .expect("invite");

    let project = ProjectService::new(pool.clone())
        .create_project(
            owner.id,
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
        owner,
        member,
        workspace_id: workspace.id,
        project_id: project.id,
    }
}

fn task_with(status: TaskStatus, priority: TaskPriority, assignee: Option<Uuid>) -> CreateTask {
    CreateTask {
        title: format!("{} {}", status.as_str(), priority.as_str()),
        description: None,
        status: Some(status),
        priority: Some(priority),
        epic_id: None,
        assignee_id: assignee,
        assignee_ids: None,
        due_date: None,
        estimated_hours: None,
        actual_hours: None,
        tags: None,
    }
}

#[tokio::test]
async fn empty_project_has_zero_completion_rate() {
    let ctx = setup().await;
    let report = ReportService::new(ctx.pool.clone())
        .project_report(ctx.org, ctx.project_id)
        .await
        .expect("report");

    assert_eq!(report.task_stats.total, 0);
    assert_eq!(report.task_stats.completed, 0);
    assert_eq!(report.task_stats.completion_rate, 0.0);
}

#[tokio::test]
async fn project_report_breaks_down_status_and_priority() {
    let ctx = setup().await;
    let tasks = TaskService::new(ctx.pool.clone());
    for data in [
        task_with(TaskStatus::Todo, TaskPriority::Low, None),
        task_with(TaskStatus::InProgress, TaskPriority::High, None),
        task_with(TaskStatus::Done, TaskPriority::High, None),
        task_with(TaskStatus::Done, TaskPriority::Urgent, None),
    ] {
        tasks
            .create_task(ctx.owner.id, ctx.org, ctx.project_id, &data)
            .await
            .expect("task");
    }

    let report = ReportService::new(ctx.pool.clone())
        .project_report(ctx.org, ctx.project_id)
        .await
        .expect("report");

    assert_eq!(report.task_stats.total, 4);
    assert_eq!(report.task_stats.by_status.todo, 1);
    assert_eq!(report.task_stats.by_status.in_progress, 1);
    assert_eq!(report.task_stats.by_status.done, 2);
    assert_eq!(report.task_stats.by_priority.high, 2);
    assert_eq!(report.task_stats.by_priority.urgent, 1);
    assert_eq!(report.task_stats.completed, 2);
    assert_eq!(report.task_stats.completion_rate, 50.0);
    assert_eq!(report.team_stats.total_members, 2);
}

#[tokio::test]
async fn time_stats_convert_minutes_to_rounded_hours() {
    let ctx = setup().await;
    let tasks = TaskService::new(ctx.pool.clone());
    let task = tasks
        .create_task(
            ctx.owner.id,
            ctx.org,
            ctx.project_id,
            &task_with(TaskStatus::Todo, TaskPriority::Medium, None),
        )
        .await
        .expect("task");

    for (minutes, billable) in [(60, false), (30, true), (10, false)] {
        tasks
            .log_time(
                ctx.owner.id,
                ctx.org,
                ctx.project_id,
                task.id,
                &CreateTaskTimeLog {
                    logged_date: NaiveDate::from_ymd_opt(2026, 8, 3).unwrap(),
                    duration_minutes: minutes,
                    description: None,
                    is_billable: Some(billable),
                },
            )
            .await
            .expect("log");
    }

    let report = ReportService::new(ctx.pool.clone())
        .project_report(ctx.org, ctx.project_id)
        .await
        .expect("report");

    assert_eq!(report.time_stats.total_minutes, 100);
    assert_eq!(report.time_stats.total_hours, 1.67);
    assert_eq!(report.time_stats.billable_hours, 0.5);
}

#[tokio::test]
async fn workspace_report_rolls_up_projects() {
    let ctx = setup().await;
    let projects = ProjectService::new(ctx.pool.clone());
    let second = projects
        .create_project(
            ctx.owner.id,
            ctx.org,
            &db::models::project::CreateProject {
                name: "Second".to_string(),
                description: None,
                workspace_id: Some(ctx.workspace_id),
                status: None,
                owner_id: None,
            },
        )
        .await
        .expect("second project");

    let tasks = TaskService::new(ctx.pool.clone());
    tasks
        .create_task(
            ctx.owner.id,
            ctx.org,
            ctx.project_id,
            &task_with(TaskStatus::Done, TaskPriority::Medium, None),
        )
        .await
        .expect("done task");
    tasks
        .create_task(
            ctx.owner.id,
            ctx.org,
            second.id,
            &task_with(TaskStatus::Todo, TaskPriority::Medium, None),
        )
        .await
        .expect("todo task");

    let report = ReportService::new(ctx.pool.clone())
        .workspace_report(ctx.org, ctx.workspace_id)
        .await
        .expect("report");

    assert_eq!(report.overall_stats.total_projects, 2);
    assert_eq!(report.overall_stats.total_tasks, 2);
    assert_eq!(report.overall_stats.completed_tasks, 1);
    assert_eq!(report.overall_stats.overall_completion_rate, 50.0);

    let empty_free: Vec<_> = report
        .project_stats
        .iter()
        .filter(|stat| stat.total_tasks == 1)
        .collect();
    assert_eq!(empty_free.len(), 2);
}

#[tokio::test]
async fn productivity_report_covers_every_active_member() {
    let ctx = setup().await;
    let tasks = TaskService::new(ctx.pool.clone());
    let assigned = tasks
        .create_task(
            ctx.owner.id,
            ctx.org,
            ctx.project_id,
            &task_with(TaskStatus::Done, TaskPriority::Medium, Some(ctx.member.id)),
        )
        .await
        .expect("done");
    tasks
        .create_task(
            ctx.owner.id,
            ctx.org,
            ctx.project_id,
            &task_with(TaskStatus::Todo, TaskPriority::Medium, Some(ctx.member.id)),
        )
        .await
        .expect("todo");
    tasks
        .log_time(
            ctx.member.id,
            ctx.org,
            ctx.project_id,
            assigned.id,
            &CreateTaskTimeLog {
                logged_date: NaiveDate::from_ymd_opt(2026, 8, 4).unwrap(),
                duration_minutes: 90,
                description: None,
                is_billable: None,
            },
        )
        .await
        .expect("log");

    let report = ReportService::new(ctx.pool.clone())
        .team_productivity(
            ctx.org,
            ProductivityScope::Workspace,
            ctx.workspace_id,
            None,
            None,
        )
        .await
        .expect("report");

    assert_eq!(report.team_members.len(), 2);
    let miles = report
        .team_members
        .iter()
        .find(|m| m.user_id == ctx.member.id)
        .expect("member row");
    assert_eq!(miles.tasks_assigned, 2);
    assert_eq!(miles.tasks_completed, 1);
    assert_eq!(miles.completion_rate, 50.0);
    assert_eq!(miles.time_logged_minutes, 90);
    assert_eq!(miles.time_logged_hours, 1.5);

    let olive = report
        .team_members
        .iter()
        .find(|m| m.user_id == ctx.owner.id)
        .expect("owner row");
    assert_eq!(olive.tasks_assigned, 0);
    assert_eq!(olive.completion_rate, 0.0);
}
