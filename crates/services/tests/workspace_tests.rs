//! Workspace membership lifecycle and the role checks that gate it.

use db::models::{
    organization::Organization,
    user::{CreateUser, User},
    workspace::{CreateWorkspace, UpdateWorkspace},
    workspace_member::{WorkspaceMember, WorkspaceRole},
};
use services::services::{
    project::{ProjectError, ProjectService},
    workspace::{InviteMember, UpdateMemberRole, WorkspaceError, WorkspaceService},
};
use sqlx::SqlitePool;
use uuid::Uuid;

struct Ctx {
    pool: SqlitePool,
    org: Uuid,
    owner: User,
    member: User,
}

async fn seed_user(pool: &SqlitePool, email: &str, first: &str, last: &str) -> User {
    User::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
        },
        Uuid::new_v4(),
    )
    .await
    .expect("user")
}

async fn setup() -> Ctx {
    let pool = db::db::start_test_db().await.expect("test db");
    let org = Organization::create(&pool, Uuid::new_v4(), "Acme", "acme")
        .await
        .expect("org");
    let owner = seed_user(&pool, "owner@acme.test", "Olive", "Owner").await;
    let member = seed_user(&pool, "member@acme.test", "Miles", "Member").await;
    Ctx {
        pool,
        org: org.id,
        owner,
        member,
    }
}

fn workspace_data(name: &str) -> CreateWorkspace {
    CreateWorkspace {
        name: name.to_string(),
        description: None,
        color: None,
        logo_url: None,
        owner_id: None,
    }
}

#[tokio::test]
async fn creating_a_workspace_seeds_the_owner_membership() {
    let ctx = setup().await;
    let workspace = WorkspaceService::new(ctx.pool.clone())
        .create_workspace(ctx.owner.id, ctx.org, &workspace_data("Engineering"))
        .await
        .expect("workspace");

    let membership = WorkspaceMember::find_active(&ctx.pool, workspace.id, ctx.owner.id)
        .await
        .expect("lookup")
        .expect("membership");
    assert_eq!(membership.role, WorkspaceRole::Owner);
    assert_eq!(workspace.owner_id, Some(ctx.owner.id));
}

#[tokio::test]
async fn non_members_cannot_see_the_workspace() {
    let ctx = setup().await;
    let service = WorkspaceService::new(ctx.pool.clone());
    let workspace = service
        .create_workspace(ctx.owner.id, ctx.org, &workspace_data("Engineering"))
        .await
        .expect("workspace");

    let err = service
        .get_workspace(ctx.member.id, ctx.org, workspace.id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::Forbidden(_)));

    let page = service
        .list_workspaces(ctx.member.id, ctx.org, 1, 20, 0)
        .await
        .expect("list");
    assert_eq!(page.meta.total, 0);
}

#[tokio::test]
async fn invite_conflicts_for_active_members_and_reactivates_inactive_rows() {
    let ctx = setup().await;
    let service = WorkspaceService::new(ctx.pool.clone());
    let workspace = service
        .create_workspace(ctx.owner.id, ctx.org, &workspace_data("Engineering"))
        .await
        .expect("workspace");

    let invite = InviteMember {
        email: ctx.member.email.clone(),
        role: WorkspaceRole::Member,
    };
    let created = service
        .invite_member(ctx.owner.id, ctx.org, workspace.id, &invite)
        .await
        .expect("invite");
    assert_eq!(created.role, WorkspaceRole::Member);

    let err = service
        .invite_member(ctx.owner.id, ctx.org, workspace.id, &invite)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::Conflict(_)));

    // Deactivate out-of-band, then a fresh invite reuses the row.
    sqlx::query("UPDATE workspace_members SET is_active = 0 WHERE id = $1")
        .bind(created.id)
        .execute(&ctx.pool)
        .await
        .expect("deactivate");
    let reactivated = service
        .invite_member(
            ctx.owner.id,
            ctx.org,
            workspace.id,
            &InviteMember {
                email: ctx.member.email.clone(),
                role: WorkspaceRole::Admin,
            },
        )
        .await
        .expect("reinvite");
    assert_eq!(reactivated.id, created.id);
    assert_eq!(reactivated.role, WorkspaceRole::Admin);
    assert!(reactivated.is_active);
}

#[tokio::test]
async fn owner_role_cannot_be_changed_or_removed() {
    let ctx = setup().await;
    let service = WorkspaceService::new(ctx.pool.clone());
    let workspace = service
        .create_workspace(ctx.owner.id, ctx.org, &workspace_data("Engineering"))
        .await
        .expect("workspace");

    let owner_member = WorkspaceMember::find_active(&ctx.pool, workspace.id, ctx.owner.id)
        .await
        .expect("lookup")
        .expect("membership");

    let err = service
        .update_member_role(
            ctx.owner.id,
            workspace.id,
            owner_member.id,
            &UpdateMemberRole {
                role: WorkspaceRole::Member,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::Forbidden(_)));

    let err = service
        .remove_member(ctx.owner.id, workspace.id, owner_member.id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::Forbidden(_)));
}

#[tokio::test]
async fn plain_members_cannot_administer_the_workspace() {
    let ctx = setup().await;
    let service = WorkspaceService::new(ctx.pool.clone());
    let workspace = service
        .create_workspace(ctx.owner.id, ctx.org, &workspace_data("Engineering"))
        .await
        .expect("workspace");
    service
        .invite_member(
            ctx.owner.id,
            ctx.org,
            workspace.id,
            &InviteMember {
                email: ctx.member.email.clone(),
                role: WorkspaceRole::Member,
            },
        )
        .await
        .expect("invite");

    let err = service
        .update_workspace(
            ctx.member.id,
            ctx.org,
            workspace.id,
            &UpdateWorkspace {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::Forbidden(_)));

    let err = service
        .delete_workspace(ctx.member.id, ctx.org, workspace.id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::Forbidden(_)));
}

#[tokio::test]
async fn member_without_ownership_cannot_update_a_project() {
    let ctx = setup().await;
    let workspaces = WorkspaceService::new(ctx.pool.clone());
    let workspace = workspaces
        .create_workspace(ctx.owner.id, ctx.org, &workspace_data("Engineering"))
        .await
        .expect("workspace");
    workspaces
        .invite_member(
            ctx.owner.id,
            ctx.org,
            workspace.id,
            &InviteMember {
                email: ctx.member.email.clone(),
                role: WorkspaceRole::Member,
            },
        )
        .await
        .expect("invite");

    let projects = ProjectService::new(ctx.pool.clone());
    let project = projects
        .create_project(
            ctx.owner.id,
            ctx.org,
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

    let err = projects
        .update_project(
            ctx.member.id,
            ctx.org,
            project.id,
            &db::models::project::UpdateProject {
                name: Some("Mine now".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProjectError::Forbidden(_)));
}

#[tokio::test]
async fn deleting_a_workspace_cascades_memberships() {
    let ctx = setup().await;
    let service = WorkspaceService::new(ctx.pool.clone());
    let workspace = service
        .create_workspace(ctx.owner.id, ctx.org, &workspace_data("Engineering"))
        .await
        .expect("workspace");

    service
        .delete_workspace(ctx.owner.id, ctx.org, workspace.id)
        .await
        .expect("delete");

    let remaining: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM workspace_members WHERE workspace_id = $1")
            .bind(workspace.id)
            .fetch_one(&ctx.pool)
            .await
            .expect("count");
    assert_eq!(remaining, 0);
}
