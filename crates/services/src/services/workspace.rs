use db::models::{
    user::User,
    workspace::{CreateWorkspace, UpdateWorkspace, Workspace},
    workspace_member::{MemberWithUser, WorkspaceMember, WorkspaceRole},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use thiserror::Error;
use utils::response::Page;
use uuid::Uuid;

use super::policy::{self, RoleRequirement};

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Workspace not found")]
    WorkspaceNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Member not found")]
    MemberNotFound,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct InviteMember {
    pub email: String,
    pub role: WorkspaceRole,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMemberRole {
    pub role: WorkspaceRole,
}

#[derive(Clone)]
pub struct WorkspaceService {
    pool: SqlitePool,
}

impl WorkspaceService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Active membership or a typed Forbidden.
    async fn require_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<WorkspaceMember, WorkspaceError> {
        WorkspaceMember::find_active(&self.pool, workspace_id, user_id)
            .await?
            .ok_or_else(|| {
                WorkspaceError::Forbidden("You are not a member of this workspace".to_string())
            })
    }

    async fn require_role(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
        requirement: RoleRequirement,
        denial: &str,
    ) -> Result<WorkspaceMember, WorkspaceError> {
        let membership = self.require_member(workspace_id, user_id).await?;
        if !policy::role_satisfies(membership.role, requirement) {
            return Err(WorkspaceError::Forbidden(denial.to_string()));
        }
        Ok(membership)
    }

    /// Creates the workspace and seeds the creator as its owner member in one
    /// transaction.
    pub async fn create_workspace(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        data: &CreateWorkspace,
    ) -> Result<Workspace, WorkspaceError> {
        let mut tx = self.pool.begin().await?;
        let workspace = Workspace::create(
            &mut *tx,
            data,
            Uuid::new_v4(),
            organization_id,
            user_id,
        )
        .await?;
        WorkspaceMember::create(
            &mut *tx,
            Uuid::new_v4(),
            workspace.id,
            user_id,
            WorkspaceRole::Owner,
            user_id,
        )
        .await?;
        tx.commit().await?;
        Ok(workspace)
    }

    pub async fn list_workspaces(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        page: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Workspace>, WorkspaceError> {
        let total = Workspace::count_for_member(&self.pool, organization_id, user_id).await?;
        let data =
            Workspace::list_for_member(&self.pool, organization_id, user_id, limit, offset).await?;
        Ok(Page::new(data, total, page, limit))
    }

    pub async fn get_workspace(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Workspace, WorkspaceError> {
        self.require_member(workspace_id, user_id).await?;
        Workspace::find_by_id(&self.pool, workspace_id, organization_id)
            .await?
            .ok_or(WorkspaceError::WorkspaceNotFound)
    }

    pub async fn update_workspace(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        workspace_id: Uuid,
        data: &UpdateWorkspace,
    ) -> Result<Workspace, WorkspaceError> {
        self.require_role(
            workspace_id,
            user_id,
            RoleRequirement::Admin,
            "You do not have permission to update this workspace",
        )
        .await?;
        Workspace::find_by_id(&self.pool, workspace_id, organization_id)
            .await?
            .ok_or(WorkspaceError::WorkspaceNotFound)?;
        Ok(Workspace::update(&self.pool, workspace_id, organization_id, data).await?)
    }

    pub async fn delete_workspace(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<(), WorkspaceError> {
        self.require_role(
            workspace_id,
            user_id,
            RoleRequirement::Owner,
            "Only the workspace owner can delete the workspace",
        )
        .await?;
        let deleted = Workspace::delete(&self.pool, workspace_id, organization_id).await?;
        if deleted == 0 {
            return Err(WorkspaceError::WorkspaceNotFound);
        }
        Ok(())
    }

    pub async fn invite_member(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        workspace_id: Uuid,
        data: &InviteMember,
    ) -> Result<WorkspaceMember, WorkspaceError> {
        self.require_role(
            workspace_id,
            user_id,
            RoleRequirement::Admin,
            "You do not have permission to invite members",
        )
        .await?;
        Workspace::find_by_id(&self.pool, workspace_id, organization_id)
            .await?
            .ok_or(WorkspaceError::WorkspaceNotFound)?;

        let invitee = User::find_by_email(&self.pool, &data.email)
            .await?
            .ok_or(WorkspaceError::UserNotFound)?;

        match WorkspaceMember::find_pair(&self.pool, workspace_id, invitee.id).await? {
            Some(existing) if existing.is_active => Err(WorkspaceError::Conflict(
                "User is already a member of this workspace".to_string(),
            )),
            Some(existing) => {
                Ok(WorkspaceMember::reactivate(&self.pool, existing.id, data.role).await?)
            }
            None => Ok(WorkspaceMember::create(
                &self.pool,
                Uuid::new_v4(),
                workspace_id,
                invitee.id,
                data.role,
                user_id,
            )
            .await?),
        }
    }

    pub async fn update_member_role(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
        member_id: Uuid,
        data: &UpdateMemberRole,
    ) -> Result<WorkspaceMember, WorkspaceError> {
        self.require_role(
            workspace_id,
            user_id,
            RoleRequirement::Admin,
            "You do not have permission to update member roles",
        )
        .await?;

        let member = WorkspaceMember::find_by_id(&self.pool, member_id, workspace_id)
            .await?
            .ok_or(WorkspaceError::MemberNotFound)?;

        if member.role == WorkspaceRole::Owner && data.role != WorkspaceRole::Owner {
            return Err(WorkspaceError::Forbidden(
                "Cannot change owner role".to_string(),
            ));
        }

        Ok(WorkspaceMember::update_role(&self.pool, member.id, data.role).await?)
    }

    pub async fn remove_member(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
        member_id: Uuid,
    ) -> Result<(), WorkspaceError> {
        self.require_role(
            workspace_id,
            user_id,
            RoleRequirement::Admin,
            "You do not have permission to remove members",
        )
        .await?;

        let member = WorkspaceMember::find_by_id(&self.pool, member_id, workspace_id)
            .await?
            .ok_or(WorkspaceError::MemberNotFound)?;

        if member.role == WorkspaceRole::Owner {
            return Err(WorkspaceError::Forbidden(
                "Cannot remove workspace owner".to_string(),
            ));
        }

        WorkspaceMember::delete(&self.pool, member.id).await?;
        Ok(())
    }

    pub async fn list_members(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<Vec<MemberWithUser>, WorkspaceError> {
        self.require_member(workspace_id, user_id).await?;
        Ok(WorkspaceMember::list_active(&self.pool, workspace_id).await?)
    }
}
