use db::models::{
    epic::{CreateEpic, Epic, UpdateEpic},
    project::Project,
    workspace_member::WorkspaceMember,
};
use sqlx::SqlitePool;
use thiserror::Error;
use utils::response::Page;
use uuid::Uuid;

use super::policy::{self, RoleRequirement};

#[derive(Debug, Error)]
pub enum EpicError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Project not found")]
    ProjectNotFound,
    #[error("Epic not found")]
    EpicNotFound,
    #[error("{0}")]
    Forbidden(String),
}

#[derive(Clone)]
pub struct EpicService {
    pool: SqlitePool,
}

impl EpicService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Project existence plus workspace membership, the gate shared by every
    /// epic operation.
    async fn authorize_project(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Project, EpicError> {
        let project = Project::find_by_id(&self.pool, project_id, organization_id)
            .await?
            .ok_or(EpicError::ProjectNotFound)?;
        if let Some(workspace_id) = project.workspace_id {
            WorkspaceMember::find_active(&self.pool, workspace_id, user_id)
                .await?
                .ok_or_else(|| {
                    EpicError::Forbidden("You are not a member of this workspace".to_string())
                })?;
        }
        Ok(project)
    }

    async fn membership_role(
        &self,
        project: &Project,
        user_id: Uuid,
    ) -> Result<Option<db::models::workspace_member::WorkspaceRole>, EpicError> {
        Ok(match project.workspace_id {
            Some(workspace_id) => {
                WorkspaceMember::find_active(&self.pool, workspace_id, user_id)
                    .await?
                    .map(|m| m.role)
            }
            None => None,
        })
    }

    pub async fn create_epic(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        data: &CreateEpic,
    ) -> Result<Epic, EpicError> {
        self.authorize_project(user_id, organization_id, project_id)
            .await?;
        Ok(Epic::create(
            &self.pool,
            data,
            Uuid::new_v4(),
            organization_id,
            project_id,
            user_id,
        )
        .await?)
    }

    pub async fn list_epics(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        page: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Epic>, EpicError> {
        self.authorize_project(user_id, organization_id, project_id)
            .await?;
        let total = Epic::count(&self.pool, organization_id, project_id).await?;
        let data = Epic::list(&self.pool, organization_id, project_id, limit, offset).await?;
        Ok(Page::new(data, total, page, limit))
    }

    pub async fn get_epic(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        epic_id: Uuid,
    ) -> Result<Epic, EpicError> {
        self.authorize_project(user_id, organization_id, project_id)
            .await?;
        Epic::find_by_id(&self.pool, epic_id, project_id, organization_id)
            .await?
            .ok_or(EpicError::EpicNotFound)
    }

    pub async fn update_epic(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        epic_id: Uuid,
        data: &UpdateEpic,
    ) -> Result<Epic, EpicError> {
        let project = self
            .authorize_project(user_id, organization_id, project_id)
            .await?;
        let epic = Epic::find_by_id(&self.pool, epic_id, project_id, organization_id)
            .await?
            .ok_or(EpicError::EpicNotFound)?;

        let role = self.membership_role(&project, user_id).await?;
        if !policy::can_act(user_id, &[Some(epic.created_by)], role, RoleRequirement::Admin) {
            return Err(EpicError::Forbidden(
                "You do not have permission to update this epic".to_string(),
            ));
        }

        Ok(Epic::update(&self.pool, epic.id, data).await?)
    }

    pub async fn delete_epic(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        epic_id: Uuid,
    ) -> Result<(), EpicError> {
        let project = self
            .authorize_project(user_id, organization_id, project_id)
            .await?;
        let epic = Epic::find_by_id(&self.pool, epic_id, project_id, organization_id)
            .await?
            .ok_or(EpicError::EpicNotFound)?;

        let role = self.membership_role(&project, user_id).await?;
        if !policy::can_act(user_id, &[Some(epic.created_by)], role, RoleRequirement::Owner) {
            return Err(EpicError::Forbidden(
                "Only the epic creator or workspace owner can delete this epic".to_string(),
            ));
        }

        Epic::delete(&self.pool, epic.id).await?;
        Ok(())
    }
}
