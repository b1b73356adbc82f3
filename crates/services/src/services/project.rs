use db::models::{
    project::{CreateProject, Project, UpdateProject},
    workspace_member::WorkspaceMember,
};
use sqlx::SqlitePool;
use thiserror::Error;
use utils::response::Page;
use uuid::Uuid;

use super::policy::{self, RoleRequirement};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Project not found")]
    ProjectNotFound,
    #[error("{0}")]
    Forbidden(String),
}

#[derive(Clone)]
pub struct ProjectService {
    pool: SqlitePool,
}

impl ProjectService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn require_member(
        &self,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> Result<WorkspaceMember, ProjectError> {
        WorkspaceMember::find_active(&self.pool, workspace_id, user_id)
            .await?
            .ok_or_else(|| {
                ProjectError::Forbidden("You are not a member of this workspace".to_string())
            })
    }

    pub async fn create_project(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        data: &CreateProject,
    ) -> Result<Project, ProjectError> {
        if let Some(workspace_id) = data.workspace_id {
            self.require_member(workspace_id, user_id).await?;
        }
        Ok(Project::create(&self.pool, data, Uuid::new_v4(), organization_id, user_id).await?)
    }

    pub async fn list_projects(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        workspace_id: Option<Uuid>,
        page: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Project>, ProjectError> {
        if let Some(workspace_id) = workspace_id {
            self.require_member(workspace_id, user_id).await?;
        }
        let total = Project::count(&self.pool, organization_id, workspace_id).await?;
        let data = Project::list(&self.pool, organization_id, workspace_id, limit, offset).await?;
        Ok(Page::new(data, total, page, limit))
    }

    pub async fn get_project(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Project, ProjectError> {
        let project = Project::find_by_id(&self.pool, project_id, organization_id)
            .await?
            .ok_or(ProjectError::ProjectNotFound)?;
        if let Some(workspace_id) = project.workspace_id {
            self.require_member(workspace_id, user_id).await?;
        }
        Ok(project)
    }

    pub async fn update_project(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        data: &UpdateProject,
    ) -> Result<Project, ProjectError> {
        let project = self
            .get_project(user_id, organization_id, project_id)
            .await?;

        let membership_role = match project.workspace_id {
            Some(workspace_id) => {
                WorkspaceMember::find_active(&self.pool, workspace_id, user_id)
                    .await?
                    .map(|m| m.role)
            }
            None => None,
        };
        if !policy::can_act(
            user_id,
            &[project.owner_id],
            membership_role,
            RoleRequirement::Admin,
        ) {
            return Err(ProjectError::Forbidden(
                "You do not have permission to update this project".to_string(),
            ));
        }

        Ok(Project::update(&self.pool, project_id, organization_id, data).await?)
    }

    pub async fn delete_project(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<(), ProjectError> {
        let project = self
            .get_project(user_id, organization_id, project_id)
            .await?;

        let membership_role = match project.workspace_id {
            Some(workspace_id) => {
                WorkspaceMember::find_active(&self.pool, workspace_id, user_id)
                    .await?
                    .map(|m| m.role)
            }
            None => None,
        };
        if !policy::can_act(
            user_id,
            &[project.owner_id],
            membership_role,
            RoleRequirement::Owner,
        ) {
            return Err(ProjectError::Forbidden(
                "Only the project owner or workspace owner can delete this project".to_string(),
            ));
        }

        let deleted = Project::delete(&self.pool, project_id, organization_id).await?;
        if deleted == 0 {
            return Err(ProjectError::ProjectNotFound);
        }
        Ok(())
    }
}
