use db::models::{
    project::{CreateProject, Project},
    project_template::{CreateProjectTemplate, ProjectTemplate, ProjectTemplateTask},
    task::{CreateTask, Task},
    workspace_member::WorkspaceMember,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Template not found")]
    TemplateNotFound,
    #[error("Template not found or you do not have permission to delete it")]
    DeleteDenied,
    #[error("{0}")]
    Forbidden(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectTemplateDetail {
    #[serde(flatten)]
    pub template: ProjectTemplate,
    pub tasks: Vec<ProjectTemplateTask>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UseProjectTemplate {
    pub template_id: Uuid,
    pub project_name: Option<String>,
    pub workspace_id: Option<Uuid>,
}

#[derive(Clone)]
pub struct ProjectTemplateService {
    pool: SqlitePool,
}

impl ProjectTemplateService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Template plus child task rows, created atomically.
    pub async fn create_template(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        data: &CreateProjectTemplate,
    ) -> Result<ProjectTemplateDetail, TemplateError> {
        let mut tx = self.pool.begin().await?;
        let template = ProjectTemplate::create(
            &mut *tx,
            data,
            Uuid::new_v4(),
            organization_id,
            user_id,
        )
        .await?;

        let mut tasks = Vec::new();
        if let Some(task_rows) = &data.tasks {
            for (index, task_data) in task_rows.iter().enumerate() {
                let task = ProjectTemplateTask::create(
                    &mut *tx,
                    task_data,
                    Uuid::new_v4(),
                    template.id,
                    index as i64,
                )
                .await?;
                tasks.push(task);
            }
        }
        tx.commit().await?;

        Ok(ProjectTemplateDetail { template, tasks })
    }

    pub async fn list_templates(
        &self,
        organization_id: Uuid,
        include_public: bool,
    ) -> Result<Vec<ProjectTemplateDetail>, TemplateError> {
        let templates =
            ProjectTemplate::list_visible(&self.pool, organization_id, include_public).await?;
        let mut details = Vec::with_capacity(templates.len());
        for template in templates {
            let tasks = ProjectTemplateTask::list(&self.pool, template.id).await?;
            details.push(ProjectTemplateDetail { template, tasks });
        }
        Ok(details)
    }

    pub async fn get_template(
        &self,
        organization_id: Uuid,
        template_id: Uuid,
    ) -> Result<ProjectTemplateDetail, TemplateError> {
        let template = ProjectTemplate::find_visible(&self.pool, template_id, organization_id)
            .await?
            .ok_or(TemplateError::TemplateNotFound)?;
        let tasks = ProjectTemplateTask::list(&self.pool, template.id).await?;
        Ok(ProjectTemplateDetail { template, tasks })
    }

    /// Instantiate the template into a live project: project row plus one
    /// task per template task, and a usage bump, all in one transaction.
    pub async fn use_template(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        data: &UseProjectTemplate,
    ) -> Result<Project, TemplateError> {
        let detail = self.get_template(organization_id, data.template_id).await?;

        if let Some(workspace_id) = data.workspace_id {
            WorkspaceMember::find_active(&self.pool, workspace_id, user_id)
                .await?
                .ok_or_else(|| {
                    TemplateError::Forbidden(
                        "You are not a member of this workspace".to_string(),
                    )
                })?;
        }

        let create = CreateProject {
            name: data
                .project_name
                .clone()
                .unwrap_or_else(|| detail.template.name.clone()),
            description: detail.template.description.clone(),
            workspace_id: data.workspace_id,
            status: None,
            owner_id: Some(user_id),
        };

        let mut tx = self.pool.begin().await?;
        let project =
            Project::create(&mut *tx, &create, Uuid::new_v4(), organization_id, user_id).await?;
        for template_task in &detail.tasks {
            let task_data = CreateTask {
                title: template_task.title.clone(),
                description: template_task.description.clone(),
                status: Some(template_task.status),
                priority: Some(template_task.priority),
                epic_id: None,
                assignee_id: None,
                assignee_ids: None,
                due_date: None,
                estimated_hours: None,
                actual_hours: None,
                tags: Some(template_task.tags.0.clone()),
            };
            Task::create(
                &mut *tx,
                &task_data,
                Uuid::new_v4(),
                organization_id,
                project.id,
                user_id,
            )
            .await?;
        }
        ProjectTemplate::increment_usage(&mut *tx, detail.template.id).await?;
        tx.commit().await?;

        Ok(project)
    }

    pub async fn delete_template(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        template_id: Uuid,
    ) -> Result<(), TemplateError> {
        let deleted =
            ProjectTemplate::delete_owned(&self.pool, template_id, organization_id, user_id)
                .await?;
        if deleted == 0 {
            return Err(TemplateError::DeleteDenied);
        }
        Ok(())
    }
}
