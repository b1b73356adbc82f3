use db::models::{
    project::{CreateProject, Project},
    project_template::{ProjectTemplate, ProjectTemplateTask},
    task::{CreateTask, Task},
    workspace::{CreateWorkspace, Workspace},
    workspace_member::{WorkspaceMember, WorkspaceRole},
    workspace_template::{
        CreateWorkspaceTemplate, WorkspaceTemplate, WorkspaceTemplateProject,
    },
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum WorkspaceTemplateError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Template not found")]
    TemplateNotFound,
    #[error("Template not found or you do not have permission to delete it")]
    DeleteDenied,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceTemplateDetail {
    #[serde(flatten)]
    pub template: WorkspaceTemplate,
    pub projects: Vec<WorkspaceTemplateProject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UseWorkspaceTemplate {
    pub template_id: Uuid,
    pub workspace_name: Option<String>,
}

/// Keyword buckets used when a template project's name hints at a well-known
/// project shape.
const KEYWORD_MAPPINGS: &[(&str, &[&str])] = &[
    ("backlog", &["backlog", "product backlog", "sprint backlog"]),
    ("sprint", &["sprint", "scrum sprint", "sprint planning"]),
    ("kanban", &["kanban", "kanban board"]),
    ("bug", &["bug", "bug tracking", "issues"]),
    ("feature", &["feature", "feature development", "new feature"]),
    ("content", &["content", "content planning", "content creation"]),
    ("event", &["event", "event planning", "webinar"]),
];

/// Workspace categories mapped to the project-template categories they favor.
const CATEGORY_MAPPINGS: &[(&str, &[&str])] = &[
    ("scrum", &["backlog", "sprint"]),
    ("kanban", &["kanban"]),
    ("agile", &["backlog", "sprint", "feature"]),
    ("marketing", &["content", "event"]),
    ("product", &["backlog", "feature"]),
];

/// Ordered, first-match-wins cascade pairing a workspace template's project
/// row with an available project template:
/// explicit id, exact name, keyword bucket, workspace category, fuzzy overlap.
/// No match is a legitimate outcome, not an error.
pub fn find_matching_project_template<'a>(
    template_project: &WorkspaceTemplateProject,
    workspace_category: &str,
    available: &'a [ProjectTemplate],
) -> Option<&'a ProjectTemplate> {
    if available.is_empty() {
        return None;
    }

    if let Some(explicit_id) = template_project.project_template_id {
        if let Some(explicit) = available.iter().find(|t| t.id == explicit_id) {
            return Some(explicit);
        }
    }

    let project_name = template_project.name.to_lowercase();

    if let Some(exact) = available
        .iter()
        .find(|t| t.name.to_lowercase() == project_name)
    {
        return Some(exact);
    }

    for (keyword, variations) in KEYWORD_MAPPINGS {
        if !variations.iter().any(|v| project_name.contains(v)) {
            continue;
        }
        let hit = available.iter().find(|t| {
            let template_name = t.name.to_lowercase();
            t.category == *keyword
                || template_name.contains(keyword)
                || variations.iter().any(|v| template_name.contains(v))
        });
        if hit.is_some() {
            return hit;
        }
    }

    if let Some((_, preferred)) = CATEGORY_MAPPINGS
        .iter()
        .find(|(category, _)| *category == workspace_category)
    {
        let hit = available
            .iter()
            .find(|t| preferred.contains(&t.category.as_str()));
        if hit.is_some() {
            return hit;
        }
    }

    available.iter().find(|t| {
        let template_name = t.name.to_lowercase();
        project_name.contains(&template_name)
            || template_name.contains(&project_name)
            || project_name
                .split_whitespace()
                .any(|word| template_name.contains(word))
    })
}

#[derive(Clone)]
pub struct WorkspaceTemplateService {
    pool: SqlitePool,
}

impl WorkspaceTemplateService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_template(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        data: &CreateWorkspaceTemplate,
    ) -> Result<WorkspaceTemplateDetail, WorkspaceTemplateError> {
        let mut tx = self.pool.begin().await?;
        let template = WorkspaceTemplate::create(
            &mut *tx,
            data,
            Uuid::new_v4(),
            organization_id,
            user_id,
        )
        .await?;

        let mut projects = Vec::new();
        if let Some(project_rows) = &data.projects {
            for (index, project_data) in project_rows.iter().enumerate() {
                let project = WorkspaceTemplateProject::create(
                    &mut *tx,
                    project_data,
                    Uuid::new_v4(),
                    template.id,
                    index as i64,
                )
                .await?;
                projects.push(project);
            }
        }
        tx.commit().await?;

        Ok(WorkspaceTemplateDetail { template, projects })
    }

    pub async fn list_templates(
        &self,
        organization_id: Uuid,
        include_public: bool,
    ) -> Result<Vec<WorkspaceTemplateDetail>, WorkspaceTemplateError> {
        let templates =
            WorkspaceTemplate::list_visible(&self.pool, organization_id, include_public).await?;
        let mut details = Vec::with_capacity(templates.len());
        for template in templates {
            let projects = WorkspaceTemplateProject::list(&self.pool, template.id).await?;
            details.push(WorkspaceTemplateDetail { template, projects });
        }
        Ok(details)
    }

    pub async fn get_template(
        &self,
        organization_id: Uuid,
        template_id: Uuid,
    ) -> Result<WorkspaceTemplateDetail, WorkspaceTemplateError> {
        let template = WorkspaceTemplate::find_visible(&self.pool, template_id, organization_id)
            .await?
            .ok_or(WorkspaceTemplateError::TemplateNotFound)?;
        let projects = WorkspaceTemplateProject::list(&self.pool, template.id).await?;
        Ok(WorkspaceTemplateDetail { template, projects })
    }

    /// Instantiate a workspace from the template: the workspace, the creator's
    /// owner membership, one project per template row, and the task copies
    /// from each matched project template, committed as a single transaction.
    ///
    /// Matching is best-effort; an unmatched project stays empty and only
    /// logs a warning.
    pub async fn use_template(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        data: &UseWorkspaceTemplate,
    ) -> Result<Workspace, WorkspaceTemplateError> {
        let detail = self.get_template(organization_id, data.template_id).await?;

        // Resolve template matches and fetch their task rows up front; the
        // write transaction below then never has to read.
        let available = ProjectTemplate::list_visible(&self.pool, organization_id, true).await?;
        let mut planned: Vec<(&WorkspaceTemplateProject, Vec<ProjectTemplateTask>)> = Vec::new();
        for template_project in &detail.projects {
            let matched = find_matching_project_template(
                template_project,
                &detail.template.category,
                &available,
            );
            let tasks = match matched {
                Some(project_template) => {
                    ProjectTemplateTask::list(&self.pool, project_template.id).await?
                }
                None => {
                    tracing::warn!(
                        project = %template_project.name,
                        template = %detail.template.name,
                        "no matching project template; project will start empty"
                    );
                    Vec::new()
                }
            };
            planned.push((template_project, tasks));
        }

        let workspace_data = CreateWorkspace {
            name: data
                .workspace_name
                .clone()
                .unwrap_or_else(|| detail.template.name.clone()),
            description: detail.template.description.clone(),
            color: None,
            logo_url: None,
            owner_id: Some(user_id),
        };

        let mut tx = self.pool.begin().await?;
        let workspace = Workspace::create(
            &mut *tx,
            &workspace_data,
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

        for (template_project, tasks) in planned {
            let project_data = CreateProject {
                name: template_project.name.clone(),
                description: template_project.description.clone(),
                workspace_id: Some(workspace.id),
                status: None,
                owner_id: Some(user_id),
            };
            let project = Project::create(
                &mut *tx,
                &project_data,
                Uuid::new_v4(),
                organization_id,
                user_id,
            )
            .await?;

            for template_task in &tasks {
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
        }

        WorkspaceTemplate::increment_usage(&mut *tx, detail.template.id).await?;
        tx.commit().await?;

        Ok(workspace)
    }

    pub async fn delete_template(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        template_id: Uuid,
    ) -> Result<(), WorkspaceTemplateError> {
        let deleted =
            WorkspaceTemplate::delete_owned(&self.pool, template_id, organization_id, user_id)
                .await?;
        if deleted == 0 {
            return Err(WorkspaceTemplateError::DeleteDenied);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn template(name: &str, category: &str) -> ProjectTemplate {
        ProjectTemplate {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            category: category.to_string(),
            is_public: true,
            created_by: Uuid::new_v4(),
            usage_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn template_project(name: &str, explicit: Option<Uuid>) -> WorkspaceTemplateProject {
        WorkspaceTemplateProject {
            id: Uuid::new_v4(),
            template_id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            project_template_id: explicit,
            sort_order: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn explicit_id_wins_over_everything() {
        let a = template("Sprint Planning", "sprint");
        let b = template("Unrelated", "custom");
        let available = vec![a, b];
        let explicit_id = available[1].id;
        let project = template_project("Sprint Board", Some(explicit_id));

        let matched = find_matching_project_template(&project, "scrum", &available).unwrap();
        assert_eq!(matched.id, explicit_id);
    }

    #[test]
    fn exact_name_match_is_case_insensitive() {
        let available = vec![template("Product Backlog", "backlog")];
        let project = template_project("product backlog", None);

        let matched = find_matching_project_template(&project, "custom", &available).unwrap();
        assert_eq!(matched.name, "Product Backlog");
    }

    #[test]
    fn keyword_bucket_matches_by_category() {
        let available = vec![
            template("Team Calendar", "custom"),
            template("Issue Tracker", "bug"),
        ];
        let project = template_project("Bug Tracking Board", None);

        let matched = find_matching_project_template(&project, "custom", &available).unwrap();
        assert_eq!(matched.category, "bug");
    }

    #[test]
    fn workspace_category_fallback() {
        let available = vec![
            template("Editorial Calendar", "content"),
            template("Something Else", "custom"),
        ];
        let project = template_project("Q3 Campaigns", None);

        let matched = find_matching_project_template(&project, "marketing", &available).unwrap();
        assert_eq!(matched.category, "content");
    }

    #[test]
    fn fuzzy_word_overlap_is_the_last_resort() {
        let available = vec![template("Launch Checklist", "custom")];
        let project = template_project("Website Launch", None);

        let matched = find_matching_project_template(&project, "custom", &available).unwrap();
        assert_eq!(matched.name, "Launch Checklist");
    }

    #[test]
    fn no_match_yields_none() {
        let available = vec![template("Editorial Calendar", "content")];
        let project = template_project("Robotics", None);

        assert!(find_matching_project_template(&project, "custom", &available).is_none());
    }
}
