use db::models::{
    project::Project,
    task::{CreateTask, Task, TaskFilters, UpdateTask},
    task_activity::{TaskActivity, TaskActivityType},
    task_attachment::{CreateTaskAttachment, TaskAttachment},
    task_comment::{CreateTaskComment, TaskComment, UpdateTaskComment},
    task_dependency::{
        CreateTaskDependency, DependencyLinks, TaskDependency, TaskDependencyType,
    },
    task_time_log::{CreateTaskTimeLog, TaskTimeLog, UpdateTaskTimeLog},
    user::User,
    workspace_member::{WorkspaceMember, WorkspaceRole},
};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;
use sqlx::SqlitePool;
use thiserror::Error;
use utils::response::Page;
use uuid::Uuid;

use super::{
    notify::{NotificationDispatch, NotificationType},
    policy::{self, RoleRequirement},
};

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Project not found")]
    ProjectNotFound,
    #[error("Task not found")]
    TaskNotFound,
    #[error("Dependent task not found")]
    DependentTaskNotFound,
    #[error("Comment not found")]
    CommentNotFound,
    #[error("Attachment not found")]
    AttachmentNotFound,
    #[error("Dependency not found")]
    DependencyNotFound,
    #[error("Time log not found")]
    TimeLogNotFound,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Validation(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeReportUserEntry {
    pub user_id: Uuid,
    pub user_name: String,
    pub total_minutes: i64,
    pub billable_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeReportTaskEntry {
    pub task_id: Uuid,
    pub task_title: String,
    pub total_minutes: i64,
    pub billable_minutes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectTimeReport {
    pub total_minutes: i64,
    pub total_billable_minutes: i64,
    pub logs_by_user: Vec<TimeReportUserEntry>,
    pub logs_by_task: Vec<TimeReportTaskEntry>,
}

#[derive(Clone)]
pub struct TaskService {
    pool: SqlitePool,
    dispatch: NotificationDispatch,
}

impl TaskService {
    pub fn new(pool: SqlitePool) -> Self {
        let dispatch = NotificationDispatch::new(pool.clone());
        Self { pool, dispatch }
    }

    /// Project existence plus workspace membership; the entry gate shared by
    /// every task operation.
    async fn authorize_project(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<Project, TaskError> {
        let project = Project::find_by_id(&self.pool, project_id, organization_id)
            .await?
            .ok_or(TaskError::ProjectNotFound)?;
        if let Some(workspace_id) = project.workspace_id {
            WorkspaceMember::find_active(&self.pool, workspace_id, user_id)
                .await?
                .ok_or_else(|| {
                    TaskError::Forbidden("You are not a member of this workspace".to_string())
                })?;
        }
        Ok(project)
    }

    async fn membership_role(
        &self,
        project: &Project,
        user_id: Uuid,
    ) -> Result<Option<WorkspaceRole>, TaskError> {
        Ok(match project.workspace_id {
            Some(workspace_id) => {
                WorkspaceMember::find_active(&self.pool, workspace_id, user_id)
                    .await?
                    .map(|m| m.role)
            }
            None => None,
        })
    }

    async fn record_activity(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        activity_type: TaskActivityType,
        old_value: Option<serde_json::Value>,
        new_value: Option<serde_json::Value>,
        description: String,
    ) -> Result<TaskActivity, sqlx::Error> {
        TaskActivity::create(
            &self.pool,
            Uuid::new_v4(),
            task_id,
            user_id,
            activity_type,
            old_value,
            new_value,
            &description,
        )
        .await
    }

    async fn actor_name(&self, user_id: Uuid) -> String {
        match User::find_by_id(&self.pool, user_id).await {
            Ok(Some(user)) => user.display_name(),
            _ => "Someone".to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Task CRUD
    // ------------------------------------------------------------------

    pub async fn create_task(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        data: &CreateTask,
    ) -> Result<Task, TaskError> {
        let project = self
            .authorize_project(user_id, organization_id, project_id)
            .await?;

        let task = Task::create(
            &self.pool,
            data,
            Uuid::new_v4(),
            organization_id,
            project_id,
            user_id,
        )
        .await?;

        if let Some(assignee_ids) = &data.assignee_ids {
            Task::set_assignees(&self.pool, task.id, assignee_ids).await?;
        }

        self.record_activity(
            task.id,
            user_id,
            TaskActivityType::Created,
            None,
            None,
            "Task created".to_string(),
        )
        .await?;

        self.notify_task_created(&task, &project, user_id, organization_id)
            .await;

        Ok(task)
    }

    pub async fn list_tasks(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        filters: &TaskFilters,
        page: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Page<Task>, TaskError> {
        self.authorize_project(user_id, organization_id, project_id)
            .await?;
        let total = Task::count(&self.pool, organization_id, project_id, filters).await?;
        let data = Task::list(
            &self.pool,
            organization_id,
            project_id,
            filters,
            limit,
            offset,
        )
        .await?;
        Ok(Page::new(data, total, page, limit))
    }

    pub async fn get_task(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
    ) -> Result<Task, TaskError> {
        self.authorize_project(user_id, organization_id, project_id)
            .await?;
        Task::find_by_id(&self.pool, task_id, project_id, organization_id)
            .await?
            .ok_or(TaskError::TaskNotFound)
    }

    pub async fn update_task(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        data: &UpdateTask,
    ) -> Result<Task, TaskError> {
        let project = self
            .authorize_project(user_id, organization_id, project_id)
            .await?;
        let task = Task::find_by_id(&self.pool, task_id, project_id, organization_id)
            .await?
            .ok_or(TaskError::TaskNotFound)?;

        let role = self.membership_role(&project, user_id).await?;
        if !policy::can_act(
            user_id,
            &[Some(task.created_by), task.assignee_id],
            role,
            RoleRequirement::Admin,
        ) {
            return Err(TaskError::Forbidden(
                "You do not have permission to update this task".to_string(),
            ));
        }

        // One activity row per recognized field change, with old/new snapshots.
        if let Some(new_status) = data.status {
            if new_status != task.status {
                self.record_activity(
                    task.id,
                    user_id,
                    TaskActivityType::StatusChanged,
                    Some(json!(task.status)),
                    Some(json!(new_status)),
                    format!("Status changed to {}", new_status.as_str()),
                )
                .await?;
            }
        }
        if let Some(new_priority) = data.priority {
            if new_priority != task.priority {
                self.record_activity(
                    task.id,
                    user_id,
                    TaskActivityType::PriorityChanged,
                    Some(json!(task.priority)),
                    Some(json!(new_priority)),
                    format!("Priority changed to {}", new_priority.as_str()),
                )
                .await?;
            }
        }
        if let Some(new_assignee) = &data.assignee_id {
            match (new_assignee, task.assignee_id) {
                (Some(assignee), None) => {
                    self.record_activity(
                        task.id,
                        user_id,
                        TaskActivityType::Assigned,
                        None,
                        Some(json!(assignee)),
                        "Task assigned".to_string(),
                    )
                    .await?;
                }
                (None, Some(previous)) => {
                    self.record_activity(
                        task.id,
                        user_id,
                        TaskActivityType::Unassigned,
                        Some(json!(previous)),
                        None,
                        "Task unassigned".to_string(),
                    )
                    .await?;
                }
                _ => {}
            }
        }
        if let Some(new_due) = &data.due_date {
            match (new_due, task.due_date) {
                (Some(date), None) => {
                    self.record_activity(
                        task.id,
                        user_id,
                        TaskActivityType::DueDateSet,
                        None,
                        Some(json!(date)),
                        "Due date set".to_string(),
                    )
                    .await?;
                }
                (Some(date), Some(previous)) if *date != previous => {
                    self.record_activity(
                        task.id,
                        user_id,
                        TaskActivityType::DueDateChanged,
                        Some(json!(previous)),
                        Some(json!(date)),
                        "Due date changed".to_string(),
                    )
                    .await?;
                }
                (None, Some(previous)) => {
                    self.record_activity(
                        task.id,
                        user_id,
                        TaskActivityType::DueDateRemoved,
                        Some(json!(previous)),
                        None,
                        "Due date removed".to_string(),
                    )
                    .await?;
                }
                _ => {}
            }
        }

        let title = data.title.clone().unwrap_or_else(|| task.title.clone());
        let description = match &data.description {
            // Empty string clears the description; omitted keeps it.
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(s.clone()),
            None => task.description.clone(),
        };
        let status = data.status.unwrap_or(task.status);
        let priority = data.priority.unwrap_or(task.priority);
        let epic_id = data.epic_id.or(task.epic_id);
        let assignee_id = match data.assignee_id {
            Some(value) => value,
            None => task.assignee_id,
        };
        let due_date = match data.due_date {
            Some(value) => value,
            None => task.due_date,
        };
        let estimated_hours = data.estimated_hours.or(task.estimated_hours);
        let actual_hours = data.actual_hours.or(task.actual_hours);
        let tags = data.tags.clone().unwrap_or_else(|| task.tags.0.clone());
        let sort_order = data.sort_order.unwrap_or(task.sort_order);

        let updated = Task::update(
            &self.pool,
            task.id,
            title,
            description,
            status,
            priority,
            epic_id,
            assignee_id,
            due_date,
            estimated_hours,
            actual_hours,
            tags,
            sort_order,
        )
        .await?;

        if let Some(assignee_ids) = &data.assignee_ids {
            Task::set_assignees(&self.pool, task.id, assignee_ids).await?;
        }

        let other_fields_present = data.title.is_some()
            || data.description.is_some()
            || data.epic_id.is_some()
            || data.estimated_hours.is_some()
            || data.actual_hours.is_some()
            || data.tags.is_some()
            || data.sort_order.is_some()
            || data.assignee_ids.is_some();
        if other_fields_present {
            self.record_activity(
                task.id,
                user_id,
                TaskActivityType::Updated,
                None,
                None,
                "Task updated".to_string(),
            )
            .await?;
        }

        self.notify_task_updated(&task, &updated, data, user_id, organization_id)
            .await;

        Ok(updated)
    }

    pub async fn delete_task(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
    ) -> Result<(), TaskError> {
        let project = self
            .authorize_project(user_id, organization_id, project_id)
            .await?;
        let task = Task::find_by_id(&self.pool, task_id, project_id, organization_id)
            .await?
            .ok_or(TaskError::TaskNotFound)?;

        let role = self.membership_role(&project, user_id).await?;
        if !policy::can_act(
            user_id,
            &[Some(task.created_by)],
            role,
            RoleRequirement::Admin,
        ) {
            return Err(TaskError::Forbidden(
                "You do not have permission to delete this task".to_string(),
            ));
        }

        // FK cascade removes comments, attachments, activities, dependencies
        // and time logs with the task.
        Task::delete(&self.pool, task.id).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Comments
    // ------------------------------------------------------------------

    pub async fn add_comment(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        data: &CreateTaskComment,
    ) -> Result<TaskComment, TaskError> {
        let task = self
            .get_task(user_id, organization_id, project_id, task_id)
            .await?;

        let comment =
            TaskComment::create(&self.pool, data, Uuid::new_v4(), task_id, user_id).await?;

        self.record_activity(
            task_id,
            user_id,
            TaskActivityType::CommentAdded,
            None,
            Some(json!({ "comment_id": comment.id })),
            "Comment added".to_string(),
        )
        .await?;

        self.notify_comment_added(&task, &comment, user_id, organization_id)
            .await;

        Ok(comment)
    }

    pub async fn list_comments(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        page: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Page<TaskComment>, TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;
        let total = TaskComment::count(&self.pool, task_id).await?;
        let data = TaskComment::list(&self.pool, task_id, limit, offset).await?;
        Ok(Page::new(data, total, page, limit))
    }

    pub async fn update_comment(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        comment_id: Uuid,
        data: &UpdateTaskComment,
    ) -> Result<TaskComment, TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;

        let comment = TaskComment::find_by_id(&self.pool, comment_id, task_id)
            .await?
            .ok_or(TaskError::CommentNotFound)?;
        if comment.author_id != user_id {
            return Err(TaskError::Forbidden(
                "You can only edit your own comments".to_string(),
            ));
        }

        let updated = TaskComment::update_body(&self.pool, comment.id, &data.body).await?;

        self.record_activity(
            task_id,
            user_id,
            TaskActivityType::CommentEdited,
            None,
            Some(json!({ "comment_id": comment_id })),
            "Comment edited".to_string(),
        )
        .await?;

        Ok(updated)
    }

    pub async fn delete_comment(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        comment_id: Uuid,
    ) -> Result<(), TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;

        let comment = TaskComment::find_by_id(&self.pool, comment_id, task_id)
            .await?
            .ok_or(TaskError::CommentNotFound)?;
        if comment.author_id != user_id {
            return Err(TaskError::Forbidden(
                "You can only delete your own comments".to_string(),
            ));
        }

        TaskComment::mark_deleted(&self.pool, comment.id).await?;

        self.record_activity(
            task_id,
            user_id,
            TaskActivityType::CommentDeleted,
            None,
            Some(json!({ "comment_id": comment_id })),
            "Comment deleted".to_string(),
        )
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Attachments
    // ------------------------------------------------------------------

    pub async fn add_attachment(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        data: &CreateTaskAttachment,
    ) -> Result<TaskAttachment, TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;

        let attachment =
            TaskAttachment::create(&self.pool, data, Uuid::new_v4(), task_id, user_id).await?;

        self.record_activity(
            task_id,
            user_id,
            TaskActivityType::AttachmentAdded,
            None,
            Some(json!({ "attachment_id": attachment.id, "file_name": attachment.file_name })),
            format!("Attachment added: {}", attachment.file_name),
        )
        .await?;

        Ok(attachment)
    }

    pub async fn list_attachments(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
    ) -> Result<Vec<TaskAttachment>, TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;
        Ok(TaskAttachment::list(&self.pool, task_id).await?)
    }

    pub async fn delete_attachment(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        attachment_id: Uuid,
    ) -> Result<(), TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;

        let attachment = TaskAttachment::find_by_id(&self.pool, attachment_id, task_id)
            .await?
            .ok_or(TaskError::AttachmentNotFound)?;
        if attachment.uploaded_by != user_id {
            return Err(TaskError::Forbidden(
                "You can only delete your own attachments".to_string(),
            ));
        }

        TaskAttachment::delete(&self.pool, attachment.id).await?;

        self.record_activity(
            task_id,
            user_id,
            TaskActivityType::AttachmentRemoved,
            None,
            Some(json!({ "attachment_id": attachment_id, "file_name": attachment.file_name })),
            format!("Attachment removed: {}", attachment.file_name),
        )
        .await?;

        Ok(())
    }

    // ------------------------------------------------------------------
    // Activities
    // ------------------------------------------------------------------

    pub async fn list_activities(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        page: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Page<TaskActivity>, TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;
        let total = TaskActivity::count(&self.pool, task_id).await?;
        let data = TaskActivity::list(&self.pool, task_id, limit, offset).await?;
        Ok(Page::new(data, total, page, limit))
    }

    // ------------------------------------------------------------------
    // Dependencies
    // ------------------------------------------------------------------

    pub async fn add_dependency(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        data: &CreateTaskDependency,
    ) -> Result<TaskDependency, TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;

        if task_id == data.depends_on_task_id {
            return Err(TaskError::Validation(
                "A task cannot depend on itself".to_string(),
            ));
        }

        // The dependent task may live in another project; it only has to be
        // in the same organization and accessible to the caller.
        let depends_on =
            Task::find_in_organization(&self.pool, data.depends_on_task_id, organization_id)
                .await?
                .ok_or(TaskError::DependentTaskNotFound)?;
        if let Some(other_project_id) = depends_on.project_id {
            let other_project = Project::find_by_id(&self.pool, other_project_id, organization_id)
                .await?
                .ok_or(TaskError::DependentTaskNotFound)?;
            if let Some(workspace_id) = other_project.workspace_id {
                WorkspaceMember::find_active(&self.pool, workspace_id, user_id)
                    .await?
                    .ok_or_else(|| {
                        TaskError::Forbidden(
                            "You do not have access to the dependent task".to_string(),
                        )
                    })?;
            }
        }

        if TaskDependency::find_pair(&self.pool, task_id, data.depends_on_task_id)
            .await?
            .is_some()
        {
            return Err(TaskError::Conflict(
                "This dependency already exists".to_string(),
            ));
        }

        // Walk the existing graph: if the dependent task already reaches this
        // one, the new edge would close a cycle. Catches the two-node case
        // and cycles through intermediate tasks alike.
        if TaskDependency::path_exists(&self.pool, data.depends_on_task_id, task_id).await? {
            return Err(TaskError::Conflict(
                "Circular dependency detected".to_string(),
            ));
        }

        Ok(TaskDependency::create(
            &self.pool,
            Uuid::new_v4(),
            task_id,
            data.depends_on_task_id,
            data.dependency_type.unwrap_or(TaskDependencyType::Blocks),
        )
        .await?)
    }

    pub async fn get_dependencies(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
    ) -> Result<DependencyLinks, TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;
        Ok(TaskDependency::links_for_task(&self.pool, task_id).await?)
    }

    pub async fn remove_dependency(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        dependency_id: Uuid,
    ) -> Result<(), TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;
        let removed = TaskDependency::delete_for_task(&self.pool, dependency_id, task_id).await?;
        if removed == 0 {
            return Err(TaskError::DependencyNotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Time tracking
    // ------------------------------------------------------------------

    pub async fn log_time(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        data: &CreateTaskTimeLog,
    ) -> Result<TaskTimeLog, TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;
        if data.duration_minutes <= 0 {
            return Err(TaskError::Validation(
                "Duration must be a positive number of minutes".to_string(),
            ));
        }
        Ok(TaskTimeLog::create(&self.pool, data, Uuid::new_v4(), task_id, user_id).await?)
    }

    pub async fn list_time_logs(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        page: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Page<TaskTimeLog>, TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;
        let total = TaskTimeLog::count(&self.pool, task_id).await?;
        let data = TaskTimeLog::list(&self.pool, task_id, limit, offset).await?;
        Ok(Page::new(data, total, page, limit))
    }

    pub async fn update_time_log(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        time_log_id: Uuid,
        data: &UpdateTaskTimeLog,
    ) -> Result<TaskTimeLog, TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;

        let time_log = TaskTimeLog::find_by_id(&self.pool, time_log_id, task_id)
            .await?
            .ok_or(TaskError::TimeLogNotFound)?;
        if time_log.user_id != user_id {
            return Err(TaskError::Forbidden(
                "You can only update your own time logs".to_string(),
            ));
        }
        if let Some(minutes) = data.duration_minutes {
            if minutes <= 0 {
                return Err(TaskError::Validation(
                    "Duration must be a positive number of minutes".to_string(),
                ));
            }
        }

        Ok(TaskTimeLog::update(&self.pool, time_log.id, data).await?)
    }

    pub async fn delete_time_log(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        task_id: Uuid,
        time_log_id: Uuid,
    ) -> Result<(), TaskError> {
        self.get_task(user_id, organization_id, project_id, task_id)
            .await?;

        let time_log = TaskTimeLog::find_by_id(&self.pool, time_log_id, task_id)
            .await?
            .ok_or(TaskError::TimeLogNotFound)?;
        if time_log.user_id != user_id {
            return Err(TaskError::Forbidden(
                "You can only delete your own time logs".to_string(),
            ));
        }

        TaskTimeLog::delete(&self.pool, time_log.id).await?;
        Ok(())
    }

    pub async fn time_report(
        &self,
        _user_id: Uuid,
        organization_id: Uuid,
        project_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ProjectTimeReport, TaskError> {
        Project::find_by_id(&self.pool, project_id, organization_id)
            .await?
            .ok_or(TaskError::ProjectNotFound)?;

        let totals =
            TaskTimeLog::project_totals(&self.pool, project_id, organization_id, start, end)
                .await?;
        let by_user =
            TaskTimeLog::project_rollup_by_user(&self.pool, project_id, organization_id, start, end)
                .await?;
        let by_task =
            TaskTimeLog::project_rollup_by_task(&self.pool, project_id, organization_id, start, end)
                .await?;

        Ok(ProjectTimeReport {
            total_minutes: totals.total_minutes,
            total_billable_minutes: totals.billable_minutes,
            logs_by_user: by_user
                .into_iter()
                .map(|entry| TimeReportUserEntry {
                    user_id: entry.user_id,
                    user_name: format!("{} {}", entry.first_name, entry.last_name),
                    total_minutes: entry.total_minutes,
                    billable_minutes: entry.billable_minutes,
                })
                .collect(),
            logs_by_task: by_task
                .into_iter()
                .map(|entry| TimeReportTaskEntry {
                    task_id: entry.task_id,
                    task_title: entry.task_title,
                    total_minutes: entry.total_minutes,
                    billable_minutes: entry.billable_minutes,
                })
                .collect(),
        })
    }

    // ------------------------------------------------------------------
    // Notification fan-out (best-effort, never fails the mutation)
    // ------------------------------------------------------------------

    async fn notify_task_created(
        &self,
        task: &Task,
        project: &Project,
        actor: Uuid,
        organization_id: Uuid,
    ) {
        if let Err(err) = self
            .try_notify_task_created(task, project, actor, organization_id)
            .await
        {
            tracing::warn!(task_id = %task.id, "failed to send task creation notifications: {err}");
        }
    }

    async fn try_notify_task_created(
        &self,
        task: &Task,
        project: &Project,
        actor: Uuid,
        organization_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let creator_name = self.actor_name(actor).await;
        let payload = json!({
            "task_id": task.id,
            "task_title": task.title,
            "project_id": task.project_id,
            "workspace_id": project.workspace_id,
        });

        if let Some(assignee_id) = task.assignee_id {
            if assignee_id != actor {
                self.dispatch
                    .send(
                        assignee_id,
                        organization_id,
                        NotificationType::TaskAssigned,
                        "New task assigned to you",
                        &format!("You have been assigned to task: {}", task.title),
                        payload.clone(),
                    )
                    .await?;
            }
        }

        if let Some(workspace_id) = project.workspace_id {
            let members = WorkspaceMember::list_active(&self.pool, workspace_id).await?;
            for member in members {
                if member.user_id == actor || Some(member.user_id) == task.assignee_id {
                    continue;
                }
                self.dispatch
                    .send(
                        member.user_id,
                        organization_id,
                        NotificationType::TaskCreated,
                        "New task created",
                        &format!("{creator_name} created a new task: {}", task.title),
                        payload.clone(),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn notify_task_updated(
        &self,
        before: &Task,
        after: &Task,
        data: &UpdateTask,
        actor: Uuid,
        organization_id: Uuid,
    ) {
        if let Err(err) = self
            .try_notify_task_updated(before, after, data, actor, organization_id)
            .await
        {
            tracing::warn!(task_id = %after.id, "failed to send task update notifications: {err}");
        }
    }

    async fn try_notify_task_updated(
        &self,
        before: &Task,
        after: &Task,
        data: &UpdateTask,
        actor: Uuid,
        organization_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let updater_name = self.actor_name(actor).await;
        let payload = json!({
            "task_id": after.id,
            "task_title": after.title,
            "project_id": after.project_id,
        });

        if data.assignee_id.is_some() && after.assignee_id != before.assignee_id {
            if let Some(new_assignee) = after.assignee_id {
                if new_assignee != actor {
                    self.dispatch
                        .send(
                            new_assignee,
                            organization_id,
                            NotificationType::TaskAssigned,
                            "Task assigned to you",
                            &format!("{updater_name} assigned task \"{}\" to you", after.title),
                            payload.clone(),
                        )
                        .await?;
                }
            }
            if let Some(previous) = before.assignee_id {
                if previous != actor && Some(previous) != after.assignee_id {
                    self.dispatch
                        .send(
                            previous,
                            organization_id,
                            NotificationType::TaskUnassigned,
                            "Task unassigned",
                            &format!(
                                "{updater_name} unassigned you from task \"{}\"",
                                after.title
                            ),
                            payload.clone(),
                        )
                        .await?;
                }
            }
        }

        let assignee_to_notify = after.assignee_id.filter(|id| *id != actor);
        if let Some(assignee) = assignee_to_notify {
            if data.status.is_some() && after.status != before.status {
                self.dispatch
                    .send(
                        assignee,
                        organization_id,
                        NotificationType::TaskStatusChanged,
                        "Task status updated",
                        &format!(
                            "{updater_name} changed status of \"{}\" from {} to {}",
                            after.title,
                            before.status.as_str(),
                            after.status.as_str()
                        ),
                        payload.clone(),
                    )
                    .await?;
            }
            if data.priority.is_some() && after.priority != before.priority {
                self.dispatch
                    .send(
                        assignee,
                        organization_id,
                        NotificationType::TaskPriorityChanged,
                        "Task priority updated",
                        &format!(
                            "{updater_name} changed priority of \"{}\" from {} to {}",
                            after.title,
                            before.priority.as_str(),
                            after.priority.as_str()
                        ),
                        payload.clone(),
                    )
                    .await?;
            }
            if data.due_date.is_some() && after.due_date != before.due_date {
                let body = match after.due_date {
                    Some(date) => format!(
                        "{updater_name} set due date for \"{}\" to {date}",
                        after.title
                    ),
                    None => format!("{updater_name} removed due date from \"{}\"", after.title),
                };
                self.dispatch
                    .send(
                        assignee,
                        organization_id,
                        NotificationType::TaskDueDateChanged,
                        "Task due date updated",
                        &body,
                        payload.clone(),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    async fn notify_comment_added(
        &self,
        task: &Task,
        comment: &TaskComment,
        actor: Uuid,
        organization_id: Uuid,
    ) {
        if let Err(err) = self
            .try_notify_comment_added(task, comment, actor, organization_id)
            .await
        {
            tracing::warn!(task_id = %task.id, "failed to send comment notifications: {err}");
        }
    }

    async fn try_notify_comment_added(
        &self,
        task: &Task,
        comment: &TaskComment,
        actor: Uuid,
        organization_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        let commenter_name = self.actor_name(actor).await;
        let payload = json!({
            "task_id": task.id,
            "task_title": task.title,
            "comment_id": comment.id,
            "commenter_id": actor,
        });
        let body = format!("{commenter_name} commented on task \"{}\"", task.title);

        let mut notified = vec![actor];

        if let Some(assignee_id) = task.assignee_id {
            if assignee_id != actor {
                self.dispatch
                    .send(
                        assignee_id,
                        organization_id,
                        NotificationType::TaskCommentAdded,
                        "New comment on your task",
                        &body,
                        payload.clone(),
                    )
                    .await?;
                notified.push(assignee_id);
            }
        }

        if task.created_by != actor && Some(task.created_by) != task.assignee_id {
            self.dispatch
                .send(
                    task.created_by,
                    organization_id,
                    NotificationType::TaskCommentAdded,
                    "New comment on your task",
                    &body,
                    payload.clone(),
                )
                .await?;
            notified.push(task.created_by);
        }

        // Everyone else who has commented on this task.
        let authors = TaskComment::author_ids(&self.pool, task.id).await?;
        for author in authors {
            if notified.contains(&author) {
                continue;
            }
            self.dispatch
                .send(
                    author,
                    organization_id,
                    NotificationType::TaskCommentAdded,
                    "New comment on task",
                    &body,
                    payload.clone(),
                )
                .await?;
            notified.push(author);
        }
        Ok(())
    }
}
