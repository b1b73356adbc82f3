use std::collections::HashMap;

use chrono::NaiveDate;
use db::models::{
    project::{Project, ProjectTaskCounts},
    task::{Task, TaskPriority, TaskStatus},
    task_time_log::TaskTimeLog,
    workspace_member::WorkspaceMember,
};
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Project not found")]
    ProjectNotFound,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusBreakdown {
    pub todo: i64,
    pub in_progress: i64,
    pub in_review: i64,
    pub done: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PriorityBreakdown {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub urgent: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskStats {
    pub total: i64,
    pub by_status: StatusBreakdown,
    pub by_priority: PriorityBreakdown,
    pub completed: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeamStats {
    pub total_members: i64,
    pub active_members: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimeStats {
    pub total_minutes: i64,
    pub total_hours: f64,
    pub billable_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectReport {
    pub project: Project,
    pub task_stats: TaskStats,
    pub team_stats: TeamStats,
    pub time_stats: TimeStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectStat {
    pub project_id: Uuid,
    pub project_name: String,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallStats {
    pub total_projects: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub overall_completion_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceReport {
    pub workspace_id: Uuid,
    pub project_stats: Vec<ProjectStat>,
    pub overall_stats: OverallStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberProductivity {
    pub user_id: Uuid,
    pub user_name: String,
    pub tasks_assigned: i64,
    pub tasks_completed: i64,
    pub completion_rate: f64,
    pub time_logged_minutes: i64,
    pub time_logged_hours: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductivityReport {
    pub team_members: Vec<MemberProductivity>,
}

/// Scope selector for the team productivity report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductivityScope {
    Workspace,
    Project,
}

fn completion_rate(completed: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        completed as f64 / total as f64 * 100.0
    }
}

fn minutes_to_hours(minutes: i64) -> f64 {
    (minutes as f64 / 60.0 * 100.0).round() / 100.0
}

#[derive(Clone)]
pub struct ReportService {
    pool: SqlitePool,
}

impl ReportService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn project_report(
        &self,
        organization_id: Uuid,
        project_id: Uuid,
    ) -> Result<ProjectReport, ReportError> {
        let project = Project::find_by_id(&self.pool, project_id, organization_id)
            .await?
            .ok_or(ReportError::ProjectNotFound)?;

        let mut by_status = StatusBreakdown::default();
        let mut total = 0;
        for (status, count) in Task::status_counts(&self.pool, organization_id, project_id).await? {
            total += count;
            match status {
                TaskStatus::Todo => by_status.todo = count,
                TaskStatus::InProgress => by_status.in_progress = count,
                TaskStatus::InReview => by_status.in_review = count,
                TaskStatus::Done => by_status.done = count,
            }
        }

        let mut by_priority = PriorityBreakdown::default();
        for (priority, count) in
            Task::priority_counts(&self.pool, organization_id, project_id).await?
        {
            match priority {
                TaskPriority::Low => by_priority.low = count,
                TaskPriority::Medium => by_priority.medium = count,
                TaskPriority::High => by_priority.high = count,
                TaskPriority::Urgent => by_priority.urgent = count,
            }
        }

        let completed = by_status.done;
        let task_stats = TaskStats {
            total,
            by_status,
            by_priority,
            completed,
            completion_rate: completion_rate(completed, total),
        };

        let member_count = match project.workspace_id {
            Some(workspace_id) => {
                WorkspaceMember::list_active(&self.pool, workspace_id).await?.len() as i64
            }
            None => 0,
        };
        let team_stats = TeamStats {
            total_members: member_count,
            active_members: member_count,
        };

        let totals =
            TaskTimeLog::project_totals(&self.pool, project_id, organization_id, None, None)
                .await?;
        let time_stats = TimeStats {
            total_minutes: totals.total_minutes,
            total_hours: minutes_to_hours(totals.total_minutes),
            billable_hours: minutes_to_hours(totals.billable_minutes),
        };

        Ok(ProjectReport {
            project,
            task_stats,
            team_stats,
            time_stats,
        })
    }

    pub async fn workspace_report(
        &self,
        organization_id: Uuid,
        workspace_id: Uuid,
    ) -> Result<WorkspaceReport, ReportError> {
        let counts =
            Project::task_counts_for_workspace(&self.pool, organization_id, workspace_id).await?;
        let total_projects = counts.len() as i64;

        let project_stats: Vec<ProjectStat> = counts
            .into_iter()
            .map(
                |ProjectTaskCounts {
                     project_id,
                     project_name,
                     total_tasks,
                     completed_tasks,
                 }| ProjectStat {
                    project_id,
                    project_name,
                    total_tasks,
                    completed_tasks,
                    completion_rate: completion_rate(completed_tasks, total_tasks),
                },
            )
            .collect();

        let (total_tasks, completed_tasks) =
            Task::workspace_totals(&self.pool, organization_id, workspace_id).await?;

        Ok(WorkspaceReport {
            workspace_id,
            project_stats,
            overall_stats: OverallStats {
                total_projects,
                total_tasks,
                completed_tasks,
                overall_completion_rate: completion_rate(completed_tasks, total_tasks),
            },
        })
    }

    pub async fn team_productivity(
        &self,
        organization_id: Uuid,
        scope: ProductivityScope,
        id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<ProductivityReport, ReportError> {
        let (workspace_id, task_counts, minutes) = match scope {
            ProductivityScope::Workspace => {
                let counts =
                    Task::per_assignee_counts_for_workspace(&self.pool, organization_id, id)
                        .await?;
                let minutes = TaskTimeLog::minutes_by_user_for_workspace(
                    &self.pool,
                    id,
                    organization_id,
                    start,
                    end,
                )
                .await?;
                (Some(id), counts, minutes)
            }
            ProductivityScope::Project => {
                let project = Project::find_by_id(&self.pool, id, organization_id)
                    .await?
                    .ok_or(ReportError::ProjectNotFound)?;
                let counts =
                    Task::per_assignee_counts_for_project(&self.pool, organization_id, id).await?;
                let minutes = TaskTimeLog::minutes_by_user_for_project(
                    &self.pool,
                    id,
                    organization_id,
                    start,
                    end,
                )
                .await?;
                (project.workspace_id, counts, minutes)
            }
        };

        let members = match workspace_id {
            Some(workspace_id) => WorkspaceMember::list_active(&self.pool, workspace_id).await?,
            None => Vec::new(),
        };

        let counts_by_user: HashMap<Uuid, (i64, i64)> = task_counts
            .into_iter()
            .map(|(user, assigned, completed)| (user, (assigned, completed)))
            .collect();
        let minutes_by_user: HashMap<Uuid, i64> = minutes.into_iter().collect();

        let team_members = members
            .into_iter()
            .map(|member| {
                let (assigned, completed) =
                    counts_by_user.get(&member.user_id).copied().unwrap_or((0, 0));
                let logged = minutes_by_user.get(&member.user_id).copied().unwrap_or(0);
                MemberProductivity {
                    user_id: member.user_id,
                    user_name: format!("{} {}", member.first_name, member.last_name),
                    tasks_assigned: assigned,
                    tasks_completed: completed,
                    completion_rate: completion_rate(completed, assigned),
                    time_logged_minutes: logged,
                    time_logged_hours: minutes_to_hours(logged),
                }
            })
            .collect();

        Ok(ProductivityReport { team_members })
    }
}
