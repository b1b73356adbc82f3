//! Best-effort notification fan-out.
//!
//! Writes rows the delivery pipeline picks up later. Every caller goes
//! through [`NotificationDispatch::send_best_effort`], which logs failures
//! and swallows them so the primary mutation is never affected.

use db::models::notification::Notification;
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    TaskCreated,
    TaskAssigned,
    TaskUnassigned,
    TaskStatusChanged,
    TaskPriorityChanged,
    TaskDueDateChanged,
    TaskCommentAdded,
}

impl NotificationType {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationType::TaskCreated => "task_created",
            NotificationType::TaskAssigned => "task_assigned",
            NotificationType::TaskUnassigned => "task_unassigned",
            NotificationType::TaskStatusChanged => "task_status_changed",
            NotificationType::TaskPriorityChanged => "task_priority_changed",
            NotificationType::TaskDueDateChanged => "task_due_date_changed",
            NotificationType::TaskCommentAdded => "task_comment_added",
        }
    }
}

#[derive(Clone)]
pub struct NotificationDispatch {
    pool: SqlitePool,
}

impl NotificationDispatch {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn send(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        notification_type: NotificationType,
        title: &str,
        body: &str,
        payload: serde_json::Value,
    ) -> Result<(), sqlx::Error> {
        Notification::create(
            &self.pool,
            Uuid::new_v4(),
            user_id,
            organization_id,
            notification_type.as_str(),
            title,
            body,
            payload,
        )
        .await?;
        Ok(())
    }

    pub async fn send_best_effort(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
        notification_type: NotificationType,
        title: &str,
        body: &str,
        payload: serde_json::Value,
    ) {
        if let Err(err) = self
            .send(
                user_id,
                organization_id,
                notification_type,
                title,
                body,
                payload,
            )
            .await
        {
            tracing::warn!(
                %user_id,
                kind = notification_type.as_str(),
                "failed to write notification: {err}"
            );
        }
    }
}
