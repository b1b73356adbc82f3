pub mod epic;
pub mod notification;
pub mod organization;
pub mod project;
pub mod project_template;
pub mod task;
pub mod task_activity;
pub mod task_attachment;
pub mod task_comment;
pub mod task_dependency;
pub mod task_time_log;
pub mod user;
pub mod workspace;
pub mod workspace_member;
pub mod workspace_template;
