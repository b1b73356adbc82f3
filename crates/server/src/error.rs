use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    epic::EpicError, project::ProjectError, project_template::TemplateError, report::ReportError,
    task::TaskError, workspace::WorkspaceError, workspace_template::WorkspaceTemplateError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    Project(#[from] ProjectError),
    #[error(transparent)]
    Epic(#[from] EpicError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    ProjectTemplate(#[from] TemplateError),
    #[error(transparent)]
    WorkspaceTemplate(#[from] WorkspaceTemplateError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Unauthorized")]
    Unauthorized,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Workspace(err) => match err {
                WorkspaceError::WorkspaceNotFound
                | WorkspaceError::UserNotFound
                | WorkspaceError::MemberNotFound => StatusCode::NOT_FOUND,
                WorkspaceError::Forbidden(_) => StatusCode::FORBIDDEN,
                WorkspaceError::Conflict(_) => StatusCode::CONFLICT,
                WorkspaceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Project(err) => match err {
                ProjectError::ProjectNotFound => StatusCode::NOT_FOUND,
                ProjectError::Forbidden(_) => StatusCode::FORBIDDEN,
                ProjectError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Epic(err) => match err {
                EpicError::ProjectNotFound | EpicError::EpicNotFound => StatusCode::NOT_FOUND,
                EpicError::Forbidden(_) => StatusCode::FORBIDDEN,
                EpicError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Task(err) => match err {
                TaskError::ProjectNotFound
                | TaskError::TaskNotFound
                | TaskError::DependentTaskNotFound
                | TaskError::CommentNotFound
                | TaskError::AttachmentNotFound
                | TaskError::DependencyNotFound
                | TaskError::TimeLogNotFound => StatusCode::NOT_FOUND,
                TaskError::Forbidden(_) => StatusCode::FORBIDDEN,
                TaskError::Conflict(_) => StatusCode::CONFLICT,
                TaskError::Validation(_) => StatusCode::BAD_REQUEST,
                TaskError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Report(err) => match err {
                ReportError::ProjectNotFound => StatusCode::NOT_FOUND,
                ReportError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::ProjectTemplate(err) => match err {
                TemplateError::TemplateNotFound | TemplateError::DeleteDenied => {
                    StatusCode::NOT_FOUND
                }
                TemplateError::Forbidden(_) => StatusCode::FORBIDDEN,
                TemplateError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::WorkspaceTemplate(err) => match err {
                WorkspaceTemplateError::TemplateNotFound | WorkspaceTemplateError::DeleteDenied => {
                    StatusCode::NOT_FOUND
                }
                WorkspaceTemplateError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {self}");
        }
        let response = ApiResponse::<()>::error(&self.to_string());
        (status_code, Json(response)).into_response()
    }
}
