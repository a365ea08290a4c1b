use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_PAYLOAD", message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        use application::ApplicationError as AppErr;
        use domain::{DomainError, RepositoryError};

        match error {
            AppErr::Domain(DomainError::InvalidArgument { field, reason }) => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVALID_ARGUMENT",
                format!("{}: {}", field, reason),
            ),
            AppErr::Domain(DomainError::ParticipantAlreadyExists) => ApiError::new(
                StatusCode::CONFLICT,
                "PARTICIPANT_EXISTS",
                "participant already exists",
            ),
            AppErr::Domain(DomainError::ParticipantNotFound) => ApiError::new(
                StatusCode::NOT_FOUND,
                "PARTICIPANT_NOT_FOUND",
                "participant not found",
            ),
            AppErr::Domain(DomainError::SenderNotRegistered) => ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "SENDER_NOT_REGISTERED",
                "sender is not a participant",
            ),
            AppErr::Domain(DomainError::ViewerNotRegistered) => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "VIEWER_NOT_REGISTERED",
                "viewer is not a participant",
            ),
            AppErr::Domain(DomainError::MessageNotFound) => ApiError::new(
                StatusCode::NOT_FOUND,
                "MESSAGE_NOT_FOUND",
                "message not found",
            ),
            AppErr::Domain(DomainError::NotMessageAuthor) => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "NOT_MESSAGE_AUTHOR",
                "only the author may change this message",
            ),
            AppErr::Domain(DomainError::NoticeImmutable) => ApiError::new(
                StatusCode::UNAUTHORIZED,
                "NOTICE_IMMUTABLE",
                "system notices cannot be changed",
            ),
            AppErr::Repository(repo_err) => match repo_err {
                RepositoryError::NotFound => ApiError::new(
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    "requested resource not found",
                ),
                RepositoryError::Conflict => {
                    ApiError::new(StatusCode::CONFLICT, "CONFLICT", "resource already exists")
                }
                RepositoryError::Storage { message, .. } => {
                    tracing::error!(error = %message, "storage failure while handling request");
                    ApiError::new(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DATABASE_ERROR",
                        format!("database error: {}", message),
                    )
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
