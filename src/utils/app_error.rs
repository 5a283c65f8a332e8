use crate::storage::StorageError;
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;

/// Everything a request can fail with. Each variant maps to exactly one status code.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Expired,
    Forbidden,
    Storage(StorageError),
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

/// JSON body sent with every error response.
#[derive(Serialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WebMessage {
    pub http_status: String,
    pub http_status_code: u16,
    pub status: Status,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_message: Option<String>,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Warning,
    Error,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Expired => StatusCode::GONE,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn web_message(&self) -> WebMessage {
        let code = self.status_code();
        let (status, message, dev_message) = match self {
            Self::NotFound(token) => (Status::Error, format!("No file found with key '{token}'"), None),
            Self::Expired => (Status::Warning, "The key you requested has expired".to_string(), None),
            Self::Forbidden => (
                Status::Error,
                "The resource you are trying to access is not publicly available".to_string(),
                None,
            ),
            Self::Storage(error) => (
                Status::Error,
                "Failed fetching the file from storage".to_string(),
                Some(error.cause().to_string()),
            ),
            Self::Internal(_) => (Status::Error, "Something went wrong".to_string(), None),
        };

        WebMessage {
            http_status: code.canonical_reason().unwrap_or_default().to_string(),
            http_status_code: code.as_u16(),
            status,
            message,
            dev_message,
        }
    }
}

// Tell axum how to convert `AppError` into a response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Storage(error) => tracing::error!(%error, "storage failure"),
            Self::Internal(error) => tracing::error!(%error, "request failed"),
            _ => tracing::warn!(status = self.status_code().as_u16(), "request rejected"),
        }

        (self.status_code(), Json(self.web_message())).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

// This enables using `?` on collaborator calls
impl From<Box<dyn std::error::Error + Send + Sync>> for AppError {
    fn from(error: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Internal(error)
    }
}
