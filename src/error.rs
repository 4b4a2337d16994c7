// HTTP API Error Types
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::{json, Value};

use crate::auth::OAuthError;
use crate::database::models::ValidationError;
use crate::database::repository::RepoError;
use crate::services::ServiceError;
use crate::session::SessionError;
use crate::storage::StorageError;

/// HTTP API error with appropriate status codes and client-facing messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        errors: Vec<ValidationError>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized { message: String, redirect_url: Option<String> },

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError { .. } | ApiError::InvalidJson(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::InvalidJson(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg)
            | ApiError::InternalServerError(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized { message, .. } => message,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized { .. } => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// `{"error": ..., "code": ..., "redirect_url"?, "validation_errors"?}`
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": self.message(),
            "code": self.error_code(),
        });
        match self {
            ApiError::ValidationError { errors, .. } => {
                body["validation_errors"] = json!(errors);
            }
            ApiError::Unauthorized {
                redirect_url: Some(url), ..
            } => {
                body["redirect_url"] = json!(url);
            }
            _ => {}
        }
        body
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, errors: Vec<ValidationError>) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: message.into(),
            redirect_url: None,
        }
    }

    /// 401 that tells the browser client where to log in
    pub fn login_required(redirect_url: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            message: "you must be logged in to access this resource".to_string(),
            redirect_url: Some(redirect_url.into()),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    /// 400 when `errors` is non-empty
    pub fn check(errors: Vec<ValidationError>) -> Result<(), ApiError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_error("validation failed", errors))
        }
    }
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { .. } => ApiError::not_found(err.to_string()),
            RepoError::Conflict(_) => ApiError::conflict(err.to_string()),
            other => {
                tracing::error!("repository error: {}", other);
                ApiError::internal_server_error(other.to_string())
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(_) => ApiError::bad_request(err.to_string()),
            StorageError::NotFound { .. } => ApiError::not_found(err.to_string()),
            StorageError::Expired | StorageError::InvalidSignature => ApiError::forbidden(err.to_string()),
            StorageError::SigningKey(_) => {
                tracing::error!("{}", err);
                ApiError::internal_server_error(err.to_string())
            }
            StorageError::Io(e) => {
                tracing::error!("object storage error: {}", e);
                ApiError::internal_server_error(format!("object storage error: {}", e))
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Repo(e) => e.into(),
            ServiceError::Storage(e) => e.into(),
            ServiceError::GradeNotFound(_) => ApiError::not_found(err.to_string()),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        tracing::error!("session error: {}", err);
        ApiError::internal_server_error(err.to_string())
    }
}

impl From<OAuthError> for ApiError {
    fn from(err: OAuthError) -> Self {
        tracing::error!("identity provider error: {}", err);
        ApiError::internal_server_error(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::invalid_json(format!("failed to decode json: {}", rejection.body_text()))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

/// Failure while serving an HTML page: logged, then the browser is sent to `/500`
#[derive(Debug)]
pub struct PageError(String);

impl<E: std::error::Error> From<E> for PageError {
    fn from(err: E) -> Self {
        PageError(err.to_string())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!("page rendering failed: {}", self.0);
        Redirect::to("/500").into_response()
    }
}
