use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Hash(String),
    Session(String),
    BadRequest(String),
    Unauthorized,
    PermissionDenied(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(String),
}

/// Error body shared by every failing endpoint.
#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub success: bool,
    pub error: String,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Hash(e) => write!(f, "Hash error: {e}"),
            AppError::Session(e) => write!(f, "Session error: {e}"),
            AppError::BadRequest(msg) => write!(f, "{msg}"),
            AppError::Unauthorized => write!(f, "Authentication required"),
            AppError::PermissionDenied(msg) => write!(f, "Permission denied: {msg}"),
            AppError::NotFound(msg) => write!(f, "{msg}"),
            AppError::Conflict(msg) => write!(f, "{msg}"),
            AppError::TooManyRequests(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Db(_) | AppError::Hash(_) | AppError::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let error = if status.is_server_error() {
            log::error!("{self}");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorBody { success: false, error })
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = e {
            return AppError::NotFound("Not found".to_string());
        }
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                let msg = match db_err.constraint() {
                    Some("status_definitions_code_uq") => "Status code already exists",
                    Some("status_definitions_name_uq") => "Status name already exists",
                    Some("status_definitions_default_uq") => "Another default status already exists",
                    Some("users_username_key") => "Username already exists",
                    _ => "Duplicate value",
                };
                return AppError::Conflict(msg.to_string());
            }
        }
        AppError::Db(e)
    }
}
