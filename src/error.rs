//!
//! # Custom Error Handling
//!
//! This module defines the custom error type `AppError` used throughout the application.
//! Every handler returns `Result<_, AppError>`, so failures from the store, the
//! credential verifier and input validation all end up here and are rendered as
//! `{"error": "<message>"}` with the matching HTTP status.
//!
//! It also hosts the request-body and path error handlers installed on the API scope,
//! and the response rewriter that hides internal error messages outside development mode.

use actix_web::{
    body::MessageBody,
    dev::ServiceResponse,
    error::{JsonPayloadError, PathError, ResponseError},
    http::StatusCode,
    middleware::ErrorHandlerResponse,
    HttpRequest, HttpResponse,
};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Postgres SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    /// No credential was presented, or the credential carries no usable identity (HTTP 401).
    /// Also used for failed logins.
    Unauthorized(String),
    /// A credential was presented but failed verification: bad signature,
    /// malformed token or expired (HTTP 400).
    InvalidToken(String),
    /// A required field is missing or malformed (HTTP 400).
    ValidationError(String),
    /// Any other malformed request, e.g. an unparseable path identifier (HTTP 400).
    BadRequest(String),
    /// The entity does not exist or is not owned by the caller (HTTP 404).
    /// The two cases are deliberately indistinguishable.
    NotFound(String),
    /// A uniqueness constraint was violated, e.g. a duplicate email (HTTP 409).
    Conflict(String),
    /// Represents an unexpected server-side error (HTTP 500).
    InternalServerError(String),
    /// Represents an error originating from the store (HTTP 500).
    DatabaseError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::InvalidToken(msg) => write!(f, "Invalid Token: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl AppError {
    fn message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::InvalidToken(msg)
            | AppError::ValidationError(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::InternalServerError(msg)
            | AppError::DatabaseError(msg) => msg,
        }
    }
}

/// Converts `AppError` variants into `HttpResponse` objects.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidToken(_) | AppError::ValidationError(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.message()
        }))
    }
}

/// Converts `sqlx::Error` into `AppError`.
///
/// `RowNotFound` becomes `NotFound`, a unique-index violation becomes `Conflict`,
/// everything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                AppError::Conflict("Record already exists".into())
            }
            _ => {
                log::error!("Store operation failed: {}", error);
                AppError::DatabaseError(error.to_string())
            }
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        log::error!("Migration failed: {}", error);
        AppError::DatabaseError(error.to_string())
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// Error handler for `web::JsonConfig`: wrong types, missing fields and
/// unparseable bodies are all validation failures.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::ValidationError(err.to_string()).into()
}

/// Error handler for `web::PathConfig`.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    log::debug!("rejecting malformed path parameter: {}", err);
    AppError::BadRequest("Invalid identifier format".into()).into()
}

/// Replaces the body of any 500 response with a generic message.
///
/// Installed through `middleware::ErrorHandlers` when not running in development mode.
pub fn redact_internal_error<B: MessageBody + 'static>(
    res: ServiceResponse<B>,
) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let (req, _) = res.into_parts();
    let redacted = HttpResponse::InternalServerError().json(json!({
        "error": "Internal server error"
    }));
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, redacted).map_into_right_body(),
    ))
}
