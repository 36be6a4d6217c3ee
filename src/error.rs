//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::{
        multipart::MultipartRejection,
        rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde_json::json;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The username or password did not match a registered user.
    #[error("Incorrect username or password")]
    InvalidCredentials,

    /// The request did not include a bearer token.
    #[error("Not authenticated")]
    MissingToken,

    /// The bearer token could not be decoded, has expired, or names a user
    /// that no longer exists.
    #[error("Invalid token")]
    InvalidToken,

    /// The bearer token could not be created.
    ///
    /// The error string should only be logged on the server.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// The password and the repeated password in a form were not the same.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// An empty string was used as a password.
    #[error("Password cannot be empty")]
    EmptyPassword,

    /// An empty string was used as a username.
    #[error("Username cannot be empty")]
    EmptyUsername,

    /// The username is longer than the allowed maximum.
    #[error("Username cannot be longer than {0} characters")]
    UsernameTooLong(usize),

    /// The username is already taken by another user.
    #[error("Username already exists")]
    DuplicateUsername(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A money amount was zero, negative, or not a finite number.
    #[error("{0} is not a valid amount, amounts must be greater than zero")]
    InvalidAmount(f64),

    /// A budget amount was negative or not a finite number.
    #[error("{0} is not a valid budget amount, budgets cannot be negative")]
    InvalidBudgetAmount(f64),

    /// An empty string was used as a transaction category.
    #[error("Category cannot be empty")]
    EmptyCategory,

    /// An empty string was used as a ledger name.
    #[error("Ledger name cannot be empty")]
    EmptyLedgerName,

    /// A month string was not of the form "YYYY-MM".
    #[error("\"{0}\" is not a valid month, expected the format YYYY-MM")]
    InvalidMonth(String),

    /// The request body, query string or path could not be parsed into the
    /// expected type.
    ///
    /// Carries the status code of the rejected extractor, e.g. 422 for a JSON
    /// body with a missing field.
    #[error("{1}")]
    InvalidRequest(StatusCode, String),

    /// The request body is larger than the server will read.
    #[error("Request body too large")]
    RequestBodyTooLarge,

    /// The multipart form could not be parsed.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a file field.
    #[error("No file was uploaded")]
    MissingFile,

    /// The uploaded file is not an image.
    #[error("File must be an image")]
    NotAnImage,

    /// A file could not be written to or read from disk.
    #[error("file system error: {0}")]
    FileSystemError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The transaction does not exist or belongs to another user.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// The ledger does not exist or belongs to another user.
    #[error("Ledger not found")]
    LedgerNotFound,

    /// The budget does not exist or belongs to another user.
    #[error("Budget not found")]
    BudgetNotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.ends_with("users.username") => Error::DuplicateUsername(desc.to_owned()),
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

macro_rules! impl_from_rejection {
    ($($rejection:ty),+) => {
        $(
            impl From<$rejection> for Error {
                fn from(rejection: $rejection) -> Self {
                    Error::InvalidRequest(rejection.status(), rejection.body_text())
                }
            }
        )+
    };
}

impl_from_rejection!(
    FormRejection,
    JsonRejection,
    MultipartRejection,
    PathRejection,
    QueryRejection
);

impl Error {
    /// The HTTP status code that the error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::PasswordMismatch
            | Error::EmptyPassword
            | Error::EmptyUsername
            | Error::UsernameTooLong(_)
            | Error::InvalidAmount(_)
            | Error::InvalidBudgetAmount(_)
            | Error::EmptyCategory
            | Error::EmptyLedgerName
            | Error::InvalidMonth(_)
            | Error::MultipartError(_)
            | Error::MissingFile
            | Error::NotAnImage => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::MissingToken | Error::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Error::NotFound
            | Error::TransactionNotFound
            | Error::LedgerNotFound
            | Error::BudgetNotFound => StatusCode::NOT_FOUND,
            Error::DuplicateUsername(_) => StatusCode::CONFLICT,
            Error::InvalidRequest(status, _) => *status,
            Error::RequestBodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::TokenCreation(_)
            | Error::HashingError(_)
            | Error::FileSystemError(_)
            | Error::SqlError(_)
            | Error::InvalidTimezoneError(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Any server-side errors are not intended to be shown to the client.
        let detail = if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        let mut response = (status, Json(json!({ "detail": detail }))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        response
    }
}
