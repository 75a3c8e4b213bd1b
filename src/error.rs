use jsonwebtoken::errors::Error as JwtError;
use log::{error, warn};
use mongodb::{bson::de::Error as BsonDeError, error::Error as DbError};
use rocket::{
    http::{Status, StatusClass},
    response::{self, Responder},
    serde::json::Json,
    Catcher, Request,
};
use serde::Serialize;
use thiserror::Error;

use crate::model::{common::VotingClosed, mongodb::is_transient};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error(transparent)]
    Bson(#[from] BsonDeError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    VotingClosed(#[from] VotingClosed),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a [`Error::NotFound`] for the given resource description.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Create a [`Error::Validation`] with the given reason.
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation(reason.into())
    }

    /// Whether the transaction that failed with this error may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Db(err) if is_transient(err))
    }

    /// The machine-checkable category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) | Self::VotingClosed(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Unauthorized(_) | Self::Jwt(_) => ErrorKind::Unauthorized,
            Self::Db(_) | Self::Bson(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self.kind() {
            ErrorKind::NotFound => Status::NotFound,
            // A duplicate vote is reported as a bad request, like any other
            // rejected vote.
            ErrorKind::Validation | ErrorKind::Conflict => Status::BadRequest,
            ErrorKind::Unauthorized => Status::Unauthorized,
            ErrorKind::Internal => Status::InternalServerError,
        }
    }
}

/// Error categories exposed to API clients.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Unauthorized,
    Internal,
}

/// The JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorKind,
    detail: String,
}

impl ErrorBody {
    fn new(error: ErrorKind, detail: &str) -> Json<Self> {
        Json(Self {
            error,
            detail: detail.to_string(),
        })
    }
}

/// Catchers giving JSON bodies to errors raised outside of handlers, e.g. by
/// a failing request guard or an unmatched route.
pub fn catchers() -> Vec<Catcher> {
    catchers![
        bad_request,
        unauthorized,
        not_found,
        unprocessable_entity,
        internal_error
    ]
}

#[catch(400)]
fn bad_request() -> Json<ErrorBody> {
    ErrorBody::new(ErrorKind::Validation, "Malformed request")
}

#[catch(401)]
fn unauthorized() -> Json<ErrorBody> {
    ErrorBody::new(ErrorKind::Unauthorized, "Missing or invalid admin token")
}

#[catch(404)]
fn not_found(req: &Request) -> Json<ErrorBody> {
    ErrorBody::new(ErrorKind::NotFound, &format!("No route for {}", req.uri()))
}

#[catch(422)]
fn unprocessable_entity() -> Json<ErrorBody> {
    ErrorBody::new(ErrorKind::Validation, "Request body has missing or invalid fields")
}

#[catch(500)]
fn internal_error() -> Json<ErrorBody> {
    ErrorBody::new(ErrorKind::Internal, "Internal server error")
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'o> {
        let status = self.status();
        let detail = match status.class() {
            StatusClass::ServerError => {
                error!("{} {}: {self}", req.method(), req.uri());
                "Internal server error".to_string()
            }
            _ => {
                warn!("{} {}: {self}", req.method(), req.uri());
                match self {
                    Self::NotFound(ref what) => format!("{what} not found"),
                    Self::Validation(ref reason)
                    | Self::Conflict(ref reason)
                    | Self::Unauthorized(ref reason) => reason.clone(),
                    ref other => other.to_string(),
                }
            }
        };

        let body = ErrorBody {
            error: self.kind(),
            detail,
        };
        let mut response = Json(body).respond_to(req)?;
        response.set_status(status);
        Ok(response)
    }
}
