use jsonwebtoken::errors::{Error as JwtError, ErrorKind as JwtErrorKind};
use log::{error, warn};
use reqwest::Error as HttpError;
use rocket::{
    http::Status,
    response::{Responder, Response},
    serde::json::{serde_json::Error as JsonError, Json},
    Request,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Sign in to vote")]
    AuthRequired,
    #[error("{0}")]
    Validation(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Awards API error: {0}")]
    Api(String),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Json(#[from] JsonError),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// The HTTP status this error is reported with.
    pub fn status(&self) -> Status {
        match self {
            Self::AuthRequired => Status::Unauthorized,
            Self::Validation(_) => Status::BadRequest,
            Self::Conflict(_) => Status::Conflict,
            Self::NotFound(_) => Status::NotFound,
            Self::Api(_) | Self::Http(_) | Self::Json(_) => Status::BadGateway,
            Self::Jwt(err) => match err.kind() {
                JwtErrorKind::ExpiredSignature | JwtErrorKind::ImmatureSignature => {
                    Status::Unauthorized
                }
                _ => Status::BadRequest,
            },
        }
    }

    /// Short machine-readable name for the error body.
    fn code(&self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::NotFound(_) => "not_found",
            Self::Api(_) | Self::Http(_) | Self::Json(_) => "upstream",
            Self::Jwt(_) => "bad_credential",
        }
    }
}

/// JSON body sent alongside an error status.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.code >= 500 {
            error!("{self}");
        } else {
            warn!("{self}");
        }

        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .ok()
    }
}
