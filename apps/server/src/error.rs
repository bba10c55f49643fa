use std::io::Error as IoError;

use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error(transparent)]
    Core(#[from] meshcheck::Error),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::Core(meshcheck::Error::Validation(_)) => "INVALID_REQUEST",
            AppError::Core(meshcheck::Error::NotFound(_)) => "NOT_FOUND",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Core(meshcheck::Error::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Core(meshcheck::Error::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "code": self.code(),
            "message": self.to_string(),
        }))
    }
}
