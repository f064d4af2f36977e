use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The client sent something we can't search with
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("search backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("search backend did not answer within {0}ms")]
    BackendTimeout(u64),

    /// The backend refused a query built from valid input
    #[error("search backend rejected the query: {0}")]
    BackendQuery(String),

    #[error("unexpected search backend payload: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::BackendTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Decode(_) => StatusCode::BAD_GATEWAY,
            Self::BackendQuery(_) | Self::Io(_) | Self::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::Validation { field, .. } => json!({ "error": self.to_string(), "field": field }),
            Self::Io(_) | Self::Json(_) => json!({ "error": "internal error" }),
            _ => json!({ "error": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_names_the_field() {
        let err = Error::validation("difficulty", "expected easy, medium or hard");

        assert_eq!(
            "invalid difficulty: expected easy, medium or hard",
            err.to_string()
        );
        assert_eq!(StatusCode::BAD_REQUEST, err.status_code());
    }

    #[test]
    fn backend_failures_are_not_client_errors() {
        assert_eq!(
            StatusCode::SERVICE_UNAVAILABLE,
            Error::BackendUnavailable("connection refused".to_owned()).status_code()
        );
        assert_eq!(
            StatusCode::GATEWAY_TIMEOUT,
            Error::BackendTimeout(2000).status_code()
        );
        assert_eq!(
            StatusCode::INTERNAL_SERVER_ERROR,
            Error::BackendQuery("script_exception".to_owned()).status_code()
        );
    }
}
