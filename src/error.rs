use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::repository::RepositoryError;
use crate::rules::{RuleViolation, ViolationReport};

/// Every failure a handler can surface, mapped onto an HTTP status.
#[derive(Debug, Display)]
pub enum ApiError {
    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "{}", _0)]
    BadRequest(String),

    /// first rule broken while listing, aborts the whole response
    #[display(fmt = "{}", _0)]
    Rule(RuleViolation),

    /// every rule broken by a write
    #[display(fmt = "Leave request violates business rules")]
    Violations(Vec<RuleViolation>),

    #[display(fmt = "{}", _0)]
    Conflict(String),

    #[display(fmt = "Internal Server Error")]
    Internal(String),
}

impl std::error::Error for ApiError {}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::Rule(_) | ApiError::Violations(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Violations(violations) => {
                let reports: Vec<ViolationReport> =
                    violations.iter().map(ViolationReport::from).collect();
                json!({ "message": self.to_string(), "violations": reports })
            }
            ApiError::Internal(detail) => {
                tracing::error!(error = %detail, "Request failed");
                json!({ "message": self.to_string() })
            }
            _ => json!({ "message": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<RuleViolation> for ApiError {
    fn from(v: RuleViolation) -> Self {
        ApiError::Rule(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn internal_errors_hide_detail() {
        let err = ApiError::Internal("connection reset".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["message"], "Internal Server Error");
    }

    #[actix_web::test]
    async fn violations_are_listed_in_body() {
        let err = ApiError::Violations(vec![RuleViolation::SickReasonMissing]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["violations"][0]["code"], "sick_reason_missing");
    }
}
