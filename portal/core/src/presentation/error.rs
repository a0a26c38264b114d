// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use crate::domain::errors::WorkflowError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Malformed path parameter or identity header.
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Workflow(err) => match err {
                WorkflowError::Unauthorized => StatusCode::UNAUTHORIZED,
                WorkflowError::Forbidden { .. } => StatusCode::FORBIDDEN,
                WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
                WorkflowError::InvalidTransition { .. } => StatusCode::CONFLICT,
                WorkflowError::PreconditionFailed(_) => StatusCode::PRECONDITION_FAILED,
                WorkflowError::DependencyUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Workflow(err) => err.kind(),
        }
    }

    fn details(&self) -> Value {
        match self {
            Self::Workflow(WorkflowError::Forbidden { action, required, actual }) => json!({
                "action": action,
                "required_role": required,
                "actual_role": actual,
            }),
            Self::Workflow(WorkflowError::NotFound { entity, id }) => json!({
                "entity": entity,
                "id": id,
            }),
            Self::Workflow(WorkflowError::InvalidTransition {
                entity,
                current,
                target,
                allowed,
            }) => json!({
                "entity": entity,
                "current": current,
                "target": target,
                "allowed": allowed,
            }),
            Self::Workflow(WorkflowError::PreconditionFailed(violation)) => {
                serde_json::to_value(violation).unwrap_or(Value::Null)
            }
            _ => Value::Null,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
            "details": self.details(),
        });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::PreconditionViolation;
    use crate::domain::status::{EntityKind, RecordStatus};

    #[test]
    fn test_error_status_codes() {
        assert_eq!(
            ApiError::from(WorkflowError::Unauthorized).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(WorkflowError::not_found("letter of interest", "x")).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(WorkflowError::InvalidTransition {
                entity: EntityKind::Application,
                current: RecordStatus::Approved,
                target: RecordStatus::Declined,
                allowed: vec![],
            })
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(WorkflowError::from(PreconditionViolation::NoOrganization))
                .status_code(),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(
            ApiError::from(WorkflowError::DependencyUnavailable("db".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(ApiError::BadRequest("id".into()).status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_precondition_details_carry_violation_tag() {
        let err = ApiError::from(WorkflowError::from(PreconditionViolation::RequestExceedsMaximum {
            requested: 60_000,
            maximum: 50_000,
        }));
        let details = err.details();
        assert_eq!(details["violation"], "request_exceeds_maximum");
        assert_eq!(details["maximum"], 50_000);
    }
}
