// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Workflow Errors
//!
//! Client-facing failure taxonomy for every workflow action. The first five
//! kinds are raised before any mutation begins and carry enough detail for the
//! caller to self-correct. `DependencyUnavailable` covers record-store and
//! notification-sender failures.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::domain::policy::Role;
use crate::domain::repository::RepositoryError;
use crate::domain::status::{EntityKind, RecordStatus};

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No identifiable actor on the request")]
    Unauthorized,

    #[error("Action '{action}' requires role {required} but caller has role {actual}")]
    Forbidden {
        action: &'static str,
        required: Role,
        actual: Role,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error(
        "Cannot move {entity} from {current} to {target}; allowed targets: {}",
        format_statuses(.allowed)
    )]
    InvalidTransition {
        entity: EntityKind,
        current: RecordStatus,
        target: RecordStatus,
        allowed: Vec<RecordStatus>,
    },

    #[error("Precondition failed: {0}")]
    PreconditionFailed(PreconditionViolation),

    #[error("Dependency unavailable: {0}")]
    DependencyUnavailable(String),
}

impl WorkflowError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable kind, used by the HTTP surface.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Forbidden { .. } => "forbidden",
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::PreconditionFailed(_) => "precondition_failed",
            Self::DependencyUnavailable(_) => "dependency_unavailable",
        }
    }
}

impl From<PreconditionViolation> for WorkflowError {
    fn from(violation: PreconditionViolation) -> Self {
        Self::PreconditionFailed(violation)
    }
}

impl From<RepositoryError> for WorkflowError {
    fn from(err: RepositoryError) -> Self {
        Self::DependencyUnavailable(format!("record store: {}", err))
    }
}

fn format_statuses(statuses: &[RecordStatus]) -> String {
    if statuses.is_empty() {
        return "none".to_string();
    }
    statuses
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Why a structurally legal action was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum PreconditionViolation {
    #[error("deadline {deadline} has passed")]
    DeadlinePassed { deadline: DateTime<Utc> },

    #[error("required fields are empty: {}", .fields.join(", "))]
    MissingRequiredFields { fields: Vec<&'static str> },

    #[error("field '{field}' has {words} words; the limit is {limit}")]
    WordLimitExceeded {
        field: &'static str,
        words: usize,
        limit: usize,
    },

    #[error("requested amount {requested} exceeds the cycle maximum of {maximum}")]
    RequestExceedsMaximum { requested: u64, maximum: u64 },

    #[error("a {entity} already exists for this organization and cycle ({existing_id})")]
    DuplicateRecord {
        entity: EntityKind,
        existing_id: String,
    },

    #[error("information request {communication_id} is still awaiting a response")]
    PendingInfoRequest { communication_id: String },

    #[error("communication {communication_id} has already been answered")]
    CommunicationAlreadyAnswered { communication_id: String },

    #[error("communication {communication_id} does not require a response")]
    CommunicationNotPending { communication_id: String },

    #[error("cycle {cycle} is not accepting {intake}")]
    CycleNotAccepting { cycle: String, intake: &'static str },

    #[error("cycle {cycle} still owns {lois} LOI(s) and {applications} application(s)")]
    CycleInUse {
        cycle: String,
        lois: u64,
        applications: u64,
    },

    #[error("a cycle labelled {label} {year} already exists")]
    DuplicateCycle { label: String, year: i32 },

    #[error("another cycle was activated while activating {cycle}; retry")]
    ActivationConflict { cycle: String },

    #[error("only draft records can be changed or deleted; current status is {status}")]
    NotDraft { status: RecordStatus },

    #[error("review inputs are closed because the application is {status}")]
    ReviewClosed { status: RecordStatus },

    #[error("score '{field}' must be a number between {min} and {max}")]
    InvalidScore { field: &'static str, min: f64, max: f64 },

    #[error("actor is not associated with an applicant organization")]
    NoOrganization,

    #[error("application was created by approving LOI {loi_id} and cannot be deleted on its own")]
    DerivedFromLoi { loi_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_message_lists_allowed_targets() {
        let err = WorkflowError::InvalidTransition {
            entity: EntityKind::Application,
            current: RecordStatus::UnderReview,
            target: RecordStatus::Submitted,
            allowed: vec![
                RecordStatus::InfoRequested,
                RecordStatus::Approved,
                RecordStatus::Declined,
            ],
        };
        let message = err.to_string();
        assert!(message.contains("UNDER_REVIEW"));
        assert!(message.contains("INFO_REQUESTED, APPROVED, DECLINED"));
    }

    #[test]
    fn test_invalid_transition_from_terminal_reports_none() {
        let err = WorkflowError::InvalidTransition {
            entity: EntityKind::LetterOfInterest,
            current: RecordStatus::Approved,
            target: RecordStatus::Declined,
            allowed: vec![],
        };
        assert!(err.to_string().ends_with("allowed targets: none"));
    }

    #[test]
    fn test_repository_error_maps_to_dependency_unavailable() {
        let err: WorkflowError = RepositoryError::Database("connection reset".to_string()).into();
        assert_eq!(err.kind(), "dependency_unavailable");
    }
}
