// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Record loaders shared by the workflow services. Each turns a missing row
// into the client-facing NotFound error.

use crate::domain::actor::Actor;
use crate::domain::application::{Application, ApplicationId};
use crate::domain::cycle::{CycleId, GrantCycle};
use crate::domain::errors::{PreconditionViolation, WorkflowError};
use crate::domain::loi::{LetterOfInterest, LoiId};
use crate::domain::organization::OrganizationId;
use crate::domain::repository::{RepositoryError, UnitOfWork};
use crate::domain::status::{EntityKind, RecordStatus};
use crate::domain::transitions::allowed_targets;
use tracing::warn;

pub(crate) fn require_identified(actor: &Actor) -> Result<(), WorkflowError> {
    if actor.is_identified() {
        Ok(())
    } else {
        Err(WorkflowError::Unauthorized)
    }
}

pub(crate) async fn load_loi(
    uow: &mut dyn UnitOfWork,
    id: LoiId,
) -> Result<LetterOfInterest, WorkflowError> {
    uow.find_loi(id)
        .await?
        .ok_or_else(|| WorkflowError::not_found("LetterOfInterest", id))
}

pub(crate) async fn load_application(
    uow: &mut dyn UnitOfWork,
    id: ApplicationId,
) -> Result<Application, WorkflowError> {
    uow.find_application(id)
        .await?
        .ok_or_else(|| WorkflowError::not_found("Application", id))
}

pub(crate) async fn load_cycle(
    uow: &mut dyn UnitOfWork,
    id: CycleId,
) -> Result<GrantCycle, WorkflowError> {
    uow.find_cycle(id)
        .await?
        .ok_or_else(|| WorkflowError::not_found("GrantCycle", id))
}

/// Explicit record contact first, then the organization's first member.
pub(crate) async fn resolve_contact(
    uow: &mut dyn UnitOfWork,
    explicit: Option<&str>,
    organization_id: OrganizationId,
) -> Result<Option<String>, WorkflowError> {
    if let Some(email) = explicit {
        return Ok(Some(email.to_string()));
    }
    let organization = uow.find_organization(organization_id).await?;
    Ok(organization.and_then(|o| o.primary_contact().map(str::to_string)))
}

/// `InvalidTransition` for an edge that exists in the table but is not the
/// one this action drives from the record's current status.
pub(crate) fn invalid_transition(
    entity: EntityKind,
    current: RecordStatus,
    target: RecordStatus,
) -> WorkflowError {
    WorkflowError::InvalidTransition {
        entity,
        current,
        target,
        allowed: allowed_targets(entity, current),
    }
}

/// Maps a store uniqueness conflict to `violation`. Any other store failure
/// stays `DependencyUnavailable`. Used where a concurrent writer can slip past
/// the in-unit check and trip a unique index at save time.
pub(crate) fn conflict_as(
    violation: PreconditionViolation,
) -> impl FnOnce(RepositoryError) -> WorkflowError {
    move |err| match err {
        RepositoryError::Conflict(detail) => {
            warn!(detail = %detail, "Unique constraint rejected a concurrent write");
            violation.into()
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_becomes_precondition_failure() {
        let violation = PreconditionViolation::DuplicateCycle {
            label: "Spring".to_string(),
            year: 2027,
        };
        let conflict = RepositoryError::Conflict("grant_cycles_period_key".to_string());
        let err = conflict_as(violation.clone())(conflict);
        assert!(matches!(err, WorkflowError::PreconditionFailed(v) if v == violation));
    }

    #[test]
    fn test_other_store_failures_stay_unavailable() {
        let failure = RepositoryError::Database("reset".to_string());
        let err = conflict_as(PreconditionViolation::NoOrganization)(failure);
        assert_eq!(err.kind(), "dependency_unavailable");
    }
}
