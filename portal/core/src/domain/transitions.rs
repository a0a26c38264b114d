// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Transition Validator
//!
//! Static adjacency tables for both record types. This table is the single
//! source of truth for status changes: every aggregate command that mutates a
//! status goes through [`validate_transition`] first.
//!
//! | Entity | From | To | Role |
//! |--------|------|----|------|
//! | Application | DRAFT | SUBMITTED | applicant-owner |
//! | Application | SUBMITTED | UNDER_REVIEW | member |
//! | Application | UNDER_REVIEW | INFO_REQUESTED | manager |
//! | Application | UNDER_REVIEW | APPROVED, DECLINED | admin |
//! | Application | INFO_REQUESTED | UNDER_REVIEW | applicant-owner |
//! | LOI | DRAFT | SUBMITTED | applicant-owner |
//! | LOI | SUBMITTED | UNDER_REVIEW | member |
//! | LOI | SUBMITTED, UNDER_REVIEW | APPROVED, DECLINED | member |

use serde::Serialize;

use crate::domain::errors::WorkflowError;
use crate::domain::policy::Role;
use crate::domain::status::{EntityKind, RecordStatus};
use RecordStatus::{Approved, Declined, Draft, InfoRequested, Submitted, UnderReview};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: RecordStatus,
    pub to: RecordStatus,
    pub required_role: Role,
}

const fn rule(from: RecordStatus, to: RecordStatus, required_role: Role) -> TransitionRule {
    TransitionRule {
        from,
        to,
        required_role,
    }
}

pub const APPLICATION_TRANSITIONS: &[TransitionRule] = &[
    rule(Draft, Submitted, Role::ApplicantOwner),
    rule(Submitted, UnderReview, Role::Member),
    rule(UnderReview, InfoRequested, Role::Manager),
    rule(UnderReview, Approved, Role::Admin),
    rule(UnderReview, Declined, Role::Admin),
    rule(InfoRequested, UnderReview, Role::ApplicantOwner),
];

pub const LOI_TRANSITIONS: &[TransitionRule] = &[
    rule(Draft, Submitted, Role::ApplicantOwner),
    rule(Submitted, UnderReview, Role::Member),
    rule(Submitted, Approved, Role::Member),
    rule(Submitted, Declined, Role::Member),
    rule(UnderReview, Approved, Role::Member),
    rule(UnderReview, Declined, Role::Member),
];

pub fn table(entity: EntityKind) -> &'static [TransitionRule] {
    match entity {
        EntityKind::Application => APPLICATION_TRANSITIONS,
        EntityKind::LetterOfInterest => LOI_TRANSITIONS,
    }
}

/// Result of asking whether `current -> target` is a legal edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionCheck {
    pub allowed: bool,
    pub required_role: Option<Role>,
    pub allowed_targets: Vec<RecordStatus>,
}

/// Statuses reachable from `current` in table order.
pub fn allowed_targets(entity: EntityKind, current: RecordStatus) -> Vec<RecordStatus> {
    table(entity)
        .iter()
        .filter(|r| r.from == current)
        .map(|r| r.to)
        .collect()
}

pub fn can_transition(
    entity: EntityKind,
    current: RecordStatus,
    target: RecordStatus,
) -> TransitionCheck {
    let edge = table(entity)
        .iter()
        .find(|r| r.from == current && r.to == target);
    TransitionCheck {
        allowed: edge.is_some(),
        required_role: edge.map(|r| r.required_role),
        allowed_targets: allowed_targets(entity, current),
    }
}

/// Returns the role the edge requires, or `InvalidTransition` naming the
/// current status and the allowed set.
pub fn validate_transition(
    entity: EntityKind,
    current: RecordStatus,
    target: RecordStatus,
) -> Result<Role, WorkflowError> {
    let check = can_transition(entity, current, target);
    match check.required_role {
        Some(role) => Ok(role),
        None => Err(WorkflowError::InvalidTransition {
            entity,
            current,
            target,
            allowed: check.allowed_targets,
        }),
    }
}
