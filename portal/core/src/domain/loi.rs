// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Letter of Interest Aggregate
//!
//! The lightweight first-stage proposal. Status changes are aggregate
//! commands that consult the transition table; submission readiness
//! (required fields, word ceilings) is checked here so every caller applies
//! the same rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::actor::{Actor, ActorId};
use crate::domain::application::ApplicationId;
use crate::domain::cycle::CycleId;
use crate::domain::errors::{PreconditionViolation, WorkflowError};
use crate::domain::organization::OrganizationId;
use crate::domain::status::{Decision, EntityKind, RecordStatus};
use crate::domain::transitions::validate_transition;

pub const DESCRIPTION_WORD_LIMIT: usize = 500;
pub const GOALS_WORD_LIMIT: usize = 500;
pub const BUDGET_OUTLINE_WORD_LIMIT: usize = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoiId(pub Uuid);

impl LoiId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for LoiId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LoiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Applicant-authored LOI fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoiContent {
    pub title: String,
    pub description: String,
    pub goals: String,
    pub focus_area: String,
    pub budget_outline: String,
    pub requested_amount: Option<u64>,
    pub total_project_amount: Option<u64>,
    pub percentage_of_project: Option<f64>,
    pub mission_statement: String,
    pub contact_email: Option<String>,
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

impl LoiContent {
    /// Field names that must be non-empty before submission.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("goals", &self.goals),
            ("focus_area", &self.focus_area),
            ("budget_outline", &self.budget_outline),
        ] {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        if self.requested_amount.is_none() {
            missing.push("requested_amount");
        }
        missing
    }

    /// First field over its word ceiling, if any.
    pub fn word_limit_violation(&self) -> Option<PreconditionViolation> {
        [
            ("description", &self.description, DESCRIPTION_WORD_LIMIT),
            ("goals", &self.goals, GOALS_WORD_LIMIT),
            ("budget_outline", &self.budget_outline, BUDGET_OUTLINE_WORD_LIMIT),
        ]
        .into_iter()
        .find_map(|(field, text, limit)| {
            let words = word_count(text);
            (words > limit).then_some(
                PreconditionViolation::WordLimitExceeded { field, words, limit },
            )
        })
    }

    pub fn check_submittable(&self) -> Result<(), PreconditionViolation> {
        let missing = self.missing_required_fields();
        if !missing.is_empty() {
            return Err(PreconditionViolation::MissingRequiredFields { fields: missing });
        }
        match self.word_limit_violation() {
            Some(violation) => Err(violation),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LetterOfInterest {
    pub id: LoiId,
    pub organization_id: OrganizationId,
    pub cycle_id: CycleId,
    pub status: RecordStatus,
    pub content: LoiContent,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<ActorId>,
    pub review_started_at: Option<DateTime<Utc>>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<ActorId>,
    pub reviewer_name: Option<String>,
    pub decision_reason: Option<String>,
    pub reviewer_notes: Option<String>,
    pub notification_sent: bool,
    pub notification_sent_at: Option<DateTime<Utc>>,
    pub derived_application_id: Option<ApplicationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LetterOfInterest {
    pub fn new_draft(
        organization_id: OrganizationId,
        cycle_id: CycleId,
        content: LoiContent,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: LoiId::new(),
            organization_id,
            cycle_id,
            status: RecordStatus::Draft,
            content,
            submitted_at: None,
            submitted_by: None,
            review_started_at: None,
            reviewed_at: None,
            reviewed_by: None,
            reviewer_name: None,
            decision_reason: None,
            reviewer_notes: None,
            notification_sent: false,
            notification_sent_at: None,
            derived_application_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `target` if the table allows it; returns the previous status.
    fn transition_to(
        &mut self,
        target: RecordStatus,
        at: DateTime<Utc>,
    ) -> Result<RecordStatus, WorkflowError> {
        validate_transition(EntityKind::LetterOfInterest, self.status, target)?;
        let previous = self.status;
        self.status = target;
        self.updated_at = at;
        Ok(previous)
    }

    pub fn replace_content(&mut self, content: LoiContent) -> Result<(), PreconditionViolation> {
        if self.status != RecordStatus::Draft {
            return Err(PreconditionViolation::NotDraft { status: self.status });
        }
        self.content = content;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn submit(
        &mut self,
        actor: &Actor,
        at: DateTime<Utc>,
    ) -> Result<RecordStatus, WorkflowError> {
        let previous = self.transition_to(RecordStatus::Submitted, at)?;
        self.submitted_at = Some(at);
        self.submitted_by = Some(actor.id.clone());
        Ok(previous)
    }

    pub fn begin_review(&mut self, at: DateTime<Utc>) -> Result<RecordStatus, WorkflowError> {
        let previous = self.transition_to(RecordStatus::UnderReview, at)?;
        self.review_started_at = Some(at);
        Ok(previous)
    }

    pub fn record_decision(
        &mut self,
        decision: Decision,
        reviewer: &Actor,
        reason: Option<String>,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<RecordStatus, WorkflowError> {
        let previous = self.transition_to(decision.status(), at)?;
        self.reviewed_at = Some(at);
        self.reviewed_by = Some(reviewer.id.clone());
        self.reviewer_name = Some(reviewer.audit_name());
        self.decision_reason = reason;
        self.reviewer_notes = notes;
        self.notification_sent = false;
        self.notification_sent_at = None;
        Ok(previous)
    }

    /// Link the Application spawned by approval. Only valid on an approved LOI.
    pub fn attach_derived_application(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<(), WorkflowError> {
        if self.status != RecordStatus::Approved {
            return Err(WorkflowError::InvalidTransition {
                entity: EntityKind::LetterOfInterest,
                current: self.status,
                target: RecordStatus::Approved,
                allowed: crate::domain::transitions::allowed_targets(
                    EntityKind::LetterOfInterest,
                    self.status,
                ),
            });
        }
        self.derived_application_id = Some(application_id);
        Ok(())
    }

    /// Decided and not yet released to the applicant.
    pub fn is_pending_release(&self) -> bool {
        self.status.is_decided() && !self.notification_sent
    }

    pub fn mark_released(&mut self, at: DateTime<Utc>) {
        self.notification_sent = true;
        self.notification_sent_at = Some(at);
        self.updated_at = at;
    }

    pub fn contact_email(&self) -> Option<&str> {
        self.content
            .contact_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::StaffGrade;

    fn complete_content() -> LoiContent {
        LoiContent {
            title: "Riverbank restoration".to_string(),
            description: "Restore two miles of riverbank habitat.".to_string(),
            goals: "Plant native species and monitor erosion.".to_string(),
            focus_area: "Environment".to_string(),
            budget_outline: "Plants, labor, monitoring equipment.".to_string(),
            requested_amount: Some(25_000),
            ..LoiContent::default()
        }
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("  one two\tthree\nfour "), 4);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_missing_fields_reported_by_name() {
        let content = LoiContent {
            title: "Only a title".to_string(),
            ..LoiContent::default()
        };
        assert_eq!(
            content.missing_required_fields(),
            vec!["description", "goals", "focus_area", "budget_outline", "requested_amount"]
        );
    }

    #[test]
    fn test_word_limits() {
        let mut content = complete_content();
        content.budget_outline = vec!["word"; BUDGET_OUTLINE_WORD_LIMIT].join(" ");
        assert!(content.check_submittable().is_ok());

        content.budget_outline.push_str(" extra");
        assert_eq!(
            content.check_submittable(),
            Err(PreconditionViolation::WordLimitExceeded {
                field: "budget_outline",
                words: BUDGET_OUTLINE_WORD_LIMIT + 1,
                limit: BUDGET_OUTLINE_WORD_LIMIT,
            })
        );
    }

    #[test]
    fn test_decision_resets_release_flag_and_stamps_reviewer() {
        let mut loi = LetterOfInterest::new_draft(
            OrganizationId::new(),
            CycleId::new(),
            complete_content(),
        );
        let applicant = Actor::applicant("u-1", "Ada", loi.organization_id);
        let reviewer = Actor::staff("s-1", "Rae", StaffGrade::Member);
        let now = Utc::now();

        assert_eq!(loi.submit(&applicant, now).unwrap(), RecordStatus::Draft);
        assert_eq!(
            loi.record_decision(
                Decision::Declined,
                &reviewer,
                Some("Out of scope".into()),
                None,
                now,
            )
                .unwrap(),
            RecordStatus::Submitted
        );
        assert_eq!(loi.reviewer_name.as_deref(), Some("Rae"));
        assert!(loi.is_pending_release());
        assert!(loi.derived_application_id.is_none());
    }

    #[test]
    fn test_cannot_attach_application_unless_approved() {
        let mut loi = LetterOfInterest::new_draft(
            OrganizationId::new(),
            CycleId::new(),
            complete_content(),
        );
        assert!(loi.attach_derived_application(ApplicationId::new()).is_err());
        assert!(loi.derived_application_id.is_none());
    }

    #[test]
    fn test_content_frozen_after_submission() {
        let mut loi = LetterOfInterest::new_draft(
            OrganizationId::new(),
            CycleId::new(),
            complete_content(),
        );
        let applicant = Actor::applicant("u-1", "Ada", loi.organization_id);
        loi.submit(&applicant, Utc::now()).unwrap();
        assert_eq!(
            loi.replace_content(LoiContent::default()),
            Err(PreconditionViolation::NotDraft { status: RecordStatus::Submitted })
        );
    }
}
