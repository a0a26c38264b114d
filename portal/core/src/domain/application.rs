// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Aggregate
//!
//! A full grant application, either created directly by an applicant or
//! derived from an approved Letter of Interest. The business payload is
//! opaque to the workflow and carried as JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::actor::{Actor, ActorId};
use crate::domain::cycle::CycleId;
use crate::domain::errors::{PreconditionViolation, WorkflowError};
use crate::domain::loi::{LetterOfInterest, LoiId};
use crate::domain::organization::OrganizationId;
use crate::domain::status::{Decision, EntityKind, RecordStatus};
use crate::domain::transitions::validate_transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for ApplicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Summary fields copied from an LOI on derivation, editable while in draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSummary {
    pub title: String,
    pub description: String,
    pub focus_area: String,
    pub requested_amount: Option<u64>,
    pub total_project_amount: Option<u64>,
    pub percentage_of_project: Option<f64>,
    pub mission_statement: String,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub organization_id: OrganizationId,
    pub cycle_id: CycleId,
    /// Set when the application was spawned by LOI approval.
    pub loi_id: Option<LoiId>,
    pub status: RecordStatus,
    pub summary: ApplicationSummary,
    pub payload: serde_json::Value,
    pub submitted_at: Option<DateTime<Utc>>,
    pub submitted_by: Option<ActorId>,
    pub review_started_at: Option<DateTime<Utc>>,
    pub decided_at: Option<DateTime<Utc>>,
    pub decided_by: Option<ActorId>,
    pub decision_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    /// Direct-path draft. The (organization, cycle) uniqueness check is the
    /// caller's job because it needs the record store.
    pub fn new_draft(
        organization_id: OrganizationId,
        cycle_id: CycleId,
        summary: ApplicationSummary,
        payload: serde_json::Value,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ApplicationId::new(),
            organization_id,
            cycle_id,
            loi_id: None,
            status: RecordStatus::Draft,
            summary,
            payload,
            submitted_at: None,
            submitted_by: None,
            review_started_at: None,
            decided_at: None,
            decided_by: None,
            decision_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Draft pre-populated from an approved LOI, carrying a back-reference.
    pub fn derived_from(loi: &LetterOfInterest) -> Self {
        let content = &loi.content;
        let summary = ApplicationSummary {
            title: content.title.clone(),
            description: content.description.clone(),
            focus_area: content.focus_area.clone(),
            requested_amount: content.requested_amount,
            total_project_amount: content.total_project_amount,
            percentage_of_project: content.percentage_of_project,
            mission_statement: content.mission_statement.clone(),
            contact_email: content.contact_email.clone(),
        };
        let mut application = Self::new_draft(
            loi.organization_id,
            loi.cycle_id,
            summary,
            serde_json::Value::Object(serde_json::Map::new()),
        );
        application.loi_id = Some(loi.id);
        application
    }

    fn transition_to(
        &mut self,
        target: RecordStatus,
        at: DateTime<Utc>,
    ) -> Result<RecordStatus, WorkflowError> {
        validate_transition(EntityKind::Application, self.status, target)?;
        let previous = self.status;
        self.status = target;
        self.updated_at = at;
        Ok(previous)
    }

    pub fn update_draft(
        &mut self,
        summary: ApplicationSummary,
        payload: serde_json::Value,
    ) -> Result<(), PreconditionViolation> {
        if self.status != RecordStatus::Draft {
            return Err(PreconditionViolation::NotDraft { status: self.status });
        }
        self.summary = summary;
        self.payload = payload;
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
        if self.review_started_at.is_none() {
            self.review_started_at = Some(at);
        }
        Ok(previous)
    }

    pub fn request_info(&mut self, at: DateTime<Utc>) -> Result<RecordStatus, WorkflowError> {
        self.transition_to(RecordStatus::InfoRequested, at)
    }

    pub fn resume_review(&mut self, at: DateTime<Utc>) -> Result<RecordStatus, WorkflowError> {
        self.transition_to(RecordStatus::UnderReview, at)
    }

    pub fn record_decision(
        &mut self,
        decision: Decision,
        actor: &Actor,
        reason: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<RecordStatus, WorkflowError> {
        let previous = self.transition_to(decision.status(), at)?;
        self.decided_at = Some(at);
        self.decided_by = Some(actor.id.clone());
        self.decision_reason = reason;
        Ok(previous)
    }

    pub fn is_derived(&self) -> bool {
        self.loi_id.is_some()
    }

    pub fn contact_email(&self) -> Option<&str> {
        self.summary
            .contact_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}
