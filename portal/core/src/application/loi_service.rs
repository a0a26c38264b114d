// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # LOI Review Workflow
//!
//! Submission, review start and decision for Letters of Interest.
//!
//! `decide_loi` with an approval is the one compound transition in the
//! system: the LOI status change, the derived draft Application and the LOI
//! history entry are staged in one unit of work and commit together. The
//! decision is not announced to the applicant here; that happens when the
//! decision is released (see [`crate::application::release_service`]).
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Collaborators:** `GrantStore`, `AccessPolicy`, `AuditTrail`,
//!   `NotificationDispatcher`, `EventBus`

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::application::audit_trail::AuditTrail;
use crate::application::notification_dispatcher::NotificationDispatcher;
use crate::application::records::{load_cycle, load_loi, require_identified};
use crate::domain::actor::Actor;
use crate::domain::application::Application;
use crate::domain::errors::{PreconditionViolation, WorkflowError};
use crate::domain::events::{ApplicationEvent, LoiEvent};
use crate::domain::history::StatusHistoryEntry;
use crate::domain::loi::{LetterOfInterest, LoiId};
use crate::domain::policy::{AccessPolicy, Role};
use crate::domain::repository::GrantStore;
use crate::domain::status::{Decision, EntityKind, RecordRef, RecordStatus};
use crate::domain::transitions::validate_transition;
use crate::infrastructure::event_bus::EventBus;

/// Result of `decide_loi`. `derived_application` is present exactly when the
/// decision was an approval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoiDecisionOutcome {
    pub loi: LetterOfInterest,
    pub derived_application: Option<Application>,
}

#[async_trait]
pub trait LoiReviewService: Send + Sync {
    async fn submit_loi(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<LetterOfInterest, WorkflowError>;
    async fn begin_loi_review(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<LetterOfInterest, WorkflowError>;
    async fn decide_loi(
        &self,
        actor: &Actor,
        loi_id: LoiId,
        decision: Decision,
        reason: Option<String>,
        notes: Option<String>,
    ) -> Result<LoiDecisionOutcome, WorkflowError>;
    async fn get_loi(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<LetterOfInterest, WorkflowError>;
    async fn loi_history(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<Vec<StatusHistoryEntry>, WorkflowError>;
}

pub struct StandardLoiReviewService {
    store: Arc<dyn GrantStore>,
    policy: Arc<AccessPolicy>,
    dispatcher: Arc<NotificationDispatcher>,
    event_bus: EventBus,
}

impl StandardLoiReviewService {
    pub fn new(
        store: Arc<dyn GrantStore>,
        policy: Arc<AccessPolicy>,
        dispatcher: Arc<NotificationDispatcher>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            policy,
            dispatcher,
            event_bus,
        }
    }
}

#[async_trait]
impl LoiReviewService for StandardLoiReviewService {
    async fn submit_loi(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<LetterOfInterest, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let mut loi = load_loi(uow.as_mut(), loi_id).await?;

        self.policy
            .authorize(actor, Some(loi.organization_id), Role::ApplicantOwner, "submitLOI")?;
        validate_transition(EntityKind::LetterOfInterest, loi.status, RecordStatus::Submitted)?;

        let now = Utc::now();
        let cycle = load_cycle(uow.as_mut(), loi.cycle_id).await?;
        if cycle.loi_deadline_passed(now) {
            return Err(PreconditionViolation::DeadlinePassed {
                deadline: cycle.loi_deadline,
            }
            .into());
        }
        loi.content.check_submittable()?;
        if let (Some(requested), Some(maximum)) =
            (loi.content.requested_amount, cycle.max_request_amount)
        {
            if requested > maximum {
                return Err(
                    PreconditionViolation::RequestExceedsMaximum { requested, maximum }.into(),
                );
            }
        }

        let previous = loi.submit(actor, now)?;
        uow.save_loi(&loi).await?;
        AuditTrail::record(
            uow.as_mut(),
            RecordRef::LetterOfInterest(loi.id),
            previous,
            loi.status,
            actor,
            None,
        )
        .await?;
        uow.commit().await?;

        info!(loi_id = %loi.id, actor = %actor.id, "LOI submitted");
        self.event_bus.publish_loi_event(LoiEvent::LoiSubmitted {
            loi_id: loi.id,
            submitted_by: actor.id.clone(),
            submitted_at: now,
        });
        self.dispatcher
            .notify_staff_submitted(RecordRef::LetterOfInterest(loi.id), loi.organization_id)
            .await;

        Ok(loi)
    }

    async fn begin_loi_review(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<LetterOfInterest, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let mut loi = load_loi(uow.as_mut(), loi_id).await?;

        self.policy
            .authorize(actor, Some(loi.organization_id), Role::Member, "beginLoiReview")?;

        let now = Utc::now();
        let previous = loi.begin_review(now)?;
        uow.save_loi(&loi).await?;
        AuditTrail::record(
            uow.as_mut(),
            RecordRef::LetterOfInterest(loi.id),
            previous,
            loi.status,
            actor,
            None,
        )
        .await?;
        uow.commit().await?;

        info!(loi_id = %loi.id, actor = %actor.id, "LOI review started");
        self.event_bus.publish_loi_event(LoiEvent::LoiReviewStarted {
            loi_id: loi.id,
            reviewer: actor.id.clone(),
            started_at: now,
        });

        Ok(loi)
    }

    async fn decide_loi(
        &self,
        actor: &Actor,
        loi_id: LoiId,
        decision: Decision,
        reason: Option<String>,
        notes: Option<String>,
    ) -> Result<LoiDecisionOutcome, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let mut loi = load_loi(uow.as_mut(), loi_id).await?;

        self.policy
            .authorize(actor, Some(loi.organization_id), Role::Member, "decideLoi")?;

        // Status re-checked under the same unit that writes it
        let now = Utc::now();
        let previous = loi.record_decision(decision, actor, reason.clone(), notes, now)?;

        let derived_application = match decision {
            Decision::Approved => {
                let application = Application::derived_from(&loi);
                loi.attach_derived_application(application.id)?;
                uow.save_application(&application).await?;
                Some(application)
            }
            Decision::Declined => None,
        };

        uow.save_loi(&loi).await?;
        AuditTrail::record(
            uow.as_mut(),
            RecordRef::LetterOfInterest(loi.id),
            previous,
            loi.status,
            actor,
            reason,
        )
        .await?;
        uow.commit().await?;

        info!(
            loi_id = %loi.id,
            actor = %actor.id,
            decision = %loi.status,
            derived_application_id = ?loi.derived_application_id,
            "LOI decided"
        );
        self.event_bus.publish_loi_event(LoiEvent::LoiDecided {
            loi_id: loi.id,
            decision: loi.status,
            derived_application_id: loi.derived_application_id,
            decided_by: actor.id.clone(),
            decided_at: now,
        });
        if let Some(application) = &derived_application {
            self.event_bus
                .publish_application_event(ApplicationEvent::ApplicationDraftCreated {
                    application_id: application.id,
                    organization_id: application.organization_id,
                    loi_id: application.loi_id,
                    created_at: application.created_at,
                });
        }

        Ok(LoiDecisionOutcome {
            loi,
            derived_application,
        })
    }

    async fn get_loi(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<LetterOfInterest, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let loi = load_loi(uow.as_mut(), loi_id).await?;
        self.policy.authorize_read(actor, loi.organization_id, "getLoi")?;
        Ok(loi)
    }

    async fn loi_history(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<Vec<StatusHistoryEntry>, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let loi = load_loi(uow.as_mut(), loi_id).await?;
        self.policy.authorize_read(actor, loi.organization_id, "loiHistory")?;
        Ok(uow.list_history(RecordRef::LetterOfInterest(loi.id)).await?)
    }
}
