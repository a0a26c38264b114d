// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Application Review Workflow
//!
//! Submission, review, the information-request sub-cycle and the final
//! decision for Applications. Only one information request may be open per
//! application: `request_application_info` refuses while a prior request is
//! unanswered, which keeps the "pending request" read unambiguous.
//!
//! Applicant-facing notices for UNDER_REVIEW, INFO_REQUESTED, APPROVED and
//! DECLINED are dispatched after commit when a contact email resolves.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::audit_trail::AuditTrail;
use crate::application::notification_dispatcher::NotificationDispatcher;
use crate::application::records::{
    invalid_transition, load_application, load_cycle, require_identified, resolve_contact,
};
use crate::domain::actor::Actor;
use crate::domain::application::{Application, ApplicationId};
use crate::domain::communication::{Communication, CommunicationId};
use crate::domain::errors::{PreconditionViolation, WorkflowError};
use crate::domain::events::ApplicationEvent;
use crate::domain::history::StatusHistoryEntry;
use crate::domain::notification::{NotificationIntent, NotificationKind};
use crate::domain::policy::{AccessPolicy, Role};
use crate::domain::repository::{GrantStore, UnitOfWork};
use crate::domain::status::{Decision, EntityKind, RecordRef, RecordStatus};
use crate::domain::transitions::validate_transition;
use crate::infrastructure::event_bus::EventBus;

pub const INFO_REQUESTED_REASON: &str = "Information requested from applicant.";
pub const INFO_PROVIDED_REASON: &str = "Applicant provided requested information.";

#[async_trait]
pub trait ApplicationReviewService: Send + Sync {
    async fn submit_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Application, WorkflowError>;
    async fn begin_application_review(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Application, WorkflowError>;
    async fn request_application_info(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        message: String,
        response_deadline: Option<DateTime<Utc>>,
    ) -> Result<Communication, WorkflowError>;
    async fn respond_application_info(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        communication_id: CommunicationId,
        response: String,
    ) -> Result<Communication, WorkflowError>;
    async fn decide_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        decision: Decision,
        reason: Option<String>,
    ) -> Result<Application, WorkflowError>;
    async fn get_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Application, WorkflowError>;
    async fn application_history(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Vec<StatusHistoryEntry>, WorkflowError>;
    /// The open information request, if any.
    async fn pending_info_request(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Option<Communication>, WorkflowError>;
}

pub struct StandardApplicationReviewService {
    store: Arc<dyn GrantStore>,
    policy: Arc<AccessPolicy>,
    dispatcher: Arc<NotificationDispatcher>,
    event_bus: EventBus,
}

impl StandardApplicationReviewService {
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

    /// Intent for an applicant-facing status, resolved inside the unit so the
    /// contact lookup sees the same snapshot as the transition.
    async fn applicant_intent(
        uow: &mut dyn UnitOfWork,
        application: &Application,
        message: Option<String>,
    ) -> Result<Option<NotificationIntent>, WorkflowError> {
        let Some(kind) = NotificationKind::for_status(application.status) else {
            return Ok(None);
        };
        let contact = resolve_contact(
            uow,
            application.contact_email(),
            application.organization_id,
        )
        .await?;
        Ok(contact.map(|recipient| {
            NotificationIntent::new(
                kind,
                recipient,
                RecordRef::Application(application.id),
                application.organization_id,
            )
            .with_reason(
                application.decision_reason.clone().filter(|_| application.status.is_decided()),
            )
            .with_message(message)
        }))
    }

    async fn after_transition(
        &self,
        application: &Application,
        previous: RecordStatus,
        actor: &Actor,
        at: DateTime<Utc>,
        intent: Option<NotificationIntent>,
    ) {
        info!(
            application_id = %application.id,
            actor = %actor.id,
            from = %previous,
            to = %application.status,
            "Application status changed"
        );
        self.event_bus
            .publish_application_event(ApplicationEvent::ApplicationStatusChanged {
                application_id: application.id,
                previous_status: previous,
                new_status: application.status,
                changed_by: actor.id.clone(),
                changed_at: at,
            });
        if let Some(kind) = NotificationKind::for_status(application.status) {
            if intent.is_none() {
                warn!(
                    application_id = %application.id,
                    "No contact email resolvable; applicant not notified"
                );
            }
            self.dispatcher.dispatch_if_addressed(intent, kind).await;
        }
    }
}

#[async_trait]
impl ApplicationReviewService for StandardApplicationReviewService {
    async fn submit_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Application, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let mut application = load_application(uow.as_mut(), application_id).await?;

        self.policy.authorize(
            actor,
            Some(application.organization_id),
            Role::ApplicantOwner,
            "submitApplication",
        )?;
        validate_transition(EntityKind::Application, application.status, RecordStatus::Submitted)?;

        let now = Utc::now();
        let cycle = load_cycle(uow.as_mut(), application.cycle_id).await?;
        if cycle.application_deadline_passed(now) {
            return Err(PreconditionViolation::DeadlinePassed {
                deadline: cycle.application_deadline,
            }
            .into());
        }
        if application.summary.title.trim().is_empty() {
            return Err(
                PreconditionViolation::MissingRequiredFields { fields: vec!["title"] }.into(),
            );
        }
        if let (Some(requested), Some(maximum)) =
            (application.summary.requested_amount, cycle.max_request_amount)
        {
            if requested > maximum {
                return Err(
                    PreconditionViolation::RequestExceedsMaximum { requested, maximum }.into(),
                );
            }
        }

        let previous = application.submit(actor, now)?;
        uow.save_application(&application).await?;
        AuditTrail::record(
            uow.as_mut(),
            RecordRef::Application(application.id),
            previous,
            application.status,
            actor,
            None,
        )
        .await?;
        uow.commit().await?;

        self.after_transition(&application, previous, actor, now, None).await;
        self.dispatcher
            .notify_staff_submitted(
                RecordRef::Application(application.id),
                application.organization_id,
            )
            .await;

        Ok(application)
    }

    async fn begin_application_review(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Application, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let mut application = load_application(uow.as_mut(), application_id).await?;

        self.policy.authorize(
            actor,
            Some(application.organization_id),
            Role::Member,
            "beginApplicationReview",
        )?;
        if application.status != RecordStatus::Submitted {
            // INFO_REQUESTED -> UNDER_REVIEW belongs to the applicant's response
            return Err(invalid_transition(
                EntityKind::Application,
                application.status,
                RecordStatus::UnderReview,
            ));
        }

        let now = Utc::now();
        let previous = application.begin_review(now)?;
        uow.save_application(&application).await?;
        AuditTrail::record(
            uow.as_mut(),
            RecordRef::Application(application.id),
            previous,
            application.status,
            actor,
            None,
        )
        .await?;
        let intent = Self::applicant_intent(uow.as_mut(), &application, None).await?;
        uow.commit().await?;

        self.after_transition(&application, previous, actor, now, intent).await;
        Ok(application)
    }

    async fn request_application_info(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        message: String,
        response_deadline: Option<DateTime<Utc>>,
    ) -> Result<Communication, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let mut application = load_application(uow.as_mut(), application_id).await?;

        self.policy.authorize(
            actor,
            Some(application.organization_id),
            Role::Manager,
            "requestApplicationInfo",
        )?;

        // One open request per application, checked before the status edge so
        // a repeated request reports the pending item rather than the status
        let communications = uow.list_communications(application.id).await?;
        if let Some(pending) = communications.iter().find(|c| c.is_pending()) {
            return Err(PreconditionViolation::PendingInfoRequest {
                communication_id: pending.id.to_string(),
            }
            .into());
        }
        validate_transition(
            EntityKind::Application,
            application.status,
            RecordStatus::InfoRequested,
        )?;

        let now = Utc::now();
        let previous = application.request_info(now)?;
        let communication = Communication::info_request(
            application.id,
            actor,
            message.clone(),
            response_deadline,
        );

        uow.save_application(&application).await?;
        uow.save_communication(&communication).await?;
        AuditTrail::record(
            uow.as_mut(),
            RecordRef::Application(application.id),
            previous,
            application.status,
            actor,
            Some(INFO_REQUESTED_REASON.to_string()),
        )
        .await?;
        let intent = Self::applicant_intent(uow.as_mut(), &application, Some(message))
            .await?
            .map(|i| i.with_next_deadline(response_deadline));
        uow.commit().await?;

        self.event_bus.publish_application_event(ApplicationEvent::InfoRequested {
            application_id: application.id,
            communication_id: communication.id,
            requested_at: now,
        });
        self.after_transition(&application, previous, actor, now, intent).await;

        Ok(communication)
    }

    async fn respond_application_info(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        communication_id: CommunicationId,
        response: String,
    ) -> Result<Communication, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let mut application = load_application(uow.as_mut(), application_id).await?;

        self.policy.authorize(
            actor,
            Some(application.organization_id),
            Role::ApplicantOwner,
            "respondApplicationInfo",
        )?;

        let mut communication = uow
            .find_communication(communication_id)
            .await?
            .filter(|c| c.application_id == application.id)
            .ok_or_else(|| WorkflowError::not_found("Communication", communication_id))?;
        if application.status != RecordStatus::InfoRequested {
            return Err(invalid_transition(
                EntityKind::Application,
                application.status,
                RecordStatus::UnderReview,
            ));
        }

        let now = Utc::now();
        communication.record_response(response, now)?;
        let previous = application.resume_review(now)?;

        uow.save_communication(&communication).await?;
        uow.save_application(&application).await?;
        AuditTrail::record(
            uow.as_mut(),
            RecordRef::Application(application.id),
            previous,
            application.status,
            actor,
            Some(INFO_PROVIDED_REASON.to_string()),
        )
        .await?;
        let intent = Self::applicant_intent(uow.as_mut(), &application, None).await?;
        uow.commit().await?;

        self.event_bus.publish_application_event(ApplicationEvent::InfoProvided {
            application_id: application.id,
            communication_id: communication.id,
            provided_at: now,
        });
        self.after_transition(&application, previous, actor, now, intent).await;

        Ok(communication)
    }

    async fn decide_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        decision: Decision,
        reason: Option<String>,
    ) -> Result<Application, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let mut application = load_application(uow.as_mut(), application_id).await?;

        self.policy.authorize(
            actor,
            Some(application.organization_id),
            Role::Admin,
            "decideApplication",
        )?;

        let now = Utc::now();
        let previous = application.record_decision(decision, actor, reason.clone(), now)?;
        uow.save_application(&application).await?;
        AuditTrail::record(
            uow.as_mut(),
            RecordRef::Application(application.id),
            previous,
            application.status,
            actor,
            reason,
        )
        .await?;
        let intent = Self::applicant_intent(uow.as_mut(), &application, None).await?;
        uow.commit().await?;

        self.after_transition(&application, previous, actor, now, intent).await;
        Ok(application)
    }

    async fn get_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Application, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let application = load_application(uow.as_mut(), application_id).await?;
        self.policy
            .authorize_read(actor, application.organization_id, "getApplication")?;
        Ok(application)
    }

    async fn application_history(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Vec<StatusHistoryEntry>, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let application = load_application(uow.as_mut(), application_id).await?;
        self.policy
            .authorize_read(actor, application.organization_id, "applicationHistory")?;
        Ok(uow.list_history(RecordRef::Application(application.id)).await?)
    }

    async fn pending_info_request(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Option<Communication>, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let application = load_application(uow.as_mut(), application_id).await?;
        self.policy
            .authorize_read(actor, application.organization_id, "pendingInfoRequest")?;
        let communications = uow.list_communications(application.id).await?;
        Ok(communications.into_iter().find(|c| c.is_pending()))
    }
}
