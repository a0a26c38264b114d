// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Grant Workflow Facade
//!
//! One entry point exposing every workflow action by name. Callers (the HTTP
//! layer, tests, embedding applications) build a [`GrantWorkflow`] once and
//! share it; it holds no per-request state.
//!
//! | Action | Service |
//! |--------|---------|
//! | `submit_loi`, `begin_loi_review`, `decide_loi` | [`LoiReviewService`] |
//! | `submit_application`, `begin_application_review` | [`ApplicationReviewService`] |
//! | `request_application_info`, `respond_application_info` | [`ApplicationReviewService`] |
//! | `decide_application` | [`ApplicationReviewService`] |
//! | `cast_vote`, `submit_budget_assessment` | [`ReviewInputService`] |
//! | `query_pending_releases`, `release_decisions` | [`DecisionReleaseService`] |
//! | draft create / update / delete | [`DraftLifecycleService`] |
//! | cycle administration | [`CycleAdministrationService`] |
//! | organization registry | [`OrganizationService`] |

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::application::application_service::{
    ApplicationReviewService, StandardApplicationReviewService,
};
use crate::application::cycle_service::{
    CycleAdministrationService, StandardCycleAdministrationService,
};
use crate::application::delete_closure::DeletionSummary;
use crate::application::draft_service::{DraftLifecycleService, StandardDraftLifecycleService};
use crate::application::loi_service::{
    LoiDecisionOutcome, LoiReviewService, StandardLoiReviewService,
};
use crate::application::notification_dispatcher::NotificationDispatcher;
use crate::application::organization_service::{OrganizationService, StandardOrganizationService};
use crate::application::release_service::{
    DecisionReleaseService, ReleaseReport, ReleaseSelection, StandardDecisionReleaseService,
};
use crate::application::review_service::{ReviewInputService, StandardReviewInputService};
use crate::domain::actor::Actor;
use crate::domain::application::{Application, ApplicationId, ApplicationSummary};
use crate::domain::communication::{Communication, CommunicationId};
use crate::domain::cycle::{CycleId, CycleSchedule, GrantCycle};
use crate::domain::errors::WorkflowError;
use crate::domain::history::StatusHistoryEntry;
use crate::domain::loi::{LetterOfInterest, LoiContent, LoiId};
use crate::domain::notification::NotificationSender;
use crate::domain::organization::{Organization, OrganizationId};
use crate::domain::policy::AccessPolicy;
use crate::domain::repository::GrantStore;
use crate::domain::review::{BudgetAssessment, BudgetScores, Vote, VoteValue};
use crate::domain::status::Decision;
use crate::infrastructure::event_bus::EventBus;

#[derive(Clone)]
pub struct GrantWorkflow {
    lois: Arc<dyn LoiReviewService>,
    applications: Arc<dyn ApplicationReviewService>,
    reviews: Arc<dyn ReviewInputService>,
    releases: Arc<dyn DecisionReleaseService>,
    drafts: Arc<dyn DraftLifecycleService>,
    cycles: Arc<dyn CycleAdministrationService>,
    organizations: Arc<dyn OrganizationService>,
    event_bus: EventBus,
}

impl GrantWorkflow {
    pub fn new(
        store: Arc<dyn GrantStore>,
        policy: AccessPolicy,
        sender: Arc<dyn NotificationSender>,
        staff_email: Option<String>,
        event_bus: EventBus,
    ) -> Self {
        let policy = Arc::new(policy);
        let dispatcher = Arc::new(NotificationDispatcher::new(sender, staff_email));

        Self {
            lois: Arc::new(StandardLoiReviewService::new(
                store.clone(),
                policy.clone(),
                dispatcher.clone(),
                event_bus.clone(),
            )),
            applications: Arc::new(StandardApplicationReviewService::new(
                store.clone(),
                policy.clone(),
                dispatcher.clone(),
                event_bus.clone(),
            )),
            reviews: Arc::new(StandardReviewInputService::new(
                store.clone(),
                policy.clone(),
                event_bus.clone(),
            )),
            releases: Arc::new(StandardDecisionReleaseService::new(
                store.clone(),
                policy.clone(),
                dispatcher,
                event_bus.clone(),
            )),
            drafts: Arc::new(StandardDraftLifecycleService::new(
                store.clone(),
                policy.clone(),
                event_bus.clone(),
            )),
            cycles: Arc::new(StandardCycleAdministrationService::new(
                store.clone(),
                policy.clone(),
                event_bus.clone(),
            )),
            organizations: Arc::new(StandardOrganizationService::new(
                store,
                policy,
                event_bus.clone(),
            )),
            event_bus,
        }
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // Letters of Interest

    pub async fn create_loi_draft(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
        content: LoiContent,
    ) -> Result<LetterOfInterest, WorkflowError> {
        self.drafts.create_loi_draft(actor, cycle_id, content).await
    }

    pub async fn update_loi_draft(
        &self,
        actor: &Actor,
        loi_id: LoiId,
        content: LoiContent,
    ) -> Result<LetterOfInterest, WorkflowError> {
        self.drafts.update_loi_draft(actor, loi_id, content).await
    }

    pub async fn delete_loi_draft(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<DeletionSummary, WorkflowError> {
        self.drafts.delete_loi_draft(actor, loi_id).await
    }

    pub async fn submit_loi(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<LetterOfInterest, WorkflowError> {
        self.lois.submit_loi(actor, loi_id).await
    }

    pub async fn begin_loi_review(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<LetterOfInterest, WorkflowError> {
        self.lois.begin_loi_review(actor, loi_id).await
    }

    pub async fn decide_loi(
        &self,
        actor: &Actor,
        loi_id: LoiId,
        decision: Decision,
        reason: Option<String>,
        notes: Option<String>,
    ) -> Result<LoiDecisionOutcome, WorkflowError> {
        self.lois.decide_loi(actor, loi_id, decision, reason, notes).await
    }

    pub async fn get_loi(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<LetterOfInterest, WorkflowError> {
        self.lois.get_loi(actor, loi_id).await
    }

    pub async fn loi_history(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<Vec<StatusHistoryEntry>, WorkflowError> {
        self.lois.loi_history(actor, loi_id).await
    }

    // Applications

    pub async fn create_application_draft(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
        summary: ApplicationSummary,
        payload: serde_json::Value,
    ) -> Result<Application, WorkflowError> {
        self.drafts.create_application_draft(actor, cycle_id, summary, payload).await
    }

    pub async fn update_application_draft(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        summary: ApplicationSummary,
        payload: serde_json::Value,
    ) -> Result<Application, WorkflowError> {
        self.drafts
            .update_application_draft(actor, application_id, summary, payload)
            .await
    }

    pub async fn delete_application_draft(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<DeletionSummary, WorkflowError> {
        self.drafts.delete_application_draft(actor, application_id).await
    }

    pub async fn submit_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Application, WorkflowError> {
        self.applications.submit_application(actor, application_id).await
    }

    pub async fn begin_application_review(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Application, WorkflowError> {
        self.applications.begin_application_review(actor, application_id).await
    }

    pub async fn request_application_info(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        message: impl Into<String>,
        response_deadline: Option<DateTime<Utc>>,
    ) -> Result<Communication, WorkflowError> {
        self.applications
            .request_application_info(actor, application_id, message.into(), response_deadline)
            .await
    }

    pub async fn respond_application_info(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        communication_id: CommunicationId,
        response: impl Into<String>,
    ) -> Result<Communication, WorkflowError> {
        self.applications
            .respond_application_info(actor, application_id, communication_id, response.into())
            .await
    }

    pub async fn decide_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        decision: Decision,
        reason: Option<String>,
    ) -> Result<Application, WorkflowError> {
        self.applications
            .decide_application(actor, application_id, decision, reason)
            .await
    }

    pub async fn get_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Application, WorkflowError> {
        self.applications.get_application(actor, application_id).await
    }

    pub async fn application_history(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Vec<StatusHistoryEntry>, WorkflowError> {
        self.applications.application_history(actor, application_id).await
    }

    pub async fn pending_info_request(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Option<Communication>, WorkflowError> {
        self.applications.pending_info_request(actor, application_id).await
    }

    // Review inputs

    pub async fn cast_vote(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        value: VoteValue,
        reasoning: Option<String>,
    ) -> Result<Vote, WorkflowError> {
        self.reviews.cast_vote(actor, application_id, value, reasoning).await
    }

    pub async fn submit_budget_assessment(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        scores: BudgetScores,
        notes: Option<String>,
    ) -> Result<BudgetAssessment, WorkflowError> {
        self.reviews
            .submit_budget_assessment(actor, application_id, scores, notes)
            .await
    }

    pub async fn list_votes(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Vec<Vote>, WorkflowError> {
        self.reviews.list_votes(actor, application_id).await
    }

    pub async fn list_budget_assessments(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Vec<BudgetAssessment>, WorkflowError> {
        self.reviews.list_budget_assessments(actor, application_id).await
    }

    // Decision release

    pub async fn query_pending_releases(
        &self,
        actor: &Actor,
    ) -> Result<Vec<LetterOfInterest>, WorkflowError> {
        self.releases.query_pending_releases(actor).await
    }

    pub async fn release_decisions(
        &self,
        actor: &Actor,
        selection: ReleaseSelection,
    ) -> Result<ReleaseReport, WorkflowError> {
        self.releases.release_decisions(actor, selection).await
    }

    // Administration

    pub async fn create_cycle(
        &self,
        actor: &Actor,
        schedule: CycleSchedule,
    ) -> Result<GrantCycle, WorkflowError> {
        self.cycles.create_cycle(actor, schedule).await
    }

    pub async fn activate_cycle(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
    ) -> Result<GrantCycle, WorkflowError> {
        self.cycles.activate_cycle(actor, cycle_id).await
    }

    pub async fn set_cycle_intake(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
        accepting_lois: bool,
        accepting_applications: bool,
    ) -> Result<GrantCycle, WorkflowError> {
        self.cycles
            .set_cycle_intake(actor, cycle_id, accepting_lois, accepting_applications)
            .await
    }

    pub async fn delete_cycle(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
    ) -> Result<(), WorkflowError> {
        self.cycles.delete_cycle(actor, cycle_id).await
    }

    pub async fn active_cycle(&self, actor: &Actor) -> Result<Option<GrantCycle>, WorkflowError> {
        self.cycles.active_cycle(actor).await
    }

    pub async fn list_cycles(&self, actor: &Actor) -> Result<Vec<GrantCycle>, WorkflowError> {
        self.cycles.list_cycles(actor).await
    }

    pub async fn register_organization(
        &self,
        actor: &Actor,
        name: impl Into<String>,
        member_emails: Vec<String>,
    ) -> Result<Organization, WorkflowError> {
        self.organizations
            .register_organization(actor, name.into(), member_emails)
            .await
    }

    pub async fn get_organization(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
    ) -> Result<Organization, WorkflowError> {
        self.organizations.get_organization(actor, organization_id).await
    }

    pub async fn delete_organization(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
    ) -> Result<DeletionSummary, WorkflowError> {
        self.organizations.delete_organization(actor, organization_id).await
    }
}
