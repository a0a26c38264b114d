// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Review Inputs
//!
//! Votes and budget assessments are advisory: they never gate or force a
//! transition. Each reviewer holds at most one of each per application and
//! may revise it until the application reaches a terminal status. Writes are
//! upserts keyed by (application, reviewer); concurrent writes by the same
//! reviewer resolve last-write-wins.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use crate::application::records::{load_application, require_identified};
use crate::domain::actor::Actor;
use crate::domain::application::{Application, ApplicationId};
use crate::domain::errors::{PreconditionViolation, WorkflowError};
use crate::domain::events::ApplicationEvent;
use crate::domain::policy::{AccessPolicy, Role};
use crate::domain::repository::GrantStore;
use crate::domain::review::{BudgetAssessment, BudgetScores, Vote, VoteValue};
use crate::infrastructure::event_bus::EventBus;

#[async_trait]
pub trait ReviewInputService: Send + Sync {
    async fn cast_vote(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        value: VoteValue,
        reasoning: Option<String>,
    ) -> Result<Vote, WorkflowError>;
    async fn submit_budget_assessment(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        scores: BudgetScores,
        notes: Option<String>,
    ) -> Result<BudgetAssessment, WorkflowError>;
    async fn list_votes(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Vec<Vote>, WorkflowError>;
    async fn list_budget_assessments(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Vec<BudgetAssessment>, WorkflowError>;
}

pub struct StandardReviewInputService {
    store: Arc<dyn GrantStore>,
    policy: Arc<AccessPolicy>,
    event_bus: EventBus,
}

impl StandardReviewInputService {
    pub fn new(store: Arc<dyn GrantStore>, policy: Arc<AccessPolicy>, event_bus: EventBus) -> Self {
        Self {
            store,
            policy,
            event_bus,
        }
    }

    fn ensure_open(application: &Application) -> Result<(), WorkflowError> {
        if application.status.is_terminal() {
            return Err(PreconditionViolation::ReviewClosed {
                status: application.status,
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl ReviewInputService for StandardReviewInputService {
    async fn cast_vote(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        value: VoteValue,
        reasoning: Option<String>,
    ) -> Result<Vote, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let application = load_application(uow.as_mut(), application_id).await?;

        self.policy
            .authorize(actor, Some(application.organization_id), Role::Member, "castVote")?;
        Self::ensure_open(&application)?;

        let existing = uow.find_vote(application.id, &actor.id).await?;
        let vote = Vote::upsert(existing, application.id, actor, value, reasoning);
        uow.save_vote(&vote).await?;
        uow.commit().await?;

        info!(
            application_id = %application.id,
            reviewer = %actor.id,
            vote = ?vote.value,
            "Vote recorded"
        );
        self.event_bus.publish_application_event(ApplicationEvent::VoteCast {
            application_id: application.id,
            reviewer: actor.id.clone(),
            cast_at: vote.updated_at,
        });

        Ok(vote)
    }

    async fn submit_budget_assessment(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        scores: BudgetScores,
        notes: Option<String>,
    ) -> Result<BudgetAssessment, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let application = load_application(uow.as_mut(), application_id).await?;

        self.policy.authorize(
            actor,
            Some(application.organization_id),
            Role::Member,
            "submitBudgetAssessment",
        )?;
        Self::ensure_open(&application)?;
        scores.validate()?;

        let existing = uow.find_budget_assessment(application.id, &actor.id).await?;
        let assessment = BudgetAssessment::upsert(existing, application.id, actor, scores, notes);
        uow.save_budget_assessment(&assessment).await?;
        uow.commit().await?;

        info!(
            application_id = %application.id,
            reviewer = %actor.id,
            composite_score = ?assessment.composite_score,
            "Budget assessment recorded"
        );
        self.event_bus.publish_application_event(ApplicationEvent::BudgetAssessed {
            application_id: application.id,
            reviewer: actor.id.clone(),
            composite_score: assessment.composite_score,
            assessed_at: assessment.updated_at,
        });

        Ok(assessment)
    }

    async fn list_votes(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Vec<Vote>, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let application = load_application(uow.as_mut(), application_id).await?;
        self.policy
            .authorize(actor, Some(application.organization_id), Role::Member, "listVotes")?;
        Ok(uow.list_votes(application.id).await?)
    }

    async fn list_budget_assessments(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<Vec<BudgetAssessment>, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let application = load_application(uow.as_mut(), application_id).await?;
        self.policy.authorize(
            actor,
            Some(application.organization_id),
            Role::Member,
            "listBudgetAssessments",
        )?;
        Ok(uow.list_budget_assessments(application.id).await?)
    }
}
