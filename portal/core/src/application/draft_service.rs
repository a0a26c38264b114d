// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Draft Lifecycle
//!
//! Creation, editing and deletion of DRAFT records by their owning
//! organization. Drafts carry no history: the audit trail starts at the
//! first realized transition.
//!
//! Direct-path Applications are unique per (organization, cycle). An
//! Application derived from an approved LOI skips that check when it is
//! created, but while one exists no direct Application can be started.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::application::delete_closure::{DeleteClosure, DeletionRoot, DeletionSummary};
use crate::application::records::{load_application, load_cycle, load_loi, require_identified};
use crate::domain::actor::Actor;
use crate::domain::application::{Application, ApplicationId, ApplicationSummary};
use crate::domain::cycle::CycleId;
use crate::domain::errors::{PreconditionViolation, WorkflowError};
use crate::domain::events::{AdministrationEvent, ApplicationEvent, LoiEvent};
use crate::domain::loi::{LetterOfInterest, LoiContent, LoiId};
use crate::domain::organization::OrganizationId;
use crate::domain::policy::{AccessPolicy, Role};
use crate::domain::repository::{GrantStore, RepositoryError};
use crate::domain::status::{EntityKind, RecordStatus};
use crate::infrastructure::event_bus::EventBus;

#[async_trait]
pub trait DraftLifecycleService: Send + Sync {
    async fn create_loi_draft(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
        content: LoiContent,
    ) -> Result<LetterOfInterest, WorkflowError>;
    async fn update_loi_draft(
        &self,
        actor: &Actor,
        loi_id: LoiId,
        content: LoiContent,
    ) -> Result<LetterOfInterest, WorkflowError>;
    async fn delete_loi_draft(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<DeletionSummary, WorkflowError>;
    async fn create_application_draft(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
        summary: ApplicationSummary,
        payload: serde_json::Value,
    ) -> Result<Application, WorkflowError>;
    async fn update_application_draft(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        summary: ApplicationSummary,
        payload: serde_json::Value,
    ) -> Result<Application, WorkflowError>;
    async fn delete_application_draft(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<DeletionSummary, WorkflowError>;
}

pub struct StandardDraftLifecycleService {
    store: Arc<dyn GrantStore>,
    policy: Arc<AccessPolicy>,
    event_bus: EventBus,
}

impl StandardDraftLifecycleService {
    pub fn new(store: Arc<dyn GrantStore>, policy: Arc<AccessPolicy>, event_bus: EventBus) -> Self {
        Self {
            store,
            policy,
            event_bus,
        }
    }

    fn owning_organization(
        &self,
        actor: &Actor,
        action: &'static str,
    ) -> Result<OrganizationId, WorkflowError> {
        require_identified(actor)?;
        let organization_id = actor.organization_id.ok_or(PreconditionViolation::NoOrganization)?;
        self.policy
            .authorize(actor, Some(organization_id), Role::ApplicantOwner, action)?;
        Ok(organization_id)
    }

    fn ensure_draft(status: RecordStatus) -> Result<(), WorkflowError> {
        if status != RecordStatus::Draft {
            return Err(PreconditionViolation::NotDraft { status }.into());
        }
        Ok(())
    }

    fn publish_deleted(&self, actor: &Actor, summary: &DeletionSummary) {
        self.event_bus
            .publish_administration_event(AdministrationEvent::RecordsDeleted {
                records: summary.records.clone(),
                deleted_by: actor.id.clone(),
                deleted_at: Utc::now(),
            });
    }
}

/// A unique-constraint hit while saving a new draft means another request
/// claimed the same (organization, cycle) slot first.
fn duplicate_on_conflict(entity: EntityKind) -> impl FnOnce(RepositoryError) -> WorkflowError {
    move |err| match err {
        RepositoryError::Conflict(detail) => PreconditionViolation::DuplicateRecord {
            entity,
            existing_id: detail,
        }
        .into(),
        other => other.into(),
    }
}

#[async_trait]
impl DraftLifecycleService for StandardDraftLifecycleService {
    async fn create_loi_draft(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
        content: LoiContent,
    ) -> Result<LetterOfInterest, WorkflowError> {
        let organization_id = self.owning_organization(actor, "createLoiDraft")?;
        let mut uow = self.store.begin().await?;
        let cycle = load_cycle(uow.as_mut(), cycle_id).await?;

        if !cycle.accepting_lois {
            return Err(PreconditionViolation::CycleNotAccepting {
                cycle: cycle.display_name(),
                intake: "letters of interest",
            }
            .into());
        }
        if cycle.loi_deadline_passed(Utc::now()) {
            return Err(PreconditionViolation::DeadlinePassed {
                deadline: cycle.loi_deadline,
            }
            .into());
        }
        if let Some(existing) = uow.find_loi_for_organization(organization_id, cycle.id).await? {
            return Err(PreconditionViolation::DuplicateRecord {
                entity: EntityKind::LetterOfInterest,
                existing_id: existing.id.to_string(),
            }
            .into());
        }

        let loi = LetterOfInterest::new_draft(organization_id, cycle.id, content);
        uow.save_loi(&loi)
            .await
            .map_err(duplicate_on_conflict(EntityKind::LetterOfInterest))?;
        uow.commit().await?;

        info!(
            loi_id = %loi.id,
            organization_id = %organization_id,
            cycle_id = %cycle.id,
            "LOI draft created"
        );
        self.event_bus.publish_loi_event(LoiEvent::LoiDraftCreated {
            loi_id: loi.id,
            organization_id,
            cycle_id: cycle.id,
            created_at: loi.created_at,
        });
        Ok(loi)
    }

    async fn update_loi_draft(
        &self,
        actor: &Actor,
        loi_id: LoiId,
        content: LoiContent,
    ) -> Result<LetterOfInterest, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let mut loi = load_loi(uow.as_mut(), loi_id).await?;
        self.policy
            .authorize(actor, Some(loi.organization_id), Role::ApplicantOwner, "updateLoiDraft")?;

        loi.replace_content(content)?;
        uow.save_loi(&loi).await?;
        uow.commit().await?;
        Ok(loi)
    }

    async fn delete_loi_draft(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<DeletionSummary, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let loi = load_loi(uow.as_mut(), loi_id).await?;
        self.policy
            .authorize(actor, Some(loi.organization_id), Role::ApplicantOwner, "deleteLoiDraft")?;
        Self::ensure_draft(loi.status)?;

        let plan = DeleteClosure::plan(uow.as_mut(), DeletionRoot::Loi(loi.id)).await?;
        let summary = DeleteClosure::execute(uow.as_mut(), &plan).await?;
        uow.commit().await?;

        info!(loi_id = %loi.id, actor = %actor.id, "LOI draft deleted");
        self.publish_deleted(actor, &summary);
        Ok(summary)
    }

    async fn create_application_draft(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
        summary: ApplicationSummary,
        payload: serde_json::Value,
    ) -> Result<Application, WorkflowError> {
        let organization_id = self.owning_organization(actor, "createApplicationDraft")?;
        let mut uow = self.store.begin().await?;
        let cycle = load_cycle(uow.as_mut(), cycle_id).await?;

        if !cycle.accepting_applications {
            return Err(PreconditionViolation::CycleNotAccepting {
                cycle: cycle.display_name(),
                intake: "applications",
            }
            .into());
        }
        if cycle.application_deadline_passed(Utc::now()) {
            return Err(PreconditionViolation::DeadlinePassed {
                deadline: cycle.application_deadline,
            }
            .into());
        }
        let existing = uow.find_applications_for_organization(organization_id, cycle.id).await?;
        if let Some(existing) = existing.first() {
            return Err(PreconditionViolation::DuplicateRecord {
                entity: EntityKind::Application,
                existing_id: existing.id.to_string(),
            }
            .into());
        }

        let application = Application::new_draft(organization_id, cycle.id, summary, payload);
        uow.save_application(&application)
            .await
            .map_err(duplicate_on_conflict(EntityKind::Application))?;
        uow.commit().await?;

        info!(
            application_id = %application.id,
            organization_id = %organization_id,
            cycle_id = %cycle.id,
            "Application draft created"
        );
        self.event_bus
            .publish_application_event(ApplicationEvent::ApplicationDraftCreated {
                application_id: application.id,
                organization_id,
                loi_id: None,
                created_at: application.created_at,
            });
        Ok(application)
    }

    async fn update_application_draft(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        summary: ApplicationSummary,
        payload: serde_json::Value,
    ) -> Result<Application, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let mut application = load_application(uow.as_mut(), application_id).await?;
        self.policy.authorize(
            actor,
            Some(application.organization_id),
            Role::ApplicantOwner,
            "updateApplicationDraft",
        )?;

        application.update_draft(summary, payload)?;
        uow.save_application(&application).await?;
        uow.commit().await?;
        Ok(application)
    }

    async fn delete_application_draft(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<DeletionSummary, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        let application = load_application(uow.as_mut(), application_id).await?;
        self.policy.authorize(
            actor,
            Some(application.organization_id),
            Role::ApplicantOwner,
            "deleteApplicationDraft",
        )?;
        Self::ensure_draft(application.status)?;
        if let Some(loi_id) = application.loi_id {
            return Err(PreconditionViolation::DerivedFromLoi {
                loi_id: loi_id.to_string(),
            }
            .into());
        }

        let plan = DeleteClosure::plan(
            uow.as_mut(),
            DeletionRoot::Application(application.id),
        )
        .await?;
        let summary = DeleteClosure::execute(uow.as_mut(), &plan).await?;
        uow.commit().await?;

        info!(application_id = %application.id, actor = %actor.id, "Application draft deleted");
        self.publish_deleted(actor, &summary);
        Ok(summary)
    }
}
