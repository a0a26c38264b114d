// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Organization registry. Organizations own records and supply the fallback
// contact address used by notifications.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::application::delete_closure::{DeleteClosure, DeletionRoot, DeletionSummary};
use crate::application::records::require_identified;
use crate::domain::actor::Actor;
use crate::domain::errors::{PreconditionViolation, WorkflowError};
use crate::domain::events::AdministrationEvent;
use crate::domain::organization::{Organization, OrganizationId};
use crate::domain::policy::{AccessPolicy, Role};
use crate::domain::repository::GrantStore;
use crate::infrastructure::event_bus::EventBus;

#[async_trait]
pub trait OrganizationService: Send + Sync {
    async fn register_organization(
        &self,
        actor: &Actor,
        name: String,
        member_emails: Vec<String>,
    ) -> Result<Organization, WorkflowError>;
    async fn get_organization(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
    ) -> Result<Organization, WorkflowError>;
    /// Removes the organization with every LOI, Application and dependent row it owns.
    async fn delete_organization(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
    ) -> Result<DeletionSummary, WorkflowError>;
}

pub struct StandardOrganizationService {
    store: Arc<dyn GrantStore>,
    policy: Arc<AccessPolicy>,
    event_bus: EventBus,
}

impl StandardOrganizationService {
    pub fn new(store: Arc<dyn GrantStore>, policy: Arc<AccessPolicy>, event_bus: EventBus) -> Self {
        Self {
            store,
            policy,
            event_bus,
        }
    }
}

#[async_trait]
impl OrganizationService for StandardOrganizationService {
    async fn register_organization(
        &self,
        actor: &Actor,
        name: String,
        member_emails: Vec<String>,
    ) -> Result<Organization, WorkflowError> {
        self.policy.authorize(actor, None, Role::Admin, "registerOrganization")?;
        if name.trim().is_empty() {
            return Err(
                PreconditionViolation::MissingRequiredFields { fields: vec!["name"] }.into(),
            );
        }

        let organization = Organization::new(name.trim(), member_emails);
        let mut uow = self.store.begin().await?;
        uow.save_organization(&organization).await?;
        uow.commit().await?;

        info!(organization_id = %organization.id, actor = %actor.id, "Organization registered");
        self.event_bus
            .publish_administration_event(AdministrationEvent::OrganizationRegistered {
                organization_id: organization.id,
                registered_at: organization.created_at,
            });
        Ok(organization)
    }

    async fn get_organization(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
    ) -> Result<Organization, WorkflowError> {
        require_identified(actor)?;
        self.policy
            .authorize_read(actor, organization_id, "getOrganization")?;
        let mut uow = self.store.begin().await?;
        uow.find_organization(organization_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Organization", organization_id))
    }

    async fn delete_organization(
        &self,
        actor: &Actor,
        organization_id: OrganizationId,
    ) -> Result<DeletionSummary, WorkflowError> {
        self.policy.authorize(actor, None, Role::Admin, "deleteOrganization")?;
        let mut uow = self.store.begin().await?;
        if uow.find_organization(organization_id).await?.is_none() {
            return Err(WorkflowError::not_found("Organization", organization_id));
        }

        let plan = DeleteClosure::plan(
            uow.as_mut(),
            DeletionRoot::Organization(organization_id),
        )
        .await?;
        let summary = DeleteClosure::execute(uow.as_mut(), &plan).await?;
        uow.commit().await?;

        info!(
            organization_id = %organization_id,
            records = summary.records.len(),
            actor = %actor.id,
            "Organization deleted"
        );
        self.event_bus
            .publish_administration_event(AdministrationEvent::RecordsDeleted {
                records: summary.records.clone(),
                deleted_by: actor.id.clone(),
                deleted_at: Utc::now(),
            });
        Ok(summary)
    }
}
