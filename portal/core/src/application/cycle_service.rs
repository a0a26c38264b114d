// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Cycle Administration
//!
//! Admin-only management of grant cycles. Activation deactivates every other
//! cycle inside the same unit of work, so at most one cycle is ever active.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::application::records::{conflict_as, load_cycle, require_identified};
use crate::domain::actor::Actor;
use crate::domain::cycle::{CycleId, CycleSchedule, GrantCycle};
use crate::domain::errors::{PreconditionViolation, WorkflowError};
use crate::domain::events::AdministrationEvent;
use crate::domain::policy::{AccessPolicy, Role};
use crate::domain::repository::GrantStore;
use crate::infrastructure::event_bus::EventBus;

#[async_trait]
pub trait CycleAdministrationService: Send + Sync {
    async fn create_cycle(
        &self,
        actor: &Actor,
        schedule: CycleSchedule,
    ) -> Result<GrantCycle, WorkflowError>;
    async fn activate_cycle(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
    ) -> Result<GrantCycle, WorkflowError>;
    async fn set_cycle_intake(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
        accepting_lois: bool,
        accepting_applications: bool,
    ) -> Result<GrantCycle, WorkflowError>;
    async fn delete_cycle(&self, actor: &Actor, cycle_id: CycleId) -> Result<(), WorkflowError>;
    /// Open to any identified caller.
    async fn active_cycle(&self, actor: &Actor) -> Result<Option<GrantCycle>, WorkflowError>;
    async fn list_cycles(&self, actor: &Actor) -> Result<Vec<GrantCycle>, WorkflowError>;
}

pub struct StandardCycleAdministrationService {
    store: Arc<dyn GrantStore>,
    policy: Arc<AccessPolicy>,
    event_bus: EventBus,
}

impl StandardCycleAdministrationService {
    pub fn new(store: Arc<dyn GrantStore>, policy: Arc<AccessPolicy>, event_bus: EventBus) -> Self {
        Self {
            store,
            policy,
            event_bus,
        }
    }
}

#[async_trait]
impl CycleAdministrationService for StandardCycleAdministrationService {
    async fn create_cycle(
        &self,
        actor: &Actor,
        schedule: CycleSchedule,
    ) -> Result<GrantCycle, WorkflowError> {
        self.policy.authorize(actor, None, Role::Admin, "createCycle")?;
        if schedule.label.trim().is_empty() {
            return Err(
                PreconditionViolation::MissingRequiredFields { fields: vec!["label"] }.into(),
            );
        }

        let mut uow = self.store.begin().await?;
        let cycles = uow.list_cycles().await?;
        if cycles.iter().any(|c| c.same_period(&schedule.label, schedule.year)) {
            return Err(PreconditionViolation::DuplicateCycle {
                label: schedule.label.trim().to_string(),
                year: schedule.year,
            }
            .into());
        }

        let cycle = GrantCycle::new(schedule);
        let duplicate = PreconditionViolation::DuplicateCycle {
            label: cycle.label.clone(),
            year: cycle.year,
        };
        uow.save_cycle(&cycle).await.map_err(conflict_as(duplicate.clone()))?;
        uow.commit().await.map_err(conflict_as(duplicate))?;

        info!(
            cycle_id = %cycle.id,
            cycle = %cycle.display_name(),
            actor = %actor.id,
            "Grant cycle created"
        );
        self.event_bus
            .publish_administration_event(AdministrationEvent::CycleCreated {
                cycle_id: cycle.id,
                created_at: cycle.created_at,
            });
        Ok(cycle)
    }

    async fn activate_cycle(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
    ) -> Result<GrantCycle, WorkflowError> {
        self.policy.authorize(actor, None, Role::Admin, "activateCycle")?;
        let mut uow = self.store.begin().await?;
        let mut target = load_cycle(uow.as_mut(), cycle_id).await?;

        let raced = PreconditionViolation::ActivationConflict {
            cycle: target.display_name(),
        };

        // Deactivate first so a partial unique index on is_active never sees two rows
        let mut deactivated = Vec::new();
        for mut other in uow.list_cycles().await? {
            if other.id != cycle_id && other.is_active {
                other.is_active = false;
                uow.save_cycle(&other).await?;
                deactivated.push(other.id);
            }
        }
        target.is_active = true;
        uow.save_cycle(&target).await.map_err(conflict_as(raced.clone()))?;
        uow.commit().await.map_err(conflict_as(raced))?;

        info!(
            cycle_id = %target.id,
            deactivated = deactivated.len(),
            actor = %actor.id,
            "Grant cycle activated"
        );
        self.event_bus
            .publish_administration_event(AdministrationEvent::CycleActivated {
                cycle_id: target.id,
                deactivated,
                activated_at: Utc::now(),
            });
        Ok(target)
    }

    async fn set_cycle_intake(
        &self,
        actor: &Actor,
        cycle_id: CycleId,
        accepting_lois: bool,
        accepting_applications: bool,
    ) -> Result<GrantCycle, WorkflowError> {
        self.policy.authorize(actor, None, Role::Admin, "setCycleIntake")?;
        let mut uow = self.store.begin().await?;
        let mut cycle = load_cycle(uow.as_mut(), cycle_id).await?;
        cycle.accepting_lois = accepting_lois;
        cycle.accepting_applications = accepting_applications;
        uow.save_cycle(&cycle).await?;
        uow.commit().await?;

        info!(
            cycle_id = %cycle.id,
            accepting_lois,
            accepting_applications,
            "Grant cycle intake updated"
        );
        Ok(cycle)
    }

    async fn delete_cycle(&self, actor: &Actor, cycle_id: CycleId) -> Result<(), WorkflowError> {
        self.policy.authorize(actor, None, Role::Admin, "deleteCycle")?;
        let mut uow = self.store.begin().await?;
        let cycle = load_cycle(uow.as_mut(), cycle_id).await?;

        let (lois, applications) = uow.count_cycle_records(cycle.id).await?;
        if lois > 0 || applications > 0 {
            return Err(PreconditionViolation::CycleInUse {
                cycle: cycle.display_name(),
                lois,
                applications,
            }
            .into());
        }
        uow.delete_cycle(cycle.id).await?;
        uow.commit().await?;

        info!(cycle_id = %cycle.id, actor = %actor.id, "Grant cycle deleted");
        self.event_bus
            .publish_administration_event(AdministrationEvent::CycleDeleted {
                cycle_id: cycle.id,
                deleted_at: Utc::now(),
            });
        Ok(())
    }

    async fn active_cycle(&self, actor: &Actor) -> Result<Option<GrantCycle>, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        Ok(uow.list_cycles().await?.into_iter().find(|c| c.is_active))
    }

    async fn list_cycles(&self, actor: &Actor) -> Result<Vec<GrantCycle>, WorkflowError> {
        require_identified(actor)?;
        let mut uow = self.store.begin().await?;
        Ok(uow.list_cycles().await?)
    }
}
