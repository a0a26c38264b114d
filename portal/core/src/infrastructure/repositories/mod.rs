// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Repository Implementations
//!
//! Infrastructure implementations of the [`GrantStore`] / [`UnitOfWork`]
//! contract defined in the domain layer.
//!
//! # Architecture
//!
//! - **Layer:** Infrastructure
//! - **Purpose:** Persist and retrieve grant workflow records
//! - **Pattern:** Repository + Unit of Work (DDD), Adapter (Hexagonal Architecture)
//!
//! # Available Implementations
//!
//! - **PostgresGrantStore** - one `sqlx` transaction per unit, with
//!   `SELECT ... FOR UPDATE` on single-record lookups
//! - **InMemoryGrantStore** - a single snapshot behind an async mutex; each
//!   unit holds the lock for its whole lifetime, so units run one at a time
//!
//! Both backends enforce the same uniqueness rules (one LOI per organization
//! and cycle, one direct Application per organization and cycle, one derived
//! Application per LOI, one cycle per label and year) and report violations as
//! [`RepositoryError::Conflict`].

pub mod postgres_grant_store;

pub use postgres_grant_store::PostgresGrantStore;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::actor::ActorId;
use crate::domain::application::{Application, ApplicationId};
use crate::domain::communication::{Communication, CommunicationId};
use crate::domain::cycle::{CycleId, GrantCycle};
use crate::domain::history::{sort_newest_first, StatusHistoryEntry};
use crate::domain::loi::{LetterOfInterest, LoiId};
use crate::domain::organization::{Organization, OrganizationId};
use crate::domain::repository::{GrantStore, RepositoryError, UnitOfWork};
use crate::domain::review::{BudgetAssessment, Vote};
use crate::domain::status::RecordRef;

#[derive(Debug, Clone, Default)]
struct StoreState {
    lois: HashMap<LoiId, LetterOfInterest>,
    applications: HashMap<ApplicationId, Application>,
    history: Vec<StatusHistoryEntry>,
    communications: HashMap<CommunicationId, Communication>,
    votes: HashMap<(ApplicationId, ActorId), Vote>,
    assessments: HashMap<(ApplicationId, ActorId), BudgetAssessment>,
    cycles: HashMap<CycleId, GrantCycle>,
    organizations: HashMap<OrganizationId, Organization>,
}

#[derive(Clone, Default)]
pub struct InMemoryGrantStore {
    state: Arc<Mutex<StoreState>>,
    fail_history_appends: Arc<AtomicBool>,
}

impl InMemoryGrantStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `append_history` fail until switched off again.
    /// Lets tests prove that a failed audit write aborts the whole unit.
    pub fn inject_history_failure(&self, enabled: bool) {
        self.fail_history_appends.store(enabled, Ordering::SeqCst);
    }
}

#[async_trait]
impl GrantStore for InMemoryGrantStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(InMemoryUnitOfWork {
            guard,
            staged,
            fail_history_appends: self.fail_history_appends.clone(),
        }))
    }
}

/// Works on a private copy of the store; `commit` swaps it in.
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<StoreState>,
    staged: StoreState,
    fail_history_appends: Arc<AtomicBool>,
}

fn sorted_by_creation<T, F>(mut items: Vec<T>, created: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    items.sort_by_key(|item| created(item));
    items
}

#[async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn find_loi(&mut self, id: LoiId) -> Result<Option<LetterOfInterest>, RepositoryError> {
        Ok(self.staged.lois.get(&id).cloned())
    }

    async fn find_loi_for_organization(
        &mut self,
        organization_id: OrganizationId,
        cycle_id: CycleId,
    ) -> Result<Option<LetterOfInterest>, RepositoryError> {
        Ok(self
            .staged
            .lois
            .values()
            .find(|l| l.organization_id == organization_id && l.cycle_id == cycle_id)
            .cloned())
    }

    async fn list_lois_by_organization(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<LetterOfInterest>, RepositoryError> {
        let lois = self
            .staged
            .lois
            .values()
            .filter(|l| l.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(lois, |l: &LetterOfInterest| l.created_at))
    }

    async fn list_pending_releases(&mut self) -> Result<Vec<LetterOfInterest>, RepositoryError> {
        let lois = self
            .staged
            .lois
            .values()
            .filter(|l| l.is_pending_release())
            .cloned()
            .collect();
        Ok(sorted_by_creation(lois, |l: &LetterOfInterest| l.created_at))
    }

    async fn save_loi(&mut self, loi: &LetterOfInterest) -> Result<(), RepositoryError> {
        if let Some(existing) = self
            .staged
            .lois
            .values()
            .find(|l| {
                l.id != loi.id
                    && l.organization_id == loi.organization_id
                    && l.cycle_id == loi.cycle_id
            })
        {
            return Err(RepositoryError::Conflict(format!(
                "letter of interest {} already exists for organization {} in cycle {}",
                existing.id, loi.organization_id, loi.cycle_id
            )));
        }
        self.staged.lois.insert(loi.id, loi.clone());
        Ok(())
    }

    async fn delete_loi(&mut self, id: LoiId) -> Result<(), RepositoryError> {
        self.staged.lois.remove(&id);
        Ok(())
    }

    async fn find_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self.staged.applications.get(&id).cloned())
    }

    async fn find_applications_for_organization(
        &mut self,
        organization_id: OrganizationId,
        cycle_id: CycleId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let apps = self
            .staged
            .applications
            .values()
            .filter(|a| a.organization_id == organization_id && a.cycle_id == cycle_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(apps, |a: &Application| a.created_at))
    }

    async fn find_applications_by_loi(
        &mut self,
        loi_id: LoiId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let apps = self
            .staged
            .applications
            .values()
            .filter(|a| a.loi_id == Some(loi_id))
            .cloned()
            .collect();
        Ok(sorted_by_creation(apps, |a: &Application| a.created_at))
    }

    async fn list_applications_by_organization(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let apps = self
            .staged
            .applications
            .values()
            .filter(|a| a.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(apps, |a: &Application| a.created_at))
    }

    async fn save_application(&mut self, application: &Application) -> Result<(), RepositoryError> {
        let clash = self.staged.applications.values().find(|a| {
            a.id != application.id
                && match application.loi_id {
                    Some(loi_id) => a.loi_id == Some(loi_id),
                    None => {
                        a.loi_id.is_none()
                            && a.organization_id == application.organization_id
                            && a.cycle_id == application.cycle_id
                    }
                }
        });
        if let Some(existing) = clash {
            return Err(RepositoryError::Conflict(format!(
                "application {} already occupies this slot",
                existing.id
            )));
        }
        self.staged.applications.insert(application.id, application.clone());
        Ok(())
    }

    async fn delete_application(&mut self, id: ApplicationId) -> Result<(), RepositoryError> {
        self.staged.applications.remove(&id);
        Ok(())
    }

    async fn append_history(&mut self, entry: &StatusHistoryEntry) -> Result<(), RepositoryError> {
        if self.fail_history_appends.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database("history append rejected".to_string()));
        }
        self.staged.history.push(entry.clone());
        Ok(())
    }

    async fn list_history(
        &mut self,
        record: RecordRef,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        // Insertion order breaks timestamp ties
        let mut entries: Vec<StatusHistoryEntry> = self
            .staged
            .history
            .iter()
            .rev()
            .filter(|e| e.record == record)
            .cloned()
            .collect();
        sort_newest_first(&mut entries);
        Ok(entries)
    }

    async fn purge_history(&mut self, record: RecordRef) -> Result<u64, RepositoryError> {
        let before = self.staged.history.len();
        self.staged.history.retain(|e| e.record != record);
        Ok((before - self.staged.history.len()) as u64)
    }

    async fn find_communication(
        &mut self,
        id: CommunicationId,
    ) -> Result<Option<Communication>, RepositoryError> {
        Ok(self.staged.communications.get(&id).cloned())
    }

    async fn list_communications(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<Vec<Communication>, RepositoryError> {
        let items = self
            .staged
            .communications
            .values()
            .filter(|c| c.application_id == application_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(items, |c: &Communication| c.created_at))
    }

    async fn save_communication(
        &mut self,
        communication: &Communication,
    ) -> Result<(), RepositoryError> {
        self.staged.communications.insert(communication.id, communication.clone());
        Ok(())
    }

    async fn delete_communications(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<u64, RepositoryError> {
        let before = self.staged.communications.len();
        self.staged.communications.retain(|_, c| c.application_id != application_id);
        Ok((before - self.staged.communications.len()) as u64)
    }

    async fn find_vote(
        &mut self,
        application_id: ApplicationId,
        reviewer: &ActorId,
    ) -> Result<Option<Vote>, RepositoryError> {
        Ok(self.staged.votes.get(&(application_id, reviewer.clone())).cloned())
    }

    async fn list_votes(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<Vec<Vote>, RepositoryError> {
        let votes = self
            .staged
            .votes
            .values()
            .filter(|v| v.application_id == application_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(votes, |v: &Vote| v.created_at))
    }

    async fn save_vote(&mut self, vote: &Vote) -> Result<(), RepositoryError> {
        self.staged
            .votes
            .insert((vote.application_id, vote.reviewer_id.clone()), vote.clone());
        Ok(())
    }

    async fn delete_votes(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<u64, RepositoryError> {
        let before = self.staged.votes.len();
        self.staged.votes.retain(|(app, _), _| *app != application_id);
        Ok((before - self.staged.votes.len()) as u64)
    }

    async fn find_budget_assessment(
        &mut self,
        application_id: ApplicationId,
        reviewer: &ActorId,
    ) -> Result<Option<BudgetAssessment>, RepositoryError> {
        Ok(self.staged.assessments.get(&(application_id, reviewer.clone())).cloned())
    }

    async fn list_budget_assessments(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<Vec<BudgetAssessment>, RepositoryError> {
        let items = self
            .staged
            .assessments
            .values()
            .filter(|a| a.application_id == application_id)
            .cloned()
            .collect();
        Ok(sorted_by_creation(items, |a: &BudgetAssessment| a.created_at))
    }

    async fn save_budget_assessment(
        &mut self,
        assessment: &BudgetAssessment,
    ) -> Result<(), RepositoryError> {
        self.staged.assessments.insert(
            (assessment.application_id, assessment.reviewer_id.clone()),
            assessment.clone(),
        );
        Ok(())
    }

    async fn delete_budget_assessments(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<u64, RepositoryError> {
        let before = self.staged.assessments.len();
        self.staged.assessments.retain(|(app, _), _| *app != application_id);
        Ok((before - self.staged.assessments.len()) as u64)
    }

    async fn find_cycle(&mut self, id: CycleId) -> Result<Option<GrantCycle>, RepositoryError> {
        Ok(self.staged.cycles.get(&id).cloned())
    }

    async fn list_cycles(&mut self) -> Result<Vec<GrantCycle>, RepositoryError> {
        let mut cycles: Vec<GrantCycle> = self.staged.cycles.values().cloned().collect();
        cycles.sort_by(|a, b| b.year.cmp(&a.year).then_with(|| a.label.cmp(&b.label)));
        Ok(cycles)
    }

    async fn save_cycle(&mut self, cycle: &GrantCycle) -> Result<(), RepositoryError> {
        if self
            .staged
            .cycles
            .values()
            .any(|c| c.id != cycle.id && c.same_period(&cycle.label, cycle.year))
        {
            return Err(RepositoryError::Conflict(format!(
                "cycle {} already exists",
                cycle.display_name()
            )));
        }
        self.staged.cycles.insert(cycle.id, cycle.clone());
        Ok(())
    }

    async fn delete_cycle(&mut self, id: CycleId) -> Result<(), RepositoryError> {
        self.staged.cycles.remove(&id);
        Ok(())
    }

    async fn count_cycle_records(&mut self, id: CycleId) -> Result<(u64, u64), RepositoryError> {
        let lois = self.staged.lois.values().filter(|l| l.cycle_id == id).count() as u64;
        let applications = self
            .staged
            .applications
            .values()
            .filter(|a| a.cycle_id == id)
            .count() as u64;
        Ok((lois, applications))
    }

    async fn find_organization(
        &mut self,
        id: OrganizationId,
    ) -> Result<Option<Organization>, RepositoryError> {
        Ok(self.staged.organizations.get(&id).cloned())
    }

    async fn save_organization(
        &mut self,
        organization: &Organization,
    ) -> Result<(), RepositoryError> {
        self.staged.organizations.insert(organization.id, organization.clone());
        Ok(())
    }

    async fn delete_organization(&mut self, id: OrganizationId) -> Result<(), RepositoryError> {
        self.staged.organizations.remove(&id);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        let InMemoryUnitOfWork { mut guard, staged, .. } = *self;
        *guard = staged;
        Ok(())
    }
}
