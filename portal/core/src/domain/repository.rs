// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Repository Interfaces
//!
//! Persistence contract for the workflow core. Every workflow action runs in
//! exactly one [`UnitOfWork`] obtained from a [`GrantStore`]: reads that
//! precede a write happen inside the same unit, so a pre-condition checked by
//! the workflow still holds when the write commits. Dropping a unit without
//! calling [`UnitOfWork::commit`] discards every staged change.
//!
//! | Implementation | Backend | Use |
//! |----------------|---------|-----|
//! | `InMemoryGrantStore` | `tokio::sync::Mutex` snapshot | development and tests |
//! | `PostgresGrantStore` | `sqlx` transaction + row locks | production |
//!
//! Concrete implementations are selected at startup from the `database`
//! section of `grantflow-config.yaml`.

use async_trait::async_trait;

use crate::domain::actor::ActorId;
use crate::domain::application::{Application, ApplicationId};
use crate::domain::communication::{Communication, CommunicationId};
use crate::domain::cycle::{CycleId, GrantCycle};
use crate::domain::history::StatusHistoryEntry;
use crate::domain::loi::{LetterOfInterest, LoiId};
use crate::domain::organization::{Organization, OrganizationId};
use crate::domain::review::{BudgetAssessment, Vote};
use crate::domain::status::RecordRef;

/// Storage backend enum for pluggable persistence
#[derive(Debug, Clone)]
pub enum StorageBackend {
    InMemory,
    PostgreSQL(PostgresConfig),
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub connection_string: String,
    pub max_connections: u32,
}

/// Opens units of work. One unit per top-level workflow operation.
#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError>;
}

/// A single atomic read-modify-write scope over all workflow entities.
///
/// `find_*` lookups of a single record by id lock that record until the unit
/// ends, which is what makes check-then-act sequences safe.
#[async_trait]
pub trait UnitOfWork: Send {
    // Letters of Interest
    async fn find_loi(&mut self, id: LoiId) -> Result<Option<LetterOfInterest>, RepositoryError>;
    async fn find_loi_for_organization(
        &mut self,
        organization_id: OrganizationId,
        cycle_id: CycleId,
    ) -> Result<Option<LetterOfInterest>, RepositoryError>;
    async fn list_lois_by_organization(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<LetterOfInterest>, RepositoryError>;
    /// Decided LOIs whose decision has not been released.
    async fn list_pending_releases(&mut self) -> Result<Vec<LetterOfInterest>, RepositoryError>;
    async fn save_loi(&mut self, loi: &LetterOfInterest) -> Result<(), RepositoryError>;
    async fn delete_loi(&mut self, id: LoiId) -> Result<(), RepositoryError>;

    // Applications
    async fn find_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError>;
    async fn find_applications_for_organization(
        &mut self,
        organization_id: OrganizationId,
        cycle_id: CycleId,
    ) -> Result<Vec<Application>, RepositoryError>;
    async fn find_applications_by_loi(
        &mut self,
        loi_id: LoiId,
    ) -> Result<Vec<Application>, RepositoryError>;
    async fn list_applications_by_organization(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Application>, RepositoryError>;
    async fn save_application(&mut self, application: &Application) -> Result<(), RepositoryError>;
    async fn delete_application(&mut self, id: ApplicationId) -> Result<(), RepositoryError>;

    // Status history (append-only)
    async fn append_history(&mut self, entry: &StatusHistoryEntry) -> Result<(), RepositoryError>;
    /// Newest first.
    async fn list_history(
        &mut self,
        record: RecordRef,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError>;
    /// Only used by the delete closure when the owning record itself is removed.
    async fn purge_history(&mut self, record: RecordRef) -> Result<u64, RepositoryError>;

    // Communications
    async fn find_communication(
        &mut self,
        id: CommunicationId,
    ) -> Result<Option<Communication>, RepositoryError>;
    async fn list_communications(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<Vec<Communication>, RepositoryError>;
    async fn save_communication(
        &mut self,
        communication: &Communication,
    ) -> Result<(), RepositoryError>;
    async fn delete_communications(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<u64, RepositoryError>;

    // Review inputs
    async fn find_vote(
        &mut self,
        application_id: ApplicationId,
        reviewer: &ActorId,
    ) -> Result<Option<Vote>, RepositoryError>;
    async fn list_votes(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<Vec<Vote>, RepositoryError>;
    async fn save_vote(&mut self, vote: &Vote) -> Result<(), RepositoryError>;
    async fn delete_votes(&mut self, application_id: ApplicationId) -> Result<u64, RepositoryError>;
    async fn find_budget_assessment(
        &mut self,
        application_id: ApplicationId,
        reviewer: &ActorId,
    ) -> Result<Option<BudgetAssessment>, RepositoryError>;
    async fn list_budget_assessments(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<Vec<BudgetAssessment>, RepositoryError>;
    async fn save_budget_assessment(
        &mut self,
        assessment: &BudgetAssessment,
    ) -> Result<(), RepositoryError>;
    async fn delete_budget_assessments(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<u64, RepositoryError>;

    // Grant cycles
    async fn find_cycle(&mut self, id: CycleId) -> Result<Option<GrantCycle>, RepositoryError>;
    async fn list_cycles(&mut self) -> Result<Vec<GrantCycle>, RepositoryError>;
    async fn save_cycle(&mut self, cycle: &GrantCycle) -> Result<(), RepositoryError>;
    async fn delete_cycle(&mut self, id: CycleId) -> Result<(), RepositoryError>;
    /// (LOIs, Applications) referencing the cycle.
    async fn count_cycle_records(&mut self, id: CycleId) -> Result<(u64, u64), RepositoryError>;

    // Organizations
    async fn find_organization(
        &mut self,
        id: OrganizationId,
    ) -> Result<Option<Organization>, RepositoryError>;
    async fn save_organization(
        &mut self,
        organization: &Organization,
    ) -> Result<(), RepositoryError>;
    async fn delete_organization(&mut self, id: OrganizationId) -> Result<(), RepositoryError>;

    /// Make every staged change durable.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Constraint violated: {0}")]
    Conflict(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound("Row not found".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                RepositoryError::Conflict(db_err.message().to_string())
            }
            _ => RepositoryError::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}
