// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// PostgreSQL Grant Store
//
// Every table keeps the full record as a JSONB `document` plus the key
// columns needed for lookups and uniqueness constraints (see
// cli/migrations/). A unit of work is one database transaction.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{Postgres, Row, Transaction};

use crate::domain::actor::ActorId;
use crate::domain::application::{Application, ApplicationId};
use crate::domain::communication::{Communication, CommunicationId};
use crate::domain::cycle::{CycleId, GrantCycle};
use crate::domain::history::StatusHistoryEntry;
use crate::domain::loi::{LetterOfInterest, LoiId};
use crate::domain::organization::{Organization, OrganizationId};
use crate::domain::repository::{GrantStore, RepositoryError, UnitOfWork};
use crate::domain::review::{BudgetAssessment, Vote};
use crate::domain::status::RecordRef;

pub struct PostgresGrantStore {
    pool: PgPool,
}

impl PostgresGrantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantStore for PostgresGrantStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PostgresUnitOfWork { tx }))
    }
}

pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

fn decode<T: DeserializeOwned>(row: &PgRow) -> Result<T, RepositoryError> {
    let document: serde_json::Value = row.try_get("document")?;
    Ok(serde_json::from_value(document)?)
}

fn decode_all<T: DeserializeOwned>(rows: &[PgRow]) -> Result<Vec<T>, RepositoryError> {
    rows.iter().map(decode).collect()
}

fn record_key(record: RecordRef) -> (&'static str, uuid::Uuid) {
    match record {
        RecordRef::LetterOfInterest(id) => ("loi", id.0),
        RecordRef::Application(id) => ("application", id.0),
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn find_loi(&mut self, id: LoiId) -> Result<Option<LetterOfInterest>, RepositoryError> {
        let row = sqlx::query("SELECT document FROM letters_of_interest WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn find_loi_for_organization(
        &mut self,
        organization_id: OrganizationId,
        cycle_id: CycleId,
    ) -> Result<Option<LetterOfInterest>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT document
            FROM letters_of_interest
            WHERE organization_id = $1 AND cycle_id = $2
            FOR UPDATE
            "#,
        )
        .bind(organization_id.0)
        .bind(cycle_id.0)
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn list_lois_by_organization(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<LetterOfInterest>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM letters_of_interest
            WHERE organization_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(organization_id.0)
        .fetch_all(&mut *self.tx)
        .await?;
        decode_all(&rows)
    }

    async fn list_pending_releases(&mut self) -> Result<Vec<LetterOfInterest>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM letters_of_interest
            WHERE status IN ('APPROVED', 'DECLINED') AND notification_sent = FALSE
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await?;
        decode_all(&rows)
    }

    async fn save_loi(&mut self, loi: &LetterOfInterest) -> Result<(), RepositoryError> {
        let document = serde_json::to_value(loi)?;
        sqlx::query(
            r#"
            INSERT INTO letters_of_interest
                (id, organization_id, cycle_id, status, notification_sent, document,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                notification_sent = EXCLUDED.notification_sent,
                document = EXCLUDED.document,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(loi.id.0)
        .bind(loi.organization_id.0)
        .bind(loi.cycle_id.0)
        .bind(loi.status.as_str())
        .bind(loi.notification_sent)
        .bind(&document)
        .bind(loi.created_at)
        .bind(loi.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_loi(&mut self, id: LoiId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM letters_of_interest WHERE id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find_application(
        &mut self,
        id: ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let row = sqlx::query("SELECT document FROM applications WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn find_applications_for_organization(
        &mut self,
        organization_id: OrganizationId,
        cycle_id: CycleId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT document FROM applications
            WHERE organization_id = $1 AND cycle_id = $2
            ORDER BY created_at ASC
            FOR UPDATE
            "#,
        )
        .bind(organization_id.0)
        .bind(cycle_id.0)
        .fetch_all(&mut *self.tx)
        .await?;
        decode_all(&rows)
    }

    async fn find_applications_by_loi(
        &mut self,
        loi_id: LoiId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT document FROM applications WHERE loi_id = $1 ORDER BY created_at ASC",
        )
        .bind(loi_id.0)
        .fetch_all(&mut *self.tx)
        .await?;
        decode_all(&rows)
    }

    async fn list_applications_by_organization(
        &mut self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Application>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT document FROM applications WHERE organization_id = $1 ORDER BY created_at ASC",
        )
        .bind(organization_id.0)
        .fetch_all(&mut *self.tx)
        .await?;
        decode_all(&rows)
    }

    async fn save_application(&mut self, application: &Application) -> Result<(), RepositoryError> {
        let document = serde_json::to_value(application)?;
        sqlx::query(
            r#"
            INSERT INTO applications
                (id, organization_id, cycle_id, loi_id, status, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                document = EXCLUDED.document,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(application.id.0)
        .bind(application.organization_id.0)
        .bind(application.cycle_id.0)
        .bind(application.loi_id.map(|id| id.0))
        .bind(application.status.as_str())
        .bind(&document)
        .bind(application.created_at)
        .bind(application.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_application(&mut self, id: ApplicationId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn append_history(&mut self, entry: &StatusHistoryEntry) -> Result<(), RepositoryError> {
        let (record_type, record_id) = record_key(entry.record);
        let document = serde_json::to_value(entry)?;
        sqlx::query(
            r#"
            INSERT INTO status_history
                (id, record_type, record_id, previous_status, new_status, actor_id, document,
                 created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id.0)
        .bind(record_type)
        .bind(record_id)
        .bind(entry.previous_status.as_str())
        .bind(entry.new_status.as_str())
        .bind(entry.actor_id.as_str())
        .bind(&document)
        .bind(entry.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn list_history(
        &mut self,
        record: RecordRef,
    ) -> Result<Vec<StatusHistoryEntry>, RepositoryError> {
        let (record_type, record_id) = record_key(record);
        let rows = sqlx::query(
            r#"
            SELECT document FROM status_history
            WHERE record_type = $1 AND record_id = $2
            ORDER BY created_at DESC, seq DESC
            "#,
        )
        .bind(record_type)
        .bind(record_id)
        .fetch_all(&mut *self.tx)
        .await?;
        decode_all(&rows)
    }

    async fn purge_history(&mut self, record: RecordRef) -> Result<u64, RepositoryError> {
        let (record_type, record_id) = record_key(record);
        let result = sqlx::query(
            "DELETE FROM status_history WHERE record_type = $1 AND record_id = $2",
        )
        .bind(record_type)
        .bind(record_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn find_communication(
        &mut self,
        id: CommunicationId,
    ) -> Result<Option<Communication>, RepositoryError> {
        let row = sqlx::query("SELECT document FROM communications WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn list_communications(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<Vec<Communication>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT document FROM communications WHERE application_id = $1 ORDER BY created_at ASC",
        )
        .bind(application_id.0)
        .fetch_all(&mut *self.tx)
        .await?;
        decode_all(&rows)
    }

    async fn save_communication(
        &mut self,
        communication: &Communication,
    ) -> Result<(), RepositoryError> {
        let document = serde_json::to_value(communication)?;
        sqlx::query(
            r#"
            INSERT INTO communications (id, application_id, awaiting_response, document, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE SET
                awaiting_response = EXCLUDED.awaiting_response,
                document = EXCLUDED.document
            "#,
        )
        .bind(communication.id.0)
        .bind(communication.application_id.0)
        .bind(communication.is_pending())
        .bind(&document)
        .bind(communication.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_communications(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM communications WHERE application_id = $1")
            .bind(application_id.0)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_vote(
        &mut self,
        application_id: ApplicationId,
        reviewer: &ActorId,
    ) -> Result<Option<Vote>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT document
            FROM review_votes
            WHERE application_id = $1 AND reviewer_id = $2
            FOR UPDATE
            "#,
        )
        .bind(application_id.0)
        .bind(reviewer.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn list_votes(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<Vec<Vote>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT document FROM review_votes WHERE application_id = $1 ORDER BY created_at ASC",
        )
        .bind(application_id.0)
        .fetch_all(&mut *self.tx)
        .await?;
        decode_all(&rows)
    }

    async fn save_vote(&mut self, vote: &Vote) -> Result<(), RepositoryError> {
        let document = serde_json::to_value(vote)?;
        sqlx::query(
            r#"
            INSERT INTO review_votes
                (id, application_id, reviewer_id, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (application_id, reviewer_id) DO UPDATE SET
                document = EXCLUDED.document,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(vote.id.0)
        .bind(vote.application_id.0)
        .bind(vote.reviewer_id.as_str())
        .bind(&document)
        .bind(vote.created_at)
        .bind(vote.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_votes(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM review_votes WHERE application_id = $1")
            .bind(application_id.0)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_budget_assessment(
        &mut self,
        application_id: ApplicationId,
        reviewer: &ActorId,
    ) -> Result<Option<BudgetAssessment>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT document
            FROM budget_assessments
            WHERE application_id = $1 AND reviewer_id = $2
            FOR UPDATE
            "#,
        )
        .bind(application_id.0)
        .bind(reviewer.as_str())
        .fetch_optional(&mut *self.tx)
        .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn list_budget_assessments(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<Vec<BudgetAssessment>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT document
            FROM budget_assessments
            WHERE application_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(application_id.0)
        .fetch_all(&mut *self.tx)
        .await?;
        decode_all(&rows)
    }

    async fn save_budget_assessment(
        &mut self,
        assessment: &BudgetAssessment,
    ) -> Result<(), RepositoryError> {
        let document = serde_json::to_value(assessment)?;
        sqlx::query(
            r#"
            INSERT INTO budget_assessments
                (id, application_id, reviewer_id, composite_score, document, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (application_id, reviewer_id) DO UPDATE SET
                composite_score = EXCLUDED.composite_score,
                document = EXCLUDED.document,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(assessment.id.0)
        .bind(assessment.application_id.0)
        .bind(assessment.reviewer_id.as_str())
        .bind(assessment.composite_score)
        .bind(&document)
        .bind(assessment.created_at)
        .bind(assessment.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_budget_assessments(
        &mut self,
        application_id: ApplicationId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM budget_assessments WHERE application_id = $1")
            .bind(application_id.0)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_cycle(&mut self, id: CycleId) -> Result<Option<GrantCycle>, RepositoryError> {
        let row = sqlx::query("SELECT document FROM grant_cycles WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn list_cycles(&mut self) -> Result<Vec<GrantCycle>, RepositoryError> {
        let rows = sqlx::query("SELECT document FROM grant_cycles ORDER BY year DESC, label ASC")
            .fetch_all(&mut *self.tx)
            .await?;
        decode_all(&rows)
    }

    async fn save_cycle(&mut self, cycle: &GrantCycle) -> Result<(), RepositoryError> {
        let document = serde_json::to_value(cycle)?;
        sqlx::query(
            r#"
            INSERT INTO grant_cycles (id, label, year, is_active, document, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                label = EXCLUDED.label,
                year = EXCLUDED.year,
                is_active = EXCLUDED.is_active,
                document = EXCLUDED.document
            "#,
        )
        .bind(cycle.id.0)
        .bind(&cycle.label)
        .bind(cycle.year)
        .bind(cycle.is_active)
        .bind(&document)
        .bind(cycle.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_cycle(&mut self, id: CycleId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM grant_cycles WHERE id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn count_cycle_records(&mut self, id: CycleId) -> Result<(u64, u64), RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM letters_of_interest WHERE cycle_id = $1) AS lois,
                (SELECT COUNT(*) FROM applications WHERE cycle_id = $1) AS applications
            "#,
        )
        .bind(id.0)
        .fetch_one(&mut *self.tx)
        .await?;
        let lois: i64 = row.try_get("lois")?;
        let applications: i64 = row.try_get("applications")?;
        Ok((lois.max(0) as u64, applications.max(0) as u64))
    }

    async fn find_organization(
        &mut self,
        id: OrganizationId,
    ) -> Result<Option<Organization>, RepositoryError> {
        let row = sqlx::query("SELECT document FROM organizations WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn save_organization(
        &mut self,
        organization: &Organization,
    ) -> Result<(), RepositoryError> {
        let document = serde_json::to_value(organization)?;
        sqlx::query(
            r#"
            INSERT INTO organizations (id, name, document, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                document = EXCLUDED.document
            "#,
        )
        .bind(organization.id.0)
        .bind(&organization.name)
        .bind(&document)
        .bind(organization.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn delete_organization(&mut self, id: OrganizationId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id.0)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
