// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Workflow behavior against a live PostgreSQL record store.
//!
//! Ignored by default. Run with
//! `GRANTFLOW_TEST_DATABASE_URL=postgres://... cargo test -p grantflow-core -- --ignored`.
//! Every test works in its own uniquely labelled cycle so runs can share one database.

mod common;

use std::path::Path;
use std::sync::Arc;

use sqlx::migrate::Migrator;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use common::{complete_loi_content, schedule};
use grantflow_core::application::GrantWorkflow;
use grantflow_core::domain::actor::{Actor, StaffGrade};
use grantflow_core::domain::cycle::GrantCycle;
use grantflow_core::domain::errors::{PreconditionViolation, WorkflowError};
use grantflow_core::domain::loi::{LetterOfInterest, LoiId};
use grantflow_core::domain::organization::Organization;
use grantflow_core::domain::policy::AccessPolicy;
use grantflow_core::domain::repository::{GrantStore, RepositoryError, UnitOfWork};
use grantflow_core::domain::review::VoteValue;
use grantflow_core::domain::status::{Decision, RecordStatus};
use grantflow_core::infrastructure::event_bus::EventBus;
use grantflow_core::infrastructure::notifications::RecordingNotificationSender;
use grantflow_core::infrastructure::repositories::PostgresGrantStore;

const DATABASE_URL_VAR: &str = "GRANTFLOW_TEST_DATABASE_URL";

struct PgPortal {
    workflow: GrantWorkflow,
    store: PostgresGrantStore,
    admin: Actor,
    member: Actor,
    cycle: GrantCycle,
}

async fn migrated_pool() -> Option<PgPool> {
    let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
        eprintln!("{DATABASE_URL_VAR} not set; skipping");
        return None;
    };
    let pool = PgPoolOptions::new().max_connections(8).connect(&url).await.unwrap();
    let migrations = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../cli/migrations");
    Migrator::new(migrations).await.unwrap().run(&pool).await.unwrap();
    Some(pool)
}

fn unique_label() -> String {
    format!("pg-{}", Uuid::new_v4().simple())
}

async fn pg_portal() -> Option<PgPortal> {
    let pool = migrated_pool().await?;
    let store = PostgresGrantStore::new(pool.clone());
    let workflow = GrantWorkflow::new(
        Arc::new(PostgresGrantStore::new(pool)),
        AccessPolicy::default(),
        Arc::new(RecordingNotificationSender::new()),
        None,
        EventBus::with_default_capacity(),
    );
    let admin = Actor::staff("pg-admin", "Ada Admin", StaffGrade::Admin);
    let cycle = workflow
        .create_cycle(&admin, schedule(&unique_label(), 2027))
        .await
        .unwrap();
    let cycle = workflow.set_cycle_intake(&admin, cycle.id, true, true).await.unwrap();

    Some(PgPortal {
        workflow,
        store,
        admin,
        member: Actor::staff("pg-member", "Mo Member", StaffGrade::Member),
        cycle,
    })
}

impl PgPortal {
    async fn organization(&self) -> Organization {
        self.workflow
            .register_organization(&self.admin, &unique_label(), vec![])
            .await
            .unwrap()
    }

    fn applicant(&self, organization: &Organization) -> Actor {
        Actor::applicant(format!("applicant-{}", organization.id), "Applicant", organization.id)
    }

    async fn submitted_loi(&self, organization: &Organization) -> LetterOfInterest {
        let applicant = self.applicant(organization);
        let loi = self
            .workflow
            .create_loi_draft(&applicant, self.cycle.id, complete_loi_content())
            .await
            .unwrap();
        self.workflow.submit_loi(&applicant, loi.id).await.unwrap()
    }
}

#[tokio::test]
#[ignore]
async fn test_second_loi_for_same_organization_and_cycle_is_a_conflict() {
    let Some(portal) = pg_portal().await else { return };
    let org = portal.organization().await;
    let loi = portal.submitted_loi(&org).await;

    let mut twin = loi.clone();
    twin.id = LoiId::new();
    let mut uow = portal.store.begin().await.unwrap();
    let err = uow.save_loi(&twin).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
#[ignore]
async fn test_concurrent_decisions_on_one_loi_admit_a_single_winner() {
    let Some(portal) = pg_portal().await else { return };
    let org = portal.organization().await;
    let loi = portal.submitted_loi(&org).await;

    let (first, second) = tokio::join!(
        portal
            .workflow
            .decide_loi(&portal.member, loi.id, Decision::Approved, None, None),
        portal
            .workflow
            .decide_loi(&portal.member, loi.id, Decision::Approved, None, None),
    );

    let outcomes = [first, second];
    let winners = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(winners, 1);
    let loser = outcomes.into_iter().find_map(Result::err).unwrap();
    assert_eq!(loser.kind(), "invalid_transition");

    let stored = portal.workflow.get_loi(&portal.admin, loi.id).await.unwrap();
    assert_eq!(stored.status, RecordStatus::Approved);
    let history = portal.workflow.loi_history(&portal.admin, loi.id).await.unwrap();
    let approvals = history
        .iter()
        .filter(|entry| entry.new_status == RecordStatus::Approved)
        .count();
    assert_eq!(approvals, 1);
}

#[tokio::test]
#[ignore]
async fn test_concurrent_cycle_creation_for_one_period_rejects_the_loser() {
    let Some(portal) = pg_portal().await else { return };
    let label = unique_label();

    let (first, second) = tokio::join!(
        portal.workflow.create_cycle(&portal.admin, schedule(&label, 2028)),
        portal.workflow.create_cycle(&portal.admin, schedule(&label, 2028)),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|o| o.is_ok()).count(), 1);
    let loser = outcomes.into_iter().find_map(Result::err).unwrap();
    assert!(
        matches!(
            loser,
            WorkflowError::PreconditionFailed(PreconditionViolation::DuplicateCycle {
                year: 2028,
                ..
            })
        ),
        "got {loser:?}"
    );
}

#[tokio::test]
#[ignore]
async fn test_deleting_organization_respects_foreign_keys() {
    let Some(portal) = pg_portal().await else { return };
    let org = portal.organization().await;
    let loi = portal.submitted_loi(&org).await;
    let outcome = portal
        .workflow
        .decide_loi(&portal.member, loi.id, Decision::Approved, None, None)
        .await
        .unwrap();
    let application = outcome.derived_application.unwrap();
    portal
        .workflow
        .submit_application(&portal.applicant(&org), application.id)
        .await
        .unwrap();
    portal
        .workflow
        .begin_application_review(&portal.member, application.id)
        .await
        .unwrap();
    portal
        .workflow
        .cast_vote(&portal.member, application.id, VoteValue::Approve, None)
        .await
        .unwrap();

    let summary = portal
        .workflow
        .delete_organization(&portal.admin, org.id)
        .await
        .unwrap();
    assert!(summary.organization_removed);
    assert_eq!(summary.records.len(), 2);
    assert_eq!(summary.votes, 1);

    portal
        .workflow
        .delete_cycle(&portal.admin, portal.cycle.id)
        .await
        .unwrap();
}
