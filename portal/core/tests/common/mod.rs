// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Shared fixtures for workflow integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use std::sync::Arc;

use grantflow_core::application::GrantWorkflow;
use grantflow_core::domain::actor::{Actor, StaffGrade};
use grantflow_core::domain::application::Application;
use grantflow_core::domain::cycle::{CycleSchedule, GrantCycle};
use grantflow_core::domain::loi::{LetterOfInterest, LoiContent};
use grantflow_core::domain::organization::Organization;
use grantflow_core::domain::policy::AccessPolicy;
use grantflow_core::domain::status::Decision;
use grantflow_core::infrastructure::event_bus::EventBus;
use grantflow_core::infrastructure::notifications::RecordingNotificationSender;
use grantflow_core::infrastructure::repositories::InMemoryGrantStore;

pub const STAFF_INBOX: &str = "grants@foundation.test";

pub struct Portal {
    pub workflow: GrantWorkflow,
    pub store: InMemoryGrantStore,
    pub sender: RecordingNotificationSender,
    pub admin: Actor,
    pub manager: Actor,
    pub member: Actor,
    pub cycle: GrantCycle,
}

pub fn schedule(label: &str, year: i32) -> CycleSchedule {
    let now = Utc::now();
    CycleSchedule {
        label: label.to_string(),
        year,
        loi_open_date: Some(now - Duration::days(1)),
        loi_deadline: now + Duration::days(30),
        application_open_date: Some(now - Duration::days(1)),
        application_deadline: now + Duration::days(90),
        max_request_amount: Some(50_000),
    }
}

/// A portal with an active cycle open for both LOIs and applications.
pub async fn portal() -> Portal {
    let store = InMemoryGrantStore::new();
    let sender = RecordingNotificationSender::new();
    let workflow = GrantWorkflow::new(
        Arc::new(store.clone()),
        AccessPolicy::default(),
        Arc::new(sender.clone()),
        Some(STAFF_INBOX.to_string()),
        EventBus::with_default_capacity(),
    );

    let admin = Actor::staff("staff-admin", "Ada Admin", StaffGrade::Admin);
    let cycle = workflow.create_cycle(&admin, schedule("Spring", 2027)).await.unwrap();
    workflow.set_cycle_intake(&admin, cycle.id, true, true).await.unwrap();
    let cycle = workflow.activate_cycle(&admin, cycle.id).await.unwrap();

    Portal {
        workflow,
        store,
        sender,
        admin,
        manager: Actor::staff("staff-manager", "Max Manager", StaffGrade::Manager),
        member: Actor::staff("staff-member", "Mo Member", StaffGrade::Member),
        cycle,
    }
}

pub fn complete_loi_content() -> LoiContent {
    LoiContent {
        title: "Community orchard".to_string(),
        description: "Plant and maintain a shared orchard for the neighbourhood".to_string(),
        goals: "Fresh fruit and a gathering place".to_string(),
        focus_area: "Food security".to_string(),
        budget_outline: "Trees, irrigation, volunteer training".to_string(),
        requested_amount: Some(25_000),
        total_project_amount: Some(40_000),
        percentage_of_project: Some(62.5),
        mission_statement: "Growing food together".to_string(),
        contact_email: None,
    }
}

impl Portal {
    pub async fn organization(&self, name: &str, emails: &[&str]) -> Organization {
        self.workflow
            .register_organization(
                &self.admin,
                name,
                emails.iter().map(|e| e.to_string()).collect(),
            )
            .await
            .unwrap()
    }

    pub fn applicant(&self, organization: &Organization) -> Actor {
        Actor::applicant(format!("applicant-{}", organization.id), "Applicant", organization.id)
    }

    pub async fn draft_loi(&self, organization: &Organization) -> LetterOfInterest {
        self.workflow
            .create_loi_draft(&self.applicant(organization), self.cycle.id, complete_loi_content())
            .await
            .unwrap()
    }

    pub async fn submitted_loi(&self, organization: &Organization) -> LetterOfInterest {
        let loi = self.draft_loi(organization).await;
        self.workflow
            .submit_loi(&self.applicant(organization), loi.id)
            .await
            .unwrap()
    }

    /// An application reached through LOI approval and moved to UNDER_REVIEW.
    pub async fn application_under_review(&self, organization: &Organization) -> Application {
        let loi = self.submitted_loi(organization).await;
        let outcome = self
            .workflow
            .decide_loi(&self.member, loi.id, Decision::Approved, None, None)
            .await
            .unwrap();
        let application = outcome.derived_application.unwrap();
        self.workflow
            .submit_application(&self.applicant(organization), application.id)
            .await
            .unwrap();
        self.workflow
            .begin_application_review(&self.member, application.id)
            .await
            .unwrap()
    }
}
