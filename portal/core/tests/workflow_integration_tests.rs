// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end LOI and Application lifecycle tests over the in-memory store.

mod common;

use chrono::{Duration, Utc};

use common::{complete_loi_content, portal, STAFF_INBOX};
use grantflow_core::domain::errors::{PreconditionViolation, WorkflowError};
use grantflow_core::domain::events::LoiEvent;
use grantflow_core::domain::notification::NotificationKind;
use grantflow_core::domain::repository::{GrantStore, UnitOfWork};
use grantflow_core::domain::status::{Decision, EntityKind, RecordStatus};
use grantflow_core::infrastructure::event_bus::DomainEvent;

#[tokio::test]
async fn test_submit_loi_records_single_history_row() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &["lead@orchard.test"]).await;
    let loi = portal.draft_loi(&org).await;

    let submitted = portal.workflow.submit_loi(&portal.applicant(&org), loi.id).await.unwrap();
    assert_eq!(submitted.status, RecordStatus::Submitted);
    assert!(submitted.submitted_at.is_some());

    let history = portal.workflow.loi_history(&portal.member, loi.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].previous_status, RecordStatus::Draft);
    assert_eq!(history[0].new_status, RecordStatus::Submitted);

    // Staff are told about the submission after commit.
    let sent = portal.sender.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].kind, NotificationKind::Submitted);
    assert_eq!(sent[0].recipient, STAFF_INBOX);
}

#[tokio::test]
async fn test_submit_loi_with_missing_fields_is_rejected_without_history() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let applicant = portal.applicant(&org);
    let mut content = complete_loi_content();
    content.goals = "   ".to_string();
    content.requested_amount = None;
    let loi = portal
        .workflow
        .create_loi_draft(&applicant, portal.cycle.id, content)
        .await
        .unwrap();

    let err = portal.workflow.submit_loi(&applicant, loi.id).await.unwrap_err();
    match err {
        WorkflowError::PreconditionFailed(PreconditionViolation::MissingRequiredFields {
            fields,
        }) => {
            assert_eq!(fields, vec!["goals", "requested_amount"]);
        }
        other => panic!("expected MissingRequiredFields, got {:?}", other),
    }

    let loi = portal.workflow.get_loi(&applicant, loi.id).await.unwrap();
    assert_eq!(loi.status, RecordStatus::Draft);
    assert!(portal.workflow.loi_history(&applicant, loi.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_submit_loi_over_word_limit_is_rejected() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let applicant = portal.applicant(&org);
    let mut content = complete_loi_content();
    content.description = "word ".repeat(5_000);
    let loi = portal
        .workflow
        .create_loi_draft(&applicant, portal.cycle.id, content)
        .await
        .unwrap();

    let err = portal.workflow.submit_loi(&applicant, loi.id).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::PreconditionFailed(PreconditionViolation::WordLimitExceeded {
            field: "description",
            ..
        })
    ));
}

#[tokio::test]
async fn test_submit_loi_after_deadline_is_rejected() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let loi = portal.draft_loi(&org).await;

    // Close the LOI window behind the draft's back.
    let mut uow = portal.store.begin().await.unwrap();
    let mut cycle = uow.find_cycle(portal.cycle.id).await.unwrap().unwrap();
    cycle.loi_deadline = Utc::now() - Duration::hours(1);
    uow.save_cycle(&cycle).await.unwrap();
    uow.commit().await.unwrap();

    let err = portal.workflow.submit_loi(&portal.applicant(&org), loi.id).await.unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::PreconditionFailed(PreconditionViolation::DeadlinePassed { .. })
    ));
}

#[tokio::test]
async fn test_second_loi_for_same_organization_and_cycle_is_duplicate() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let first = portal.draft_loi(&org).await;

    let err = portal
        .workflow
        .create_loi_draft(&portal.applicant(&org), portal.cycle.id, complete_loi_content())
        .await
        .unwrap_err();
    match err {
        WorkflowError::PreconditionFailed(PreconditionViolation::DuplicateRecord {
            entity,
            existing_id,
        }) => {
            assert_eq!(entity, EntityKind::LetterOfInterest);
            assert_eq!(existing_id, first.id.to_string());
        }
        other => panic!("expected DuplicateRecord, got {:?}", other),
    }
}

#[tokio::test]
async fn test_applicant_cannot_act_on_another_organizations_loi() {
    let portal = portal().await;
    let owner = portal.organization("Orchard Collective", &[]).await;
    let stranger = portal.organization("Harbor Friends", &[]).await;
    let loi = portal.draft_loi(&owner).await;

    let err = portal
        .workflow
        .submit_loi(&portal.applicant(&stranger), loi.id)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { action: "submitLOI", .. }));
}

#[tokio::test]
async fn test_begin_review_then_invalid_resubmit_reports_allowed_targets() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let loi = portal.submitted_loi(&org).await;

    let reviewing = portal.workflow.begin_loi_review(&portal.member, loi.id).await.unwrap();
    assert_eq!(reviewing.status, RecordStatus::UnderReview);

    let err = portal.workflow.submit_loi(&portal.applicant(&org), loi.id).await.unwrap_err();
    match err {
        WorkflowError::InvalidTransition { current, target, allowed, .. } => {
            assert_eq!(current, RecordStatus::UnderReview);
            assert_eq!(target, RecordStatus::Submitted);
            assert_eq!(allowed, vec![RecordStatus::Approved, RecordStatus::Declined]);
        }
        other => panic!("expected InvalidTransition, got {:?}", other),
    }
}

#[tokio::test]
async fn test_approved_and_declined_lois_derive_exactly_one_application() {
    let portal = portal().await;
    let first_org = portal.organization("Orchard Collective", &["lead@orchard.test"]).await;
    let second_org = portal.organization("Harbor Friends", &["chair@harbor.test"]).await;
    let first = portal.submitted_loi(&first_org).await;
    let second = portal.submitted_loi(&second_org).await;

    let mut events = portal.workflow.event_bus().subscribe();

    let approved = portal
        .workflow
        .decide_loi(&portal.admin, first.id, Decision::Approved, None, Some("Strong fit".into()))
        .await
        .unwrap();
    let declined = portal
        .workflow
        .decide_loi(&portal.admin, second.id, Decision::Declined, Some("Out of scope".into()), None)
        .await
        .unwrap();

    let application = approved.derived_application.expect("approval derives an application");
    assert_eq!(application.loi_id, Some(first.id));
    assert_eq!(application.status, RecordStatus::Draft);
    assert_eq!(application.summary.title, first.content.title);
    assert_eq!(approved.loi.derived_application_id, Some(application.id));
    assert!(declined.derived_application.is_none());

    // Neither decision is visible to applicants until released.
    assert!(!approved.loi.notification_sent);
    assert!(!declined.loi.notification_sent);

    let mut uow = portal.store.begin().await.unwrap();
    assert_eq!(uow.find_applications_by_loi(first.id).await.unwrap().len(), 1);
    assert!(uow.find_applications_by_loi(second.id).await.unwrap().is_empty());
    assert!(uow
        .list_applications_by_organization(second_org.id)
        .await
        .unwrap()
        .is_empty());
    drop(uow);

    let history = portal.workflow.loi_history(&portal.admin, first.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].new_status, RecordStatus::Approved);
    assert_eq!(history[0].actor_name, "Ada Admin");

    match events.recv().await.unwrap() {
        DomainEvent::Loi(LoiEvent::LoiDecided { loi_id, derived_application_id, .. }) => {
            assert_eq!(loi_id, first.id);
            assert_eq!(derived_application_id, Some(application.id));
        }
        other => panic!("expected LoiDecided, got {:?}", other),
    }
}

#[tokio::test]
async fn test_decided_loi_cannot_be_decided_again() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let loi = portal.submitted_loi(&org).await;
    portal
        .workflow
        .decide_loi(&portal.member, loi.id, Decision::Declined, None, None)
        .await
        .unwrap();

    let err = portal
        .workflow
        .decide_loi(&portal.member, loi.id, Decision::Approved, None, None)
        .await
        .unwrap_err();
    match err {
        WorkflowError::InvalidTransition { current, allowed, .. } => {
            assert_eq!(current, RecordStatus::Declined);
            assert!(allowed.is_empty());
        }
        other => panic!("expected InvalidTransition, got {:?}", other),
    }
}

#[tokio::test]
async fn test_info_request_cycle_round_trips_to_under_review() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &["lead@orchard.test"]).await;
    let application = portal.application_under_review(&org).await;
    let applicant = portal.applicant(&org);

    let request = portal
        .workflow
        .request_application_info(&portal.manager, application.id, "Please clarify budget", None)
        .await
        .unwrap();
    assert!(request.response_required);
    assert!(request.response_received_at.is_none());
    let current = portal.workflow.get_application(&applicant, application.id).await.unwrap();
    assert_eq!(current.status, RecordStatus::InfoRequested);

    let err = portal
        .workflow
        .request_application_info(&portal.manager, application.id, "Also the timeline", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::PreconditionFailed(PreconditionViolation::PendingInfoRequest { .. })
    ));

    let pending = portal
        .workflow
        .pending_info_request(&applicant, application.id)
        .await
        .unwrap()
        .expect("request is pending");
    assert_eq!(pending.id, request.id);

    let answered = portal
        .workflow
        .respond_application_info(&applicant, application.id, request.id, "Revised budget attached")
        .await
        .unwrap();
    assert!(answered.response_received_at.is_some());
    assert_eq!(answered.response_content.as_deref(), Some("Revised budget attached"));

    let current = portal.workflow.get_application(&applicant, application.id).await.unwrap();
    assert_eq!(current.status, RecordStatus::UnderReview);
    assert!(portal
        .workflow
        .pending_info_request(&applicant, application.id)
        .await
        .unwrap()
        .is_none());

    let history = portal.workflow.application_history(&applicant, application.id).await.unwrap();
    let transitions: Vec<_> = history.iter().map(|h| (h.previous_status, h.new_status)).collect();
    assert_eq!(
        transitions,
        vec![
            (RecordStatus::InfoRequested, RecordStatus::UnderReview),
            (RecordStatus::UnderReview, RecordStatus::InfoRequested),
            (RecordStatus::Submitted, RecordStatus::UnderReview),
            (RecordStatus::Draft, RecordStatus::Submitted),
        ]
    );

    let kinds: Vec<_> = portal.sender.sent().iter().map(|i| i.kind).collect();
    assert!(kinds.contains(&NotificationKind::InfoRequested));
}

#[tokio::test]
async fn test_member_cannot_request_info() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let application = portal.application_under_review(&org).await;

    let err = portal
        .workflow
        .request_application_info(&portal.member, application.id, "Budget?", None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { .. }));
}

#[tokio::test]
async fn test_application_decision_requires_admin_and_notifies_applicant() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &["lead@orchard.test"]).await;
    let application = portal.application_under_review(&org).await;

    let err = portal
        .workflow
        .decide_application(&portal.manager, application.id, Decision::Approved, None)
        .await
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Forbidden { action: "decideApplication", .. }));

    let decided = portal
        .workflow
        .decide_application(
            &portal.admin,
            application.id,
            Decision::Declined,
            Some("Budget gaps".into()),
        )
        .await
        .unwrap();
    assert_eq!(decided.status, RecordStatus::Declined);

    let declined = portal
        .sender
        .sent()
        .into_iter()
        .find(|i| i.kind == NotificationKind::Declined)
        .expect("applicant notified");
    assert_eq!(declined.recipient, "lead@orchard.test");
    assert_eq!(declined.reason.as_deref(), Some("Budget gaps"));
}

#[tokio::test]
async fn test_anonymous_actor_is_unauthorized() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let loi = portal.draft_loi(&org).await;
    let anonymous = grantflow_core::domain::actor::Actor::applicant("", "", org.id);

    let err = portal.workflow.submit_loi(&anonymous, loi.id).await.unwrap_err();
    assert!(matches!(err, WorkflowError::Unauthorized));
}

#[tokio::test]
async fn test_unknown_records_are_not_found() {
    let portal = portal().await;
    let err = portal
        .workflow
        .decide_loi(
            &portal.admin,
            grantflow_core::domain::loi::LoiId::new(),
            Decision::Approved,
            None,
            None,
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "not_found");
}
