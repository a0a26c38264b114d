// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Votes and budget assessments: upsert per reviewer, advisory only.

mod common;

use common::portal;
use grantflow_core::domain::actor::{Actor, StaffGrade};
use grantflow_core::domain::errors::{PreconditionViolation, WorkflowError};
use grantflow_core::domain::review::{BudgetScores, VoteValue};
use grantflow_core::domain::status::{Decision, RecordStatus};

#[tokio::test]
async fn test_repeated_vote_overwrites_single_row() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let application = portal.application_under_review(&org).await;

    let first = portal
        .workflow
        .cast_vote(&portal.member, application.id, VoteValue::Approve, None)
        .await
        .unwrap();
    let second = portal
        .workflow
        .cast_vote(&portal.member, application.id, VoteValue::Approve, None)
        .await
        .unwrap();
    assert_eq!(first.id, second.id);

    portal
        .workflow
        .cast_vote(&portal.member, application.id, VoteValue::Decline, Some("Weak budget".into()))
        .await
        .unwrap();
    let other_reviewer = Actor::staff("staff-2", "Kai", StaffGrade::Member);
    portal
        .workflow
        .cast_vote(&other_reviewer, application.id, VoteValue::Abstain, None)
        .await
        .unwrap();

    let votes = portal.workflow.list_votes(&portal.admin, application.id).await.unwrap();
    assert_eq!(votes.len(), 2);
    let mine = votes.iter().find(|v| v.reviewer_id == portal.member.id).unwrap();
    assert_eq!(mine.value, VoteValue::Decline);
    assert_eq!(mine.reasoning.as_deref(), Some("Weak budget"));

    // Votes never move the application.
    let current = portal.workflow.get_application(&portal.admin, application.id).await.unwrap();
    assert_eq!(current.status, RecordStatus::UnderReview);
}

#[tokio::test]
async fn test_budget_assessment_composite_and_upsert() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let application = portal.application_under_review(&org).await;

    let full = portal
        .workflow
        .submit_budget_assessment(
            &portal.member,
            application.id,
            BudgetScores::new(8.0, 6.0, 4.0, 10.0),
            None,
        )
        .await
        .unwrap();
    let expected = 0.30 * 8.0 + 0.25 * 6.0 + 0.25 * 4.0 + 0.20 * 10.0;
    assert!((full.composite_score.unwrap() - expected).abs() < 1e-9);

    let mut partial = BudgetScores::new(8.0, 6.0, 4.0, 10.0);
    partial.budget_clarity = None;
    let updated = portal
        .workflow
        .submit_budget_assessment(
            &portal.member,
            application.id,
            partial,
            Some("Awaiting detail".into()),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, full.id);
    assert_eq!(updated.composite_score, None);

    let stored = portal
        .workflow
        .list_budget_assessments(&portal.member, application.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].notes.as_deref(), Some("Awaiting detail"));
}

#[tokio::test]
async fn test_out_of_range_score_is_rejected() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let application = portal.application_under_review(&org).await;

    let err = portal
        .workflow
        .submit_budget_assessment(
            &portal.member,
            application.id,
            BudgetScores::new(8.0, 12.0, 4.0, 1.0),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::PreconditionFailed(PreconditionViolation::InvalidScore {
            field: "cost_reasonableness",
            ..
        })
    ));
}

#[tokio::test]
async fn test_review_inputs_close_after_decision() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let application = portal.application_under_review(&org).await;
    portal
        .workflow
        .decide_application(&portal.admin, application.id, Decision::Approved, None)
        .await
        .unwrap();

    let err = portal
        .workflow
        .cast_vote(&portal.member, application.id, VoteValue::Approve, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkflowError::PreconditionFailed(PreconditionViolation::ReviewClosed {
            status: RecordStatus::Approved
        })
    ));
}

#[tokio::test]
async fn test_applicants_cannot_vote_or_read_votes() {
    let portal = portal().await;
    let org = portal.organization("Orchard Collective", &[]).await;
    let application = portal.application_under_review(&org).await;
    let applicant = portal.applicant(&org);

    assert!(matches!(
        portal
            .workflow
            .cast_vote(&applicant, application.id, VoteValue::Approve, None)
            .await,
        Err(WorkflowError::Forbidden { .. })
    ));
    assert!(matches!(
        portal.workflow.list_votes(&applicant, application.id).await,
        Err(WorkflowError::Forbidden { .. })
    ));
}
