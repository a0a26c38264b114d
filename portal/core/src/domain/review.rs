// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Review Inputs
//!
//! Advisory reviewer inputs on an Application: votes and budget assessments.
//! Both are keyed by (application, reviewer) with upsert semantics and never
//! gate a status transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::actor::{Actor, ActorId};
use crate::domain::application::ApplicationId;
use crate::domain::errors::PreconditionViolation;

pub const NEED_ALIGNMENT_WEIGHT: f64 = 0.30;
pub const COST_REASONABLENESS_WEIGHT: f64 = 0.25;
pub const SUSTAINABILITY_WEIGHT: f64 = 0.25;
pub const BUDGET_CLARITY_WEIGHT: f64 = 0.20;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewInputId(pub Uuid);

impl ReviewInputId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ReviewInputId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteValue {
    Approve,
    Decline,
    Abstain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub id: ReviewInputId,
    pub application_id: ApplicationId,
    pub reviewer_id: ActorId,
    pub reviewer_name: String,
    pub value: VoteValue,
    pub reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vote {
    /// Insert a new vote or overwrite the reviewer's existing one, keeping
    /// its identity and creation time.
    pub fn upsert(
        existing: Option<Vote>,
        application_id: ApplicationId,
        reviewer: &Actor,
        value: VoteValue,
        reasoning: Option<String>,
    ) -> Self {
        let now = Utc::now();
        match existing {
            Some(mut vote) => {
                vote.reviewer_name = reviewer.audit_name();
                vote.value = value;
                vote.reasoning = reasoning;
                vote.updated_at = now;
                vote
            }
            None => Self {
                id: ReviewInputId::new(),
                application_id,
                reviewer_id: reviewer.id.clone(),
                reviewer_name: reviewer.audit_name(),
                value,
                reasoning,
                created_at: now,
                updated_at: now,
            },
        }
    }
}

/// The four budget sub-scores; any may be left blank while a review is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetScores {
    pub need_alignment: Option<f64>,
    pub cost_reasonableness: Option<f64>,
    pub sustainability: Option<f64>,
    pub budget_clarity: Option<f64>,
}

impl BudgetScores {
    pub fn new(
        need_alignment: f64,
        cost_reasonableness: f64,
        sustainability: f64,
        budget_clarity: f64,
    ) -> Self {
        Self {
            need_alignment: Some(need_alignment),
            cost_reasonableness: Some(cost_reasonableness),
            sustainability: Some(sustainability),
            budget_clarity: Some(budget_clarity),
        }
    }

    pub fn validate(&self) -> Result<(), PreconditionViolation> {
        for (field, score) in [
            ("need_alignment", self.need_alignment),
            ("cost_reasonableness", self.cost_reasonableness),
            ("sustainability", self.sustainability),
            ("budget_clarity", self.budget_clarity),
        ] {
            if let Some(value) = score {
                if !value.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&value) {
                    return Err(PreconditionViolation::InvalidScore {
                        field,
                        min: MIN_SCORE,
                        max: MAX_SCORE,
                    });
                }
            }
        }
        Ok(())
    }

    /// Fixed-weight composite; `None` unless all four scores are present.
    pub fn composite(&self) -> Option<f64> {
        Some(
            NEED_ALIGNMENT_WEIGHT * self.need_alignment?
                + COST_REASONABLENESS_WEIGHT * self.cost_reasonableness?
                + SUSTAINABILITY_WEIGHT * self.sustainability?
                + BUDGET_CLARITY_WEIGHT * self.budget_clarity?,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAssessment {
    pub id: ReviewInputId,
    pub application_id: ApplicationId,
    pub reviewer_id: ActorId,
    pub reviewer_name: String,
    pub scores: BudgetScores,
    pub composite_score: Option<f64>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BudgetAssessment {
    /// Same upsert contract as [`Vote::upsert`]; the composite is recomputed
    /// on every write.
    pub fn upsert(
        existing: Option<BudgetAssessment>,
        application_id: ApplicationId,
        reviewer: &Actor,
        scores: BudgetScores,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        let mut assessment = existing.unwrap_or_else(|| Self {
            id: ReviewInputId::new(),
            application_id,
            reviewer_id: reviewer.id.clone(),
            reviewer_name: reviewer.audit_name(),
            scores: BudgetScores::default(),
            composite_score: None,
            notes: None,
            created_at: now,
            updated_at: now,
        });
        assessment.reviewer_name = reviewer.audit_name();
        assessment.scores = scores;
        assessment.composite_score = scores.composite();
        assessment.notes = notes;
        assessment.updated_at = now;
        assessment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::StaffGrade;

    #[test]
    fn test_composite_uses_fixed_weights() {
        let scores = BudgetScores::new(8.0, 6.0, 4.0, 10.0);
        let expected = 0.30 * 8.0 + 0.25 * 6.0 + 0.25 * 4.0 + 0.20 * 10.0;
        assert!((scores.composite().unwrap() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_composite_absent_when_any_score_missing() {
        let mut scores = BudgetScores::new(8.0, 6.0, 4.0, 10.0);
        scores.sustainability = None;
        assert_eq!(scores.composite(), None);
        assert_eq!(BudgetScores::default().composite(), None);
    }

    #[test]
    fn test_score_range_validation() {
        assert!(BudgetScores::new(0.0, 10.0, 5.5, 1.0).validate().is_ok());
        let mut scores = BudgetScores::default();
        scores.budget_clarity = Some(11.0);
        assert!(matches!(
            scores.validate(),
            Err(PreconditionViolation::InvalidScore { field: "budget_clarity", .. })
        ));
        scores.budget_clarity = Some(f64::NAN);
        assert!(scores.validate().is_err());
    }

    #[test]
    fn test_assessment_upsert_recomputes_composite_and_keeps_identity() {
        let reviewer = Actor::staff("s-1", "Sam", StaffGrade::Member);
        let app = ApplicationId::new();
        let first = BudgetAssessment::upsert(
            None,
            app,
            &reviewer,
            BudgetScores::new(5.0, 5.0, 5.0, 5.0),
            None,
        );
        assert_eq!(first.composite_score, Some(5.0));

        let mut partial = BudgetScores::new(9.0, 9.0, 9.0, 9.0);
        partial.need_alignment = None;
        let second = BudgetAssessment::upsert(
            Some(first.clone()),
            app,
            &reviewer,
            partial,
            Some("Pending".into()),
        );
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.composite_score, None);
    }

    #[test]
    fn test_vote_upsert_overwrites_value() {
        let reviewer = Actor::staff("s-2", "Kim", StaffGrade::Member);
        let app = ApplicationId::new();
        let first = Vote::upsert(None, app, &reviewer, VoteValue::Approve, None);
        let second = Vote::upsert(
            Some(first.clone()),
            app,
            &reviewer,
            VoteValue::Decline,
            Some("Budget gaps".into()),
        );
        assert_eq!(second.id, first.id);
        assert_eq!(second.value, VoteValue::Decline);
    }
}
