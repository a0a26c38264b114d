// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Grant Cycle
//!
//! A named funding period (label + year) that scopes LOI and Application
//! deadlines and the per-organization uniqueness of both record types.
//!
//! At most one cycle is active system-wide. That invariant is enforced by
//! [`crate::application::cycle_service::CycleAdministrationService`] inside a
//! single unit of work, never by callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CycleId(pub Uuid);

impl CycleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for CycleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CycleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input for creating a cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSchedule {
    pub label: String,
    pub year: i32,
    pub loi_open_date: Option<DateTime<Utc>>,
    pub loi_deadline: DateTime<Utc>,
    pub application_open_date: Option<DateTime<Utc>>,
    pub application_deadline: DateTime<Utc>,
    pub max_request_amount: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantCycle {
    pub id: CycleId,
    pub label: String,
    pub year: i32,
    pub loi_open_date: Option<DateTime<Utc>>,
    pub loi_deadline: DateTime<Utc>,
    pub application_open_date: Option<DateTime<Utc>>,
    pub application_deadline: DateTime<Utc>,
    pub max_request_amount: Option<u64>,
    pub is_active: bool,
    pub accepting_lois: bool,
    pub accepting_applications: bool,
    pub created_at: DateTime<Utc>,
}

impl GrantCycle {
    /// New cycles start inactive and closed to intake.
    pub fn new(schedule: CycleSchedule) -> Self {
        Self {
            id: CycleId::new(),
            label: schedule.label.trim().to_string(),
            year: schedule.year,
            loi_open_date: schedule.loi_open_date,
            loi_deadline: schedule.loi_deadline,
            application_open_date: schedule.application_open_date,
            application_deadline: schedule.application_deadline,
            max_request_amount: schedule.max_request_amount,
            is_active: false,
            accepting_lois: false,
            accepting_applications: false,
            created_at: Utc::now(),
        }
    }

    /// "Spring 2027" style display name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.label, self.year)
    }

    pub fn loi_deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now > self.loi_deadline
    }

    pub fn application_deadline_passed(&self, now: DateTime<Utc>) -> bool {
        now > self.application_deadline
    }

    pub fn same_period(&self, label: &str, year: i32) -> bool {
        self.year == year && self.label.eq_ignore_ascii_case(label.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn schedule() -> CycleSchedule {
        let now = Utc::now();
        CycleSchedule {
            label: " Spring ".to_string(),
            year: 2027,
            loi_open_date: None,
            loi_deadline: now + Duration::days(10),
            application_open_date: None,
            application_deadline: now + Duration::days(40),
            max_request_amount: Some(50_000),
        }
    }

    #[test]
    fn test_new_cycle_is_inactive_and_closed() {
        let cycle = GrantCycle::new(schedule());
        assert!(!cycle.is_active);
        assert!(!cycle.accepting_lois);
        assert!(!cycle.accepting_applications);
        assert_eq!(cycle.display_name(), "Spring 2027");
    }

    #[test]
    fn test_deadline_boundary_is_inclusive() {
        let cycle = GrantCycle::new(schedule());
        assert!(!cycle.loi_deadline_passed(cycle.loi_deadline));
        assert!(cycle.loi_deadline_passed(cycle.loi_deadline + Duration::seconds(1)));
    }

    #[test]
    fn test_same_period_ignores_case() {
        let cycle = GrantCycle::new(schedule());
        assert!(cycle.same_period("spring", 2027));
        assert!(!cycle.same_period("spring", 2028));
    }
}
