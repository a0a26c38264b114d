// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Actor
//!
//! The authenticated caller as supplied by the external identity provider:
//! a stable id, a display name, an optional contact email, the applicant
//! organization the caller belongs to (if any) and the staff membership grade
//! claim (if any). The workflow treats these claims as trusted input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::organization::OrganizationId;

/// Stable identity-provider subject for a caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Foundation staff membership grade claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffGrade {
    Member,
    Manager,
    Admin,
}

impl FromStr for StaffGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "member" | "reviewer" => Ok(Self::Member),
            "manager" => Ok(Self::Manager),
            "admin" | "administrator" => Ok(Self::Admin),
            other => Err(format!("Unknown staff grade: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub display_name: String,
    pub email: Option<String>,
    pub organization_id: Option<OrganizationId>,
    pub staff_grade: Option<StaffGrade>,
}

impl Actor {
    /// An applicant acting on behalf of their organization.
    pub fn applicant(
        id: impl Into<String>,
        display_name: impl Into<String>,
        organization_id: OrganizationId,
    ) -> Self {
        Self {
            id: ActorId::new(id),
            display_name: display_name.into(),
            email: None,
            organization_id: Some(organization_id),
            staff_grade: None,
        }
    }

    /// A foundation staff member with the given membership grade.
    pub fn staff(
        id: impl Into<String>,
        display_name: impl Into<String>,
        grade: StaffGrade,
    ) -> Self {
        Self {
            id: ActorId::new(id),
            display_name: display_name.into(),
            email: None,
            organization_id: None,
            staff_grade: Some(grade),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// An actor without a stable subject cannot be attributed in the audit trail.
    pub fn is_identified(&self) -> bool {
        !self.id.0.trim().is_empty()
    }

    /// Name recorded on history rows; falls back to the subject id.
    pub fn audit_name(&self) -> String {
        if self.display_name.trim().is_empty() {
            self.id.0.clone()
        } else {
            self.display_name.clone()
        }
    }
}
