// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Access Policy Evaluator
//!
//! Resolves the effective [`Role`] of an [`Actor`] for a given record through
//! an ordered chain of [`AccessRule`]s:
//!
//! 1. [`MembershipClaimRule`] – organization ownership and staff grade claims
//!    from the identity provider.
//! 2. [`AdminOverrideRule`] – an explicit, configured allow-list of
//!    administrator emails. The bypass lives here and nowhere else.
//!
//! The highest role granted by any rule wins. Evaluation has no side effects.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::domain::actor::{Actor, StaffGrade};
use crate::domain::errors::WorkflowError;
use crate::domain::organization::OrganizationId;

/// Effective role of a caller for one record. Variants are ordered by privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    None,
    ApplicantOwner,
    Member,
    Manager,
    Admin,
}

impl Role {
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Member | Self::Manager | Self::Admin)
    }

    /// Applicant-owner requirements are satisfied only by the owner; staff
    /// requirements are satisfied by that grade or above.
    pub fn satisfies(&self, required: Role) -> bool {
        match required {
            Role::None => true,
            Role::ApplicantOwner => *self == Role::ApplicantOwner,
            staff => self.is_staff() && *self >= staff,
        }
    }
}

impl From<StaffGrade> for Role {
    fn from(grade: StaffGrade) -> Self {
        match grade {
            StaffGrade::Member => Role::Member,
            StaffGrade::Manager => Role::Manager,
            StaffGrade::Admin => Role::Admin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::ApplicantOwner => "applicant-owner",
            Self::Member => "member",
            Self::Manager => "manager",
            Self::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// One link of the access-policy chain.
pub trait AccessRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Role this rule grants, or `None` when the rule has no opinion.
    /// `owner` is `None` for system-wide actions (cycles, releases).
    fn evaluate(&self, actor: &Actor, owner: Option<OrganizationId>) -> Option<Role>;
}

/// Grants applicant-owner on matching organizations and maps staff grades.
#[derive(Debug, Default)]
pub struct MembershipClaimRule;

impl AccessRule for MembershipClaimRule {
    fn name(&self) -> &'static str {
        "membership-claim"
    }

    fn evaluate(&self, actor: &Actor, owner: Option<OrganizationId>) -> Option<Role> {
        if let Some(grade) = actor.staff_grade {
            return Some(grade.into());
        }
        match (actor.organization_id, owner) {
            (Some(actor_org), Some(owner_org)) if actor_org == owner_org => {
                Some(Role::ApplicantOwner)
            }
            _ => None,
        }
    }
}

/// Elevates configured email addresses to admin.
#[derive(Debug, Default)]
pub struct AdminOverrideRule {
    emails: HashSet<String>,
}

impl AdminOverrideRule {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails
                .into_iter()
                .map(|e| e.as_ref().trim().to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl AccessRule for AdminOverrideRule {
    fn name(&self) -> &'static str {
        "admin-override"
    }

    fn evaluate(&self, actor: &Actor, _owner: Option<OrganizationId>) -> Option<Role> {
        let email = actor.email.as_deref()?.trim().to_ascii_lowercase();
        self.emails.contains(&email).then_some(Role::Admin)
    }
}

pub struct AccessPolicy {
    rules: Vec<Box<dyn AccessRule>>,
}

impl AccessPolicy {
    pub fn new(rules: Vec<Box<dyn AccessRule>>) -> Self {
        Self { rules }
    }

    /// Claim rule first, then the admin override allow-list.
    pub fn standard<I, S>(admin_overrides: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(vec![
            Box::new(MembershipClaimRule),
            Box::new(AdminOverrideRule::new(admin_overrides)),
        ])
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn resolve_role(&self, actor: &Actor, owner: Option<OrganizationId>) -> Role {
        let mut role = Role::None;
        for rule in &self.rules {
            if let Some(granted) = rule.evaluate(actor, owner) {
                if granted > role {
                    debug!(
                        actor = %actor.id,
                        rule = rule.name(),
                        role = %granted,
                        "Access rule granted role"
                    );
                    role = granted;
                }
            }
        }
        role
    }

    /// Resolve the caller's role and require it to satisfy `required`.
    pub fn authorize(
        &self,
        actor: &Actor,
        owner: Option<OrganizationId>,
        required: Role,
        action: &'static str,
    ) -> Result<Role, WorkflowError> {
        if !actor.is_identified() {
            return Err(WorkflowError::Unauthorized);
        }
        let actual = self.resolve_role(actor, owner);
        if actual.satisfies(required) {
            Ok(actual)
        } else {
            Err(WorkflowError::Forbidden {
                action,
                required,
                actual,
            })
        }
    }

    /// Reads are open to the owning organization and to any staff grade.
    pub fn authorize_read(
        &self,
        actor: &Actor,
        owner: OrganizationId,
        action: &'static str,
    ) -> Result<Role, WorkflowError> {
        if !actor.is_identified() {
            return Err(WorkflowError::Unauthorized);
        }
        let actual = self.resolve_role(actor, Some(owner));
        if actual == Role::ApplicantOwner || actual.is_staff() {
            Ok(actual)
        } else {
            Err(WorkflowError::Forbidden {
                action,
                required: Role::ApplicantOwner,
                actual,
            })
        }
    }
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::standard(Vec::<String>::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_gets_applicant_role_only_on_own_records() {
        let policy = AccessPolicy::default();
        let org = OrganizationId::new();
        let actor = Actor::applicant("u-1", "Ada", org);
        assert_eq!(policy.resolve_role(&actor, Some(org)), Role::ApplicantOwner);
        assert_eq!(policy.resolve_role(&actor, Some(OrganizationId::new())), Role::None);
        assert_eq!(policy.resolve_role(&actor, None), Role::None);
    }

    #[test]
    fn test_staff_grade_maps_to_role() {
        let policy = AccessPolicy::default();
        let manager = Actor::staff("s-1", "Mo", StaffGrade::Manager);
        assert_eq!(policy.resolve_role(&manager, Some(OrganizationId::new())), Role::Manager);
    }

    #[test]
    fn test_override_rule_elevates_listed_email() {
        let policy = AccessPolicy::standard(["Director@Foundation.org"]);
        let member =
            Actor::staff("s-2", "Di", StaffGrade::Member).with_email("director@foundation.org");
        assert_eq!(policy.resolve_role(&member, None), Role::Admin);
        assert_eq!(policy.rule_names(), vec!["membership-claim", "admin-override"]);
    }

    #[test]
    fn test_satisfies_semantics() {
        assert!(Role::Admin.satisfies(Role::Manager));
        assert!(!Role::Member.satisfies(Role::Manager));
        assert!(!Role::Admin.satisfies(Role::ApplicantOwner));
        assert!(Role::ApplicantOwner.satisfies(Role::ApplicantOwner));
        assert!(!Role::ApplicantOwner.satisfies(Role::Member));
    }

    #[test]
    fn test_authorize_errors() {
        let policy = AccessPolicy::default();
        let org = OrganizationId::new();
        let anonymous = Actor::applicant("", "", org);
        assert!(matches!(
            policy.authorize(&anonymous, Some(org), Role::ApplicantOwner, "submit_loi"),
            Err(WorkflowError::Unauthorized)
        ));

        let member = Actor::staff("s-3", "Lu", StaffGrade::Member);
        match policy.authorize(&member, Some(org), Role::Admin, "decide_application") {
            Err(WorkflowError::Forbidden { required, actual, .. }) => {
                assert_eq!(required, Role::Admin);
                assert_eq!(actual, Role::Member);
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn test_authorize_read_allows_owner_and_staff() {
        let policy = AccessPolicy::default();
        let org = OrganizationId::new();
        assert!(policy.authorize_read(&Actor::applicant("u", "U", org), org, "history").is_ok());
        assert!(policy
            .authorize_read(&Actor::staff("s", "S", StaffGrade::Member), org, "history")
            .is_ok());
        assert!(policy
            .authorize_read(&Actor::applicant("x", "X", OrganizationId::new()), org, "history")
            .is_err());
    }
}
