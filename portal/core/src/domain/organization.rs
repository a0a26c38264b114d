// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Organization
//!
//! Applicant organizations own LOIs and Applications. The workflow only needs
//! their identity and their ordered member contact list, which the release
//! batcher falls back to when an LOI carries no explicit contact email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrganizationId(pub Uuid);

impl OrganizationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for OrganizationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    /// Member user emails in registration order.
    pub member_emails: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: impl Into<String>, member_emails: Vec<String>) -> Self {
        Self {
            id: OrganizationId::new(),
            name: name.into(),
            member_emails,
            created_at: Utc::now(),
        }
    }

    /// Email of the first registered member, if any.
    pub fn primary_contact(&self) -> Option<&str> {
        self.member_emails
            .iter()
            .map(|email| email.trim())
            .find(|email| !email.is_empty())
    }
}
