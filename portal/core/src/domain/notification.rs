// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Notification Dispatch Boundary
//!
//! The workflow emits structured notification intents; delivery belongs to an
//! external sender. The workflow only ever looks at success or failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::application::ApplicationId;
use crate::domain::organization::OrganizationId;
use crate::domain::status::{RecordRef, RecordStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Submitted,
    UnderReview,
    InfoRequested,
    Approved,
    Declined,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::InfoRequested => "info_requested",
            Self::Approved => "approved",
            Self::Declined => "declined",
        }
    }

    /// Applicant-facing kind for a new application status, if that status
    /// is one applicants are told about.
    pub fn for_status(status: RecordStatus) -> Option<Self> {
        match status {
            RecordStatus::UnderReview => Some(Self::UnderReview),
            RecordStatus::InfoRequested => Some(Self::InfoRequested),
            RecordStatus::Approved => Some(Self::Approved),
            RecordStatus::Declined => Some(Self::Declined),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationIntent {
    pub kind: NotificationKind,
    pub recipient: String,
    pub record: RecordRef,
    pub organization_id: OrganizationId,
    /// Set on LOI approvals: the Application the applicant should continue in.
    pub derived_application_id: Option<ApplicationId>,
    pub next_deadline: Option<DateTime<Utc>>,
    pub reason: Option<String>,
    pub message: Option<String>,
}

impl NotificationIntent {
    pub fn new(
        kind: NotificationKind,
        recipient: impl Into<String>,
        record: RecordRef,
        organization_id: OrganizationId,
    ) -> Self {
        Self {
            kind,
            recipient: recipient.into(),
            record,
            organization_id,
            derived_application_id: None,
            next_deadline: None,
            reason: None,
            message: None,
        }
    }

    pub fn with_derived_application(mut self, id: Option<ApplicationId>) -> Self {
        self.derived_application_id = id;
        self
    }

    pub fn with_next_deadline(mut self, deadline: Option<DateTime<Utc>>) -> Self {
        self.next_deadline = deadline;
        self
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notification provider rejected the message: {0}")]
    Rejected(String),

    #[error("Notification provider unavailable: {0}")]
    Unavailable(String),
}

/// External delivery capability.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, intent: &NotificationIntent) -> Result<(), NotificationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_for_status() {
        assert_eq!(
            NotificationKind::for_status(RecordStatus::Approved),
            Some(NotificationKind::Approved)
        );
        assert_eq!(
            NotificationKind::for_status(RecordStatus::InfoRequested),
            Some(NotificationKind::InfoRequested)
        );
        assert_eq!(NotificationKind::for_status(RecordStatus::Submitted), None);
        assert_eq!(NotificationKind::for_status(RecordStatus::Draft), None);
    }
}
