// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Communication
//!
//! Messages exchanged during the info-request sub-cycle of an Application.
//! An outbound message with `response_required` and no
//! `response_received_at` is the application's pending request; the
//! workflow never lets two of them exist at once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::actor::{Actor, ActorId};
use crate::domain::application::ApplicationId;
use crate::domain::errors::PreconditionViolation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommunicationId(pub Uuid);

impl CommunicationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for CommunicationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CommunicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationDirection {
    /// Foundation to applicant.
    Outbound,
    /// Applicant to foundation.
    Inbound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Communication {
    pub id: CommunicationId,
    pub application_id: ApplicationId,
    pub direction: CommunicationDirection,
    pub content: String,
    pub response_required: bool,
    pub response_content: Option<String>,
    pub response_deadline: Option<DateTime<Utc>>,
    pub response_received_at: Option<DateTime<Utc>>,
    pub sent_by: ActorId,
    pub sent_by_name: String,
    pub created_at: DateTime<Utc>,
}

impl Communication {
    pub fn info_request(
        application_id: ApplicationId,
        sender: &Actor,
        message: impl Into<String>,
        response_deadline: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: CommunicationId::new(),
            application_id,
            direction: CommunicationDirection::Outbound,
            content: message.into(),
            response_required: true,
            response_content: None,
            response_deadline,
            response_received_at: None,
            sent_by: sender.id.clone(),
            sent_by_name: sender.audit_name(),
            created_at: Utc::now(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.response_required && self.response_received_at.is_none()
    }

    pub fn record_response(
        &mut self,
        response: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), PreconditionViolation> {
        if !self.response_required {
            return Err(PreconditionViolation::CommunicationNotPending {
                communication_id: self.id.to_string(),
            });
        }
        if self.response_received_at.is_some() {
            return Err(PreconditionViolation::CommunicationAlreadyAnswered {
                communication_id: self.id.to_string(),
            });
        }
        self.response_content = Some(response.into());
        self.response_received_at = Some(at);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::StaffGrade;

    #[test]
    fn test_request_is_pending_until_answered() {
        let manager = Actor::staff("m-1", "Mia", StaffGrade::Manager);
        let mut request = Communication::info_request(
            ApplicationId::new(),
            &manager,
            "Please clarify budget",
            None,
        );
        assert!(request.is_pending());
        request.record_response("Updated budget attached", Utc::now()).unwrap();
        assert!(!request.is_pending());
        assert!(matches!(
            request.record_response("again", Utc::now()),
            Err(PreconditionViolation::CommunicationAlreadyAnswered { .. })
        ));
    }
}
