// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Notification Dispatcher
//!
//! Hands notification intents to the configured [`NotificationSender`] after
//! the unit of work that produced them has committed. Delivery is always best
//! effort: failures are logged and counted, and the caller only learns
//! whether the send succeeded.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::notification::{NotificationIntent, NotificationKind, NotificationSender};
use crate::domain::organization::OrganizationId;
use crate::domain::status::RecordRef;

pub struct NotificationDispatcher {
    sender: Arc<dyn NotificationSender>,
    staff_email: Option<String>,
}

impl NotificationDispatcher {
    pub fn new(sender: Arc<dyn NotificationSender>, staff_email: Option<String>) -> Self {
        Self {
            sender,
            staff_email: staff_email.filter(|e| !e.trim().is_empty()),
        }
    }

    /// Returns true when the sender accepted the intent.
    pub async fn dispatch(&self, intent: &NotificationIntent) -> bool {
        match self.sender.send(intent).await {
            Ok(()) => {
                info!(
                    kind = intent.kind.as_str(),
                    record = %intent.record,
                    recipient = %intent.recipient,
                    "Notification sent"
                );
                record_outcome(intent.kind, "sent");
                true
            }
            Err(e) => {
                warn!(
                    kind = intent.kind.as_str(),
                    record = %intent.record,
                    error = %e,
                    "Notification delivery failed"
                );
                record_outcome(intent.kind, "failed");
                false
            }
        }
    }

    /// "Submitted" notice to the foundation staff inbox, when one is configured.
    pub async fn notify_staff_submitted(
        &self,
        record: RecordRef,
        organization_id: OrganizationId,
    ) -> bool {
        let Some(staff_email) = self.staff_email.as_deref() else {
            record_outcome(NotificationKind::Submitted, "skipped");
            return false;
        };
        let intent = NotificationIntent::new(
            NotificationKind::Submitted,
            staff_email,
            record,
            organization_id,
        );
        self.dispatch(&intent).await
    }

    /// Dispatch when a recipient was resolved; otherwise count it as skipped.
    pub async fn dispatch_if_addressed(
        &self,
        intent: Option<NotificationIntent>,
        kind: NotificationKind,
    ) -> bool {
        match intent {
            Some(intent) => self.dispatch(&intent).await,
            None => {
                record_outcome(kind, "skipped");
                false
            }
        }
    }
}

fn record_outcome(kind: NotificationKind, outcome: &'static str) {
    metrics::counter!(
        "grantflow_notifications_total",
        "kind" => kind.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}
