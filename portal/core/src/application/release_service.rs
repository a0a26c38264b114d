// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Decision Release Batcher
//!
//! Separates "decision recorded" from "decision visible to the applicant".
//!
//! Each LOI in a release is its own unit of work: the record is re-read,
//! checked to still be pending, marked released, given a history entry
//! (status unchanged, reason [`RELEASE_REASON`]) and committed. Only then is
//! the email attempted. A failed send never undoes the release and the record
//! is never retried, because it is no longer pending. One record failing to
//! commit does not affect the others in the same call.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::audit_trail::AuditTrail;
use crate::application::notification_dispatcher::NotificationDispatcher;
use crate::application::records::{require_identified, resolve_contact};
use crate::domain::actor::Actor;
use crate::domain::errors::WorkflowError;
use crate::domain::events::LoiEvent;
use crate::domain::loi::{LetterOfInterest, LoiId};
use crate::domain::notification::{NotificationIntent, NotificationKind};
use crate::domain::policy::{AccessPolicy, Role};
use crate::domain::repository::GrantStore;
use crate::domain::status::{RecordRef, RecordStatus};
use crate::infrastructure::event_bus::EventBus;

/// History reason written when a decision becomes visible to the applicant.
pub const RELEASE_REASON: &str = "Decision released";

/// Which decided LOIs to release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseSelection {
    AllPending,
    Only(Vec<LoiId>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedRelease {
    pub loi_id: LoiId,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRelease {
    pub loi_id: LoiId,
    pub error: String,
}

/// Per-id outcome of a release call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseReport {
    /// Released and the email was accepted by the sender.
    pub emailed: Vec<LoiId>,
    /// Released without an email: no contact resolved or the send failed.
    pub released_without_email: Vec<LoiId>,
    /// Not pending (already released, undecided or unknown).
    pub skipped: Vec<SkippedRelease>,
    /// The release itself could not be committed.
    pub failed: Vec<FailedRelease>,
}

impl ReleaseReport {
    pub fn released_count(&self) -> usize {
        self.emailed.len() + self.released_without_email.len()
    }
}

enum SingleRelease {
    Released {
        loi: LetterOfInterest,
        intent: Option<NotificationIntent>,
    },
    Skipped(String),
}

#[async_trait]
pub trait DecisionReleaseService: Send + Sync {
    async fn query_pending_releases(
        &self,
        actor: &Actor,
    ) -> Result<Vec<LetterOfInterest>, WorkflowError>;
    async fn release_decisions(
        &self,
        actor: &Actor,
        selection: ReleaseSelection,
    ) -> Result<ReleaseReport, WorkflowError>;
}

pub struct StandardDecisionReleaseService {
    store: Arc<dyn GrantStore>,
    policy: Arc<AccessPolicy>,
    dispatcher: Arc<NotificationDispatcher>,
    event_bus: EventBus,
}

impl StandardDecisionReleaseService {
    pub fn new(
        store: Arc<dyn GrantStore>,
        policy: Arc<AccessPolicy>,
        dispatcher: Arc<NotificationDispatcher>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            policy,
            dispatcher,
            event_bus,
        }
    }

    async fn release_one(
        &self,
        actor: &Actor,
        loi_id: LoiId,
    ) -> Result<SingleRelease, WorkflowError> {
        let mut uow = self.store.begin().await?;
        let Some(mut loi) = uow.find_loi(loi_id).await? else {
            return Ok(SingleRelease::Skipped("not found".to_string()));
        };
        if !loi.is_pending_release() {
            let reason = if loi.notification_sent {
                "already released".to_string()
            } else {
                format!("no decision to release (status {})", loi.status)
            };
            return Ok(SingleRelease::Skipped(reason));
        }

        let next_deadline = uow.find_cycle(loi.cycle_id).await?.map(|c| c.application_deadline);
        let contact = resolve_contact(
            uow.as_mut(),
            loi.contact_email(),
            loi.organization_id,
        )
        .await?;
        let intent = contact.map(|recipient| {
            let base = NotificationIntent::new(
                decision_kind(loi.status),
                recipient,
                RecordRef::LetterOfInterest(loi.id),
                loi.organization_id,
            );
            match loi.status {
                RecordStatus::Approved => base
                    .with_derived_application(loi.derived_application_id)
                    .with_next_deadline(next_deadline),
                _ => base.with_reason(loi.decision_reason.clone()),
            }
        });

        loi.mark_released(Utc::now());
        uow.save_loi(&loi).await?;
        AuditTrail::record(
            uow.as_mut(),
            RecordRef::LetterOfInterest(loi.id),
            loi.status,
            loi.status,
            actor,
            Some(RELEASE_REASON.to_string()),
        )
        .await?;
        uow.commit().await?;

        Ok(SingleRelease::Released { loi, intent })
    }
}

fn decision_kind(status: RecordStatus) -> NotificationKind {
    match status {
        RecordStatus::Approved => NotificationKind::Approved,
        _ => NotificationKind::Declined,
    }
}

fn record_release(outcome: &'static str) {
    metrics::counter!("grantflow_releases_total", "outcome" => outcome).increment(1);
}

#[async_trait]
impl DecisionReleaseService for StandardDecisionReleaseService {
    async fn query_pending_releases(
        &self,
        actor: &Actor,
    ) -> Result<Vec<LetterOfInterest>, WorkflowError> {
        require_identified(actor)?;
        self.policy.authorize(actor, None, Role::Admin, "queryPendingReleases")?;
        let mut uow = self.store.begin().await?;
        Ok(uow.list_pending_releases().await?)
    }

    async fn release_decisions(
        &self,
        actor: &Actor,
        selection: ReleaseSelection,
    ) -> Result<ReleaseReport, WorkflowError> {
        require_identified(actor)?;
        self.policy.authorize(actor, None, Role::Admin, "releaseDecisions")?;

        let ids = match selection {
            ReleaseSelection::AllPending => {
                let mut uow = self.store.begin().await?;
                let pending = uow.list_pending_releases().await?;
                pending.into_iter().map(|l| l.id).collect::<Vec<_>>()
            }
            ReleaseSelection::Only(ids) => ids,
        };

        let mut report = ReleaseReport::default();
        for loi_id in ids {
            match self.release_one(actor, loi_id).await {
                Ok(SingleRelease::Released { loi, intent }) => {
                    let emailed = match &intent {
                        Some(intent) => self.dispatcher.dispatch(intent).await,
                        None => {
                            warn!(
                                loi_id = %loi.id,
                                "No contact email resolvable; decision released without email"
                            );
                            false
                        }
                    };
                    if emailed {
                        record_release("emailed");
                        report.emailed.push(loi.id);
                    } else {
                        record_release("released_without_email");
                        report.released_without_email.push(loi.id);
                    }
                    self.event_bus.publish_loi_event(LoiEvent::DecisionReleased {
                        loi_id: loi.id,
                        emailed,
                        released_at: loi.notification_sent_at.unwrap_or_else(Utc::now),
                    });
                }
                Ok(SingleRelease::Skipped(reason)) => {
                    record_release("skipped");
                    report.skipped.push(SkippedRelease { loi_id, reason });
                }
                Err(e) => {
                    warn!(loi_id = %loi_id, error = %e, "Decision release failed");
                    record_release("failed");
                    report.failed.push(FailedRelease {
                        loi_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            actor = %actor.id,
            emailed = report.emailed.len(),
            released_without_email = report.released_without_email.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Decision release finished"
        );
        Ok(report)
    }
}
