// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Audit Trail Recorder
//!
//! Appends one immutable [`StatusHistoryEntry`] per realized transition. The
//! entry is written through the caller's [`UnitOfWork`], so it commits or
//! rolls back together with the status change it describes. A failed append
//! is returned as an error and the caller abandons the unit.

use tracing::debug;

use crate::domain::actor::Actor;
use crate::domain::errors::WorkflowError;
use crate::domain::history::StatusHistoryEntry;
use crate::domain::repository::UnitOfWork;
use crate::domain::status::{EntityKind, RecordRef, RecordStatus};

pub struct AuditTrail;

impl AuditTrail {
    pub async fn record(
        uow: &mut dyn UnitOfWork,
        record: RecordRef,
        previous_status: RecordStatus,
        new_status: RecordStatus,
        actor: &Actor,
        reason: Option<String>,
    ) -> Result<StatusHistoryEntry, WorkflowError> {
        let entry = StatusHistoryEntry::new(record, previous_status, new_status, actor, reason);
        uow.append_history(&entry).await?;

        debug!(
            record = %record,
            from = %previous_status,
            to = %new_status,
            actor = %actor.id,
            "Status history entry staged"
        );
        metrics::counter!(
            "grantflow_transitions_total",
            "entity" => entity_label(record.kind()),
            "to" => new_status.as_str()
        )
        .increment(1);

        Ok(entry)
    }
}

fn entity_label(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::LetterOfInterest => "loi",
        EntityKind::Application => "application",
    }
}
