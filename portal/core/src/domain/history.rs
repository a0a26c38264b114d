// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Status History
//!
//! Append-only audit rows, one per realized transition. Rows are never
//! mutated; canonical read order is newest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::actor::{Actor, ActorId};
use crate::domain::status::{RecordRef, RecordStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryEntryId(pub Uuid);

impl HistoryEntryId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for HistoryEntryId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusHistoryEntry {
    pub id: HistoryEntryId,
    pub record: RecordRef,
    pub previous_status: RecordStatus,
    pub new_status: RecordStatus,
    pub actor_id: ActorId,
    pub actor_name: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StatusHistoryEntry {
    pub fn new(
        record: RecordRef,
        previous_status: RecordStatus,
        new_status: RecordStatus,
        actor: &Actor,
        reason: Option<String>,
    ) -> Self {
        Self {
            id: HistoryEntryId::new(),
            record,
            previous_status,
            new_status,
            actor_id: actor.id.clone(),
            actor_name: actor.audit_name(),
            reason,
            created_at: Utc::now(),
        }
    }
}

/// Sort newest first.
pub fn sort_newest_first(entries: &mut [StatusHistoryEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
