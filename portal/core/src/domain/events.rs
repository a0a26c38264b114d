// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::actor::ActorId;
use crate::domain::application::ApplicationId;
use crate::domain::communication::CommunicationId;
use crate::domain::cycle::CycleId;
use crate::domain::loi::LoiId;
use crate::domain::organization::OrganizationId;
use crate::domain::status::{RecordRef, RecordStatus};

/// Letter of Interest lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LoiEvent {
    LoiDraftCreated {
        loi_id: LoiId,
        organization_id: OrganizationId,
        cycle_id: CycleId,
        created_at: DateTime<Utc>,
    },
    LoiSubmitted {
        loi_id: LoiId,
        submitted_by: ActorId,
        submitted_at: DateTime<Utc>,
    },
    LoiReviewStarted {
        loi_id: LoiId,
        reviewer: ActorId,
        started_at: DateTime<Utc>,
    },
    LoiDecided {
        loi_id: LoiId,
        decision: RecordStatus,
        derived_application_id: Option<ApplicationId>,
        decided_by: ActorId,
        decided_at: DateTime<Utc>,
    },
    DecisionReleased {
        loi_id: LoiId,
        emailed: bool,
        released_at: DateTime<Utc>,
    },
}

/// Application lifecycle and review-input events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ApplicationEvent {
    ApplicationDraftCreated {
        application_id: ApplicationId,
        organization_id: OrganizationId,
        loi_id: Option<LoiId>,
        created_at: DateTime<Utc>,
    },
    ApplicationStatusChanged {
        application_id: ApplicationId,
        previous_status: RecordStatus,
        new_status: RecordStatus,
        changed_by: ActorId,
        changed_at: DateTime<Utc>,
    },
    InfoRequested {
        application_id: ApplicationId,
        communication_id: CommunicationId,
        requested_at: DateTime<Utc>,
    },
    InfoProvided {
        application_id: ApplicationId,
        communication_id: CommunicationId,
        provided_at: DateTime<Utc>,
    },
    VoteCast {
        application_id: ApplicationId,
        reviewer: ActorId,
        cast_at: DateTime<Utc>,
    },
    BudgetAssessed {
        application_id: ApplicationId,
        reviewer: ActorId,
        composite_score: Option<f64>,
        assessed_at: DateTime<Utc>,
    },
}

/// Administrative events: cycles, organizations and record removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AdministrationEvent {
    CycleCreated {
        cycle_id: CycleId,
        created_at: DateTime<Utc>,
    },
    CycleActivated {
        cycle_id: CycleId,
        deactivated: Vec<CycleId>,
        activated_at: DateTime<Utc>,
    },
    CycleDeleted {
        cycle_id: CycleId,
        deleted_at: DateTime<Utc>,
    },
    OrganizationRegistered {
        organization_id: OrganizationId,
        registered_at: DateTime<Utc>,
    },
    RecordsDeleted {
        records: Vec<RecordRef>,
        deleted_by: ActorId,
        deleted_at: DateTime<Utc>,
    },
}
