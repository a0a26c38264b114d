// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub(crate) mod records;

pub mod audit_trail;
pub mod notification_dispatcher;
pub mod delete_closure;

pub mod loi_service;
pub mod application_service;
pub mod review_service;
pub mod release_service;
pub mod draft_service;
pub mod cycle_service;
pub mod organization_service;
pub mod store_factory;
pub mod workflow;

// Re-export use cases for convenience
pub use loi_service::{LoiDecisionOutcome, LoiReviewService, StandardLoiReviewService};
pub use application_service::{ApplicationReviewService, StandardApplicationReviewService};
pub use review_service::{ReviewInputService, StandardReviewInputService};
pub use release_service::{
    DecisionReleaseService, ReleaseReport, ReleaseSelection, StandardDecisionReleaseService,
    RELEASE_REASON,
};
pub use draft_service::{DraftLifecycleService, StandardDraftLifecycleService};
pub use cycle_service::{CycleAdministrationService, StandardCycleAdministrationService};
pub use organization_service::{OrganizationService, StandardOrganizationService};
pub use workflow::GrantWorkflow;
