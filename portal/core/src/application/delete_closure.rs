// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Delete Closure
//!
//! The single place that knows which rows hang off an LOI, an Application or
//! an Organization. [`DeleteClosure::plan`] enumerates the closure once;
//! [`DeleteClosure::execute`] removes it through the caller's unit of work in
//! dependency order (review inputs and communications, then history, then
//! the records themselves, then the organization).
//!
//! Status history is append-only for records that exist. It is only purged
//! here, together with the record it describes.

use serde::{Deserialize, Serialize};

use crate::domain::application::ApplicationId;
use crate::domain::errors::WorkflowError;
use crate::domain::loi::LoiId;
use crate::domain::organization::OrganizationId;
use crate::domain::repository::UnitOfWork;
use crate::domain::status::RecordRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionRoot {
    Loi(LoiId),
    Application(ApplicationId),
    Organization(OrganizationId),
}

/// Every record the deletion will remove.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeletionPlan {
    pub lois: Vec<LoiId>,
    pub applications: Vec<ApplicationId>,
    pub organization: Option<OrganizationId>,
}

impl DeletionPlan {
    pub fn records(&self) -> Vec<RecordRef> {
        self.applications
            .iter()
            .map(|id| RecordRef::Application(*id))
            .chain(self.lois.iter().map(|id| RecordRef::LetterOfInterest(*id)))
            .collect()
    }
}

/// Row counts removed by [`DeleteClosure::execute`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionSummary {
    pub records: Vec<RecordRef>,
    pub history_entries: u64,
    pub communications: u64,
    pub votes: u64,
    pub budget_assessments: u64,
    pub organization_removed: bool,
}

pub struct DeleteClosure;

impl DeleteClosure {
    pub async fn plan(
        uow: &mut dyn UnitOfWork,
        root: DeletionRoot,
    ) -> Result<DeletionPlan, WorkflowError> {
        let mut plan = DeletionPlan::default();
        match root {
            DeletionRoot::Loi(loi_id) => {
                plan.lois.push(loi_id);
                for application in uow.find_applications_by_loi(loi_id).await? {
                    plan.applications.push(application.id);
                }
            }
            DeletionRoot::Application(application_id) => {
                plan.applications.push(application_id);
            }
            DeletionRoot::Organization(organization_id) => {
                for loi in uow.list_lois_by_organization(organization_id).await? {
                    plan.lois.push(loi.id);
                }
                for application in uow.list_applications_by_organization(organization_id).await? {
                    plan.applications.push(application.id);
                }
                plan.organization = Some(organization_id);
            }
        }
        Ok(plan)
    }

    pub async fn execute(
        uow: &mut dyn UnitOfWork,
        plan: &DeletionPlan,
    ) -> Result<DeletionSummary, WorkflowError> {
        let mut summary = DeletionSummary {
            records: plan.records(),
            ..DeletionSummary::default()
        };

        for application_id in &plan.applications {
            summary.votes += uow.delete_votes(*application_id).await?;
            summary.budget_assessments += uow.delete_budget_assessments(*application_id).await?;
            summary.communications += uow.delete_communications(*application_id).await?;
            summary.history_entries +=
                uow.purge_history(RecordRef::Application(*application_id)).await?;
            uow.delete_application(*application_id).await?;
        }

        for loi_id in &plan.lois {
            summary.history_entries +=
                uow.purge_history(RecordRef::LetterOfInterest(*loi_id)).await?;
            uow.delete_loi(*loi_id).await?;
        }

        if let Some(organization_id) = plan.organization {
            uow.delete_organization(organization_id).await?;
            summary.organization_removed = true;
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::{Actor, StaffGrade};
    use crate::domain::application::{Application, ApplicationSummary};
    use crate::domain::communication::Communication;
    use crate::domain::cycle::CycleId;
    use crate::domain::history::StatusHistoryEntry;
    use crate::domain::loi::{LetterOfInterest, LoiContent};
    use crate::domain::organization::Organization;
    use crate::domain::repository::GrantStore;
    use crate::domain::review::{Vote, VoteValue};
    use crate::domain::status::RecordStatus;
    use crate::infrastructure::repositories::InMemoryGrantStore;

    #[tokio::test]
    async fn test_organization_closure_removes_every_dependent() {
        let store = InMemoryGrantStore::new();
        let organization = Organization::new(
            "Riverbank Trust",
            vec!["ops@riverbank.org".to_string()],
        );
        let cycle = CycleId::new();
        let staff = Actor::staff("m-1", "Mia", StaffGrade::Manager);

        let loi = LetterOfInterest::new_draft(organization.id, cycle, LoiContent::default());
        let application = Application::derived_from(&loi);
        let other_org_app = Application::new_draft(
            crate::domain::organization::OrganizationId::new(),
            cycle,
            ApplicationSummary::default(),
            serde_json::json!({}),
        );

        let mut uow = store.begin().await.unwrap();
        uow.save_organization(&organization).await.unwrap();
        uow.save_loi(&loi).await.unwrap();
        uow.save_application(&application).await.unwrap();
        uow.save_application(&other_org_app).await.unwrap();
        uow.append_history(&StatusHistoryEntry::new(
            RecordRef::Application(application.id),
            RecordStatus::Draft,
            RecordStatus::Submitted,
            &staff,
            None,
        ))
        .await
        .unwrap();
        uow.save_communication(
            &Communication::info_request(application.id, &staff, "Budget?", None),
        )
            .await
            .unwrap();
        uow.save_vote(&Vote::upsert(None, application.id, &staff, VoteValue::Approve, None))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        let mut uow = store.begin().await.unwrap();
        let plan = DeleteClosure::plan(uow.as_mut(), DeletionRoot::Organization(organization.id))
            .await
            .unwrap();
        assert_eq!(plan.lois, vec![loi.id]);
        assert_eq!(plan.applications, vec![application.id]);

        let summary = DeleteClosure::execute(uow.as_mut(), &plan).await.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(summary.history_entries, 1);
        assert_eq!(summary.communications, 1);
        assert_eq!(summary.votes, 1);
        assert!(summary.organization_removed);

        let mut uow = store.begin().await.unwrap();
        assert!(uow.find_loi(loi.id).await.unwrap().is_none());
        assert!(uow.find_application(application.id).await.unwrap().is_none());
        assert!(uow.find_organization(organization.id).await.unwrap().is_none());
        assert!(uow.find_application(other_org_app.id).await.unwrap().is_some());
        assert!(uow.list_votes(application.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_application_closure_is_just_the_application() {
        let store = InMemoryGrantStore::new();
        let application_id = ApplicationId::new();
        let mut uow = store.begin().await.unwrap();
        let plan = DeleteClosure::plan(uow.as_mut(), DeletionRoot::Application(application_id))
            .await
            .unwrap();
        assert_eq!(plan.records(), vec![RecordRef::Application(application_id)]);
        assert!(plan.lois.is_empty());
    }
}
