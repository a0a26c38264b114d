// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # HTTP API
//!
//! JSON endpoints over [`GrantWorkflow`]. Every handler extracts the caller
//! from identity headers, parses path ids, and delegates. Errors render as
//! `{ "error", "message", "details" }` via [`ApiError`].

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::application::release_service::ReleaseSelection;
use crate::application::GrantWorkflow;
use crate::domain::application::{ApplicationId, ApplicationSummary};
use crate::domain::communication::CommunicationId;
use crate::domain::cycle::{CycleId, CycleSchedule};
use crate::domain::loi::{LoiContent, LoiId};
use crate::domain::organization::OrganizationId;
use crate::domain::review::{BudgetScores, VoteValue};
use crate::domain::status::Decision;
use crate::presentation::actor::RequestActor;
use crate::presentation::error::ApiError;

pub struct AppState {
    pub workflow: GrantWorkflow,
    pub start_time: Instant,
}

type ApiResult<T> = Result<T, ApiError>;

pub fn app(workflow: GrantWorkflow) -> Router {
    let state = Arc::new(AppState {
        workflow,
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health))
        // Organizations
        .route("/organizations", post(register_organization))
        .route("/organizations/{id}", get(get_organization).delete(delete_organization))
        // Cycles
        .route("/cycles", post(create_cycle).get(list_cycles))
        .route("/cycles/active", get(active_cycle))
        .route("/cycles/{id}", axum::routing::delete(delete_cycle))
        .route("/cycles/{id}/activate", post(activate_cycle))
        .route("/cycles/{id}/intake", put(set_cycle_intake))
        // Letters of Interest
        .route("/lois", post(create_loi))
        .route("/lois/{id}", get(get_loi).put(update_loi).delete(delete_loi))
        .route("/lois/{id}/submit", post(submit_loi))
        .route("/lois/{id}/review", post(begin_loi_review))
        .route("/lois/{id}/decision", post(decide_loi))
        .route("/lois/{id}/history", get(loi_history))
        // Applications
        .route("/applications", post(create_application))
        .route(
            "/applications/{id}",
            get(get_application).put(update_application).delete(delete_application),
        )
        .route("/applications/{id}/submit", post(submit_application))
        .route("/applications/{id}/review", post(begin_application_review))
        .route(
            "/applications/{id}/info-requests",
            post(request_application_info).get(pending_info_request),
        )
        .route(
            "/applications/{id}/info-requests/{communication_id}/response",
            post(respond_application_info),
        )
        .route("/applications/{id}/decision", post(decide_application))
        .route("/applications/{id}/votes", post(cast_vote).get(list_votes))
        .route(
            "/applications/{id}/budget-assessments",
            post(submit_budget_assessment).get(list_budget_assessments),
        )
        .route("/applications/{id}/history", get(application_history))
        // Decision release
        .route("/releases/pending", get(pending_releases))
        .route("/releases", post(release_decisions))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn parse_id<T>(raw: &str, what: &str, parse: fn(&str) -> Result<T, uuid::Error>) -> ApiResult<T> {
    parse(raw).map_err(|e| ApiError::BadRequest(format!("invalid {} id '{}': {}", what, raw, e)))
}

fn loi_id(raw: &str) -> ApiResult<LoiId> {
    parse_id(raw, "LOI", LoiId::from_string)
}

fn application_id(raw: &str) -> ApiResult<ApplicationId> {
    parse_id(raw, "application", ApplicationId::from_string)
}

fn cycle_id(raw: &str) -> ApiResult<CycleId> {
    parse_id(raw, "cycle", CycleId::from_string)
}

fn organization_id(raw: &str) -> ApiResult<OrganizationId> {
    parse_id(raw, "organization", OrganizationId::from_string)
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": state.start_time.elapsed().as_secs(),
        "event_subscribers": state.workflow.event_bus().subscriber_count(),
    }))
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterOrganizationRequest {
    pub name: String,
    #[serde(default)]
    pub member_emails: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CycleIntakeRequest {
    pub accepting_lois: bool,
    pub accepting_applications: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateLoiRequest {
    pub cycle_id: CycleId,
    #[serde(flatten)]
    pub content: LoiContent,
}

#[derive(Debug, Deserialize)]
pub struct LoiDecisionRequest {
    pub decision: Decision,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub cycle_id: CycleId,
    #[serde(flatten)]
    pub summary: ApplicationSummary,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct UpdateApplicationRequest {
    #[serde(flatten)]
    pub summary: ApplicationSummary,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct InfoRequestBody {
    pub message: String,
    pub response_deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct InfoResponseBody {
    pub response: String,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationDecisionRequest {
    pub decision: Decision,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub value: VoteValue,
    pub reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BudgetAssessmentRequest {
    #[serde(flatten)]
    pub scores: BudgetScores,
    pub notes: Option<String>,
}

/// Exactly one selector: a non-empty `loi_ids` list or `release_all: true`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseRequest {
    #[serde(default)]
    pub loi_ids: Option<Vec<LoiId>>,
    #[serde(default)]
    pub release_all: bool,
}

impl ReleaseRequest {
    pub fn into_selection(self) -> Result<ReleaseSelection, ApiError> {
        match (self.loi_ids, self.release_all) {
            (Some(ids), false) if !ids.is_empty() => Ok(ReleaseSelection::Only(ids)),
            (None, true) => Ok(ReleaseSelection::AllPending),
            _ => Err(ApiError::BadRequest(
                "release requires either a non-empty loi_ids list or release_all: true".to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Organizations and cycles
// ---------------------------------------------------------------------------

async fn register_organization(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Json(body): Json<RegisterOrganizationRequest>,
) -> ApiResult<impl IntoResponse> {
    let organization = state
        .workflow
        .register_organization(&actor, body.name, body.member_emails)
        .await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

async fn get_organization(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.get_organization(&actor, organization_id(&id)?).await?))
}

async fn delete_organization(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.delete_organization(&actor, organization_id(&id)?).await?))
}

async fn create_cycle(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Json(schedule): Json<CycleSchedule>,
) -> ApiResult<impl IntoResponse> {
    let cycle = state.workflow.create_cycle(&actor, schedule).await?;
    Ok((StatusCode::CREATED, Json(cycle)))
}

async fn list_cycles(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.list_cycles(&actor).await?))
}

async fn active_cycle(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.active_cycle(&actor).await?))
}

async fn activate_cycle(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.activate_cycle(&actor, cycle_id(&id)?).await?))
}

async fn set_cycle_intake(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    Json(body): Json<CycleIntakeRequest>,
) -> ApiResult<impl IntoResponse> {
    let cycle = state
        .workflow
        .set_cycle_intake(&actor, cycle_id(&id)?, body.accepting_lois, body.accepting_applications)
        .await?;
    Ok(Json(cycle))
}

async fn delete_cycle(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.workflow.delete_cycle(&actor, cycle_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Letters of Interest
// ---------------------------------------------------------------------------

async fn create_loi(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Json(body): Json<CreateLoiRequest>,
) -> ApiResult<impl IntoResponse> {
    let loi = state
        .workflow
        .create_loi_draft(&actor, body.cycle_id, body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(loi)))
}

async fn get_loi(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.get_loi(&actor, loi_id(&id)?).await?))
}

async fn update_loi(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    Json(content): Json<LoiContent>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.update_loi_draft(&actor, loi_id(&id)?, content).await?))
}

async fn delete_loi(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.delete_loi_draft(&actor, loi_id(&id)?).await?))
}

async fn submit_loi(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.submit_loi(&actor, loi_id(&id)?).await?))
}

async fn begin_loi_review(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.begin_loi_review(&actor, loi_id(&id)?).await?))
}

async fn decide_loi(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    Json(body): Json<LoiDecisionRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state
        .workflow
        .decide_loi(&actor, loi_id(&id)?, body.decision, body.reason, body.notes)
        .await?;
    Ok(Json(outcome))
}

async fn loi_history(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.loi_history(&actor, loi_id(&id)?).await?))
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

async fn create_application(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Json(body): Json<CreateApplicationRequest>,
) -> ApiResult<impl IntoResponse> {
    let application = state
        .workflow
        .create_application_draft(&actor, body.cycle_id, body.summary, body.payload)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

async fn get_application(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.get_application(&actor, application_id(&id)?).await?))
}

async fn update_application(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    Json(body): Json<UpdateApplicationRequest>,
) -> ApiResult<impl IntoResponse> {
    let application = state
        .workflow
        .update_application_draft(&actor, application_id(&id)?, body.summary, body.payload)
        .await?;
    Ok(Json(application))
}

async fn delete_application(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.delete_application_draft(&actor, application_id(&id)?).await?))
}

async fn submit_application(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.submit_application(&actor, application_id(&id)?).await?))
}

async fn begin_application_review(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.begin_application_review(&actor, application_id(&id)?).await?))
}

async fn request_application_info(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    Json(body): Json<InfoRequestBody>,
) -> ApiResult<impl IntoResponse> {
    let communication = state
        .workflow
        .request_application_info(
            &actor,
            application_id(&id)?,
            body.message,
            body.response_deadline,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(communication)))
}

async fn pending_info_request(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.pending_info_request(&actor, application_id(&id)?).await?))
}

async fn respond_application_info(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path((id, communication_id)): Path<(String, String)>,
    Json(body): Json<InfoResponseBody>,
) -> ApiResult<impl IntoResponse> {
    let communication_id = parse_id(
        &communication_id,
        "communication",
        CommunicationId::from_string,
    )?;
    let communication = state
        .workflow
        .respond_application_info(&actor, application_id(&id)?, communication_id, body.response)
        .await?;
    Ok(Json(communication))
}

async fn decide_application(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    Json(body): Json<ApplicationDecisionRequest>,
) -> ApiResult<impl IntoResponse> {
    let application = state
        .workflow
        .decide_application(&actor, application_id(&id)?, body.decision, body.reason)
        .await?;
    Ok(Json(application))
}

async fn cast_vote(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    Json(body): Json<VoteRequest>,
) -> ApiResult<impl IntoResponse> {
    let vote = state
        .workflow
        .cast_vote(&actor, application_id(&id)?, body.value, body.reasoning)
        .await?;
    Ok(Json(vote))
}

async fn list_votes(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.list_votes(&actor, application_id(&id)?).await?))
}

async fn submit_budget_assessment(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
    Json(body): Json<BudgetAssessmentRequest>,
) -> ApiResult<impl IntoResponse> {
    let assessment = state
        .workflow
        .submit_budget_assessment(&actor, application_id(&id)?, body.scores, body.notes)
        .await?;
    Ok(Json(assessment))
}

async fn list_budget_assessments(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.list_budget_assessments(&actor, application_id(&id)?).await?))
}

async fn application_history(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.application_history(&actor, application_id(&id)?).await?))
}

// ---------------------------------------------------------------------------
// Decision release
// ---------------------------------------------------------------------------

async fn pending_releases(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.workflow.query_pending_releases(&actor).await?))
}

async fn release_decisions(
    State(state): State<Arc<AppState>>,
    RequestActor(actor): RequestActor,
    body: Result<Json<ReleaseRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let selection = body.into_selection()?;
    Ok(Json(state.workflow.release_decisions(&actor, selection).await?))
}
