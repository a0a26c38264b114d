// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Caller identity extraction.
//!
//! The identity-provider proxy in front of the portal authenticates the user
//! and forwards its claims as headers. They are trusted as-is. A request
//! without `x-actor-id` yields an anonymous actor, which every workflow
//! action rejects as unauthorized.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::domain::actor::{Actor, ActorId, StaffGrade};
use crate::domain::organization::OrganizationId;
use crate::presentation::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";
pub const ACTOR_ORGANIZATION_HEADER: &str = "x-actor-organization";
pub const ACTOR_GRADE_HEADER: &str = "x-actor-grade";

/// Extractor wrapping the [`Actor`] built from identity headers.
#[derive(Debug, Clone)]
pub struct RequestActor(pub Actor);

impl<S> FromRequestParts<S> for RequestActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        actor_from_headers(&parts.headers).map(RequestActor)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let organization_id = header(headers, ACTOR_ORGANIZATION_HEADER)
        .map(|raw| {
            OrganizationId::from_string(raw)
                .map_err(|e| ApiError::BadRequest(format!("{}: {}", ACTOR_ORGANIZATION_HEADER, e)))
        })
        .transpose()?;

    let staff_grade = header(headers, ACTOR_GRADE_HEADER)
        .map(|raw| raw.parse::<StaffGrade>().map_err(ApiError::BadRequest))
        .transpose()?;

    Ok(Actor {
        id: ActorId::new(header(headers, ACTOR_ID_HEADER).unwrap_or_default()),
        display_name: header(headers, ACTOR_NAME_HEADER).unwrap_or_default().to_string(),
        email: header(headers, ACTOR_EMAIL_HEADER).map(str::to_string),
        organization_id,
        staff_grade,
    })
}
