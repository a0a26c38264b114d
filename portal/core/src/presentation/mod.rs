// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`grantflow-core`)
//!
//! HTTP surface that translates external requests into workflow calls. No
//! business logic lives here; all real work is delegated to
//! [`GrantWorkflow`](crate::application::GrantWorkflow).
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`api`] | Axum router and handlers |
//! | [`actor`] | Caller identity from identity-proxy headers |
//! | [`error`] | Workflow error to HTTP status mapping |

pub mod actor;
pub mod api;
pub mod error;
